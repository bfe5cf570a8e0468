//! Collaborator payloads and snapshot I/O

pub mod provider;
pub mod records;
pub mod snapshot;

pub use provider::{
    JsonDirProvider, MarketProvider, ProviderError, Record, SquadPayload, SquadProvider,
};
pub use records::records_to_frame;
pub use snapshot::{load_snapshot, select_reporting_day, snapshot_fingerprint, SnapshotError};
