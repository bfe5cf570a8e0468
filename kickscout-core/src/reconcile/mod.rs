//! Reconcilers: join the prediction table against live league data.
//!
//! Both reconcilers share the join semantics in [`join`] and the
//! normalization table in [`crate::normalize`], and differ only in the
//! extra market-side derivations.

pub mod join;
pub mod market;
pub mod squad;

pub use join::inner_join;
pub use market::{join_market, reconcile_market, MIN_ACTIONABLE_TARGET};
pub use squad::{join_squad, reconcile_squad};
