// src/pipeline/mod.rs
//! Pure per-request transforms over the cached wide tables. Nothing here
//! mutates its inputs.

pub mod derive;
pub mod framing;
pub mod melt;
pub mod prune;
pub mod selection;

pub use derive::{fatality_rate, join_cases, per_100k};
pub use framing::{
    add_epsilon, after_cutoff, daily_new_active, default_log_cutoff, log_axis_domain, LOG_EPSILON,
};
pub use melt::{melt, melt_region};
pub use prune::prune_zero_dates;
pub use selection::{catalog, default_selection, resolve_selection};
