//! Fleet-wide aggregation of score results.
//!
//! Reduces a set of [`ScoreResult`](crate::scoring::ScoreResult)s into
//! per-factor means, spreads and percentile ranks, penalty breakdowns,
//! completeness buckets and per-vehicle comparisons.

pub mod aggregate;
pub mod types;
pub mod utility;

pub use aggregate::{aggregate, class_breakdown, completeness, summary, vehicle_report};
