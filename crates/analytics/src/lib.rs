//! # Performance Analytics
//!
//! This crate derives summary statistics from the simulator's outputs: the
//! windowed return/risk metrics of a NAV curve, and the allocation bias of a
//! recorded schedule.
//!
//! ## Architectural Principles
//!
//! - **Stateless calculation:** both calculators take request-scoped inputs
//!   and produce a report struct; nothing is cached or mutated here, which
//!   makes them safe to call concurrently and trivial to test.
//! - **Well-formed degenerate cases:** a too-short window or an empty
//!   allocation history produces a defined zero/neutral report, never an
//!   error, since dashboards must stay renderable on sparse data. Corrupt data
//!   (NaN NAV) is the opposite case and always fails loudly.
//!
//! ## Public API
//!
//! - `MetricsCalculator` / `PerformanceMetrics`: windowed curve statistics.
//! - `PreferenceAnalyzer` / `PreferenceReport`: allocation bias summary.
//! - `AnalyticsError`: the specific error types returned from this crate.

pub mod engine;
pub mod error;
pub mod preference;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::MetricsCalculator;
pub use error::AnalyticsError;
pub use preference::PreferenceAnalyzer;
pub use report::{PerformanceMetrics, PreferenceReport};
