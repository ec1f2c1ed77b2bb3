pub mod enums;
pub mod error;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{ParseWindowError, Preference, Window};
pub use error::CoreError;
pub use structs::{AlignedRow, AllocationRecord, MarketSnapshot, NavPoint, WEIGHT_SUM_TOLERANCE};
