//! Field extraction from recognized text.

mod identity;
pub mod rules;
mod vehicle;

pub use identity::IdentityCardParser;
pub use vehicle::{VehicleCode, VehicleCodeParser, FALLBACK_CONFIDENCE, VIN_LEN};

use crate::error::ScanError;

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ScanError>;
