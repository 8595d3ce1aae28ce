pub mod amortization;
pub mod error;
pub mod preferences;
pub mod time_value;
pub mod types;

#[cfg(feature = "lending")]
pub mod lending;

#[cfg(feature = "investment")]
pub mod investment;

pub use error::CalcError;
pub use types::*;

/// Standard result type for all calculations
pub type CalcResult<T> = Result<T, CalcError>;
