pub mod error;
pub mod time_value;
pub mod types;

#[cfg(feature = "loan")]
pub mod loan;

#[cfg(feature = "investment")]
pub mod investment;

pub use error::CalcError;
pub use types::*;

/// Standard result type for all calckit operations
pub type CalcResult<T> = Result<T, CalcError>;
