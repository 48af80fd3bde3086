//! tc-core: stable foundation for the thermochem workspace.
//!
//! Contains:
//! - units (uom constructors for K, J/mol, J/(mol·K) and the 298.15 K reference)
//! - numeric (Real + tolerances + float helpers)
//! - ids (compact record identities)
//! - error (shared error type)

pub mod error;
pub mod ids;
pub mod numeric;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use error::{TcError, TcResult};
pub use ids::*;
pub use numeric::*;
pub use units::*;
