// Application layer: owns the ledger for the lifetime of one form view and
// translates row-addressed UI events into ledger operations.

pub mod config;
pub mod error;
pub mod session;

pub use config::*;
pub use error::*;
pub use session::*;
