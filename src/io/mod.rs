pub mod export;
pub mod import;

pub use export::{Exporter, SessionSnapshot};
pub use import::{ImportError, ImportOptions, ImportResult, Importer};
