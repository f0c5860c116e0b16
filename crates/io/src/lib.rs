// File I/O operations

pub mod csv;
pub mod error;

pub use error::IoError;
