//! Core data types for dataprobe: typed columns, data frames and the
//! numeric kernels behind the script libraries.

pub mod column;
pub mod display;
pub mod error;
pub mod frame;
pub mod stats;
pub mod value;

pub use column::Column;
pub use error::FrameError;
pub use frame::{Agg, CmpOp, DataFrame};
pub use value::{format_float, DType, Value, ValueKey};
