//! Operation results: the audit record every engine operation returns.

mod recorder;
mod types;

pub use recorder::OperationRecorder;
pub use types::*;
