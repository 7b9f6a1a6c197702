pub mod backend;
pub mod datalake;

pub use backend::{ExecutionResult, QueryBackend};
pub use datalake::DatalakeProvider;
