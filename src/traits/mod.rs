pub mod backend;
pub mod progress;

pub use backend::{LongRunningOperation, RecordWriter, ResourceStateClient};
pub use progress::ProgressHandle;
