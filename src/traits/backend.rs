use async_trait::async_trait;

use crate::errors::BackendError;
use crate::proto::progress_v1::{Operation, ProcessRun, WriteRecord};

/// A backend-native long-running operation.
///
/// Implementations wrap whatever handle the service client hands back when an
/// operation is started. They must be safe to share between tasks.
#[async_trait]
pub trait LongRunningOperation: Send + Sync {
    /// Server-assigned operation name.
    fn name(&self) -> &str;

    /// Fetch the latest snapshot of the operation from the backend.
    async fn poll(&self) -> Result<Operation, BackendError>;

    /// Ask the backend to cancel the operation.
    ///
    /// Backends without cancellation support return an `Unimplemented` error.
    async fn cancel(&self) -> Result<(), BackendError>;
}

/// A service exposing resources whose execution is only visible through a run state.
#[async_trait]
pub trait ResourceStateClient: Send + Sync {
    async fn get_run(&self, name: &str) -> Result<ProcessRun, BackendError>;
}

/// Writes a single record to a target resource.
#[async_trait]
pub trait RecordWriter: Send + Sync {
    async fn write_record(&self, target: &str, record: &WriteRecord) -> Result<(), BackendError>;
}
