// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Progress handles over asynchronous backend work.
//!
//! Four handle variants share the [`ProgressHandle`](crate::traits::ProgressHandle)
//! contract:
//!
//! * [`OperationProgress`] wraps a backend long-running operation.
//! * [`ResourceStateProgress`] polls a resource until its run state is terminal.
//! * [`ChainedWriteProgress`] writes an upstream result back as records.
//! * [`CombinedProgress`] fans in any mix of the above.
//!
//! Every handle moves exactly once from Pending to Resolved, Failed or Cancelled.

mod chained_write;
mod combined;
mod operation;
mod output;
mod resource_state;
pub(crate) mod state;
mod wait;


pub use chained_write::{ChainedWriteOptions, ChainedWriteProgress, RecordMapper};
pub use combined::CombinedProgress;
pub use operation::OperationProgress;
pub use output::{Outcome, TransformOutput};
pub use resource_state::ResourceStateProgress;
pub use wait::wait_for_outcome;
