// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

// Backend message types exchanged with the operation, run-state and write services
#[path = "progress.v1.rs"]
pub mod progress_v1;

// Re-export the types for easier access
pub use progress_v1::{AnyPayload, Operation, ProcessRun, RunState, Status, WriteRecord};
