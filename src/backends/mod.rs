// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Backend collaborators that need no live service.
//!
//! # Stub Backend
//! Scripted implementations of the [`traits::backend`](crate::traits::backend)
//! collaborators for unit and integration tests:
//! - **ScriptedOperation**: long-running operation finishing after N polls
//! - **ScriptedRunClient**: replays a sequence of run-state lookups
//! - **RecordingWriter**: records write attempts, fails selected records
//!
//! ```rust
//! use transform_progress::backends::stub::RecordingWriter;
//! use transform_progress::errors::{BackendError, ErrorClass};
//!
//! let writer = RecordingWriter::new()
//!     .fail_times("r2", 1, BackendError::new(ErrorClass::Unavailable, "shard moving"));
//! assert_eq!(writer.total_attempts(), 0);
//! ```

pub mod stub;
