// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod backend;
mod config;
mod progress;

pub use backend::{BackendError, ErrorClass};
pub use config::{ConfigError, ValidationError};
pub use progress::{ProgressError, TransformError};
