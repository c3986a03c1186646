// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Scripted backends for exercising progress handles without a live service.
//!
//! Each stub follows a fixed script and counts the calls it receives, so tests
//! can assert both on handle results and on how often the backend was hit.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::time::Instant;

use crate::errors::{BackendError, ErrorClass};
use crate::proto::progress_v1::operation::Result as OperationResult;
use crate::proto::progress_v1::{AnyPayload, Operation, ProcessRun, Status, WriteRecord};
use crate::traits::{LongRunningOperation, RecordWriter, ResourceStateClient};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

enum Terminal {
    Never,
    Finished(Option<OperationResult>),
}

/// A long-running operation that finishes after a fixed number of polls.
pub struct ScriptedOperation {
    name: String,
    pending_polls: u32,
    terminal: Terminal,
    transient_failures: u32,
    cancel_supported: bool,
    polls: AtomicU32,
    cancels: AtomicU32,
    cancelled: AtomicBool,
}

impl ScriptedOperation {
    fn scripted(name: &str, pending_polls: u32, terminal: Terminal) -> Self {
        Self {
            name: name.to_string(),
            pending_polls,
            terminal,
            transient_failures: 0,
            cancel_supported: true,
            polls: AtomicU32::new(0),
            cancels: AtomicU32::new(0),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Reports not-done for `pending_polls` polls, then done with `response`.
    pub fn completing_after(name: &str, pending_polls: u32, response: Option<AnyPayload>) -> Self {
        Self::scripted(
            name,
            pending_polls,
            Terminal::Finished(response.map(OperationResult::Response)),
        )
    }

    /// Reports not-done for `pending_polls` polls, then done with `error`.
    pub fn failing_after(name: &str, pending_polls: u32, error: Status) -> Self {
        Self::scripted(
            name,
            pending_polls,
            Terminal::Finished(Some(OperationResult::Error(error))),
        )
    }

    /// Never finishes unless cancelled.
    pub fn pending(name: &str) -> Self {
        Self::scripted(name, 0, Terminal::Never)
    }

    /// The first `failures` polls fail with `UNAVAILABLE` before the script starts.
    pub fn with_transient_poll_failures(mut self, failures: u32) -> Self {
        self.transient_failures = failures;
        self
    }

    /// `cancel` fails with `UNIMPLEMENTED`.
    pub fn without_cancel_support(mut self) -> Self {
        self.cancel_supported = false;
        self
    }

    pub fn poll_count(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }

    pub fn cancel_count(&self) -> u32 {
        self.cancels.load(Ordering::SeqCst)
    }

    fn snapshot(&self, done: bool, result: Option<OperationResult>) -> Operation {
        Operation {
            name: self.name.clone(),
            done,
            result,
        }
    }
}

#[async_trait]
impl LongRunningOperation for ScriptedOperation {
    fn name(&self) -> &str {
        &self.name
    }

    async fn poll(&self) -> Result<Operation, BackendError> {
        let poll = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
        if poll <= self.transient_failures {
            return Err(BackendError::new(
                ErrorClass::Unavailable,
                "operations service unavailable",
            ));
        }
        if self.cancelled.load(Ordering::SeqCst) {
            let cancelled = Status {
                code: tonic::Code::Cancelled as i32,
                message: "operation cancelled".to_string(),
            };
            return Ok(self.snapshot(true, Some(OperationResult::Error(cancelled))));
        }

        let scripted_poll = poll - self.transient_failures;
        match &self.terminal {
            Terminal::Finished(result) if scripted_poll > self.pending_polls => {
                Ok(self.snapshot(true, result.clone()))
            }
            _ => Ok(self.snapshot(false, None)),
        }
    }

    async fn cancel(&self) -> Result<(), BackendError> {
        if !self.cancel_supported {
            return Err(BackendError::new(
                ErrorClass::Unimplemented,
                "operation cannot be cancelled",
            ));
        }
        self.cancels.fetch_add(1, Ordering::SeqCst);
        self.cancelled.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// A resource client replaying a fixed sequence of lookups.
///
/// Once the script runs out, the last entry is repeated.
pub struct ScriptedRunClient {
    script: Vec<Result<ProcessRun, BackendError>>,
    calls: AtomicU32,
}

impl ScriptedRunClient {
    pub fn new(script: Vec<Result<ProcessRun, BackendError>>) -> Self {
        Self {
            script,
            calls: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceStateClient for ScriptedRunClient {
    async fn get_run(&self, name: &str) -> Result<ProcessRun, BackendError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        match self.script.get(call).or_else(|| self.script.last()) {
            Some(entry) => entry.clone(),
            None => Err(BackendError::new(
                ErrorClass::NotFound,
                format!("no run named '{name}'"),
            )),
        }
    }
}

#[derive(Default)]
struct WriterLog {
    attempts: HashMap<String, u32>,
    attempt_times: Vec<Instant>,
    targets: Vec<String>,
    written: Vec<WriteRecord>,
}

/// A record writer that remembers every attempt and fails on request.
#[derive(Default)]
pub struct RecordingWriter {
    failures: HashMap<String, (Option<u32>, BackendError)>,
    log: Mutex<WriterLog>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every write of the record keyed `key` fails with `error`.
    pub fn fail_always(mut self, key: &str, error: BackendError) -> Self {
        self.failures.insert(key.to_string(), (None, error));
        self
    }

    /// The first `times` writes of the record keyed `key` fail with `error`.
    pub fn fail_times(mut self, key: &str, times: u32, error: BackendError) -> Self {
        self.failures.insert(key.to_string(), (Some(times), error));
        self
    }

    pub fn attempts(&self, key: &str) -> u32 {
        lock(&self.log).attempts.get(key).copied().unwrap_or(0)
    }

    pub fn total_attempts(&self) -> u32 {
        lock(&self.log).attempts.values().sum()
    }

    /// Start time of every attempt, in call order.
    pub fn attempt_times(&self) -> Vec<Instant> {
        lock(&self.log).attempt_times.clone()
    }

    pub fn targets(&self) -> Vec<String> {
        lock(&self.log).targets.clone()
    }

    /// Successfully written records, in write order.
    pub fn written(&self) -> Vec<WriteRecord> {
        lock(&self.log).written.clone()
    }
}

#[async_trait]
impl RecordWriter for RecordingWriter {
    async fn write_record(&self, target: &str, record: &WriteRecord) -> Result<(), BackendError> {
        let mut log = lock(&self.log);
        let attempt = {
            let count = log.attempts.entry(record.key.clone()).or_insert(0);
            *count += 1;
            *count
        };
        log.attempt_times.push(Instant::now());
        log.targets.push(target.to_string());

        if let Some((limit, error)) = self.failures.get(&record.key) {
            if limit.map_or(true, |limit| attempt <= limit) {
                return Err(error.clone());
            }
        }
        log.written.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_operation_counts_transient_failures_separately() {
        let operation = ScriptedOperation::completing_after("operations/x", 1, None)
            .with_transient_poll_failures(1);

        assert!(operation.poll().await.is_err());
        assert!(!operation.poll().await.unwrap().done);
        assert!(operation.poll().await.unwrap().done);
        assert_eq!(operation.poll_count(), 3);
    }

    #[tokio::test]
    async fn cancel_without_support_is_rejected() {
        let operation = ScriptedOperation::pending("operations/y").without_cancel_support();
        let error = operation.cancel().await.unwrap_err();
        assert_eq!(error.class(), ErrorClass::Unimplemented);
        assert!(!operation.poll().await.unwrap().done);
    }

    #[tokio::test]
    async fn run_client_repeats_its_last_entry() {
        let client = ScriptedRunClient::new(vec![Ok(ProcessRun::default())]);
        assert!(client.get_run("runs/a").await.is_ok());
        assert!(client.get_run("runs/a").await.is_ok());
        assert_eq!(client.call_count(), 2);

        let empty = ScriptedRunClient::new(Vec::new());
        assert!(empty.get_run("runs/b").await.is_err());
    }
}
