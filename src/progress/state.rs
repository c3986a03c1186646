// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Write-once terminal state shared by every progress handle.

use std::sync::OnceLock;
use tokio::sync::{Mutex, MutexGuard};

use crate::observability::messages::progress::{
    ProgressCancelled, ProgressFailed, ProgressResolved,
};
use crate::observability::messages::StructuredLog;
use crate::progress::Outcome;

/// Completion section plus the single-assignment outcome cell.
///
/// Readers check the cell without locking. Resolution requires a guard from
/// [`Completion::enter`], so two tasks racing on the same handle cannot both
/// observe Pending and then record different outcomes.
#[derive(Debug, Default)]
pub(crate) struct Completion {
    outcome: OnceLock<Outcome>,
    section: Mutex<()>,
}

impl Completion {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn get(&self) -> Option<&Outcome> {
        self.outcome.get()
    }

    pub(crate) fn is_set(&self) -> bool {
        self.outcome.get().is_some()
    }

    pub(crate) async fn enter(&self) -> MutexGuard<'_, ()> {
        self.section.lock().await
    }

    /// Record the terminal state. Returns `false` if one was already recorded.
    pub(crate) fn resolve(
        &self,
        _section: &MutexGuard<'_, ()>,
        identifier: &str,
        outcome: Outcome,
    ) -> bool {
        if self.outcome.set(outcome).is_err() {
            return false;
        }
        match self.outcome.get() {
            Some(Outcome::Resolved(output)) => ProgressResolved {
                identifier,
                output_kind: output.kind(),
            }
            .log(),
            Some(Outcome::Failed(error)) => ProgressFailed { identifier, error }.log(),
            Some(Outcome::Cancelled) => ProgressCancelled { identifier }.log(),
            None => {}
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TransformError;
    use crate::progress::TransformOutput;

    #[tokio::test]
    async fn first_resolution_wins() {
        let completion = Completion::new();
        assert!(!completion.is_set());

        let section = completion.enter().await;
        assert!(completion.resolve(&section, "job", Outcome::Resolved(TransformOutput::NoValue)));
        assert!(!completion.resolve(
            &section,
            "job",
            Outcome::Failed(TransformError::new("job", "late failure"))
        ));
        drop(section);

        assert_eq!(
            completion.get(),
            Some(&Outcome::Resolved(TransformOutput::NoValue))
        );
    }
}
