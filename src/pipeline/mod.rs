//! Batch orchestration.
//!
//! Each notification runs through
//! `PENDING → FETCHED → PARSED → MERGED → WRITTEN`, or ends in
//! `FAILED(stage)`. Notifications of a batch are processed concurrently
//! and independently: one failing never stops another.
//!
//! Nothing is written for a notification until every document it
//! produces has been merged and serialized.

use crate::baseline::BaselineStore;
use crate::config::RuntimeConfig;
use crate::control::{parse_control_text, OsFamily};
use crate::document::{content_digest, to_pretty_json};
use crate::error::{BatchError, NotificationError, Stage, StorageError};
use crate::event::Notification;
use crate::merge::{referenced_families, ConfigMerger, ResolvedConfig};
use crate::storage::ObjectStore;
use futures::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, Instrument};

/// Processing state of one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationState {
    Pending,
    Fetched,
    Parsed,
    Merged,
    Written,
    Failed(Stage),
}

impl NotificationState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, NotificationState::Written | NotificationState::Failed(_))
    }
}

/// A resolved config persisted for a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WrittenDocument {
    pub os: OsFamily,
    pub container: String,
    pub key: String,
    /// SHA-256 of the written body.
    pub digest: String,
    pub directives_applied: usize,
}

/// Final result of processing one notification.
#[derive(Debug)]
pub struct NotificationOutcome {
    pub notification: Notification,
    /// Every state visited, starting with `Pending`.
    pub history: Vec<NotificationState>,
    pub documents: Vec<WrittenDocument>,
    pub error: Option<NotificationError>,
}

impl NotificationOutcome {
    pub fn state(&self) -> NotificationState {
        self.history
            .last()
            .copied()
            .unwrap_or(NotificationState::Pending)
    }

    pub fn is_success(&self) -> bool {
        self.state() == NotificationState::Written
    }
}

/// Outcomes of a batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<NotificationOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Surface failures to the invocation platform.
    pub fn into_result(self) -> Result<BatchReport, BatchError> {
        if let Some(outcome) = self.outcomes.iter().find(|o| !o.is_success()) {
            return Err(BatchError {
                failed: self.failed(),
                total: self.outcomes.len(),
                first_source: outcome.notification.to_string(),
                first_error: outcome
                    .error
                    .as_ref()
                    .map(|e| e.to_string())
                    .unwrap_or_else(|| format!("stopped in state {:?}", outcome.state())),
            });
        }
        Ok(self)
    }
}

struct StateTracker {
    history: Vec<NotificationState>,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            history: vec![NotificationState::Pending],
        }
    }

    fn advance(&mut self, state: NotificationState) {
        debug!("Notification state -> {:?}", state);
        self.history.push(state);
    }
}

/// Runs notifications through fetch, parse, merge and write.
pub struct BatchOrchestrator {
    store: Arc<dyn ObjectStore>,
    baselines: BaselineStore,
    merger: ConfigMerger,
    config: RuntimeConfig,
}

impl BatchOrchestrator {
    /// Build an orchestrator reading baselines from and writing outputs to
    /// `config.container` in `store`.
    pub fn new(store: Arc<dyn ObjectStore>, config: RuntimeConfig) -> Self {
        let baselines = BaselineStore::new(
            Arc::clone(&store),
            config.container.clone(),
            config.baseline_key(OsFamily::Linux),
            config.baseline_key(OsFamily::Windows),
        );
        let merger = ConfigMerger::new(config.missing_metrics_policy);
        Self {
            store,
            baselines,
            merger,
            config,
        }
    }

    pub fn baselines(&self) -> &BaselineStore {
        &self.baselines
    }

    /// Process a batch to completion.
    pub async fn process_batch(&self, notifications: &[Notification]) -> BatchReport {
        info!("Processing batch of {} notification(s)", notifications.len());

        let outcomes: Vec<NotificationOutcome> = futures::stream::iter(notifications)
            .map(|n| self.process(n))
            .buffered(self.config.max_concurrency.max(1))
            .collect()
            .await;

        let report = BatchReport { outcomes };
        info!(
            "Batch complete: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
        report
    }

    /// Process a single notification.
    pub async fn process(&self, notification: &Notification) -> NotificationOutcome {
        let span = info_span!(
            "notification",
            container = %notification.container,
            key = %notification.key
        );
        let mut tracker = StateTracker::new();
        let result = self.run(notification, &mut tracker).instrument(span).await;

        let (documents, error) = match result {
            Ok(documents) => (documents, None),
            Err(e) => {
                error!(
                    "Notification '{}' failed at {} stage: {}",
                    notification,
                    e.stage(),
                    e
                );
                tracker.advance(NotificationState::Failed(e.stage()));
                (Vec::new(), Some(e))
            }
        };

        NotificationOutcome {
            notification: notification.clone(),
            history: tracker.history,
            documents,
            error,
        }
    }

    async fn run(
        &self,
        notification: &Notification,
        tracker: &mut StateTracker,
    ) -> Result<Vec<WrittenDocument>, NotificationError> {
        let text = match self
            .store
            .read_object(&notification.container, &notification.key)
            .await
        {
            Ok(text) => text,
            Err(StorageError::ObjectEmpty { container, key }) => {
                tracker.advance(NotificationState::Fetched);
                return Err(NotificationError::EmptyControl { container, key });
            }
            Err(e) => return Err(NotificationError::Fetch(e)),
        };
        tracker.advance(NotificationState::Fetched);

        let directives = parse_control_text(&text)?;
        tracker.advance(NotificationState::Parsed);
        info!("Parsed {} directive(s)", directives.len());

        let families = if self.config.write_untouched {
            OsFamily::ALL.to_vec()
        } else {
            referenced_families(&directives)
        };

        let mut rendered: Vec<(ResolvedConfig, String)> = Vec::with_capacity(families.len());
        for os in families {
            let baseline = self.baselines.get(os).await?;
            let resolved = self.merger.merge(&baseline, &directives)?;
            let body = to_pretty_json(&resolved.document)?;
            rendered.push((resolved, body));
        }
        tracker.advance(NotificationState::Merged);

        let mut written = Vec::with_capacity(rendered.len());
        for (resolved, body) in rendered {
            let key = self.config.output_key(resolved.os);
            self.store
                .write_object(&self.config.container, key, &body)
                .await
                .map_err(NotificationError::Write)?;

            let document = WrittenDocument {
                os: resolved.os,
                container: self.config.container.clone(),
                key: key.to_string(),
                digest: content_digest(&body),
                directives_applied: resolved.applied,
            };
            info!(
                "Wrote {} config to '{}/{}' (sha256 {})",
                document.os, document.container, document.key, document.digest
            );
            written.push(document);
        }
        tracker.advance(NotificationState::Written);

        Ok(written)
    }
}
