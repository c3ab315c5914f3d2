//! Integration tests for batch processing.
//!
//! These exercise notification → fetch → parse → merge → write against an
//! in-memory object store, including failure isolation between
//! notifications and single-flight baseline loading.

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cwagent_confgen::{
    BatchOrchestrator, MemoryObjectStore, MissingSectionPolicy, Notification, NotificationState,
    ObjectStore, OsFamily, RuntimeConfig, Stage, StorageError,
};

// ============================================================================
// Fixtures
// ============================================================================

const FLEET: &str = "fleet-controls";

fn linux_baseline() -> Value {
    json!({
        "agent": {"run_as_user": "cwagent"},
        "metrics": {
            "aggregation_dimensions": [["InstanceId"]],
            "append_dimensions": {
                "AutoScalingGroupName": "${aws:AutoScalingGroupName}",
                "InstanceId": "${aws:InstanceId}"
            },
            "metrics_collected": {
                "cpu": {
                    "measurement": ["cpu_usage_idle", "cpu_usage_iowait"],
                    "metrics_collection_interval": 60,
                    "totalcpu": false
                },
                "mem": {"measurement": ["mem_used_percent"], "metrics_collection_interval": 60}
            }
        }
    })
}

fn windows_baseline() -> Value {
    json!({
        "agent": {"metrics_collection_interval": 60},
        "metrics": {
            "metrics_collected": {
                "LogicalDisk": {"measurement": ["% Free Space"], "resources": ["*"]}
            }
        },
        "logs": {"logs_collected": {"windows_events": {"collect_list": []}}}
    })
}

fn seeded(config: &RuntimeConfig) -> Arc<MemoryObjectStore> {
    let store = Arc::new(MemoryObjectStore::new());
    store.insert(
        &config.container,
        &config.baseline_key_linux,
        linux_baseline().to_string(),
    );
    store.insert(
        &config.container,
        &config.baseline_key_windows,
        windows_baseline().to_string(),
    );
    store
}

fn output(store: &MemoryObjectStore, config: &RuntimeConfig, os: OsFamily) -> Option<Value> {
    store
        .get(&config.container, config.output_key(os))
        .map(|body| serde_json::from_str(&body).unwrap())
}

/// Store wrapper that delays reads and can refuse writes.
struct FlakyStore {
    inner: Arc<MemoryObjectStore>,
    read_delay: Duration,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    fn new(inner: Arc<MemoryObjectStore>, read_delay: Duration) -> Self {
        Self {
            inner,
            read_delay,
            fail_writes: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl ObjectStore for FlakyStore {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn read_object(&self, container: &str, key: &str) -> Result<String, StorageError> {
        tokio::time::sleep(self.read_delay).await;
        self.inner.read_object(container, key).await
    }

    async fn write_object(
        &self,
        container: &str,
        key: &str,
        body: &str,
    ) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StorageError::Backend {
                container: container.to_string(),
                key: key.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.inner.write_object(container, key, body).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn resolves_and_writes_per_family() {
    let config = RuntimeConfig::default();
    let store = seeded(&config);
    store.insert(
        FLEET,
        "web.txt",
        "linux|process|a|b|c|d|e|f|g|h\nwindows|log|a|b|c|d|e|f|g|h",
    );
    let orchestrator = BatchOrchestrator::new(store.clone(), config.clone());

    let report = orchestrator
        .process_batch(&[Notification::new(FLEET, "web.txt")])
        .await
        .into_result()
        .unwrap();

    let outcome = &report.outcomes[0];
    assert_eq!(outcome.state(), NotificationState::Written);
    assert_eq!(outcome.documents.len(), 2);
    assert_eq!(outcome.documents[0].key, "linux-config.json");
    assert_eq!(outcome.documents[1].key, "windows-config.json");

    let mut expected_linux = linux_baseline();
    expected_linux["metrics"]["metrics_collected"]["processes"] = json!({
        "measurement": ["cpu_usage", "memory_usage", "vsz", "rss"],
        "resources": ["*"]
    });
    assert_eq!(output(&store, &config, OsFamily::Linux).unwrap(), expected_linux);

    let mut expected_windows = windows_baseline();
    expected_windows["logs"] = json!({});
    assert_eq!(output(&store, &config, OsFamily::Windows).unwrap(), expected_windows);
}

#[tokio::test]
async fn windows_only_directives_leave_linux_untouched() {
    let config = RuntimeConfig::default();
    let store = seeded(&config);
    store.insert(FLEET, "win.txt", "WINDOWS|PROCESS|a|b|c|d|e|f|g|h");
    let orchestrator = BatchOrchestrator::new(store.clone(), config.clone());

    let outcome = orchestrator.process(&Notification::new(FLEET, "win.txt")).await;

    assert!(outcome.is_success());
    assert!(output(&store, &config, OsFamily::Linux).is_none());
    assert!(!orchestrator.baselines().is_loaded(OsFamily::Linux));

    let windows = output(&store, &config, OsFamily::Windows).unwrap();
    assert_eq!(
        windows["metrics"]["metrics_collected"]["processes"]["resources"],
        json!(["*"])
    );
}

#[tokio::test]
async fn write_untouched_emits_baseline_copy() {
    let config = RuntimeConfig {
        write_untouched: true,
        ..RuntimeConfig::default()
    };
    let store = seeded(&config);
    store.insert(FLEET, "win.txt", "windows|log|a|b|c|d|e|f|g|h");
    let orchestrator = BatchOrchestrator::new(store.clone(), config.clone());

    let outcome = orchestrator.process(&Notification::new(FLEET, "win.txt")).await;

    assert_eq!(outcome.documents.len(), 2);
    assert_eq!(outcome.documents[0].directives_applied, 0);
    assert_eq!(output(&store, &config, OsFamily::Linux).unwrap(), linux_baseline());
}

#[tokio::test]
async fn failing_notification_does_not_block_others() {
    let config = RuntimeConfig::default();
    let store = seeded(&config);
    store.insert(FLEET, "bad-count.txt", "linux|log|a|b|c|d|e|f|g");
    store.insert(FLEET, "bad-os.txt", "solaris|log|a|b|c|d|e|f|g|h");
    store.insert(FLEET, "good.txt", "linux|log|a|b|c|d|e|f|g|h");
    let orchestrator = BatchOrchestrator::new(store.clone(), config.clone());

    let report = orchestrator
        .process_batch(&[
            Notification::new(FLEET, "bad-count.txt"),
            Notification::new(FLEET, "missing.txt"),
            Notification::new(FLEET, "good.txt"),
            Notification::new(FLEET, "bad-os.txt"),
        ])
        .await;

    let states: Vec<NotificationState> = report.outcomes.iter().map(|o| o.state()).collect();
    assert_eq!(
        states,
        vec![
            NotificationState::Failed(Stage::Parse),
            NotificationState::Failed(Stage::Fetch),
            NotificationState::Written,
            NotificationState::Failed(Stage::Parse),
        ]
    );
    assert_eq!(store.write_count(), 1);
    assert!(report.into_result().is_err());
}

#[tokio::test]
async fn failed_notification_keeps_previous_output() {
    let config = RuntimeConfig::default();
    let store = seeded(&config);
    store.insert(FLEET, "hosts.txt", "linux|process|a|b|c|d|e|f|g|h");
    let orchestrator = BatchOrchestrator::new(store.clone(), config.clone());

    assert!(orchestrator
        .process(&Notification::new(FLEET, "hosts.txt"))
        .await
        .is_success());
    let before = store.get(&config.container, &config.output_key_linux).unwrap();

    store.insert(FLEET, "hosts.txt", "linux|process|a|b");
    let outcome = orchestrator.process(&Notification::new(FLEET, "hosts.txt")).await;

    assert_eq!(outcome.state(), NotificationState::Failed(Stage::Parse));
    assert_eq!(
        store.get(&config.container, &config.output_key_linux).unwrap(),
        before
    );
}

#[tokio::test]
async fn no_partial_write_when_one_family_fails() {
    let config = RuntimeConfig::default();
    let store = Arc::new(MemoryObjectStore::new());
    store.insert(
        &config.container,
        &config.baseline_key_linux,
        linux_baseline().to_string(),
    );
    // Windows baseline missing.
    store.insert(
        FLEET,
        "mixed.txt",
        "linux|process|a|b|c|d|e|f|g|h\nwindows|process|a|b|c|d|e|f|g|h",
    );
    let orchestrator = BatchOrchestrator::new(store.clone(), config.clone());

    let outcome = orchestrator.process(&Notification::new(FLEET, "mixed.txt")).await;

    assert_eq!(outcome.state(), NotificationState::Failed(Stage::Merge));
    assert!(outcome.error.unwrap().to_string().contains("WINDOWS"));
    assert_eq!(store.write_count(), 0);
    assert!(outcome.documents.is_empty());
}

#[tokio::test]
async fn invalid_baseline_shape_fails_merge() {
    let config = RuntimeConfig::default();
    let store = seeded(&config);
    store.insert(
        &config.container,
        &config.baseline_key_linux,
        r#"{"metrics": "disabled"}"#,
    );
    store.insert(FLEET, "hosts.txt", "linux|process|a|b|c|d|e|f|g|h");
    let orchestrator = BatchOrchestrator::new(store.clone(), config);

    let outcome = orchestrator.process(&Notification::new(FLEET, "hosts.txt")).await;

    assert_eq!(outcome.state(), NotificationState::Failed(Stage::Merge));
    assert!(outcome
        .error
        .unwrap()
        .to_string()
        .contains("expected an object at 'metrics'"));
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn missing_metrics_section_follows_policy() {
    let skip = RuntimeConfig::default();
    let create = RuntimeConfig {
        missing_metrics_policy: MissingSectionPolicy::Create,
        ..RuntimeConfig::default()
    };

    for (config, expect_processes) in [(skip, false), (create, true)] {
        let store = Arc::new(MemoryObjectStore::new());
        store.insert(
            &config.container,
            &config.baseline_key_linux,
            r#"{"agent": {"run_as_user": "root"}}"#,
        );
        store.insert(FLEET, "hosts.txt", "linux|process|a|b|c|d|e|f|g|h");
        let orchestrator = BatchOrchestrator::new(store.clone(), config.clone());

        let outcome = orchestrator.process(&Notification::new(FLEET, "hosts.txt")).await;
        assert!(outcome.is_success());

        let linux = output(&store, &config, OsFamily::Linux).unwrap();
        assert_eq!(linux["agent"]["run_as_user"], "root");
        assert_eq!(
            linux
                .pointer("/metrics/metrics_collected/processes")
                .is_some(),
            expect_processes
        );
    }
}

#[tokio::test]
async fn repeated_delivery_is_idempotent() {
    let config = RuntimeConfig::default();
    let store = seeded(&config);
    store.insert(FLEET, "hosts.txt", "linux|log|a|b|c|d|e|f|g|h\nlinux|process|a|b|c|d|e|f|g|h");
    let orchestrator = BatchOrchestrator::new(store.clone(), config.clone());
    let notification = Notification::new(FLEET, "hosts.txt");

    let first = orchestrator.process(&notification).await;
    let first_body = store.get(&config.container, &config.output_key_linux).unwrap();
    let second = orchestrator.process(&notification).await;
    let second_body = store.get(&config.container, &config.output_key_linux).unwrap();

    assert_eq!(first.documents, second.documents);
    assert_eq!(first_body, second_body);
}

#[tokio::test]
async fn concurrent_notifications_share_one_baseline_fetch() {
    let config = RuntimeConfig {
        max_concurrency: 8,
        ..RuntimeConfig::default()
    };
    let memory = seeded(&config);
    let notifications: Vec<Notification> = (0..6)
        .map(|i| {
            let key = format!("host-{i}.txt");
            memory.insert(FLEET, &key, "linux|process|a|b|c|d|e|f|g|h");
            Notification::new(FLEET, key)
        })
        .collect();

    let store = Arc::new(FlakyStore::new(memory.clone(), Duration::from_millis(20)));
    let orchestrator = BatchOrchestrator::new(store, config);

    let report = orchestrator.process_batch(&notifications).await;

    assert_eq!(report.succeeded(), 6);
    assert_eq!(orchestrator.baselines().fetch_count(OsFamily::Linux), 1);
    assert_eq!(orchestrator.baselines().fetch_count(OsFamily::Windows), 0);
}

#[tokio::test]
async fn write_failure_is_reported_at_write_stage() {
    let config = RuntimeConfig::default();
    let memory = seeded(&config);
    memory.insert(FLEET, "hosts.txt", "linux|log|a|b|c|d|e|f|g|h");
    let store = Arc::new(FlakyStore::new(memory.clone(), Duration::ZERO));
    store.fail_writes.store(true, Ordering::SeqCst);
    let orchestrator = BatchOrchestrator::new(store.clone(), config);

    let outcome = orchestrator.process(&Notification::new(FLEET, "hosts.txt")).await;

    assert_eq!(
        outcome.history,
        vec![
            NotificationState::Pending,
            NotificationState::Fetched,
            NotificationState::Parsed,
            NotificationState::Merged,
            NotificationState::Failed(Stage::Write),
        ]
    );

    // Redelivery after the store recovers succeeds.
    store.fail_writes.store(false, Ordering::SeqCst);
    let retry = orchestrator.process(&Notification::new(FLEET, "hosts.txt")).await;
    assert!(retry.is_success());
    assert_eq!(memory.write_count(), 1);
}

#[tokio::test]
async fn baseline_failure_is_retried_on_next_notification() {
    let config = RuntimeConfig::default();
    let store = Arc::new(MemoryObjectStore::new());
    store.insert(FLEET, "hosts.txt", "linux|log|a|b|c|d|e|f|g|h");
    let orchestrator = BatchOrchestrator::new(store.clone(), config.clone());
    let notification = Notification::new(FLEET, "hosts.txt");

    let first = orchestrator.process(&notification).await;
    assert_eq!(first.state(), NotificationState::Failed(Stage::Merge));

    store.insert(
        &config.container,
        &config.baseline_key_linux,
        linux_baseline().to_string(),
    );
    let second = orchestrator.process(&notification).await;

    assert!(second.is_success());
    assert_eq!(orchestrator.baselines().fetch_count(OsFamily::Linux), 2);
}
