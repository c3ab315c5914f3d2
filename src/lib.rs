//! cwagent-confgen: per-host monitoring agent config generator.
//!
//! A control file lists monitoring directives, one `|`-delimited record per
//! line. Each directive targets an OS family and overrides part of that
//! family's baseline agent config. The merged documents are written back
//! to object storage under fixed keys.
//!
//! Components, leaves first:
//!  * `control` - control-file record parser.
//!  * `baseline` - process-wide, single-flight baseline cache.
//!  * `merge` - applies directives to a copy of a baseline.
//!  * `pipeline` - batch orchestration over change notifications.

pub mod baseline;
pub mod cli;
pub mod config;
pub mod control;
pub mod document;
pub mod error;
pub mod event;
pub mod logging;
pub mod merge;
pub mod pipeline;
pub mod storage;

pub use baseline::{BaselineConfig, BaselineStore};
pub use config::RuntimeConfig;
pub use control::{parse_control_text, DirectiveKind, MonitoringDirective, OsFamily};
pub use error::{
    BaselineError, BatchError, MergeError, NotificationError, ParseError, Stage, StorageError,
};
pub use event::Notification;
pub use merge::{ConfigMerger, MissingSectionPolicy, ResolvedConfig};
pub use pipeline::{BatchOrchestrator, BatchReport, NotificationOutcome, NotificationState};
pub use storage::{FsObjectStore, MemoryObjectStore, ObjectStore};
