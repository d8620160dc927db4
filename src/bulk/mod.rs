//! Bulk Operation Engine
//!
//! An operation moves through `Admit -> Snapshot -> Execute`, each phase
//! recorded in the operation store:
//!
//! - [`admission`] validates the request shape, sizes the matched record set
//!   and persists a PENDING operation.
//! - [`runner`] is the single entry point for running an operation. It asks the
//!   [`reaper`] whether the operation went stale, claims it (IN_PROGRESS), has
//!   the [`snapshot`] capturer record the pre-mutation state, then hands over
//!   to the [`executor`].
//! - [`results`] turns stored outcome lists into dereferenceable results.
//!
//! Execution-time failures are never returned to the submitter; they are
//! written on the operation and discovered by querying it.

pub mod actions;
pub mod admission;
pub mod clock;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod reaper;
pub mod registry;
pub mod results;
pub mod runner;
pub mod snapshot;
pub mod worker;

pub use admission::AdmissionController;
pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatch::{DeferredDispatch, InlineDispatch, QueueDispatch, TaskDispatch};
pub use error::{ApplyError, BulkError, ExecutionFault};
pub use executor::BulkExecutor;
pub use reaper::StaleOperationReaper;
pub use registry::{ActionRegistry, BulkActionHandler, SnapshotRecord};
pub use results::{BulkResult, OperationView, ResultMaterializer};
pub use runner::{BulkTaskRunner, RunOutcome};
pub use snapshot::SnapshotCapturer;

/// Tunables shared by admission, the reaper and result materialization.
#[derive(Debug, Clone)]
pub struct BulkSettings {
    /// Largest matched record count an operation may be admitted with.
    pub max_records: u64,
    /// Minutes a PENDING operation may wait before it is killed instead of run.
    pub stale_after_minutes: i64,
    /// Prefix for the frontend links of result entries.
    pub frontend_base_url: String,
}

impl Default for BulkSettings {
    fn default() -> Self {
        Self {
            max_records: 1000,
            stale_after_minutes: 60,
            frontend_base_url: "http://localhost:3080".to_string(),
        }
    }
}
