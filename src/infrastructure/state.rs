//! Application state containing repositories and the bulk engine

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::bulk::actions::default_registry;
use crate::bulk::{
    AdmissionController, BulkSettings, BulkTaskRunner, Clock, DeferredDispatch, InlineDispatch,
    QueueDispatch, ResultMaterializer, SystemClock, TaskDispatch,
};
use crate::domain::{FigureRepository, IdentityProvider, OperationRepository};
use crate::infrastructure::config::DispatchMode;
use crate::infrastructure::{
    SeaOrmFigureRepository, SeaOrmOperationRepository, SeaOrmUserRepository,
};
use crate::services::BulkOperationService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    db: DatabaseConnection,
    /// Bulk operation store
    pub operation_repo: Arc<dyn OperationRepository>,
    /// Figure repository
    pub figure_repo: Arc<dyn FigureRepository>,
    /// Resolves users into actors
    pub identity: Arc<dyn IdentityProvider>,
    /// Task runner shared by every dispatch mode and the polling worker
    pub runner: Arc<BulkTaskRunner>,
    /// Submission and query surface
    pub bulk: Arc<BulkOperationService>,
}

impl AppState {
    /// Create a new AppState with all repositories initialized.
    ///
    /// `DispatchMode::Queue` spawns the worker task, so this must run inside a
    /// tokio runtime.
    pub fn new(db: DatabaseConnection, settings: BulkSettings, mode: DispatchMode) -> Self {
        Self::with_clock(db, settings, mode, Arc::new(SystemClock))
    }

    pub fn with_clock(
        db: DatabaseConnection,
        settings: BulkSettings,
        mode: DispatchMode,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let operation_repo: Arc<dyn OperationRepository> =
            Arc::new(SeaOrmOperationRepository::new(db.clone()));
        let figure_repo: Arc<dyn FigureRepository> =
            Arc::new(SeaOrmFigureRepository::new(db.clone()));
        let identity: Arc<dyn IdentityProvider> = Arc::new(SeaOrmUserRepository::new(db.clone()));

        let registry = Arc::new(default_registry(figure_repo.clone()));
        let runner = Arc::new(BulkTaskRunner::new(
            operation_repo.clone(),
            registry.clone(),
            identity.clone(),
            clock.clone(),
            settings.stale_after_minutes,
        ));

        let dispatch: Arc<dyn TaskDispatch> = match mode {
            DispatchMode::Inline => Arc::new(InlineDispatch::new(runner.clone())),
            DispatchMode::Queue => {
                let (dispatch, _worker) = QueueDispatch::spawn(runner.clone());
                Arc::new(dispatch)
            }
            DispatchMode::External => Arc::new(DeferredDispatch),
        };

        let admission = AdmissionController::new(
            registry,
            operation_repo.clone(),
            clock,
            settings.max_records,
        );
        let bulk = Arc::new(BulkOperationService::new(
            admission,
            operation_repo.clone(),
            dispatch,
            ResultMaterializer::new(settings.frontend_base_url.clone()),
        ));

        Self {
            db,
            operation_repo,
            figure_repo,
            identity,
            runner,
            bulk,
        }
    }

    /// Get the database connection
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
