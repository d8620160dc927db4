use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use displacement_bulk::bulk::worker::run_worker;
use displacement_bulk::config::DispatchMode;
use displacement_bulk::infrastructure::AppState;
use displacement_bulk::{config, db, seed, server};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "displacement_bulk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let worker_mode = std::env::args().any(|arg| arg == "--worker");
    let config = config::Config::from_env();

    // Initialize database
    let db = match db::init_db(&config.database_url).await {
        Ok(db) => db,
        Err(e) => {
            tracing::error!("Failed to initialize database: {}", e);
            return;
        }
    };

    // Check for seed flag
    if std::env::var("SEED_DEMO").is_ok() {
        tracing::info!("Seeding demo data...");
        if let Err(e) = seed::seed_demo_data(&db).await {
            tracing::error!("Failed to seed data: {}", e);
        } else {
            tracing::info!("Demo data seeded successfully.");
        }
    }

    let poll_interval = Duration::from_secs(config.worker_poll_secs.max(1));

    // [WORKER] Poll the operation store instead of serving HTTP
    if worker_mode {
        tracing::info!("Starting in worker mode (poll every {:?})", poll_interval);
        let state = AppState::new(db, config.bulk.clone(), DispatchMode::External);
        run_worker(state.runner.clone(), poll_interval).await;
        return;
    }

    let state = AppState::new(db, config.bulk.clone(), config.dispatch);

    // Operations left PENDING by a crash or by a lost dispatch are picked up here.
    // An external worker process owns that job when dispatch is external.
    if config.dispatch != DispatchMode::External {
        let runner = state.runner.clone();
        tokio::spawn(async move {
            run_worker(runner, poll_interval).await;
        });
    }

    tracing::info!(
        "Bulk engine ready: dispatch={:?}, max_records={}, stale_after={}min",
        config.dispatch,
        config.bulk.max_records,
        config.bulk.stale_after_minutes
    );

    let app = server::build_router(state, &config.cors_allowed_origins);

    if let Err(e) = server::serve(app, config.port).await {
        tracing::error!("{}", e);
    }
}
