use std::{
    fs::OpenOptions,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use rand::{SeedableRng, rngs::StdRng};
use rusqlite::Connection;
use tower_http::trace::TraceLayer;

use tracing_subscriber::{Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use portola_rs::{
    AppState, build_router,
    db::initialize,
    generator::{MINIMUM_SEED_COUNT, ensure_minimum_seed, spawn_generator_task},
    graceful_shutdown,
    stores::sqlite::SQLiteTransactionStore,
};

/// The HTTP API server for portola_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, default_value = "portola.db")]
    db_path: String,

    /// The port to serve the API from.
    #[arg(short, long, default_value_t = 8000)]
    port: u16,
}

#[tokio::main]
async fn main() {
    setup_logging();

    let args = Args::parse();

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));

    let conn = Connection::open(&args.db_path).expect("Could not open the database file.");
    initialize(&conn).expect("Could not initialize the database.");
    let conn = Arc::new(Mutex::new(conn));

    let mut store = SQLiteTransactionStore::new(conn.clone());
    let mut rng = StdRng::from_os_rng();
    let seeded = ensure_minimum_seed(&mut store, &mut rng, MINIMUM_SEED_COUNT)
        .expect("Could not seed the database.");
    if seeded > 0 {
        tracing::info!("seeded {seeded} synthetic transactions");
    }

    let app_state = AppState::new(store.clone(), rng);
    let generator_task = spawn_generator_task(store, StdRng::from_os_rng());

    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(app_state));

    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
        .unwrap();

    // The server has drained its connections, stop the generator loop. The
    // abort lands at the task's sleep await point.
    generator_task.abort();
    if let Err(error) = generator_task.await {
        if !error.is_cancelled() {
            tracing::error!("the generator task failed during shutdown: {error}");
        }
    }

    tracing::info!("shut down cleanly");
}

fn setup_logging() {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open("debug.log")
        .expect("Could not create log file");

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry()
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // By default, `TraceLayer` will log 5xx responses but we're doing our specific
        // logging of errors so disable that
        .on_failure(());

    router.layer(tracing_layer)
}
