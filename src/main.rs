use axum::{
    routing::{get, patch, post, put},
    Router,
};
use jobboard_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    let app = Router::new()
        .route("/health", get(routes::health::health))
        .route(
            "/api/applications",
            post(routes::applications::create_application),
        )
        .route(
            "/api/applications/:id",
            get(routes::applications::get_application),
        )
        .route(
            "/api/applications/:id/history",
            get(routes::applications::get_application_history),
        )
        .route(
            "/api/applications/:id/status",
            patch(routes::applications::update_status),
        )
        .route(
            "/api/applications/:id/reschedule",
            post(routes::applications::propose_reschedule),
        )
        .route(
            "/api/applications/:id/reschedule-response",
            put(routes::applications::respond_reschedule),
        )
        .route(
            "/api/companies/:id/interviews",
            post(routes::interviews::schedule_interview),
        )
        .route(
            "/api/interviews/:id/result",
            post(routes::interviews::record_result),
        )
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
