//! Cohort server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use cohort_api::{AppState, BroadcastPublisher, StreamingState, router as api_router, streaming_handler};
use cohort_common::Config;
use cohort_core::{
    AuthService, GroupService, MemberService, NotificationService, UserService,
};
use cohort_db::repositories::{
    AdminRepository, GroupRepository, MemberRepository, NotificationRepository, TokenRepository,
    UserRepository,
};
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cohort=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting cohort server...");

    // Load configuration
    let config = Config::load()?;

    // Connect to database
    let db = cohort_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    cohort_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let db = Arc::new(db);
    let admin_repo = AdminRepository::new(Arc::clone(&db));
    let member_repo = MemberRepository::new(Arc::clone(&db));
    let user_repo = UserRepository::new(Arc::clone(&db));
    let token_repo = TokenRepository::new(Arc::clone(&db));
    let group_repo = GroupRepository::new(Arc::clone(&db));
    let notification_repo = NotificationRepository::new(Arc::clone(&db));

    // Initialize streaming state and wire it in as the live-delivery path
    let streaming = StreamingState::new();
    let publisher = Arc::new(BroadcastPublisher::new(streaming.clone()));

    // Initialize services
    let auth_service = AuthService::new(
        &config.auth,
        admin_repo,
        member_repo.clone(),
        user_repo.clone(),
        token_repo,
    );

    let mut notification_service =
        NotificationService::new(notification_repo, group_repo.clone());
    notification_service.set_event_publisher(publisher);

    let mut group_service = GroupService::new(group_repo, user_repo.clone());
    group_service.set_notifications(notification_service.clone());

    let member_service = MemberService::new(member_repo);
    let user_service = UserService::new(user_repo);

    // Seed configured admin accounts
    let seeded = auth_service.seed_admins(&config.seed_admins).await?;
    if seeded > 0 {
        info!(count = seeded, "Seeded admin accounts");
    }

    // Create app state
    let state = AppState {
        auth_service,
        group_service,
        member_service,
        user_service,
        notification_service,
        streaming,
    };

    // Build router
    let app = Router::new()
        .route(
            "/streaming",
            get(streaming_handler).with_state(state.clone()),
        )
        .nest("/api", api_router(state))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );

    // Start server with graceful shutdown
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
