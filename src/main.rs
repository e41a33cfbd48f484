use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{delete, get, post, put},
    Router,
};
use jobs_api::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::{auth, rate_limit},
    routes, AppState,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool.clone())?;

    // Guards stack per route: the outermost layer resolves the account, the
    // inner one checks its role.
    let authenticate = from_fn_with_state(app_state.clone(), auth::authenticate);
    let employer_only = from_fn(auth::require_employer);
    let applicant_only = from_fn(auth::require_applicant);
    let admin_only = from_fn(auth::require_admin);

    let api = Router::new()
        .route("/jobs", get(routes::jobs::list_jobs))
        .route("/jobs/:zipcode/:distance", get(routes::jobs::jobs_in_radius))
        .route(
            "/job/:id",
            get(routes::jobs::get_job).merge(
                put(routes::jobs::update_job)
                    .delete(routes::jobs::delete_job)
                    .route_layer(employer_only.clone())
                    .route_layer(authenticate.clone()),
            ),
        )
        .route(
            "/job/:id/apply",
            put(routes::jobs::apply_to_job)
                .route_layer(applicant_only.clone())
                .route_layer(authenticate.clone()),
        )
        .route("/job/:id/:slug", get(routes::jobs::get_job_by_slug))
        .route("/stats/:topic", get(routes::jobs::job_stats))
        .route(
            "/job/new",
            post(routes::jobs::create_job)
                .route_layer(employer_only.clone())
                .route_layer(authenticate.clone()),
        )
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/logout", get(routes::auth::logout))
        .route("/password/forgot", post(routes::auth::forgot_password))
        .route("/password/reset/:token", put(routes::auth::reset_password))
        .route("/me", get(routes::users::me).route_layer(authenticate.clone()))
        .route(
            "/me/update",
            put(routes::users::update_me).route_layer(authenticate.clone()),
        )
        .route(
            "/me/delete",
            delete(routes::users::delete_me).route_layer(authenticate.clone()),
        )
        .route(
            "/password/update",
            put(routes::users::update_password).route_layer(authenticate.clone()),
        )
        .route(
            "/jobs/applied",
            get(routes::users::applied_jobs)
                .route_layer(applicant_only)
                .route_layer(authenticate.clone()),
        )
        .route(
            "/jobs/published",
            get(routes::users::published_jobs)
                .route_layer(employer_only)
                .route_layer(authenticate.clone()),
        )
        .route(
            "/users",
            get(routes::users::list_users)
                .route_layer(admin_only.clone())
                .route_layer(authenticate.clone()),
        )
        .route(
            "/user/:id",
            delete(routes::users::delete_user)
                .route_layer(admin_only)
                .route_layer(authenticate),
        )
        .layer(from_fn_with_state(
            rate_limit::new_throttle_state(
                config.rate_limit_max,
                Duration::from_secs(config.rate_limit_window_secs),
            ),
            rate_limit::throttle_middleware,
        ));

    info!("Serving uploads from: {}", config.upload_dir);

    let app = Router::new()
        .route("/health", get(routes::health::health))
        .nest("/api/v1", api)
        .nest_service("/uploads", ServeDir::new(&config.upload_dir))
        .fallback(routes::not_found)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!(
        "Server listening on {} in {} mode",
        addr, config.environment
    );
    let listener = TcpListener::bind(addr).await?;

    tokio::select! {
        result = axum::serve(listener, app) => {
            tracing::warn!("server ended unexpectedly: {:?}", &result);
        }
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received, draining connections");
        }
    }

    pool.close().await;
    Ok(())
}
