#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the `CrimeWatch` backend.
//!
//! Serves the REST API behind the tourist safety frontend: public heatmap
//! and crime feeds, admin management of accounts, locations, and crime
//! reports, manager analytics over nearby crime data, and the LLM-backed
//! chatbot and safety assistant. Authentication is bearer-token based,
//! with the verifier implementation selected by `AUTH_PROVIDER`.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::header;
use actix_web::{App, HttpServer, middleware, web};
use crimewatch_ai::narrative::NarrativeRequester;
use crimewatch_ai::providers::{LlmProvider, create_provider_from_env};
use crimewatch_analytics::service::AnalyticsService;
use crimewatch_auth::sessions::purge_expired;
use crimewatch_auth::verifier::{TokenVerifier, create_verifier_from_env};
use crimewatch_cache::{AnalysisCache, SWEEP_INTERVAL, SystemClock};
use crimewatch_database::{db, run_migrations};
use switchy_database::Database;

/// Shared application state.
pub struct AppState {
    /// Postgres connection shared across handlers.
    pub db: Arc<dyn Database>,
    /// Token verifier selected by `AUTH_PROVIDER`.
    pub verifier: Arc<dyn TokenVerifier>,
    /// LLM provider shared by the chatbot and the safety assistant.
    pub provider: Arc<dyn LlmProvider>,
    /// Analytics pipeline over the shared cache and provider.
    pub analytics: AnalyticsService,
    /// Analysis cache handle, exposed for the admin cache endpoints.
    pub cache: AnalysisCache,
}

/// Starts the `CrimeWatch` API server.
///
/// Connects to the Postgres database, runs migrations, selects the token
/// verifier and LLM provider from the environment, and starts the
/// Actix-Web HTTP server plus the periodic maintenance task. This is a
/// regular async function — the caller is responsible for providing the
/// async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
///
/// # Panics
///
/// Panics if the database connection fails, migrations fail, or the token
/// verifier or LLM provider cannot be configured.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    log::info!("Connecting to database...");
    let db_conn = db::connect_from_env()
        .await
        .expect("Failed to connect to database");

    log::info!("Running migrations...");
    run_migrations(db_conn.as_ref())
        .await
        .expect("Failed to run migrations");

    let verifier = create_verifier_from_env().expect("Failed to configure token verifier");
    let provider = create_provider_from_env().expect("Failed to configure LLM provider");
    let provider: Arc<dyn LlmProvider> = Arc::from(provider);

    let cache = AnalysisCache::from_env(Arc::new(SystemClock));
    let requester = NarrativeRequester::new(Arc::clone(&provider));
    let analytics = AnalyticsService::new(cache.clone(), requester);

    let db: Arc<dyn Database> = Arc::from(db_conn);
    spawn_maintenance(Arc::clone(&db), cache.clone());

    let state = web::Data::new(AppState {
        db,
        verifier: Arc::from(verifier),
        provider,
        analytics,
        cache,
    });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8000);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = configure_cors();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/login", web::post().to(handlers::auth::login))
                    .route("/logout", web::post().to(handlers::auth::logout))
                    .route("/crimes", web::get().to(handlers::public::crimes_for_location))
                    .route("/chatbot", web::post().to(handlers::assistant::chatbot))
                    .service(
                        web::scope("/public")
                            .route("/heatmap", web::get().to(handlers::public::heatmap))
                            .route(
                                "/locations/{id}/stats",
                                web::get().to(handlers::public::location_stats),
                            )
                            .route(
                                "/recent-crimes",
                                web::get().to(handlers::public::recent_crimes),
                            ),
                    )
                    .service(
                        web::scope("/assistant")
                            .route("/query", web::post().to(handlers::assistant::query))
                            .route(
                                "/popular-queries",
                                web::get().to(handlers::assistant::popular_queries),
                            )
                            .route(
                                "/safety-tips/{location}",
                                web::get().to(handlers::assistant::safety_tips),
                            ),
                    )
                    .service(
                        web::scope("/admin")
                            .route(
                                "/register-manager",
                                web::post().to(handlers::admin::register_manager),
                            )
                            .route("/users", web::get().to(handlers::admin::list_users))
                            .route("/users/{id}", web::patch().to(handlers::admin::update_user))
                            .route(
                                "/users/{id}/status",
                                web::patch().to(handlers::admin::set_user_status),
                            )
                            .route("/locations", web::get().to(handlers::admin::list_locations))
                            .route("/locations", web::post().to(handlers::admin::create_location))
                            .route(
                                "/locations/import",
                                web::post().to(handlers::admin::import_locations),
                            )
                            .route(
                                "/locations/{id}",
                                web::patch().to(handlers::admin::update_location),
                            )
                            .route(
                                "/locations/{id}",
                                web::delete().to(handlers::admin::delete_location),
                            )
                            .route(
                                "/locations/{id}/status",
                                web::patch().to(handlers::admin::set_location_status),
                            )
                            .route("/crimes", web::get().to(handlers::admin::list_crimes))
                            .route("/crimes", web::post().to(handlers::admin::create_crime))
                            .route(
                                "/crimes/import",
                                web::post().to(handlers::admin::import_crimes),
                            )
                            .route("/cache/stats", web::get().to(handlers::admin::cache_stats))
                            .route("/cache/clear", web::post().to(handlers::admin::clear_cache)),
                    )
                    .service(
                        web::scope("/manager")
                            .route("/analytics", web::get().to(handlers::manager::analytics))
                            .route(
                                "/analytics/summary",
                                web::get().to(handlers::manager::quick_stats),
                            )
                            .route("/profile", web::get().to(handlers::manager::profile)),
                    ),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

/// Builds the CORS policy: the fixed frontend origins plus an optional
/// `FRONTEND_URL` override, with credentials enabled.
fn configure_cors() -> Cors {
    let mut cors = Cors::default()
        .allowed_origin("http://localhost:3000")
        .allowed_origin("https://crimewatch-nine.vercel.app")
        .allowed_methods(["GET", "POST", "PUT", "DELETE", "PATCH", "OPTIONS"])
        .allowed_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
        .supports_credentials();

    if let Ok(frontend_url) = std::env::var("FRONTEND_URL") {
        cors = cors.allowed_origin(&frontend_url);
    }

    cors
}

/// Spawns the periodic maintenance task: sweeps expired analysis cache
/// entries and purges expired session rows on the shared cadence.
fn spawn_maintenance(db: Arc<dyn Database>, cache: AnalysisCache) {
    actix_rt::spawn(async move {
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        // The first tick of a tokio interval completes immediately; skip
        // it so the sweep starts one full interval after boot.
        interval.tick().await;

        loop {
            interval.tick().await;

            let dropped = cache.sweep();
            if dropped > 0 {
                log::info!("Analysis cache sweep dropped {dropped} expired entries");
            }

            match purge_expired(db.as_ref()).await {
                Ok(0) => {}
                Ok(purged) => log::info!("Purged {purged} expired sessions"),
                Err(e) => log::error!("Failed to purge expired sessions: {e}"),
            }
        }
    });
}
