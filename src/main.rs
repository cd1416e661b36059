use axum::{
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use dotenvy::dotenv;
use http::header::{HeaderValue, CACHE_CONTROL};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;

use workshops_backend::web::middleware::auth as auth_middleware;
use workshops_backend::web::routes::{activities, admin, deposits, enrollments, workshops};

#[tokio::main]
async fn main() {
    dotenv().ok();

    // 1. Logging
    tracing_subscriber::fmt::init();

    // 2. Database
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    println!("Connecting to database: {}", db_url);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await
        .expect("Could not connect to the database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Could not run migrations");

    // 3. Admin routes behind auth + role layers
    let admin_routes = Router::new()
        .route(
            "/workshops/:id/enrollments",
            get(enrollments::list_enrollments_handler),
        )
        .route(
            "/workshops/:id/enrollments/:user_id",
            delete(enrollments::admin_unenroll_handler),
        )
        .route("/deposits/list", get(deposits::list_deposits_handler))
        .route(
            "/deposits/:id/review",
            post(deposits::review_deposit_handler),
        )
        .route("/activities", get(activities::list_activities_handler))
        .route("/admin/stats", get(admin::dashboard_stats_handler))
        .layer(middleware::from_fn(auth_middleware::require_admin))
        .layer(middleware::from_fn(auth_middleware::require_auth));

    // 4. Student routes behind the auth layer
    let protected_routes = Router::new()
        .route(
            "/workshops/enrollments/me/summary",
            get(enrollments::my_summary_handler),
        )
        .route("/workshops/:id/enroll", post(enrollments::enroll_handler))
        .route(
            "/workshops/:id/enrollment",
            get(enrollments::my_enrollment_handler).delete(enrollments::self_unenroll_handler),
        )
        .route(
            "/deposits/:id",
            get(deposits::get_deposit_handler)
                .put(deposits::update_deposit_handler)
                .delete(deposits::delete_deposit_handler),
        )
        .layer(middleware::from_fn(auth_middleware::require_auth));

    // 5. Whole application. Admin methods sharing a public path guard
    // the role inside their handler.
    let app = Router::new()
        .route("/health", get(|| async { Json(json!({ "status": "ok" })) }))
        .route(
            "/workshops",
            get(workshops::list_workshops_handler).post(workshops::create_workshop_handler),
        )
        .route(
            "/workshops/:id",
            get(workshops::get_workshop_handler)
                .put(workshops::update_workshop_handler)
                .delete(workshops::delete_workshop_handler),
        )
        .route(
            "/deposits",
            post(deposits::create_deposit_handler).get(deposits::deposit_status_handler),
        )
        .merge(admin_routes)
        .merge(protected_routes)
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        .with_state(pool);

    // 6. Bind (with fallback port)
    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(4000);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Could not parse host/port");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!(
                "Could not bind on {}: {}. Trying fallback {}:{}",
                addr,
                e,
                host,
                port + 1
            );
            let fallback: SocketAddr = format!("{}:{}", host, port + 1)
                .parse()
                .expect("Could not parse fallback address");
            tokio::net::TcpListener::bind(fallback)
                .await
                .expect("Could not bind on fallback port")
        }
    };

    let bound_addr = listener.local_addr().unwrap();
    println!("Backend listening on http://{}", bound_addr);

    axum::serve(listener, app).await.unwrap();
}
