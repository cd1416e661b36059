//! Force-remove a workshop enrollment for a user (maintenance tool).
//!
//! Usage:
//!   force_unenroll --email=user@example.com --workshop-id=WORK-202510-795725
//!   force_unenroll --user-id=<uuid> --workshop-id=<id> --reset-unenroll-flag

use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::env;
use uuid::Uuid;

use workshops_backend::services::enrollment_service::{
    self, EnrollmentError, ForceUnenrollTarget,
};

#[derive(Default)]
struct Args {
    email: Option<String>,
    user_id: Option<Uuid>,
    workshop_id: Option<String>,
    reset_flag: bool,
}

fn parse_args() -> Args {
    let mut args = Args::default();
    for raw in env::args().skip(1) {
        let (key, value) = match raw.split_once('=') {
            Some((k, v)) => (k.to_string(), Some(v.to_string())),
            None => (raw, None),
        };
        match key.trim_start_matches('-') {
            "email" => args.email = value,
            "user-id" => args.user_id = value.and_then(|v| Uuid::parse_str(&v).ok()),
            "workshop-id" => args.workshop_id = value,
            "reset-unenroll-flag" => args.reset_flag = true,
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
    }
    args
}

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let args = parse_args();
    let Some(workshop_id) = args.workshop_id.clone() else {
        eprintln!("Error: provide --workshop-id");
        std::process::exit(1);
    };
    let target = match (args.user_id, args.email.as_deref()) {
        (Some(id), _) => ForceUnenrollTarget::UserId(id),
        (None, Some(email)) => ForceUnenrollTarget::Email(email),
        (None, None) => {
            eprintln!("Error: provide --email or --user-id");
            std::process::exit(1);
        }
    };

    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&db_url)
        .await
        .expect("Could not connect to the database");

    match enrollment_service::force_unenroll(&pool, target, &workshop_id, args.reset_flag).await {
        Ok(user_id) => {
            println!(
                "Force unenrolled user {} from workshop {}{}",
                user_id,
                workshop_id,
                if args.reset_flag {
                    " (reset unenroll flag)"
                } else {
                    ""
                }
            );
        }
        Err(EnrollmentError::EnrollmentNotFound) => {
            eprintln!("Enrollment not found in workshop {}", workshop_id);
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("Failed to force unenroll: {}", e);
            std::process::exit(1);
        }
    }
}
