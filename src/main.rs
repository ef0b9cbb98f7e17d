use std::sync::Arc;

use axum::http::{HeaderValue, Method, header};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use donation_tracker::config::Config;
use donation_tracker::crypto::hash_password;
use donation_tracker::db::{AppState, create_pool, init_db, queries};
use donation_tracker::error::Result;
use donation_tracker::handlers;
use donation_tracker::jwt::TokenIssuer;
use donation_tracker::models::{CreateDonationEvent, CreateUser, Role};
use donation_tracker::payments::StripeClient;

#[derive(Parser, Debug)]
#[command(name = "donation-tracker")]
#[command(about = "Donation tracking backend with Stripe checkout")]
struct Cli {
    /// Seed the database with dev data (admin user and a sample event)
    #[arg(long)]
    seed: bool,

    /// Delete the database on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,
}

const DEV_ADMIN_EMAIL: &str = "admin@donations.local";
const DEV_ADMIN_PASSWORD: &str = "dev-admin-password";

/// Promote an existing account to admin when no admin exists yet.
fn bootstrap_admin(state: &AppState, email: &str) -> Result<()> {
    let conn = state.db.get()?;

    if queries::count_admins(&conn)? > 0 {
        tracing::info!("Admins already exist, skipping bootstrap");
        return Ok(());
    }

    match queries::get_user_by_email(&conn, email)? {
        Some(user) => {
            queries::update_user_role(&conn, &user.id, Role::Admin)?;
            tracing::info!("============================================");
            tracing::info!("BOOTSTRAP ADMIN: {} ({})", user.email, user.id);
            tracing::info!("============================================");
        }
        None => {
            tracing::warn!(
                "BOOTSTRAP_ADMIN_EMAIL={} has no account yet; register it and restart",
                email
            );
        }
    }
    Ok(())
}

/// Seeds the database with an admin and one sample event.
/// Only runs in dev mode and when no admin exists.
fn seed_dev_data(state: &AppState) -> Result<()> {
    let conn = state.db.get()?;

    if queries::count_admins(&conn)? > 0 {
        tracing::info!("Database already has an admin, skipping seed");
        return Ok(());
    }

    tracing::info!("============================================");
    tracing::info!("SEEDING DEV DATA");
    tracing::info!("============================================");

    let admin_input = CreateUser {
        name: "Dev Admin".to_string(),
        email: DEV_ADMIN_EMAIL.to_string(),
        password: DEV_ADMIN_PASSWORD.to_string(),
        university: None,
        address: None,
    };
    let admin = queries::create_user(
        &conn,
        &admin_input,
        &hash_password(DEV_ADMIN_PASSWORD)?,
        Role::Admin,
    )?;
    tracing::info!("Admin: {} ({})", admin.email, admin.id);

    let event = queries::create_donation_event(
        &conn,
        &CreateDonationEvent {
            title: "Campus Library Renovation".to_string(),
            goal_cents: 10_000,
            details: "Help us replace the reading room furniture.".to_string(),
            image_url: None,
        },
        Some(&admin.id),
    )?;
    tracing::info!("Event: {} (id: {}, goal {} cents)", event.title, event.id, event.goal_cents);

    let token = state.tokens.issue(&admin)?;

    // Copy-paste friendly output (no log formatting)
    println!();
    println!("--- COPY FROM HERE ---");
    println!("  admin_email: {}", DEV_ADMIN_EMAIL);
    println!("  admin_password: {}", DEV_ADMIN_PASSWORD);
    println!("  admin_token: {}", token);
    println!("  event_id: {}", event.id);
    println!("--- END COPY ---");
    println!();

    Ok(())
}

fn exit_with(message: impl std::fmt::Display) -> ! {
    eprintln!("{}", message);
    std::process::exit(1);
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "donation_tracker=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().unwrap_or_else(|e| exit_with(format!("Configuration error: {}", e)));

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let db_pool = create_pool(&config.database_path)
        .unwrap_or_else(|e| exit_with(format!("Failed to create database pool: {}", e)));
    {
        let conn = db_pool
            .get()
            .unwrap_or_else(|e| exit_with(format!("Failed to get connection: {}", e)));
        init_db(&conn).unwrap_or_else(|e| exit_with(format!("Failed to initialize database: {}", e)));
    }

    let gateway = StripeClient::new(&config.stripe)
        .unwrap_or_else(|e| exit_with(format!("Failed to create Stripe client: {}", e)));

    let state = AppState {
        db: db_pool,
        gateway: Arc::new(gateway),
        tokens: TokenIssuer::new(config.jwt_secret.as_bytes(), config.token_ttl_days),
        frontend_url: config.frontend_url.clone(),
        currency: config.stripe.currency.clone(),
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set APP_ENV=dev)");
        } else if let Err(e) = seed_dev_data(&state) {
            tracing::error!("Failed to seed dev data: {}", e);
        }
    }

    if let Some(ref email) = config.bootstrap_admin_email
        && let Err(e) = bootstrap_admin(&state, email)
    {
        tracing::error!("Failed to bootstrap admin: {}", e);
    }

    let cors = match config.frontend_url.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        Err(_) => {
            tracing::warn!("FRONTEND_URL is not a valid origin; CORS disabled");
            CorsLayer::new()
        }
    };

    let app = handlers::router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| exit_with(format!("Failed to bind to {}: {}", addr, e)));

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    let db_path = config.database_path.clone();

    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: database will be deleted on exit");
    }

    tracing::info!("Donation tracker listening on {}", addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!("Server error: {}", e);
    }

    if cleanup_on_exit {
        tracing::info!("Cleaning up ephemeral database...");
        if let Err(e) = std::fs::remove_file(&db_path) {
            tracing::warn!("Failed to remove {}: {}", db_path, e);
        } else {
            tracing::info!("Removed {}", db_path);
        }
        // Also remove WAL and SHM files if they exist
        let _ = std::fs::remove_file(format!("{}-wal", db_path));
        let _ = std::fs::remove_file(format!("{}-shm", db_path));
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
