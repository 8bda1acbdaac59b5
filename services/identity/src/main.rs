use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod channel;
mod errors;
mod jwt;
mod middleware;
mod models;
mod password;
mod registration;
mod repositories;
mod routes;
mod session;
mod store;
mod uploader;
mod validation;

use crate::channel::ChannelAggregator;
use crate::jwt::{JwtConfig, TokenIssuer};
use crate::registration::RegistrationFlow;
use crate::repositories::{SubscriptionRepository, UserRepository};
use crate::session::SessionManager;
use crate::uploader::{S3Config, S3MediaStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionManager,
    pub registration: RegistrationFlow,
    pub channels: ChannelAggregator,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting identity service");

    // Initialize database connection pool
    let db_config = common::database::DatabaseConfig::from_env()?;
    let pool = common::database::init_pool(&db_config).await?;

    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Token issuer: missing or empty secrets are a fatal startup condition
    let jwt_config = JwtConfig::from_env()?;
    let issuer = TokenIssuer::new(jwt_config)?;

    let users = Arc::new(UserRepository::new(pool.clone()));
    let subscriptions = Arc::new(SubscriptionRepository::new(pool.clone()));

    let s3_config = S3Config::from_env()?;
    let media = Arc::new(S3MediaStore::from_env(s3_config).await);

    let upload_timeout = std::env::var("MEDIA_UPLOAD_TIMEOUT")
        .unwrap_or_else(|_| "30".to_string())
        .parse()
        .unwrap_or(30);

    let app_state = AppState {
        sessions: SessionManager::new(users.clone(), issuer),
        registration: RegistrationFlow::new(
            users.clone(),
            media,
            Duration::from_secs(upload_timeout),
        ),
        channels: ChannelAggregator::new(users, subscriptions),
    };

    info!("Identity service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let bind_addr =
        std::env::var("IDENTITY_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Identity service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
