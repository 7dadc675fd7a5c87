use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;

use callback_auth::adapter::{Adapter, MemoryAdapter, MongoAdapter};
use callback_auth::mail::{Mailer, SmtpMailer};
use callback_auth::providers::Providers;
use callback_auth::telemetry::{init_tracing, TracingConfig};
use callback_auth::{configure_routes, session_middleware, AppState, AuthConfig};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing(TracingConfig::for_service("callback-auth"));

    let config = AuthConfig::from_env().context("Failed to load auth configuration")?;
    let providers = Providers::from_config(&config);

    let adapter: Arc<dyn Adapter> = match &config.mongodb_uri {
        Some(uri) => {
            tracing::info!("📊 [Auth Service] Connecting to MongoDB (db: {})...", config.mongodb_db);
            let adapter = MongoAdapter::connect(uri, &config.mongodb_db)
                .await
                .context("Failed to connect to MongoDB")?;
            tracing::info!("✅ [Auth Service] MongoDB connection established");
            Arc::new(adapter)
        }
        None => {
            tracing::warn!("[Auth Service] MONGODB_URI not set; using in-memory storage. Users are lost on restart.");
            Arc::new(MemoryAdapter::new())
        }
    };

    let mailer: Option<Arc<dyn Mailer>> = match &config.email {
        Some(settings) => Some(Arc::new(
            SmtpMailer::new(settings).context("Failed to configure SMTP transport")?,
        )),
        None => None,
    };

    let port = config.port;
    let allowed_origin = config.base_url.origin().ascii_serialization();
    let state = AppState::new(config, providers, adapter, mailer, reqwest::Client::new());

    tracing::info!("🚀 [Auth Service] Starting on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allowed_origin(&allowed_origin)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials();

        App::new()
            .app_data(web::Data::new(state.clone()))
            .wrap(session_middleware(&state.config))
            .wrap(cors)
            .wrap(TracingLogger::default())
            .configure(configure_routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    Ok(())
}
