use std::sync::Arc;

use actix_web::{middleware, web, App, HttpServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use usergraph::auth::jwt_verifier;
use usergraph::config::Config;
use usergraph::core::db::init_demo_data;
use usergraph::core::store::{AccountStore, MemoryStore};
use usergraph::routes::{configure_routes, not_found};
use usergraph::AppState;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,usergraph=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let accounts: Arc<dyn AccountStore> = Arc::new(MemoryStore::new());
    let verifier = jwt_verifier(&config.jwt_secret, config.jwt_issuer.as_deref());
    let state = web::Data::new(AppState::new(accounts, verifier, config.clone()));

    if config.seed_demo_data {
        init_demo_data(state.accounts.as_ref(), &state.graph, config.avatar_size)
            .await
            .map_err(|e| anyhow::anyhow!("seeding demo data failed: {}", e))?;
    }

    tracing::info!(bind = %config.bind, "server listening");

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure_routes)
            .default_service(web::route().to(not_found))
    })
    .bind(&config.bind)?
    .run()
    .await?;

    Ok(())
}
