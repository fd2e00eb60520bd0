use actix_web::{web, App, HttpServer};
use backend::config::Config;
use backend::services;
use backend::state::AppState;
use env_logger::Env;
use log::info;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| std::io::Error::other(e.to_string()))?;
    let state = AppState::from_config(&config).map_err(|e| std::io::Error::other(e.to_string()))?;

    let store = state.schemas.store();
    info!(
        "Server running at http://{}:{} (store: {}, field storage: {:?}, scope: {:?})",
        config.host,
        config.port,
        store.path().display(),
        store.field_storage(),
        config.scope_mode
    );

    HttpServer::new(move || {
        App::new()
            .app_data(web::JsonConfig::default().limit(10 * 1024 * 1024)) // 10 MB
            .app_data(web::Data::new(state.clone()))
            .service(services::schemas::configure_routes())
            .service(services::identifiers::configure_routes())
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
