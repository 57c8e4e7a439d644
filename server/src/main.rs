use actix_cors::Cors;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use std::io;

use server::config::ServerConfig;
use server::document_file::DocumentStore;
use server::handlers;
use server::server::spawn_server;

#[actix_web::main]
async fn main() -> io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig::from_env()
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err))?;
    let store = DocumentStore::open(&config.data_dir)
        .await
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    let srv_tx = spawn_server(store.clone(), config.save_debounce);

    log::info!("Listening on {}", config.bind);
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .app_data(web::Data::new(srv_tx.clone()))
            .app_data(web::Data::new(store.clone()))
            .configure(handlers::root)
    })
    .bind(config.bind)?
    .run()
    .await
}
