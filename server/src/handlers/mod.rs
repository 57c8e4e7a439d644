use crate::connection::ws_index;
use crate::handlers::documents::configure_document_handlers;
use actix_web::web;

mod documents;

pub fn root(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws").route(web::get().to(ws_index)));

    configure_document_handlers(cfg);
}
