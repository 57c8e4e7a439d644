use crate::document_file::DocumentStore;
use crate::export::ExportFormat;
use crate::server::{ServerCommand, ServerTx};
use actix_web::error;
use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse};
use actix_web::Responder;
use actix_web::Result;
use serde::Deserialize;
use system::serde_json::json;

pub fn configure_document_handlers(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/document/save").route(web::post().to(save_document)))
        .service(web::resource("/api/sessions").route(web::get().to(list_sessions)))
        .service(web::resource("/api/export").route(web::get().to(export_document)));
}

#[derive(Debug, Deserialize)]
pub struct SaveDocumentParam {
    session_code: String,
    content: String,
}

/// Stores the content of a session. The bearer credential, if any, is not checked here.
pub async fn save_document(
    req: HttpRequest,
    body: web::Json<SaveDocumentParam>,
    srv_tx: web::Data<ServerTx>,
) -> Result<impl Responder> {
    let SaveDocumentParam {
        session_code,
        content,
    } = body.into_inner();
    if session_code.is_empty() {
        return Err(error::ErrorBadRequest("Session code is required"));
    }
    if req.headers().contains_key(header::AUTHORIZATION) {
        log::debug!("Authenticated save for session {}", session_code);
    }

    let (tx, rx) = tokio::sync::oneshot::channel();
    srv_tx
        .get_ref()
        .send(ServerCommand::SaveDocument {
            session_code,
            content,
            tx,
        })
        .await
        .map_err(|_| error::ErrorInternalServerError("Internal Server Error"))?;

    rx.await
        .map_err(|_| error::ErrorInternalServerError("Receiver await error"))?
        .map_err(|err| {
            log::warn!("Save failed: {}", err);
            error::ErrorInternalServerError("Failed to save document")
        })?;

    Ok(HttpResponse::Ok().json(json!({ "status": "saved" })))
}

pub async fn list_sessions(store: web::Data<DocumentStore>) -> Result<impl Responder> {
    let entries = store.list().await.map_err(|err| {
        log::warn!("Listing sessions failed: {}", err);
        error::ErrorInternalServerError("Failed to list sessions")
    })?;
    Ok(HttpResponse::Ok().json(entries))
}

#[derive(Debug, Deserialize)]
pub struct ExportParam {
    session: Option<String>,
    format: Option<String>,
}

/// Downloads the stored content of a session as an attachment.
pub async fn export_document(
    query: web::Query<ExportParam>,
    store: web::Data<DocumentStore>,
) -> Result<HttpResponse> {
    let ExportParam { session, format } = query.into_inner();
    let session_code = session
        .filter(|code| !code.is_empty())
        .ok_or_else(|| error::ErrorBadRequest("Session code required"))?;
    let format: ExportFormat = format
        .unwrap_or_default()
        .parse()
        .map_err(error::ErrorBadRequest)?;

    let snapshot = store
        .read(&session_code)
        .await
        .map_err(|err| {
            log::warn!("Export of {} failed: {}", session_code, err);
            error::ErrorInternalServerError("Failed to read document")
        })?
        .ok_or_else(|| error::ErrorNotFound("No such session"))?;
    let body = format.render(&snapshot.content).map_err(|err| {
        log::warn!("Export of {} failed: {}", session_code, err);
        error::ErrorInternalServerError("Failed to export document")
    })?;

    let filename = format!(
        "document-{}-{}.{}",
        session_code,
        chrono::Utc::now().format("%Y%m%d-%H%M%S"),
        format.extension()
    );
    log::info!("Exporting session {} as {}", session_code, filename);
    Ok(HttpResponse::Ok()
        .content_type(format.content_type())
        .insert_header(header::ContentDisposition {
            disposition: header::DispositionType::Attachment,
            parameters: vec![header::DispositionParam::Filename(filename)],
        })
        .body(body))
}
