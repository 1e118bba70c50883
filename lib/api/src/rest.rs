use crate::service::DomainService;
use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer, Result as ActixResult};
use domainmap_core::{Error, NewDomain};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Deserialize)]
struct DomainsQuery {
    #[serde(rename = "parentId")]
    parent_id: Option<String>,
}

#[derive(Deserialize)]
struct PositionsRequest {
    #[serde(default)]
    positions: Option<serde_json::Map<String, serde_json::Value>>,
}

pub struct RestApi;

impl RestApi {
    pub async fn start(service: Arc<DomainService>, host: &str, port: u16) -> std::io::Result<()> {
        info!("REST API listening on {}:{}", host, port);
        HttpServer::new(move || {
            let cors = Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600);

            App::new()
                .wrap(cors)
                .app_data(web::Data::new(service.clone()))
                .configure(Self::routes)
        })
        .bind((host, port))?
        .run()
        .await
    }

    /// Register the domain routes; the app must provide
    /// `web::Data<Arc<DomainService>>`
    pub fn routes(cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::JsonConfig::default().error_handler(json_error))
            .app_data(web::QueryConfig::default().error_handler(query_error))
            .route("/domains", web::get().to(list_domains))
            .route("/domains", web::post().to(create_domain))
            .route("/domains/positions", web::post().to(update_positions))
            .route("/domains/{id}", web::get().to(get_domain))
            .route("/domains/{id}/path", web::get().to(get_domain_path));
    }
}

async fn list_domains(
    service: web::Data<Arc<DomainService>>,
    query: web::Query<DomainsQuery>,
) -> ActixResult<HttpResponse> {
    let parent_id = query.into_inner().parent_id.filter(|p| !p.is_empty());
    let service = service.get_ref().clone();

    // Embedding calls block; keep them off the reactor
    let listing = web::block(move || service.list(parent_id.as_deref())).await?;
    match listing {
        Ok(listing) => Ok(HttpResponse::Ok().json(listing)),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn create_domain(
    service: web::Data<Arc<DomainService>>,
    req: web::Json<NewDomain>,
) -> ActixResult<HttpResponse> {
    let service = service.get_ref().clone();
    let created = web::block(move || service.register(req.into_inner())).await?;
    match created {
        Ok(domain) => Ok(HttpResponse::Created().json(domain)),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn get_domain(
    service: web::Data<Arc<DomainService>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    match service.domain(&path.into_inner()) {
        Ok(domain) => Ok(HttpResponse::Ok().json(domain)),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn get_domain_path(
    service: web::Data<Arc<DomainService>>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let id = path.into_inner();
    match service.path(&id) {
        Ok(path) if path.is_empty() => Ok(error_response(&Error::NotFound(id))),
        Ok(path) => Ok(HttpResponse::Ok().json(serde_json::json!({ "path": path }))),
        Err(e) => Ok(error_response(&e)),
    }
}

async fn update_positions(
    service: web::Data<Arc<DomainService>>,
    req: web::Json<PositionsRequest>,
) -> ActixResult<HttpResponse> {
    let count = req.positions.as_ref().map_or(0, |p| p.len());
    match service.update_positions(count) {
        Ok(count) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "success": true,
            "message": format!("Updated positions for {} domains", count)
        }))),
        Err(e) => Ok(error_response(&e)),
    }
}

fn status_for(e: &Error) -> StatusCode {
    match e {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::InvalidId(_) | Error::InvalidDomain(_) => StatusCode::BAD_REQUEST,
        Error::DuplicateId(_) => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(e: &Error) -> HttpResponse {
    let status = status_for(e);
    if status.is_server_error() {
        error!(status = status.as_u16(), error = %e, "request failed");
    } else {
        warn!(status = status.as_u16(), error = %e, "request rejected");
    }
    HttpResponse::build(status).json(serde_json::json!({
        "error": e.to_string()
    }))
}

fn json_error(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    warn!(path = req.path(), error = %err, "invalid request body");
    let response = HttpResponse::BadRequest().json(serde_json::json!({
        "error": format!("Invalid request body: {}", err)
    }));
    InternalError::from_response(err, response).into()
}

fn query_error(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    warn!(path = req.path(), error = %err, "invalid query");
    let response = HttpResponse::BadRequest().json(serde_json::json!({
        "error": format!("Invalid query: {}", err)
    }));
    InternalError::from_response(err, response).into()
}
