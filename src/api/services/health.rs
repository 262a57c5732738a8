use actix_web::{HttpResponse, Responder, web};
use tracing::trace;

use crate::api::state::AppState;
use crate::api::types::StatusResponse;
use crate::audit::{AuditPackage, AuditSink};

pub struct HealthService;

impl HealthService {
    /// `GET /`
    pub async fn status(state: web::Data<AppState>) -> impl Responder {
        trace!("Received status request");
        state.audit.info(AuditPackage::Route, "GET / called.");

        HttpResponse::Ok().json(StatusResponse {
            status: "online".to_string(),
        })
    }
}

/// Health 路由配置
pub fn health_routes() -> actix_web::Resource {
    web::resource("/").route(web::get().to(HealthService::status))
}
