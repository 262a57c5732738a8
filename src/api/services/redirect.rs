use actix_web::http::{StatusCode, header};
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::{debug, trace};

use crate::api::state::AppState;
use crate::api::types::{ERR_EXPIRED, ERR_NOT_FOUND, ErrorResponse};
use crate::audit::{AuditPackage, AuditSink};
use crate::store::Resolution;
use crate::utils::is_valid_shortcode;

pub struct RedirectService;

impl RedirectService {
    /// `GET /{shortcode}`
    pub async fn handle_redirect(
        req: HttpRequest,
        state: web::Data<AppState>,
        path: web::Path<String>,
    ) -> HttpResponse {
        let shortcode = path.into_inner();
        state.audit.info(
            AuditPackage::Route,
            &format!("GET /{} (redirect) called.", shortcode),
        );

        // 非法短码直接 404，不进存储
        if !is_valid_shortcode(&shortcode) {
            trace!("Invalid shortcode rejected: {}", shortcode);
            return Self::not_found(&state, &shortcode);
        }

        let referrer = req
            .headers()
            .get(header::REFERER)
            .and_then(|h| h.to_str().ok())
            .map(String::from);

        // 没有地理位置来源，location 始终为空
        match state.store.resolve_and_click(&shortcode, referrer, None) {
            Resolution::Live(record) => {
                state.audit.info(
                    AuditPackage::Route,
                    &format!("Redirecting shortcode {} to {}", shortcode, record.target_url),
                );
                HttpResponse::Found()
                    .insert_header((header::LOCATION, record.target_url))
                    .finish()
            }
            Resolution::Expired => {
                debug!("Shortcode {} has expired", shortcode);
                state.audit.warn(
                    AuditPackage::Route,
                    &format!("Shortcode {} has expired.", shortcode),
                );
                ErrorResponse::response(StatusCode::GONE, ERR_EXPIRED)
            }
            Resolution::Missing => Self::not_found(&state, &shortcode),
        }
    }

    fn not_found(state: &AppState, shortcode: &str) -> HttpResponse {
        state.audit.warn(
            AuditPackage::Route,
            &format!("Shortcode {} not found for redirection.", shortcode),
        );
        ErrorResponse::response(StatusCode::NOT_FOUND, ERR_NOT_FOUND)
    }
}

/// Redirect 路由配置（必须最后注册）
pub fn redirect_routes() -> actix_web::Resource {
    web::resource("/{shortcode}").route(web::get().to(RedirectService::handle_redirect))
}
