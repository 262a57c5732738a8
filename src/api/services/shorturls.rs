use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, guard, web};
use tracing::{debug, error};

use crate::api::state::AppState;
use crate::api::types::{
    CreateShortUrlBody, CreateShortUrlResponse, ERR_NOT_FOUND, ERR_UNEXPECTED_PREFIX,
    ErrorResponse, StatsResponse,
};
use crate::audit::{AuditPackage, AuditSink};
use crate::errors::ShortUrlError;
use crate::store::CreateShortUrl;

pub struct ShortUrlService;

impl ShortUrlService {
    /// `POST /shorturls`
    pub async fn create(
        req: HttpRequest,
        state: web::Data<AppState>,
        body: web::Json<CreateShortUrlBody>,
    ) -> HttpResponse {
        state.audit.info(AuditPackage::Route, "POST /shorturls called.");

        let body = body.into_inner();
        let request = CreateShortUrl {
            target_url: body.url,
            validity_minutes: body.validity,
            shortcode: body.shortcode,
        };

        match state.store.create(request) {
            Ok(record) => {
                let short_link = state.short_link(&req, &record.shortcode);
                state.audit.info(
                    AuditPackage::Route,
                    &format!("Short URL created: {}", short_link),
                );
                HttpResponse::Created().json(CreateShortUrlResponse {
                    short_link,
                    expiry: record.expires_at,
                })
            }
            Err(e) if e.is_conflict() => {
                debug!("Create rejected: {}", e);
                state.audit.error(
                    AuditPackage::Route,
                    &format!("Error creating short URL: {}", e.message()),
                );
                ErrorResponse::response(StatusCode::CONFLICT, e.message())
            }
            Err(ShortUrlError::Validation(msg)) => {
                state.audit.error(
                    AuditPackage::Route,
                    &format!("Error creating short URL: {}", msg),
                );
                ErrorResponse::response(StatusCode::BAD_REQUEST, msg)
            }
            Err(e) => {
                error!("Unexpected error creating short URL: {}", e);
                state
                    .audit
                    .fatal(AuditPackage::Route, &format!("Unexpected error: {}", e.message()));
                ErrorResponse::response(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("{}{}", ERR_UNEXPECTED_PREFIX, e.message()),
                )
            }
        }
    }

    /// `GET /shorturls/{shortcode}`
    pub async fn stats(
        req: HttpRequest,
        state: web::Data<AppState>,
        path: web::Path<String>,
    ) -> HttpResponse {
        let shortcode = path.into_inner();
        state.audit.info(
            AuditPackage::Route,
            &format!("GET /shorturls/{} (stats) called.", shortcode),
        );

        match state.store.get_stats(&shortcode) {
            Some(stats) => HttpResponse::Ok().json(StatsResponse {
                short_link: state.short_link(&req, &shortcode),
                original_url: stats.original_url,
                created: stats.created_at,
                expiry: stats.expires_at,
                clicks: stats.click_count,
                click_details: stats.click_log,
            }),
            None => {
                state.audit.warn(
                    AuditPackage::Route,
                    &format!("Stats not found for shortcode {}.", shortcode),
                );
                ErrorResponse::response(StatusCode::NOT_FOUND, ERR_NOT_FOUND)
            }
        }
    }
}

/// 短链管理路由配置
///
/// `/shorturls` 只匹配 POST，`GET /shorturls` 会落到跳转路由上
/// （`shorturls` 本身是合法短码）。
pub fn shorturl_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/shorturls")
            .guard(guard::Post())
            .route(web::post().to(ShortUrlService::create)),
    )
    .service(
        web::resource("/shorturls/{shortcode}").route(web::get().to(ShortUrlService::stats)),
    );
}
