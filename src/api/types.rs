//! HTTP 请求/响应类型

use actix_web::{HttpResponse, http::StatusCode, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::ClickEvent;

/// `POST /shorturls` 请求体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateShortUrlBody {
    pub url: String,
    #[serde(default)]
    pub validity: Option<i64>,
    #[serde(default)]
    pub shortcode: Option<String>,
}

/// `POST /shorturls` 成功响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShortUrlResponse {
    pub short_link: String,
    pub expiry: DateTime<Utc>,
}

/// `GET /shorturls/{shortcode}` 响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub short_link: String,
    pub original_url: String,
    pub created: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
    pub clicks: usize,
    pub click_details: Vec<ClickEvent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

/// 所有错误统一为 `{"error": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn response<T: Into<String>>(status: StatusCode, error: T) -> HttpResponse {
        HttpResponse::build(status).json(ErrorResponse {
            error: error.into(),
        })
    }
}

pub const ERR_NOT_FOUND: &str = "Shortcode not found";
pub const ERR_EXPIRED: &str = "Shortcode has expired";
pub const ERR_UNEXPECTED_PREFIX: &str = "An unexpected error occurred: ";

/// JSON 解析失败时返回 400 `{"error": ...}`，而不是 actix 默认的纯文本
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| {
            let response = ErrorResponse::response(StatusCode::BAD_REQUEST, err.to_string());
            actix_web::error::InternalError::from_response(err, response).into()
        })
}
