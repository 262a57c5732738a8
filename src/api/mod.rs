//! HTTP 层
//!
//! 把请求翻译成存储操作，再把结果映射为响应。路由注册顺序：
//! `/`、`/shorturls`、最后是兜底的 `/{shortcode}`。

pub mod services;
pub mod state;
pub mod types;

use actix_web::web;

pub use state::AppState;

/// 注册全部路由和 JSON 配置
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(types::json_config())
        .service(services::health_routes())
        .configure(services::shorturl_routes)
        .service(services::redirect_routes());
}
