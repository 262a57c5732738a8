use std::sync::Arc;

use actix_web::HttpRequest;

use crate::audit::AuditSink;
use crate::store::ShortcodeStore;

/// 所有 handler 共享的状态，启动时构建一次
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ShortcodeStore>,
    pub audit: Arc<dyn AuditSink>,
    /// 对外短链前缀；为空时根据请求拼接
    pub public_url: Option<String>,
}

impl AppState {
    pub fn new(
        store: Arc<ShortcodeStore>,
        audit: Arc<dyn AuditSink>,
        public_url: Option<String>,
    ) -> Self {
        Self {
            store,
            audit,
            public_url,
        }
    }

    /// 拼接完整短链
    pub fn short_link(&self, req: &HttpRequest, shortcode: &str) -> String {
        match self.public_url {
            Some(ref base) => format!("{}/{}", base.trim_end_matches('/'), shortcode),
            None => {
                let info = req.connection_info();
                format!("{}://{}/{}", info.scheme(), info.host(), shortcode)
            }
        }
    }
}
