use tracing::{debug, error, info, warn};

use super::{AuditLevel, AuditPackage, AuditSink};

/// 把审计事件写入本地 tracing 日志
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, level: AuditLevel, package: AuditPackage, message: &str) {
        let package = package.as_ref();
        match level {
            AuditLevel::Debug => debug!(target: "audit", package, "{}", message),
            AuditLevel::Info => info!(target: "audit", package, "{}", message),
            AuditLevel::Warn => warn!(target: "audit", package, "{}", message),
            AuditLevel::Error => error!(target: "audit", package, "{}", message),
            // tracing 没有 fatal 级别
            AuditLevel::Fatal => error!(target: "audit", package, fatal = true, "{}", message),
        }
    }

    fn name(&self) -> &'static str {
        "tracing"
    }
}
