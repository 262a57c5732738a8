use super::{AuditLevel, AuditPackage, AuditSink};

/// 丢弃所有事件
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _level: AuditLevel, _package: AuditPackage, _message: &str) {}

    fn name(&self) -> &'static str {
        "none"
    }
}
