use parking_lot::Mutex;

use super::{AuditEvent, AuditLevel, AuditPackage, AuditSink};

/// 在内存中保存事件，供测试断言
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已记录事件的快照
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    pub fn count_level(&self, level: AuditLevel) -> usize {
        self.events.lock().iter().filter(|e| e.level == level).count()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, level: AuditLevel, package: AuditPackage, message: &str) {
        self.events.lock().push(AuditEvent {
            level,
            package,
            message: message.to_string(),
        });
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
