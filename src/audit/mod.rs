//! 审计日志
//!
//! 每次建链、跳转、查询统计都会产生一条审计事件。事件通过
//! [`AuditSink`] 投递，具体后端由配置决定：
//! - `tracing`：写入本地日志
//! - `http`：投递到远端日志服务（带 token 刷新和重试）
//! - `none`：丢弃

pub mod http;
mod memory;
mod noop;
mod tracing_sink;

use std::sync::Arc;

use serde::Serialize;
use strum::AsRefStr;

pub use http::HttpAuditSink;
pub use memory::MemoryAuditSink;
pub use noop::NoopAuditSink;
pub use tracing_sink::TracingAuditSink;

use crate::config::{AuditBackend, AuditConfig};
use crate::errors::Result;

/// 审计事件级别（序列化为远端服务接受的小写名称）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AuditLevel {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

/// 产生事件的模块
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AuditPackage {
    Db,
    Route,
    Service,
    Config,
}

/// 一条审计事件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    pub level: AuditLevel,
    pub package: AuditPackage,
    pub message: String,
}

/// 审计事件投递能力
///
/// 实现必须是非阻塞且不会失败的：投递失败只能在实现内部处理，
/// 不能影响调用方的业务流程。
pub trait AuditSink: Send + Sync {
    fn record(&self, level: AuditLevel, package: AuditPackage, message: &str);

    fn name(&self) -> &'static str;

    fn debug(&self, package: AuditPackage, message: &str) {
        self.record(AuditLevel::Debug, package, message);
    }

    fn info(&self, package: AuditPackage, message: &str) {
        self.record(AuditLevel::Info, package, message);
    }

    fn warn(&self, package: AuditPackage, message: &str) {
        self.record(AuditLevel::Warn, package, message);
    }

    fn error(&self, package: AuditPackage, message: &str) {
        self.record(AuditLevel::Error, package, message);
    }

    fn fatal(&self, package: AuditPackage, message: &str) {
        self.record(AuditLevel::Fatal, package, message);
    }
}

/// 根据配置创建审计后端
pub fn build_audit_sink(config: &AuditConfig) -> Result<Arc<dyn AuditSink>> {
    let sink: Arc<dyn AuditSink> = match config.backend_kind()? {
        AuditBackend::Tracing => Arc::new(TracingAuditSink),
        AuditBackend::Http => Arc::new(HttpAuditSink::spawn(config)?),
        AuditBackend::None => Arc::new(NoopAuditSink),
    };
    tracing::info!("Audit sink: {}", sink.name());
    Ok(sink)
}
