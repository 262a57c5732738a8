use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, info};

use crate::api::AppState;
use crate::audit::{AuditPackage, AuditSink, build_audit_sink};
use crate::config::StaticConfig;
use crate::store::ShortcodeStore;

/// 准备服务器启动的上下文
/// 包括审计通道和短码存储
pub fn prepare_server_startup(config: &StaticConfig) -> Result<AppState> {
    let start_time = std::time::Instant::now();
    debug!("Starting pre-startup processing...");

    let audit = build_audit_sink(&config.audit).context("Failed to initialize audit sink")?;
    info!("Using audit backend: {}", audit.name());

    let store = Arc::new(ShortcodeStore::new(audit.clone()));

    let public_url = config
        .server
        .public_url
        .as_ref()
        .map(|u| u.trim_end_matches('/').to_string());
    if let Some(ref url) = public_url {
        info!("Short links will be issued under {}", url);
    }

    audit.info(AuditPackage::Config, "Server components initialized.");
    debug!(
        "Pre-startup processing completed in {} ms",
        start_time.elapsed().as_millis()
    );

    Ok(AppState::new(store, audit, public_url))
}
