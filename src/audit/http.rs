//! 远端审计日志服务
//!
//! 事件先进入有界队列，由后台线程串行投递：
//! 1. 用配置中的凭据换取 bearer token（缓存，临近过期时刷新）
//! 2. POST `{stack, level, package, message}` 到日志接口
//! 3. 失败时指数退避重试，401 会先作废 token
//!
//! 队列满时直接丢弃事件，业务请求永远不会因为审计而阻塞。

use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};
use ureq::Agent;

use super::{AuditEvent, AuditLevel, AuditPackage, AuditSink};
use crate::config::AuditConfig;
use crate::errors::{Result, ShortUrlError};

/// token 过期前多少秒开始刷新
pub const TOKEN_REFRESH_MARGIN_SECS: i64 = 900;

/// 换取 token 时提交的凭据
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub email: String,
    pub name: String,
    pub roll_no: String,
    pub access_code: String,
    #[serde(rename = "clientID")]
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn from_config(config: &AuditConfig) -> Self {
        Self {
            email: config.email.clone(),
            name: config.name.clone(),
            roll_no: config.roll_no.clone(),
            access_code: config.access_code.clone(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
        }
    }

    fn is_complete(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

/// 认证接口返回的 token，`expiry` 为 unix 秒
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AccessToken {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub expiry: i64,
}

impl AccessToken {
    /// 空 token、没有过期时间、或距离过期不足 15 分钟都需要重新获取
    pub fn needs_refresh(&self, now_ts: i64) -> bool {
        self.access_token.is_empty()
            || self.expiry <= 0
            || now_ts > self.expiry - TOKEN_REFRESH_MARGIN_SECS
    }
}

/// 日志接口请求体
#[derive(Debug, Serialize)]
pub struct LogPayload<'a> {
    pub stack: &'a str,
    pub level: AuditLevel,
    pub package: AuditPackage,
    pub message: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// 401，token 已失效
    Unauthorized,
    Failed(String),
}

impl std::fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeliveryError::Unauthorized => write!(f, "unauthorized"),
            DeliveryError::Failed(msg) => write!(f, "{}", msg),
        }
    }
}

pub type DeliveryResult<T> = std::result::Result<T, DeliveryError>;

impl From<DeliveryError> for ShortUrlError {
    fn from(err: DeliveryError) -> Self {
        match err {
            DeliveryError::Unauthorized => {
                ShortUrlError::audit_delivery("log service rejected the access token")
            }
            DeliveryError::Failed(msg) => ShortUrlError::audit_delivery(msg),
        }
    }
}

/// 远端服务的传输层
pub trait AuditTransport: Send + 'static {
    fn fetch_token(&self, credentials: &Credentials) -> DeliveryResult<AccessToken>;

    fn post_log(&self, token: &str, payload: &LogPayload<'_>) -> DeliveryResult<()>;
}

/// 基于 ureq 的同步 HTTP 传输（运行在专用线程里）
pub struct UreqTransport {
    agent: Agent,
    auth_url: String,
    log_url: String,
}

impl UreqTransport {
    pub fn new(config: &AuditConfig) -> Self {
        let agent = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs.max(1))))
            .build()
            .into();

        Self {
            agent,
            auth_url: config.auth_url.clone(),
            log_url: config.log_url.clone(),
        }
    }
}

fn map_ureq_error(err: ureq::Error) -> DeliveryError {
    match err {
        ureq::Error::StatusCode(401) => DeliveryError::Unauthorized,
        other => DeliveryError::Failed(other.to_string()),
    }
}

impl AuditTransport for UreqTransport {
    fn fetch_token(&self, credentials: &Credentials) -> DeliveryResult<AccessToken> {
        let resp = self
            .agent
            .post(&self.auth_url)
            .send_json(credentials)
            .map_err(map_ureq_error)?;

        resp.into_body()
            .read_json::<AccessToken>()
            .map_err(|e| DeliveryError::Failed(format!("invalid token response: {}", e)))
    }

    fn post_log(&self, token: &str, payload: &LogPayload<'_>) -> DeliveryResult<()> {
        self.agent
            .post(&self.log_url)
            .header("Authorization", &format!("Bearer {}", token))
            .send_json(payload)
            .map(|_| ())
            .map_err(map_ureq_error)
    }
}

/// 重试配置
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &AuditConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay_ms: config.retry_base_delay_ms,
            max_delay_ms: config.retry_max_delay_ms,
        }
    }
}

/// 计算指数退避延迟（带 0-25% 抖动）
fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> u64 {
    let exp_delay = base_ms.saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)));
    let capped = exp_delay.min(max_ms);
    let jitter = rand::random_range(0..=capped / 4);
    capped.saturating_add(jitter)
}

/// 单个事件的投递逻辑：token 缓存 + 重试
pub struct AuditDelivery<T: AuditTransport> {
    transport: T,
    credentials: Credentials,
    stack: String,
    retry: RetryPolicy,
    token: Option<AccessToken>,
}

impl<T: AuditTransport> AuditDelivery<T> {
    pub fn new(transport: T, credentials: Credentials, stack: String, retry: RetryPolicy) -> Self {
        Self {
            transport,
            credentials,
            stack,
            retry,
            token: None,
        }
    }

    fn bearer_token(&mut self) -> DeliveryResult<String> {
        let now_ts = chrono::Utc::now().timestamp();
        match self.token {
            Some(ref token) if !token.needs_refresh(now_ts) => Ok(token.access_token.clone()),
            _ => {
                trace!("Fetching audit service access token");
                let token = self.transport.fetch_token(&self.credentials)?;
                let value = token.access_token.clone();
                self.token = Some(token);
                Ok(value)
            }
        }
    }

    pub fn deliver(&mut self, event: &AuditEvent) -> DeliveryResult<()> {
        let mut attempt = 0;
        loop {
            let result = self.bearer_token().and_then(|token| {
                let payload = LogPayload {
                    stack: &self.stack,
                    level: event.level,
                    package: event.package,
                    message: &event.message,
                };
                self.transport.post_log(&token, &payload)
            });

            match result {
                Ok(()) => {
                    if attempt > 0 {
                        debug!("Audit event delivered after {} retries", attempt);
                    }
                    return Ok(());
                }
                Err(e) if attempt < self.retry.max_retries => {
                    if e == DeliveryError::Unauthorized {
                        self.token = None;
                    }
                    attempt += 1;
                    let delay = calculate_backoff(
                        attempt,
                        self.retry.base_delay_ms,
                        self.retry.max_delay_ms,
                    );
                    warn!(
                        "Audit delivery failed (attempt {}/{}): {}; retrying in {} ms",
                        attempt,
                        self.retry.max_retries + 1,
                        e,
                        delay
                    );
                    std::thread::sleep(Duration::from_millis(delay));
                }
                Err(e) => return Err(e),
            }
        }
    }
}

fn run_worker<T: AuditTransport>(mut delivery: AuditDelivery<T>, receiver: Receiver<AuditEvent>) {
    for event in receiver.iter() {
        if let Err(e) = delivery.deliver(&event) {
            let err = ShortUrlError::from(e);
            warn!(
                "Dropping audit event [{}/{}] after retries: {} ({})",
                event.level.as_ref(),
                event.package.as_ref(),
                err.format_simple(),
                err.code()
            );
        }
    }
    debug!("Audit worker stopped");
}

/// 投递到远端日志服务的审计后端
pub struct HttpAuditSink {
    sender: Option<Sender<AuditEvent>>,
    worker: Option<JoinHandle<()>>,
}

impl HttpAuditSink {
    /// 使用 ureq 传输启动后台投递线程
    pub fn spawn(config: &AuditConfig) -> Result<Self> {
        Self::with_transport(UreqTransport::new(config), config)
    }

    pub fn with_transport<T: AuditTransport>(transport: T, config: &AuditConfig) -> Result<Self> {
        let credentials = Credentials::from_config(config);
        if !credentials.is_complete() {
            warn!("Audit credentials are incomplete; the log service will likely reject requests");
        }

        let delivery = AuditDelivery::new(
            transport,
            credentials,
            config.stack.clone(),
            RetryPolicy::from_config(config),
        );
        let (sender, receiver) = bounded(config.queue_capacity.max(1));

        let worker = std::thread::Builder::new()
            .name("audit-sink".to_string())
            .spawn(move || run_worker(delivery, receiver))?;

        Ok(Self {
            sender: Some(sender),
            worker: Some(worker),
        })
    }
}

impl AuditSink for HttpAuditSink {
    fn record(&self, level: AuditLevel, package: AuditPackage, message: &str) {
        let Some(ref sender) = self.sender else {
            return;
        };

        let event = AuditEvent {
            level,
            package,
            message: message.to_string(),
        };

        match sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("Audit queue full, event dropped"),
            Err(TrySendError::Disconnected(_)) => warn!("Audit worker gone, event dropped"),
        }
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

impl Drop for HttpAuditSink {
    fn drop(&mut self) {
        // 关闭队列，worker 处理完剩余事件后退出
        self.sender.take();
        if let Some(worker) = self.worker.take()
            && worker.join().is_err()
        {
            warn!("Audit worker panicked");
        }
    }
}
