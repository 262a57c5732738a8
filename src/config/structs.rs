use serde::{Deserialize, Serialize};

use crate::errors::{Result, ShortUrlError};

/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// 环境变量前缀：SHORTURLS__SERVER__PORT=9999
pub const ENV_PREFIX: &str = "SHORTURLS";

/// 静态配置（从 TOML 加载，启动时使用）
///
/// - server: 监听地址、端口、对外短链前缀、worker 数量
/// - logging: 日志配置
/// - audit: 审计日志投递（远端日志服务凭据、重试策略）
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置，失败时回退到默认值
    ///
    /// 优先级：ENV > config.toml > 默认值
    pub fn load_from(path: &str) -> Self {
        match Self::try_load_from(path) {
            Ok(config) => {
                if std::path::Path::new(path).exists() {
                    eprintln!("[INFO] Configuration loaded from: {}", path);
                }
                config
            }
            Err(e) => {
                eprintln!("[ERROR] Failed to load config: {}", e);
                Self::default()
            }
        }
    }

    /// 同 `load_from`，但把错误交给调用方处理
    pub fn try_load_from(path: &str) -> Result<Self> {
        use config::{Config, Environment, File};

        let settings = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: StaticConfig = settings.try_deserialize()?;
        config.audit.apply_legacy_env();
        config.validate()?;
        Ok(config)
    }

    /// 启动前的基本校验
    pub fn validate(&self) -> Result<()> {
        if !matches!(self.logging.format.as_str(), "text" | "json") {
            return Err(ShortUrlError::config(format!(
                "Invalid logging.format '{}'. Valid: text, json",
                self.logging.format
            )));
        }
        self.audit.backend.parse::<AuditBackend>()?;
        if let Some(ref url) = self.server.public_url
            && url.trim().is_empty()
        {
            return Err(ShortUrlError::config("server.public_url must not be empty"));
        }
        Ok(())
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }

    /// 保存配置到 TOML 文件
    pub fn save_to_file<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;

        if let Some(parent) = path.as_ref().parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
    /// 返回给客户端的短链前缀，例如 `https://s.example.com`。
    /// 未配置时根据请求的 scheme 和 Host 拼接。
    #[serde(default)]
    pub public_url: Option<String>,
    #[serde(default = "default_cpu_count")]
    pub cpu_count: usize,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_log_file")]
    pub file: Option<String>,
    #[serde(default = "default_max_backups")]
    pub max_backups: u32,
    #[serde(default = "default_enable_rotation")]
    pub enable_rotation: bool,
}

/// 审计日志后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumString, strum::AsRefStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AuditBackend {
    /// 写入本地 tracing 日志
    Tracing,
    /// 投递到远端日志服务
    Http,
    /// 丢弃
    None,
}

/// 审计日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// tracing | http | none
    #[serde(default = "default_audit_backend")]
    pub backend: String,
    #[serde(default = "default_audit_auth_url")]
    pub auth_url: String,
    #[serde(default = "default_audit_log_url")]
    pub log_url: String,
    #[serde(default = "default_audit_stack")]
    pub stack: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub roll_no: String,
    #[serde(default)]
    pub access_code: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_audit_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_retry_count")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
    #[serde(default = "default_audit_timeout_secs")]
    pub timeout_secs: u64,
}

impl AuditConfig {
    pub fn backend_kind(&self) -> Result<AuditBackend> {
        Ok(self.backend.parse::<AuditBackend>()?)
    }

    /// 兼容旧部署方式：未在配置里填写的凭据从裸环境变量读取
    /// （EMAIL / NAME / ROLLNO / ACCESSCODE / CLIENTID / CLIENTSECRET）
    fn apply_legacy_env(&mut self) {
        let fields: [(&mut String, &str); 6] = [
            (&mut self.email, "EMAIL"),
            (&mut self.name, "NAME"),
            (&mut self.roll_no, "ROLLNO"),
            (&mut self.access_code, "ACCESSCODE"),
            (&mut self.client_id, "CLIENTID"),
            (&mut self.client_secret, "CLIENTSECRET"),
        ];
        for (field, var) in fields {
            if field.is_empty()
                && let Ok(value) = std::env::var(var)
            {
                *field = value;
            }
        }
    }
}

impl From<strum::ParseError> for ShortUrlError {
    fn from(err: strum::ParseError) -> Self {
        ShortUrlError::config(format!(
            "Invalid audit.backend: {}. Valid: tracing, http, none",
            err
        ))
    }
}

// ============================================================
// Default value functions for static config
// ============================================================

fn default_server_host() -> String {
    "0.0.0.0".to_string()
}

fn default_server_port() -> u16 {
    8000
}

fn default_cpu_count() -> usize {
    num_cpus::get()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_file() -> Option<String> {
    None
}

fn default_max_backups() -> u32 {
    5
}

fn default_enable_rotation() -> bool {
    true
}

fn default_audit_backend() -> String {
    "tracing".to_string()
}

fn default_audit_auth_url() -> String {
    "http://20.244.56.144/evaluation-service/auth".to_string()
}

fn default_audit_log_url() -> String {
    "http://20.244.56.144/evaluation-service/logs".to_string()
}

fn default_audit_stack() -> String {
    "backend".to_string()
}

fn default_audit_queue_capacity() -> usize {
    1024
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    200
}

fn default_retry_max_delay_ms() -> u64 {
    5000
}

fn default_audit_timeout_secs() -> u64 {
    5
}

// ============================================================
// Default implementations
// ============================================================

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            public_url: None,
            cpu_count: default_cpu_count(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: default_log_file(),
            max_backups: default_max_backups(),
            enable_rotation: default_enable_rotation(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            backend: default_audit_backend(),
            auth_url: default_audit_auth_url(),
            log_url: default_audit_log_url(),
            stack: default_audit_stack(),
            email: String::new(),
            name: String::new(),
            roll_no: String::new(),
            access_code: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
            queue_capacity: default_audit_queue_capacity(),
            max_retries: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
            timeout_secs: default_audit_timeout_secs(),
        }
    }
}
