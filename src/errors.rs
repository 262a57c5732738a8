use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortUrlError {
    InvalidShortcodeFormat(String),
    ShortcodeTaken(String),
    ShortcodeSpaceExhausted(String),
    Validation(String),
    Config(String),
    FileOperation(String),
    Serialization(String),
    AuditDelivery(String),
}

impl ShortUrlError {
    /// 获取错误代码
    pub fn code(&self) -> &'static str {
        match self {
            ShortUrlError::InvalidShortcodeFormat(_) => "E101",
            ShortUrlError::ShortcodeTaken(_) => "E102",
            ShortUrlError::ShortcodeSpaceExhausted(_) => "E103",
            ShortUrlError::Validation(_) => "E104",
            ShortUrlError::Config(_) => "E201",
            ShortUrlError::FileOperation(_) => "E202",
            ShortUrlError::Serialization(_) => "E203",
            ShortUrlError::AuditDelivery(_) => "E301",
        }
    }

    /// 获取错误类型名称
    pub fn error_type(&self) -> &'static str {
        match self {
            ShortUrlError::InvalidShortcodeFormat(_) => "Invalid Shortcode Format",
            ShortUrlError::ShortcodeTaken(_) => "Shortcode Taken",
            ShortUrlError::ShortcodeSpaceExhausted(_) => "Shortcode Space Exhausted",
            ShortUrlError::Validation(_) => "Validation Error",
            ShortUrlError::Config(_) => "Configuration Error",
            ShortUrlError::FileOperation(_) => "File Operation Error",
            ShortUrlError::Serialization(_) => "Serialization Error",
            ShortUrlError::AuditDelivery(_) => "Audit Delivery Error",
        }
    }

    /// 获取错误详情
    pub fn message(&self) -> &str {
        match self {
            ShortUrlError::InvalidShortcodeFormat(msg) => msg,
            ShortUrlError::ShortcodeTaken(msg) => msg,
            ShortUrlError::ShortcodeSpaceExhausted(msg) => msg,
            ShortUrlError::Validation(msg) => msg,
            ShortUrlError::Config(msg) => msg,
            ShortUrlError::FileOperation(msg) => msg,
            ShortUrlError::Serialization(msg) => msg,
            ShortUrlError::AuditDelivery(msg) => msg,
        }
    }

    /// 调用方可以修正请求后重试（对应 HTTP 409）
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ShortUrlError::InvalidShortcodeFormat(_) | ShortUrlError::ShortcodeTaken(_)
        )
    }

    /// 格式化为彩色输出（用于启动失败时的终端输出）
    pub fn format_colored(&self) -> String {
        use colored::Colorize;
        format!(
            "{} {} {}\n  {}",
            "[ERROR]".red().bold(),
            self.code().yellow(),
            self.error_type().red(),
            self.message().white()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for ShortUrlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ShortUrlError {}

// 便捷的构造函数
impl ShortUrlError {
    pub fn invalid_shortcode_format<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::InvalidShortcodeFormat(msg.into())
    }

    pub fn shortcode_taken<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::ShortcodeTaken(msg.into())
    }

    pub fn shortcode_space_exhausted<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::ShortcodeSpaceExhausted(msg.into())
    }

    pub fn validation<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::Validation(msg.into())
    }

    pub fn config<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::Config(msg.into())
    }

    pub fn file_operation<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::FileOperation(msg.into())
    }

    pub fn serialization<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::Serialization(msg.into())
    }

    pub fn audit_delivery<T: Into<String>>(msg: T) -> Self {
        ShortUrlError::AuditDelivery(msg.into())
    }
}

// 为常见的错误类型实现 From trait
impl From<std::io::Error> for ShortUrlError {
    fn from(err: std::io::Error) -> Self {
        ShortUrlError::FileOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ShortUrlError {
    fn from(err: serde_json::Error) -> Self {
        ShortUrlError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for ShortUrlError {
    fn from(err: config::ConfigError) -> Self {
        ShortUrlError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ShortUrlError {
    fn from(err: toml::ser::Error) -> Self {
        ShortUrlError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ShortUrlError>;
