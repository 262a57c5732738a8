use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 一次跳转产生的点击记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub timestamp: DateTime<Utc>,
    pub referrer: Option<String>,
    /// 没有接入地理位置来源，目前总是 None
    pub location: Option<String>,
}

/// 一个短码对应的完整记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortUrlRecord {
    pub shortcode: String,
    pub target_url: String,
    pub validity_minutes: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub click_count: usize,
    pub click_log: Vec<ClickEvent>,
}

impl ShortUrlRecord {
    /// `now <= expires_at` 时记录有效
    #[inline]
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at
    }

    pub(crate) fn push_click(&mut self, event: ClickEvent) {
        self.click_log.push(event);
        self.click_count = self.click_log.len();
    }

    pub fn to_stats(&self) -> ShortUrlStats {
        ShortUrlStats {
            original_url: self.target_url.clone(),
            created_at: self.created_at,
            expires_at: self.expires_at,
            click_count: self.click_count,
            click_log: self.click_log.clone(),
        }
    }
}

/// 统计快照（短链地址由 HTTP 层根据 host 拼接）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortUrlStats {
    pub original_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub click_count: usize,
    pub click_log: Vec<ClickEvent>,
}

/// 带过期信息的查询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Live(ShortUrlRecord),
    /// 本次查询发现记录已过期并将其移除
    Expired,
    Missing,
}

impl Resolution {
    pub fn into_live(self) -> Option<ShortUrlRecord> {
        match self {
            Resolution::Live(record) => Some(record),
            Resolution::Expired | Resolution::Missing => None,
        }
    }
}

/// 创建短链的请求
#[derive(Debug, Clone, Default)]
pub struct CreateShortUrl {
    pub target_url: String,
    /// None 或非正数时使用默认有效期
    pub validity_minutes: Option<i64>,
    /// None 或空字符串时自动生成
    pub shortcode: Option<String>,
}

impl CreateShortUrl {
    pub fn new<T: Into<String>>(target_url: T) -> Self {
        Self {
            target_url: target_url.into(),
            ..Self::default()
        }
    }

    pub fn with_validity(mut self, minutes: i64) -> Self {
        self.validity_minutes = Some(minutes);
        self
    }

    pub fn with_shortcode<T: Into<String>>(mut self, shortcode: T) -> Self {
        self.shortcode = Some(shortcode.into());
        self
    }
}
