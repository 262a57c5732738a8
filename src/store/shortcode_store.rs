//! 短码存储
//!
//! 唯一持有所有短链记录的组件。一把 `RwLock` 保护整张表：
//! - 创建在写锁内完成唯一性检查、随机生成重试和插入
//! - 读路径先持读锁；发现过期记录后换写锁复查再删除（惰性过期）
//! - 审计事件在释放锁之后发出

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use tracing::{debug, trace};

use super::clock::{Clock, SystemClock};
use super::generator::{CodeGenerator, RandomCodeGenerator};
use super::models::{ClickEvent, CreateShortUrl, Resolution, ShortUrlRecord, ShortUrlStats};
use crate::audit::{AuditPackage, AuditSink};
use crate::errors::{Result, ShortUrlError};
use crate::utils::is_valid_shortcode;

/// 自动生成短码使用的字符表
pub const SHORTCODE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// 自动生成短码的长度
pub const GENERATED_SHORTCODE_LEN: usize = 6;

/// 默认有效期（分钟）
pub const DEFAULT_VALIDITY_MINUTES: i64 = 30;

/// 连续碰撞上限，超过即认为短码空间耗尽
pub const MAX_GENERATION_ATTEMPTS: usize = 10_000;

pub const MSG_INVALID_FORMAT: &str = "Shortcode must be alphanumeric and 4-16 characters long.";
pub const MSG_TAKEN: &str = "Shortcode already exists";
pub const MSG_EXHAUSTED: &str = "Failed to generate unique shortcode.";

/// 读路径内部结果
enum Lookup<R> {
    Live(R),
    Expired,
    Missing,
}

pub struct ShortcodeStore {
    records: RwLock<HashMap<String, ShortUrlRecord>>,
    generator: Arc<dyn CodeGenerator>,
    clock: Arc<dyn Clock>,
    audit: Arc<dyn AuditSink>,
}

impl ShortcodeStore {
    /// 随机生成器 + 系统时钟
    pub fn new(audit: Arc<dyn AuditSink>) -> Self {
        Self::with_components(Arc::new(RandomCodeGenerator), Arc::new(SystemClock), audit)
    }

    pub fn with_components(
        generator: Arc<dyn CodeGenerator>,
        clock: Arc<dyn Clock>,
        audit: Arc<dyn AuditSink>,
    ) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            generator,
            clock,
            audit,
        }
    }

    /// 当前持有的记录数（包括尚未被惰性清理的过期记录）
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    // ============ Create ============

    /// 创建短链，返回新记录
    pub fn create(&self, req: CreateShortUrl) -> Result<ShortUrlRecord> {
        let desired = req.shortcode.clone().filter(|c| !c.is_empty());
        let result = self.create_inner(req, desired.as_deref());

        match (&result, desired.as_deref()) {
            (Ok(record), _) => {
                self.audit.info(
                    AuditPackage::Db,
                    &format!("Shortcode {} saved.", record.shortcode),
                );
            }
            (Err(ShortUrlError::InvalidShortcodeFormat(_)), code) => {
                self.audit.warn(
                    AuditPackage::Db,
                    &format!("Invalid shortcode format: {}", code.unwrap_or_default()),
                );
            }
            (Err(ShortUrlError::ShortcodeTaken(_)), code) => {
                self.audit.warn(
                    AuditPackage::Db,
                    &format!("Shortcode {} already exists.", code.unwrap_or_default()),
                );
            }
            (Err(ShortUrlError::ShortcodeSpaceExhausted(_)), _) => {
                self.audit.fatal(
                    AuditPackage::Db,
                    &format!(
                        "Failed to generate unique shortcode after {} attempts.",
                        MAX_GENERATION_ATTEMPTS
                    ),
                );
            }
            (Err(e), _) => {
                self.audit
                    .warn(AuditPackage::Db, &format!("Create rejected: {}", e.message()));
            }
        }

        result
    }

    fn create_inner(&self, req: CreateShortUrl, desired: Option<&str>) -> Result<ShortUrlRecord> {
        if req.target_url.trim().is_empty() {
            return Err(ShortUrlError::validation("Target URL must not be empty"));
        }

        // 格式校验不需要持锁
        if let Some(code) = desired
            && !is_valid_shortcode(code)
        {
            return Err(ShortUrlError::invalid_shortcode_format(MSG_INVALID_FORMAT));
        }

        let validity_minutes = normalize_validity(req.validity_minutes);
        let now = self.clock.now();
        let expires_at = Duration::try_minutes(validity_minutes)
            .and_then(|d| now.checked_add_signed(d))
            .ok_or_else(|| {
                ShortUrlError::validation(format!(
                    "Validity of {} minutes is out of range",
                    validity_minutes
                ))
            })?;

        let mut records = self.records.write();

        let shortcode = match desired {
            Some(code) => {
                if records.get(code).is_some_and(|r| r.is_live_at(now)) {
                    return Err(ShortUrlError::shortcode_taken(MSG_TAKEN));
                }
                code.to_string()
            }
            None => self.generate_unique(&records, now)?,
        };

        let record = ShortUrlRecord {
            shortcode: shortcode.clone(),
            target_url: req.target_url,
            validity_minutes,
            created_at: now,
            expires_at,
            click_count: 0,
            click_log: Vec::new(),
        };

        // 同名的过期记录在这里被覆盖
        if records.insert(shortcode, record.clone()).is_some() {
            debug!("Replaced expired record for shortcode {}", record.shortcode);
        }

        Ok(record)
    }

    /// 生成一个未被有效记录占用的短码（调用方必须持有写锁）
    fn generate_unique(
        &self,
        records: &HashMap<String, ShortUrlRecord>,
        now: DateTime<Utc>,
    ) -> Result<String> {
        for _ in 0..MAX_GENERATION_ATTEMPTS {
            let candidate = self
                .generator
                .generate(SHORTCODE_ALPHABET, GENERATED_SHORTCODE_LEN);

            if !is_valid_shortcode(&candidate) {
                debug!("Generator produced invalid shortcode '{}'", candidate);
                continue;
            }

            match records.get(&candidate) {
                Some(existing) if existing.is_live_at(now) => {
                    trace!("Generated shortcode collision: {}", candidate);
                }
                _ => return Ok(candidate),
            }
        }

        Err(ShortUrlError::shortcode_space_exhausted(MSG_EXHAUSTED))
    }

    // ============ Read paths ============

    /// 惰性过期的统一读路径
    fn lookup<R>(
        &self,
        code: &str,
        now: DateTime<Utc>,
        f: impl FnOnce(&ShortUrlRecord) -> R,
    ) -> Lookup<R> {
        {
            let records = self.records.read();
            match records.get(code) {
                None => return Lookup::Missing,
                Some(record) if record.is_live_at(now) => return Lookup::Live(f(record)),
                Some(_) => {}
            }
        }

        // 换写锁后复查：期间可能已被别的请求删除或重新创建
        let mut records = self.records.write();
        match records.get(code) {
            None => Lookup::Missing,
            Some(record) if record.is_live_at(now) => Lookup::Live(f(record)),
            Some(_) => {
                records.remove(code);
                Lookup::Expired
            }
        }
    }

    fn audit_lookup<R>(&self, code: &str, lookup: &Lookup<R>, what: &str) {
        match lookup {
            Lookup::Live(_) => self
                .audit
                .debug(AuditPackage::Db, &format!("Shortcode {} {}.", code, what)),
            Lookup::Expired => self.audit.info(
                AuditPackage::Db,
                &format!("Shortcode {} expired and deleted.", code),
            ),
            Lookup::Missing => self
                .audit
                .warn(AuditPackage::Db, &format!("Shortcode {} not found.", code)),
        }
    }

    /// 查询记录，并告知调用方本次是否清理了过期记录
    pub fn resolve_detailed(&self, code: &str) -> Resolution {
        let lookup = self.lookup(code, self.clock.now(), ShortUrlRecord::clone);
        self.audit_lookup(code, &lookup, "retrieved");

        match lookup {
            Lookup::Live(record) => Resolution::Live(record),
            Lookup::Expired => Resolution::Expired,
            Lookup::Missing => Resolution::Missing,
        }
    }

    /// 唯一权威的读路径，永远不会返回过期记录
    pub fn resolve(&self, code: &str) -> Option<ShortUrlRecord> {
        self.resolve_detailed(code).into_live()
    }

    /// 统计信息，过期记录同样会被清理并视为不存在
    pub fn get_stats(&self, code: &str) -> Option<ShortUrlStats> {
        let lookup = self.lookup(code, self.clock.now(), ShortUrlRecord::to_stats);
        self.audit_lookup(code, &lookup, "stats retrieved");

        match lookup {
            Lookup::Live(stats) => Some(stats),
            Lookup::Expired | Lookup::Missing => None,
        }
    }

    // ============ Click tracking ============

    /// 在同一把写锁内完成过期检查和点击追加
    fn click<R>(
        &self,
        code: &str,
        referrer: Option<String>,
        location: Option<String>,
        f: impl FnOnce(&ShortUrlRecord) -> R,
    ) -> Lookup<R> {
        let now = self.clock.now();

        let lookup = {
            let mut records = self.records.write();
            match records.get(code).map(|r| r.is_live_at(now)) {
                None => Lookup::Missing,
                Some(false) => {
                    records.remove(code);
                    Lookup::Expired
                }
                Some(true) => match records.get_mut(code) {
                    Some(record) => {
                        record.push_click(ClickEvent {
                            timestamp: now,
                            referrer,
                            location,
                        });
                        Lookup::Live(f(record))
                    }
                    None => Lookup::Missing,
                },
            }
        };

        match &lookup {
            Lookup::Live(_) => self.audit.info(
                AuditPackage::Db,
                &format!("Click recorded for shortcode {}.", code),
            ),
            other => self.audit_lookup(code, other, "clicked"),
        }
        lookup
    }

    /// 记录一次点击；短码不存在或已过期时静默忽略并返回 false
    pub fn record_click(
        &self,
        code: &str,
        referrer: Option<String>,
        location: Option<String>,
    ) -> bool {
        matches!(
            self.click(code, referrer, location, |_| ()),
            Lookup::Live(())
        )
    }

    /// 跳转用：查询并记录点击，返回点击之后的记录
    ///
    /// 与先 `resolve_detailed` 再 `record_click` 不同，两步之间不会有
    /// 过期、删除或重新创建插进来。
    pub fn resolve_and_click(
        &self,
        code: &str,
        referrer: Option<String>,
        location: Option<String>,
    ) -> Resolution {
        match self.click(code, referrer, location, ShortUrlRecord::clone) {
            Lookup::Live(record) => Resolution::Live(record),
            Lookup::Expired => Resolution::Expired,
            Lookup::Missing => Resolution::Missing,
        }
    }
}

/// 缺省或非正数的有效期回退到默认值
pub fn normalize_validity(minutes: Option<i64>) -> i64 {
    match minutes {
        Some(m) if m > 0 => m,
        _ => DEFAULT_VALIDITY_MINUTES,
    }
}
