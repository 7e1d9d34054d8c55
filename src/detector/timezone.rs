//! Timezone signal
//! 时区信号：解析进程所在的 IANA 时区名，并判断是否属于俄罗斯时区

use std::fmt::Debug;
use std::path::Path;

/// 俄罗斯 IANA 时区（加里宁格勒 ~ 阿纳德尔）
pub const RU_TIMEZONES: &[&str] = &[
    "Europe/Kaliningrad",
    "Europe/Moscow",
    "Europe/Samara",
    "Asia/Yekaterinburg",
    "Asia/Omsk",
    "Asia/Novosibirsk",
    "Asia/Novokuznetsk",
    "Asia/Barnaul",
    "Asia/Tomsk",
    "Asia/Krasnoyarsk",
    "Asia/Irkutsk",
    "Asia/Chita",
    "Asia/Yakutsk",
    "Asia/Ust-Nera",
    "Asia/Vladivostok",
    "Asia/Sakhalin",
    "Asia/Srednekolymsk",
    "Asia/Magadan",
    "Asia/Kamchatka",
    "Asia/Anadyr",
];

const ZONEINFO_MARKER: &str = "zoneinfo/";

pub fn is_russian_timezone(tz: &str) -> bool {
    RU_TIMEZONES.contains(&tz)
}

/// 时区来源
pub trait TimezoneSource: Send + Sync + Debug {
    /// 返回 IANA 时区名；无法解析时返回 None
    fn resolve(&self) -> Option<String>;
}

/// 判断来源时区是否为俄罗斯时区，解析失败视为不匹配
pub fn detect_ru_by_timezone(source: &dyn TimezoneSource) -> bool {
    match source.resolve() {
        Some(tz) => is_russian_timezone(&tz),
        None => {
            tracing::debug!("Timezone could not be resolved, treating as non-Russian");
            false
        }
    }
}

/// 系统时区：依次读取 `TZ`、`/etc/timezone`、`/etc/localtime` 链接目标
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimezone;

impl SystemTimezone {
    fn from_env() -> Option<String> {
        let raw = std::env::var("TZ").ok()?;
        normalize_zone_name(&raw)
    }

    fn from_etc_timezone() -> Option<String> {
        let raw = std::fs::read_to_string("/etc/timezone").ok()?;
        normalize_zone_name(&raw)
    }

    fn from_localtime_link() -> Option<String> {
        let target = std::fs::read_link(Path::new("/etc/localtime")).ok()?;
        let target = target.to_str()?;
        // 只接受指向 zoneinfo 目录的链接
        target.contains(ZONEINFO_MARKER).then(|| normalize_zone_name(target)).flatten()
    }
}

impl TimezoneSource for SystemTimezone {
    fn resolve(&self) -> Option<String> {
        Self::from_env()
            .or_else(Self::from_etc_timezone)
            .or_else(Self::from_localtime_link)
    }
}

/// 固定时区，用于已知客户端时区（如请求头上报）或测试
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FixedTimezone(Option<String>);

impl FixedTimezone {
    pub fn new(tz: impl Into<String>) -> Self {
        Self(Some(tz.into()))
    }

    /// 无法解析的时区
    pub fn unresolved() -> Self {
        Self(None)
    }
}

impl TimezoneSource for FixedTimezone {
    fn resolve(&self) -> Option<String> {
        self.0.as_deref().and_then(normalize_zone_name)
    }
}

/// 规整时区写法：`:Europe/Moscow`、`/usr/share/zoneinfo/Europe/Moscow` → `Europe/Moscow`
fn normalize_zone_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches(':');
    let name = match trimmed.rfind(ZONEINFO_MARKER) {
        Some(idx) => &trimmed[idx + ZONEINFO_MARKER.len()..],
        None => trimmed,
    };
    (!name.is_empty()).then(|| name.to_string())
}
