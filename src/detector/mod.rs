//! 检测模块：时区信号、IP信号与组合策略
pub mod detector;
pub mod geo;
pub mod global;
pub mod policy;
pub mod timezone;

// 导出核心接口
pub use self::detector::{DetectionResult, RegionDetector};
pub use self::geo::{GeoClient, HttpGeoClient, RUSSIA_COUNTRY_CODE, extract_country};
pub use self::global::{auto_bootstrap, init, init_global_guard, is_russian_user, run};
pub use self::policy::{IpMatch, combine};
pub use self::timezone::{
    FixedTimezone, RU_TIMEZONES, SystemTimezone, TimezoneSource, detect_ru_by_timezone,
    is_russian_timezone,
};
