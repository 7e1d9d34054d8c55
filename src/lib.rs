//! ru-guard - 访客地区识别与标记类内容遮蔽
//!
//! 1. 检测：时区信号（同步）+ IP地理位置信号（异步，主接口 → 备用接口），按检测模式合并
//! 2. 规则：根据检测结论改写 `ru-hide` / `ru-censor` / `ru-censor-alert` /
//!    `ru-censor-words` / `ru-only` / `ru-only-alert` 标记元素
//!
//! ```no_run
//! use ru_guard::{Document, RuGuard, GuardConfig};
//!
//! # async fn demo() -> ru_guard::GuardResult<()> {
//! let guard = RuGuard::new(GuardConfig::default())?;
//! let doc = Document::parsed(r#"<p class="ru-hide">...</p>"#);
//! let result = guard.init(&doc).await?;
//! println!("{}", result);
//! # Ok(())
//! # }
//! ```

// 导出全局错误类型
pub use self::error::{GuardResult, RuGuardError};

// 导出配置模块
pub use self::config::{ConfigOverrides, Detection, GuardConfig, GuardConfigBuilder};

// 导出检测模块核心接口（含进程级简化接口）
pub use self::detector::{
    DetectionResult, FixedTimezone, GeoClient, HttpGeoClient, IpMatch, RegionDetector,
    SystemTimezone, TimezoneSource, auto_bootstrap, init, init_global_guard, is_russian_user,
    run,
};

// 导出规则模块核心接口
pub use self::rule::{AppliedRules, Marker, RuleApplier, RuleCounts, WordCensor};

// 导出提取模块核心接口
pub use self::extractor::{MarkerInventory, MarkerScanner};

pub use self::document::{Document, ReadyState};
pub use self::guard::{RuGuard, RunResult};

// 声明所有子模块
pub mod config;
pub mod detector;
pub mod document;
pub mod error;
pub mod extractor;
pub mod guard;
pub mod rule;
pub mod utils;
