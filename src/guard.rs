//! RuGuard 门面
//! 检测 → 应用规则 → 合并结果

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::{ConfigOverrides, GuardConfig};
use crate::detector::{
    DetectionResult, GeoClient, HttpGeoClient, RegionDetector, SystemTimezone, TimezoneSource,
};
use crate::document::Document;
use crate::error::GuardResult;
use crate::extractor::MarkerScanner;
use crate::rule::{AppliedRules, RuleApplier, RuleCounts};

/// 运行结果：检测信息与规则计数平铺在同一对象中
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunResult {
    #[serde(flatten)]
    pub detection: DetectionResult,
    #[serde(flatten)]
    pub rules: RuleCounts,
}

impl fmt::Display for RunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.detection, self.rules)
    }
}

#[derive(Debug, Clone)]
pub struct RuGuard {
    config: Arc<GuardConfig>,
    detector: RegionDetector,
    applier: Arc<RuleApplier>,
}

impl RuGuard {
    /// 使用系统时区与 reqwest 客户端创建
    pub fn new(config: GuardConfig) -> GuardResult<Self> {
        let geo = HttpGeoClient::new()?;
        Self::with_sources(config, Arc::new(geo), Arc::new(SystemTimezone))
    }

    /// 在默认配置上叠加覆盖项后创建
    pub fn with_overrides(overrides: ConfigOverrides) -> GuardResult<Self> {
        Self::new(GuardConfig::with_overrides(overrides)?)
    }

    /// 注入自定义的地理位置客户端与时区来源
    pub fn with_sources(
        config: GuardConfig,
        geo: Arc<dyn GeoClient>,
        timezone: Arc<dyn TimezoneSource>,
    ) -> GuardResult<Self> {
        config.validate()?;
        let applier = RuleApplier::new(&config)?;
        let config = Arc::new(config);
        Ok(Self {
            detector: RegionDetector::new(config.clone(), geo, timezone),
            applier: Arc::new(applier),
            config,
        })
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub async fn detect(&self) -> DetectionResult {
        self.detector.detect().await
    }

    /// 仅检测，不修改文档
    pub async fn is_russian_user(&self) -> bool {
        self.detect().await.is_ru
    }

    /// 对HTML字符串执行规则改写
    pub fn rewrite_html(&self, is_ru: bool, html: &str) -> GuardResult<AppliedRules> {
        self.applier.apply(is_ru, html)
    }

    /// 在文档写锁内一次性完成改写
    /// 文档中没有标记元素时跳过改写
    pub fn apply_rules(&self, is_ru: bool, doc: &Document) -> GuardResult<RuleCounts> {
        let mut html = doc.write();
        if MarkerScanner::scan(&html).is_empty() {
            debug!("Document carries no marker classes, skipping rewrite");
            return Ok(RuleCounts::default());
        }

        let applied = self.applier.apply(is_ru, &html)?;
        *html = applied.html;
        Ok(applied.counts)
    }

    /// 检测后立即对文档当前内容应用规则（不等待加载完成）
    pub async fn run(&self, doc: &Document) -> GuardResult<RunResult> {
        let started = Instant::now();
        let detection = self.detect().await;
        let rules = self.apply_rules(detection.is_ru, doc)?;

        let result = RunResult { detection, rules };
        info!("ru-guard run finished in {:?}: {}", started.elapsed(), result);
        Ok(result)
    }

    /// 等待文档内容解析完成后再执行 `run`
    pub async fn init(&self, doc: &Document) -> GuardResult<RunResult> {
        doc.content_loaded().await;
        self.run(doc).await
    }
}
