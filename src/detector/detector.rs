//! Region detector core module
//! 地区检测器核心
//! 核心职责：
//! 1. 同步时区信号
//! 2. 异步IP信号（主接口 → 备用接口，单次超时）
//! 3. 按检测模式合并为最终结论

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::geo::{GeoClient, extract_country};
use super::policy::{IpMatch, combine};
use super::timezone::{TimezoneSource, detect_ru_by_timezone};
use crate::config::{Detection, GuardConfig};

/// 检测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub is_ru: bool,
    pub method: Detection,
    pub tz_match: bool,
    pub ip_match: IpMatch,
}

impl fmt::Display for DetectionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ip = match self.ip_match.as_option() {
            Some(m) => m.to_string(),
            None => "unknown".to_string(),
        };
        write!(
            f,
            "isRu={} method={} tzMatch={} ipMatch={}",
            self.is_ru, self.method, self.tz_match, ip
        )
    }
}

/// 地区检测器
/// 无状态（除配置外），可克隆后跨任务共享
#[derive(Debug, Clone)]
pub struct RegionDetector {
    config: Arc<GuardConfig>,
    geo: Arc<dyn GeoClient>,
    timezone: Arc<dyn TimezoneSource>,
}

impl RegionDetector {
    pub fn new(
        config: Arc<GuardConfig>,
        geo: Arc<dyn GeoClient>,
        timezone: Arc<dyn TimezoneSource>,
    ) -> Self {
        Self {
            config,
            geo,
            timezone,
        }
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// 完整检测流程，从不返回错误
    pub async fn detect(&self) -> DetectionResult {
        let method = self.config.detection;
        let tz_match = self.detect_ru_by_timezone();

        // 仅时区模式：同步路径，不发起任何请求
        let ip_match = if method.uses_ip() {
            self.detect_ru_by_ip().await
        } else {
            IpMatch::Unknown
        };

        let result = DetectionResult {
            is_ru: combine(method, tz_match, ip_match),
            method,
            tz_match,
            ip_match,
        };
        debug!("Detection finished: {}", result);
        result
    }

    pub fn detect_ru_by_timezone(&self) -> bool {
        detect_ru_by_timezone(self.timezone.as_ref())
    }

    /// IP 检测：主接口拿不到国家代码时尝试一次备用接口
    pub async fn detect_ru_by_ip(&self) -> IpMatch {
        if let Some(country) = self.lookup_country(&self.config.ip_api_url).await {
            return IpMatch::from_country(&country);
        }

        debug!(
            "Primary geo endpoint yielded no country, trying fallback {}",
            self.config.ip_api_fallback_url
        );
        match self.lookup_country(&self.config.ip_api_fallback_url).await {
            Some(country) => IpMatch::from_country(&country),
            None => {
                warn!("Both geo endpoints failed, IP signal is unknown");
                IpMatch::Unknown
            }
        }
    }

    async fn lookup_country(&self, url: &str) -> Option<String> {
        let started = Instant::now();
        let data = self.fetch_with_timeout(url, self.config.ip_timeout).await?;
        let country = extract_country(&data);
        debug!(
            "Geo endpoint {} answered in {:?}, country={:?}",
            url,
            started.elapsed(),
            country
        );
        country
    }

    /// 超时后丢弃进行中的请求；零超时下首次轮询未完成即放弃
    async fn fetch_with_timeout(&self, url: &str, timeout: Duration) -> Option<Value> {
        match tokio::time::timeout(timeout, self.geo.fetch_json(url)).await {
            Ok(data) => data,
            Err(_) => {
                warn!("Geo endpoint {} timed out after {:?}", url, timeout);
                None
            }
        }
    }
}
