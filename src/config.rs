//! 运行配置管理
//! 静态默认值 + 调用方覆盖项，每次运行构建一次，构建后不再修改

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use url::Url;

use crate::error::{GuardResult, RuGuardError};

/// 主IP地理位置接口（ipapi.co，返回 `country_code`）
pub const DEFAULT_IP_API_URL: &str = "https://ipapi.co/json/";
/// 备用IP地理位置接口（ip-api.com，返回 `countryCode`）
pub const DEFAULT_IP_API_FALLBACK_URL: &str = "https://ip-api.com/json/";
/// 单次IP接口请求超时（毫秒）
pub const DEFAULT_IP_TIMEOUT_MS: u64 = 4000;
pub const DEFAULT_BLUR_AMOUNT: &str = "20px";
pub const DEFAULT_CENSORED_WORDS: &[&str] = &["VPN", "впн", "ВПН"];
/// `.ru-censor-alert` 遮罩文案
pub const DEFAULT_ALERT_TEXT: &str = "Материал недоступен на территории РФ";
/// `.ru-only-alert` 对非俄罗斯访客的提示文案
pub const DEFAULT_NON_RU_ALERT_TEXT: &str =
    "Этот материал предназначен только для аудитории из России";

/// 检测模式（信号组合策略）
/// 序列化为规范名称；反序列化与命令行共用 `FromStr`（忽略首尾空白与大小写）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Detection {
    /// 仅时区（同步，不发起网络请求）
    Timezone,
    /// 仅IP，IP未知时回退到时区
    Ip,
    /// IP 且 时区，IP未知时回退到时区
    IpAndTimezone,
    /// IP 或 时区，IP未知时回退到时区
    #[default]
    IpOrTimezone,
}

impl Detection {
    pub const ALL: [Detection; 4] = [
        Detection::Timezone,
        Detection::Ip,
        Detection::IpAndTimezone,
        Detection::IpOrTimezone,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Detection::Timezone => "timezone",
            Detection::Ip => "ip",
            Detection::IpAndTimezone => "ip+timezone",
            Detection::IpOrTimezone => "ip|timezone",
        }
    }

    /// 是否需要IP查询
    pub fn uses_ip(&self) -> bool {
        !matches!(self, Detection::Timezone)
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Detection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Detection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

impl FromStr for Detection {
    type Err = RuGuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Detection::ALL
            .into_iter()
            .find(|mode| mode.as_str() == normalized)
            .ok_or_else(|| RuGuardError::InvalidDetection(s.to_string()))
    }
}

/// 完整运行配置
#[derive(Debug, Clone, PartialEq)]
pub struct GuardConfig {
    pub detection: Detection,
    pub ip_api_url: String,
    pub ip_api_fallback_url: String,
    /// 单次请求超时，`Duration::ZERO` 表示请求未立即完成即视为超时
    pub ip_timeout: Duration,
    pub censored_words: Vec<String>,
    /// CSS长度，如 "20px"
    pub blur_amount: String,
    pub alert_text: String,
    pub non_ru_alert_text: String,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            detection: Detection::default(),
            ip_api_url: DEFAULT_IP_API_URL.to_string(),
            ip_api_fallback_url: DEFAULT_IP_API_FALLBACK_URL.to_string(),
            ip_timeout: Duration::from_millis(DEFAULT_IP_TIMEOUT_MS),
            censored_words: DEFAULT_CENSORED_WORDS.iter().map(|w| w.to_string()).collect(),
            blur_amount: DEFAULT_BLUR_AMOUNT.to_string(),
            alert_text: DEFAULT_ALERT_TEXT.to_string(),
            non_ru_alert_text: DEFAULT_NON_RU_ALERT_TEXT.to_string(),
        }
    }
}

impl GuardConfig {
    /// 在默认配置上叠加覆盖项
    pub fn with_overrides(overrides: ConfigOverrides) -> GuardResult<Self> {
        let config = overrides.apply_to(Self::default());
        config.validate()?;
        Ok(config)
    }

    /// 链式构建器
    pub fn builder() -> GuardConfigBuilder {
        GuardConfigBuilder::new()
    }

    /// 校验配置项
    /// blur 值会被写进 style 属性，禁止会截断声明或属性的字符
    pub fn validate(&self) -> GuardResult<()> {
        Self::validate_endpoint("ipApiUrl", &self.ip_api_url)?;
        Self::validate_endpoint("ipApiFallbackUrl", &self.ip_api_fallback_url)?;

        let blur = self.blur_amount.trim();
        if blur.is_empty() {
            return Err(RuGuardError::ConfigError("blurAmount 不能为空".to_string()));
        }
        if blur.contains([';', '"', '\'', '<', '>', '{', '}']) {
            return Err(RuGuardError::ConfigError(format!(
                "blurAmount 包含非法字符：{}",
                self.blur_amount
            )));
        }
        Ok(())
    }

    fn validate_endpoint(field: &str, raw: &str) -> GuardResult<()> {
        let url = Url::parse(raw)?;
        match url.scheme() {
            "http" | "https" => Ok(()),
            other => Err(RuGuardError::ConfigError(format!(
                "{} 仅支持 http/https，当前为 {}：{}",
                field, other, raw
            ))),
        }
    }
}

/// 调用方覆盖项（所有字段可选，JSON 键名为 camelCase）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection: Option<Detection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_api_fallback_url: Option<String>,
    /// 毫秒
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub censored_words: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blur_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub non_ru_alert_text: Option<String>,
}

impl ConfigOverrides {
    pub fn from_json_str(json: &str) -> GuardResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> GuardResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// 逐字段叠加到基础配置上
    pub fn apply_to(self, mut base: GuardConfig) -> GuardConfig {
        if let Some(detection) = self.detection {
            base.detection = detection;
        }
        if let Some(url) = self.ip_api_url {
            base.ip_api_url = url;
        }
        if let Some(url) = self.ip_api_fallback_url {
            base.ip_api_fallback_url = url;
        }
        if let Some(ms) = self.ip_timeout {
            base.ip_timeout = Duration::from_millis(ms);
        }
        if let Some(words) = self.censored_words {
            base.censored_words = words;
        }
        if let Some(blur) = self.blur_amount {
            base.blur_amount = blur;
        }
        if let Some(text) = self.alert_text {
            base.alert_text = text;
        }
        if let Some(text) = self.non_ru_alert_text {
            base.non_ru_alert_text = text;
        }
        base
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct GuardConfigBuilder {
    config: GuardConfig,
}

impl GuardConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detection(mut self, detection: Detection) -> Self {
        self.config.detection = detection;
        self
    }

    pub fn ip_api_url(mut self, url: impl Into<String>) -> Self {
        self.config.ip_api_url = url.into();
        self
    }

    pub fn ip_api_fallback_url(mut self, url: impl Into<String>) -> Self {
        self.config.ip_api_fallback_url = url.into();
        self
    }

    pub fn ip_timeout(mut self, timeout: Duration) -> Self {
        self.config.ip_timeout = timeout;
        self
    }

    pub fn censored_words<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.censored_words = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn blur_amount(mut self, blur: impl Into<String>) -> Self {
        self.config.blur_amount = blur.into();
        self
    }

    pub fn alert_text(mut self, text: impl Into<String>) -> Self {
        self.config.alert_text = text.into();
        self
    }

    pub fn non_ru_alert_text(mut self, text: impl Into<String>) -> Self {
        self.config.non_ru_alert_text = text.into();
        self
    }

    pub fn overrides(mut self, overrides: ConfigOverrides) -> Self {
        self.config = overrides.apply_to(self.config);
        self
    }

    pub fn build(self) -> GuardResult<GuardConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GuardConfig::default();
        assert_eq!(config.detection, Detection::IpOrTimezone);
        assert_eq!(config.ip_timeout, Duration::from_millis(4000));
        assert_eq!(config.censored_words, vec!["VPN", "впн", "ВПН"]);
        assert_eq!(config.blur_amount, "20px");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_detection_parse() {
        assert_eq!("ip|timezone".parse::<Detection>().unwrap(), Detection::IpOrTimezone);
        assert_eq!(" IP+Timezone ".parse::<Detection>().unwrap(), Detection::IpAndTimezone);
        assert_eq!("timezone".parse::<Detection>().unwrap(), Detection::Timezone);
        assert!(matches!(
            "geo".parse::<Detection>(),
            Err(RuGuardError::InvalidDetection(_))
        ));
        for mode in Detection::ALL {
            assert_eq!(mode.to_string().parse::<Detection>().unwrap(), mode);
        }
    }

    #[test]
    fn test_overrides_from_json() {
        let overrides = ConfigOverrides::from_json_str(
            r#"{"detection":"ip+timezone","ipTimeout":250,"censoredWords":["Tor"],"alertText":"blocked"}"#,
        )
        .unwrap();
        let config = GuardConfig::with_overrides(overrides).unwrap();

        assert_eq!(config.detection, Detection::IpAndTimezone);
        assert_eq!(config.ip_timeout, Duration::from_millis(250));
        assert_eq!(config.censored_words, vec!["Tor"]);
        assert_eq!(config.alert_text, "blocked");
        // 未覆盖的字段保持默认
        assert_eq!(config.ip_api_url, DEFAULT_IP_API_URL);
        assert_eq!(config.non_ru_alert_text, DEFAULT_NON_RU_ALERT_TEXT);
    }

    #[test]
    fn test_overrides_reject_unknown_fields() {
        assert!(ConfigOverrides::from_json_str(r#"{"ipTimeoutMs":1}"#).is_err());
        assert!(ConfigOverrides::from_json_str(r#"{"detection":"dns"}"#).is_err());
    }

    #[test]
    fn test_detection_json_matches_cli_parsing() {
        let overrides = ConfigOverrides::from_json_str(r#"{"detection":" IP+Timezone "}"#).unwrap();
        assert_eq!(overrides.detection, Some(Detection::IpAndTimezone));

        let overrides = ConfigOverrides::from_json_str(r#"{"detection":"IP|TIMEZONE"}"#).unwrap();
        assert_eq!(overrides.detection, Some(Detection::IpOrTimezone));

        for mode in Detection::ALL {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode.as_str()));
            assert_eq!(serde_json::from_str::<Detection>(&json).unwrap(), mode);
        }
    }

    #[test]
    fn test_builder_validation() {
        let err = GuardConfig::builder().ip_api_url("ftp://example.com/geo").build();
        assert!(matches!(err, Err(RuGuardError::ConfigError(_))));

        let err = GuardConfig::builder().ip_api_fallback_url("not a url").build();
        assert!(matches!(err, Err(RuGuardError::UrlError(_))));

        let err = GuardConfig::builder().blur_amount("4px;display:none").build();
        assert!(matches!(err, Err(RuGuardError::ConfigError(_))));

        let config = GuardConfig::builder()
            .detection(Detection::Ip)
            .ip_api_url("http://127.0.0.1:8080/json")
            .blur_amount("0.5em")
            .censored_words(["a", "b"])
            .build()
            .unwrap();
        assert_eq!(config.detection, Detection::Ip);
        assert_eq!(config.censored_words, vec!["a", "b"]);
    }
}
