//! IP geolocation client
//! IP地理位置查询：HTTP 客户端抽象 + 多种响应结构的国家代码提取

use std::fmt::Debug;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::debug;

use crate::error::GuardResult;

/// 俄罗斯 ISO 3166-1 alpha-2 代码
pub const RUSSIA_COUNTRY_CODE: &str = "RU";

/// 各服务商的国家代码字段，按顺序尝试
/// ipapi.co → country_code，ip-api.com → countryCode
const COUNTRY_KEYS: [&str; 3] = ["country_code", "countryCode", "country"];

const USER_AGENT: &str = concat!("ru-guard/", env!("CARGO_PKG_VERSION"));

/// 地理位置接口客户端
#[async_trait]
pub trait GeoClient: Send + Sync + Debug {
    /// GET 指定地址并解析 JSON
    /// 请求失败、非 2xx、响应体无法解析时返回 None，不返回错误
    async fn fetch_json(&self, url: &str) -> Option<Value>;
}

/// 基于 reqwest 的默认实现
/// 超时由检测器统一控制，这里不单独设置
#[derive(Debug, Clone)]
pub struct HttpGeoClient {
    client: Client,
}

impl HttpGeoClient {
    pub fn new() -> GuardResult<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }

    /// 复用外部构建的客户端（代理、证书等）
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GeoClient for HttpGeoClient {
    async fn fetch_json(&self, url: &str) -> Option<Value> {
        let response = match self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!("Geo request to {} failed: {}", url, e);
                return None;
            }
        };

        if !response.status().is_success() {
            debug!("Geo endpoint {} returned status {}", url, response.status());
            return None;
        }

        match response.json::<Value>().await {
            Ok(data) => Some(data),
            Err(e) => {
                debug!("Geo endpoint {} returned an unparsable body: {}", url, e);
                None
            }
        }
    }
}

/// 从响应中提取大写的国家代码，取第一个非空字符串字段
pub fn extract_country(data: &Value) -> Option<String> {
    COUNTRY_KEYS
        .iter()
        .filter_map(|key| data.get(key).and_then(Value::as_str))
        .map(str::trim)
        .find(|code| !code.is_empty())
        .map(str::to_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_country_shapes() {
        assert_eq!(extract_country(&json!({"country_code": "RU"})).as_deref(), Some("RU"));
        assert_eq!(extract_country(&json!({"countryCode": "us"})).as_deref(), Some("US"));
        assert_eq!(extract_country(&json!({"country": "de"})).as_deref(), Some("DE"));
    }

    #[test]
    fn test_extract_country_precedence() {
        let data = json!({"country": "DE", "countryCode": "FR", "country_code": "ru"});
        assert_eq!(extract_country(&data).as_deref(), Some("RU"));

        // 空字符串跳到下一个字段
        let data = json!({"country_code": "", "countryCode": "kz"});
        assert_eq!(extract_country(&data).as_deref(), Some("KZ"));
    }

    #[test]
    fn test_extract_country_missing() {
        assert_eq!(extract_country(&json!({})), None);
        assert_eq!(extract_country(&json!({"country_code": null})), None);
        assert_eq!(extract_country(&json!({"country_code": 643})), None);
        assert_eq!(extract_country(&json!(["RU"])), None);
        assert_eq!(extract_country(&Value::Null), None);
    }
}
