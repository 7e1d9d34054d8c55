//! 信号组合策略

use serde::{Serialize, Serializer};

use super::geo::RUSSIA_COUNTRY_CODE;
use crate::config::Detection;

/// IP 信号三态：匹配 / 不匹配 / 未知（两个接口都失败或未查询）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IpMatch {
    Matched,
    NotMatched,
    #[default]
    Unknown,
}

impl IpMatch {
    pub fn from_country(code: &str) -> Self {
        if code.eq_ignore_ascii_case(RUSSIA_COUNTRY_CODE) {
            IpMatch::Matched
        } else {
            IpMatch::NotMatched
        }
    }

    pub fn as_option(self) -> Option<bool> {
        match self {
            IpMatch::Matched => Some(true),
            IpMatch::NotMatched => Some(false),
            IpMatch::Unknown => None,
        }
    }

    pub fn is_known(self) -> bool {
        self != IpMatch::Unknown
    }
}

impl From<Option<bool>> for IpMatch {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => IpMatch::Matched,
            Some(false) => IpMatch::NotMatched,
            None => IpMatch::Unknown,
        }
    }
}

// 序列化为 true / false / null
impl Serialize for IpMatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_option().serialize(serializer)
    }
}

/// 按检测模式合并两个信号
/// IP 未知时所有含 IP 的模式都退化为仅时区
pub fn combine(detection: Detection, tz_match: bool, ip_match: IpMatch) -> bool {
    let ip = match ip_match {
        IpMatch::Unknown => return tz_match,
        known => known == IpMatch::Matched,
    };

    match detection {
        Detection::Timezone => tz_match,
        Detection::Ip => ip,
        Detection::IpAndTimezone => ip && tz_match,
        Detection::IpOrTimezone => ip || tz_match,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IP_STATES: [IpMatch; 3] = [IpMatch::Matched, IpMatch::NotMatched, IpMatch::Unknown];

    /// 期望结果表：(模式, IP, 时区) → is_ru
    fn expected(detection: Detection, ip: IpMatch, tz: bool) -> bool {
        match (detection, ip) {
            (Detection::Timezone, _) => tz,
            (_, IpMatch::Unknown) => tz,
            (Detection::Ip, IpMatch::Matched) => true,
            (Detection::Ip, IpMatch::NotMatched) => false,
            (Detection::IpAndTimezone, IpMatch::Matched) => tz,
            (Detection::IpAndTimezone, IpMatch::NotMatched) => false,
            (Detection::IpOrTimezone, IpMatch::Matched) => true,
            (Detection::IpOrTimezone, IpMatch::NotMatched) => tz,
        }
    }

    #[test]
    fn test_policy_table_all_cases() {
        let mut cases = 0;
        for detection in Detection::ALL {
            for ip in IP_STATES {
                for tz in [true, false] {
                    assert_eq!(
                        combine(detection, tz, ip),
                        expected(detection, ip, tz),
                        "{detection} ip={ip:?} tz={tz}"
                    );
                    cases += 1;
                }
            }
        }
        assert_eq!(cases, 24);
    }

    #[test]
    fn test_unknown_ip_degrades_to_timezone() {
        assert!(combine(Detection::IpAndTimezone, true, IpMatch::Unknown));
        assert!(!combine(Detection::IpAndTimezone, false, IpMatch::Unknown));
        assert!(combine(Detection::Ip, true, IpMatch::Unknown));
        assert!(!combine(Detection::IpOrTimezone, false, IpMatch::Unknown));
    }

    #[test]
    fn test_strict_mode_needs_both() {
        assert!(!combine(Detection::IpAndTimezone, false, IpMatch::Matched));
        assert!(!combine(Detection::IpAndTimezone, true, IpMatch::NotMatched));
        assert!(combine(Detection::IpAndTimezone, true, IpMatch::Matched));
    }

    #[test]
    fn test_from_country() {
        assert_eq!(IpMatch::from_country("RU"), IpMatch::Matched);
        assert_eq!(IpMatch::from_country("ru"), IpMatch::Matched);
        assert_eq!(IpMatch::from_country("UA"), IpMatch::NotMatched);
    }

    #[test]
    fn test_serialize_tri_state() {
        assert_eq!(serde_json::to_string(&IpMatch::Matched).unwrap(), "true");
        assert_eq!(serde_json::to_string(&IpMatch::NotMatched).unwrap(), "false");
        assert_eq!(serde_json::to_string(&IpMatch::Unknown).unwrap(), "null");
        assert_eq!(IpMatch::from(None), IpMatch::Unknown);
        assert!(!IpMatch::Unknown.is_known());
    }
}
