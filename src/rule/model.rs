//! 标记类规则数据模型
//! 两张有序规则表（俄罗斯访客 / 非俄罗斯访客），选择器本身保证 alert 变体优先

use std::fmt;
use serde::{Deserialize, Serialize};

/// 文档中可识别的标记类名
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Marker {
    Hide,
    Censor,
    CensorAlert,
    CensorWords,
    Only,
    OnlyAlert,
}

impl Marker {
    pub const ALL: [Marker; 6] = [
        Marker::Hide,
        Marker::Censor,
        Marker::CensorAlert,
        Marker::CensorWords,
        Marker::Only,
        Marker::OnlyAlert,
    ];

    pub fn class_name(&self) -> &'static str {
        match self {
            Marker::Hide => "ru-hide",
            Marker::Censor => "ru-censor",
            Marker::CensorAlert => "ru-censor-alert",
            Marker::CensorWords => "ru-censor-words",
            Marker::Only => "ru-only",
            Marker::OnlyAlert => "ru-only-alert",
        }
    }

    pub fn from_class_name(class: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.class_name() == class)
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// 规则动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    /// display:none（保留在文档树中）
    Hide,
    /// 模糊 + 禁止选中 + 定位容器
    Blur,
    /// 模糊 + 定位容器 + 屏蔽提示遮罩
    BlurWithAlert,
    /// 逐文本节点屏蔽敏感词
    RedactWords,
    /// 内容保持可见，叠加“仅限俄罗斯”提示遮罩
    RegionNotice,
}

/// 计数槽位
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tally {
    Hidden,
    Censored,
    Alerts,
    WordBlocks,
    RuOnly,
    RuOnlyAlerts,
}

/// 单条规则：选择器 → 动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerRule {
    pub marker: Marker,
    pub selector: &'static str,
    pub action: RuleAction,
    pub tally: Tally,
}

/// 俄罗斯访客规则（ru-only / ru-only-alert 保持原样）
pub const RU_RULES: &[MarkerRule] = &[
    MarkerRule {
        marker: Marker::Hide,
        selector: ".ru-hide",
        action: RuleAction::Hide,
        tally: Tally::Hidden,
    },
    MarkerRule {
        marker: Marker::Censor,
        selector: ".ru-censor:not(.ru-censor-alert)",
        action: RuleAction::Blur,
        tally: Tally::Censored,
    },
    MarkerRule {
        marker: Marker::CensorAlert,
        selector: ".ru-censor-alert",
        action: RuleAction::BlurWithAlert,
        tally: Tally::Alerts,
    },
    MarkerRule {
        marker: Marker::CensorWords,
        selector: ".ru-censor-words",
        action: RuleAction::RedactWords,
        tally: Tally::WordBlocks,
    },
];

/// 非俄罗斯访客规则
pub const NON_RU_RULES: &[MarkerRule] = &[
    MarkerRule {
        marker: Marker::Only,
        selector: ".ru-only:not(.ru-only-alert)",
        action: RuleAction::Hide,
        tally: Tally::RuOnly,
    },
    MarkerRule {
        marker: Marker::OnlyAlert,
        selector: ".ru-only-alert",
        action: RuleAction::RegionNotice,
        tally: Tally::RuOnlyAlerts,
    },
];

pub fn rules_for(is_ru: bool) -> &'static [MarkerRule] {
    if is_ru { RU_RULES } else { NON_RU_RULES }
}

/// 各类规则影响的元素数量（仅用于观测，不影响流程）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCounts {
    pub hidden: usize,
    pub censored: usize,
    pub alerts: usize,
    pub word_blocks: usize,
    pub ru_only: usize,
    pub ru_only_alerts: usize,
}

impl RuleCounts {
    pub fn get(&self, tally: Tally) -> usize {
        match tally {
            Tally::Hidden => self.hidden,
            Tally::Censored => self.censored,
            Tally::Alerts => self.alerts,
            Tally::WordBlocks => self.word_blocks,
            Tally::RuOnly => self.ru_only,
            Tally::RuOnlyAlerts => self.ru_only_alerts,
        }
    }

    pub fn bump(&mut self, tally: Tally) {
        let slot = match tally {
            Tally::Hidden => &mut self.hidden,
            Tally::Censored => &mut self.censored,
            Tally::Alerts => &mut self.alerts,
            Tally::WordBlocks => &mut self.word_blocks,
            Tally::RuOnly => &mut self.ru_only,
            Tally::RuOnlyAlerts => &mut self.ru_only_alerts,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        self.hidden
            + self.censored
            + self.alerts
            + self.word_blocks
            + self.ru_only
            + self.ru_only_alerts
    }
}

impl fmt::Display for RuleCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hidden={} censored={} alerts={} wordBlocks={} ruOnly={} ruOnlyAlerts={}",
            self.hidden, self.censored, self.alerts, self.word_blocks, self.ru_only, self.ru_only_alerts
        )
    }
}
