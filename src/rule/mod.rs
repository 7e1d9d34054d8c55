//! 规则模块：标记类规则表、敏感词屏蔽与HTML改写
pub mod applier;
pub mod censor;
pub mod model;

pub use self::applier::{AppliedRules, RuleApplier};
pub use self::censor::{Fragment, WordCensor};
pub use self::model::{
    Marker, MarkerRule, NON_RU_RULES, RU_RULES, RuleAction, RuleCounts, Tally, rules_for,
};
