//! 敏感词屏蔽
//! 所有配置词合并为一个忽略大小写的字面量交替正则

use regex::{Regex, RegexBuilder};

use crate::error::GuardResult;
use crate::utils::markup::{blocked_word_span, escape_html};

/// 切分后的文本片段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fragment<'t> {
    Text(&'t str),
    Blocked(&'t str),
}

impl<'t> Fragment<'t> {
    pub fn as_str(&self) -> &'t str {
        match self {
            Fragment::Text(s) | Fragment::Blocked(s) => s,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WordCensor {
    pattern: Regex,
}

impl WordCensor {
    /// 空词被忽略；没有可用词时返回 None
    pub fn new<S: AsRef<str>>(words: &[S]) -> GuardResult<Option<Self>> {
        let alternation: Vec<String> = words
            .iter()
            .map(AsRef::as_ref)
            .filter(|word| !word.is_empty())
            .map(regex::escape)
            .collect();

        if alternation.is_empty() {
            return Ok(None);
        }

        let pattern = RegexBuilder::new(&alternation.join("|"))
            .case_insensitive(true)
            .build()?;
        Ok(Some(Self { pattern }))
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    /// 切分为普通文本与命中词；无命中返回 None（调用方不必改写节点）
    pub fn split<'t>(&self, text: &'t str) -> Option<Vec<Fragment<'t>>> {
        let mut fragments = Vec::new();
        let mut last = 0;

        for m in self.pattern.find_iter(text) {
            if m.start() > last {
                fragments.push(Fragment::Text(&text[last..m.start()]));
            }
            fragments.push(Fragment::Blocked(m.as_str()));
            last = m.end();
        }

        if fragments.is_empty() {
            return None;
        }
        if last < text.len() {
            fragments.push(Fragment::Text(&text[last..]));
        }
        Some(fragments)
    }

    /// 渲染为替换用的HTML；无命中返回 None
    /// `text` 为已解码的文本，输出中的文本与命中词都会重新转义
    pub fn redact(&self, text: &str, blur: &str) -> Option<String> {
        let fragments = self.split(text)?;
        let mut html = String::with_capacity(text.len() + fragments.len() * 160);
        for fragment in fragments {
            match fragment {
                Fragment::Text(s) => html.push_str(&escape_html(s)),
                Fragment::Blocked(word) => {
                    html.push_str(&blocked_word_span(&escape_html(word), blur))
                }
            }
        }
        Some(html)
    }
}
