//! 标记类扫描器
//! 基于 html5ever 分词器统计文档中的标记元素，并识别自动启动脚本标签

use std::cell::RefCell;

use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use markup5ever::interface::Attribute;
use tendril::StrTendril;

use crate::rule::model::Marker;

/// 自动启动标志属性：`<script src="ru-guard.js" data-auto>`
pub const AUTO_FLAG_ATTR: &str = "data-auto";
/// 自动启动脚本的 src 特征
pub const BOOTSTRAP_SCRIPT_HINT: &str = "ru-guard";

/// 扫描结果
/// 按原始类名计数，同一元素携带多个标记时分别计入
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MarkerInventory {
    counts: [usize; Marker::ALL.len()],
    pub auto_bootstrap: bool,
}

impl MarkerInventory {
    pub fn count(&self, marker: Marker) -> usize {
        self.counts[marker.index()]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// 文档中没有任何标记元素
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// (标记, 数量) 列表，顺序同 `Marker::ALL`
    pub fn entries(&self) -> Vec<(Marker, usize)> {
        Marker::ALL.iter().map(|m| (*m, self.count(*m))).collect()
    }
}

#[derive(Debug, Default)]
pub struct MarkerScanner {
    inventory: RefCell<MarkerInventory>,
}

impl TokenSink for MarkerScanner {
    type Handle = ();

    fn process_token(&self, token: Token, _line: u64) -> TokenSinkResult<()> {
        if let Token::TagToken(Tag {
            kind: TagKind::StartTag,
            name,
            attrs,
            ..
        }) = token
        {
            self.inspect(name.as_ref(), &attrs);
        }
        TokenSinkResult::Continue
    }
}

impl MarkerScanner {
    /// 扫描HTML字符串
    pub fn scan(html: &str) -> MarkerInventory {
        let tokenizer = Tokenizer::new(Self::default(), TokenizerOpts::default());
        let queue = BufferQueue::default();
        queue.push_back(StrTendril::from(html));

        let _ = tokenizer.feed(&queue);
        tokenizer.end();

        tokenizer.sink.inventory.take()
    }

    fn inspect(&self, tag: &str, attrs: &[Attribute]) {
        let mut inventory = self.inventory.borrow_mut();

        if let Some(class) = attr_value(attrs, "class") {
            let mut seen = [false; Marker::ALL.len()];
            for marker in class.split_ascii_whitespace().filter_map(Marker::from_class_name) {
                let idx = marker.index();
                if !seen[idx] {
                    seen[idx] = true;
                    inventory.counts[idx] += 1;
                }
            }
        }

        if tag == "script"
            && attrs.iter().any(|a| a.name.local.as_ref() == AUTO_FLAG_ATTR)
            && attr_value(attrs, "src").is_some_and(|src| src.contains(BOOTSTRAP_SCRIPT_HINT))
        {
            inventory.auto_bootstrap = true;
        }
    }
}

fn attr_value<'a>(attrs: &'a [Attribute], name: &str) -> Option<&'a str> {
    attrs
        .iter()
        .find(|a| a.name.local.as_ref() == name)
        .map(|a| &*a.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_counts_markers() {
        let html = r#"
            <div class="ru-hide">a</div>
            <div class="card ru-censor ru-censor-alert">b</div>
            <p CLASS="ru-censor-words ru-censor-words">c</p>
            <span class="ru-only">d</span>
            <span class="ru-only-alert ru-only">e</span>
            <span class="ru-onlyx">f</span>
        "#;
        let inventory = MarkerScanner::scan(html);

        assert_eq!(inventory.count(Marker::Hide), 1);
        assert_eq!(inventory.count(Marker::Censor), 1);
        assert_eq!(inventory.count(Marker::CensorAlert), 1);
        assert_eq!(inventory.count(Marker::CensorWords), 1);
        assert_eq!(inventory.count(Marker::Only), 2);
        assert_eq!(inventory.count(Marker::OnlyAlert), 1);
        assert_eq!(inventory.total(), 7);
        assert!(!inventory.auto_bootstrap);
    }

    #[test]
    fn test_scan_detects_auto_bootstrap() {
        let html = r#"<html><head><script src="/static/ru-guard.min.js" data-auto></script></head></html>"#;
        let inventory = MarkerScanner::scan(html);
        assert!(inventory.auto_bootstrap);
        assert!(inventory.is_empty());

        // 缺少标志属性或非本脚本都不触发
        assert!(!MarkerScanner::scan(r#"<script src="/ru-guard.js"></script>"#).auto_bootstrap);
        assert!(!MarkerScanner::scan(r#"<script src="/other.js" data-auto></script>"#).auto_bootstrap);
    }

    #[test]
    fn test_entries_order() {
        let inventory = MarkerScanner::scan(r#"<i class="ru-only-alert"></i>"#);
        let entries = inventory.entries();
        assert_eq!(entries.len(), 6);
        assert_eq!(entries[5], (Marker::OnlyAlert, 1));
        assert_eq!(entries[0], (Marker::Hide, 0));
    }
}
