//! 改写用的HTML片段与内联样式工具

use std::borrow::Cow;

/// 定位容器样式，为遮罩提供坐标系
pub const WRAPPER_STYLE: &str = "position:relative;display:block;width:100%;";

/// 被屏蔽词的 tooltip（“词语已被屏蔽”）
pub const BLOCKED_WORD_TITLE: &str = "Слово заблокировано";

const OVERLAY_BASE: &str = "position:absolute;inset:0;display:flex;\
align-items:center;justify-content:center;color:#fff;\
font-family:system-ui,-apple-system,sans-serif;font-size:13px;font-weight:600;\
text-align:center;padding:16px;letter-spacing:.03em;z-index:9999;\
pointer-events:none;border-radius:inherit;box-sizing:border-box;filter:none";

/// 短语内容元素：包在 `<div>` 里会被解析器提前闭合所在的 `<p>`
const PHRASING_TAGS: &[&str] = &[
    "a", "abbr", "audio", "b", "bdi", "bdo", "br", "button", "canvas", "cite", "code", "data",
    "del", "dfn", "em", "embed", "i", "iframe", "img", "input", "ins", "kbd", "label", "map",
    "mark", "math", "meter", "object", "output", "picture", "progress", "q", "s", "samp",
    "select", "small", "span", "strong", "sub", "sup", "svg", "textarea", "time", "u", "var",
    "video", "wbr",
];

/// 包裹容器与遮罩使用的标签
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// `<div>`
    Block,
    /// `<span>`，样式相同（display:block / flex 由内联样式给出）
    Inline,
}

impl Container {
    /// 按被包裹元素的标签名选择容器
    pub fn for_tag(tag: &str) -> Self {
        if PHRASING_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
            Container::Inline
        } else {
            Container::Block
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Container::Block => "div",
            Container::Inline => "span",
        }
    }

    pub fn close(&self) -> &'static str {
        match self {
            Container::Block => "</div>",
            Container::Inline => "</span>",
        }
    }
}

/// 遮罩风格
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayTone {
    /// 俄罗斯访客看到的屏蔽提示（黑色）
    Restricted,
    /// 非俄罗斯访客看到的仅限俄罗斯提示（琥珀色）
    RegionNotice,
}

impl OverlayTone {
    fn background(&self) -> &'static str {
        match self {
            OverlayTone::Restricted => "rgba(0,0,0,0.62)",
            OverlayTone::RegionNotice => "rgba(120,70,0,0.75)",
        }
    }

    /// 图标 + en space
    fn glyph(&self) -> &'static str {
        match self {
            OverlayTone::Restricted => "\u{1F6AB}\u{2002}",
            OverlayTone::RegionNotice => "\u{26A0}\u{FE0F}\u{2002}",
        }
    }
}

/// 转义文本，可同时用于元素内容与双引号属性值
pub fn escape_html(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(raw);
    }

    let mut escaped = String::with_capacity(raw.len() + 16);
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// 遮罩层：绝对定位覆盖在元素之上，不响应鼠标
pub fn overlay_markup(text: &str, tone: OverlayTone, container: Container) -> String {
    let label = format!("{}{}", tone.glyph(), text);
    let label = escape_html(&label);
    format!(
        r#"<{tag} role="status" aria-label="{label}" style="{OVERLAY_BASE};background:{bg};">{label}{close}"#,
        tag = container.tag(),
        bg = tone.background(),
        close = container.close(),
    )
}

/// 包裹容器的开标签
pub fn wrapper_open(container: Container) -> String {
    format!(r#"<{tag} style="{WRAPPER_STYLE}">"#, tag = container.tag())
}

/// 屏蔽词 span，`word_html` 须为已转义的HTML
pub fn blocked_word_span(word_html: &str, blur: &str) -> String {
    format!(
        r#"<span style="filter:blur({blur});user-select:none;-webkit-user-select:none;display:inline-block;cursor:not-allowed;" title="{BLOCKED_WORD_TITLE}">{word_html}</span>"#,
        blur = escape_html(blur),
    )
}

/// 把声明合并进已有的 style 属性值
/// 同名属性（忽略大小写）原位替换，新属性追加到末尾
pub fn merge_style(existing: Option<&str>, declarations: &[(&str, &str)]) -> String {
    let mut merged: Vec<(String, String)> = existing
        .unwrap_or_default()
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim();
            (!name.is_empty()).then(|| (name.to_string(), value.trim().to_string()))
        })
        .collect();

    for (name, value) in declarations {
        match merged.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some(slot) => slot.1 = value.to_string(),
            None => merged.push((name.to_string(), value.to_string())),
        }
    }

    merged
        .iter()
        .map(|(name, value)| format!("{name}:{value};"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert!(matches!(escape_html("plain text"), Cow::Borrowed(_)));
        assert_eq!(
            escape_html(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn test_merge_style_appends_and_replaces() {
        assert_eq!(merge_style(None, &[("display", "none")]), "display:none;");
        assert_eq!(
            merge_style(Some("color: red; DISPLAY: block"), &[("display", "none")]),
            "color:red;DISPLAY:none;"
        );
        assert_eq!(
            merge_style(Some("margin:0;;"), &[("filter", "blur(20px)"), ("user-select", "none")]),
            "margin:0;filter:blur(20px);user-select:none;"
        );
    }

    #[test]
    fn test_merge_style_keeps_colons_in_values() {
        assert_eq!(
            merge_style(Some("background:url(http://x/y.png)"), &[("display", "none")]),
            "background:url(http://x/y.png);display:none;"
        );
    }

    #[test]
    fn test_overlay_markup() {
        let html = overlay_markup("A & B", OverlayTone::Restricted, Container::Block);
        assert!(html.starts_with(r#"<div role="status" aria-label="🚫"#));
        assert!(html.contains("A &amp; B</div>"));
        assert!(html.contains("background:rgba(0,0,0,0.62);"));
        assert!(html.contains("pointer-events:none"));

        let html = overlay_markup("only RU", OverlayTone::RegionNotice, Container::Inline);
        assert!(html.starts_with(r#"<span role="status""#));
        assert!(html.ends_with("\u{26A0}\u{FE0F}\u{2002}only RU</span>"));
        assert!(html.contains("background:rgba(120,70,0,0.75);"));
    }

    #[test]
    fn test_container_for_tag() {
        assert_eq!(Container::for_tag("img"), Container::Inline);
        assert_eq!(Container::for_tag("SPAN"), Container::Inline);
        assert_eq!(Container::for_tag("section"), Container::Block);
        assert_eq!(Container::for_tag("p"), Container::Block);
        assert_eq!(wrapper_open(Container::Inline), r#"<span style="position:relative;display:block;width:100%;">"#);
    }

    #[test]
    fn test_blocked_word_span() {
        let span = blocked_word_span("VPN", "20px");
        assert_eq!(
            span,
            r#"<span style="filter:blur(20px);user-select:none;-webkit-user-select:none;display:inline-block;cursor:not-allowed;" title="Слово заблокировано">VPN</span>"#
        );
    }
}
