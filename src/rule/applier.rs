//! Rule applier
//! 规则应用器：基于 lol_html 流式改写，按检测结论对标记元素执行隐藏/模糊/遮罩/屏蔽词
//! 单次执行设计：对已处理过的文档再次执行会重复包裹

use std::cell::RefCell;
use std::error::Error;

use lol_html::html_content::{ContentType, Element, TextChunk, TextType};
use lol_html::{HtmlRewriter, Settings, element, text};
use tracing::debug;

use super::censor::WordCensor;
use super::model::{RuleAction, RuleCounts, rules_for};
use crate::config::GuardConfig;
use crate::error::GuardResult;
use crate::extractor::decode_text;
use crate::utils::markup::{Container, OverlayTone, merge_style, overlay_markup, wrapper_open};

type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

/// 改写结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedRules {
    pub html: String,
    pub counts: RuleCounts,
}

/// 同一遮罩的块级/内联两种写法
#[derive(Debug, Clone)]
struct Overlay {
    block: String,
    inline: String,
}

impl Overlay {
    fn new(text: &str, tone: OverlayTone) -> Self {
        Self {
            block: overlay_markup(text, tone, Container::Block),
            inline: overlay_markup(text, tone, Container::Inline),
        }
    }

    fn markup(&self, container: Container) -> &str {
        match container {
            Container::Block => &self.block,
            Container::Inline => &self.inline,
        }
    }
}

/// 规则应用器（由配置预先构建好遮罩片段与屏蔽词正则）
#[derive(Debug, Clone)]
pub struct RuleApplier {
    blur_amount: String,
    blur_filter: String,
    censor: Option<WordCensor>,
    alert_overlay: Overlay,
    notice_overlay: Overlay,
}

impl RuleApplier {
    pub fn new(config: &GuardConfig) -> GuardResult<Self> {
        Ok(Self {
            blur_amount: config.blur_amount.clone(),
            blur_filter: format!("blur({})", config.blur_amount),
            censor: WordCensor::new(&config.censored_words)?,
            alert_overlay: Overlay::new(&config.alert_text, OverlayTone::Restricted),
            notice_overlay: Overlay::new(&config.non_ru_alert_text, OverlayTone::RegionNotice),
        })
    }

    /// 对整份HTML执行一次规则改写
    pub fn apply(&self, is_ru: bool, html: &str) -> GuardResult<AppliedRules> {
        let rules = rules_for(is_ru);
        let tally = RefCell::new(RuleCounts::default());
        // 被解析器拆分的文本节点先缓存，最后一块到达时整体处理
        let pending = RefCell::new(String::new());

        let mut handlers = Vec::with_capacity(rules.len() + 1);
        for rule in rules {
            let tally = &tally;
            handlers.push(element!(rule.selector, move |el| {
                self.apply_action(rule.action, el)?;
                tally.borrow_mut().bump(rule.tally);
                Ok(())
            }));

            if rule.action == RuleAction::RedactWords {
                if let Some(censor) = &self.censor {
                    let pending = &pending;
                    handlers.push(text!(rule.selector, move |chunk| {
                        self.redact_chunk(censor, pending, chunk);
                        Ok(())
                    }));
                }
            }
        }

        let settings = Settings {
            strict: false, // 兼容畸形HTML
            element_content_handlers: handlers,
            ..Settings::default()
        };

        let mut output = Vec::with_capacity(html.len() + 512);
        let mut rewriter = HtmlRewriter::new(settings, |chunk: &[u8]| {
            output.extend_from_slice(chunk);
        });
        rewriter.write(html.as_bytes())?;
        rewriter.end()?;

        let counts = tally.into_inner();
        debug!("Rules applied (isRu={}): {}", is_ru, counts);

        Ok(AppliedRules {
            html: String::from_utf8(output)?,
            counts,
        })
    }

    fn apply_action(&self, action: RuleAction, el: &mut Element<'_, '_>) -> HandlerResult {
        match action {
            RuleAction::Hide => set_style(el, &[("display", "none")])?,
            RuleAction::Blur => {
                self.blur(el)?;
                wrap(el, None);
            }
            RuleAction::BlurWithAlert => {
                self.blur(el)?;
                wrap(el, Some(&self.alert_overlay));
            }
            // 文本由 text 处理器负责
            RuleAction::RedactWords => {}
            RuleAction::RegionNotice => wrap(el, Some(&self.notice_overlay)),
        }
        Ok(())
    }

    fn blur(&self, el: &mut Element<'_, '_>) -> HandlerResult {
        set_style(
            el,
            &[
                ("filter", self.blur_filter.as_str()),
                ("user-select", "none"),
                ("-webkit-user-select", "none"),
            ],
        )
    }

    fn redact_chunk(&self, censor: &WordCensor, pending: &RefCell<String>, chunk: &mut TextChunk<'_>) {
        // script/style 等原始文本不含字符引用，也不是可见文本
        if !matches!(chunk.text_type(), TextType::Data | TextType::RCData) {
            return;
        }

        let mut buffer = pending.borrow_mut();

        if !chunk.last_in_text_node() {
            buffer.push_str(chunk.as_str());
            chunk.remove();
            return;
        }

        let split = !buffer.is_empty();
        buffer.push_str(chunk.as_str());
        let raw = std::mem::take(&mut *buffer);

        // 在解码后的文本上匹配，输出重新转义
        match censor.redact(&decode_text(&raw), &self.blur_amount) {
            Some(redacted) => chunk.replace(&redacted, ContentType::Html),
            // 前面的分块已被移除，无命中时原样写回
            None if split => chunk.replace(&raw, ContentType::Html),
            None => {}
        }
    }
}

fn set_style(el: &mut Element<'_, '_>, declarations: &[(&str, &str)]) -> HandlerResult {
    let style = merge_style(el.get_attribute("style").as_deref(), declarations);
    el.set_attribute("style", &style)?;
    Ok(())
}

/// 用定位容器包裹元素，遮罩（如有）放在元素之后、容器之内
/// 短语内容元素使用 span 容器
fn wrap(el: &mut Element<'_, '_>, overlay: Option<&Overlay>) {
    let container = Container::for_tag(&el.tag_name());
    el.before(&wrapper_open(container), ContentType::Html);

    let overlay = overlay.map_or("", |o| o.markup(container));
    let mut tail = String::with_capacity(overlay.len() + 7);
    tail.push_str(overlay);
    tail.push_str(container.close());
    el.after(&tail, ContentType::Html);
}
