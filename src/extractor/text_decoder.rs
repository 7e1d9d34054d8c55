//! 文本节点解码
//! 借助 html5ever 分词器（RCDATA 状态）解析字符引用，得到与 DOM 一致的文本内容

use std::borrow::Cow;
use std::cell::RefCell;

use html5ever::tokenizer::states::{RawKind, State};
use html5ever::tokenizer::{
    BufferQueue, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use tendril::StrTendril;

#[derive(Debug, Default)]
struct TextCollector {
    text: RefCell<String>,
}

impl TokenSink for TextCollector {
    type Handle = ();

    fn process_token(&self, token: Token, _line: u64) -> TokenSinkResult<()> {
        match token {
            Token::CharacterTokens(chars) => self.text.borrow_mut().push_str(&chars),
            Token::NullCharacterToken => self.text.borrow_mut().push('\u{FFFD}'),
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

/// 解码一段源文本中的字符引用（`&amp;`、`&#1042;`、`&nbsp;` 等）
/// RCDATA 状态下 `<` 不会开启标签，其余字符原样保留
pub fn decode_text(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }

    let opts = TokenizerOpts {
        discard_bom: false,
        initial_state: Some(State::RawData(RawKind::Rcdata)),
        ..TokenizerOpts::default()
    };
    let tokenizer = Tokenizer::new(TextCollector::default(), opts);
    let queue = BufferQueue::default();
    queue.push_back(StrTendril::from(raw));

    let _ = tokenizer.feed(&queue);
    tokenizer.end();

    Cow::Owned(tokenizer.sink.text.take())
}
