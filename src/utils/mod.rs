//! 通用工具
pub mod markup;

pub use self::markup::{Container, OverlayTone, escape_html, merge_style};
