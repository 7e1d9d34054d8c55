//! HTML只读扫描与文本解码
pub mod marker_scanner;
pub mod text_decoder;

pub use self::marker_scanner::{MarkerInventory, MarkerScanner};
pub use self::text_decoder::decode_text;
