//! 全局错误类型定义
//! 检测路径本身不返回错误（失败降级为 Unknown/false），这里只覆盖配置、改写与全局状态

use thiserror::Error;
use regex::Error as RegexError;
use serde_json::Error as SerdeJsonError;
use std::io::Error as IoError;
use std::string::FromUtf8Error;
use url::ParseError as UrlParseError;
use lol_html::errors::RewritingError;

#[derive(Error, Debug)]
pub enum RuGuardError {
    // 配置相关错误
    #[error("配置无效：{0}")]
    ConfigError(String),
    #[error("未知的检测模式：{0}")]
    InvalidDetection(String),

    // 改写相关错误
    #[error("正则编译失败：{0}")]
    RegexCompileError(#[from] RegexError),
    #[error("HTML改写失败：{0}")]
    RewriteError(#[from] RewritingError),
    #[error("改写输出不是合法UTF-8：{0}")]
    Utf8Error(#[from] FromUtf8Error),

    // 全局守卫状态
    #[error("守卫未初始化: {0}")]
    GuardNotInitialized(String),
    #[error("守卫初始化失败: {0}")]
    GuardInitError(String),

    // 网络相关错误
    #[error("网络请求失败：{0}")]
    HttpError(#[from] reqwest::Error),

    // 序列化/反序列化错误
    #[error("JSON解析失败：{0}")]
    JsonError(#[from] SerdeJsonError),

    // 基础错误
    #[error("IO操作失败：{0}")]
    IoError(#[from] IoError),
    #[error("URL解析失败：{0}")]
    UrlError(#[from] UrlParseError),
}

// 全局Result类型
pub type GuardResult<T> = Result<T, RuGuardError>;
