//! 全局守卫单例管理
//! 核心职责：
//! 1. 维护进程生命周期内唯一的默认 RuGuard 实例
//! 2. 提供 is_russian_user / run / init 进程级入口
//! 3. 以显式调用替代脚本标签自动启动（auto_bootstrap）

use std::sync::Arc;

use once_cell::sync::{Lazy, OnceCell};
use tracing::{debug, info};

use crate::config::{ConfigOverrides, GuardConfig};
use crate::document::Document;
use crate::error::{GuardResult, RuGuardError};
use crate::extractor::MarkerScanner;
use crate::guard::{RuGuard, RunResult};

/// 全局守卫实例 - 线程安全单例
static GLOBAL_GUARD: Lazy<Arc<OnceCell<RuGuard>>> = Lazy::new(|| Arc::new(OnceCell::new()));

/// 初始化全局守卫
/// 幂等：已初始化则直接返回 Ok(())，原配置保持不变
pub fn init_global_guard(config: GuardConfig) -> GuardResult<()> {
    if GLOBAL_GUARD.get().is_some() {
        debug!("Global guard already initialized, skip reinitialization");
        return Ok(());
    }

    let guard = RuGuard::new(config).map_err(|e| {
        RuGuardError::GuardInitError(format!("Failed to create RuGuard instance: {}", e))
    })?;

    // 并发初始化时只有一个成功，失败方沿用已有实例
    if GLOBAL_GUARD.set(guard).is_err() {
        debug!("Global guard was initialized concurrently, keeping the existing instance");
        return Ok(());
    }

    info!("Global RuGuard initialized successfully");
    Ok(())
}

/// 获取全局守卫（未初始化时使用默认配置懒加载）
pub(crate) fn global_guard() -> GuardResult<&'static RuGuard> {
    if GLOBAL_GUARD.get().is_none() {
        debug!("Lazy initializing global RuGuard with default config");
        init_global_guard(GuardConfig::default())?;
    }

    GLOBAL_GUARD.get().ok_or_else(|| {
        RuGuardError::GuardNotInitialized(
            "Global guard initialization failed: instance not created".to_string(),
        )
    })
}

/// 有覆盖项时按次构建新实例，否则使用全局实例
fn resolve_guard(overrides: Option<ConfigOverrides>) -> GuardResult<GuardHandle> {
    match overrides {
        Some(overrides) => Ok(GuardHandle::Owned(RuGuard::with_overrides(overrides)?)),
        None => Ok(GuardHandle::Global(global_guard()?)),
    }
}

enum GuardHandle {
    Global(&'static RuGuard),
    Owned(RuGuard),
}

impl GuardHandle {
    fn guard(&self) -> &RuGuard {
        match self {
            GuardHandle::Global(guard) => guard,
            GuardHandle::Owned(guard) => guard,
        }
    }
}

/// 仅检测
pub async fn is_russian_user(overrides: Option<ConfigOverrides>) -> GuardResult<bool> {
    let handle = resolve_guard(overrides)?;
    Ok(handle.guard().is_russian_user().await)
}

/// 检测并立即应用规则
pub async fn run(doc: &Document, overrides: Option<ConfigOverrides>) -> GuardResult<RunResult> {
    let handle = resolve_guard(overrides)?;
    handle.guard().run(doc).await
}

/// 等待文档解析完成后检测并应用规则
pub async fn init(doc: &Document, overrides: Option<ConfigOverrides>) -> GuardResult<RunResult> {
    let handle = resolve_guard(overrides)?;
    handle.guard().init(doc).await
}

/// 自动启动：文档中存在 `<script src="...ru-guard..." data-auto>` 时以默认配置执行 init
/// 未携带标志时不做任何事，返回 None
pub async fn auto_bootstrap(doc: &Document) -> GuardResult<Option<RunResult>> {
    let flagged = MarkerScanner::scan(&doc.read()).auto_bootstrap;
    if !flagged {
        debug!("No auto-bootstrap script tag found, skipping");
        return Ok(None);
    }

    info!("Auto-bootstrap flag found, running init with default config");
    init(doc, None).await.map(Some)
}
