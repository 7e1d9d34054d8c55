//! 文档容器
//! 持有当前页面HTML与加载状态；`content_loaded` 相当于浏览器中的 DOMContentLoaded

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::watch;

/// 文档加载状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyState {
    /// 内容仍在接收/解析
    Loading,
    /// 内容已完整解析
    Interactive,
}

#[derive(Debug)]
pub struct Document {
    html: RwLock<String>,
    ready: watch::Sender<ReadyState>,
}

impl Document {
    /// 尚在加载的空文档，通过 `append` 逐块写入
    pub fn loading() -> Self {
        Self::with_state(String::new(), ReadyState::Loading)
    }

    /// 已完整解析的文档
    pub fn parsed(html: impl Into<String>) -> Self {
        Self::with_state(html.into(), ReadyState::Interactive)
    }

    fn with_state(html: String, state: ReadyState) -> Self {
        let (ready, _) = watch::channel(state);
        Self {
            html: RwLock::new(html),
            ready,
        }
    }

    /// 追加一块内容
    pub fn append(&self, chunk: &str) {
        self.write().push_str(chunk);
    }

    /// 标记内容解析完成，唤醒所有等待者
    pub fn finish_parsing(&self) {
        self.ready.send_replace(ReadyState::Interactive);
    }

    pub fn ready_state(&self) -> ReadyState {
        *self.ready.borrow()
    }

    /// 等待内容解析完成；已完成时立即返回
    pub async fn content_loaded(&self) {
        let mut rx = self.ready.subscribe();
        // 发送端由自身持有，不会关闭
        let _ = rx.wait_for(|state| *state != ReadyState::Loading).await;
    }

    /// 当前HTML快照
    pub fn html(&self) -> String {
        self.read().clone()
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, String> {
        self.html.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, String> {
        self.html.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_parsed_document_is_ready() {
        let doc = Document::parsed("<p>x</p>");
        assert_eq!(doc.ready_state(), ReadyState::Interactive);
        assert_eq!(doc.html(), "<p>x</p>");
    }

    #[test]
    fn test_append_chunks() {
        let doc = Document::loading();
        doc.append("<p>");
        doc.append("x</p>");
        assert_eq!(doc.ready_state(), ReadyState::Loading);
        assert_eq!(doc.html(), "<p>x</p>");
    }

    #[tokio::test]
    async fn test_content_loaded_waits_for_finish() {
        let doc = Arc::new(Document::loading());

        let waiter = {
            let doc = doc.clone();
            tokio::spawn(async move {
                doc.content_loaded().await;
                doc.html()
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        doc.append("<main>done</main>");
        doc.finish_parsing();

        let html = tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(html, "<main>done</main>");
    }
}
