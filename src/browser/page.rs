//! Scope guard for a page opened for a single render.

use chromiumoxide::Page;

/// Owns a page for the duration of one render.
///
/// Call [`PageGuard::close`] on the normal path. If the guard is dropped
/// without it (panic, cancelled task) the close is spawned in the background.
pub(crate) struct PageGuard {
    page: Page,
    closed: bool,
}

impl PageGuard {
    pub(crate) fn new(page: Page) -> Self {
        Self {
            page,
            closed: false,
        }
    }

    pub(crate) fn page(&self) -> &Page {
        &self.page
    }

    pub(crate) async fn close(mut self) {
        self.closed = true;
        if let Err(err) = self.page.clone().close().await {
            tracing::warn!(error = %err, "Failed to close page");
        }
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let page = self.page.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = page.close().await {
                        tracing::debug!(error = %err, "Background page close failed");
                    }
                });
            }
            Err(_) => tracing::warn!("Page dropped outside a runtime; left open"),
        }
    }
}
