//! Per-render side effects: queued notices and the last copied share link.
//!
//! Both are drained by the next page render, like flash messages.

use std::sync::{Mutex, PoisonError};

use stickies_core::notify::{Clipboard, Notice, Notifier};

#[derive(Debug, Default)]
pub struct NoticeBoard {
    pending: Mutex<Vec<Notice>>,
}

impl NoticeBoard {
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.pending.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Notifier for NoticeBoard {
    fn notify(&self, notice: Notice) {
        tracing::debug!(title = %notice.title, "Queued notice");
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

/// The browser owns the real clipboard; the server hands the link to the
/// next rendered page, which writes it with `navigator.clipboard`.
#[derive(Debug, Default)]
pub struct PageClipboard {
    copied: Mutex<Option<String>>,
}

impl PageClipboard {
    pub fn take(&self) -> Option<String> {
        self.copied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

impl Clipboard for PageClipboard {
    fn copy_text(&self, text: &str) {
        *self.copied.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.to_string());
    }
}
