//! Loading-indicator hook. Presentation lives elsewhere; the client only
//! guarantees that every `show` is paired with exactly one `hide`.

use log::info;

#[cfg_attr(test, mockall::automock)]
pub trait LoadingIndicator: Send + Sync {
    fn show(&self);
    fn hide(&self);
}

/// Does nothing. Used when no indicator is configured.
pub struct NoopIndicator;

impl LoadingIndicator for NoopIndicator {
    fn show(&self) {}
    fn hide(&self) {}
}

/// Reports loading state through the log.
pub struct LogIndicator;

impl LoadingIndicator for LogIndicator {
    fn show(&self) {
        info!("Loading...");
    }

    fn hide(&self) {
        info!("Done.");
    }
}

/// Calls `hide` when dropped if `show` was called on acquisition.
pub struct LoadingGuard<'a> {
    indicator: Option<&'a dyn LoadingIndicator>,
}

impl<'a> LoadingGuard<'a> {
    pub fn acquire(indicator: &'a dyn LoadingIndicator, enabled: bool) -> Self {
        if !enabled {
            return Self { indicator: None };
        }
        indicator.show();
        Self {
            indicator: Some(indicator),
        }
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if let Some(indicator) = self.indicator.take() {
            indicator.hide();
        }
    }
}
