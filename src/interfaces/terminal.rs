use crate::domain::outcome::{Notice, NoticeLevel};
use crate::domain::ports::{Navigator, Notifier};

/// Prints notices to stderr, where a browser would show a toast.
#[derive(Debug, Default, Clone)]
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, notice: Notice) {
        let tag = match notice.level {
            NoticeLevel::Info => "INFO",
            NoticeLevel::Success => "OK",
            NoticeLevel::Warning => "WARNING",
            NoticeLevel::Error => "ERROR",
        };
        tracing::debug!(level = ?notice.level, text = %notice.message, "Notice");
        eprintln!("[{tag}] {}", notice.message);
    }
}

/// Resolves navigation targets against the storefront's base URL and prints
/// where the user should continue.
#[derive(Debug, Clone)]
pub struct TerminalNavigator {
    base_url: String,
}

impl TerminalNavigator {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn resolve(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Navigator for TerminalNavigator {
    fn navigate(&self, path: &str) {
        let destination = self.resolve(path);
        tracing::info!(destination = %destination, "Navigating");
        eprintln!("Continue at {destination}");
    }
}
