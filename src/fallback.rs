//! Manual search fallback.
//!
//! When no answer shows up in any snippet, the evidence run was a dud and
//! a ranking would be noise. The last-ditch path hands the question to the
//! human: open it as a plain web search in their default browser.

const SEARCH_URL_BASE: &str = "https://www.google.com/search?q=";

/// Builds the fallback search URL from the original (non-rewritten)
/// question text, words joined with '+'.
pub fn fallback_url(question: &str) -> String {
    let joined = question.split_whitespace().collect::<Vec<_>>().join("+");
    format!("{}{}", SEARCH_URL_BASE, joined)
}

/// Capability: open a search for the question in the user's browser.
pub trait FallbackBrowser {
    fn open_search(&self, question: &str);
}

/// Opens the default system browser.
pub struct WebBrowserFallback;

impl FallbackBrowser for WebBrowserFallback {
    fn open_search(&self, question: &str) {
        let url = fallback_url(question);
        crate::log(&format!("Opening fallback search: {}", url));
        if let Err(e) = webbrowser::open(&url) {
            crate::log(&format!("Failed to open browser: {}", e));
        }
    }
}

/// Records open requests instead of launching a browser.
#[cfg(test)]
pub struct RecordingFallback {
    pub opened: std::cell::RefCell<Vec<String>>,
}

#[cfg(test)]
impl RecordingFallback {
    pub fn new() -> Self {
        Self { opened: std::cell::RefCell::new(Vec::new()) }
    }
}

#[cfg(test)]
impl FallbackBrowser for RecordingFallback {
    fn open_search(&self, question: &str) {
        self.opened.borrow_mut().push(question.to_string());
    }
}
