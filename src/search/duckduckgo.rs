//! DuckDuckGo search provider.
//!
//! Queries DuckDuckGo's HTML interface; no API key required. The endpoint
//! is not paginated, so the page count maps to a result cap of ten results
//! per requested page.

use reqwest::blocking::Client;
use std::time::Duration;

use super::{RetrievalError, SearchProvider, Snippet};

const DDG_HTML_URL: &str = "https://html.duckduckgo.com/html/";
const REQUEST_TIMEOUT_MS: u64 = 10_000;
const RESULTS_PER_PAGE: usize = 10;

/// Evidence provider backed by DuckDuckGo's HTML endpoint.
pub struct DuckDuckGoProvider {
    client: Client,
}

impl DuckDuckGoProvider {
    pub fn new() -> Self {
        // A realistic browser User-Agent avoids being served the block page
        let client = Client::builder()
            .timeout(Duration::from_millis(REQUEST_TIMEOUT_MS))
            .user_agent(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
            )
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

impl Default for DuckDuckGoProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchProvider for DuckDuckGoProvider {
    fn search(&self, query: &str, pages: u32) -> Result<Vec<Snippet>, RetrievalError> {
        let max_results = pages as usize * RESULTS_PER_PAGE;

        let response = self
            .client
            .post(DDG_HTML_URL)
            .form(&[("q", query)])
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    RetrievalError::Timeout { timeout_ms: REQUEST_TIMEOUT_MS }
                } else {
                    RetrievalError::Http { status: 0, message: e.to_string() }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Http {
                status: status.as_u16(),
                message: "DuckDuckGo request failed".to_string(),
            });
        }

        let html = response
            .text()
            .map_err(|e| RetrievalError::Unparseable(e.to_string()))?;

        Ok(parse_result_html(&html, max_results))
    }

    fn name(&self) -> &'static str {
        "duckduckgo"
    }
}

/// Extracts result snippets from the DuckDuckGo HTML page.
///
/// Results live in `<a class="result__a">` tags (title + redirect href)
/// followed by `<a class="result__snippet">` tags (description). The
/// markup is stable enough that splitting on the class attribute beats
/// pulling in a full HTML parser.
fn parse_result_html(html: &str, max_results: usize) -> Vec<Snippet> {
    let mut results = Vec::new();

    for part in html.split("class=\"result__a\"").skip(1) {
        if results.len() >= max_results {
            break;
        }

        let url = match part.find("href=\"") {
            Some(href_start) => {
                let url_start = href_start + 6;
                match part[url_start..].find('"') {
                    Some(href_end) => extract_redirect_url(&part[url_start..url_start + href_end]),
                    None => continue,
                }
            }
            None => continue,
        };

        let title = match part.find('>') {
            Some(title_start) => match part[title_start + 1..].find("</a>") {
                Some(title_end) => {
                    strip_html(&part[title_start + 1..title_start + 1 + title_end])
                }
                None => continue,
            },
            None => continue,
        };

        let description = match part.find("class=\"result__snippet\"") {
            Some(snippet_pos) => match part[snippet_pos..].find('>') {
                Some(tag_end) => {
                    let start = snippet_pos + tag_end + 1;
                    match part[start..].find("</a>") {
                        Some(snippet_end) => strip_html(&part[start..start + snippet_end]),
                        None => String::new(),
                    }
                }
                None => String::new(),
            },
            None => String::new(),
        };

        if !url.is_empty() && !title.is_empty() {
            results.push(Snippet { title, url, description });
        }
    }

    results
}

/// Extracts the destination URL from DuckDuckGo's redirect href.
///
/// Hrefs look like `//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=...`
fn extract_redirect_url(href: &str) -> String {
    if let Some(uddg_pos) = href.find("uddg=") {
        let url_start = uddg_pos + 5;
        let url_end = href[url_start..].find('&').unwrap_or(href.len() - url_start);
        url_decode(&href[url_start..url_start + url_end])
    } else if href.starts_with("http") {
        href.to_string()
    } else {
        String::new()
    }
}

fn url_decode(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '%' {
            let hex: String = chars.by_ref().take(2).collect();
            if let Ok(byte) = u8::from_str_radix(&hex, 16) {
                result.push(byte as char);
            }
        } else if c == '+' {
            result.push(' ');
        } else {
            result.push(c);
        }
    }

    result
}

/// Decodes common HTML entities and drops any remaining tags.
fn strip_html(s: &str) -> String {
    s.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ")
        .split('<')
        .map(|part| match part.find('>') {
            Some(pos) => &part[pos + 1..],
            None => part,
        })
        .collect::<Vec<_>>()
        .join("")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RESULT: &str = concat!(
        r#"<div class="result"><h2><a class="result__a" "#,
        r#"href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com%2Fviolins&rut=x">"#,
        r#"Antonio <b>Stradivari</b></a></h2>"#,
        r##"<a class="result__snippet" href="#">Stradivarius made fine violins in Cremona</a></div>"##,
    );

    #[test]
    fn test_parse_sample_result() {
        let results = parse_result_html(SAMPLE_RESULT, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Antonio Stradivari");
        assert_eq!(results[0].url, "https://example.com/violins");
        assert_eq!(results[0].description, "Stradivarius made fine violins in Cremona");
    }

    #[test]
    fn test_parse_respects_result_cap() {
        let html = SAMPLE_RESULT.repeat(5);
        let results = parse_result_html(&html, 3);
        assert_eq!(results.len(), 3);
    }

    #[test]
    fn test_parse_empty_html() {
        assert!(parse_result_html("", 10).is_empty());
    }

    #[test]
    fn test_url_decode() {
        assert_eq!(url_decode("https%3A%2F%2Fexample.com"), "https://example.com");
        assert_eq!(url_decode("hello+world"), "hello world");
    }

    #[test]
    fn test_extract_redirect_url() {
        let redirect = "//duckduckgo.com/l/?uddg=https%3A%2F%2Fexample.com&rut=abc";
        assert_eq!(extract_redirect_url(redirect), "https://example.com");

        assert_eq!(extract_redirect_url("https://example.com"), "https://example.com");
        assert_eq!(extract_redirect_url("not-a-url"), "");
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("Hello &amp; World"), "Hello & World");
        assert_eq!(strip_html("<b>bold</b> text"), "bold text");
        assert_eq!(strip_html("plain text"), "plain text");
    }
}
