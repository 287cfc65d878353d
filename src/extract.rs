//! HTML fetching and plain-text extraction.
//!
//! Extraction walks the parsed tree with an explicit stack rather than
//! recursion, so arbitrarily nested markup cannot exhaust the call stack.
//! Only text nodes contribute output; `<script>` and `<style>` subtrees are
//! skipped entirely.

use reqwest::Client;
use scraper::{Html, Node};
use url::Url;

use crate::types::IngestError;

/// Extracts the human-visible text of an HTML document, in document order.
///
/// html5ever recovers from malformed markup, so this never fails; a document
/// with no text nodes simply yields an empty string.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = document.tree.root();

    let mut output = String::new();
    // Children are pushed in reverse so the stack pops them in document order.
    let mut stack: Vec<_> = root.children().rev().collect();

    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Text(text) => output.push_str(&text.text),
            Node::Element(element) => {
                if !matches!(element.name(), "script" | "style") {
                    stack.extend(node.children().rev());
                }
            }
            _ => {}
        }
    }

    output
}

/// Downloads `url` and returns the raw response body.
///
/// Any HTTP status is treated as acceptable content; only transport-level
/// failures surface as [`IngestError::Fetch`].
pub async fn fetch_html(client: &Client, url: &Url) -> Result<String, IngestError> {
    let response = client.get(url.clone()).send().await?;
    Ok(response.text().await?)
}

/// Fetches `url` and extracts its plain text.
pub async fn fetch_text(client: &Client, url: &Url) -> Result<String, IngestError> {
    let html = fetch_html(client, url).await?;
    Ok(extract_text(&html))
}
