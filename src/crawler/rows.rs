//! Search result-row interpretation
//!
//! A search response carries rows under `reportrow.aaData`; each row is an
//! array whose second element is a markup blob. The stable document fragment
//! identifier lives in the `open_pdf(...)` onclick handler of the row's
//! button and is all the crawl core needs from the row.

use regex::Regex;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::OnceLock;

/// Rows of one search response page; an absent array reads as empty
pub fn page_rows(body: &Value) -> &[Value] {
    body.get("reportrow")
        .and_then(|r| r.get("aaData"))
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// The markup payload of one row
pub fn row_markup(row: &Value) -> Option<&str> {
    row.as_array()?.get(1)?.as_str()
}

/// Extracts the document fragment identifier from row markup
///
/// Looks for the row button's `open_pdf('..','..','<fragment>')` handler and
/// strips any `#page` suffix from the captured fragment.
pub fn extract_fragment(markup: &str) -> Option<String> {
    static OPEN_PDF_RE: OnceLock<Regex> = OnceLock::new();
    let re = OPEN_PDF_RE
        .get_or_init(|| Regex::new(r"open_pdf\('.*?','.*?','(.*?)'\)").expect("static regex"));

    let doc = Html::parse_fragment(markup);
    let selector = Selector::parse("button[onclick]").ok()?;

    for button in doc.select(&selector) {
        let onclick = button.value().attr("onclick")?;
        if let Some(captures) = re.captures(onclick) {
            let fragment = captures[1].split('#').next().unwrap_or("").to_string();
            if !fragment.is_empty() {
                return Some(fragment);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_rows_present() {
        let body = json!({"reportrow": {"aaData": [[0, "a"], [1, "b"]]}});
        assert_eq!(page_rows(&body).len(), 2);
    }

    #[test]
    fn test_page_rows_absent_or_empty() {
        assert!(page_rows(&json!({})).is_empty());
        assert!(page_rows(&json!({"reportrow": {"aaData": []}})).is_empty());
        assert!(page_rows(&json!({"reportrow": "gone"})).is_empty());
    }

    #[test]
    fn test_row_markup() {
        let row = json!([3, "<button>markup</button>"]);
        assert_eq!(row_markup(&row), Some("<button>markup</button>"));
        assert_eq!(row_markup(&json!("not an array")), None);
        assert_eq!(row_markup(&json!([1])), None);
    }

    #[test]
    fn test_extract_fragment() {
        let markup = r#"<button onclick="open_pdf('x','y','cases/2008/JUDG_1.pdf')">T</button>"#;
        assert_eq!(
            extract_fragment(markup).as_deref(),
            Some("cases/2008/JUDG_1.pdf")
        );
    }

    #[test]
    fn test_extract_fragment_strips_page_anchor() {
        let markup =
            r#"<button onclick="open_pdf('x','y','cases/2008/JUDG_1.pdf#page=4')">T</button>"#;
        assert_eq!(
            extract_fragment(markup).as_deref(),
            Some("cases/2008/JUDG_1.pdf")
        );
    }

    #[test]
    fn test_extract_fragment_without_button() {
        assert_eq!(extract_fragment("<div>no button here</div>"), None);
        assert_eq!(
            extract_fragment(r#"<button onclick="somethingElse()">T</button>"#),
            None
        );
    }
}
