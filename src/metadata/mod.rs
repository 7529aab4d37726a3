//! Case metadata extraction
//!
//! Each search-result row carries a markup blob describing the judgment:
//! the case title on the open button, a judge line, and a details block with
//! CNR and date fields. This module pulls those into a structured record and
//! merges in crawl provenance before the record is persisted next to its PDF.

use crate::scheduler::DateWindow;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// Structured fields parsed out of one result row's markup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseDetails {
    pub title: String,
    pub description: String,
    pub judge: String,
    pub cnr: String,
    pub date_of_registration: String,
    pub decision_date: String,
    pub disposal_nature: String,
}

/// A case record as persisted: extracted fields plus crawl provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseRecord {
    #[serde(flatten)]
    pub details: CaseDetails,
    pub court_code: String,
    pub court: String,
    pub pdf_link: String,
    pub downloaded: bool,
    pub from_date: String,
    pub to_date: String,
    /// Remote object key of the uploaded PDF, when upload is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_pdf_key: Option<String>,
    /// Retrievable URL of the uploaded PDF
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pdf_url: Option<String>,
}

impl CaseRecord {
    pub fn new(
        details: CaseDetails,
        court_code: &str,
        court: &str,
        fragment: &str,
        downloaded: bool,
        window: &DateWindow,
    ) -> Self {
        Self {
            details,
            court_code: court_code.to_string(),
            court: court.to_string(),
            pdf_link: fragment.to_string(),
            downloaded,
            from_date: window.from.to_string(),
            to_date: window.to.to_string(),
            remote_pdf_key: None,
            pdf_url: None,
        }
    }
}

/// Extracts case fields from a result row's markup
///
/// Fields the markup does not carry come back empty; extraction never fails.
pub fn extract(markup: &str) -> CaseDetails {
    let doc = Html::parse_fragment(markup);
    let mut details = CaseDetails {
        title: button_title(&doc).unwrap_or_default(),
        description: button_description(&doc).unwrap_or_default(),
        judge: judge_line(&doc).unwrap_or_default(),
        ..Default::default()
    };

    if let Some(block) = case_details_block(&doc) {
        details.cnr = labelled_value(block, "CNR").unwrap_or_default();
        details.date_of_registration =
            labelled_value(block, "Date of registration").unwrap_or_default();
        details.decision_date = labelled_value(block, "Decision Date").unwrap_or_default();
        details.disposal_nature = labelled_value(block, "Disposal Nature").unwrap_or_default();
    }

    details
}

/// Full text of the open button (the case title)
fn button_title(doc: &Html) -> Option<String> {
    let selector = Selector::parse("button").ok()?;
    let button = doc.select(&selector).next()?;
    let title = button.text().collect::<Vec<_>>().join("").trim().to_string();
    (!title.is_empty()).then_some(title)
}

/// Direct text children of the button, joined (case parties line)
fn button_description(doc: &Html) -> Option<String> {
    let selector = Selector::parse("button").ok()?;
    let button = doc.select(&selector).next()?;
    let description = button
        .children()
        .filter_map(|node| node.value().as_text().map(|t| t.trim()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!description.is_empty()).then_some(description)
}

/// The judge name from the first `<strong>` line mentioning a judge
fn judge_line(doc: &Html) -> Option<String> {
    let selector = Selector::parse("strong").ok()?;
    for strong in doc.select(&selector) {
        let text = strong.text().collect::<String>();
        if text.contains("Judge") || text.contains("Hon'ble") {
            let name = text.splitn(2, ':').nth(1)?.trim().to_string();
            return Some(name);
        }
    }
    None
}

fn case_details_block(doc: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("strong.caseDetailsTD").ok()?;
    doc.select(&selector).next()
}

/// Value of the `<font>` following the `<span>` whose text contains `label`
fn labelled_value(block: ElementRef<'_>, label: &str) -> Option<String> {
    let span_selector = Selector::parse("span").ok()?;
    for span in block.select(&span_selector) {
        let text = span.text().collect::<String>();
        if !text.contains(label) {
            continue;
        }
        for sibling in span.next_siblings() {
            if let Some(element) = ElementRef::wrap(sibling) {
                if element.value().name() == "font" {
                    return Some(element.text().collect::<String>().trim().to_string());
                }
                break;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROW_MARKUP: &str = r#"
        <button onclick="open_pdf('a','b','cases/2008/JUDG_1.pdf')">
            State of Maharashtra vs Anil Kumar
        </button>
        <strong>Hon'ble Judge : R. M. Lodha</strong>
        <strong class="caseDetailsTD">
            <span>CNR :</span><font>MHHC010012342008</font>
            <span>Date of registration :</span><font>02-01-2008</font>
            <span>Decision Date :</span><font>05-01-2008</font>
            <span>Disposal Nature :</span><font>Dismissed</font>
        </strong>
    "#;

    #[test]
    fn test_extract_full_row() {
        let details = extract(ROW_MARKUP);
        assert_eq!(details.title, "State of Maharashtra vs Anil Kumar");
        assert_eq!(details.judge, "R. M. Lodha");
        assert_eq!(details.cnr, "MHHC010012342008");
        assert_eq!(details.date_of_registration, "02-01-2008");
        assert_eq!(details.decision_date, "05-01-2008");
        assert_eq!(details.disposal_nature, "Dismissed");
    }

    #[test]
    fn test_extract_sparse_row() {
        let details = extract("<button>Only a title</button>");
        assert_eq!(details.title, "Only a title");
        assert_eq!(details.judge, "");
        assert_eq!(details.cnr, "");
    }

    #[test]
    fn test_extract_empty_markup() {
        let details = extract("");
        assert_eq!(details, CaseDetails::default());
    }

    #[test]
    fn test_record_carries_provenance() {
        use chrono::NaiveDate;

        let window = DateWindow::new(
            NaiveDate::from_ymd_opt(2008, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2008, 1, 5).unwrap(),
        )
        .unwrap();
        let record = CaseRecord::new(
            extract(ROW_MARKUP),
            "9~13",
            "Bombay High Court",
            "cases/2008/JUDG_1.pdf",
            true,
            &window,
        );

        assert_eq!(record.court_code, "9~13");
        assert_eq!(record.court, "Bombay High Court");
        assert!(record.downloaded);
        assert_eq!(record.from_date, "2008-01-01");
        assert_eq!(record.to_date, "2008-01-05");

        let json = serde_json::to_value(&record).unwrap();
        // Details flatten into the top-level object
        assert_eq!(json["title"], "State of Maharashtra vs Anil Kumar");
        assert_eq!(json["pdf_link"], "cases/2008/JUDG_1.pdf");
    }
}
