//! Request payloads for the search and PDF-link endpoints
//!
//! Both endpoints take DataTables-style form payloads with a large fixed
//! field set; only the cursor, window bounds, court code, and token vary
//! between calls.

use crate::scheduler::DateWindow;
use crate::session::Form;

/// Fixed fields of the paginated search payload
const SEARCH_DEFAULTS: &[(&str, &str)] = &[
    ("sEcho", "1"),
    ("iColumns", "2"),
    ("sColumns", ","),
    ("iDisplayStart", "0"),
    ("iDisplayLength", "100"),
    ("mDataProp_0", "0"),
    ("bRegex_0", "false"),
    ("bSearchable_0", "true"),
    ("bSortable_0", "true"),
    ("mDataProp_1", "1"),
    ("bRegex_1", "false"),
    ("bSearchable_1", "true"),
    ("bSortable_1", "true"),
    ("bRegex", "false"),
    ("iSortCol_0", "0"),
    ("sSortDir_0", "asc"),
    ("iSortingCols", "1"),
    ("dist_code", "null"),
    ("int_fin_party_val", "undefined"),
    ("int_fin_case_val", "undefined"),
    ("int_fin_court_val", "undefined"),
    ("int_fin_decision_val", "undefined"),
    ("sel_search_by", "undefined"),
    ("sections", "undefined"),
    ("search_opt", "PHRASE"),
    ("date_val", "ALL"),
    ("fcourt_type", "2"),
    ("ajax_req", "true"),
];

/// Fixed fields of the PDF-link payload
const PDF_LINK_DEFAULTS: &[(&str, &str)] = &[
    ("val", "0"),
    ("lang_flg", "undefined"),
    ("search", " "),
    ("fcourt_type", "2"),
    ("file_type", "undefined"),
    ("nc_display", "undefined"),
    ("ajax_req", "true"),
];

/// Pagination cursor: echo counter plus row offset
///
/// Both reset to their initial values at the start of a window and advance
/// together after each fully processed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub echo: u32,
    pub offset: u32,
}

impl Cursor {
    pub fn start() -> Self {
        Self { echo: 1, offset: 0 }
    }

    /// Moves to the next page
    pub fn advance(&mut self, page_size: u32) {
        self.echo += 1;
        self.offset += page_size;
    }

    /// Writes the cursor fields into a search form
    pub fn apply(&self, form: &mut Form) {
        form.set("sEcho", self.echo.to_string());
        form.set("iDisplayStart", self.offset.to_string());
    }
}

/// Builds the search payload for one court and window
pub fn search_form(court_code: &str, window: &DateWindow, page_size: u32) -> Form {
    let mut form = Form::new();
    for (key, value) in SEARCH_DEFAULTS {
        form.set(key, *value);
    }
    form.set("iDisplayLength", page_size.to_string());
    form.set("from_date", window.from.to_string());
    form.set("to_date", window.to.to_string());
    form.set("state_code", court_code);
    form
}

/// Builds the PDF-link payload for one result row
pub fn pdf_link_form(fragment: &str, row_index: usize) -> Form {
    let mut form = Form::new();
    for (key, value) in PDF_LINK_DEFAULTS {
        form.set(key, *value);
    }
    form.set("path", fragment);
    form.set("val", row_index.to_string());
    form
}
