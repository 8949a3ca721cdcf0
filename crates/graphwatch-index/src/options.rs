//! Search options and results.

use serde::{Deserialize, Serialize};

/// Characters stripped from search strings before term extraction.
const SANITIZED: &str = "|+-=&<>!(){}[]^\"'~*?\\/.,:;_@";

/// Replaces query-syntax characters with spaces.
#[must_use]
pub fn sanitize(search_string: &str) -> String {
    search_string
        .chars()
        .map(|c| if SANITIZED.contains(c) { ' ' } else { c })
        .collect()
}

/// Lowercased search terms extracted from a raw search string.
#[must_use]
pub fn search_terms(search_string: &str) -> Vec<String> {
    sanitize(search_string)
        .split_whitespace()
        .map(str::to_lowercase)
        .collect()
}

/// Options of one search call.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    /// Zero-based result page.
    pub page: i64,
    /// Page size; negative means "return all" (page is then forced to 0).
    pub size: i64,
    /// Only return triggers whose last check score is at least 1.
    pub only_problems: bool,
    /// Every listed tag must be present on a matching trigger.
    pub tags: Vec<String>,
    /// Free-text terms, fuzzy-matched against name and description.
    pub search_string: String,
    /// Author filter value; empty selects triggers with no author set.
    pub created_by: String,
    /// Whether the author filter applies at all.
    pub need_search_by_created_by: bool,
    /// Sort solely by trigger id, ascending; used for bulk enumeration.
    pub sort_by_id_only: bool,
}

impl Default for SearchOptions {
    /// Unfiltered search returning every document on one page.
    fn default() -> Self {
        Self {
            page: 0,
            size: -1,
            only_problems: false,
            tags: Vec::new(),
            search_string: String::new(),
            created_by: String::new(),
            need_search_by_created_by: false,
            sort_by_id_only: false,
        }
    }
}

impl SearchOptions {
    /// True when no filter applies and the search is a match-all.
    #[must_use]
    pub fn is_match_all(&self) -> bool {
        !self.only_problems
            && self.tags.is_empty()
            && !self.need_search_by_created_by
            && search_terms(&self.search_string).is_empty()
    }
}

/// One highlighted field of a search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHighlight {
    /// External field tag, `"name"` or `"desc"`.
    pub field: String,
    /// Field text with matched tokens wrapped in `<mark>…</mark>`.
    pub value: String,
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    /// Id of the matched trigger.
    pub trigger_id: String,
    /// Highlight fragments keyed by field tag.
    pub highlights: Vec<SearchHighlight>,
}
