//! Search term handling and filter parsing for note queries.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Parsed search filter from query string.
///
/// Filters can be specified in the query string using prefixes:
/// - `project:<uuid>` - Only notes on this project
/// - `user:<uuid>` - Only notes written by this user
/// - `created:>2025-01-01` - Created after date
/// - `created:<2025-12-31` - Created before date
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    pub project_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    /// Created after this date/time
    pub created_after: Option<DateTime<Utc>>,
    /// Created before this date/time
    pub created_before: Option<DateTime<Utc>>,
}

impl SearchFilter {
    /// Check if filter has any constraints.
    pub fn is_empty(&self) -> bool {
        self.project_id.is_none()
            && self.user_id.is_none()
            && self.created_after.is_none()
            && self.created_before.is_none()
    }

    /// Apply one `prefix:value` token. Returns false if the token is not a
    /// filter or its value does not parse.
    fn apply(&mut self, token: &str) -> bool {
        if let Some(value) = token.strip_prefix("project:") {
            Uuid::parse_str(value)
                .map(|id| self.project_id = Some(id))
                .is_ok()
        } else if let Some(value) = token.strip_prefix("user:") {
            Uuid::parse_str(value)
                .map(|id| self.user_id = Some(id))
                .is_ok()
        } else if let Some(value) = token.strip_prefix("created:>") {
            parse_date(value)
                .map(|dt| self.created_after = Some(dt))
                .is_some()
        } else if let Some(value) = token.strip_prefix("created:<") {
            parse_date(value)
                .map(|dt| self.created_before = Some(dt))
                .is_some()
        } else {
            false
        }
    }
}

/// Parse a raw query string into (remaining query text, filters).
///
/// Filter tokens are cut out together with the whitespace that separates
/// them from the text; everything else is kept verbatim. Tokens whose filter
/// value does not parse are kept as search text.
///
/// # Examples
///
/// ```
/// use notestore::search::parse_query;
///
/// let (query, filter) = parse_query("created:>2025-01-01 preheat  oven");
/// assert_eq!(query, "preheat  oven");
/// assert!(filter.created_after.is_some());
/// ```
pub fn parse_query(raw: &str) -> (String, SearchFilter) {
    let mut filter = SearchFilter::default();
    let tokens: Vec<(usize, usize, bool)> = token_spans(raw)
        .into_iter()
        .map(|(start, end)| (start, end, filter.apply(&raw[start..end])))
        .collect();

    let mut remaining = String::with_capacity(raw.len());
    let mut cursor = 0;
    for (i, &(start, _, is_filter)) in tokens.iter().enumerate() {
        if !is_filter {
            continue;
        }
        let text_follows = tokens[i + 1..].iter().any(|t| !t.2);
        let (cut_start, cut_end) = if text_follows {
            // Drop the token and the whitespace up to the next token
            (start, tokens[i + 1].0)
        } else {
            // Trailing filters take the whitespace before them instead
            (if i == 0 { 0 } else { tokens[i - 1].1 }, raw.len())
        };
        if cut_start > cursor {
            remaining.push_str(&raw[cursor..cut_start]);
        }
        cursor = cursor.max(cut_end);
    }
    remaining.push_str(&raw[cursor..]);

    (remaining, filter)
}

/// Byte ranges of the whitespace-separated tokens in `raw`.
fn token_spans(raw: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;
    for (i, c) in raw.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, i));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, raw.len()));
    }
    spans
}

/// Case-insensitive substring test with full Unicode lowercasing.
///
/// Every character in `term` is literal; there are no wildcards.
pub fn contains_ignore_case(message: &str, term: &str) -> bool {
    message.to_lowercase().contains(&term.to_lowercase())
}

/// Parse a date string into DateTime<Utc>.
/// Supports ISO 8601 date format (YYYY-MM-DD) or full datetime.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // Date only - midnight UTC
    if let Ok(date) = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        let datetime = date.and_hms_opt(0, 0, 0)?;
        return Some(DateTime::from_naive_utc_and_offset(datetime, Utc));
    }

    None
}
