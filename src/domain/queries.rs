//! Query arguments shared by every repository backend.
//!
//! Parsing and validation happen here once so that the MongoDB and in-memory
//! backends answer the same question the same way.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::shared::{HelpdeskError, Result};

/// Upper bound applied to "top N" queries.
pub const MAX_RESULT_LIMIT: usize = 100;

/// Inclusive time window. Construction fails when `start > end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(HelpdeskError::validation(
                "date_range",
                format!(
                    "start ({}) must not be after end ({})",
                    start.to_rfc3339(),
                    end.to_rfc3339()
                ),
            ));
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Validated "top N" count: zero is rejected, large values are clamped.
pub fn result_limit(count: usize) -> Result<usize> {
    if count == 0 {
        return Err(HelpdeskError::validation("count", "count must be at least 1"));
    }
    Ok(count.min(MAX_RESULT_LIMIT))
}

/// Comma separated tag search.
///
/// Terms are trimmed and lowercased. A record matches when any term is a
/// substring of any of its tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagQuery {
    terms: Vec<String>,
}

impl TagQuery {
    pub fn parse(raw: &str) -> Self {
        let mut terms: Vec<String> = Vec::new();
        for term in raw.split(',') {
            let term = term.trim().to_lowercase();
            if !term.is_empty() && !terms.contains(&term) {
                terms.push(term);
            }
        }
        Self { terms }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn matches(&self, tags: &[String]) -> bool {
        self.terms.iter().any(|term| {
            tags.iter()
                .any(|tag| tag.to_lowercase().contains(term.as_str()))
        })
    }
}

/// Counter descending, then id ascending.
pub fn by_counter_desc(a: (i64, &str), b: (i64, &str)) -> Ordering {
    b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn inverted_range_is_a_validation_error() {
        let now = Utc::now();
        let err = DateRange::new(now, now - Duration::days(1)).unwrap_err();
        assert!(matches!(err, HelpdeskError::ValidationError { ref field, .. } if field == "date_range"));

        let single_instant = DateRange::new(now, now).unwrap();
        assert!(single_instant.contains(now));
    }

    #[test]
    fn counts_are_validated_and_clamped() {
        assert!(result_limit(0).is_err());
        assert_eq!(result_limit(3).unwrap(), 3);
        assert_eq!(result_limit(10_000).unwrap(), MAX_RESULT_LIMIT);
    }

    #[test]
    fn tag_terms_match_any_tag_case_insensitively() {
        let query = TagQuery::parse(" Bill , ,REFUND, bill");
        assert_eq!(query.terms(), ["bill", "refund"]);

        assert!(query.matches(&["billing".to_string()]));
        assert!(query.matches(&["setup".to_string(), "refunds".to_string()]));
        assert!(!query.matches(&["password".to_string()]));
        assert!(!TagQuery::parse(" , ").matches(&["anything".to_string()]));
    }

    #[test]
    fn counter_order_breaks_ties_by_id() {
        let mut rows = vec![(3, "b"), (5, "z"), (3, "a")];
        rows.sort_by(|x, y| by_counter_desc(*x, *y));
        assert_eq!(rows, vec![(5, "z"), (3, "a"), (3, "b")]);
    }
}
