//! Retention schema table.
//!
//! Answers "what is the retention of metric *m*?" from a Graphite-style
//! schema file of alternating `… = <regex>` / `… = <step>[smhdwy]:<rest>`
//! line pairs. Rules are checked in file order; lookups are cached for one
//! minute per metric name.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use parking_lot::RwLock;
use regex::Regex;

use crate::error::{FilterError, Result};

/// Retention assigned when no rule matches, in seconds.
pub const DEFAULT_RETENTION: i64 = 60;

/// How long a cached lookup stays valid, in seconds.
const CACHE_TTL: i64 = 60;

/// One schema rule: first matching regex wins.
#[derive(Debug)]
struct RetentionRule {
    pattern: Regex,
    retention: i64,
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    retention: i64,
    cached_at: i64,
}

/// Immutable retention table with an internal lookup cache.
#[derive(Debug, Default)]
pub struct RetentionTable {
    rules: Vec<RetentionRule>,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

impl RetentionTable {
    /// Loads the table from a schema file.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::RetentionConfig`] on a malformed regex or step,
    /// or [`FilterError::Io`] if the file cannot be read.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::from_reader(BufReader::new(File::open(path)?))
    }

    /// Loads the table from any line-oriented reader.
    ///
    /// Comment lines (`#`) and lines without exactly one `=` are skipped.
    /// Remaining lines alternate regex and retention; a regex line without a
    /// well-formed retention partner is an error.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::RetentionConfig`] on a malformed pair.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut rules = Vec::new();
        let mut pending: Option<(usize, Regex)> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line?;
            let trimmed = line.trim();
            if trimmed.starts_with('#') || trimmed.bytes().filter(|b| *b == b'=').count() != 1 {
                continue;
            }
            let value = trimmed
                .split('=')
                .nth(1)
                .unwrap_or_default()
                .trim()
                .to_string();

            match pending.take() {
                None => {
                    let pattern =
                        Regex::new(&value).map_err(|e| FilterError::RetentionConfig {
                            line: line_no,
                            reason: format!("invalid regex {value:?}: {e}"),
                        })?;
                    pending = Some((line_no, pattern));
                }
                Some((_, pattern)) => {
                    let retention = parse_retention(&value).map_err(|reason| {
                        FilterError::RetentionConfig {
                            line: line_no,
                            reason,
                        }
                    })?;
                    rules.push(RetentionRule { pattern, retention });
                }
            }
        }

        if let Some((line_no, _)) = pending {
            return Err(FilterError::RetentionConfig {
                line: line_no,
                reason: "pattern line without a retention line".to_string(),
            });
        }

        Ok(Self {
            rules,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Returns the retention of `metric` in seconds, consulting the cache.
    ///
    /// `now` is the current unix timestamp; cache entries expire after one
    /// minute.
    pub fn retention(&self, metric: &str, now: i64) -> i64 {
        if let Some(entry) = self.cache.read().get(metric) {
            if entry.cached_at + CACHE_TTL > now {
                return entry.retention;
            }
        }

        let retention = self
            .rules
            .iter()
            .find(|rule| rule.pattern.is_match(metric))
            .map_or(DEFAULT_RETENTION, |rule| rule.retention);

        self.cache.write().insert(
            metric.to_string(),
            CacheEntry {
                retention,
                cached_at: now,
            },
        );
        retention
    }

    /// Number of loaded rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

/// Parses `<integer>[smhdwy]` out of a retention value like `60s:30d`.
///
/// The step must be positive: downstream timestamp rounding divides by it.
fn parse_retention(value: &str) -> std::result::Result<i64, String> {
    let step = value.split(':').next().unwrap_or_default();
    let digits: String = step.chars().take_while(char::is_ascii_digit).collect();
    let amount: i64 = digits
        .parse()
        .map_err(|_| format!("invalid retention step {step:?}"))?;
    if amount == 0 {
        return Err(format!("retention step must be positive, got {step:?}"));
    }
    let multiplier = match &step[digits.len()..] {
        "" | "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86_400,
        "w" => 604_800,
        "y" => 31_536_000,
        unit => return Err(format!("unknown retention unit {unit:?}")),
    };
    Ok(amount * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use test_case::test_case;

    fn table(schema: &str) -> RetentionTable {
        RetentionTable::from_reader(Cursor::new(schema.to_string())).expect("valid schema")
    }

    const SCHEMA: &str = "\
# comment line
[carbon]
pattern = ^carbon\\.
retentions = 10s:1d
[default]
pattern = .*
retentions = 60s:30d
";

    #[test]
    fn loads_pairs_in_order() {
        let t = table(SCHEMA);
        assert_eq!(t.rule_count(), 2);
        assert_eq!(t.retention("carbon.agents.a", 0), 10);
        assert_eq!(t.retention("some.other.metric", 0), 60);
    }

    #[test]
    fn first_matching_rule_wins() {
        let t = table(
            "p = ^a\\.b\nr = 10\np = ^a\\.\nr = 30\n",
        );
        assert_eq!(t.retention("a.b.c", 0), 10);
        assert_eq!(t.retention("a.x", 0), 30);
    }

    #[test]
    fn no_match_defaults_to_sixty() {
        let t = table("p = ^carbon\\.\nr = 10s:1d\n");
        assert_eq!(t.retention("unrelated.metric", 0), DEFAULT_RETENTION);
    }

    #[test_case("10", 10; "bare seconds")]
    #[test_case("10s:1d", 10; "seconds with rest")]
    #[test_case("1m", 60; "minutes")]
    #[test_case("2h", 7200; "hours")]
    #[test_case("1d", 86_400; "days")]
    #[test_case("1w", 604_800; "weeks")]
    #[test_case("1y", 31_536_000; "years")]
    fn retention_units(value: &str, expected: i64) {
        assert_eq!(parse_retention(value).expect("valid step"), expected);
    }

    #[test]
    fn malformed_regex_is_an_error() {
        let err = RetentionTable::from_reader(Cursor::new("p = [unclosed\nr = 10\n".to_string()));
        assert!(matches!(
            err,
            Err(FilterError::RetentionConfig { line: 1, .. })
        ));
    }

    #[test]
    fn malformed_step_is_an_error() {
        let err = RetentionTable::from_reader(Cursor::new("p = .*\nr = tens\n".to_string()));
        assert!(matches!(
            err,
            Err(FilterError::RetentionConfig { line: 2, .. })
        ));
    }

    #[test_case("0"; "bare zero")]
    #[test_case("0s:1d"; "zero seconds with rest")]
    #[test_case("0m"; "zero minutes")]
    fn zero_step_is_rejected_at_load(step: &str) {
        // A zero step would divide by zero in timestamp rounding.
        let schema = format!("p = .*\nr = {step}\n");
        let err = RetentionTable::from_reader(Cursor::new(schema));
        assert!(matches!(
            err,
            Err(FilterError::RetentionConfig { line: 2, .. })
        ));
    }

    #[test]
    fn dangling_pattern_line_is_an_error() {
        let err = RetentionTable::from_reader(Cursor::new("p = .*\n".to_string()));
        assert!(matches!(err, Err(FilterError::RetentionConfig { .. })));
    }

    #[test]
    fn lines_without_single_equals_are_skipped() {
        let t = table("no equals here\na = b = c\np = ^x\\.\nr = 10\n");
        assert_eq!(t.rule_count(), 1);
    }

    #[test]
    fn cache_entry_expires_after_ttl() {
        let t = table("p = ^a\\.\nr = 10\n");
        assert_eq!(t.retention("a.b", 1000), 10);
        // Within the TTL a (hypothetically changed) answer would still come
        // from cache; after the TTL the rules are consulted again.
        assert_eq!(t.retention("a.b", 1000 + 59), 10);
        assert_eq!(t.retention("a.b", 1000 + 61), 10);
    }

    #[test]
    fn retention_lookup_feeds_half_up_rounding() {
        let t = table("p = ^a\\.b\nr = 10\n");
        let retention = t.retention("a.b.c", 1_234_567_895);
        assert_eq!(retention, 10);
        assert_eq!(
            graphwatch_store::round_to_retention(1_234_567_895, retention),
            1_234_567_900
        );
    }
}
