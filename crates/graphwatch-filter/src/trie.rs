//! Compiled pattern trie.
//!
//! All registered glob patterns are compiled into one trie, keyed segment by
//! segment. Each node carries a tagged segment variant:
//!
//! - [`Segment::Hashed`] — a literal segment (or `*`), compared by hash; the
//!   wildcard hash is precomputed and matches any input segment
//! - [`Segment::Alternatives`] — brace alternations expanded into their
//!   concrete glob alternatives, or a raw `*`/`?` glob segment
//!
//! The trie is immutable once built; the refresher publishes a fresh one via
//! an atomic pointer swap, so matching never takes a lock.

const WILDCARD: &str = "*";

/// FNV-1a hash of the literal `*`, the segment that matches anything.
const WILDCARD_HASH: u64 = fnv1a64(WILDCARD.as_bytes());

/// 64-bit FNV-1a.
const fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64;
    let mut i = 0;
    while i < bytes.len() {
        hash ^= bytes[i] as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        i += 1;
    }
    hash
}

/// How one trie node matches an input segment.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Literal segment compared by hash; `WILDCARD_HASH` matches anything.
    Hashed(u64),
    /// Glob alternatives; the segment matches if any alternative does.
    Alternatives(Vec<String>),
}

impl Segment {
    fn compile(text: &str) -> Self {
        if text == WILDCARD {
            return Self::Hashed(WILDCARD_HASH);
        }
        if let (Some(open), Some(close)) = (text.find('{'), text.rfind('}')) {
            if open < close {
                let prefix = &text[..open];
                let suffix = &text[close + 1..];
                return Self::Alternatives(
                    text[open + 1..close]
                        .split(',')
                        .map(|alt| format!("{prefix}{alt}{suffix}"))
                        .collect(),
                );
            }
        }
        if text.contains(['*', '?']) {
            return Self::Alternatives(vec![text.to_string()]);
        }
        Self::Hashed(fnv1a64(text.as_bytes()))
    }

    fn matches(&self, part: &str) -> bool {
        match self {
            Self::Hashed(hash) => {
                *hash == WILDCARD_HASH || *hash == fnv1a64(part.as_bytes())
            }
            Self::Alternatives(alternatives) => {
                alternatives.iter().any(|alt| glob_match(alt, part))
            }
        }
    }
}

#[derive(Debug)]
struct PatternNode {
    /// Original segment text; unique among the siblings of one parent.
    text: String,
    /// The pattern prefix up to and including this segment.
    prefix: String,
    segment: Segment,
    children: Vec<PatternNode>,
}

impl PatternNode {
    fn new(text: &str, prefix: String) -> Self {
        Self {
            text: text.to_string(),
            prefix,
            segment: Segment::compile(text),
            children: Vec::new(),
        }
    }
}

/// Compiled, immutable representation of all registered patterns.
#[derive(Debug, Default)]
pub struct PatternTrie {
    children: Vec<PatternNode>,
    patterns: usize,
}

impl PatternTrie {
    /// Compiles all patterns into a trie. Empty pattern strings are ignored.
    #[must_use]
    pub fn new(patterns: &[String]) -> Self {
        let mut trie = Self::default();
        for pattern in patterns {
            trie.add(pattern);
        }
        trie
    }

    fn add(&mut self, pattern: &str) {
        if pattern.is_empty() {
            return;
        }
        self.patterns += 1;
        let mut children = &mut self.children;
        let mut prefix = String::new();
        for (depth, part) in pattern.split('.').enumerate() {
            if depth == 0 {
                prefix = part.to_string();
            } else {
                prefix = format!("{prefix}.{part}");
            }
            let idx = match children.iter().position(|c| c.text == part) {
                Some(idx) => idx,
                None => {
                    children.push(PatternNode::new(part, prefix.clone()));
                    children.len() - 1
                }
            };
            children = &mut children[idx].children;
        }
    }

    /// Number of patterns compiled into this trie.
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns
    }

    /// Matches a metric name, returning every matched pattern string.
    ///
    /// A name containing an empty segment (`a..b`) matches nothing. Only
    /// patterns whose final trie node is childless terminate a match.
    #[must_use]
    pub fn match_metric(&self, metric: &str) -> Vec<String> {
        let parts: Vec<&str> = metric.split('.').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Vec::new();
        }

        let mut current: Vec<&PatternNode> = self
            .children
            .iter()
            .filter(|c| c.segment.matches(parts[0]))
            .collect();

        for part in &parts[1..] {
            if current.is_empty() {
                return Vec::new();
            }
            current = current
                .iter()
                .flat_map(|node| node.children.iter())
                .filter(|c| c.segment.matches(part))
                .collect();
        }

        current
            .into_iter()
            .filter(|node| node.children.is_empty())
            .map(|node| node.prefix.clone())
            .collect()
    }
}

/// Glob semantics over one segment: `*` any run, `?` one character,
/// everything else literal.
fn glob_match(pattern: &str, text: &str) -> bool {
    let p = pattern.as_bytes();
    let t = text.as_bytes();
    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star: Option<usize> = None;
    let mut mark = 0usize;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == b'?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == b'*' {
            star = Some(pi);
            mark = ti;
            pi += 1;
        } else if let Some(star_pos) = star {
            pi = star_pos + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == b'*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use test_case::test_case;

    fn trie(patterns: &[&str]) -> PatternTrie {
        PatternTrie::new(&patterns.iter().map(ToString::to_string).collect::<Vec<_>>())
    }

    #[test]
    fn literal_pattern_matches_exactly() {
        let t = trie(&["a.b.c"]);
        assert_eq!(t.match_metric("a.b.c"), vec!["a.b.c".to_string()]);
        assert!(t.match_metric("a.b.d").is_empty());
        assert!(t.match_metric("a.b").is_empty());
        assert!(t.match_metric("a.b.c.d").is_empty());
    }

    #[test]
    fn star_matches_any_single_segment() {
        let t = trie(&["Star.single.*"]);
        assert_eq!(
            t.match_metric("Star.single.anything"),
            vec!["Star.single.*".to_string()]
        );
        assert!(t.match_metric("Star.nothing").is_empty());
        assert!(t.match_metric("Star.single.two.deep").is_empty());
    }

    #[test]
    fn brace_alternation_with_prefix_suffix() {
        let t = trie(&["pr{one,two}suf.x"]);
        assert_eq!(
            t.match_metric("pronesuf.x"),
            vec!["pr{one,two}suf.x".to_string()]
        );
        assert_eq!(
            t.match_metric("prtwosuf.x"),
            vec!["pr{one,two}suf.x".to_string()]
        );
        assert!(t.match_metric("prtensuf.x").is_empty());
    }

    #[test_case("Bracket.one.pattern", true)]
    #[test_case("Bracket.two.pattern", true)]
    #[test_case("Bracket.three.pattern", true)]
    #[test_case("Bracket.four.pattern", false)]
    fn brace_alternation_segment(metric: &str, matched: bool) {
        let t = trie(&["Bracket.{one,two,three}.pattern"]);
        assert_eq!(!t.match_metric(metric).is_empty(), matched);
    }

    #[test]
    fn question_mark_matches_exactly_one_character() {
        let t = trie(&["a.b?.c"]);
        assert_eq!(t.match_metric("a.bx.c"), vec!["a.b?.c".to_string()]);
        assert!(t.match_metric("a.b.c").is_empty());
        assert!(t.match_metric("a.bxx.c").is_empty());
    }

    #[test]
    fn glob_star_within_segment() {
        let t = trie(&["a.b*.c"]);
        assert!(!t.match_metric("a.b.c").is_empty());
        assert!(!t.match_metric("a.bxyz.c").is_empty());
        assert!(t.match_metric("a.xb.c").is_empty());
    }

    #[test]
    fn empty_input_segment_never_matches() {
        let t = trie(&["a.*.c", "a.b.c"]);
        assert!(t.match_metric("a..c").is_empty());
        assert!(t.match_metric(".a.c").is_empty());
        assert!(t.match_metric("a.b.").is_empty());
    }

    #[test]
    fn multiple_patterns_can_match_one_metric() {
        let t = trie(&["a.*.c", "a.b.*", "a.b.c"]);
        let mut matched = t.match_metric("a.b.c");
        matched.sort();
        assert_eq!(
            matched,
            vec!["a.*.c".to_string(), "a.b.*".to_string(), "a.b.c".to_string()]
        );
    }

    #[test]
    fn only_childless_nodes_terminate_a_match() {
        // "a.b" is an interior node of "a.b.c", so it is not a terminator.
        let t = trie(&["a.b.c"]);
        assert!(t.match_metric("a.b").is_empty());
    }

    #[test]
    fn shared_prefixes_merge_into_one_subtree() {
        let t = trie(&["x.y.one", "x.y.two"]);
        assert_eq!(t.pattern_count(), 2);
        assert_eq!(t.match_metric("x.y.one"), vec!["x.y.one".to_string()]);
        assert_eq!(t.match_metric("x.y.two"), vec!["x.y.two".to_string()]);
    }

    #[test]
    fn empty_patterns_are_ignored() {
        let t = trie(&["", "a.b"]);
        assert_eq!(t.pattern_count(), 1);
    }

    #[test_case("*", "anything", true; "bare star")]
    #[test_case("*", "", true; "star empty")]
    #[test_case("a*c", "abc", true; "star one char")]
    #[test_case("a*c", "ac", true; "star zero chars")]
    #[test_case("a*c", "abx", false; "star wrong suffix")]
    #[test_case("a?c", "abc", true; "question one char")]
    #[test_case("a?c", "ac", false; "question zero chars")]
    #[test_case("abc", "abc", true; "literal match")]
    #[test_case("abc", "abd", false; "literal mismatch")]
    #[test_case("a*b*c", "axxbyyc", true; "two stars")]
    fn glob_semantics(pattern: &str, text: &str, matched: bool) {
        assert_eq!(glob_match(pattern, text), matched);
    }

    proptest! {
        #[test]
        fn star_segment_matches_arbitrary_nonempty_segments(
            segment in "[a-zA-Z0-9_]{1,12}",
        ) {
            let t = trie(&["head.*"]);
            let metric = format!("head.{segment}");
            prop_assert_eq!(t.match_metric(&metric), vec!["head.*".to_string()]);
        }

        #[test]
        fn literal_patterns_match_only_themselves(
            a in "[a-z]{1,6}",
            b in "[a-z]{1,6}",
        ) {
            let pattern = format!("{a}.{b}");
            let t = PatternTrie::new(&[pattern.clone()]);
            prop_assert_eq!(t.match_metric(&pattern), vec![pattern.clone()]);
            let other = format!("{a}x.{b}");
            prop_assert!(t.match_metric(&other).is_empty());
        }
    }
}
