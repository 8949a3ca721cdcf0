//! In-memory inverted index engine.
//!
//! Documents are indexed into per-field token postings plus exact posting
//! lists for tags and authors. Free-text terms are fuzzy-matched against the
//! token postings (Levenshtein distance at most one), with name matches
//! boosted over description matches, and highlights wrap every matched token
//! in `<mark>…</mark>`.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use tracing::debug;

use crate::document::{Field, TriggerDocument};
use crate::engine::SearchEngine;
use crate::error::Result;
use crate::options::{SearchHighlight, SearchOptions, SearchResult, search_terms};

#[derive(Debug, Default)]
struct Inner {
    docs: HashMap<String, TriggerDocument>,
    /// Lowercased name tokens to document ids.
    name_tokens: HashMap<String, HashSet<String>>,
    /// Lowercased description tokens to document ids.
    desc_tokens: HashMap<String, HashSet<String>>,
    /// Exact tag to document ids.
    by_tag: HashMap<String, HashSet<String>>,
    /// Exact author to document ids; the empty author is a valid key.
    by_author: HashMap<String, HashSet<String>>,
}

impl Inner {
    fn insert(&mut self, doc: TriggerDocument) {
        self.remove(&doc.id);
        let id = doc.id.clone();
        for token in search_terms(&doc.name) {
            self.name_tokens.entry(token).or_default().insert(id.clone());
        }
        for token in search_terms(&doc.desc) {
            self.desc_tokens.entry(token).or_default().insert(id.clone());
        }
        for tag in &doc.tags {
            self.by_tag.entry(tag.clone()).or_default().insert(id.clone());
        }
        self.by_author
            .entry(doc.created_by.clone())
            .or_default()
            .insert(id.clone());
        self.docs.insert(id, doc);
    }

    fn remove(&mut self, id: &str) {
        let Some(doc) = self.docs.remove(id) else {
            return;
        };
        for token in search_terms(&doc.name) {
            prune(&mut self.name_tokens, &token, id);
        }
        for token in search_terms(&doc.desc) {
            prune(&mut self.desc_tokens, &token, id);
        }
        for tag in &doc.tags {
            prune(&mut self.by_tag, tag, id);
        }
        prune(&mut self.by_author, &doc.created_by, id);
    }
}

fn prune(postings: &mut HashMap<String, HashSet<String>>, key: &str, id: &str) {
    if let Some(ids) = postings.get_mut(key) {
        ids.remove(id);
        if ids.is_empty() {
            postings.remove(key);
        }
    }
}

/// The in-tree search engine.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    inner: RwLock<Inner>,
}

impl MemoryEngine {
    /// Creates an empty engine.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SearchEngine for MemoryEngine {
    fn write(&self, documents: &[Option<TriggerDocument>]) -> Result<()> {
        let mut inner = self.inner.write();
        for doc in documents.iter().flatten() {
            inner.insert(doc.clone());
        }
        Ok(())
    }

    fn delete(&self, ids: &[String]) -> Result<()> {
        let mut inner = self.inner.write();
        for id in ids {
            inner.remove(id);
        }
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.inner.read().docs.len())
    }

    fn search(&self, options: &SearchOptions) -> Result<(Vec<SearchResult>, i64)> {
        let inner = self.inner.read();
        let terms = search_terms(&options.search_string);

        let mut candidates: HashSet<String> = inner.docs.keys().cloned().collect();
        let mut relevance: HashMap<String, f64> = HashMap::new();

        if !options.is_match_all() {
            for tag in &options.tags {
                let tagged = inner.by_tag.get(tag);
                candidates.retain(|id| tagged.is_some_and(|ids| ids.contains(id)));
            }
            if options.need_search_by_created_by {
                let authored = inner.by_author.get(&options.created_by);
                candidates.retain(|id| authored.is_some_and(|ids| ids.contains(id)));
            }
            if options.only_problems {
                candidates.retain(|id| {
                    inner.docs.get(id).is_some_and(|doc| doc.last_check_score >= 1)
                });
            }
            for term in &terms {
                let name_hits = match_term(&inner.name_tokens, term);
                let desc_hits = match_term(&inner.desc_tokens, term);
                // Terms are conjunctive; within one term, name and desc are
                // alternatives.
                candidates
                    .retain(|id| name_hits.contains_key(id) || desc_hits.contains_key(id));
                for id in &candidates {
                    let mut gain = 0.0;
                    if let Some(sim) = name_hits.get(id) {
                        gain += Field::Name.priority() * sim;
                    }
                    if let Some(sim) = desc_hits.get(id) {
                        gain += Field::Desc.priority() * sim;
                    }
                    *relevance.entry(id.clone()).or_insert(0.0) += gain;
                }
            }
        }

        let mut hits: Vec<&TriggerDocument> = candidates
            .iter()
            .filter_map(|id| inner.docs.get(id))
            .collect();

        if options.sort_by_id_only {
            hits.sort_by(|a, b| a.id.cmp(&b.id));
        } else {
            hits.sort_by(|a, b| {
                b.last_check_score
                    .cmp(&a.last_check_score)
                    .then_with(|| {
                        let ra = relevance.get(&a.id).copied().unwrap_or_default();
                        let rb = relevance.get(&b.id).copied().unwrap_or_default();
                        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
                    })
                    .then_with(|| a.name.cmp(&b.name))
                    .then_with(|| a.id.cmp(&b.id))
            });
        }

        let total = hits.len() as i64;
        let (page, size) = if options.size < 0 {
            (0, total)
        } else {
            (options.page, options.size)
        };
        let from = usize::try_from(page.saturating_mul(size)).unwrap_or(usize::MAX);
        let take = usize::try_from(size).unwrap_or(0);

        let results = hits
            .into_iter()
            .skip(from)
            .take(take)
            .map(|doc| SearchResult {
                trigger_id: doc.id.clone(),
                highlights: highlights_for(doc, &terms),
            })
            .collect();

        debug!(total, terms = terms.len(), "search executed");
        Ok((results, total))
    }

    fn close(&self) -> Result<()> {
        let mut inner = self.inner.write();
        *inner = Inner::default();
        Ok(())
    }
}

/// Matches one term against a postings map, returning id → best similarity.
fn match_term(
    postings: &HashMap<String, HashSet<String>>,
    term: &str,
) -> HashMap<String, f64> {
    let mut matched: HashMap<String, f64> = HashMap::new();
    for (token, ids) in postings {
        let Some(sim) = fuzzy_similarity(term, token) else {
            continue;
        };
        for id in ids {
            let best = matched.entry(id.clone()).or_insert(0.0);
            if sim > *best {
                *best = sim;
            }
        }
    }
    matched
}

/// Similarity of a term and an indexed token; `None` when they do not match.
///
/// Exact matches score 1.0; tokens within Levenshtein distance one score
/// proportionally lower.
fn fuzzy_similarity(term: &str, token: &str) -> Option<f64> {
    if term == token {
        return Some(1.0);
    }
    let longest = term.chars().count().max(token.chars().count());
    if longest == 0 || term.chars().count().abs_diff(token.chars().count()) > 1 {
        return None;
    }
    let distance = levenshtein(term, token);
    (distance <= 1).then(|| 1.0 - distance as f64 / longest as f64)
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Builds the `name`/`desc` highlight fragments of one hit.
fn highlights_for(doc: &TriggerDocument, terms: &[String]) -> Vec<SearchHighlight> {
    if terms.is_empty() {
        return Vec::new();
    }
    let mut highlights = Vec::new();
    for (field, text) in [(Field::Name, &doc.name), (Field::Desc, &doc.desc)] {
        if let Some(marked) = mark_tokens(text, terms) {
            highlights.push(SearchHighlight {
                field: field.tag().to_string(),
                value: marked,
            });
        }
    }
    highlights
}

/// Wraps every word matching a term in `<mark>…</mark>`.
///
/// Returns `None` when nothing in the text matched.
fn mark_tokens(text: &str, terms: &[String]) -> Option<String> {
    let mut any = false;
    let marked: Vec<String> = text
        .split_whitespace()
        .map(|word| {
            let word_matches = search_terms(word)
                .iter()
                .any(|token| terms.iter().any(|term| fuzzy_similarity(term, token).is_some()));
            if word_matches {
                any = true;
                format!("<mark>{word}</mark>")
            } else {
                word.to_string()
            }
        })
        .collect();
    any.then(|| marked.join(" "))
}
