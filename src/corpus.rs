use std::collections::HashMap;

use counter::Counter;
use serde::{Deserialize, Serialize};

/// Bijective token <-> id mapping, frozen once built.
///
/// Ids are dense in `0..len()` and assigned in first-appearance order over the
/// input documents, so the same document sequence always produces the same
/// mapping.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    tokens: Vec<String>,
    ids: HashMap<String, usize>,
}

impl Vocabulary {
    /// Rebuild a vocabulary from its id-ordered token list (artifact loading).
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        let ids = tokens
            .iter()
            .enumerate()
            .map(|(id, token)| (token.clone(), id))
            .collect();
        Vocabulary { tokens, ids }
    }

    fn intern(&mut self, token: &str) -> usize {
        if let Some(&id) = self.ids.get(token) {
            return id;
        }
        let id = self.tokens.len();
        self.tokens.push(token.to_string());
        self.ids.insert(token.to_string(), id);
        id
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn token(&self, id: usize) -> Option<&str> {
        self.tokens.get(id).map(String::as_str)
    }

    pub fn id(&self, token: &str) -> Option<usize> {
        self.ids.get(token).copied()
    }

    /// Tokens in id order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}

/// Sparse bag-of-words representation of a single document.
///
/// Entries are `(vocabulary id, count)` pairs with ids strictly increasing and
/// counts >= 1. A document that normalized to no tokens is represented by an
/// empty entry list, not skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BowDocument {
    entries: Vec<(usize, usize)>,
}

impl BowDocument {
    pub fn from_entries(mut entries: Vec<(usize, usize)>) -> Self {
        entries.sort_unstable_by_key(|&(id, _)| id);
        BowDocument { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of distinct terms.
    pub fn num_terms(&self) -> usize {
        self.entries.len()
    }

    /// Total token count.
    pub fn num_tokens(&self) -> usize {
        self.entries.iter().map(|&(_, count)| count).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.entries.iter().copied()
    }

    /// Largest vocabulary id present, if any.
    pub fn max_id(&self) -> Option<usize> {
        self.entries.last().map(|&(id, _)| id)
    }

    /// Recovers the token multiset (id order, counts exact).
    pub fn decode(&self, vocabulary: &Vocabulary) -> Vec<String> {
        let mut tokens = Vec::with_capacity(self.num_tokens());
        for (id, count) in self.iter() {
            if let Some(token) = vocabulary.token(id) {
                for _ in 0..count {
                    tokens.push(token.to_string());
                }
            }
        }
        tokens
    }
}

/// Ordered sequence of bag-of-words documents, index-aligned with its source.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    docs: Vec<BowDocument>,
    num_terms: usize,
}

impl Corpus {
    pub fn new(docs: Vec<BowDocument>, num_terms: usize) -> Self {
        Corpus { docs, num_terms }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Vocabulary size the corpus was built against.
    pub fn num_terms(&self) -> usize {
        self.num_terms
    }

    pub fn docs(&self) -> &[BowDocument] {
        &self.docs
    }

    /// Documents with at least one token.
    pub fn num_nonempty(&self) -> usize {
        self.docs.iter().filter(|doc| !doc.is_empty()).count()
    }
}

/// Builds the frozen vocabulary and the bag-of-words corpus in one scan.
///
/// Documents with zero tokens yield empty bag-of-words entries so that corpus
/// indices stay aligned with the source rows.
pub fn build_corpus(documents: &[Vec<String>]) -> (Vocabulary, Corpus) {
    let mut vocabulary = Vocabulary::default();
    let mut docs = Vec::with_capacity(documents.len());

    for document in documents {
        let counts: Counter<usize> = document
            .iter()
            .map(|token| vocabulary.intern(token))
            .collect();
        docs.push(BowDocument::from_entries(counts.into_map().into_iter().collect()));
    }

    let num_terms = vocabulary.len();
    (vocabulary, Corpus::new(docs, num_terms))
}
