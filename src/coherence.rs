use std::collections::{HashMap, HashSet};

use crate::corpus::{Corpus, Vocabulary};
use crate::error::{Result, TopicsError};
use crate::topic_modeling::LdaModel;

/// Top words per topic entering the coherence statistic.
pub const DEFAULT_TOP_N: usize = 10;

/// Scores a trained model by the co-occurrence consistency of its topics.
///
/// Windowing policy: boolean document-level co-occurrence. A word occurs in a
/// document if its bag-of-words count is >= 1, and the window is the whole
/// document. For every unordered pair among a topic's `top_n` words the
/// normalized PMI is
///
/// ```text
/// npmi(i, j) = ln(P(i,j) / (P(i) * P(j))) / -ln(P(i,j))
/// ```
///
/// with probabilities estimated over all documents. A pair that never
/// co-occurs scores -1 (this also covers top words absent from the corpus);
/// a pair present in every document scores 0. Topic score is the mean over
/// pairs, the model score the mean over topics; higher is more interpretable.
pub fn evaluate(
    model: &LdaModel,
    corpus: &Corpus,
    vocabulary: &Vocabulary,
    top_n: usize,
) -> Result<f64> {
    if top_n < 2 {
        return Err(TopicsError::invalid_param(
            "top_n",
            "needs at least two words per topic to form pairs",
        ));
    }
    let topics = model.top_word_ids(top_n)?;
    let width = model.topic_word()?[0].len();
    if vocabulary.len() != width {
        return Err(TopicsError::InvalidInput(format!(
            "vocabulary size {} does not match trained width {}",
            vocabulary.len(),
            width
        )));
    }
    Ok(coherence_of_topics(&topics, corpus))
}

/// NPMI coherence of explicit per-topic word-id lists.
pub(crate) fn coherence_of_topics(topics: &[Vec<usize>], corpus: &Corpus) -> f64 {
    if topics.is_empty() {
        return 0.0;
    }

    let (doc_freq, pair_freq) = co_occurrence_counts(topics, corpus);
    let num_docs = corpus.len() as f64;

    let topic_scores: Vec<f64> = topics
        .iter()
        .map(|words| {
            let mut sum = 0.0;
            let mut pairs = 0usize;
            for (a, &wi) in words.iter().enumerate() {
                for &wj in &words[a + 1..] {
                    sum += npmi(wi, wj, &doc_freq, &pair_freq, num_docs);
                    pairs += 1;
                }
            }
            if pairs == 0 {
                0.0
            } else {
                sum / pairs as f64
            }
        })
        .collect();

    topic_scores.iter().sum::<f64>() / topic_scores.len() as f64
}

/// Document frequencies and within-topic pair co-occurrence frequencies for
/// the words under evaluation. Pairs are deduplicated across topics so a pair
/// shared by two topics is counted once per document.
fn co_occurrence_counts(
    topics: &[Vec<usize>],
    corpus: &Corpus,
) -> (HashMap<usize, usize>, HashMap<(usize, usize), usize>) {
    let interesting: HashSet<usize> = topics.iter().flatten().copied().collect();
    let mut pairs: HashSet<(usize, usize)> = HashSet::new();
    for words in topics {
        for (a, &wi) in words.iter().enumerate() {
            for &wj in &words[a + 1..] {
                if wi != wj {
                    pairs.insert(pair_key(wi, wj));
                }
            }
        }
    }

    let mut doc_freq: HashMap<usize, usize> = HashMap::new();
    let mut pair_freq: HashMap<(usize, usize), usize> = HashMap::new();

    for doc in corpus.docs() {
        let present: HashSet<usize> = doc
            .iter()
            .map(|(id, _)| id)
            .filter(|id| interesting.contains(id))
            .collect();
        if present.is_empty() {
            continue;
        }
        for &id in &present {
            *doc_freq.entry(id).or_insert(0) += 1;
        }
        for &(wi, wj) in &pairs {
            if present.contains(&wi) && present.contains(&wj) {
                *pair_freq.entry((wi, wj)).or_insert(0) += 1;
            }
        }
    }

    (doc_freq, pair_freq)
}

fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn npmi(
    wi: usize,
    wj: usize,
    doc_freq: &HashMap<usize, usize>,
    pair_freq: &HashMap<(usize, usize), usize>,
    num_docs: f64,
) -> f64 {
    if wi == wj {
        return 0.0;
    }
    let joint = pair_freq.get(&pair_key(wi, wj)).copied().unwrap_or(0);
    if joint == 0 {
        return -1.0;
    }
    let p_ij = joint as f64 / num_docs;
    if p_ij >= 1.0 {
        return 0.0;
    }
    let p_i = doc_freq.get(&wi).copied().unwrap_or(0) as f64 / num_docs;
    let p_j = doc_freq.get(&wj).copied().unwrap_or(0) as f64 / num_docs;
    (p_ij / (p_i * p_j)).ln() / -p_ij.ln()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::build_corpus;
    use crate::topic_modeling::train;

    fn docs(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|w| w.to_string()).collect())
            .collect()
    }

    #[test]
    fn perfectly_cooccurring_pair_scores_one() {
        let (vocabulary, corpus) = build_corpus(&docs(&[
            &["amber", "birch"],
            &["amber", "birch"],
            &["cedar", "dune"],
        ]));
        let a = vocabulary.id("amber").unwrap();
        let b = vocabulary.id("birch").unwrap();

        let score = coherence_of_topics(&[vec![a, b]], &corpus);
        assert!((score - 1.0).abs() < 1e-12, "score was {score}");
    }

    #[test]
    fn never_cooccurring_pair_scores_minus_one() {
        let (vocabulary, corpus) = build_corpus(&docs(&[
            &["amber", "birch"],
            &["amber", "birch"],
            &["cedar", "dune"],
        ]));
        let a = vocabulary.id("amber").unwrap();
        let c = vocabulary.id("cedar").unwrap();

        let score = coherence_of_topics(&[vec![a, c]], &corpus);
        assert!((score + 1.0).abs() < 1e-12, "score was {score}");
    }

    #[test]
    fn scores_average_over_topics() {
        let (vocabulary, corpus) = build_corpus(&docs(&[
            &["amber", "birch"],
            &["amber", "birch"],
            &["cedar", "dune"],
        ]));
        let a = vocabulary.id("amber").unwrap();
        let b = vocabulary.id("birch").unwrap();
        let c = vocabulary.id("cedar").unwrap();

        let score = coherence_of_topics(&[vec![a, b], vec![a, c]], &corpus);
        assert!(score.abs() < 1e-12, "score was {score}");
    }

    #[test]
    fn ubiquitous_pair_scores_zero() {
        let (vocabulary, corpus) =
            build_corpus(&docs(&[&["amber", "birch"], &["amber", "birch"]]));
        let a = vocabulary.id("amber").unwrap();
        let b = vocabulary.id("birch").unwrap();

        let score = coherence_of_topics(&[vec![a, b]], &corpus);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn out_of_corpus_words_count_zero_cooccurrence() {
        let (vocabulary, corpus) =
            build_corpus(&docs(&[&["amber", "birch"], &["amber", "birch"]]));
        let a = vocabulary.id("amber").unwrap();

        // Id 999 never appears in the corpus; the pair simply never co-occurs.
        let score = coherence_of_topics(&[vec![a, 999]], &corpus);
        assert!((score + 1.0).abs() < 1e-12, "score was {score}");
    }

    #[test]
    fn evaluate_rejects_untrained_model_and_tiny_top_n() {
        let (vocabulary, corpus) = build_corpus(&docs(&[
            &["amber", "birch", "amber"],
            &["cedar", "dune", "cedar"],
        ]));
        let untrained = crate::topic_modeling::LdaModel::new(2);
        assert!(matches!(
            evaluate(&untrained, &corpus, &vocabulary, 5).unwrap_err(),
            TopicsError::ModelNotTrained
        ));

        let model = train(&corpus, &vocabulary, 2, 5, 42).unwrap();
        assert!(matches!(
            evaluate(&model, &corpus, &vocabulary, 1).unwrap_err(),
            TopicsError::InvalidParameter { param: "top_n", .. }
        ));
    }

    #[test]
    fn evaluate_returns_a_bounded_score() {
        let (vocabulary, corpus) = build_corpus(&docs(&[
            &["amber", "birch", "amber"],
            &["amber", "birch"],
            &["cedar", "dune", "cedar"],
            &["cedar", "dune"],
        ]));
        let model = train(&corpus, &vocabulary, 2, 10, 42).unwrap();
        let score = evaluate(&model, &corpus, &vocabulary, 2).unwrap();

        assert!((-1.0..=1.0).contains(&score), "score was {score}");
    }
}
