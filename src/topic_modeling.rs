use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::corpus::{Corpus, Vocabulary};
use crate::error::{Result, TopicsError};

/// Document-topic concentration prior.
pub const DEFAULT_ALPHA: f64 = 0.1;
/// Topic-word concentration prior.
pub const DEFAULT_BETA: f64 = 0.01;

/// Documents per worker chunk during the E-step. Fixed so that the chunk
/// partition, and therefore the merge order of partial statistics, never
/// depends on the thread pool.
const CHUNK_SIZE: usize = 256;

/// Latent Dirichlet Allocation over a bag-of-words corpus.
///
/// Training runs EM-style refinement for exactly the requested number of
/// passes. All randomness (initialization noise) comes from the explicit seed,
/// and per-chunk statistics are merged in chunk order, so identical inputs and
/// seed give bit-for-bit identical parameters regardless of worker scheduling.
#[derive(Debug, Clone)]
pub struct LdaModel {
    num_topics: usize,
    alpha: f64,
    beta: f64,
    seed: u64,
    /// K x V, rows sum to 1. `None` until fitted.
    topic_word: Option<Vec<Vec<f64>>>,
    /// D x K, rows sum to 1. `None` until fitted.
    doc_topic: Option<Vec<Vec<f64>>>,
}

impl LdaModel {
    pub fn new(num_topics: usize) -> Self {
        LdaModel {
            num_topics,
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
            seed: 0,
            topic_word: None,
            doc_topic: None,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn num_topics(&self) -> usize {
        self.num_topics
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn is_trained(&self) -> bool {
        self.topic_word.is_some()
    }

    /// Topic-word distribution (K x V), one row per topic.
    pub fn topic_word(&self) -> Result<&[Vec<f64>]> {
        self.topic_word
            .as_deref()
            .ok_or(TopicsError::ModelNotTrained)
    }

    /// Document-topic mixture (D x K), index-aligned with the training corpus.
    pub fn doc_topic(&self) -> Result<&[Vec<f64>]> {
        self.doc_topic
            .as_deref()
            .ok_or(TopicsError::ModelNotTrained)
    }

    /// Fits the model against a fixed corpus for exactly `passes` sweeps.
    pub fn fit(&mut self, corpus: &Corpus, passes: usize) -> Result<()> {
        if self.num_topics == 0 {
            return Err(TopicsError::invalid_param(
                "num_topics",
                "must be a positive integer",
            ));
        }
        if passes == 0 {
            return Err(TopicsError::invalid_param(
                "passes",
                "must be a positive integer",
            ));
        }
        if corpus.num_nonempty() == 0 {
            return Err(TopicsError::EmptyCorpus);
        }
        let num_terms = corpus.num_terms();
        if let Some(bad) = corpus
            .docs()
            .iter()
            .filter_map(|doc| doc.max_id())
            .find(|&id| id >= num_terms)
        {
            return Err(TopicsError::InvalidInput(format!(
                "bag-of-words id {bad} is outside the vocabulary (size {num_terms})"
            )));
        }

        let k = self.num_topics;
        let v = num_terms;
        let d = corpus.len();

        // Near-uniform start with seeded noise to break symmetry.
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut doc_topic = init_rows(&mut rng, d, k);
        let mut topic_word = init_rows(&mut rng, k, v);

        for _ in 0..passes {
            // E-step: expected topic counts, accumulated per fixed-size chunk
            // of documents and merged below in chunk order.
            let partials: Vec<ChunkStats> = corpus
                .docs()
                .par_chunks(CHUNK_SIZE)
                .enumerate()
                .map(|(chunk_idx, chunk)| {
                    let mut stats = ChunkStats {
                        topic_word: vec![0.0; k * v],
                        doc_rows: Vec::with_capacity(chunk.len()),
                    };
                    let mut probs = vec![0.0; k];
                    for (offset, doc) in chunk.iter().enumerate() {
                        let doc_idx = chunk_idx * CHUNK_SIZE + offset;
                        let theta = &doc_topic[doc_idx];
                        let mut row = vec![0.0; k];
                        for (word_id, count) in doc.iter() {
                            let mut sum = 0.0;
                            for t in 0..k {
                                let p = theta[t] * topic_word[t][word_id];
                                probs[t] = p;
                                sum += p;
                            }
                            if sum > 0.0 {
                                let scale = count as f64 / sum;
                                for t in 0..k {
                                    let expected = probs[t] * scale;
                                    row[t] += expected;
                                    stats.topic_word[t * v + word_id] += expected;
                                }
                            }
                        }
                        stats.doc_rows.push((doc_idx, row));
                    }
                    stats
                })
                .collect();

            let mut tw_counts = vec![0.0; k * v];
            let mut dt_counts = vec![vec![0.0; k]; d];
            for stats in partials {
                for (slot, value) in tw_counts.iter_mut().zip(stats.topic_word) {
                    *slot += value;
                }
                for (doc_idx, row) in stats.doc_rows {
                    dt_counts[doc_idx] = row;
                }
            }

            // M-step: re-normalize with Dirichlet smoothing.
            for t in 0..k {
                let counts = &tw_counts[t * v..(t + 1) * v];
                let denom: f64 = counts.iter().sum::<f64>() + v as f64 * self.beta;
                for (w, &count) in counts.iter().enumerate() {
                    topic_word[t][w] = (count + self.beta) / denom;
                }
            }
            for (doc_idx, counts) in dt_counts.iter().enumerate() {
                let denom: f64 = counts.iter().sum::<f64>() + k as f64 * self.alpha;
                for t in 0..k {
                    doc_topic[doc_idx][t] = (counts[t] + self.alpha) / denom;
                }
            }
        }

        self.topic_word = Some(topic_word);
        self.doc_topic = Some(doc_topic);
        Ok(())
    }

    /// Per topic, the `n` highest-weighted word ids (ties to the lower id).
    pub fn top_word_ids(&self, n: usize) -> Result<Vec<Vec<usize>>> {
        let topic_word = self.topic_word()?;
        Ok(topic_word
            .iter()
            .map(|weights| {
                let mut ranked: Vec<(usize, f64)> = weights.iter().copied().enumerate().collect();
                ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
                ranked.truncate(n);
                ranked.into_iter().map(|(id, _)| id).collect()
            })
            .collect())
    }

    /// Per topic, the `n` highest-weighted words with their probabilities.
    pub fn top_words(
        &self,
        vocabulary: &Vocabulary,
        n: usize,
    ) -> Result<Vec<Vec<(String, f64)>>> {
        let topic_word = self.topic_word()?;
        if vocabulary.len() != topic_word[0].len() {
            return Err(TopicsError::InvalidInput(format!(
                "vocabulary size {} does not match trained width {}",
                vocabulary.len(),
                topic_word[0].len()
            )));
        }
        let ids = self.top_word_ids(n)?;
        Ok(ids
            .into_iter()
            .enumerate()
            .map(|(topic, word_ids)| {
                word_ids
                    .into_iter()
                    .map(|id| {
                        let token = vocabulary.token(id).unwrap_or_default().to_string();
                        (token, topic_word[topic][id])
                    })
                    .collect()
            })
            .collect())
    }

    /// Dominant topic per document; `None` where the bag-of-words is empty.
    ///
    /// Recomputed from the mixture on every call so it always reflects the
    /// current model.
    pub fn dominant_topics(&self, corpus: &Corpus) -> Result<Vec<Option<usize>>> {
        let doc_topic = self.doc_topic()?;
        if corpus.len() != doc_topic.len() {
            return Err(TopicsError::InvalidInput(format!(
                "corpus has {} documents but the model was trained on {}",
                corpus.len(),
                doc_topic.len()
            )));
        }
        Ok(corpus
            .docs()
            .iter()
            .zip(doc_topic)
            .map(|(doc, weights)| {
                if doc.is_empty() {
                    return None;
                }
                let mut best = 0;
                for (topic, &weight) in weights.iter().enumerate() {
                    if weight > weights[best] {
                        best = topic;
                    }
                }
                Some(best)
            })
            .collect())
    }
}

struct ChunkStats {
    topic_word: Vec<f64>,
    doc_rows: Vec<(usize, Vec<f64>)>,
}

fn init_rows(rng: &mut StdRng, rows: usize, cols: usize) -> Vec<Vec<f64>> {
    (0..rows)
        .map(|_| {
            let mut row: Vec<f64> = (0..cols).map(|_| 1.0 + rng.gen::<f64>() * 0.05).collect();
            let sum: f64 = row.iter().sum();
            for value in &mut row {
                *value /= sum;
            }
            row
        })
        .collect()
}

/// Trains an LDA model against a frozen corpus and vocabulary.
pub fn train(
    corpus: &Corpus,
    vocabulary: &Vocabulary,
    num_topics: usize,
    passes: usize,
    seed: u64,
) -> Result<LdaModel> {
    if vocabulary.len() != corpus.num_terms() {
        return Err(TopicsError::InvalidInput(format!(
            "vocabulary size {} does not match corpus width {}",
            vocabulary.len(),
            corpus.num_terms()
        )));
    }
    let mut model = LdaModel::new(num_topics).with_seed(seed);
    model.fit(corpus, passes)?;
    Ok(model)
}
