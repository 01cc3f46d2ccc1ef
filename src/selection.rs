use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use crate::coherence;
use crate::corpus::{Corpus, Vocabulary};
use crate::error::{Result, TopicsError};
use crate::topic_modeling::{self, LdaModel};

/// Cooperative stop signal for a running sweep.
///
/// Cloning shares the flag; `cancel` is checked before each candidate starts,
/// so already-completed candidates keep their results.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// One evaluated candidate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CandidateScore {
    pub num_topics: usize,
    pub coherence: f64,
}

/// One candidate that failed to train or evaluate; the sweep continues past it.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateFailure {
    pub num_topics: usize,
    pub reason: String,
}

/// Result of a candidate sweep.
///
/// `scores` and `failures` are in candidate input order. `best` is `None` only
/// when no candidate completed (all failed, or the sweep was cancelled before
/// the first one finished); partial results survive cancellation.
#[derive(Debug)]
pub struct SweepOutcome {
    pub best: Option<(usize, LdaModel)>,
    pub scores: Vec<CandidateScore>,
    pub failures: Vec<CandidateFailure>,
    pub cancelled: bool,
}

impl SweepOutcome {
    pub fn best_num_topics(&self) -> Option<usize> {
        self.best.as_ref().map(|(num_topics, _)| *num_topics)
    }

    pub fn best_model(&self) -> Option<&LdaModel> {
        self.best.as_ref().map(|(_, model)| model)
    }
}

/// Sweeps candidate topic counts, training and scoring each, and picks the
/// argmax-coherence model.
///
/// Candidates are an independent-task batch on the rayon pool; every candidate
/// trains with the same passes and seed. Ties go to the smaller topic count
/// (simpler model preferred).
#[derive(Debug, Clone)]
pub struct ModelSelector {
    candidates: Vec<usize>,
    passes: usize,
    seed: u64,
    top_n: usize,
}

impl ModelSelector {
    pub fn new(candidates: Vec<usize>) -> Self {
        ModelSelector {
            candidates,
            passes: 5,
            seed: 42,
            top_n: coherence::DEFAULT_TOP_N,
        }
    }

    pub fn with_passes(mut self, passes: usize) -> Self {
        self.passes = passes;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn candidates(&self) -> &[usize] {
        &self.candidates
    }

    /// Runs the full sweep.
    pub fn select(&self, corpus: &Corpus, vocabulary: &Vocabulary) -> Result<SweepOutcome> {
        self.select_with_cancel(corpus, vocabulary, &CancelFlag::new())
    }

    /// Runs the sweep, checking the flag before each candidate starts.
    pub fn select_with_cancel(
        &self,
        corpus: &Corpus,
        vocabulary: &Vocabulary,
        cancel: &CancelFlag,
    ) -> Result<SweepOutcome> {
        if self.candidates.is_empty() {
            return Err(TopicsError::invalid_param(
                "candidate_topic_counts",
                "must be a non-empty sequence",
            ));
        }
        if let Some(&bad) = self.candidates.iter().find(|&&k| k == 0) {
            return Err(TopicsError::invalid_param(
                "candidate_topic_counts",
                format!("all candidates must be positive, got {bad}"),
            ));
        }

        let results: Vec<CandidateResult> = self
            .candidates
            .par_iter()
            .map(|&num_topics| {
                if cancel.is_cancelled() {
                    return CandidateResult::Skipped;
                }
                let outcome = topic_modeling::train(
                    corpus,
                    vocabulary,
                    num_topics,
                    self.passes,
                    self.seed,
                )
                .and_then(|model| {
                    let score = coherence::evaluate(&model, corpus, vocabulary, self.top_n)?;
                    Ok((model, score))
                });
                match outcome {
                    Ok((model, score)) => CandidateResult::Scored {
                        score: CandidateScore {
                            num_topics,
                            coherence: score,
                        },
                        model,
                    },
                    Err(err) => CandidateResult::Failed(CandidateFailure {
                        num_topics,
                        reason: err.to_string(),
                    }),
                }
            })
            .collect();

        let mut scores = Vec::new();
        let mut failures = Vec::new();
        let mut best: Option<(CandidateScore, LdaModel)> = None;
        for result in results {
            match result {
                CandidateResult::Scored { score, model } => {
                    let replace = match &best {
                        None => true,
                        Some((incumbent, _)) => prefer(&score, incumbent),
                    };
                    if replace {
                        best = Some((score, model));
                    }
                    scores.push(score);
                }
                CandidateResult::Failed(failure) => failures.push(failure),
                CandidateResult::Skipped => {}
            }
        }

        Ok(SweepOutcome {
            best: best.map(|(score, model)| (score.num_topics, model)),
            scores,
            failures,
            cancelled: cancel.is_cancelled(),
        })
    }
}

enum CandidateResult {
    Scored {
        score: CandidateScore,
        model: LdaModel,
    },
    Failed(CandidateFailure),
    Skipped,
}

/// True when `challenger` should replace `incumbent`: strictly higher
/// coherence, or an exact tie with a smaller topic count.
fn prefer(challenger: &CandidateScore, incumbent: &CandidateScore) -> bool {
    match challenger.coherence.partial_cmp(&incumbent.coherence) {
        Some(std::cmp::Ordering::Greater) => true,
        Some(std::cmp::Ordering::Equal) => challenger.num_topics < incumbent.num_topics,
        _ => false,
    }
}

/// Argmax over coherence with the smaller-count tie-break.
pub fn best_candidate(scores: &[CandidateScore]) -> Option<&CandidateScore> {
    scores.iter().reduce(|incumbent, challenger| {
        if prefer(challenger, incumbent) {
            challenger
        } else {
            incumbent
        }
    })
}
