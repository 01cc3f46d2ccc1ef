//! Topic discovery over a corpus of product reviews.
//!
//! The pipeline runs offline and in stages: raw review text is normalized
//! into tokens, a frozen vocabulary and bag-of-words corpus are built, an LDA
//! model is trained per candidate topic count, each model is scored by NPMI
//! coherence against the corpus, and the argmax-coherence model is selected
//! and exported (labeled rows, score report, serialized artifact) for
//! downstream visualization and summarization.
//!
//! ```no_run
//! use review_topics::corpus::build_corpus;
//! use review_topics::normalize::Normalizer;
//! use review_topics::selection::ModelSelector;
//!
//! let normalizer = Normalizer::new();
//! let docs: Vec<Vec<String>> = ["great crisp screen", "battery died fast"]
//!     .into_iter()
//!     .map(|text| normalizer.normalize(Some(text)))
//!     .collect();
//! let (vocabulary, corpus) = build_corpus(&docs);
//!
//! let outcome = ModelSelector::new(vec![2, 3, 4])
//!     .with_passes(5)
//!     .with_seed(42)
//!     .select(&corpus, &vocabulary)?;
//! # Ok::<(), review_topics::TopicsError>(())
//! ```

pub mod coherence;
pub mod corpus;
pub mod dataset;
pub mod error;
pub mod normalize;
pub mod persistence;
pub mod selection;
pub mod topic_modeling;

pub use error::{Result, TopicsError};
