use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::corpus::Vocabulary;
use crate::error::Result;
use crate::topic_modeling::LdaModel;

/// Serialized form of a trained model, for reuse by downstream visualization
/// and summarization consumers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub created_at: DateTime<Utc>,
    pub num_topics: usize,
    pub alpha: f64,
    pub beta: f64,
    pub seed: u64,
    pub passes: usize,
    /// Coherence of the model at export time, when it was evaluated.
    pub coherence: Option<f64>,
    /// Vocabulary tokens in id order.
    pub vocabulary: Vec<String>,
    /// K x V topic-word distribution.
    pub topic_word: Vec<Vec<f64>>,
}

impl ModelArtifact {
    pub fn from_model(
        model: &LdaModel,
        vocabulary: &Vocabulary,
        passes: usize,
        coherence: Option<f64>,
    ) -> Result<Self> {
        Ok(ModelArtifact {
            created_at: Utc::now(),
            num_topics: model.num_topics(),
            alpha: model.alpha(),
            beta: model.beta(),
            seed: model.seed(),
            passes,
            coherence,
            vocabulary: vocabulary.tokens().to_vec(),
            topic_word: model.topic_word()?.to_vec(),
        })
    }

    /// Reconstructs the vocabulary the artifact was exported with.
    pub fn to_vocabulary(&self) -> Vocabulary {
        Vocabulary::from_tokens(self.vocabulary.clone())
    }
}

/// Writes the artifact as JSON, atomically (temp file + rename).
pub fn save_artifact(artifact: &ModelArtifact, path: &Path) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    let mut writer = BufWriter::new(&temp);
    serde_json::to_writer(&mut writer, artifact)?;
    writer.flush()?;
    drop(writer);
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub fn load_artifact(path: &Path) -> Result<ModelArtifact> {
    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::build_corpus;
    use crate::error::TopicsError;
    use crate::topic_modeling::train;

    fn docs(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|w| w.to_string()).collect())
            .collect()
    }

    #[test]
    fn artifact_round_trips_through_json() {
        let (vocabulary, corpus) = build_corpus(&docs(&[
            &["screen", "bright", "screen"],
            &["battery", "charge", "battery"],
        ]));
        let model = train(&corpus, &vocabulary, 2, 5, 42).unwrap();
        let artifact = ModelArtifact::from_model(&model, &vocabulary, 5, Some(0.5)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("lda_model.json");
        save_artifact(&artifact, &path).unwrap();
        let loaded = load_artifact(&path).unwrap();

        assert_eq!(loaded.num_topics, 2);
        assert_eq!(loaded.seed, 42);
        assert_eq!(loaded.passes, 5);
        assert_eq!(loaded.coherence, Some(0.5));
        assert_eq!(loaded.vocabulary, vocabulary.tokens());
        assert_eq!(loaded.topic_word, model.topic_word().unwrap());

        let rebuilt = loaded.to_vocabulary();
        for (id, token) in vocabulary.tokens().iter().enumerate() {
            assert_eq!(rebuilt.id(token), Some(id));
        }
    }

    #[test]
    fn untrained_model_cannot_be_exported() {
        let (vocabulary, _) = build_corpus(&docs(&[&["screen"]]));
        let model = crate::topic_modeling::LdaModel::new(2);
        let err = ModelArtifact::from_model(&model, &vocabulary, 5, None).unwrap_err();
        assert!(matches!(err, TopicsError::ModelNotTrained));
    }
}
