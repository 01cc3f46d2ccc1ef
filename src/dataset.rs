use std::path::Path;

use csv::{ReaderBuilder, StringRecord, WriterBuilder};

use crate::error::{Result, TopicsError};
use crate::selection::CandidateScore;

/// Sentinel written to the `topic` column for documents with no assignable
/// topic (empty bag-of-words).
pub const NO_TOPIC: i64 = -1;

/// A loaded review table: the text column is extracted for the pipeline, all
/// other columns are opaque pass-through data.
#[derive(Debug, Clone)]
pub struct ReviewTable {
    headers: StringRecord,
    records: Vec<StringRecord>,
    text_idx: usize,
}

impl ReviewTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    /// Review text per row, `None` where the field is missing.
    pub fn texts(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.records
            .iter()
            .map(move |record| record.get(self.text_idx))
    }
}

/// Reads a review CSV, locating the text-bearing column by header name.
///
/// Ragged rows are tolerated; a row without the text field simply yields no
/// text (and later an empty document). A missing header or text column is an
/// input error.
pub fn load_reviews(path: &Path, text_column: &str) -> Result<ReviewTable> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let text_idx = headers
        .iter()
        .position(|header| header == text_column)
        .ok_or_else(|| {
            TopicsError::InvalidInput(format!(
                "column `{text_column}` not found in {}",
                path.display()
            ))
        })?;

    let mut records = Vec::new();
    for record in reader.into_records() {
        records.push(record?);
    }

    Ok(ReviewTable {
        headers,
        records,
        text_idx,
    })
}

/// Writes the input rows back out with an appended integer `topic` column.
pub fn write_labeled(
    path: &Path,
    table: &ReviewTable,
    assignments: &[Option<usize>],
) -> Result<()> {
    if assignments.len() != table.len() {
        return Err(TopicsError::InvalidInput(format!(
            "{} assignments for {} rows",
            assignments.len(),
            table.len()
        )));
    }

    let mut writer = WriterBuilder::new().flexible(true).from_path(path)?;

    let mut header_row: Vec<String> = table.headers.iter().map(|h| h.to_string()).collect();
    header_row.push("topic".to_string());
    writer.write_record(&header_row)?;

    for (record, assignment) in table.records.iter().zip(assignments) {
        let topic = assignment.map_or(NO_TOPIC, |t| t as i64);
        let mut row: Vec<String> = record.iter().map(|f| f.to_string()).collect();
        row.push(topic.to_string());
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// Writes the per-candidate `num_topics,coherence` report in sweep order.
pub fn write_score_report(path: &Path, scores: &[CandidateScore]) -> Result<()> {
    let mut writer = WriterBuilder::new().from_path(path)?;
    writer.write_record(["num_topics", "coherence"])?;
    for score in scores {
        writer.write_record([
            score.num_topics.to_string(),
            format!("{:.6}", score.coherence),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn loads_text_column_and_tolerates_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.csv");
        fs::write(
            &path,
            "id,review,stars\n1,great screen,5\n2\n3,battery died fast,1\n",
        )
        .unwrap();

        let table = load_reviews(&path, "review").unwrap();
        assert_eq!(table.len(), 3);

        let texts: Vec<Option<&str>> = table.texts().collect();
        assert_eq!(texts[0], Some("great screen"));
        assert_eq!(texts[1], None);
        assert_eq!(texts[2], Some("battery died fast"));
    }

    #[test]
    fn missing_text_column_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.csv");
        fs::write(&path, "id,body\n1,fine\n").unwrap();

        let err = load_reviews(&path, "review").unwrap_err();
        assert!(matches!(err, TopicsError::InvalidInput(_)));
    }

    #[test]
    fn labeled_export_appends_topic_column_with_sentinel() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("reviews.csv");
        fs::write(&input, "id,review\n1,great screen\n2,\n").unwrap();

        let table = load_reviews(&input, "review").unwrap();
        let output = dir.path().join("labeled.csv");
        write_labeled(&output, &table, &[Some(2), None]).unwrap();

        let written = fs::read_to_string(&output).unwrap();
        let mut lines = written.lines();
        assert_eq!(lines.next(), Some("id,review,topic"));
        assert_eq!(lines.next(), Some("1,great screen,2"));
        assert_eq!(lines.next(), Some("2,,-1"));
    }

    #[test]
    fn labeled_export_rejects_misaligned_assignments() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("reviews.csv");
        fs::write(&input, "review\nfine\n").unwrap();

        let table = load_reviews(&input, "review").unwrap();
        let output = dir.path().join("labeled.csv");
        let err = write_labeled(&output, &table, &[Some(0), Some(1)]).unwrap_err();
        assert!(matches!(err, TopicsError::InvalidInput(_)));
    }

    #[test]
    fn score_report_lists_candidates_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores.csv");
        write_score_report(
            &path,
            &[
                CandidateScore {
                    num_topics: 2,
                    coherence: 0.25,
                },
                CandidateScore {
                    num_topics: 3,
                    coherence: 0.5,
                },
            ],
        )
        .unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(
            written.lines().collect::<Vec<_>>(),
            vec!["num_topics,coherence", "2,0.250000", "3,0.500000"]
        );
    }
}
