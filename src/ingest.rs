use std::io::Read;

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::error::{Error, Result};

/// One attempt as it appears in an import file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImportRow {
    pub learner_email: String,
    pub learner_name: String,
    pub quiz_title: String,
    pub completed_at: NaiveDateTime,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub total_time_minutes: f64,
    pub source_key: Option<String>,
}

impl ImportRow {
    fn validate(&self, row: usize) -> Result<()> {
        let reason = if self.total_questions < 0 || self.correct_answers < 0 {
            "question counts must not be negative"
        } else if self.correct_answers > self.total_questions {
            "correct_answers exceeds total_questions"
        } else if !self.total_time_minutes.is_finite() {
            "total_time_minutes must be a number"
        } else {
            return Ok(());
        };
        Err(Error::InvalidRecord {
            row,
            reason: reason.to_string(),
        })
    }
}

/// Parses and validates attempt rows. Rows are numbered from 1, excluding the
/// header. Non-positive durations are accepted and later count as one minute.
pub fn read_attempts_csv<R: Read>(reader: R) -> Result<Vec<ImportRow>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();

    for (index, result) in reader.deserialize::<ImportRow>().enumerate() {
        let row: ImportRow = result?;
        row.validate(index + 1)?;
        if row.total_time_minutes <= 0.0 {
            tracing::warn!(
                row = index + 1,
                minutes = row.total_time_minutes,
                "non-positive session duration will be treated as one minute"
            );
        }
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "learner_email,learner_name,quiz_title,completed_at,total_questions,correct_answers,total_time_minutes,source_key\n";

    #[test]
    fn parses_rows_with_optional_source_key() {
        let data = format!(
            "{HEADER}ada@example.com,Ada Park,Times tables,2026-03-02T09:15:00,40,36,1.0,ada-1\n\
             ada@example.com,Ada Park,Times tables,2026-03-03T09:10:00,42,40,1.0,\n"
        );
        let rows = read_attempts_csv(data.as_bytes()).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].source_key.as_deref(), Some("ada-1"));
        assert_eq!(rows[1].source_key, None);
        assert_eq!(rows[1].correct_answers, 40);
    }

    #[test]
    fn rejects_more_correct_than_total() {
        let data = format!(
            "{HEADER}ada@example.com,Ada Park,Times tables,2026-03-02T09:15:00,10,12,1.0,\n"
        );
        let err = read_attempts_csv(data.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::InvalidRecord { row: 1, .. }));
    }

    #[test]
    fn zero_duration_is_accepted() {
        let data = format!(
            "{HEADER}ada@example.com,Ada Park,Times tables,2026-03-02T09:15:00,10,8,0,\n"
        );
        let rows = read_attempts_csv(data.as_bytes()).unwrap();
        assert_eq!(rows[0].total_time_minutes, 0.0);
    }

    #[test]
    fn malformed_timestamp_is_a_csv_error() {
        let data = format!("{HEADER}ada@example.com,Ada Park,Times tables,yesterday,10,8,1,\n");
        let err = read_attempts_csv(data.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::Csv(_)));
    }
}
