use std::collections::BTreeMap;

use crate::models::{AttemptRecord, DailySample};

/// Collapses attempts into one sample per calendar day, oldest first.
///
/// The earliest attempt of each day is kept even when a later one that day
/// scored better. Attempts sharing a timestamp keep their input order.
pub fn aggregate_daily(attempts: &[AttemptRecord]) -> Vec<DailySample> {
    let mut ordered: Vec<&AttemptRecord> = attempts.iter().collect();
    ordered.sort_by_key(|attempt| attempt.completed_at);

    let mut days: BTreeMap<chrono::NaiveDate, DailySample> = BTreeMap::new();
    for attempt in ordered {
        let day = attempt.completed_at.date();
        days.entry(day).or_insert_with(|| DailySample {
            day,
            timestamp: attempt.completed_at,
            fluency_rate: attempt.fluency_rate(),
            error_rate: attempt.error_rate(),
            total_time_minutes: attempt.effective_minutes(),
        });
    }

    let mut samples: Vec<DailySample> = days.into_values().collect();
    samples.sort_by_key(|sample| sample.timestamp);
    samples
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use uuid::Uuid;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, day)
            .and_then(|d| d.and_hms_opt(hour, 0, 0))
            .unwrap()
    }

    fn attempt(completed_at: NaiveDateTime, correct: i32, total: i32) -> AttemptRecord {
        AttemptRecord {
            quiz_id: Uuid::nil(),
            quiz_title: "Sight words".to_string(),
            completed_at,
            total_questions: total,
            correct_answers: correct,
            total_time_minutes: 1.0,
        }
    }

    #[test]
    fn empty_input_yields_no_samples() {
        assert!(aggregate_daily(&[]).is_empty());
    }

    #[test]
    fn first_attempt_of_day_wins_over_better_later_attempt() {
        let attempts = vec![
            attempt(at(2, 15), 30, 30),
            attempt(at(2, 9), 10, 20),
            attempt(at(3, 9), 12, 20),
        ];
        let samples = aggregate_daily(&attempts);

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].timestamp, at(2, 9));
        assert_eq!(samples[0].fluency_rate, 10.0);
        assert_eq!(samples[0].error_rate, 10.0);
        assert_eq!(samples[1].fluency_rate, 12.0);
    }

    #[test]
    fn output_is_sorted_and_bounded_by_distinct_days() {
        let attempts = vec![
            attempt(at(9, 8), 5, 10),
            attempt(at(4, 8), 6, 10),
            attempt(at(4, 20), 7, 10),
            attempt(at(6, 8), 8, 10),
        ];
        let samples = aggregate_daily(&attempts);

        assert_eq!(samples.len(), 3);
        assert!(samples.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(
            samples.iter().map(|s| s.day.to_string()).collect::<Vec<_>>(),
            vec!["2026-03-04", "2026-03-06", "2026-03-09"]
        );
    }

    #[test]
    fn identical_timestamps_keep_input_order() {
        let attempts = vec![attempt(at(5, 10), 4, 10), attempt(at(5, 10), 9, 10)];
        let samples = aggregate_daily(&attempts);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].fluency_rate, 4.0);
    }
}
