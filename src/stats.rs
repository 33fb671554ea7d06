use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{AttemptRecord, ProjectionPoint, QuizSummary, SummaryStats};

/// Weekly growth the ideal line assumes.
pub const IDEAL_WEEKLY_GROWTH: f64 = 1.4;

pub const DEFAULT_MOVING_AVERAGE_WINDOW: usize = 5;

pub fn ideal_projection(last_fluency: f64, days_elapsed: f64) -> f64 {
    last_fluency * IDEAL_WEEKLY_GROWTH.powf(days_elapsed / 7.0)
}

/// Mean of the first `window` values, which callers pass newest first.
pub fn moving_average(values: &[f64], window: usize) -> Option<f64> {
    let take = window.min(values.len());
    if take == 0 {
        return None;
    }
    Some(values[..take].iter().sum::<f64>() / take as f64)
}

/// Summary over every attempt, including repeat attempts on the same day.
pub fn summarize(attempts: &[AttemptRecord], window: usize) -> Option<SummaryStats> {
    let mut newest_first: Vec<&AttemptRecord> = attempts.iter().collect();
    newest_first.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

    let newest = *newest_first.first()?;
    let oldest = *newest_first.last()?;

    let accuracies: Vec<f64> = newest_first
        .iter()
        .map(|attempt| attempt.accuracy_percentage())
        .collect();
    let moving_average_accuracy = moving_average(&accuracies, window.max(1))?;
    let best_accuracy = accuracies.iter().copied().fold(f64::MIN, f64::max);
    let best_fluency = newest_first
        .iter()
        .map(|attempt| attempt.fluency_rate())
        .fold(f64::MIN, f64::max);

    let latest_fluency = newest.fluency_rate();
    let horizon = newest_first.len() as u32;
    let ideal_projection = (0..=horizon)
        .map(|day_offset| ProjectionPoint {
            day_offset,
            fluency_rate: ideal_projection(latest_fluency, day_offset as f64),
        })
        .collect();

    Some(SummaryStats {
        attempt_count: newest_first.len(),
        moving_average_accuracy,
        best_accuracy,
        best_fluency,
        latest_fluency,
        accuracy_improvement: newest.accuracy_percentage() - oldest.accuracy_percentage(),
        ideal_projection,
    })
}

pub fn summarize_by_quiz(attempts: &[AttemptRecord]) -> Vec<QuizSummary> {
    let mut map: HashMap<Uuid, (String, usize, f64, f64)> = HashMap::new();

    for attempt in attempts {
        let entry = map
            .entry(attempt.quiz_id)
            .or_insert_with(|| (attempt.quiz_title.clone(), 0, 0.0, 0.0));
        entry.1 += 1;
        entry.2 += attempt.accuracy_percentage();
        entry.3 += attempt.fluency_rate();
    }

    let mut summaries: Vec<QuizSummary> = map
        .into_iter()
        .map(
            |(quiz_id, (quiz_title, count, accuracy_total, fluency_total))| QuizSummary {
                quiz_id,
                quiz_title,
                attempt_count: count,
                avg_accuracy: accuracy_total / count as f64,
                avg_fluency: fluency_total / count as f64,
            },
        )
        .collect();

    summaries.sort_by(|a, b| {
        b.attempt_count
            .cmp(&a.attempt_count)
            .then_with(|| a.quiz_title.cmp(&b.quiz_title))
    });
    summaries
}
