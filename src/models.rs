use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One completed or timed-out practice session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub quiz_id: Uuid,
    pub quiz_title: String,
    /// Local wall-clock time the session ended.
    pub completed_at: NaiveDateTime,
    pub total_questions: i32,
    pub correct_answers: i32,
    pub total_time_minutes: f64,
}

impl AttemptRecord {
    pub fn accuracy_percentage(&self) -> f64 {
        if self.total_questions <= 0 {
            return 0.0;
        }
        100.0 * self.correct_answers.max(0) as f64 / self.total_questions as f64
    }

    /// Session length used as the rate denominator. Zero or negative durations
    /// count as one minute.
    pub fn effective_minutes(&self) -> f64 {
        if self.total_time_minutes > 0.0 {
            self.total_time_minutes
        } else {
            1.0
        }
    }

    pub fn incorrect_answers(&self) -> i32 {
        (self.total_questions - self.correct_answers).max(0)
    }

    /// Correct responses per minute.
    pub fn fluency_rate(&self) -> f64 {
        self.correct_answers.max(0) as f64 / self.effective_minutes()
    }

    /// Incorrect responses per minute.
    pub fn error_rate(&self) -> f64 {
        self.incorrect_answers() as f64 / self.effective_minutes()
    }
}

/// The representative attempt for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySample {
    pub day: NaiveDate,
    pub timestamp: NaiveDateTime,
    pub fluency_rate: f64,
    pub error_rate: f64,
    pub total_time_minutes: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Correct,
    Error,
}

impl Metric {
    pub fn rate(self, sample: &DailySample) -> f64 {
        match self {
            Metric::Correct => sample.fluency_rate,
            Metric::Error => sample.error_rate,
        }
    }
}

/// Log-linear trend of a rate against weeks since the first sample of the
/// fitted series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CelerationResult {
    /// log10(rate) per week.
    pub slope: f64,
    /// log10(rate) at week zero.
    pub intercept: f64,
    pub sample_count: usize,
}

impl CelerationResult {
    /// Multiplicative change per week, e.g. 1.4 for "x1.4 per week".
    pub fn factor_per_week(&self) -> f64 {
        10f64.powf(self.slope)
    }

    /// Rate on the fitted line `weeks` after the series start.
    pub fn rate_at(&self, weeks: f64) -> f64 {
        10f64.powf(self.intercept + self.slope * weeks)
    }
}

/// Celeration before and after a pivot date. Without a pivot the whole series
/// is `post` and `pre` is always `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseCeleration {
    pub pre: Option<CelerationResult>,
    pub post: Option<CelerationResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternLabel {
    StrongJaws,
    GoodJaws,
    MarginalJaws,
    BothRising,
    BothFalling,
    Opposition,
}

impl PatternLabel {
    pub fn description(self) -> &'static str {
        match self {
            PatternLabel::StrongJaws => {
                "Strong accelerating corrects / decelerating errors (excellent)"
            }
            PatternLabel::GoodJaws => "Accelerating corrects / decelerating errors (good)",
            PatternLabel::MarginalJaws => "Marginal accelerating corrects / decelerating errors",
            PatternLabel::BothRising => "Corrects and errors both rising (watch errors)",
            PatternLabel::BothFalling => "Corrects and errors both falling (stall or dive)",
            PatternLabel::Opposition => "Corrects falling while errors rise (trouble)",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub day_offset: u32,
    pub fluency_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryStats {
    pub attempt_count: usize,
    pub moving_average_accuracy: f64,
    pub best_accuracy: f64,
    pub best_fluency: f64,
    pub latest_fluency: f64,
    pub accuracy_improvement: f64,
    pub ideal_projection: Vec<ProjectionPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizSummary {
    pub quiz_id: Uuid,
    pub quiz_title: String,
    pub attempt_count: usize,
    pub avg_accuracy: f64,
    pub avg_fluency: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(total: i32, correct: i32, minutes: f64) -> AttemptRecord {
        AttemptRecord {
            quiz_id: Uuid::nil(),
            quiz_title: "Multiplication facts".to_string(),
            completed_at: NaiveDate::from_ymd_opt(2026, 3, 2)
                .and_then(|d| d.and_hms_opt(9, 0, 0))
                .unwrap(),
            total_questions: total,
            correct_answers: correct,
            total_time_minutes: minutes,
        }
    }

    #[test]
    fn rates_are_per_minute() {
        let record = attempt(40, 30, 2.0);
        assert_eq!(record.fluency_rate(), 15.0);
        assert_eq!(record.error_rate(), 5.0);
        assert_eq!(record.accuracy_percentage(), 75.0);
    }

    #[test]
    fn zero_duration_counts_as_one_minute() {
        let record = attempt(10, 8, 0.0);
        assert_eq!(record.effective_minutes(), 1.0);
        assert_eq!(record.fluency_rate(), 8.0);
        assert_eq!(record.error_rate(), 2.0);
    }

    #[test]
    fn empty_quiz_has_zero_accuracy() {
        assert_eq!(attempt(0, 0, 1.0).accuracy_percentage(), 0.0);
    }

    #[test]
    fn factor_per_week_is_power_of_ten() {
        let result = CelerationResult {
            slope: 2f64.log10(),
            intercept: 1.0,
            sample_count: 3,
        };
        assert!((result.factor_per_week() - 2.0).abs() < 1e-12);
        assert!((result.rate_at(1.0) - 20.0).abs() < 1e-9);
    }
}
