use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::advice::{self, AdviceAims, Tip};
use crate::celeration;
use crate::daily::aggregate_daily;
use crate::error::{Error, Result};
use crate::models::{
    AttemptRecord, CelerationResult, DailySample, Metric, PatternLabel, PhaseCeleration,
    SummaryStats,
};
use crate::stats;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Restrict the analysis to one quiz.
    pub quiz_id: Option<Uuid>,
    /// Split celeration into before and after this date.
    pub pivot: Option<NaiveDate>,
    pub aim_fluency: f64,
    pub aim_error: f64,
    pub moving_average_window: usize,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            quiz_id: None,
            pivot: None,
            aim_fluency: advice::DEFAULT_AIM_FLUENCY,
            aim_error: advice::DEFAULT_AIM_ERROR,
            moving_average_window: stats::DEFAULT_MOVING_AVERAGE_WINDOW,
        }
    }
}

impl AnalysisOptions {
    pub fn validate(&self) -> Result<()> {
        if !(self.aim_fluency.is_finite() && self.aim_fluency > 0.0) {
            return Err(Error::InvalidOptions(format!(
                "aim_fluency must be positive, got {}",
                self.aim_fluency
            )));
        }
        if !(self.aim_error.is_finite() && self.aim_error >= 0.0) {
            return Err(Error::InvalidOptions(format!(
                "aim_error must not be negative, got {}",
                self.aim_error
            )));
        }
        if self.moving_average_window == 0 {
            return Err(Error::InvalidOptions(
                "moving_average_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn aims(&self) -> AdviceAims {
        AdviceAims {
            aim_fluency: self.aim_fluency,
            aim_error: self.aim_error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub daily: Vec<DailySample>,
    pub whole_correct: Option<CelerationResult>,
    pub whole_error: Option<CelerationResult>,
    pub correct: PhaseCeleration,
    pub error: PhaseCeleration,
    pub summary: Option<SummaryStats>,
    pub pattern: Option<PatternLabel>,
    pub tips: Vec<Tip>,
}

/// Runs the full pipeline over a snapshot of attempts.
///
/// Advice and the pattern label describe the post-pivot phase, or the whole
/// series when no pivot is given.
pub fn analyze(attempts: &[AttemptRecord], options: &AnalysisOptions) -> Analysis {
    let filtered: Vec<AttemptRecord> = match options.quiz_id {
        Some(quiz_id) => attempts
            .iter()
            .filter(|attempt| attempt.quiz_id == quiz_id)
            .cloned()
            .collect(),
        None => attempts.to_vec(),
    };

    let daily = aggregate_daily(&filtered);
    let whole_correct = celeration::fit(&daily, Metric::Correct);
    let whole_error = celeration::fit(&daily, Metric::Error);
    let correct = celeration::fit_phases(&daily, Metric::Correct, options.pivot);
    let error = celeration::fit_phases(&daily, Metric::Error, options.pivot);

    let (_, current_phase) = celeration::split_at_pivot(&daily, options.pivot);
    let advice = advice::advise(
        &current_phase,
        correct.post.as_ref(),
        error.post.as_ref(),
        &options.aims(),
    );

    tracing::debug!(
        attempts = filtered.len(),
        days = daily.len(),
        current_phase_days = current_phase.len(),
        pivot = ?options.pivot,
        tips = advice.tips.len(),
        "analysis complete"
    );

    Analysis {
        summary: stats::summarize(&filtered, options.moving_average_window),
        daily,
        whole_correct,
        whole_error,
        correct,
        error,
        pattern: advice.label,
        tips: advice.tips,
    }
}
