//! Coaching recommendations from a daily sample series.
//!
//! Every rule is evaluated independently and all that apply contribute a tip,
//! in the order they are defined here. The order is not a severity ranking.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::celeration::{least_squares, log_rate, RATE_FLOOR};
use crate::models::{CelerationResult, DailySample, PatternLabel};
use crate::pattern::classify;

pub const DEFAULT_AIM_FLUENCY: f64 = 25.0;
pub const DEFAULT_AIM_ERROR: f64 = 1.0;

/// Fewer daily samples than this only produce [`Tip::InsufficientData`].
pub const MIN_ADVICE_SAMPLES: usize = 3;

const LONG_SESSION_MINUTES: f64 = 1.0;
const LOW_FLUENCY_SHARE_OF_AIM: f64 = 0.7;
const AIM_RAISE_STEP: f64 = 10.0;
const PLATEAU_WINDOW: usize = 7;
const PLATEAU_FLAT_SLOPE: f64 = 0.02;
const PLATEAU_PRIOR_SLOPE: f64 = 0.05;
const FLAT_SPREAD_RATIO: f64 = 1.10;
const HIGH_BOUNCE_CV: f64 = 0.5;
const MODERATE_BOUNCE_CV: f64 = 0.3;
const SLOW_CORRECT_FACTOR: f64 = 1.25;
const RISING_ERROR_FACTOR: f64 = 1.10;
const RUSHING_FACTOR: f64 = 1.5;
const RETENTION_LOOKBACK: usize = 7;
const RETENTION_KEEP_RATIO: f64 = 0.8;
const LOW_FLUENCY: f64 = 10.0;
const PERSISTENT_ERROR_RATE: f64 = 2.0;
const STALLED_CORRECT_FACTOR: f64 = 1.1;
const OUTPACING_ERROR_FACTOR: f64 = 1.2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdviceAims {
    pub aim_fluency: f64,
    pub aim_error: f64,
}

impl Default for AdviceAims {
    fn default() -> Self {
        Self {
            aim_fluency: DEFAULT_AIM_FLUENCY,
            aim_error: DEFAULT_AIM_ERROR,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Tip {
    InsufficientData { days: usize },
    ShortenSessions { avg_minutes: f64 },
    AdvanceMaterial {
        days_at_aim: usize,
        window_days: usize,
        next_aim: f64,
    },
    Plateau,
    AtAim,
    FlatRecent,
    HighBounce { cv: f64 },
    ModerateBounce { cv: f64 },
    InstructionalChange { correct_factor: f64 },
    CorrectiveFeedback { error_factor: f64 },
    TightenPrompting { error_rate: f64, aim_error: f64 },
    Crossover { fluency: f64, error_rate: f64 },
    Rushing,
    RetentionDrop { drop_percent: f64 },
    UntimedDrill,
    PersistentErrors,
    ErrorsOutpacingCorrects,
    MaintainCourse,
}

impl fmt::Display for Tip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tip::InsufficientData { days } => write!(
                f,
                "Not enough data yet: {days} practice day(s) recorded, at least {MIN_ADVICE_SAMPLES} are needed for recommendations."
            ),
            Tip::ShortenSessions { avg_minutes } => write!(
                f,
                "Sessions average {avg_minutes:.1} minutes while fluency is well below aim. Try shorter timings and build endurance gradually."
            ),
            Tip::AdvanceMaterial {
                days_at_aim,
                window_days,
                next_aim,
            } => write!(
                f,
                "At or above aim on {days_at_aim} of the last {window_days} days. Advance to new material or raise the aim to {next_aim:.0} per minute."
            ),
            Tip::Plateau => write!(
                f,
                "Progress has flattened after a period of growth. Slice back to an easier set for about 3 days to rebuild momentum."
            ),
            Tip::AtAim => write!(
                f,
                "Aim reached on recent days with few errors. Great work, consider raising the aim."
            ),
            Tip::FlatRecent => write!(
                f,
                "The last 3 sessions are nearly identical. Change something: a finer skill slice, a different timing length, or denser reinforcement."
            ),
            Tip::HighBounce { cv } => write!(
                f,
                "Performance is bouncing a lot (variation {:.0}%). Standardize timing conditions: same time of day, same setting, same materials.",
                cv * 100.0
            ),
            Tip::ModerateBounce { cv } => write!(
                f,
                "Moderate bounce between sessions (variation {:.0}%). Keep practice conditions consistent.",
                cv * 100.0
            ),
            Tip::InstructionalChange { correct_factor } => write!(
                f,
                "Corrects are growing slowly (x{correct_factor:.2} per week). Adjust instruction: shorter sets and more practice opportunities."
            ),
            Tip::CorrectiveFeedback { error_factor } => write!(
                f,
                "Errors are rising (x{error_factor:.2} per week). Add immediate corrective feedback after each timing."
            ),
            Tip::TightenPrompting { error_rate, aim_error } => write!(
                f,
                "Latest error rate {error_rate:.1} per minute is above the aim of {aim_error:.1}. Tighten prompting and modeling."
            ),
            Tip::Crossover { fluency, error_rate } => write!(
                f,
                "CRITICAL: errors ({error_rate:.1}/min) exceed corrects ({fluency:.1}/min). Stop and reteach; the learner is likely guessing."
            ),
            Tip::Rushing => write!(
                f,
                "Corrects and errors are both climbing fast. The learner may be rushing or ignoring accuracy; slow down and check each answer."
            ),
            Tip::RetentionDrop { drop_percent } => write!(
                f,
                "Fluency dropped {drop_percent:.0}% compared with a week of sessions ago. Check retention and review earlier material."
            ),
            Tip::UntimedDrill => write!(
                f,
                "Low fluency with slow growth. Add untimed drill practice before returning to timings."
            ),
            Tip::PersistentErrors => write!(
                f,
                "Errors stay above 2 per minute. Practice the missed items in isolation or switch to errorless teaching."
            ),
            Tip::ErrorsOutpacingCorrects => write!(
                f,
                "Errors are growing faster than corrects. Shorten the timing or clarify confusable items."
            ),
            Tip::MaintainCourse => write!(
                f,
                "Progress looks steady. Maintain the current course."
            ),
        }
    }
}

impl Serialize for Tip {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Advice {
    pub label: Option<PatternLabel>,
    pub tips: Vec<Tip>,
}

fn last_n(samples: &[DailySample], n: usize) -> &[DailySample] {
    &samples[samples.len().saturating_sub(n)..]
}

fn index_slope(window: &[DailySample]) -> Option<f64> {
    let points: Vec<(f64, f64)> = window
        .iter()
        .enumerate()
        .map(|(i, sample)| (i as f64, log_rate(sample.fluency_rate)))
        .collect();
    least_squares(&points).map(|(slope, _)| slope)
}

/// Population coefficient of variation of fluency.
fn coefficient_of_variation(window: &[DailySample]) -> Option<f64> {
    if window.is_empty() {
        return None;
    }
    let n = window.len() as f64;
    let mean = window.iter().map(|s| s.fluency_rate).sum::<f64>() / n;
    if mean <= 0.0 {
        return None;
    }
    let variance = window
        .iter()
        .map(|s| (s.fluency_rate - mean).powi(2))
        .sum::<f64>()
        / n;
    Some(variance.sqrt() / mean)
}

pub fn advise(
    samples: &[DailySample],
    correct: Option<&CelerationResult>,
    error: Option<&CelerationResult>,
    aims: &AdviceAims,
) -> Advice {
    if samples.len() < MIN_ADVICE_SAMPLES {
        return Advice {
            label: None,
            tips: vec![Tip::InsufficientData {
                days: samples.len(),
            }],
        };
    }

    let correct_factor = correct.map(CelerationResult::factor_per_week);
    let error_factor = error.map(CelerationResult::factor_per_week);
    let label = correct_factor
        .zip(error_factor)
        .and_then(|(c, e)| classify(c, e));

    let mut tips = Vec::new();
    let Some(latest) = samples.last() else {
        return Advice { label, tips };
    };

    let recent5 = last_n(samples, 5);
    let avg_minutes =
        recent5.iter().map(|s| s.total_time_minutes).sum::<f64>() / recent5.len() as f64;
    if avg_minutes > LONG_SESSION_MINUTES
        && latest.fluency_rate < LOW_FLUENCY_SHARE_OF_AIM * aims.aim_fluency
    {
        tips.push(Tip::ShortenSessions { avg_minutes });
    }

    let aim_window = last_n(samples, PLATEAU_WINDOW);
    let days_at_aim = aim_window
        .iter()
        .filter(|s| s.fluency_rate >= aims.aim_fluency)
        .count();
    if days_at_aim >= 5 {
        tips.push(Tip::AdvanceMaterial {
            days_at_aim,
            window_days: aim_window.len(),
            next_aim: aims.aim_fluency + AIM_RAISE_STEP,
        });
    }

    if samples.len() >= 2 * PLATEAU_WINDOW {
        let last14 = last_n(samples, 2 * PLATEAU_WINDOW);
        let (prior7, recent7) = last14.split_at(PLATEAU_WINDOW);
        if let (Some(recent_slope), Some(prior_slope)) = (index_slope(recent7), index_slope(prior7))
        {
            if recent_slope.abs() < PLATEAU_FLAT_SLOPE && prior_slope.abs() > PLATEAU_PRIOR_SLOPE {
                tips.push(Tip::Plateau);
            }
        }
    }

    let recent3 = last_n(samples, 3);
    let days_meeting_both_aims = recent3
        .iter()
        .filter(|s| s.fluency_rate >= aims.aim_fluency && s.error_rate <= aims.aim_error)
        .count();
    if days_meeting_both_aims >= 2 {
        tips.push(Tip::AtAim);
    }

    let floored: Vec<f64> = recent3.iter().map(|s| s.fluency_rate.max(RATE_FLOOR)).collect();
    let max = floored.iter().copied().fold(f64::MIN, f64::max);
    let min = floored.iter().copied().fold(f64::MAX, f64::min);
    if max / min < FLAT_SPREAD_RATIO {
        tips.push(Tip::FlatRecent);
    }

    if let Some(cv) = coefficient_of_variation(recent5) {
        if cv > HIGH_BOUNCE_CV {
            tips.push(Tip::HighBounce { cv });
        } else if cv > MODERATE_BOUNCE_CV {
            tips.push(Tip::ModerateBounce { cv });
        }
    }

    if let Some(correct_factor) = correct_factor {
        if correct_factor < SLOW_CORRECT_FACTOR {
            tips.push(Tip::InstructionalChange { correct_factor });
        }
    }

    if let Some(error_factor) = error_factor {
        if error_factor > RISING_ERROR_FACTOR {
            tips.push(Tip::CorrectiveFeedback { error_factor });
        }
    }

    if latest.error_rate > aims.aim_error {
        tips.push(Tip::TightenPrompting {
            error_rate: latest.error_rate,
            aim_error: aims.aim_error,
        });
    }

    if latest.fluency_rate < latest.error_rate {
        tips.push(Tip::Crossover {
            fluency: latest.fluency_rate,
            error_rate: latest.error_rate,
        });
    }

    if let (Some(c), Some(e)) = (correct_factor, error_factor) {
        if c > RUSHING_FACTOR && e > RUSHING_FACTOR {
            tips.push(Tip::Rushing);
        }
    }

    if samples.len() > RETENTION_LOOKBACK {
        let baseline = &samples[samples.len() - 1 - RETENTION_LOOKBACK];
        if latest.fluency_rate < RETENTION_KEEP_RATIO * baseline.fluency_rate {
            tips.push(Tip::RetentionDrop {
                drop_percent: 100.0 * (1.0 - latest.fluency_rate / baseline.fluency_rate),
            });
        }
    }

    if let Some(c) = correct_factor {
        if latest.fluency_rate < LOW_FLUENCY && c < SLOW_CORRECT_FACTOR {
            tips.push(Tip::UntimedDrill);
        }
    }

    if recent3
        .iter()
        .all(|s| s.error_rate > PERSISTENT_ERROR_RATE)
    {
        tips.push(Tip::PersistentErrors);
    }

    if let (Some(c), Some(e)) = (correct_factor, error_factor) {
        if c < STALLED_CORRECT_FACTOR && e > OUTPACING_ERROR_FACTOR {
            tips.push(Tip::ErrorsOutpacingCorrects);
        }
    }

    if tips.is_empty() {
        tips.push(Tip::MaintainCourse);
    }

    Advice { label, tips }
}
