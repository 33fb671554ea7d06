use chrono::NaiveDate;

use crate::models::{CelerationResult, DailySample, Metric, PhaseCeleration};

pub const WEEK_SECONDS: f64 = 7.0 * 24.0 * 60.0 * 60.0;

/// Rates below this are clamped before taking log10.
pub const RATE_FLOOR: f64 = 0.1;

pub fn log_rate(rate: f64) -> f64 {
    rate.max(RATE_FLOOR).log10()
}

/// Ordinary least squares of log10(rate) against weeks since `samples[0]`.
///
/// Returns `None` for fewer than two samples, or when every sample sits on
/// the same timestamp.
pub fn fit(samples: &[DailySample], metric: Metric) -> Option<CelerationResult> {
    if samples.len() < 2 {
        return None;
    }

    let t0 = samples[0].timestamp;
    let points: Vec<(f64, f64)> = samples
        .iter()
        .map(|sample| {
            let elapsed = (sample.timestamp - t0).num_milliseconds() as f64 / 1000.0;
            (elapsed / WEEK_SECONDS, log_rate(metric.rate(sample)))
        })
        .collect();

    let (slope, intercept) = least_squares(&points)?;
    Some(CelerationResult {
        slope,
        intercept,
        sample_count: samples.len(),
    })
}

/// Returns `(slope, intercept)`, or `None` when the x values have no spread.
pub(crate) fn least_squares(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let n = points.len() as f64;
    let sum_x: f64 = points.iter().map(|(x, _)| x).sum();
    let sum_y: f64 = points.iter().map(|(_, y)| y).sum();
    let sum_xy: f64 = points.iter().map(|(x, y)| x * y).sum();
    let sum_xx: f64 = points.iter().map(|(x, _)| x * x).sum();

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        return None;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;
    Some((slope, intercept))
}

/// Splits at midnight of `pivot`: samples strictly before go to the first
/// half. Without a pivot everything is in the second half.
pub fn split_at_pivot(
    samples: &[DailySample],
    pivot: Option<NaiveDate>,
) -> (Vec<DailySample>, Vec<DailySample>) {
    let Some(pivot) = pivot else {
        return (Vec::new(), samples.to_vec());
    };
    let boundary = pivot.and_time(chrono::NaiveTime::MIN);
    samples
        .iter()
        .cloned()
        .partition(|sample| sample.timestamp < boundary)
}

/// Fits each side of the pivot independently, each re-zeroed at its own
/// first sample.
pub fn fit_phases(
    samples: &[DailySample],
    metric: Metric,
    pivot: Option<NaiveDate>,
) -> PhaseCeleration {
    let (pre, post) = split_at_pivot(samples, pivot);
    PhaseCeleration {
        pre: pivot.and_then(|_| fit(&pre, metric)),
        post: fit(&post, metric),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDateTime};

    fn start() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 5)
            .and_then(|d| d.and_hms_opt(8, 30, 0))
            .unwrap()
    }

    fn sample(days: i64, fluency: f64, errors: f64) -> DailySample {
        let timestamp = start() + Duration::days(days);
        DailySample {
            day: timestamp.date(),
            timestamp,
            fluency_rate: fluency,
            error_rate: errors,
            total_time_minutes: 1.0,
        }
    }

    #[test]
    fn needs_two_samples() {
        assert!(fit(&[], Metric::Correct).is_none());
        assert!(fit(&[sample(0, 10.0, 1.0)], Metric::Correct).is_none());
        assert!(fit(&[sample(0, 10.0, 1.0), sample(1, 12.0, 1.0)], Metric::Correct).is_some());
    }

    #[test]
    fn same_timestamp_is_degenerate() {
        let samples = vec![sample(0, 10.0, 1.0), sample(0, 20.0, 2.0), sample(0, 5.0, 3.0)];
        assert!(fit(&samples, Metric::Correct).is_none());
        assert!(fit(&samples, Metric::Error).is_none());
    }

    #[test]
    fn recovers_constant_weekly_growth() {
        let rate: f64 = 1.4;
        let samples: Vec<DailySample> = (0..10)
            .map(|day| sample(day, 8.0 * rate.powf(day as f64 / 7.0), 1.0))
            .collect();
        let result = fit(&samples, Metric::Correct).unwrap();

        assert!((result.factor_per_week() - rate).abs() < 1e-6);
        assert!((result.intercept - 8f64.log10()).abs() < 1e-6);
        assert_eq!(result.sample_count, 10);
    }

    #[test]
    fn doubling_over_one_week_with_two_points() {
        let samples = vec![sample(0, 10.0, 4.0), sample(7, 20.0, 2.0)];
        let corrects = fit(&samples, Metric::Correct).unwrap();
        let errors = fit(&samples, Metric::Error).unwrap();
        assert!((corrects.factor_per_week() - 2.0).abs() < 1e-9);
        assert!((errors.factor_per_week() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn zero_rates_are_floored() {
        let samples = vec![sample(0, 0.0, 0.0), sample(7, 1.0, 0.0)];
        let corrects = fit(&samples, Metric::Correct).unwrap();
        let errors = fit(&samples, Metric::Error).unwrap();
        assert!((corrects.factor_per_week() - 10.0).abs() < 1e-9);
        assert!((errors.intercept - (-1.0)).abs() < 1e-12);
        assert_eq!(errors.slope, 0.0);
    }

    #[test]
    fn pivot_splits_at_midnight() {
        let samples: Vec<DailySample> = (0..6).map(|d| sample(d, 10.0, 1.0)).collect();
        let pivot = samples[3].day;
        let (pre, post) = split_at_pivot(&samples, Some(pivot));
        assert_eq!(pre.len(), 3);
        assert_eq!(post.len(), 3);
        assert_eq!(post[0].day, pivot);

        let (pre, post) = split_at_pivot(&samples, None);
        assert!(pre.is_empty());
        assert_eq!(post.len(), 6);
    }

    #[test]
    fn phases_are_rezeroed_independently() {
        let mut samples: Vec<DailySample> = (0..4)
            .map(|d| sample(d * 7, 10.0 * 2f64.powi(d as i32), 1.0))
            .collect();
        samples.extend((4..8).map(|d| sample(d * 7, 80.0, 1.0)));
        let pivot = samples[4].day;

        let phases = fit_phases(&samples, Metric::Correct, Some(pivot));
        let pre = phases.pre.unwrap();
        let post = phases.post.unwrap();
        assert!((pre.factor_per_week() - 2.0).abs() < 1e-9);
        assert!((pre.intercept - 1.0).abs() < 1e-9);
        assert!((post.factor_per_week() - 1.0).abs() < 1e-9);
        assert!((post.intercept - 80f64.log10()).abs() < 1e-9);
    }

    #[test]
    fn pivot_leaving_one_side_short_returns_none_for_it() {
        let samples: Vec<DailySample> = (0..4).map(|d| sample(d, 10.0, 1.0)).collect();
        let phases = fit_phases(&samples, Metric::Correct, Some(samples[3].day));
        assert!(phases.pre.is_some());
        assert!(phases.post.is_none());

        let phases = fit_phases(&samples, Metric::Correct, None);
        assert!(phases.pre.is_none());
        assert!(phases.post.is_some());
    }
}
