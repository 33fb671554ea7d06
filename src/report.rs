use std::fmt::Write;

use crate::analysis::Analysis;
use crate::celeration::WEEK_SECONDS;
use crate::models::{CelerationResult, QuizSummary};

fn factor_cell(result: Option<&CelerationResult>) -> String {
    match result {
        Some(result) => format!("x{:.2} per week", result.factor_per_week()),
        None => "not enough data".to_string(),
    }
}

/// Weeks from the first to the last practice day.
fn series_span_weeks(analysis: &Analysis) -> Option<f64> {
    let first = analysis.daily.first()?;
    let last = analysis.daily.last()?;
    Some((last.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0 / WEEK_SECONDS)
}

fn write_fitted_line(
    output: &mut String,
    name: &str,
    result: Option<&CelerationResult>,
    weeks: f64,
) {
    if let Some(result) = result {
        let _ = writeln!(
            output,
            "- Fitted {} line: {:.1} to {:.1} per minute",
            name,
            result.rate_at(0.0),
            result.rate_at(weeks)
        );
    }
}

pub fn build_report(scope: Option<&str>, analysis: &Analysis, quizzes: &[QuizSummary]) -> String {
    let mut output = String::new();
    let scope_label = scope.unwrap_or("all quizzes");

    let _ = writeln!(output, "# Celeration Report");
    match (analysis.daily.first(), analysis.daily.last()) {
        (Some(first), Some(last)) => {
            let _ = writeln!(
                output,
                "Generated for {} ({} practice days, {} to {})",
                scope_label,
                analysis.daily.len(),
                first.day,
                last.day
            );
        }
        _ => {
            let _ = writeln!(output, "Generated for {} (no practice days)", scope_label);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Celeration");
    let _ = writeln!(output, "| Phase | Corrects | Errors |");
    let _ = writeln!(output, "|---|---|---|");
    let _ = writeln!(
        output,
        "| Whole series | {} | {} |",
        factor_cell(analysis.whole_correct.as_ref()),
        factor_cell(analysis.whole_error.as_ref())
    );
    if analysis.correct.pre.is_some() || analysis.error.pre.is_some() {
        let _ = writeln!(
            output,
            "| Before pivot | {} | {} |",
            factor_cell(analysis.correct.pre.as_ref()),
            factor_cell(analysis.error.pre.as_ref())
        );
        let _ = writeln!(
            output,
            "| After pivot | {} | {} |",
            factor_cell(analysis.correct.post.as_ref()),
            factor_cell(analysis.error.post.as_ref())
        );
    }

    if let Some(weeks) = series_span_weeks(analysis) {
        let _ = writeln!(output);
        write_fitted_line(&mut output, "corrects", analysis.whole_correct.as_ref(), weeks);
        write_fitted_line(&mut output, "errors", analysis.whole_error.as_ref(), weeks);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Pattern");
    match analysis.pattern {
        Some(label) => {
            let _ = writeln!(output, "{}", label.description());
        }
        None => {
            let _ = writeln!(output, "Not enough data to classify.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    match &analysis.summary {
        Some(summary) => {
            let _ = writeln!(output, "- Attempts: {}", summary.attempt_count);
            let _ = writeln!(
                output,
                "- Recent accuracy (moving average): {:.1}%",
                summary.moving_average_accuracy
            );
            let _ = writeln!(output, "- Best accuracy: {:.1}%", summary.best_accuracy);
            let _ = writeln!(output, "- Best fluency: {:.1} per minute", summary.best_fluency);
            let _ = writeln!(
                output,
                "- Accuracy change, first to latest: {:+.1} points",
                summary.accuracy_improvement
            );
            if let Some(target) = summary.ideal_projection.last() {
                let _ = writeln!(
                    output,
                    "- Ideal x1.4 line reaches {:.1} per minute in {} days",
                    target.fluency_rate, target.day_offset
                );
            }
        }
        None => {
            let _ = writeln!(output, "No attempts recorded.");
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommendations");
    for tip in &analysis.tips {
        let _ = writeln!(output, "- {}", tip);
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Quiz Mix");
    if quizzes.is_empty() {
        let _ = writeln!(output, "No attempts recorded.");
    } else {
        for quiz in quizzes.iter() {
            let _ = writeln!(
                output,
                "- {}: {} attempts (avg accuracy {:.1}%, avg fluency {:.1}/min)",
                quiz.quiz_title, quiz.attempt_count, quiz.avg_accuracy, quiz.avg_fluency
            );
        }
    }

    output
}
