use crate::models::PatternLabel;

/// Quadrant classification of weekly correct and error factors around 1.0.
/// First matching band wins; factors exactly on a band edge fall through.
pub fn classify(correct_factor: f64, error_factor: f64) -> Option<PatternLabel> {
    let (c, e) = (correct_factor, error_factor);
    if c > 1.4 && e < 0.7 {
        Some(PatternLabel::StrongJaws)
    } else if c > 1.25 && e < 0.9 {
        Some(PatternLabel::GoodJaws)
    } else if c > 1.0 && e < 1.0 {
        Some(PatternLabel::MarginalJaws)
    } else if c > 1.0 && e > 1.0 {
        Some(PatternLabel::BothRising)
    } else if c < 1.0 && e < 1.0 {
        Some(PatternLabel::BothFalling)
    } else if c < 1.0 && e > 1.0 {
        Some(PatternLabel::Opposition)
    } else {
        None
    }
}
