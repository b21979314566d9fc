/// Emotion class: the discretized mood picked once per run.

use std::fmt;

/// Polarity below this is negative (strict).
pub const NEGATIVE_THRESHOLD: f32 = -0.3;
/// Polarity above this is positive (strict).
pub const POSITIVE_THRESHOLD: f32 = 0.3;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Emotion {
    Negative,
    Neutral,
    Positive,
}

impl Emotion {
    /// Bucket a polarity score in `[-1, 1]`. Both thresholds are
    /// exclusive: exactly ±0.3 is neutral.
    pub fn from_polarity(polarity: f32) -> Emotion {
        if polarity < NEGATIVE_THRESHOLD {
            Emotion::Negative
        } else if polarity > POSITIVE_THRESHOLD {
            Emotion::Positive
        } else {
            Emotion::Neutral
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Emotion::Negative => "sad",
            Emotion::Neutral => "neutral",
            Emotion::Positive => "happy",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
