/// Sentiment scoring for the mood prompt.
///
/// The game only needs a polarity in `[-1, 1]`; anything that
/// implements `SentimentClassifier` can stand in. The built-in
/// `LexiconClassifier` is a small word-list scorer:
///   - each lexicon word contributes its score
///   - an intensifier right before a word scales it by 1.3
///   - a negator up to two tokens before a word flips and halves it
///   - the result is the mean of contributions, clamped to [-1, 1]

use std::collections::HashMap;

use super::emotion::Emotion;

pub trait SentimentClassifier {
    /// Polarity of `text` in `[-1, 1]`. Zero when nothing is recognised.
    fn polarity(&self, text: &str) -> f32;

    fn classify(&self, text: &str) -> Emotion {
        Emotion::from_polarity(self.polarity(text))
    }
}

const INTENSIFY: f32 = 1.3;
const NEGATE: f32 = -0.5;

const INTENSIFIERS: &[&str] = &[
    "very", "really", "so", "extremely", "super", "totally", "incredibly", "truly", "quite",
];

const NEGATORS: &[&str] = &["not", "no", "never", "nothing", "hardly", "without"];

// ── Built-in lexicon ──

const LEXICON: &[(&str, f32)] = &[
    // positive
    ("good", 0.7),
    ("great", 0.8),
    ("happy", 0.8),
    ("glad", 0.5),
    ("joy", 0.8),
    ("joyful", 0.8),
    ("love", 0.5),
    ("lovely", 0.5),
    ("awesome", 1.0),
    ("amazing", 0.6),
    ("excellent", 1.0),
    ("wonderful", 1.0),
    ("fantastic", 0.4),
    ("fine", 0.4),
    ("nice", 0.6),
    ("calm", 0.3),
    ("relaxed", 0.4),
    ("excited", 0.4),
    ("cheerful", 0.6),
    ("peaceful", 0.5),
    ("best", 1.0),
    ("better", 0.5),
    ("fun", 0.3),
    ("beautiful", 0.85),
    ("hopeful", 0.5),
    ("grateful", 0.6),
    ("proud", 0.8),
    ("ok", 0.5),
    ("okay", 0.5),
    ("well", 0.2),
    ("energetic", 0.5),
    ("perfect", 1.0),
    // negative
    ("bad", -0.7),
    ("sad", -0.5),
    ("terrible", -1.0),
    ("awful", -1.0),
    ("horrible", -1.0),
    ("angry", -0.5),
    ("upset", -0.4),
    ("tired", -0.4),
    ("bored", -0.5),
    ("boring", -1.0),
    ("lonely", -0.5),
    ("depressed", -0.6),
    ("miserable", -1.0),
    ("anxious", -0.4),
    ("worried", -0.4),
    ("stressed", -0.5),
    ("worst", -1.0),
    ("worse", -0.4),
    ("hate", -0.8),
    ("sick", -0.7),
    ("exhausted", -0.4),
    ("frustrated", -0.7),
    ("annoyed", -0.4),
    ("scared", -0.6),
    ("afraid", -0.6),
    ("hurt", -0.5),
    ("broken", -0.4),
    ("down", -0.2),
    ("meh", -0.1),
];

pub struct LexiconClassifier {
    words: HashMap<String, f32>,
}

impl LexiconClassifier {
    pub fn new() -> Self {
        LexiconClassifier {
            words: LEXICON.iter().map(|&(w, s)| (w.to_string(), s)).collect(),
        }
    }

    /// Add or override words. Scores are clamped to [-1, 1].
    pub fn with_words<'a, I>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a f32)>,
    {
        for (word, score) in extra {
            self.words.insert(word.to_lowercase(), score.clamp(-1.0, 1.0));
        }
        self
    }
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SentimentClassifier for LexiconClassifier {
    fn polarity(&self, text: &str) -> f32 {
        let tokens = tokenize(text);
        let mut sum = 0.0_f32;
        let mut hits = 0_u32;

        for (i, tok) in tokens.iter().enumerate() {
            let Some(&base) = self.words.get(tok.as_str()) else { continue };
            let mut score = base;

            if i >= 1 && INTENSIFIERS.contains(&tokens[i - 1].as_str()) {
                score *= INTENSIFY;
            }
            let window = &tokens[i.saturating_sub(2)..i];
            if window.iter().any(|t| is_negator(t)) {
                score *= NEGATE;
            }

            sum += score.clamp(-1.0, 1.0);
            hits += 1;
        }

        if hits == 0 {
            0.0
        } else {
            (sum / hits as f32).clamp(-1.0, 1.0)
        }
    }
}

fn is_negator(tok: &str) -> bool {
    NEGATORS.contains(&tok) || tok.ends_with("n't")
}

/// Lower-cased runs of letters; apostrophes stay inside words.
fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphabetic() || c == '\''))
        .map(|t| t.trim_matches('\'').to_lowercase())
        .filter(|t| !t.is_empty())
        .collect()
}
