use ndarray::{Array1, Array2};

use crate::LearnerError;

/// Number of symbols in the vocabulary: the lowercase alphabet, `-` and space.
pub const FEATURES: usize = 28;

/// Sliding window length fed to the learner.
pub const WINDOW: usize = 3;

/// Length of the words in the training corpus.
pub const WORD_LEN: usize = 5;

/// Number of next-character predictions per word.
pub const PREDICTIONS: usize = WORD_LEN - WINDOW;

const ALPHABET: &str = "abcdefghijklmnopqrstuvwxyz- ";

/// The character vocabulary and its one-hot encoder.
///
/// Turns raw words into the fixed-size numeric windows the learner consumes:
/// each character becomes a one-hot row of width [`FEATURES`], and a word
/// yields one `(x, y)` pair per [`WINDOW`]-sized slide.
pub struct Vocab {
    chars: Vec<char>,
}

impl Vocab {
    /// Creates the vocabulary.
    pub fn new() -> Self {
        Self { chars: ALPHABET.chars().collect() }
    }

    /// Returns the class index of a character.
    ///
    /// # Errors
    /// Returns `LearnerError::UnknownSymbol` for characters outside the
    /// vocabulary.
    pub fn index_of(&self, c: char) -> Result<usize, LearnerError> {
        self.chars
            .iter()
            .position(|&v| v == c)
            .ok_or(LearnerError::UnknownSymbol(c))
    }

    /// Returns the character for a class index.
    ///
    /// # Errors
    /// Returns `LearnerError::InvalidInput` if the index is out of range.
    pub fn decode(&self, index: usize) -> Result<char, LearnerError> {
        self.chars
            .get(index)
            .copied()
            .ok_or(LearnerError::InvalidInput("class index out of range"))
    }

    /// One-hot encodes a single character into a [`FEATURES`]-wide vector.
    pub fn one_hot(&self, c: char) -> Result<Array1<f32>, LearnerError> {
        let idx = self.index_of(c)?;
        let mut row = Array1::zeros(FEATURES);
        row[idx] = 1.0;
        Ok(row)
    }

    /// Encodes a [`WINDOW`]-character slice into the `[WINDOW, FEATURES]`
    /// input matrix.
    ///
    /// # Errors
    /// Returns `LearnerError::ShapeMismatch` if `window` is not exactly
    /// [`WINDOW`] characters, or `LearnerError::UnknownSymbol` for characters
    /// outside the vocabulary.
    pub fn encode_window(&self, window: &str) -> Result<Array2<f32>, LearnerError> {
        let chars: Vec<char> = window.chars().collect();
        if chars.len() != WINDOW {
            return Err(LearnerError::ShapeMismatch {
                what: "window",
                got: vec![chars.len()],
                expected: vec![WINDOW],
            });
        }

        let mut x = Array2::zeros((WINDOW, FEATURES));
        for (t, &c) in chars.iter().enumerate() {
            x[[t, self.index_of(c)?]] = 1.0;
        }
        Ok(x)
    }

    /// Slides a window over `word` and yields one `(x, y)` training pair per
    /// position: the window as input and the following character as one-hot
    /// target.
    ///
    /// # Errors
    /// Returns `LearnerError::InvalidInput` if the word is shorter than
    /// `WINDOW + 1` characters, or `LearnerError::UnknownSymbol` for
    /// characters outside the vocabulary.
    pub fn training_pairs(
        &self,
        word: &str,
    ) -> Result<Vec<(Array2<f32>, Array1<f32>)>, LearnerError> {
        let chars: Vec<char> = word.chars().collect();
        if chars.len() <= WINDOW {
            return Err(LearnerError::InvalidInput("word is too short to window"));
        }

        let mut pairs = Vec::with_capacity(chars.len() - WINDOW);
        for start in 0..chars.len() - WINDOW {
            let window: String = chars[start..start + WINDOW].iter().collect();
            let x = self.encode_window(&window)?;
            let y = self.one_hot(chars[start + WINDOW])?;
            pairs.push((x, y));
        }
        Ok(pairs)
    }
}

impl Default for Vocab {
    fn default() -> Self {
        Self::new()
    }
}
