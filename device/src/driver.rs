//! The word-model training and completion loops.

use learner::{FEATURES, PREDICTIONS, Tensor, Vocab, WINDOW};
use log::info;
use runtime::{Dispatcher, Result, SignatureError};

/// Trains the learner over every window of every word for `epochs` passes.
///
/// Returns the mean loss of the final epoch. Progress is logged every ten
/// epochs.
///
/// # Errors
/// Returns `SignatureError::InvalidInput` for an empty word list or words
/// that cannot be windowed, and propagates any learner failure.
pub fn train_wordlist(
    dispatcher: &mut Dispatcher,
    vocab: &Vocab,
    words: &[String],
    epochs: usize,
) -> Result<f32> {
    if words.is_empty() {
        return Err(SignatureError::InvalidInput(
            "the word list is empty".to_string(),
        ));
    }

    let mut pairs = Vec::with_capacity(words.len() * PREDICTIONS);
    for word in words {
        for (x, y) in vocab.training_pairs(word)? {
            pairs.push((input_tensor(x.iter()), target_tensor(y.iter())));
        }
    }

    let mut mean = 0.0;
    for epoch in 1..=epochs {
        let mut total = 0.0;
        for (x, y) in &pairs {
            let (loss, _) = dispatcher.train(x, y)?;
            total += loss;
        }
        mean = total / pairs.len() as f32;
        if epoch % 10 == 0 || epoch == epochs {
            info!("epoch {epoch}/{epochs}: mean loss {mean:.6}");
        }
    }
    Ok(mean)
}

/// Completes a word from its first [`WINDOW`] characters.
///
/// Runs the learner over successive windows, feeding each predicted
/// character back in, until the word reaches its full length.
///
/// # Errors
/// Returns `SignatureError::InvalidInput` if the prefix is not exactly
/// [`WINDOW`] characters or contains symbols outside the vocabulary.
pub fn complete_word(dispatcher: &Dispatcher, vocab: &Vocab, prefix: &str) -> Result<String> {
    let mut word: Vec<char> = prefix.chars().collect();
    if word.len() != WINDOW {
        return Err(SignatureError::InvalidInput(format!(
            "the prefix must be exactly {WINDOW} characters, got {}",
            word.len()
        )));
    }

    for _ in 0..PREDICTIONS {
        let window: String = word[word.len() - WINDOW..].iter().collect();
        let x = vocab.encode_window(&window)?;
        let class = dispatcher.infer(&input_tensor(x.iter()))?;
        word.push(vocab.decode(class)?);
    }
    Ok(word.into_iter().collect())
}

/// Wraps an encoded window in the `[1, WINDOW, FEATURES]` contract shape.
fn input_tensor<'a>(values: impl Iterator<Item = &'a f32>) -> Tensor {
    // SAFETY: the encoder produces exactly WINDOW * FEATURES values.
    Tensor::new("x", vec![1, WINDOW, FEATURES], values.copied().collect()).unwrap()
}

/// Wraps a one-hot target in the `[1, FEATURES]` contract shape.
fn target_tensor<'a>(values: impl Iterator<Item = &'a f32>) -> Tensor {
    // SAFETY: one-hot targets are exactly FEATURES wide.
    Tensor::new("y", vec![1, FEATURES], values.copied().collect()).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use learner::{WORD_LEN, WordRnn};

    fn dispatcher(learning_rate: f32, seed: u64) -> Dispatcher {
        Dispatcher::new(WordRnn::new(learning_rate, Some(seed)).unwrap())
    }

    #[test]
    fn training_reduces_the_mean_loss() {
        let mut d = dispatcher(0.1, 21);
        let vocab = Vocab::new();
        let words = vec!["about".to_string()];

        let first = train_wordlist(&mut d, &vocab, &words, 1).unwrap();
        let last = train_wordlist(&mut d, &vocab, &words, 100).unwrap();
        assert!(last < first, "loss did not decrease: {first} -> {last}");
    }

    #[test]
    fn a_trained_learner_completes_its_word() {
        let mut d = dispatcher(0.1, 21);
        let vocab = Vocab::new();
        let words = vec!["about".to_string()];

        train_wordlist(&mut d, &vocab, &words, 800).unwrap();

        let completed = complete_word(&d, &vocab, "abo").unwrap();
        assert_eq!(completed.chars().count(), WORD_LEN);
        assert_eq!(completed, "about");
    }

    #[test]
    fn rejects_an_empty_word_list() {
        let mut d = dispatcher(0.1, 21);
        let err = train_wordlist(&mut d, &Vocab::new(), &[], 1).unwrap_err();
        assert!(matches!(err, SignatureError::InvalidInput(_)));
    }

    #[test]
    fn rejects_a_short_prefix() {
        let d = dispatcher(0.1, 21);
        let err = complete_word(&d, &Vocab::new(), "ab").unwrap_err();
        assert!(matches!(err, SignatureError::InvalidInput(_)));
    }
}
