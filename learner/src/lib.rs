mod error;
mod rnn;
mod tensor;
mod vocab;

pub use error::LearnerError;
pub use rnn::{TrainStep, WordRnn, BIAS, KERNEL, RECURRENT_KERNEL, UNITS};
pub use tensor::Tensor;
pub use vocab::{Vocab, FEATURES, PREDICTIONS, WINDOW, WORD_LEN};
