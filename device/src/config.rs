use std::{fs, io, path::PathBuf};

use serde::Deserialize;

/// Device-side run parameters, loaded from a JSON file.
///
/// `epochs`, `learning_rate` and `seed` are optional in the file; the word
/// list and checkpoint paths are not.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// Path of the training word list, one word per line.
    pub wordlist: PathBuf,
    /// Path of the checkpoint this device reads and writes.
    pub checkpoint: PathBuf,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    /// Seeds weight initialization when given; otherwise the OS RNG is used.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_epochs() -> usize {
    100
}

fn default_learning_rate() -> f32 {
    0.01
}

impl DeviceConfig {
    /// Reads and validates a configuration file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not valid JSON, or
    /// fails validation.
    pub fn load(path: &std::path::Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content).map_err(io::Error::other)?;
        config.validate().map_err(io::Error::other)?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), String> {
        if self.epochs == 0 {
            return Err("epochs must be at least 1".to_string());
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err("learning_rate must be a positive finite number".to_string());
        }
        Ok(())
    }
}
