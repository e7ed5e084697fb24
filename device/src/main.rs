use std::{env, fs, io, path::Path};

use device::{config::DeviceConfig, driver};
use learner::{Vocab, WordRnn};
use log::info;
use runtime::{Dispatcher, SignatureRequest, SignatureResponse};

const USAGE: &str = "usage: device train <config.json>
       device complete <config.json> <prefix>
       device aggregate <left> <right> <output>";

fn main() -> io::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [cmd, config] if cmd == "train" => train(Path::new(config)),
        [cmd, config, prefix] if cmd == "complete" => complete(Path::new(config), prefix),
        [cmd, left, right, output] if cmd == "aggregate" => {
            aggregate(Path::new(left), Path::new(right), Path::new(output))
        }
        _ => Err(io::Error::other(USAGE)),
    }
}

/// Trains over the configured word list and saves the checkpoint, resuming
/// from an existing one first.
fn train(config_path: &Path) -> io::Result<()> {
    let config = DeviceConfig::load(config_path)?;
    let mut dispatcher = build_dispatcher(&config)?;

    if config.checkpoint.exists() {
        dispatcher
            .dispatch(SignatureRequest::Restore { path: config.checkpoint.clone() })
            .map_err(io::Error::other)?;
        info!("resumed from {}", config.checkpoint.display());
    }

    let words = read_wordlist(&config.wordlist)?;
    let mean = driver::train_wordlist(&mut dispatcher, &Vocab::new(), &words, config.epochs)
        .map_err(io::Error::other)?;
    info!("training finished, mean loss {mean:.6}");

    dispatcher
        .dispatch(SignatureRequest::Save { path: config.checkpoint.clone() })
        .map_err(io::Error::other)?;
    Ok(())
}

/// Restores the configured checkpoint and completes a word prefix.
fn complete(config_path: &Path, prefix: &str) -> io::Result<()> {
    let config = DeviceConfig::load(config_path)?;
    let mut dispatcher = build_dispatcher(&config)?;

    dispatcher
        .dispatch(SignatureRequest::Restore { path: config.checkpoint.clone() })
        .map_err(io::Error::other)?;

    let word = driver::complete_word(&dispatcher, &Vocab::new(), prefix)
        .map_err(io::Error::other)?;
    println!("{word}");
    Ok(())
}

/// Merges two participant checkpoints into one.
fn aggregate(left: &Path, right: &Path, output: &Path) -> io::Result<()> {
    // The aggregator never reads the live learner, so any instance will do.
    let mut dispatcher = Dispatcher::new(WordRnn::new(0.01, None).map_err(io::Error::other)?);

    let response = dispatcher
        .dispatch(SignatureRequest::Aggregate {
            inputs: [left.to_path_buf(), right.to_path_buf()],
            output: output.to_path_buf(),
        })
        .map_err(io::Error::other)?;

    if let SignatureResponse::Aggregated { output } = response {
        info!("wrote {}", output.display());
    }
    Ok(())
}

fn build_dispatcher(config: &DeviceConfig) -> io::Result<Dispatcher> {
    let learner = WordRnn::new(config.learning_rate, config.seed).map_err(io::Error::other)?;
    Ok(Dispatcher::new(learner))
}

/// Reads a word list file, one word per line, skipping blank lines.
fn read_wordlist(path: &Path) -> io::Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}
