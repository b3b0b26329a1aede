use std::{env, fs, num::NonZeroUsize, path::Path};

use anyhow::{Context, bail};
use log::info;

use char_rnn::{
    ErrorPolicy, HiddenInit, LossTracker, PipelineConfig, RunConfig, Sampler, SamplerConfig,
    TextFeeder, TrainingSession, Vocabulary,
};

const USAGE: &str = "usage: char-rnn train <input> [backup] | char-rnn sample <backup> [count]";
const LOG_EVERY: usize = 100;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let config = RunConfig::from_env()?;

    match args.get(1).map(String::as_str) {
        Some("train") => {
            let input = args.get(2).context(USAGE)?;
            train(&config, input, args.get(3).map(String::as_str)).await
        }
        Some("sample") => {
            let backup = args.get(2).context(USAGE)?;
            let count = match args.get(3) {
                Some(raw) => raw.parse().with_context(|| format!("bad count {raw:?}"))?,
                None => config.sample_size,
            };
            sample(&config, backup, count)
        }
        _ => bail!(USAGE),
    }
}

async fn train(config: &RunConfig, input: &str, backup: Option<&str>) -> anyhow::Result<()> {
    let text = fs::read_to_string(input).with_context(|| format!("reading {input}"))?;

    let (session, vocabulary) = match backup.filter(|path| Path::new(path).exists()) {
        Some(path) => {
            info!("resuming from {path}");
            restore(path)?
        }
        None => {
            let vocabulary = Vocabulary::from_text(&text)?;
            let network = config.network(vocabulary.len());
            (TrainingSession::new(network, config.seed)?, vocabulary)
        }
    };

    let window = NonZeroUsize::new(session.config().window_size).context("window size is zero")?;
    let epochs = NonZeroUsize::new(config.epochs).context("CHAR_RNN_EPOCHS must be positive")?;
    let feeder = TextFeeder::new(&vocabulary, &text, window, epochs)?;
    info!(
        symbols = vocabulary.len(),
        batches = feeder.batches_per_epoch(),
        epochs = feeder.epochs();
        "training on {input}"
    );

    let mut sampler = Sampler::new(SamplerConfig {
        hidden: HiddenInit::Zero,
        seed: config.seed,
    });
    let mut tracker = LossTracker::new(vocabulary.len(), window.get());
    let sample_every = config.sample_frequency.max(1);

    // Lockstep: every loss is awaited, so none is dropped and a halted worker ends the loop.
    let mut pipeline = session.train(PipelineConfig::new(ErrorPolicy::Halt))?;

    for (iteration, (epoch, batch)) in feeder.batches().enumerate() {
        pipeline.submit(batch).await?;
        let Some(loss) = pipeline.next_loss().await else {
            break;
        };

        let smooth = tracker.record(loss);
        if iteration % LOG_EVERY == 0 {
            info!(epoch = epoch, iteration = iteration, loss = smooth; "training");
        }

        if iteration % sample_every == 0 {
            let text = generate(config, &session, &vocabulary, &mut sampler, config.sample_size)?;
            println!("{text}");
            if let Some(path) = backup {
                save(&session, &vocabulary, path)?;
            }
        }
    }

    let metrics = pipeline.close().await?;
    info!(steps = metrics.steps, loss = tracker.smooth(); "training done");

    println!("{}", generate(config, &session, &vocabulary, &mut sampler, config.sample_size)?);
    if let Some(path) = backup {
        save(&session, &vocabulary, path)?;
    }

    Ok(())
}

fn sample(config: &RunConfig, backup: &str, count: usize) -> anyhow::Result<()> {
    let (session, vocabulary) = restore(backup)?;

    let mut sampler = Sampler::new(SamplerConfig {
        hidden: HiddenInit::Zero,
        seed: config.seed,
    });

    println!("{}", generate(config, &session, &vocabulary, &mut sampler, count)?);
    Ok(())
}

/// Primes with the configured start text, dropping symbols the vocabulary doesn't know.
///
/// The text starts with the priming and is `count` symbols long, unless the configured end
/// pattern matches a generated symbol first.
fn generate(
    config: &RunConfig,
    session: &TrainingSession,
    vocabulary: &Vocabulary,
    sampler: &mut Sampler,
    count: usize,
) -> anyhow::Result<String> {
    let start: String = config
        .sample_start
        .chars()
        .filter(|&c| vocabulary.index_of(c).is_ok())
        .collect();

    let priming = match vocabulary.encode(&start)? {
        priming if priming.is_empty() => vec![0],
        priming => priming,
    };

    let out = session.sample(sampler, &priming, count, &config.choice)?;
    Ok(match &config.sample_end {
        Some(end) => vocabulary.decode_until(&out, priming.len(), end),
        None => vocabulary.decode(&out),
    })
}

fn restore(path: &str) -> anyhow::Result<(TrainingSession, Vocabulary)> {
    let bytes = fs::read(path).with_context(|| format!("reading {path}"))?;
    let (session, vocabulary) = TrainingSession::from_checkpoint(&bytes)?;
    let vocabulary = vocabulary.with_context(|| format!("{path} has no vocabulary"))?;
    Ok((session, vocabulary))
}

fn save(session: &TrainingSession, vocabulary: &Vocabulary, path: &str) -> anyhow::Result<()> {
    let bytes = session.checkpoint(Some(vocabulary))?;
    fs::write(path, bytes).with_context(|| format!("writing {path}"))?;
    info!("checkpoint saved to {path}");
    Ok(())
}
