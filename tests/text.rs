use std::{num::NonZeroUsize, time::Duration};

use tokio::time::timeout;

use char_rnn::{
    Argmax, LossTracker, NetworkConfig, PipelineConfig, Sampler, SamplerConfig, TextFeeder,
    TrainingSession, Vocabulary,
};

const TEXT: &str = "abcabcabcabcabcabcabcabcabcabcabcabcabcabcabcabcabcabcabcabc";
const TIMEOUT: Duration = Duration::from_secs(30);

fn nz(n: usize) -> NonZeroUsize {
    NonZeroUsize::new(n).unwrap()
}

fn session(vocabulary: &Vocabulary, window: usize) -> TrainingSession {
    let config = NetworkConfig::new(vocabulary.len(), vocabulary.len())
        .with_hidden_size(16)
        .with_window_size(window)
        .with_learning_rate(0.1);
    TrainingSession::new(config, Some(2024)).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn learns_a_repeating_pattern() {
    let vocabulary = Vocabulary::from_text(TEXT).unwrap();
    let session = session(&vocabulary, 6);
    let feeder = TextFeeder::new(&vocabulary, TEXT, nz(6), nz(60)).unwrap();

    let pipeline = session.train(PipelineConfig::default()).unwrap();
    let (sender, mut losses, handle) = pipeline.into_parts();

    let expected = feeder.batches_per_epoch() * feeder.epochs();
    let feeding = tokio::spawn(feeder.feed(sender));

    let mut tracker = LossTracker::new(vocabulary.len(), 6);
    let first = tracker.smooth();
    while let Some(loss) = timeout(TIMEOUT, losses.recv()).await.unwrap() {
        assert!(loss >= 0.);
        tracker.record(loss);
    }

    assert_eq!(feeding.await.unwrap().unwrap(), expected);
    let metrics = handle.join().await.unwrap();
    assert_eq!(metrics.steps as usize, expected);
    assert!(metrics.last_loss.unwrap() < first / 4.);

    let mut sampler = Sampler::new(SamplerConfig {
        seed: Some(0),
        ..Default::default()
    });
    let priming = vocabulary.encode("abc").unwrap();
    let out = session.sample(&mut sampler, &priming, 12, &Argmax).unwrap();
    assert_eq!(vocabulary.decode(&out), "abcabcabcabc");
}

#[test]
fn resumed_checkpoint_continues_identically() {
    let vocabulary = Vocabulary::from_text(TEXT).unwrap();
    let feeder = TextFeeder::new(&vocabulary, TEXT, nz(5), nz(2)).unwrap();
    let batches: Vec<_> = feeder.batches().map(|(_, batch)| batch).collect();
    let (head, tail) = batches.split_at(batches.len() / 2);

    let original = session(&vocabulary, 5);
    for batch in head {
        original.train_step(batch).unwrap();
    }

    let bytes = original.checkpoint(Some(&vocabulary)).unwrap();
    let (resumed, stored) = TrainingSession::from_checkpoint(&bytes).unwrap();
    assert_eq!(stored.as_ref(), Some(&vocabulary));
    assert_eq!(resumed.snapshot(), original.snapshot());

    for batch in tail {
        let a = original.train_step(batch).unwrap();
        let b = resumed.train_step(batch).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    assert_eq!(resumed.snapshot(), original.snapshot());
    assert_eq!(
        resumed.checkpoint(None).unwrap(),
        original.checkpoint(None).unwrap()
    );
}

#[test]
fn restore_into_a_live_session() {
    let vocabulary = Vocabulary::from_text(TEXT).unwrap();
    let feeder = TextFeeder::new(&vocabulary, TEXT, nz(5), nz(1)).unwrap();

    let trained = session(&vocabulary, 5);
    for (_, batch) in feeder.batches() {
        trained.train_step(&batch).unwrap();
    }
    let bytes = trained.checkpoint(None).unwrap();

    let fresh = session(&vocabulary, 5);
    assert_ne!(fresh.snapshot(), trained.snapshot());
    assert!(fresh.restore(&bytes).unwrap().is_none());
    assert_eq!(fresh.snapshot(), trained.snapshot());

    let other = TrainingSession::new(
        NetworkConfig::new(vocabulary.len(), vocabulary.len()).with_hidden_size(4),
        Some(1),
    )
    .unwrap();
    assert!(other.restore(&bytes).is_err());
}
