//! Threshold calibration against labelled sample pairs.
//!
//! `dq calibrate` embeds a small, fixed set of question pairs that a human
//! has labelled as "should be flagged" or "should pass", then shows how each
//! candidate threshold would classify them.

use anyhow::Result;

use crate::config::Config;
use crate::embedding::{self, EmbeddingProvider};
use crate::similarity::cosine_similarity;

/// A hand-labelled pair of questions.
pub struct SamplePair {
    pub first: &'static str,
    pub second: &'static str,
    pub should_match: bool,
}

pub const SAMPLE_PAIRS: &[SamplePair] = &[
    SamplePair {
        first: "If you could have dinner with any historical figure, who would it be and why?",
        second: "If you could invite three historical figures to a dinner party, who would they be?",
        should_match: true,
    },
    SamplePair {
        first: "What's your favorite book and how did it impact your life?",
        second: "If you could only read one book for the rest of your life, which would it be?",
        should_match: true,
    },
    SamplePair {
        first: "If you could travel anywhere in the world, where would you go?",
        second: "What's your dream vacation destination?",
        should_match: true,
    },
    SamplePair {
        first: "What's your favorite food and why?",
        second: "What's the most unusual food you've ever tried?",
        should_match: false,
    },
    SamplePair {
        first: "What hobby would you take up if you had unlimited time and money?",
        second: "If you could master any skill instantly, what would it be?",
        should_match: false,
    },
    SamplePair {
        first: "What was your favorite childhood toy?",
        second: "If you could bring back one discontinued product, what would it be?",
        should_match: false,
    },
];

pub const CANDIDATE_THRESHOLDS: &[f64] = &[0.75, 0.80, 0.85, 0.90, 0.95];

/// How one threshold classifies one scored pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdOutcome {
    pub threshold: f64,
    pub flagged: bool,
    pub correct: bool,
}

pub fn evaluate_thresholds(
    score: f32,
    should_match: bool,
    thresholds: &[f64],
) -> Vec<ThresholdOutcome> {
    thresholds
        .iter()
        .map(|&threshold| {
            let flagged = f64::from(score) >= threshold;
            ThresholdOutcome {
                threshold,
                flagged,
                correct: flagged == should_match,
            }
        })
        .collect()
}

/// Embed both sides of a sample pair and score them. Embedding failures
/// and dimension mismatches are errors, which the caller treats as a skip.
pub async fn score_pair(embedder: &dyn EmbeddingProvider, pair: &SamplePair) -> Result<f32> {
    let a = embedder.embed(pair.first).await?;
    let b = embedder.embed(pair.second).await?;
    Ok(cosine_similarity(&a, &b)?)
}

/// `dq calibrate`: score the sample pairs and print a per-threshold table.
pub async fn run_calibrate(config: &Config) -> Result<()> {
    if !config.embedding.is_enabled() {
        anyhow::bail!("Embedding provider is disabled. Set [embedding] provider in config.");
    }

    let provider = embedding::create_provider(&config.embedding)?;

    println!("calibrate");
    println!(
        "  model:             {} ({} dims)",
        provider.model_name(),
        provider.dims()
    );
    println!("  current threshold: {}", config.similarity.threshold);

    let mut correct_per_threshold = vec![0usize; CANDIDATE_THRESHOLDS.len()];
    let mut scored = 0usize;

    for pair in SAMPLE_PAIRS {
        println!();
        println!("  1: {}", pair.first);
        println!("  2: {}", pair.second);
        println!(
            "  expected: {}",
            if pair.should_match { "similar" } else { "distinct" }
        );

        let score = match score_pair(provider.as_ref(), pair).await {
            Ok(score) => score,
            Err(e) => {
                tracing::warn!("could not score sample pair: {e:#}");
                println!("  skipped: {:#}", e);
                continue;
            }
        };
        scored += 1;
        println!("  score:    {:.4}", score);

        for (k, outcome) in evaluate_thresholds(score, pair.should_match, CANDIDATE_THRESHOLDS)
            .iter()
            .enumerate()
        {
            if outcome.correct {
                correct_per_threshold[k] += 1;
            }
            println!(
                "    {:.2}  {:<9} {}",
                outcome.threshold,
                if outcome.flagged { "flagged" } else { "passes" },
                if outcome.correct { "ok" } else { "WRONG" }
            );
        }
    }

    println!();
    println!("  {:<10} {:>8}", "THRESHOLD", "CORRECT");
    println!("  {}", "-".repeat(19));
    for (threshold, correct) in CANDIDATE_THRESHOLDS.iter().zip(&correct_per_threshold) {
        println!("  {:<10.2} {:>4} / {}", threshold, correct, scored);
    }

    Ok(())
}
