//! Quickstart example: roll out a predictor, build its verification and score it.
//!
//! Run with: cargo run --example quickstart

use chrono::{Duration, TimeZone, Utc};
use ndarray::{s, Array1, Array4};
use wxcast::core::{Channel, SampleStore};
use wxcast::error::Result;
use wxcast::metrics::{climo_error, score_trajectories, ErrorMethod};
use wxcast::models::{Persistence, PredictorInput, SequencePredictor};
use wxcast::rollout::{RolloutConfig, RolloutEngine};
use wxcast::verification::verification_from_series;

/// Extrapolates 500 hPa height linearly from the last two window steps; SST is forcing only.
struct Extrapolate {
    inputs: Vec<Channel>,
    outputs: Vec<Channel>,
}

impl SequencePredictor for Extrapolate {
    fn input_channels(&self) -> &[Channel] {
        &self.inputs
    }

    fn output_channels(&self) -> &[Channel] {
        &self.outputs
    }

    fn input_time_steps(&self) -> usize {
        2
    }

    fn predict_one_step(&mut self, input: &PredictorInput<'_>) -> Result<Array4<f32>> {
        let prev = input.inputs.slice(s![.., 0, 0..1, .., ..]);
        let last = input.inputs.slice(s![.., 1, 0..1, .., ..]);
        Ok(&last * 2.0 - &prev)
    }

    fn name(&self) -> &str {
        "Extrapolate"
    }
}

fn main() {
    println!("=== wxcast Quickstart ===\n");

    // 1. Ten days of 6-hourly fields on a coarse 4x8 grid
    let z500 = Channel::new("HGT", "500");
    let sst = Channel::surface("SST");
    let n = 40;
    let times: Vec<_> = (0..n)
        .map(|i| Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::hours(6 * i as i64))
        .collect();
    let data = Array4::from_shape_fn((n, 2, 4, 8), |(t, c, y, x)| {
        let phase = 0.3 * t as f32 + 0.8 * x as f32;
        match c {
            0 => 5500.0 + 20.0 * y as f32 + 40.0 * phase.sin() + 2.0 * t as f32,
            _ => 275.0 + 5.0 * y as f32,
        }
    });
    let store = SampleStore::new(
        times,
        vec![z500.clone(), sst.clone()],
        Array1::linspace(60.0, 0.0, 4),
        Array1::linspace(0.0, 315.0, 8),
        data,
    )
    .unwrap();
    println!(
        "Store: {} samples of {} channels",
        store.len(),
        store.channels().len()
    );

    // 2. Roll out two predictors over two days from every time with a full window
    let steps = 8;
    let engine = RolloutEngine::new(RolloutConfig::new(steps, 6)).unwrap();
    let init_times = &store.times()[1..n - steps];

    let mut extrapolate = Extrapolate {
        inputs: vec![z500.clone(), sst],
        outputs: vec![z500.clone()],
    };
    let forecast = engine.predict(&mut extrapolate, &store, init_times).unwrap();
    println!(
        "Forecast channels: {:?}",
        forecast.channels().iter().map(|c| c.label()).collect::<Vec<_>>()
    );

    let mut persistence = Persistence::new(vec![z500.clone()], 1);
    let baseline = engine.predict(&mut persistence, &store, init_times).unwrap();

    // 3. Verification and per-lead RMSE of 500 hPa height
    let verification = verification_from_series(&store, None, steps, 6).unwrap();
    let z_only = std::slice::from_ref(&z500);
    let model_rmse = score_trajectories(
        &forecast.select_channels(z_only).unwrap(),
        &verification,
        ErrorMethod::Rmse,
        None,
    )
    .unwrap();
    let persistence_rmse =
        score_trajectories(&baseline, &verification, ErrorMethod::Rmse, None).unwrap();
    let z_store = store.select_channels(z_only).unwrap();
    let climo_rmse = climo_error(z_store.data().into_dyn(), steps, ErrorMethod::Rmse, None).unwrap();

    println!(
        "\n{:>6} {:>12} {:>12} {:>12}",
        "lead", "extrapolate", "persistence", "climatology"
    );
    for f in 0..steps {
        println!(
            "{:>5}h {:>12.2} {:>12.2} {:>12.2}",
            6 * (f + 1),
            model_rmse[[f]],
            persistence_rmse[[f]],
            climo_rmse[[f]]
        );
    }
}
