//! End to end FM receive chain test: modulate a tone, run it through
//! the full receiver graph, and check the tone comes back out.
use std::sync::Arc;

use rfpipe::blocks::{VectorSink, VectorSource};
use rfpipe::config::{PipelineConfig, Settings};
use rfpipe::graph::Graph;
use rfpipe::pipeline::fm_receiver;
use rfpipe::{Complex, Float, Result};

const TAU: f64 = std::f64::consts::TAU;

/// FM modulate a single tone.
fn fm_modulate(samp_rate: f64, tone: f64, deviation: f64, n: usize) -> Vec<Complex> {
    let mut phase = 0.0f64;
    (0..n)
        .map(|i| {
            let t = i as f64 / samp_rate;
            let m = (TAU * tone * t).sin();
            phase = (phase + TAU * deviation * m / samp_rate) % TAU;
            Complex::new(phase.cos() as Float, phase.sin() as Float)
        })
        .collect()
}

/// Frequency estimate from zero crossings.
fn estimate_tone_hz(samples: &[Float], samp_rate: Float) -> Float {
    let crossings = samples
        .windows(2)
        .filter(|pair| pair[0] * pair[1] < 0.0)
        .count();
    crossings as Float * samp_rate / (2.0 * samples.len() as Float)
}

#[test]
fn tone_survives_the_whole_chain() -> Result<()> {
    let samp_rate = 250_000u32;
    let audio_rate = 48_000u32;
    let tone: Float = 1_000.0;

    let cfg = Arc::new(PipelineConfig::new(Settings {
        sample_rate: samp_rate,
        ..Default::default()
    }));

    // 0.1 seconds of broadcast FM.
    let iq = fm_modulate(samp_rate as f64, tone as f64, 75_000.0, 25_000);

    let mut g = Graph::new();
    let (src, prev) = VectorSource::new(iq);
    g.add(Box::new(src));
    let audio = fm_receiver(&mut g, prev, samp_rate as Float, audio_rate, cfg)?;
    let sink = VectorSink::new(audio);
    let hook = sink.hook();
    g.add(Box::new(sink));
    g.run()?;

    let out = hook.lock().unwrap().clone();
    assert!(out.len() > 4_000, "too little audio: {}", out.len());

    // Drop the filter and AGC settle transient before measuring.
    let settled = &out[500..];
    let estimate = estimate_tone_hz(settled, audio_rate as Float);
    assert!(
        (estimate - tone).abs() < tone * 0.1,
        "recovered tone at {estimate} Hz, wanted ~{tone} Hz"
    );

    // The tone should carry real energy, not numerical dust.
    let rms = (settled.iter().map(|x| x * x).sum::<Float>() / settled.len() as Float).sqrt();
    assert!(rms > 0.05, "audio suspiciously quiet: rms {rms}");
    Ok(())
}

#[test]
fn tone_survives_noise() -> Result<()> {
    use rand::Rng;
    let samp_rate = 250_000u32;
    let audio_rate = 48_000u32;
    let tone: Float = 1_000.0;

    let cfg = Arc::new(PipelineConfig::new(Settings {
        sample_rate: samp_rate,
        ..Default::default()
    }));

    let mut rng = rand::rng();
    let iq: Vec<Complex> = fm_modulate(samp_rate as f64, tone as f64, 75_000.0, 25_000)
        .into_iter()
        .map(|s| {
            s + Complex::new(
                rng.random_range(-0.05..0.05),
                rng.random_range(-0.05..0.05),
            )
        })
        .collect();

    let mut g = Graph::new();
    let (src, prev) = VectorSource::new(iq);
    g.add(Box::new(src));
    let audio = fm_receiver(&mut g, prev, samp_rate as Float, audio_rate, cfg)?;
    let sink = VectorSink::new(audio);
    let hook = sink.hook();
    g.add(Box::new(sink));
    g.run()?;

    let out = hook.lock().unwrap().clone();
    // Light smoothing so residual noise can't double count crossings;
    // a 5 tap average barely touches a 1 kHz tone at 48 kHz.
    let smoothed: Vec<Float> = out[500..]
        .windows(5)
        .map(|w| w.iter().sum::<Float>() / 5.0)
        .collect();
    let estimate = estimate_tone_hz(&smoothed, audio_rate as Float);
    assert!(
        (estimate - tone).abs() < tone * 0.15,
        "recovered tone at {estimate} Hz under noise, wanted ~{tone} Hz"
    );
    Ok(())
}
/* vim: textwidth=80
 */
