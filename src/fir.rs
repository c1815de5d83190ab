/*! Finite impulse response filters.

Windowed-sinc designs plus a streaming convolution engine that persists
its delay line across blocks, so that chunking the input does not change
the output.
*/
use std::sync::Arc;

use log::{debug, warn};

use crate::block::{Block, BlockRet};
use crate::config::PipelineConfig;
use crate::stream::{Stream, Streamp};
use crate::window::WindowType;
use crate::{Error, Float, Result};

const PI: Float = std::f64::consts::PI as Float;

/// Number of taps needed for a given transition width, given the
/// window's attenuation. Forced odd so the filter has a center tap.
fn compute_ntaps(samp_rate: Float, twidth: Float, window: WindowType) -> usize {
    let a = window.max_attenuation();
    let t = ((a * samp_rate / (22.0 * twidth)) as usize).max(3);
    if t & 1 == 0 { t + 1 } else { t }
}

/// Create taps for a low pass filter, normalized for unity DC gain.
pub fn low_pass(samp_rate: Float, cutoff: Float, twidth: Float, window: WindowType) -> Vec<Float> {
    let ntaps = compute_ntaps(samp_rate, twidth, window);
    let win = window.make_window(ntaps);
    let m = (ntaps - 1) / 2;
    let fwt0 = 2.0 * PI * cutoff / samp_rate;
    let taps: Vec<Float> = win
        .iter()
        .enumerate()
        .map(|(nm, w)| {
            let n = nm as i64 - m as i64;
            let nf = n as Float;
            if n == 0 {
                fwt0 / PI * w
            } else {
                (nf * fwt0).sin() / (nf * PI) * w
            }
        })
        .collect();
    let gain = {
        let mut fmax = taps[m];
        for n in 1..=m {
            fmax += 2.0 * taps[n + m];
        }
        1.0 / fmax
    };
    taps.into_iter().map(|t| t * gain).collect()
}

/// Create taps for a band pass filter as the difference of two sincs,
/// normalized for unity gain at the center frequency. DC gain is zero
/// by construction.
pub fn band_pass(
    samp_rate: Float,
    center: Float,
    half_width: Float,
    twidth: Float,
    window: WindowType,
) -> Vec<Float> {
    let ntaps = compute_ntaps(samp_rate, twidth, window);
    let win = window.make_window(ntaps);
    let m = (ntaps - 1) / 2;
    let w_lo = 2.0 * PI * (center - half_width) / samp_rate;
    let w_hi = 2.0 * PI * (center + half_width) / samp_rate;
    let taps: Vec<Float> = win
        .iter()
        .enumerate()
        .map(|(nm, w)| {
            let n = nm as i64 - m as i64;
            let nf = n as Float;
            if n == 0 {
                (w_hi - w_lo) / PI * w
            } else {
                ((nf * w_hi).sin() - (nf * w_lo).sin()) / (nf * PI) * w
            }
        })
        .collect();
    let wc = 2.0 * PI * center / samp_rate;
    let gain = {
        let mut g = 0.0;
        for (nm, t) in taps.iter().enumerate() {
            g += t * ((nm as i64 - m as i64) as Float * wc).cos();
        }
        1.0 / g
    };
    taps.into_iter().map(|t| t * gain).collect()
}

/// Which shape of filter a [`FilterSpec`] describes.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterKind {
    /// Low pass with the given cutoff.
    LowPass {
        /// Cutoff frequency in Hz.
        cutoff: Float,
    },
    /// Band pass around a center frequency.
    BandPass {
        /// Center frequency in Hz.
        center: Float,
        /// Half bandwidth in Hz.
        half_width: Float,
    },
}

/// Everything needed to (re)compute a filter's taps.
///
/// A spec is an immutable value; a sample rate change produces a new
/// spec via [`FilterSpec::with_sample_rate`], and [`FilterSpec::taps`]
/// validates before any coefficient is computed, so a bad
/// reconfiguration can be rejected while the previous taps stay active.
#[derive(Clone, Debug, PartialEq)]
pub struct FilterSpec {
    /// Filter shape.
    pub kind: FilterKind,
    /// Sample rate this filter runs at, in Hz.
    pub samp_rate: Float,
    /// Transition width in Hz.
    pub twidth: Float,
    /// Window function.
    pub window: WindowType,
}

impl FilterSpec {
    /// Spec for a low pass filter.
    pub fn low_pass(samp_rate: Float, cutoff: Float, twidth: Float, window: WindowType) -> Self {
        Self {
            kind: FilterKind::LowPass { cutoff },
            samp_rate,
            twidth,
            window,
        }
    }

    /// Spec for a band pass filter.
    pub fn band_pass(
        samp_rate: Float,
        center: Float,
        half_width: Float,
        twidth: Float,
        window: WindowType,
    ) -> Self {
        Self {
            kind: FilterKind::BandPass { center, half_width },
            samp_rate,
            twidth,
            window,
        }
    }

    /// Same spec at a different sample rate.
    pub fn with_sample_rate(&self, samp_rate: Float) -> Self {
        Self {
            samp_rate,
            ..self.clone()
        }
    }

    /// Validate the spec and compute its taps.
    pub fn taps(&self) -> Result<Vec<Float>> {
        let nyquist = self.samp_rate / 2.0;
        if !(self.samp_rate > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "sample rate {} must be positive",
                self.samp_rate
            )));
        }
        if !(self.twidth > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "transition width {} must be positive",
                self.twidth
            )));
        }
        match self.kind {
            FilterKind::LowPass { cutoff } => {
                if !(cutoff > 0.0) || cutoff >= nyquist {
                    return Err(Error::InvalidConfig(format!(
                        "cutoff {cutoff} must be within (0, {nyquist})"
                    )));
                }
                Ok(low_pass(self.samp_rate, cutoff, self.twidth, self.window))
            }
            FilterKind::BandPass { center, half_width } => {
                if !(half_width > 0.0) || !(center - half_width > 0.0) {
                    return Err(Error::InvalidConfig(format!(
                        "band {center}±{half_width} must not reach DC"
                    )));
                }
                if center + half_width >= nyquist {
                    return Err(Error::InvalidConfig(format!(
                        "band {center}±{half_width} must stay under {nyquist}"
                    )));
                }
                Ok(band_pass(
                    self.samp_rate,
                    center,
                    half_width,
                    self.twidth,
                    self.window,
                ))
            }
        }
    }
}

/// Streaming FIR convolution engine with optional decimation.
///
/// The delay line and the decimation phase persist across calls, so
/// feeding the same samples in any chunking yields the same output.
pub struct Fir<T> {
    /// Taps, stored reversed for a straight dot product.
    taps: Vec<Float>,
    /// The last `ntaps - 1` input samples, oldest first.
    history: Vec<T>,
    decim: usize,
    skip: usize,
}

impl<T> Fir<T>
where
    T: Copy + Default + std::ops::Mul<Float, Output = T> + std::ops::Add<Output = T>,
{
    /// Create a new engine. `decim` of 1 means no decimation.
    pub fn new(taps: &[Float], decim: usize) -> Self {
        Self {
            taps: taps.iter().rev().copied().collect(),
            history: vec![T::default(); taps.len() - 1],
            decim: decim.max(1),
            skip: 0,
        }
    }

    /// Number of taps.
    pub fn ntaps(&self) -> usize {
        self.taps.len()
    }

    fn dot(&self, window: &[T]) -> T {
        window
            .iter()
            .zip(self.taps.iter())
            .fold(T::default(), |acc, (x, t)| acc + *x * *t)
    }

    /// Filter (and decimate) one block of input.
    pub fn filter_block(&mut self, input: &[T]) -> Vec<T> {
        if input.is_empty() {
            return Vec::new();
        }
        let ntaps = self.taps.len();
        let mut ext = Vec::with_capacity(self.history.len() + input.len());
        ext.extend_from_slice(&self.history);
        ext.extend_from_slice(input);
        let mut out = Vec::with_capacity(input.len() / self.decim + 1);
        let mut i = self.skip;
        while i < input.len() {
            out.push(self.dot(&ext[i..i + ntaps]));
            i += self.decim;
        }
        self.skip = i - input.len();
        self.history = ext[ext.len() - (ntaps - 1)..].to_vec();
        out
    }

    /// Swap in new taps without corrupting in-flight history.
    ///
    /// The overlapping part of the delay line is preserved. If the new
    /// filter is longer, only the non-overlapping oldest part is
    /// zero-filled, a small accepted discontinuity.
    pub fn retap(&mut self, taps: &[Float]) {
        let keep = taps.len() - 1;
        let n = keep.min(self.history.len());
        let mut history = vec![T::default(); keep];
        history[keep - n..].copy_from_slice(&self.history[self.history.len() - n..]);
        self.history = history;
        self.taps = taps.iter().rev().copied().collect();
    }
}

/// Hook for deriving a stage's rate from the shared config.
pub(crate) struct ConfigHook {
    pub(crate) cfg: Arc<PipelineConfig>,
    /// This stage runs at `config sample rate / rate_divisor`.
    pub(crate) rate_divisor: u32,
    pub(crate) version: u64,
}

impl ConfigHook {
    /// The stage's own sample rate if the config version moved since
    /// the last call, else None.
    pub(crate) fn changed_rate(&mut self) -> Option<Float> {
        let version = self.cfg.version();
        if version == self.version {
            return None;
        }
        self.version = version;
        Some(self.cfg.sample_rate() as Float / self.rate_divisor as Float)
    }
}

/// Finite impulse response filter block.
pub struct FirFilter<T: Copy> {
    fir: Fir<T>,
    spec: FilterSpec,
    hook: Option<ConfigHook>,
    src: Streamp<T>,
    dst: Streamp<T>,
}

impl<T> FirFilter<T>
where
    T: Copy + Default + std::ops::Mul<Float, Output = T> + std::ops::Add<Output = T>,
{
    /// Create a FIR filter block from a spec.
    pub fn new(src: Streamp<T>, spec: FilterSpec, decim: usize) -> Result<(Self, Streamp<T>)> {
        let taps = spec.taps()?;
        let dst = Stream::newp();
        Ok((
            Self {
                fir: Fir::new(&taps, decim),
                spec,
                hook: None,
                src,
                dst: dst.clone(),
            },
            dst,
        ))
    }

    /// Create a FIR filter block that follows sample rate changes in
    /// the shared config. The stage's own rate is the config rate
    /// divided by `rate_divisor` (upstream decimation).
    pub fn with_config(
        src: Streamp<T>,
        spec: FilterSpec,
        decim: usize,
        cfg: Arc<PipelineConfig>,
        rate_divisor: u32,
    ) -> Result<(Self, Streamp<T>)> {
        let version = cfg.version();
        let (mut f, dst) = Self::new(src, spec, decim)?;
        f.hook = Some(ConfigHook {
            cfg,
            rate_divisor,
            version,
        });
        Ok((f, dst))
    }

    /// Current taps, in engine order. For inspection and tests.
    pub fn taps(&self) -> &[Float] {
        &self.fir.taps
    }

    /// If the config moved, recompute taps from the spec template.
    /// A spec that fails validation is rejected and the previous taps
    /// stay active.
    fn maybe_respec(&mut self) {
        let Some(hook) = &mut self.hook else {
            return;
        };
        let Some(rate) = hook.changed_rate() else {
            return;
        };
        let spec = self.spec.with_sample_rate(rate);
        match spec.taps() {
            Ok(taps) => {
                debug!("filter retapped for rate {rate}: {} taps", taps.len());
                self.fir.retap(&taps);
                self.spec = spec;
            }
            Err(e) => warn!("filter respec rejected, keeping previous taps: {e}"),
        }
    }
}

impl<T> Block for FirFilter<T>
where
    T: Copy + Default + std::ops::Mul<Float, Output = T> + std::ops::Add<Output = T>,
{
    fn block_name(&self) -> &'static str {
        "FirFilter"
    }
    fn work(&mut self) -> Result<BlockRet> {
        self.maybe_respec();
        let input = self.src.lock().unwrap().take();
        if input.is_empty() {
            return Ok(BlockRet::Noop);
        }
        let out = self.fir.filter_block(&input);
        self.dst.lock().unwrap().write_slice(&out);
        Ok(BlockRet::Again)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::tests::assert_almost_equal_float;

    #[test]
    fn small_convolution() {
        let mut fir: Fir<Float> = Fir::new(&[0.5, 0.25], 1);
        let out = fir.filter_block(&[1.0, 2.0, 3.0, 4.0]);
        assert_almost_equal_float(&out, &[0.5, 1.25, 2.0, 2.75]);
    }

    #[test]
    fn chunking_invariant() {
        let taps = low_pass(48000.0, 8000.0, 4000.0, WindowType::Hamming);
        let input: Vec<Float> = (0..300)
            .map(|n| (2.0 * PI * 440.0 * n as Float / 48000.0).sin())
            .collect();
        let mut whole: Fir<Float> = Fir::new(&taps, 3);
        let want = whole.filter_block(&input);
        let mut chunked: Fir<Float> = Fir::new(&taps, 3);
        let mut got = Vec::new();
        for chunk in input.chunks(7) {
            got.extend(chunked.filter_block(chunk));
        }
        assert_almost_equal_float(&got, &want);
    }

    #[test]
    fn low_pass_unity_dc() {
        let taps = low_pass(10000.0, 1000.0, 1000.0, WindowType::Hamming);
        assert_eq!(taps.len() % 2, 1);
        let sum: Float = taps.iter().sum();
        assert!((sum - 1.0).abs() < 1e-3, "DC gain {sum}");
    }

    #[test]
    fn band_pass_rejects_dc() {
        let taps = band_pass(16e6, 4.43e6, 0.6e6, 0.2e6, WindowType::Hamming);
        let dc: Float = taps.iter().sum();
        assert!(dc.abs() < 1e-2, "DC gain {dc}");
        // Unity at center.
        let m = (taps.len() - 1) / 2;
        let wc = 2.0 * PI * 4.43e6 / 16e6;
        let g: Float = taps
            .iter()
            .enumerate()
            .map(|(n, t)| t * ((n as i64 - m as i64) as Float * wc).cos())
            .sum();
        assert!((g - 1.0).abs() < 1e-3, "center gain {g}");
    }

    #[test]
    fn invalid_cutoff_rejected() {
        assert!(
            FilterSpec::low_pass(48000.0, 24000.0, 1000.0, WindowType::Hamming)
                .taps()
                .is_err()
        );
        assert!(
            FilterSpec::low_pass(48000.0, -1.0, 1000.0, WindowType::Hamming)
                .taps()
                .is_err()
        );
        assert!(
            FilterSpec::band_pass(48000.0, 20000.0, 5000.0, 1000.0, WindowType::Hamming)
                .taps()
                .is_err()
        );
        assert!(
            FilterSpec::low_pass(48000.0, 10000.0, 1000.0, WindowType::Hamming)
                .taps()
                .is_ok()
        );
    }

    #[test]
    fn respec_rollback_keeps_taps() -> Result<()> {
        let cfg = Arc::new(PipelineConfig::new(Settings {
            sample_rate: 1_000_000,
            ..Settings::default()
        }));
        let src = Stream::from_slice(&[0.0f32; 16]);
        let spec = FilterSpec::low_pass(1e6, 100_000.0, 25_000.0, WindowType::Hamming);
        let (mut f, _out) = FirFilter::with_config(src.clone(), spec, 1, cfg.clone(), 1)?;
        let before = f.taps().to_vec();

        // 150 kHz makes the 100 kHz cutoff supra-Nyquist: rejected,
        // previous taps stay.
        cfg.set_sample_rate(150_000)?;
        f.work()?;
        assert_eq!(f.taps(), &before[..]);

        // A valid rate change recomputes.
        cfg.set_sample_rate(2_000_000)?;
        src.lock().unwrap().write_slice(&[0.0f32; 16]);
        f.work()?;
        assert_ne!(f.taps(), &before[..]);
        Ok(())
    }
}
/* vim: textwidth=80
 */
