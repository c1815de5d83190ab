/*! Frequency translating FIR filter.

Mixes a sub-band (an audio or color subcarrier, say) down to baseband
with a complex local oscillator, then low passes and decimates toward
the narrowband rate the sub-band needs.

The oscillator's phase accumulator is continuous across block
boundaries: block N+1 starts exactly where block N left off, mod 2π.
Anything else puts an audible click at every block seam.
*/
use std::sync::Arc;

use log::warn;
use num_complex::Complex64;

use crate::block::{Block, BlockRet};
use crate::config::PipelineConfig;
use crate::fir::{ConfigHook, FilterSpec, Fir};
use crate::stream::{Stream, Streamp};
use crate::{Complex, Float, Result};

const TAU: f64 = std::f64::consts::TAU;

/// Frequency translating, decimating FIR filter block.
pub struct FreqXlating {
    fir: Fir<Complex>,
    spec: FilterSpec,
    offset: Float,
    /// Phase accumulator, in radians. f64 so that hours of streaming
    /// do not accumulate audible error.
    phase: f64,
    phase_inc: f64,
    hook: Option<ConfigHook>,
    src: Streamp<Complex>,
    dst: Streamp<Complex>,
}

impl FreqXlating {
    /// Create a translator that shifts `offset` Hz down to DC, then
    /// applies the low pass described by `spec` while decimating.
    pub fn new(
        src: Streamp<Complex>,
        spec: FilterSpec,
        offset: Float,
        decim: usize,
    ) -> Result<(Self, Streamp<Complex>)> {
        let taps = spec.taps()?;
        let dst = Stream::newp();
        Ok((
            Self {
                fir: Fir::new(&taps, decim),
                phase: 0.0,
                phase_inc: -TAU * offset as f64 / spec.samp_rate as f64,
                spec,
                offset,
                hook: None,
                src,
                dst: dst.clone(),
            },
            dst,
        ))
    }

    /// Create a translator that follows sample rate changes in the
    /// shared config: both the oscillator increment and the filter
    /// taps are re-derived when the config version moves. The stage's
    /// own rate is the config rate divided by `rate_divisor`.
    pub fn with_config(
        src: Streamp<Complex>,
        spec: FilterSpec,
        offset: Float,
        decim: usize,
        cfg: Arc<PipelineConfig>,
        rate_divisor: u32,
    ) -> Result<(Self, Streamp<Complex>)> {
        let version = cfg.version();
        let (mut x, dst) = Self::new(src, spec, offset, decim)?;
        x.hook = Some(ConfigHook {
            cfg,
            rate_divisor,
            version,
        });
        Ok((x, dst))
    }

    /// If the config moved, recompute the oscillator increment and the
    /// taps for the new rate. An invalid respec is rejected and the
    /// previous state stays active, keeping the two consistent.
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
                self.fir.retap(&taps);
                self.phase_inc = -TAU * self.offset as f64 / rate as f64;
                self.spec = spec;
            }
            Err(e) => warn!("translator respec rejected, keeping previous state: {e}"),
        }
    }

    fn mix(&mut self, input: &[Complex]) -> Vec<Complex> {
        let mut out = Vec::with_capacity(input.len());
        for x in input {
            let lo = Complex64::from_polar(1.0, self.phase);
            out.push(Complex::new(
                (x.re as f64 * lo.re - x.im as f64 * lo.im) as Float,
                (x.re as f64 * lo.im + x.im as f64 * lo.re) as Float,
            ));
            self.phase = (self.phase + self.phase_inc) % TAU;
        }
        out
    }
}

impl Block for FreqXlating {
    fn block_name(&self) -> &'static str {
        "FreqXlating"
    }
    fn work(&mut self) -> Result<BlockRet> {
        self.maybe_respec();
        let input = self.src.lock().unwrap().take();
        if input.is_empty() {
            return Ok(BlockRet::Noop);
        }
        let mixed = self.mix(&input);
        let out = self.fir.filter_block(&mixed);
        self.dst.lock().unwrap().write_slice(&out);
        Ok(BlockRet::Again)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::assert_almost_equal_complex;
    use crate::window::WindowType;

    fn tone(rate: Float, freq: Float, n: usize) -> Vec<Complex> {
        (0..n)
            .map(|i| {
                let ph = TAU * freq as f64 * i as f64 / rate as f64;
                Complex::new(ph.cos() as Float, ph.sin() as Float)
            })
            .collect()
    }

    /// Chunked processing must equal one-shot processing: the phase
    /// accumulator and filter history carry across blocks.
    #[test]
    fn phase_continuous_across_blocks() -> Result<()> {
        let rate = 256_000.0;
        let input = tone(rate, 50_000.0, 2000);
        let spec = FilterSpec::low_pass(rate, 20_000.0, 10_000.0, WindowType::Hamming);

        let src = Stream::from_slice(&input);
        let (mut whole, out) = FreqXlating::new(src, spec.clone(), 50_000.0, 4)?;
        whole.work()?;
        let want = out.lock().unwrap().take();

        let src = Stream::newp();
        let (mut chunked, out) = FreqXlating::new(src.clone(), spec, 50_000.0, 4)?;
        let mut got = Vec::new();
        for chunk in input.chunks(333) {
            src.lock().unwrap().write_slice(chunk);
            chunked.work()?;
            got.extend(out.lock().unwrap().take());
        }
        assert_almost_equal_complex(&got, &want);
        Ok(())
    }

    /// A tone at the translation offset lands at DC.
    #[test]
    fn offset_tone_lands_at_dc() -> Result<()> {
        let rate = 256_000.0;
        let input = tone(rate, 50_000.0, 4000);
        let spec = FilterSpec::low_pass(rate, 20_000.0, 10_000.0, WindowType::Hamming);
        let src = Stream::from_slice(&input);
        let (mut x, out) = FreqXlating::new(src, spec, 50_000.0, 4)?;
        x.work()?;
        let out = out.lock().unwrap().take();
        // Skip the filter transient, then the translated tone should
        // be a near constant phasor of magnitude ~1.
        for s in &out[200..] {
            assert!((s.norm() - 1.0).abs() < 0.05, "magnitude {}", s.norm());
        }
        let drift = (out[out.len() - 1] * out[200].conj()).arg().abs();
        assert!(drift < 0.1, "residual rotation {drift}");
        Ok(())
    }

    /// A sample rate change must re-derive both the oscillator
    /// increment and the taps; an invalid change must leave both
    /// untouched.
    #[test]
    fn respec_follows_sample_rate() -> Result<()> {
        use crate::config::{PipelineConfig, Settings};
        use std::sync::Arc;

        let cfg = Arc::new(PipelineConfig::new(Settings {
            sample_rate: 256_000,
            ..Settings::default()
        }));
        let src = Stream::newp();
        let spec = FilterSpec::low_pass(256_000.0, 20_000.0, 10_000.0, WindowType::Hamming);
        let (mut x, _out) = FreqXlating::with_config(src.clone(), spec, 50_000.0, 4, cfg.clone(), 1)?;
        let inc_before = x.phase_inc;
        let ntaps_before = x.fir.ntaps();

        // Doubling the rate halves the per-sample phase step and
        // lengthens the filter.
        cfg.set_sample_rate(512_000)?;
        src.lock().unwrap().write_slice(&tone(512_000.0, 50_000.0, 16));
        x.work()?;
        assert!((x.phase_inc - inc_before / 2.0).abs() < 1e-12);
        assert!(x.fir.ntaps() > ntaps_before);

        // 30 kHz puts the 20 kHz cutoff past Nyquist: rejected, both
        // the increment and the taps stay.
        let inc_valid = x.phase_inc;
        let ntaps_valid = x.fir.ntaps();
        cfg.set_sample_rate(30_000)?;
        x.work()?;
        assert_eq!(x.phase_inc, inc_valid);
        assert_eq!(x.fir.ntaps(), ntaps_valid);
        Ok(())
    }
}
/* vim: textwidth=80
 */
