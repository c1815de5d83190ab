/*! Quadrature demod, the core of an FM demodulator.

Uses the per-pair product-and-angle form,
`angle(s[n] * conj(s[n-1]))`, which is immune to phase wrap artifacts.
The block-wide unwrap-then-difference alternative accumulates drift
under noise and is deliberately not used.
*/
use std::sync::Arc;

use crate::block::{Block, BlockRet};
use crate::config::PipelineConfig;
use crate::stream::{Stream, Streamp};
use crate::{Complex, Float, Result};

const PI: Float = std::f64::consts::PI as Float;

/// Calibrated discriminator gain for a deviation: one full deviation
/// maps to 1.0 output. 16 MHz at 5 kHz deviation gives ≈509.3.
pub fn fm_gain(samp_rate: Float, deviation: Float) -> Float {
    samp_rate / (2.0 * PI * deviation)
}

/// Quadrature demod block.
pub struct QuadratureDemod {
    gain: Float,
    last: Complex,
    deviation: Float,
    hook: Option<(Arc<PipelineConfig>, u32, u64)>,
    src: Streamp<Complex>,
    dst: Streamp<Float>,
}

impl QuadratureDemod {
    /// Create a new QuadratureDemod block with a fixed gain.
    ///
    /// Gain is just used to scale the value, and can be set to 1.0 if
    /// you don't care about the scale.
    pub fn new(src: Streamp<Complex>, gain: Float) -> (Self, Streamp<Float>) {
        let dst = Stream::newp();
        (
            Self {
                gain,
                last: Complex::default(),
                deviation: 0.0,
                hook: None,
                src,
                dst: dst.clone(),
            },
            dst,
        )
    }

    /// Create a demod calibrated for `deviation` Hz whose gain follows
    /// sample rate changes in the shared config. The stage rate is the
    /// config rate divided by `rate_divisor`.
    pub fn with_config(
        src: Streamp<Complex>,
        deviation: Float,
        cfg: Arc<PipelineConfig>,
        rate_divisor: u32,
    ) -> (Self, Streamp<Float>) {
        let rate = cfg.sample_rate() as Float / rate_divisor as Float;
        let version = cfg.version();
        let (mut q, dst) = Self::new(src, fm_gain(rate, deviation));
        q.deviation = deviation;
        q.hook = Some((cfg, rate_divisor, version));
        (q, dst)
    }

    fn process_one(&mut self, s: Complex) -> Float {
        let t = s * self.last.conj();
        self.last = s;
        self.gain * t.im.atan2(t.re)
    }

    fn maybe_regain(&mut self) {
        let Some((cfg, divisor, version)) = &mut self.hook else {
            return;
        };
        let v = cfg.version();
        if v != *version {
            *version = v;
            let rate = cfg.sample_rate() as Float / *divisor as Float;
            self.gain = fm_gain(rate, self.deviation);
        }
    }
}

impl Block for QuadratureDemod {
    fn block_name(&self) -> &'static str {
        "QuadratureDemod"
    }
    fn work(&mut self) -> Result<BlockRet> {
        self.maybe_regain();
        let input = self.src.lock().unwrap().take();
        if input.is_empty() {
            return Ok(BlockRet::Noop);
        }
        let out: Vec<Float> = input.into_iter().map(|s| self.process_one(s)).collect();
        self.dst.lock().unwrap().write_slice(&out);
        Ok(BlockRet::Again)
    }
}

/* vim: textwidth=80
 */
