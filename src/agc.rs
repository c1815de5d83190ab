/*! Automatic gain control.

A per-sample feedback loop drives the output envelope toward a target
level. The applied gain moves at the attack rate when the input gets
louder and at the (slower) decay rate as it recovers, and is hard
limited to a floor and ceiling. Output polarity is never inverted, and
sudden loud transients clamp rather than wrap.
*/
use crate::block::{Block, BlockRet};
use crate::stream::{Stream, Streamp};
use crate::{Float, Result};

/// AGC block.
pub struct Agc {
    target: Float,
    attack: Float,
    decay: Float,
    gain: Float,
    min_gain: Float,
    max_gain: Float,
    src: Streamp<Float>,
    dst: Streamp<Float>,
}

impl Agc {
    /// Create an AGC with broadcast-audio defaults.
    pub fn new(src: Streamp<Float>) -> (Self, Streamp<Float>) {
        Self::with_rates(src, 0.5, 0.01, 0.001)
    }

    /// Create an AGC with explicit target level, attack rate and decay
    /// rate.
    pub fn with_rates(
        src: Streamp<Float>,
        target: Float,
        attack: Float,
        decay: Float,
    ) -> (Self, Streamp<Float>) {
        let dst = Stream::newp();
        (
            Self {
                target,
                attack,
                decay,
                gain: 1.0,
                min_gain: 0.1,
                max_gain: 10.0,
                src,
                dst: dst.clone(),
            },
            dst,
        )
    }

    /// Current applied gain.
    pub fn gain(&self) -> Float {
        self.gain
    }

    fn process_one(&mut self, x: Float) -> Float {
        let amplitude = x.abs();
        if amplitude > 1e-6 {
            let error = self.target - amplitude * self.gain;
            // Getting louder (negative error) is corrected at the
            // attack rate, recovery at the decay rate.
            let rate = if error < 0.0 { self.attack } else { self.decay };
            self.gain *= 1.0 + rate * error;
            self.gain = self.gain.clamp(self.min_gain, self.max_gain);
        }
        (x * self.gain).clamp(-1.0, 1.0)
    }
}

impl Block for Agc {
    fn block_name(&self) -> &'static str {
        "Agc"
    }
    fn work(&mut self) -> Result<BlockRet> {
        let input = self.src.lock().unwrap().take();
        if input.is_empty() {
            return Ok(BlockRet::Noop);
        }
        let out: Vec<Float> = input.into_iter().map(|x| self.process_one(x)).collect();
        self.dst.lock().unwrap().write_slice(&out);
        Ok(BlockRet::Again)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rms(v: &[Float]) -> Float {
        (v.iter().map(|x| x * x).sum::<Float>() / v.len() as Float).sqrt()
    }

    /// A step increase in amplitude converges to the target within the
    /// attack window, without the gain ever passing its ceiling.
    #[test]
    fn step_converges() -> Result<()> {
        let src = Stream::newp();
        let (mut agc, out) = Agc::with_rates(src.clone(), 0.5, 0.05, 0.005);
        let tone = |amp: Float, n: usize| -> Vec<Float> {
            (0..n).map(|i| amp * (0.7 * i as Float).sin()).collect()
        };

        src.lock().unwrap().write_slice(&tone(0.5, 2000));
        agc.work()?;
        out.lock().unwrap().clear();

        // 4x louder step.
        src.lock().unwrap().write_slice(&tone(2.0, 3000));
        agc.work()?;
        let got = out.lock().unwrap().take();
        let settled = rms(&got[2000..]);
        // Unity gain would leave an RMS of ~1.41; the loop must pull
        // the envelope back to the neighborhood of the target.
        assert!(
            settled > 0.3 && settled < 0.48,
            "settled RMS {settled}, want near 0.5/√2"
        );
        assert!(agc.gain() > 0.15 && agc.gain() < 0.5, "gain {}", agc.gain());
        Ok(())
    }

    #[test]
    fn polarity_preserved_and_clamped() -> Result<()> {
        let src = Stream::newp();
        let (mut agc, out) = Agc::with_rates(src.clone(), 0.5, 0.01, 0.001);
        let input: Vec<Float> = (0..1000).map(|i| if i % 2 == 0 { 5.0 } else { -5.0 }).collect();
        src.lock().unwrap().write_slice(&input);
        agc.work()?;
        for (n, v) in out.lock().unwrap().take().iter().enumerate() {
            assert!(v.abs() <= 1.0, "sample {n} not clamped: {v}");
            if n % 2 == 0 {
                assert!(*v > 0.0, "sample {n} polarity flipped");
            } else {
                assert!(*v < 0.0, "sample {n} polarity flipped");
            }
        }
        Ok(())
    }

    #[test]
    fn silence_leaves_gain_alone() -> Result<()> {
        let src = Stream::newp();
        let (mut agc, _out) = Agc::new(src.clone());
        let g0 = agc.gain();
        src.lock().unwrap().write_slice(&[0.0f32; 100]);
        agc.work()?;
        assert_eq!(agc.gain(), g0);
        Ok(())
    }
}
/* vim: textwidth=80
 */
