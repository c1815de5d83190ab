/*! Rational resampler.

Converts sample rate by interp/decim: conceptually zero-insertion
upsampling by `interp`, an anti-alias low pass designed at the
upsampled rate, then keeping every `decim`'th sample. Implemented as a
polyphase filter so the zeros are never materialized.

The fractional timing position and the input history persist across
calls: output from many small blocks equals output from one large
block. That is the property everything downstream relies on.
*/
use crate::block::{Block, BlockRet};
use crate::fir::low_pass;
use crate::stream::{Stream, Streamp};
use crate::window::WindowType;
use crate::{Error, Float, Result};

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

/// Rational resampler block.
pub struct RationalResampler<T: Copy> {
    /// Prototype taps, scaled by `interp`, padded to a multiple of
    /// `interp`. Phase `p` uses taps `p, p + interp, p + 2*interp, ...`
    taps: Vec<Float>,
    taps_per_phase: usize,
    interp: usize,
    decim: usize,
    /// Position in the virtual upsampled stream, 0..interp.
    phase: usize,
    /// Carry of the input index past the last block's end.
    skip: usize,
    /// Last `taps_per_phase - 1` input samples, oldest first.
    history: Vec<T>,
    src: Streamp<T>,
    dst: Streamp<T>,
}

impl<T> RationalResampler<T>
where
    T: Copy + Default + std::ops::Mul<Float, Output = T> + std::ops::Add<Output = T>,
{
    /// Create a resampler converting by interp/decim. The ratio is
    /// reduced, so 48000/2000000 costs the same as 3/125.
    pub fn new(src: Streamp<T>, interp: usize, decim: usize) -> Result<(Self, Streamp<T>)> {
        if interp == 0 || decim == 0 {
            return Err(Error::InvalidConfig(
                "resampler factors must be positive".into(),
            ));
        }
        let g = gcd(interp, decim);
        let interp = interp / g;
        let decim = decim / g;

        // Anti-alias prototype at the virtual rate `interp`, cutting
        // at half the narrower of input and output bandwidth. The
        // trivial 1/1 ratio gets a short passthrough-ish filter rather
        // than a degenerate cutoff at Nyquist.
        let cutoff = 0.5 * (1.0f32).min(interp as Float / decim as Float) * 0.95;
        let taps = low_pass(
            interp as Float,
            cutoff,
            cutoff * 0.25,
            WindowType::Hamming,
        );
        let taps_per_phase = taps.len().div_ceil(interp);
        let mut taps: Vec<Float> = taps.iter().map(|t| t * interp as Float).collect();
        taps.resize(taps_per_phase * interp, 0.0);

        let dst = Stream::newp();
        Ok((
            Self {
                taps,
                taps_per_phase,
                interp,
                decim,
                phase: 0,
                skip: 0,
                history: vec![T::default(); taps_per_phase - 1],
                src,
                dst: dst.clone(),
            },
            dst,
        ))
    }

    /// Resample one block.
    pub fn resample_block(&mut self, input: &[T]) -> Vec<T> {
        if input.is_empty() {
            return Vec::new();
        }
        let tpp = self.taps_per_phase;
        let mut ext = Vec::with_capacity(self.history.len() + input.len());
        ext.extend_from_slice(&self.history);
        ext.extend_from_slice(input);
        let mut out = Vec::with_capacity(input.len() * self.interp / self.decim + 1);
        let mut i = self.skip;
        while i < input.len() {
            let mut acc = T::default();
            for t in 0..tpp {
                // Newest sample for this output is ext[i + tpp - 1].
                acc = acc + ext[i + tpp - 1 - t] * self.taps[self.phase + t * self.interp];
            }
            out.push(acc);
            self.phase += self.decim;
            i += self.phase / self.interp;
            self.phase %= self.interp;
        }
        self.skip = i - input.len();
        self.history = ext[ext.len() - (tpp - 1)..].to_vec();
        out
    }
}

impl<T> Block for RationalResampler<T>
where
    T: Copy + Default + std::ops::Mul<Float, Output = T> + std::ops::Add<Output = T>,
{
    fn block_name(&self) -> &'static str {
        "RationalResampler"
    }
    fn work(&mut self) -> Result<BlockRet> {
        let input = self.src.lock().unwrap().take();
        if input.is_empty() {
            return Ok(BlockRet::Noop);
        }
        let out = self.resample_block(&input);
        self.dst.lock().unwrap().write_slice(&out);
        Ok(BlockRet::Again)
    }
}

/* vim: textwidth=80
 */
