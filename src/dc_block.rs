//! DC blocker.
//!
//! Subtracts a slowly tracked running mean (single pole estimator) so
//! that tuning offsets and demodulator bias do not ride into the audio
//! chain, without attenuating the passband.
use crate::block::{Block, BlockRet};
use crate::stream::{Stream, Streamp};
use crate::{Float, Result};

/// DC blocking block.
pub struct DcBlock {
    alpha: Float,
    mean: Float,
    src: Streamp<Float>,
    dst: Streamp<Float>,
}

impl DcBlock {
    /// Create a DC blocker with the default tracking constant.
    pub fn new(src: Streamp<Float>) -> (Self, Streamp<Float>) {
        Self::with_alpha(src, 0.001)
    }

    /// Create a DC blocker with a specific tracking constant, between
    /// 0 (frozen) and 1 (tracks every sample).
    pub fn with_alpha(src: Streamp<Float>, alpha: Float) -> (Self, Streamp<Float>) {
        let dst = Stream::newp();
        (
            Self {
                alpha: alpha.clamp(0.0, 1.0),
                mean: 0.0,
                src,
                dst: dst.clone(),
            },
            dst,
        )
    }

    fn process_one(&mut self, x: Float) -> Float {
        self.mean += self.alpha * (x - self.mean);
        x - self.mean
    }
}

impl Block for DcBlock {
    fn block_name(&self) -> &'static str {
        "DcBlock"
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

/* vim: textwidth=80
 */
