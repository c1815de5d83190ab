//! Envelope detection, the core of an AM demodulator.
//!
//! Output is the instantaneous magnitude of the complex input.
//! Stateless, so the luma and color-subcarrier traces of the TV
//! receiver share this block with the AM audio path.
use crate::block::{Block, BlockRet};
use crate::stream::{Stream, Streamp};
use crate::{Complex, Float, Result};

/// Envelope detector block.
pub struct EnvelopeDetector {
    src: Streamp<Complex>,
    dst: Streamp<Float>,
}

impl EnvelopeDetector {
    /// Create a new envelope detector.
    pub fn new(src: Streamp<Complex>) -> (Self, Streamp<Float>) {
        let dst = Stream::newp();
        (
            Self {
                src,
                dst: dst.clone(),
            },
            dst,
        )
    }
}

impl Block for EnvelopeDetector {
    fn block_name(&self) -> &'static str {
        "EnvelopeDetector"
    }
    fn work(&mut self) -> Result<BlockRet> {
        let input = self.src.lock().unwrap().take();
        if input.is_empty() {
            return Ok(BlockRet::Noop);
        }
        let out: Vec<Float> = input.iter().map(|s| s.norm()).collect();
        self.dst.lock().unwrap().write_slice(&out);
        Ok(BlockRet::Again)
    }
}

/* vim: textwidth=80
 */
