//! Scalar gain and offset stages.
use std::sync::Arc;

use crate::block::{Block, BlockRet};
use crate::config::PipelineConfig;
use crate::stream::{Stream, Streamp};
use crate::{Float, Result};

/// Multiply every sample by a scale and add an offset.
pub struct GainOffset {
    scale: Float,
    offset: Float,
    src: Streamp<Float>,
    dst: Streamp<Float>,
}

impl GainOffset {
    /// Create a new GainOffset block.
    pub fn new(src: Streamp<Float>, scale: Float, offset: Float) -> (Self, Streamp<Float>) {
        let dst = Stream::newp();
        (
            Self {
                scale,
                offset,
                src,
                dst: dst.clone(),
            },
            dst,
        )
    }
}

impl Block for GainOffset {
    fn block_name(&self) -> &'static str {
        "GainOffset"
    }
    fn work(&mut self) -> Result<BlockRet> {
        let input = self.src.lock().unwrap().take();
        if input.is_empty() {
            return Ok(BlockRet::Noop);
        }
        let out: Vec<Float> = input.iter().map(|x| x * self.scale + self.offset).collect();
        self.dst.lock().unwrap().write_slice(&out);
        Ok(BlockRet::Again)
    }
}

/// Audio volume stage: the scale comes from the shared config, read
/// once per block.
pub struct Volume {
    cfg: Arc<PipelineConfig>,
    src: Streamp<Float>,
    dst: Streamp<Float>,
}

impl Volume {
    /// Create a new Volume block.
    pub fn new(src: Streamp<Float>, cfg: Arc<PipelineConfig>) -> (Self, Streamp<Float>) {
        let dst = Stream::newp();
        (
            Self {
                cfg,
                src,
                dst: dst.clone(),
            },
            dst,
        )
    }
}

impl Block for Volume {
    fn block_name(&self) -> &'static str {
        "Volume"
    }
    fn work(&mut self) -> Result<BlockRet> {
        let volume = self.cfg.volume();
        let input = self.src.lock().unwrap().take();
        if input.is_empty() {
            return Ok(BlockRet::Noop);
        }
        let out: Vec<Float> = input.iter().map(|x| x * volume).collect();
        self.dst.lock().unwrap().write_slice(&out);
        Ok(BlockRet::Again)
    }
}

/* vim: textwidth=80
 */
