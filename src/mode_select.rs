/*! Runtime demodulator selection.

Routes exactly one demodulator's output downstream, based on the mode
in the shared config. The mode is read once per `work()` call, so a
switch applies at the next whole block boundary: no block ever mixes
samples from both paths, and there is no crossfade. The unselected
path's samples are discarded, never averaged in.
*/
use std::sync::Arc;

use crate::block::{Block, BlockRet};
use crate::config::{DemodMode, PipelineConfig};
use crate::stream::{Stream, Streamp};
use crate::{Float, Result};

/// Exclusive routing between the FM and AM demodulator outputs.
pub struct ModeSelect {
    fm: Streamp<Float>,
    am: Streamp<Float>,
    cfg: Arc<PipelineConfig>,
    dst: Streamp<Float>,
}

impl ModeSelect {
    /// Create a selector over the two demodulated streams.
    pub fn new(
        fm: Streamp<Float>,
        am: Streamp<Float>,
        cfg: Arc<PipelineConfig>,
    ) -> (Self, Streamp<Float>) {
        let dst = Stream::newp();
        (
            Self {
                fm,
                am,
                cfg,
                dst: dst.clone(),
            },
            dst,
        )
    }
}

impl Block for ModeSelect {
    fn block_name(&self) -> &'static str {
        "ModeSelect"
    }
    fn work(&mut self) -> Result<BlockRet> {
        let mode = self.cfg.mode();
        let fm = self.fm.lock().unwrap().take();
        let am = self.am.lock().unwrap().take();
        let selected = match mode {
            DemodMode::Fm => fm,
            DemodMode::Am => am,
        };
        if selected.is_empty() {
            return Ok(BlockRet::Noop);
        }
        self.dst.lock().unwrap().write_slice(&selected);
        Ok(BlockRet::Again)
    }
}

/* vim: textwidth=80
 */
