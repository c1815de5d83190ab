//! Discard anything written to this block.
use crate::Result;
use crate::block::{Block, BlockRet};
use crate::stream::Streamp;

/// Discard anything written to this block.
pub struct NullSink<T: Copy> {
    src: Streamp<T>,
}

impl<T: Copy> NullSink<T> {
    /// Create new NullSink block.
    pub fn new(src: Streamp<T>) -> Self {
        Self { src }
    }
}

impl<T: Copy> Block for NullSink<T> {
    fn block_name(&self) -> &'static str {
        "NullSink"
    }
    fn work(&mut self) -> Result<BlockRet> {
        let mut s = self.src.lock().unwrap();
        if s.is_empty() {
            return Ok(BlockRet::Noop);
        }
        s.clear();
        Ok(BlockRet::Again)
    }
}
/* vim: textwidth=80
 */
