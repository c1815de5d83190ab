//! Source of a fixed vector of samples.
//!
//! Emits its data once, then EOFs. Mostly useful for tests and offline
//! runs.
use crate::Result;
use crate::block::{Block, BlockRet};
use crate::stream::{Stream, Streamp};

/// Vector source block.
pub struct VectorSource<T: Copy> {
    data: Option<Vec<T>>,
    dst: Streamp<T>,
}

impl<T: Copy> VectorSource<T> {
    /// Create new VectorSource block.
    pub fn new(data: Vec<T>) -> (Self, Streamp<T>) {
        let dst = Stream::newp();
        (
            Self {
                data: Some(data),
                dst: dst.clone(),
            },
            dst,
        )
    }
}

impl<T: Copy> Block for VectorSource<T> {
    fn block_name(&self) -> &'static str {
        "VectorSource"
    }
    fn work(&mut self) -> Result<BlockRet> {
        match self.data.take() {
            Some(v) => {
                self.dst.lock().unwrap().write_slice(&v);
                Ok(BlockRet::Again)
            }
            None => Ok(BlockRet::EOF),
        }
    }
}
/* vim: textwidth=80
 */
