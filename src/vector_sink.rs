//! Sink values into a vector.
//!
//! Mostly useful for unit tests: take what comes in on the stream and
//! append it to a shared vector the test can inspect.
use std::sync::{Arc, Mutex};

use crate::Result;
use crate::block::{Block, BlockRet};
use crate::stream::Streamp;

/// Vector sink block.
pub struct VectorSink<T: Copy> {
    src: Streamp<T>,
    storage: Arc<Mutex<Vec<T>>>,
}

impl<T: Copy> VectorSink<T> {
    /// Create new VectorSink block.
    pub fn new(src: Streamp<T>) -> Self {
        Self {
            src,
            storage: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Get a hook into the data that will be written.
    pub fn hook(&self) -> Arc<Mutex<Vec<T>>> {
        self.storage.clone()
    }
}

impl<T: Copy> Block for VectorSink<T> {
    fn block_name(&self) -> &'static str {
        "VectorSink"
    }
    fn work(&mut self) -> Result<BlockRet> {
        let input = self.src.lock().unwrap().take();
        if input.is_empty() {
            return Ok(BlockRet::Noop);
        }
        self.storage.lock().unwrap().extend(input);
        Ok(BlockRet::Again)
    }
}
/* vim: textwidth=80
 */
