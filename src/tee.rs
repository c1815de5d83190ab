//! Tee a stream into two.
//!
//! Every input sample is copied into each output stream.
use crate::Result;
use crate::block::{Block, BlockRet};
use crate::stream::{Stream, Streamp};

/// Tee block.
pub struct Tee<T: Copy> {
    src: Streamp<T>,
    dst1: Streamp<T>,
    dst2: Streamp<T>,
}

impl<T: Copy> Tee<T> {
    /// Create a new Tee block.
    pub fn new(src: Streamp<T>) -> (Self, Streamp<T>, Streamp<T>) {
        let dst1 = Stream::newp();
        let dst2 = Stream::newp();
        (
            Self {
                src,
                dst1: dst1.clone(),
                dst2: dst2.clone(),
            },
            dst1,
            dst2,
        )
    }
}

impl<T: Copy> Block for Tee<T> {
    fn block_name(&self) -> &'static str {
        "Tee"
    }
    fn work(&mut self) -> Result<BlockRet> {
        let input = self.src.lock().unwrap().take();
        if input.is_empty() {
            return Ok(BlockRet::Noop);
        }
        self.dst1.lock().unwrap().write_slice(&input);
        self.dst2.lock().unwrap().write_slice(&input);
        Ok(BlockRet::Again)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_sides_get_everything() -> Result<()> {
        let src = Stream::from_slice(&[1u8, 2, 3]);
        let (mut tee, a, b) = Tee::new(src);
        tee.work()?;
        assert_eq!(a.lock().unwrap().take(), vec![1, 2, 3]);
        assert_eq!(b.lock().unwrap().take(), vec![1, 2, 3]);
        Ok(())
    }
}
/* vim: textwidth=80
 */
