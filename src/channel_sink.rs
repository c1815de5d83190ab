/*! Best-effort block copies over a channel.

Display collaborators (waterfall, TV screen, scope) live outside the
pipeline and must never stall it. This sink hands whole blocks to a
bounded channel with `try_send`: if the consumer is slow the block is
dropped, and if the consumer is gone the sink keeps discarding input
quietly. Audio never waits on a display.
*/
use std::sync::mpsc::{Receiver, SyncSender, TrySendError, sync_channel};

use log::trace;

use crate::Result;
use crate::block::{Block, BlockRet};
use crate::stream::Streamp;

/// Best-effort channel sink block.
pub struct ChannelSink<T: Copy> {
    src: Streamp<T>,
    sender: SyncSender<Vec<T>>,
}

impl<T: Copy> ChannelSink<T> {
    /// Create a sink feeding an existing channel.
    pub fn new(src: Streamp<T>, sender: SyncSender<Vec<T>>) -> Self {
        Self { src, sender }
    }

    /// Create a sink and a bounded channel holding up to `depth`
    /// blocks.
    pub fn with_channel(src: Streamp<T>, depth: usize) -> (Self, Receiver<Vec<T>>) {
        let (sender, receiver) = sync_channel(depth);
        (Self::new(src, sender), receiver)
    }
}

impl<T: Copy> Block for ChannelSink<T> {
    fn block_name(&self) -> &'static str {
        "ChannelSink"
    }
    fn work(&mut self) -> Result<BlockRet> {
        let input = self.src.lock().unwrap().take();
        if input.is_empty() {
            return Ok(BlockRet::Noop);
        }
        match self.sender.try_send(input) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => trace!("display feed full, dropping block"),
            Err(TrySendError::Disconnected(_)) => trace!("display feed gone, dropping block"),
        }
        Ok(BlockRet::Again)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::Stream;

    #[test]
    fn delivers_and_drops() -> Result<()> {
        let src = Stream::newp();
        let (mut sink, rx) = ChannelSink::with_channel(src.clone(), 1);
        src.lock().unwrap().write_slice(&[1.0f32, 2.0]);
        sink.work()?;
        // Channel full now; this block is dropped, not queued.
        src.lock().unwrap().write_slice(&[3.0f32]);
        sink.work()?;
        assert_eq!(rx.try_recv().unwrap(), vec![1.0, 2.0]);
        assert!(rx.try_recv().is_err());
        Ok(())
    }

    #[test]
    fn survives_dropped_receiver() -> Result<()> {
        let src = Stream::newp();
        let (mut sink, rx) = ChannelSink::with_channel(src.clone(), 1);
        drop(rx);
        src.lock().unwrap().write_slice(&[1.0f32]);
        assert!(matches!(sink.work()?, BlockRet::Again));
        Ok(())
    }
}
/* vim: textwidth=80
 */
