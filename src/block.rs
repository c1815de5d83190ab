/*! Block trait.

Blocks are the building blocks of a receive pipeline. Each does one
thing, and blocks are connected with streams to process the data.
*/
use crate::Result;

/// Return type for all blocks.
///
/// This lets the scheduler know whether more data could come out of
/// this block, or whether it should never be called again.
#[derive(Debug)]
pub enum BlockRet {
    /// The block consumed and/or produced something. Call again.
    Again,

    /// Produced nothing, because not enough input.
    Noop,

    /// Produced nothing this time, but a background process may
    /// suddenly produce.
    Pending,

    /// Block will never produce anything again.
    ///
    /// Examples:
    /// * a vector source that has emitted its data.
    /// * a TCP source whose peer closed the connection.
    EOF,
}

/// Block trait, that must be implemented for all blocks.
pub trait Block {
    /// Name of the block. Not of the *instance* of the block.
    fn block_name(&self) -> &'static str;

    /// Do one unit of work: take whatever whole block of samples is
    /// waiting on the input stream(s), process it, and write the result
    /// to the output stream(s).
    ///
    /// A pure source has no input streams, a pure sink no outputs.
    /// Stages carry causal state (delay lines, phase accumulators,
    /// resampler timing) across calls, so `work()` must see samples in
    /// arrival order, one invocation at a time.
    fn work(&mut self) -> Result<BlockRet>;
}
/* vim: textwidth=80
 */
