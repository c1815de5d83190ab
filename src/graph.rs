/*! Graphs contain blocks connected by streams, and run them.
*/
use std::time::Instant;

use log::{info, trace};

use crate::Result;
use crate::block::{Block, BlockRet};

/// A graph of blocks, and the loop that runs them.
///
/// Blocks are scheduled round robin on one thread, in the order they
/// were added, which for a forward-only pipeline means samples flow
/// source to sink within one pass. Every stage therefore sees each
/// parameter change at a whole-block boundary, never mid-block.
pub struct Graph {
    blocks: Vec<Box<dyn Block>>,
    cancel_token: CancellationToken,
    times: Vec<std::time::Duration>,
    spent_time: Option<std::time::Duration>,
}

impl Graph {
    /// Create a new flowgraph.
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            cancel_token: CancellationToken::new(),
            times: Vec::new(),
            spent_time: None,
        }
    }

    /// Add a block to the graph.
    pub fn add(&mut self, b: Box<dyn Block>) {
        self.blocks.push(b);
    }

    /// Return a cancellation token, for asynchronously stopping the
    /// graph, for example when the user presses Ctrl-C.
    ///
    /// Cancellation discards the in-flight block; nothing is flushed.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Run the graph until all blocks are starved or EOF, or until the
    /// graph is cancelled.
    pub fn run(&mut self) -> Result<()> {
        let st = Instant::now();
        self.times
            .resize(self.blocks.len(), std::time::Duration::default());
        let mut eof = vec![false; self.blocks.len()];
        loop {
            if self.cancel_token.is_canceled() {
                info!("graph cancelled, exiting");
                break;
            }
            let mut done = true;
            let mut all_idle = true;
            for (n, b) in self.blocks.iter_mut().enumerate() {
                if eof[n] {
                    continue;
                }
                let name = b.block_name();
                let st = Instant::now();
                let ret = b.work()?;
                self.times[n] += st.elapsed();
                match ret {
                    BlockRet::Again => {
                        done = false;
                        all_idle = false;
                    }
                    BlockRet::Pending => {
                        done = false;
                    }
                    BlockRet::Noop => {}
                    BlockRet::EOF => {
                        info!("{name} EOF");
                        eof[n] = true;
                    }
                }
            }
            if done {
                break;
            }
            if all_idle {
                trace!("no block made progress, sleeping a bit");
                std::thread::sleep(std::time::Duration::from_millis(10));
            }
        }
        self.spent_time = Some(st.elapsed());
        if let Some(stats) = self.generate_stats() {
            for line in stats.split('\n') {
                if !line.is_empty() {
                    info!("{line}");
                }
            }
        }
        Ok(())
    }

    /// Return a string with stats about where time went.
    pub fn generate_stats(&self) -> Option<String> {
        let elapsed = self.spent_time?.as_secs_f64();
        let total = self
            .times
            .iter()
            .cloned()
            .sum::<std::time::Duration>()
            .as_secs_f64();
        let ml = self
            .blocks
            .iter()
            .map(|b| b.block_name().len())
            .max()?
            .max("Elapsed seconds".len());
        let mut s = format!("{:<ml$}    Seconds  Percent\n", "Block name");
        s.push_str(&("-".repeat(ml + 20) + "\n"));
        for (n, b) in self.blocks.iter().enumerate() {
            s.push_str(&format!(
                "{:<ml$} {:10.3} {:>7.2}%\n",
                b.block_name(),
                self.times[n].as_secs_f32(),
                100.0 * self.times[n].as_secs_f64() / total.max(f64::MIN_POSITIVE),
            ));
        }
        s.push_str(&format!(
            "{:<ml$} {elapsed:10.3} {:>7.2}%\n",
            "Elapsed seconds", 100.0,
        ));
        Some(s)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle to stop the graph, for example when the user presses
/// Ctrl-C.
///
/// ```
/// use rfpipe::graph::CancellationToken;
/// use std::thread;
///
/// let token = CancellationToken::new();
/// assert!(!token.is_canceled());
/// let tt = token.clone();
/// thread::spawn(move || {
///     tt.cancel();
/// });
/// while !token.is_canceled() {}
/// ```
#[derive(Clone)]
pub struct CancellationToken {
    inner: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

impl CancellationToken {
    /// Create new cancellation token.
    pub fn new() -> Self {
        Self {
            inner: std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false)),
        }
    }

    /// Mark the token cancelled.
    pub fn cancel(&self) {
        self.inner.store(true, std::sync::atomic::Ordering::SeqCst);
    }

    /// Check if the token is cancelled.
    pub fn is_canceled(&self) -> bool {
        self.inner.load(std::sync::atomic::Ordering::SeqCst)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

/* vim: textwidth=80
 */
