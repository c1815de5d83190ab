/*! Streams connecting blocks.

Blocks are connected with streams. A stream has exactly one producer
and exactly one consumer; routing decisions (the mode selector) forward
whole blocks, they never merge streams.
*/
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use log::trace;

/// Default bound on buffered samples per stream.
///
/// The bound exists so that a stream whose consumer has gone away (a
/// best effort display feed, say) cannot grow without limit. Writes
/// over the bound drop the excess instead of blocking, since producer
/// and consumer run on the same scheduler thread.
const DEFAULT_MAX_SAMPLES: usize = 1 << 20;

/// A stream between two blocks.
#[derive(Debug)]
pub struct Stream<T> {
    data: VecDeque<T>,
    max_samples: usize,
}

/// Convenience type for a "pointer to a stream".
pub type Streamp<T> = Arc<Mutex<Stream<T>>>;

impl<T: Copy> Stream<T> {
    /// Create a new stream.
    pub fn new() -> Self {
        Self {
            data: VecDeque::new(),
            max_samples: DEFAULT_MAX_SAMPLES,
        }
    }

    /// Create a new shared stream.
    pub fn newp() -> Streamp<T> {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Create a new shared stream with initial contents.
    pub fn from_slice(data: &[T]) -> Streamp<T> {
        let s = Self::newp();
        s.lock().unwrap().write_slice(data);
        s
    }

    /// Number of samples waiting to be consumed.
    pub fn available(&self) -> usize {
        self.data.len()
    }

    /// True if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append samples from a slice.
    pub fn write_slice(&mut self, samples: &[T]) {
        let free = self.max_samples.saturating_sub(self.data.len());
        if samples.len() > free {
            trace!(
                "stream overflow, dropping {} samples",
                samples.len() - free
            );
        }
        self.data.extend(samples.iter().take(free).copied());
    }

    /// Append samples from an iterator.
    pub fn write<I: IntoIterator<Item = T>>(&mut self, samples: I) {
        let free = self.max_samples.saturating_sub(self.data.len());
        self.data.extend(samples.into_iter().take(free));
    }

    /// Take everything waiting on the stream, as one block.
    pub fn take(&mut self) -> Vec<T> {
        self.data.drain(..).collect()
    }

    /// Discard everything waiting on the stream.
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl<T: Copy> Default for Stream<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_take() {
        let s = Stream::newp();
        s.lock().unwrap().write_slice(&[1.0f32, 2.0, 3.0]);
        assert_eq!(s.lock().unwrap().available(), 3);
        assert_eq!(s.lock().unwrap().take(), vec![1.0, 2.0, 3.0]);
        assert!(s.lock().unwrap().is_empty());
    }

    #[test]
    fn bounded() {
        let mut s: Stream<u8> = Stream::new();
        s.max_samples = 4;
        s.write_slice(&[1, 2, 3]);
        s.write_slice(&[4, 5, 6]);
        assert_eq!(s.take(), vec![1, 2, 3, 4]);
    }
}
/* vim: textwidth=80
 */
