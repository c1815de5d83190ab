/*! Streaming SDR receive pipeline.

This crate implements a block based software defined radio receive
chain, in the spirit of GNURadio: blocks that each do one thing are
connected by unidirectional sample streams into a graph, and the graph
is run as a continuous block-processing loop.

Two receivers are built on top of the library:

* `fm_rx`: broadcast FM audio from a wideband IQ capture delivered over
  TCP by a HackRF TCP server.
* `tv_rx`: PAL-B television baseband from the same kind of capture. The
  luma trace and a band limited color subcarrier amplitude trace are fed
  to display channels, and the FM audio subcarrier is demodulated to an
  audio sink.

A typical graph:

```text
     [ IqTcpSource ]
           ↓
     [ FirFilter (channel select, decimating) ]
           ↓
     [ QuadratureDemod / EnvelopeDetector ]
           ↓
     [ ModeSelect ]
           ↓
     [ DcBlock → Agc ]
           ↓
     [ RationalResampler to audio rate ]
           ↓
     [ Volume → AudioSink ]
```

Live control runs alongside the data loop: all tunable parameters live
in a shared [`config::PipelineConfig`], and every stage that derives
state from it (filter taps, discriminator gain) re-derives that state
between blocks when the config version changes. Front-end tuning goes
out of band over the control connection ([`control::ControlClient`]),
driven by the [`tuning::TuningController`].

# Example

```
use rfpipe::graph::Graph;
use rfpipe::blocks::{VectorSource, GainOffset, VectorSink};

let (src, prev) = VectorSource::new(vec![1.0f32, 2.0, 3.0]);
let (gain, prev) = GainOffset::new(prev, 2.0, 0.5);
let sink = VectorSink::new(prev);
let hook = sink.hook();
let mut g = Graph::new();
g.add(Box::new(src));
g.add(Box::new(gain));
g.add(Box::new(sink));
g.run()?;
assert_eq!(&*hook.lock().unwrap(), &[2.5, 4.5, 6.5]);
# Ok::<(), rfpipe::Error>(())
```
*/

// Blocks.
pub mod agc;
pub mod am_demod;
pub mod channel_sink;
pub mod dc_block;
pub mod fir;
pub mod freq_xlating;
pub mod gain;
pub mod mode_select;
pub mod null_sink;
pub mod quadrature_demod;
pub mod rational_resampler;
pub mod signal_source;
pub mod tcp_source;
pub mod tee;
pub mod vector_sink;
pub mod vector_source;

#[cfg(feature = "audio")]
pub mod audio_sink;

// Infrastructure.
pub mod block;
pub mod blocks;
pub mod config;
pub mod control;
pub mod graph;
pub mod pipeline;
pub mod stream;
pub mod tuning;
pub mod window;

/// Float type used for all samples. f32, like most SDR interchange.
pub type Float = f32;

/// Complex (I/Q) data.
pub type Complex = num_complex::Complex<Float>;

/// Errors produced by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error on a socket or device.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Rejected configuration. The previous configuration stays active.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Front-end device problem (unreachable, refused a command).
    #[error("device error: {0}")]
    Device(String),

    /// Unexpected reply on the control connection.
    #[error("protocol error: {0}")]
    Protocol(String),
}

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
pub mod tests {
    //! Test helper functions.
    use super::*;

    /// For testing, assert that two float slices are almost equal.
    pub fn assert_almost_equal_float(left: &[Float], right: &[Float]) {
        assert_eq!(
            left.len(),
            right.len(),
            "\nleft: {left:?}\nright: {right:?}"
        );
        for i in 0..left.len() {
            if (left[i] - right[i]).abs() > 0.001 {
                assert_eq!(
                    left[i], right[i],
                    "\nElement {i}:\nleft: {left:?}\nright: {right:?}"
                );
            }
        }
    }

    /// For testing, assert that two complex slices are almost equal.
    pub fn assert_almost_equal_complex(left: &[Complex], right: &[Complex]) {
        assert_eq!(
            left.len(),
            right.len(),
            "\nleft: {left:?}\nright: {right:?}"
        );
        for i in 0..left.len() {
            let dist = (left[i] - right[i]).norm();
            if dist > 0.001 {
                assert_eq!(
                    left[i], right[i],
                    "\nElement {i}:\nleft: {left:?}\nright: {right:?}"
                );
            }
        }
    }
}
/* vim: textwidth=80
 */
