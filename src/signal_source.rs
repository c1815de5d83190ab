//! Generate a pure complex sine wave.
use crate::Result;
use crate::block::{Block, BlockRet};
use crate::stream::{Stream, Streamp};
use crate::{Complex, Float};

const TAU: f64 = std::f64::consts::TAU;

/// Samples generated per `work()` call.
const CHUNK: usize = 4096;

/// Generate a pure complex sine wave, forever.
pub struct SignalSourceComplex {
    amplitude: Float,
    rad_per_sample: f64,
    current: f64,
    dst: Streamp<Complex>,
}

impl SignalSourceComplex {
    /// Create new SignalSourceComplex block.
    pub fn new(samp_rate: Float, freq: Float, amplitude: Float) -> (Self, Streamp<Complex>) {
        let dst = Stream::newp();
        (
            Self {
                amplitude,
                rad_per_sample: TAU * freq as f64 / samp_rate as f64,
                current: 0.0,
                dst: dst.clone(),
            },
            dst,
        )
    }

    fn next_sample(&mut self) -> Complex {
        let s = Complex::new(self.current.cos() as Float, self.current.sin() as Float);
        self.current = (self.current + self.rad_per_sample) % TAU;
        s * self.amplitude
    }
}

impl Block for SignalSourceComplex {
    fn block_name(&self) -> &'static str {
        "SignalSourceComplex"
    }
    fn work(&mut self) -> Result<BlockRet> {
        let v: Vec<Complex> = (0..CHUNK).map(|_| self.next_sample()).collect();
        self.dst.lock().unwrap().write_slice(&v);
        Ok(BlockRet::Again)
    }
}

/* vim: textwidth=80
 */
