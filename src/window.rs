//! Window functions for FIR design.
//!
//! <https://en.wikipedia.org/wiki/Window_function>
use crate::Float;

const PI: Float = std::f64::consts::PI as Float;

/// Supported window functions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowType {
    /// No window at all.
    Rectangular,
    /// Hamming window.
    Hamming,
    /// Blackman window.
    Blackman,
    /// Blackman-Harris window.
    BlackmanHarris,
}

impl WindowType {
    /// Maximum attenuation in dB, used to size filters.
    pub fn max_attenuation(&self) -> Float {
        match self {
            WindowType::Rectangular => 21.0,
            WindowType::Hamming => 53.0,
            WindowType::Blackman => 74.0,
            WindowType::BlackmanHarris => 92.0,
        }
    }

    /// Generate window coefficients.
    pub fn make_window(&self, ntaps: usize) -> Vec<Float> {
        match self {
            WindowType::Rectangular => vec![1.0; ntaps],
            WindowType::Hamming => hamming(ntaps),
            WindowType::Blackman => blackman(ntaps),
            WindowType::BlackmanHarris => blackman_harris(ntaps),
        }
    }
}

/// Create Hamming window.
fn hamming(ntaps: usize) -> Vec<Float> {
    // Hamming's paper sets a0 as 25/46, not the commonly seen 0.54.
    let a0 = 25.0 / 46.0;
    let a1 = 1.0 - a0;
    let m = (ntaps - 1) as Float;
    (0..ntaps)
        .map(|n| a0 - a1 * (2.0 * PI * (n as Float) / m).cos())
        .collect()
}

/// Create Blackman window.
fn blackman(ntaps: usize) -> Vec<Float> {
    // Blackman's "not very serious proposal" magic value: 0.16.
    let a = 0.16;
    let a0 = (1.0 - a) / 2.0;
    let a1 = 0.5;
    let a2 = a / 2.0;
    let m = (ntaps - 1) as Float;
    (0..ntaps)
        .map(|n| {
            let t1 = 2.0 * PI * (n as Float) / m;
            let t2 = 4.0 * PI * (n as Float) / m;
            a0 - a1 * t1.cos() + a2 * t2.cos()
        })
        .collect()
}

/// Create Blackman-Harris window.
fn blackman_harris(ntaps: usize) -> Vec<Float> {
    const A0: Float = 0.35875;
    const A1: Float = 0.48829;
    const A2: Float = 0.14128;
    const A3: Float = 0.01168;
    let m = (ntaps - 1) as Float;
    (0..ntaps)
        .map(|n| {
            let t1 = 2.0 * PI * (n as Float) / m;
            let t2 = 4.0 * PI * (n as Float) / m;
            let t3 = 6.0 * PI * (n as Float) / m;
            A0 - A1 * t1.cos() + A2 * t2.cos() - A3 * t3.cos()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetry() {
        for w in [
            WindowType::Rectangular,
            WindowType::Hamming,
            WindowType::Blackman,
            WindowType::BlackmanHarris,
        ] {
            let win = w.make_window(21);
            assert_eq!(win.len(), 21);
            for n in 0..21 {
                assert!(
                    (win[n] - win[20 - n]).abs() < 1e-5,
                    "{w:?} not symmetric at {n}"
                );
            }
        }
    }

    #[test]
    fn hamming_endpoints() {
        let win = WindowType::Hamming.make_window(11);
        assert!((win[0] - (25.0 / 46.0 - 21.0 / 46.0)).abs() < 1e-5);
        assert!((win[5] - 1.0).abs() < 1e-5);
    }
}
/* vim: textwidth=80
 */
