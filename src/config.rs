/*! Shared, versioned pipeline configuration.

The tunable parameter surface of a receiver: center frequency, sample
rate, front-end gains, demodulation mode, audio volume. GUI widgets,
the tuning controller and the data loop all talk to one
[`PipelineConfig`].

Updates happen under one lock and bump a version counter once, so a
stage that snapshots the config sees exactly one consistent version per
block, never a half-applied update. Stages cache the version and only
re-derive state (filter taps, discriminator gain) when it moves, which
happens between blocks by construction.
*/
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{Error, Float, Result};

/// Which demodulator feeds the audio chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DemodMode {
    /// Quadrature (FM) demodulation.
    Fm,
    /// Envelope (AM) demodulation.
    Am,
}

/// Front-end gain stages of the HackRF.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GainStage {
    /// LNA (IF) gain, 0-40 dB.
    Lna,
    /// VGA (baseband) gain, 0-62 dB.
    Vga,
    /// RX amp gain, 0-14 dB.
    RxAmp,
}

impl GainStage {
    fn max(&self) -> u32 {
        match self {
            GainStage::Lna => 40,
            GainStage::Vga => 62,
            GainStage::RxAmp => 14,
        }
    }
}

/// One consistent set of tunable parameters.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Center frequency in Hz.
    pub frequency: u64,
    /// Front-end sample rate in Hz.
    pub sample_rate: u32,
    /// LNA gain in dB.
    pub lna_gain: u32,
    /// VGA gain in dB.
    pub vga_gain: u32,
    /// RX amp gain in dB.
    pub rx_amp_gain: u32,
    /// Demodulation mode.
    pub mode: DemodMode,
    /// Audio volume, 0.0 to 1.0.
    pub volume: Float,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            frequency: 100_000_000,
            sample_rate: 2_000_000,
            lna_gain: 32,
            vga_gain: 30,
            rx_amp_gain: 14,
            mode: DemodMode::Fm,
            volume: 0.5,
        }
    }
}

/// Shared mutable configuration with an atomic version counter.
pub struct PipelineConfig {
    settings: Mutex<Settings>,
    version: AtomicU64,
}

impl PipelineConfig {
    /// Create a config with the given initial settings.
    pub fn new(settings: Settings) -> Self {
        Self {
            settings: Mutex::new(settings),
            version: AtomicU64::new(0),
        }
    }

    /// Current version. Moves exactly once per successful update.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// One consistent copy of the settings, with the version it
    /// corresponds to.
    pub fn snapshot(&self) -> (u64, Settings) {
        let s = self.settings.lock().unwrap().clone();
        (self.version(), s)
    }

    fn update<F: FnOnce(&mut Settings)>(&self, f: F) {
        let mut s = self.settings.lock().unwrap();
        f(&mut s);
        self.version.fetch_add(1, Ordering::SeqCst);
    }

    /// Set the center frequency.
    pub fn set_frequency(&self, hz: u64) -> Result<()> {
        if hz == 0 {
            return Err(Error::InvalidConfig("frequency must be positive".into()));
        }
        self.update(|s| s.frequency = hz);
        Ok(())
    }

    /// Center frequency in Hz.
    pub fn frequency(&self) -> u64 {
        self.settings.lock().unwrap().frequency
    }

    /// Set the front-end sample rate.
    pub fn set_sample_rate(&self, hz: u32) -> Result<()> {
        if hz == 0 {
            return Err(Error::InvalidConfig("sample rate must be positive".into()));
        }
        self.update(|s| s.sample_rate = hz);
        Ok(())
    }

    /// Front-end sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.settings.lock().unwrap().sample_rate
    }

    /// Set one front-end gain, checked against the stage's range.
    pub fn set_gain(&self, stage: GainStage, value: u32) -> Result<()> {
        if value > stage.max() {
            return Err(Error::InvalidConfig(format!(
                "{stage:?} gain {value} out of range 0-{}",
                stage.max()
            )));
        }
        self.update(|s| match stage {
            GainStage::Lna => s.lna_gain = value,
            GainStage::Vga => s.vga_gain = value,
            GainStage::RxAmp => s.rx_amp_gain = value,
        });
        Ok(())
    }

    /// One front-end gain.
    pub fn gain(&self, stage: GainStage) -> u32 {
        let s = self.settings.lock().unwrap();
        match stage {
            GainStage::Lna => s.lna_gain,
            GainStage::Vga => s.vga_gain,
            GainStage::RxAmp => s.rx_amp_gain,
        }
    }

    /// Switch demodulation mode. Takes effect at the next whole block.
    pub fn set_mode(&self, mode: DemodMode) {
        self.update(|s| s.mode = mode);
    }

    /// Current demodulation mode.
    pub fn mode(&self) -> DemodMode {
        self.settings.lock().unwrap().mode
    }

    /// Set the audio volume, clamped to 0.0..=1.0.
    pub fn set_volume(&self, volume: Float) {
        self.update(|s| s.volume = volume.clamp(0.0, 1.0));
    }

    /// Audio volume.
    pub fn volume(&self) -> Float {
        self.settings.lock().unwrap().volume
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

/* vim: textwidth=80
 */
