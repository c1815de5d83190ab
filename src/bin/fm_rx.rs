/*! Broadcast FM receiver fed by a HackRF TCP server.

Connects to the server's control and data ports, programs the
front-end, and runs the receive chain to the default audio output.

Line commands on stdin while running:

```text
u / +        latch tune up (100 kHz steps)
d / -        latch tune down
s / (empty)  release the latch
m            toggle FM/AM demodulation
v <0..1>     set volume
q            quit
```
*/
use std::io::BufRead;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::{info, warn};

use rfpipe::blocks::*;
use rfpipe::config::{DemodMode, GainStage, PipelineConfig, Settings};
use rfpipe::control::{ControlClient, Tuner};
use rfpipe::graph::{CancellationToken, Graph};
use rfpipe::pipeline::fm_receiver;
use rfpipe::tuning::{TuneInput, TuningController};
use rfpipe::Float;

const AUDIO_RATE: u32 = 48_000;
const TUNE_STEP_HZ: u64 = 100_000;
const CHUNK_SIZE: usize = 65_536;

#[derive(clap::Parser, Debug)]
#[command(version, about)]
struct Opt {
    /// HackRF TCP server host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// IQ data port.
    #[arg(long, default_value_t = 5000)]
    data_port: u16,

    /// Control port.
    #[arg(long, default_value_t = 5001)]
    control_port: u16,

    /// Center frequency in Hz.
    #[arg(short, long, default_value_t = 100_000_000)]
    frequency: u64,

    /// Front-end sample rate in Hz.
    #[arg(short, long, default_value_t = 2_000_000)]
    sample_rate: u32,

    /// LNA gain, 0-40 dB.
    #[arg(long, default_value_t = 32)]
    lna_gain: u32,

    /// VGA gain, 0-62 dB.
    #[arg(long, default_value_t = 30)]
    vga_gain: u32,

    /// RX amp gain, 0-14 dB.
    #[arg(long, default_value_t = 14)]
    rx_amp_gain: u32,

    /// Audio volume, 0.0-1.0.
    #[arg(long, default_value_t = 0.5)]
    volume: Float,

    /// Verbosity level. Repeat for more.
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Program every tunable into the front-end. Run before the graph
/// starts; failures here are fatal.
fn program_frontend<T: Tuner>(tuner: &mut T, cfg: &PipelineConfig) -> rfpipe::Result<()> {
    tuner.set_sample_rate(cfg.sample_rate())?;
    tuner.set_center_frequency(cfg.frequency())?;
    for stage in [GainStage::Lna, GainStage::Vga, GainStage::RxAmp] {
        tuner.set_gain(stage, cfg.gain(stage))?;
    }
    Ok(())
}

/// Map stdin lines to tuning latch and config changes. Runs on its own
/// thread until stdin closes or `q`.
fn stdin_loop(input: TuneInput, cfg: Arc<PipelineConfig>, cancel: CancellationToken) {
    for line in std::io::stdin().lock().lines() {
        let Ok(line) = line else { break };
        let line = line.trim();
        match line {
            "u" | "+" => input.press_up(),
            "d" | "-" => input.press_down(),
            "" | "s" => {
                input.release_up();
                input.release_down();
            }
            "m" => {
                let mode = match cfg.mode() {
                    DemodMode::Fm => DemodMode::Am,
                    DemodMode::Am => DemodMode::Fm,
                };
                cfg.set_mode(mode);
                info!("demodulation mode now {mode:?}");
            }
            "q" => break,
            _ => {
                if let Some(v) = line.strip_prefix("v ") {
                    match v.parse::<Float>() {
                        Ok(v) => cfg.set_volume(v),
                        Err(_) => warn!("bad volume {v:?}"),
                    }
                } else {
                    warn!("unknown command {line:?}");
                }
            }
        }
    }
    cancel.cancel();
}

fn main() -> Result<()> {
    let opt = Opt::parse();
    stderrlog::new()
        .module(module_path!())
        .module("rfpipe")
        .verbosity(opt.verbose as usize)
        .timestamp(stderrlog::Timestamp::Second)
        .init()?;

    let cfg = Arc::new(PipelineConfig::new(Settings {
        frequency: opt.frequency,
        sample_rate: opt.sample_rate,
        lna_gain: opt.lna_gain,
        vga_gain: opt.vga_gain,
        rx_amp_gain: opt.rx_amp_gain,
        mode: DemodMode::Fm,
        volume: opt.volume,
    }));

    let control = ControlClient::connect(&format!("{}:{}", opt.host, opt.control_port))?;
    let control = Arc::new(Mutex::new(control));
    program_frontend(&mut *control.lock().unwrap(), &cfg)?;
    info!(
        "front-end programmed: {} Hz at {} samples/s",
        cfg.frequency(),
        cfg.sample_rate()
    );

    let mut g = Graph::new();
    let (src, prev) = IqTcpSource::connect(&format!("{}:{}", opt.host, opt.data_port), CHUNK_SIZE)?;
    g.add(Box::new(src));
    let audio = fm_receiver(
        &mut g,
        prev,
        opt.sample_rate as Float,
        AUDIO_RATE,
        cfg.clone(),
    )?;
    g.add(Box::new(AudioSink::new(audio, AUDIO_RATE)?));

    let cancel = g.cancel_token();
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || cancel.cancel())?;
    }

    let input = TuneInput::new();
    {
        let (input, cfg, cancel) = (input.clone(), cfg.clone(), cancel.clone());
        std::thread::spawn(move || stdin_loop(input, cfg, cancel));
    }
    let tuning = TuningController::new(
        control,
        cfg,
        input,
        TUNE_STEP_HZ,
        Duration::from_millis(100),
        Duration::from_millis(50),
    );
    let tuning_cancel = cancel.clone();
    let tuning_thread = std::thread::spawn(move || tuning.run(tuning_cancel));

    g.run()?;
    cancel.cancel();
    tuning_thread
        .join()
        .map_err(|_| anyhow::anyhow!("tuning thread panicked"))?;
    Ok(())
}
/* vim: textwidth=80
 */
