/*! Ready made receive chains.

These builders wire blocks into a [`Graph`] for the two receivers the
crate ships: a broadcast FM receiver and a PAL-B television receiver.
Both return the audio stream so the caller can attach whatever sink it
wants (audio device, file, vector).

The `samp_rate` argument must match the rate the front-end actually
streams at, which is also what `cfg` starts out holding. Stages created
with a config hook re-derive their state if the rate is changed later.
*/
use std::sync::Arc;
use std::sync::mpsc::SyncSender;

use crate::config::PipelineConfig;
use crate::fir::FilterSpec;
use crate::graph::Graph;
use crate::stream::Streamp;
use crate::window::WindowType;
use crate::{Complex, Float, Result, blocks::*};

/// Broadcast FM frequency deviation, Hz.
pub const FM_DEVIATION: Float = 75_000.0;

/// PAL-B audio subcarrier offset from the video carrier, Hz.
pub const AUDIO_SUBCARRIER: Float = 5_500_000.0;

/// PAL-B audio subcarrier FM deviation, Hz.
pub const TV_AUDIO_DEVIATION: Float = 50_000.0;

/// PAL color subcarrier offset from the video carrier, Hz.
pub const COLOR_SUBCARRIER: Float = 4_433_618.75;

/// Channel bandwidth the FM chain narrows to before demodulation, Hz.
const CHANNEL_RATE: u32 = 250_000;

/// Build the FM/AM receive chain from an IQ stream to audio rate
/// samples. Returns the audio stream, already volume scaled.
///
/// The chain demodulates both FM and AM at all times and selects per
/// block according to `cfg`, so switching modes is glitch free.
pub fn fm_receiver(
    g: &mut Graph,
    src: Streamp<Complex>,
    samp_rate: Float,
    audio_rate: u32,
    cfg: Arc<PipelineConfig>,
) -> Result<Streamp<Float>> {
    let decim = ((samp_rate as u32) / CHANNEL_RATE).max(1);
    let quad_rate = samp_rate as u32 / decim;

    // Channel select: keep ±100 kHz around center, drop the rate.
    let (chan, prev) = FirFilter::with_config(
        src,
        FilterSpec::low_pass(samp_rate, 100_000.0, 25_000.0, WindowType::Hamming),
        decim as usize,
        cfg.clone(),
        1,
    )?;
    g.add(Box::new(chan));

    let (tee, to_fm, to_am) = Tee::new(prev);
    g.add(Box::new(tee));

    let (fm, fm_out) = QuadratureDemod::with_config(to_fm, FM_DEVIATION, cfg.clone(), decim);
    g.add(Box::new(fm));
    let (am, am_out) = EnvelopeDetector::new(to_am);
    g.add(Box::new(am));

    let (sel, prev) = ModeSelect::new(fm_out, am_out, cfg.clone());
    g.add(Box::new(sel));

    let (dc, prev) = DcBlock::new(prev);
    g.add(Box::new(dc));
    let (agc, prev) = Agc::new(prev);
    g.add(Box::new(agc));

    let (resamp, prev) = RationalResampler::new(prev, audio_rate as usize, quad_rate as usize)?;
    g.add(Box::new(resamp));

    let (vol, audio) = Volume::new(prev, cfg);
    g.add(Box::new(vol));
    Ok(audio)
}

/// Build the PAL-B receive chain. The wideband IQ stream splits three
/// ways:
///
/// * luma: low pass over the vestigial sideband video, envelope
///   detected, leveled, and handed to `video_tx` block by block;
/// * chroma: the color subcarrier band, envelope detected, handed to
///   `chroma_tx`;
/// * audio: the 5.5 MHz FM subcarrier, demodulated and resampled.
///
/// Display feeds are best effort and never stall the chain. Returns
/// the audio stream. `samp_rate` must cover the full PAL baseband, in
/// practice 16 MHz or more.
pub fn tv_receiver(
    g: &mut Graph,
    src: Streamp<Complex>,
    samp_rate: Float,
    audio_rate: u32,
    cfg: Arc<PipelineConfig>,
    video_tx: SyncSender<Vec<Float>>,
    chroma_tx: SyncSender<Vec<Float>>,
) -> Result<Streamp<Float>> {
    let (tee, to_video, rest) = Tee::new(src);
    g.add(Box::new(tee));
    let (tee, to_audio, to_chroma) = Tee::new(rest);
    g.add(Box::new(tee));

    // Luma path.
    let (vf, prev) = FirFilter::with_config(
        to_video,
        FilterSpec::low_pass(samp_rate, 5_000_000.0, 1_000_000.0, WindowType::Hamming),
        2,
        cfg.clone(),
        1,
    )?;
    g.add(Box::new(vf));
    let (env, prev) = EnvelopeDetector::new(prev);
    g.add(Box::new(env));
    let (dc, prev) = DcBlock::new(prev);
    g.add(Box::new(dc));
    let (agc, prev) = Agc::new(prev);
    g.add(Box::new(agc));
    g.add(Box::new(ChannelSink::new(prev, video_tx)));

    // Chroma path: just the subcarrier band's amplitude.
    let (cf, prev) = FirFilter::with_config(
        to_chroma,
        FilterSpec::band_pass(
            samp_rate,
            COLOR_SUBCARRIER,
            600_000.0,
            200_000.0,
            WindowType::Hamming,
        ),
        4,
        cfg.clone(),
        1,
    )?;
    g.add(Box::new(cf));
    let (env, prev) = EnvelopeDetector::new(prev);
    g.add(Box::new(env));
    g.add(Box::new(ChannelSink::new(prev, chroma_tx)));

    // Audio path: translate the subcarrier to DC and treat it as a
    // narrowband FM channel.
    let decim = ((samp_rate as u32) / CHANNEL_RATE).max(1);
    let quad_rate = samp_rate as u32 / decim;
    let (xlate, prev) = FreqXlating::with_config(
        to_audio,
        FilterSpec::low_pass(samp_rate, 100_000.0, 50_000.0, WindowType::Hamming),
        AUDIO_SUBCARRIER,
        decim as usize,
        cfg.clone(),
        1,
    )?;
    g.add(Box::new(xlate));
    let (demod, prev) = QuadratureDemod::with_config(prev, TV_AUDIO_DEVIATION, cfg.clone(), decim);
    g.add(Box::new(demod));
    let (resamp, prev) = RationalResampler::new(prev, audio_rate as usize, quad_rate as usize)?;
    g.add(Box::new(resamp));
    let (vol, audio) = Volume::new(prev, cfg);
    g.add(Box::new(vol));
    Ok(audio)
}

/* vim: textwidth=80
 */
