//! One-stop import for all the blocks.
pub use crate::agc::Agc;
pub use crate::am_demod::EnvelopeDetector;
pub use crate::channel_sink::ChannelSink;
pub use crate::dc_block::DcBlock;
pub use crate::fir::FirFilter;
pub use crate::freq_xlating::FreqXlating;
pub use crate::gain::{GainOffset, Volume};
pub use crate::mode_select::ModeSelect;
pub use crate::null_sink::NullSink;
pub use crate::quadrature_demod::QuadratureDemod;
pub use crate::rational_resampler::RationalResampler;
pub use crate::signal_source::SignalSourceComplex;
pub use crate::tcp_source::IqTcpSource;
pub use crate::tee::Tee;
pub use crate::vector_sink::VectorSink;
pub use crate::vector_source::VectorSource;

#[cfg(feature = "audio")]
pub use crate::audio_sink::AudioSink;
/* vim: textwidth=80
 */
