pub mod encoder;
#[cfg(feature = "audio-io")]
pub mod input;

pub use encoder::{encode_pcm16, sample_to_i16, FrameChunker, FRAME_SAMPLES};
#[cfg(feature = "audio-io")]
pub use input::AudioInput;
