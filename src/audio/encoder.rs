//! PCM16 frame encoding for the session channel
//!
//! The backend expects raw little-endian PCM16 mono frames of a fixed
//! sample count. Captured floats are converted here; the conversion policy
//! must stay byte-identical to what the backend's codec expects.

/// Samples per outbound audio frame
pub const FRAME_SAMPLES: usize = 4096;

/// Convert a float sample in [-1, 1] to a signed 16-bit sample.
///
/// Negative values scale by 32768 and positive by 32767, so that -1.0 and
/// 1.0 land exactly on the i16 range bounds. Out-of-range input is clamped
/// first.
pub fn sample_to_i16(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32768.0).round() as i16
    } else {
        (s * 32767.0).round() as i16
    }
}

/// Encode float samples as little-endian PCM16 bytes.
pub fn encode_pcm16(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        bytes.extend_from_slice(&sample_to_i16(sample).to_le_bytes());
    }
    bytes
}

/// Accumulates captured samples and emits fixed-size frames.
///
/// Capture callbacks deliver buffers of whatever size the driver chooses;
/// the chunker re-slices them into `frame_len`-sample frames and keeps the
/// remainder for the next callback.
pub struct FrameChunker {
    frame_len: usize,
    pending: Vec<f32>,
}

impl FrameChunker {
    pub fn new(frame_len: usize) -> Self {
        Self {
            frame_len,
            pending: Vec::with_capacity(frame_len * 2),
        }
    }

    /// Feed captured samples, invoking `emit` once per completed frame.
    pub fn push(&mut self, samples: &[f32], mut emit: impl FnMut(&[f32])) {
        self.pending.extend_from_slice(samples);
        while self.pending.len() >= self.frame_len {
            {
                let frame = &self.pending[..self.frame_len];
                emit(frame);
            }
            self.pending.drain(..self.frame_len);
        }
    }

    /// Drop any partial frame left from the current recording.
    pub fn reset(&mut self) {
        self.pending.clear();
    }

    /// Number of samples waiting for the next full frame.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl Default for FrameChunker {
    fn default() -> Self {
        Self::new(FRAME_SAMPLES)
    }
}
