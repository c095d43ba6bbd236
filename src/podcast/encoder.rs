//! Audio packaging: raw PCM → WAV container → MP3.
//!
//! Gemini TTS returns headerless 16-bit little-endian mono PCM. It is
//! wrapped in a WAV container with hound, then transcoded with LAME.

use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use mp3lame_encoder::{Bitrate, Builder, FlushNoGap, MonoPcm, Quality};
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};

/// Audio encoder for Gemini speech output.
pub struct AudioEncoder {
    sample_rate: u32,
    bitrate_kbps: u32,
}

impl AudioEncoder {
    pub fn new(sample_rate: u32, bitrate_kbps: u32) -> Self {
        Self {
            sample_rate,
            bitrate_kbps,
        }
    }

    /// Raw little-endian PCM bytes → MP3 bytes.
    pub fn encode(&self, raw: &[u8]) -> Result<Vec<u8>> {
        let samples = pcm_from_le_bytes(raw);
        let wav = wav_from_pcm(&samples, self.sample_rate)?;
        mp3_from_wav(&wav, self.bitrate_kbps)
    }
}

/// Decode 16-bit little-endian samples. A trailing odd byte is dropped.
pub fn pcm_from_le_bytes(raw: &[u8]) -> Vec<i16> {
    if raw.len() % 2 != 0 {
        warn!("PCM payload has odd length ({} bytes), dropping last byte", raw.len());
    }
    raw.chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}

/// Wrap samples in a mono, 16-bit WAV container.
pub fn wav_from_pcm(samples: &[i16], sample_rate: u32) -> Result<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = WavWriter::new(&mut buffer, spec)?;
        for &sample in samples {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
    }

    debug!(
        "Wrapped {} samples ({:.1}s) in WAV ({} bytes)",
        samples.len(),
        samples.len() as f64 / sample_rate as f64,
        buffer.get_ref().len()
    );
    Ok(buffer.into_inner())
}

/// Transcode a mono 16-bit WAV to constant-bitrate MP3.
pub fn mp3_from_wav(wav: &[u8], bitrate_kbps: u32) -> Result<Vec<u8>> {
    let reader = WavReader::new(Cursor::new(wav))?;
    let spec = reader.spec();
    if spec.channels != 1 || spec.bits_per_sample != 16 || spec.sample_format != SampleFormat::Int {
        return Err(PipelineError::Audio(format!(
            "expected mono 16-bit PCM WAV, got {} ch / {} bit",
            spec.channels, spec.bits_per_sample
        )));
    }
    let samples = reader
        .into_samples::<i16>()
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut builder = Builder::new().ok_or_else(|| PipelineError::Audio("failed to create LAME encoder".into()))?;
    builder
        .set_num_channels(1)
        .map_err(|e| PipelineError::Audio(format!("channels: {e:?}")))?;
    builder
        .set_sample_rate(spec.sample_rate)
        .map_err(|e| PipelineError::Audio(format!("sample rate {}: {e:?}", spec.sample_rate)))?;
    builder
        .set_brate(bitrate(bitrate_kbps)?)
        .map_err(|e| PipelineError::Audio(format!("bitrate: {e:?}")))?;
    builder
        .set_quality(Quality::Good)
        .map_err(|e| PipelineError::Audio(format!("quality: {e:?}")))?;
    let mut encoder = builder
        .build()
        .map_err(|e| PipelineError::Audio(format!("LAME init: {e:?}")))?;

    let mut mp3 = Vec::new();
    mp3.reserve(mp3lame_encoder::max_required_buffer_size(samples.len()));
    encoder
        .encode_to_vec(MonoPcm(samples.as_slice()), &mut mp3)
        .map_err(|e| PipelineError::Audio(format!("encode: {e:?}")))?;
    // LAME needs up to 7200 bytes to flush its internal buffer.
    mp3.reserve(7200);
    encoder
        .flush_to_vec::<FlushNoGap>(&mut mp3)
        .map_err(|e| PipelineError::Audio(format!("flush: {e:?}")))?;

    debug!("Encoded {} samples to MP3 ({} bytes)", samples.len(), mp3.len());
    Ok(mp3)
}

fn bitrate(kbps: u32) -> Result<Bitrate> {
    Ok(match kbps {
        8 => Bitrate::Kbps8,
        16 => Bitrate::Kbps16,
        24 => Bitrate::Kbps24,
        32 => Bitrate::Kbps32,
        40 => Bitrate::Kbps40,
        48 => Bitrate::Kbps48,
        64 => Bitrate::Kbps64,
        80 => Bitrate::Kbps80,
        96 => Bitrate::Kbps96,
        112 => Bitrate::Kbps112,
        128 => Bitrate::Kbps128,
        160 => Bitrate::Kbps160,
        192 => Bitrate::Kbps192,
        224 => Bitrate::Kbps224,
        256 => Bitrate::Kbps256,
        320 => Bitrate::Kbps320,
        other => {
            return Err(PipelineError::InvalidConfig(format!(
                "unsupported MP3 bitrate: {other} kbps"
            )))
        }
    })
}
