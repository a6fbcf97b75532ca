//! Whole-resource audio decode into interleaved unsigned 8-bit PCM.

use std::io::Cursor;

use log::{debug, warn};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::PcmClip;
use crate::error::{ReelError, Result};

/// Decode an in-memory audio resource.
///
/// Sample rate and channel layout are taken from the container header; the
/// samples are converted to unsigned 8-bit regardless of the source depth.
pub fn decode_pcm(bytes: Vec<u8>) -> Result<PcmClip> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());

    let meta_opts: MetadataOptions = Default::default();
    let fmt_opts: FormatOptions = Default::default();

    let probed = symphonia::default::get_probe().format(&Hint::new(), mss, &fmt_opts, &meta_opts)?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| ReelError::UnsupportedFormat("no decodable audio track".to_string()))?;
    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| ReelError::UnsupportedFormat("missing sample rate".to_string()))?;
    let header_channels = track.codec_params.channels.map(|c| c.count());

    let dec_opts: DecoderOptions = Default::default();
    let mut decoder = symphonia::default::get_codecs().make(&track.codec_params, &dec_opts)?;

    let mut samples: Vec<u8> = Vec::new();
    let mut channels = header_channels.unwrap_or(0);
    let mut sample_buf: Option<SampleBuffer<u8>> = None;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(Error::IoError(err)) if err.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(Error::ResetRequired) => {
                return Err(ReelError::Decode(
                    "decoder reset required mid-stream".to_string(),
                ));
            }
            Err(err) => return Err(err.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        match decoder.decode(&packet) {
            Ok(decoded) => {
                let spec = *decoded.spec();
                channels = spec.channels.count();
                let needed = decoded.capacity() as u64;
                let too_small = sample_buf
                    .as_ref()
                    .map_or(true, |buf| (buf.capacity() as u64) < needed * channels as u64);
                if too_small {
                    sample_buf = Some(SampleBuffer::<u8>::new(needed, spec));
                }
                if let Some(buffer) = sample_buf.as_mut() {
                    buffer.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buffer.samples());
                }
            }
            Err(Error::DecodeError(err)) => {
                warn!("skipping undecodable audio packet: {}", err);
            }
            Err(err) => return Err(err.into()),
        }
    }

    if channels == 0 {
        return Err(ReelError::UnsupportedFormat(
            "unknown channel layout".to_string(),
        ));
    }

    debug!(
        "decoded {} bytes of audio ({} Hz, {} channels)",
        samples.len(),
        sample_rate,
        channels
    );

    Ok(PcmClip {
        sample_rate,
        channels: channels as u16,
        samples,
    })
}
