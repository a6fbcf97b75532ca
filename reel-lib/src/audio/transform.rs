//! Fixed 8-bit signal pipeline applied to every soundtrack before output.
//!
//! `upscale` widens unsigned 8-bit samples to zero-centred 16-bit,
//! `smooth` runs a trailing moving average per channel, and `downscale`
//! narrows back to unsigned 8-bit. With a window of one the whole chain is
//! the identity on the input samples.

/// Widen unsigned 8-bit PCM to zero-centred signed 16-bit.
pub fn upscale(samples: &[u8]) -> Vec<i16> {
    samples
        .iter()
        .map(|&sample| ((sample as i16) - 128) << 8)
        .collect()
}

/// Trailing moving average over `window` samples of the same channel.
///
/// `samples` is interleaved with `channels` channels. The first samples of
/// each channel average over however many samples exist so far.
pub fn smooth(samples: &[i16], channels: usize, window: usize) -> Vec<i16> {
    let channels = channels.max(1);
    let window = window.max(1);
    if window == 1 {
        return samples.to_vec();
    }

    let mut output = vec![0i16; samples.len()];
    for channel in 0..channels {
        let mut sum: i64 = 0;
        let mut count: i64 = 0;
        let positions: Vec<usize> = (channel..samples.len()).step_by(channels).collect();
        for (n, &position) in positions.iter().enumerate() {
            sum += samples[position] as i64;
            count += 1;
            if n >= window {
                sum -= samples[positions[n - window]] as i64;
                count -= 1;
            }
            output[position] = (sum / count) as i16;
        }
    }
    output
}

/// Narrow zero-centred signed 16-bit back to unsigned 8-bit.
pub fn downscale(samples: &[i16]) -> Vec<u8> {
    samples
        .iter()
        .map(|&sample| ((sample >> 8) + 128) as u8)
        .collect()
}

/// Run the full pipeline on interleaved unsigned 8-bit PCM.
pub fn process(samples: &[u8], channels: usize, window: usize) -> Vec<u8> {
    downscale(&smooth(&upscale(samples), channels, window))
}
