//! Conversion between interleaved frames and per-port buffers.

/// Scatter interleaved frames into per-channel buffers starting at `offset`.
///
/// `interleaved.len()` must be a multiple of `channels.len()`.
pub(crate) fn deinterleave(interleaved: &[f32], channels: &mut [&mut [f32]], offset: usize) {
    let count = channels.len();
    for (frame, samples) in interleaved.chunks_exact(count).enumerate() {
        for (channel, &sample) in channels.iter_mut().zip(samples) {
            channel[offset + frame] = sample;
        }
    }
}

/// Gather per-channel buffers, starting at `offset`, into interleaved frames.
///
/// Fills `out.len() / channels.len()` frames.
pub(crate) fn interleave(channels: &[&[f32]], offset: usize, out: &mut [f32]) {
    let count = channels.len();
    for (frame, samples) in out.chunks_exact_mut(count).enumerate() {
        for (sample, channel) in samples.iter_mut().zip(channels) {
            *sample = channel[offset + frame];
        }
    }
}
