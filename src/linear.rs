//! Software volume to linear gain conversion.
//!
//! Integer formats carry gains as 16.16 fixed point, float formats as `f32`.
//! Every gain array is [`LINEAR_LEN`] long: the real channels come first and
//! the next [`VOLUME_PADDING`] entries repeat the array from index 0, so a
//! kernel may read up to `VOLUME_PADDING` channels past the channel count
//! without wrapping.

use crate::format::{CHANNELS_MAX, SampleSpec};
use crate::mix::MixInfo;
use crate::volume::{ChannelVolumes, sw_volume_to_linear};

/// Entries repeated past the last real channel.
pub const VOLUME_PADDING: usize = 32;

/// Length of every padded gain array.
pub const LINEAR_LEN: usize = CHANNELS_MAX + VOLUME_PADDING;

/// Fixed-point scale of integer gains.
pub const FIXED_ONE: i32 = 0x10000;

/// Per-channel linear gains in the representation the destination format needs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LinearVolume {
    /// 16.16 fixed point, for integer and companded formats.
    Integer([i32; LINEAR_LEN]),
    /// Plain multipliers, for float formats.
    Float([f32; LINEAR_LEN]),
}

impl Default for LinearVolume {
    fn default() -> Self {
        LinearVolume::Integer([0; LINEAR_LEN])
    }
}

impl LinearVolume {
    /// Fixed-point gains, if that is the representation held.
    pub fn as_integer(&self) -> Option<&[i32; LINEAR_LEN]> {
        match self {
            LinearVolume::Integer(gains) => Some(gains),
            LinearVolume::Float(_) => None,
        }
    }

    /// Float gains, if that is the representation held.
    pub fn as_float(&self) -> Option<&[f32; LINEAR_LEN]> {
        match self {
            LinearVolume::Float(gains) => Some(gains),
            LinearVolume::Integer(_) => None,
        }
    }
}

fn fixed_point(linear: f64) -> i32 {
    (linear * f64::from(FIXED_ONE)).round_ties_even() as i32
}

fn pad<T: Copy>(linear: &mut [T; LINEAR_LEN], channels: usize) {
    for padding in 0..VOLUME_PADDING {
        linear[channels + padding] = linear[padding];
    }
}

/// Linearize `volume` to 16.16 fixed point.
pub fn calc_linear_integer_volume(volume: &ChannelVolumes) -> [i32; LINEAR_LEN] {
    let channels = volume.channels();
    assert!(channels <= CHANNELS_MAX, "invalid channel count {channels}");

    let mut linear = [0i32; LINEAR_LEN];
    for (slot, &v) in linear.iter_mut().zip(volume.values()) {
        *slot = fixed_point(sw_volume_to_linear(v));
    }
    pad(&mut linear, channels);
    linear
}

/// Linearize `volume` to `f32` multipliers.
pub fn calc_linear_float_volume(volume: &ChannelVolumes) -> [f32; LINEAR_LEN] {
    let channels = volume.channels();
    assert!(channels <= CHANNELS_MAX, "invalid channel count {channels}");

    let mut linear = [0f32; LINEAR_LEN];
    for (slot, &v) in linear.iter_mut().zip(volume.values()) {
        *slot = sw_volume_to_linear(v) as f32;
    }
    pad(&mut linear, channels);
    linear
}

/// Routine that fills each stream's gains from its own volume and the master volume.
pub type CalcStreamVolumesFn = fn(&mut [MixInfo], &ChannelVolumes, &SampleSpec);

/// Combine stream and master volumes into fixed-point gains.
pub fn calc_linear_integer_stream_volumes(
    streams: &mut [MixInfo],
    volume: &ChannelVolumes,
    spec: &SampleSpec,
) {
    let master = calc_linear_float_volume(volume);
    let channels = spec.channels();

    for stream in streams.iter_mut() {
        let mut linear = [0i32; LINEAR_LEN];
        for channel in 0..channels {
            let combined =
                sw_volume_to_linear(stream.volume.values()[channel]) * f64::from(master[channel]);
            debug_assert!(combined >= 0.0, "negative gain {combined}");
            linear[channel] = fixed_point(combined);
        }
        pad(&mut linear, channels);
        stream.linear = LinearVolume::Integer(linear);
    }
}

/// Combine stream and master volumes into float gains.
pub fn calc_linear_float_stream_volumes(
    streams: &mut [MixInfo],
    volume: &ChannelVolumes,
    spec: &SampleSpec,
) {
    let master = calc_linear_float_volume(volume);
    let channels = spec.channels();

    for stream in streams.iter_mut() {
        let mut linear = [0f32; LINEAR_LEN];
        for channel in 0..channels {
            let combined =
                sw_volume_to_linear(stream.volume.values()[channel]) * f64::from(master[channel]);
            debug_assert!(combined >= 0.0, "negative gain {combined}");
            linear[channel] = combined as f32;
        }
        pad(&mut linear, channels);
        stream.linear = LinearVolume::Float(linear);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::SampleFormat;
    use crate::memblock::MemChunk;
    use crate::volume::{Volume, sw_volume_from_linear};

    #[test]
    fn unity_is_fixed_one() {
        let linear = calc_linear_integer_volume(&ChannelVolumes::reset(2));
        assert_eq!(linear[0], FIXED_ONE);
        assert_eq!(linear[1], FIXED_ONE);
    }

    #[test]
    fn amplification_is_not_clamped() {
        let v = ChannelVolumes::set(1, sw_volume_from_linear(4.0));
        let linear = calc_linear_integer_volume(&v);
        assert!((linear[0] - 4 * FIXED_ONE).abs() < 64, "{}", linear[0]);
    }

    #[test]
    fn padding_wraps_from_channel_zero() {
        let volume = ChannelVolumes::from_slice(&[Volume(0x4000), Volume(0x8000), Volume::NORM])
            .unwrap();
        let linear = calc_linear_float_volume(&volume);
        for k in 0..VOLUME_PADDING {
            assert_eq!(linear[3 + k], linear[k % 3], "padding slot {k}");
        }
    }

    #[test]
    fn stream_gains_are_combined_with_master() {
        let spec = SampleSpec::new(SampleFormat::S16Le, 44_100, 2).unwrap();
        let mut streams = [MixInfo::new(
            MemChunk::from_vec(vec![0; 4]),
            ChannelVolumes::set(2, sw_volume_from_linear(0.5)),
        )];
        let master = ChannelVolumes::from_slice(&[Volume::NORM, Volume::MUTED]).unwrap();
        calc_linear_integer_stream_volumes(&mut streams, &master, &spec);

        let gains = streams[0].linear.as_integer().unwrap();
        assert!((gains[0] - FIXED_ONE / 2).abs() <= 2, "{}", gains[0]);
        assert_eq!(gains[1], 0);
        assert_eq!(gains[2], gains[0]);
        assert_eq!(gains[3], gains[1]);
    }

    #[test]
    fn float_formats_get_float_gains() {
        let spec = SampleSpec::new(SampleFormat::Float32Be, 48_000, 1).unwrap();
        let mut streams = [MixInfo::new(
            MemChunk::from_vec(vec![0; 4]),
            ChannelVolumes::reset(1),
        )];
        calc_linear_float_stream_volumes(&mut streams, &ChannelVolumes::reset(1), &spec);
        assert_eq!(streams[0].linear.as_float().unwrap()[0], 1.0);
        assert!(streams[0].linear.as_integer().is_none());
    }
}
