//! Software volume values and per-channel volume vectors.
//!
//! A [`Volume`] is a cubic software-volume unit: `NORM` is unity gain, `MUTED`
//! is silence, and the linear amplitude is `(v / NORM)^3`.

use std::ops::{Index, IndexMut};

use crate::format::{CHANNELS_MAX, SpecError};

/// Software volume in cubic units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Volume(pub u32);

impl Volume {
    /// Silence.
    pub const MUTED: Volume = Volume(0);
    /// Unity gain.
    pub const NORM: Volume = Volume(0x10000);
    /// Largest meaningful volume.
    pub const MAX: Volume = Volume(u32::MAX / 2);

    /// Linear amplitude of this volume.
    pub fn to_linear(self) -> f64 {
        sw_volume_to_linear(self)
    }

    /// Volume whose linear amplitude is `linear`.
    pub fn from_linear(linear: f64) -> Self {
        sw_volume_from_linear(linear)
    }
}

/// Convert a software volume to a linear amplitude.
///
/// `MUTED` maps to exactly `0.0` and `NORM` to exactly `1.0`.
pub fn sw_volume_to_linear(v: Volume) -> f64 {
    if v <= Volume::MUTED {
        return 0.0;
    }
    if v == Volume::NORM {
        return 1.0;
    }
    let f = f64::from(v.0) / f64::from(Volume::NORM.0);
    f * f * f
}

/// Convert a linear amplitude to the nearest software volume.
pub fn sw_volume_from_linear(linear: f64) -> Volume {
    if linear <= 0.0 {
        return Volume::MUTED;
    }
    let v = (linear.cbrt() * f64::from(Volume::NORM.0)).round();
    Volume(v.clamp(0.0, f64::from(Volume::MAX.0)) as u32)
}

/// Convert decibels to a software volume. `-inf` dB is muted.
pub fn sw_volume_from_db(db: f64) -> Volume {
    if db == f64::NEG_INFINITY {
        return Volume::MUTED;
    }
    sw_volume_from_linear(10f64.powf(db / 20.0))
}

/// Convert a software volume to decibels. Muted is `-inf`.
pub fn sw_volume_to_db(v: Volume) -> f64 {
    let linear = sw_volume_to_linear(v);
    if linear <= 0.0 {
        f64::NEG_INFINITY
    } else {
        20.0 * linear.log10()
    }
}

/// One software volume per channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelVolumes {
    channels: u8,
    values: [Volume; CHANNELS_MAX],
}

impl ChannelVolumes {
    /// Every channel set to `volume`.
    ///
    /// Panics if `channels` is zero or above [`CHANNELS_MAX`].
    pub fn set(channels: usize, volume: Volume) -> Self {
        assert!(
            channels > 0 && channels <= CHANNELS_MAX,
            "invalid channel count {channels}"
        );
        Self {
            channels: channels as u8,
            values: [volume; CHANNELS_MAX],
        }
    }

    /// Every channel at unity gain.
    pub fn reset(channels: usize) -> Self {
        Self::set(channels, Volume::NORM)
    }

    /// Every channel muted.
    pub fn mute(channels: usize) -> Self {
        Self::set(channels, Volume::MUTED)
    }

    /// Build from explicit per-channel values.
    pub fn from_slice(values: &[Volume]) -> Result<Self, SpecError> {
        if values.is_empty() || values.len() > CHANNELS_MAX {
            return Err(SpecError::InvalidChannels(values.len()));
        }
        let mut volumes = Self::set(values.len(), Volume::MUTED);
        volumes.values[..values.len()].copy_from_slice(values);
        Ok(volumes)
    }

    /// Number of channels.
    pub fn channels(&self) -> usize {
        usize::from(self.channels)
    }

    /// Per-channel values.
    pub fn values(&self) -> &[Volume] {
        &self.values[..self.channels()]
    }

    /// Whether every channel equals `v`.
    pub fn channels_equal_to(&self, v: Volume) -> bool {
        self.values().iter().all(|&c| c == v)
    }

    /// Whether every channel is muted.
    pub fn is_muted(&self) -> bool {
        self.channels_equal_to(Volume::MUTED)
    }

    /// Whether every channel is at unity.
    pub fn is_norm(&self) -> bool {
        self.channels_equal_to(Volume::NORM)
    }

    /// Channel count within bounds and no value above [`Volume::MAX`].
    pub fn is_valid(&self) -> bool {
        self.channels > 0
            && self.channels() <= CHANNELS_MAX
            && self.values().iter().all(|&v| v <= Volume::MAX)
    }
}

impl Index<usize> for ChannelVolumes {
    type Output = Volume;

    fn index(&self, channel: usize) -> &Volume {
        &self.values()[channel]
    }
}

impl IndexMut<usize> for ChannelVolumes {
    fn index_mut(&mut self, channel: usize) -> &mut Volume {
        let channels = self.channels();
        &mut self.values[..channels][channel]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_endpoints_are_exact() {
        assert_eq!(sw_volume_to_linear(Volume::MUTED), 0.0);
        assert_eq!(sw_volume_to_linear(Volume::NORM), 1.0);
        assert_eq!(sw_volume_from_linear(1.0), Volume::NORM);
        assert_eq!(sw_volume_from_linear(0.0), Volume::MUTED);
    }

    #[test]
    fn linear_is_cubic_and_invertible() {
        let half = Volume(0x8000);
        assert!((sw_volume_to_linear(half) - 0.125).abs() < 1e-12);
        let v = sw_volume_from_linear(2.0);
        assert!((sw_volume_to_linear(v) - 2.0).abs() < 1e-3);
    }

    #[test]
    fn decibels_round_trip() {
        let v = sw_volume_from_db(-6.0);
        assert!((sw_volume_to_db(v) + 6.0).abs() < 0.01);
        assert_eq!(sw_volume_to_db(Volume::MUTED), f64::NEG_INFINITY);
        assert_eq!(sw_volume_from_db(f64::NEG_INFINITY), Volume::MUTED);
    }

    #[test]
    fn channel_predicates() {
        let mut v = ChannelVolumes::reset(2);
        assert!(v.is_norm());
        assert!(!v.is_muted());
        v[1] = Volume::MUTED;
        assert!(!v.is_norm());
        assert!(!v.is_muted());
        assert!(ChannelVolumes::mute(4).is_muted());
        assert!(ChannelVolumes::from_slice(&[]).is_err());
    }
}
