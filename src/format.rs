//! Sample formats, sample specs and format-correct silence.

use std::fmt;
use std::str::FromStr;

/// Maximum number of channels a [`SampleSpec`] may carry.
pub const CHANNELS_MAX: usize = 32;

/// Highest sample rate accepted by [`SampleSpec::new`].
pub const RATE_MAX: u32 = 48_000 * 8;

/// Errors raised while building or parsing sample specs.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    /// Format name did not match any known encoding.
    #[error("unknown sample format: {0}")]
    UnknownFormat(String),
    /// Sample rate was zero or above [`RATE_MAX`].
    #[error("invalid sample rate {0}")]
    InvalidRate(u32),
    /// Channel count was zero or above [`CHANNELS_MAX`].
    #[error("invalid channel count {0}, must be between 1 and {max}", max = CHANNELS_MAX)]
    InvalidChannels(usize),
}

/// Binary encoding of a single sample.
///
/// The discriminant doubles as the index into the dispatch tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SampleFormat {
    /// Unsigned 8-bit PCM, silence at `0x80`.
    U8 = 0,
    /// 8-bit A-law (G.711).
    Alaw = 1,
    /// 8-bit µ-law (G.711).
    Ulaw = 2,
    /// Signed 16-bit PCM, little endian.
    S16Le = 3,
    /// Signed 16-bit PCM, big endian.
    S16Be = 4,
    /// 32-bit IEEE float, little endian, nominal range -1.0..1.0.
    Float32Le = 5,
    /// 32-bit IEEE float, big endian, nominal range -1.0..1.0.
    Float32Be = 6,
    /// Signed 32-bit PCM, little endian.
    S32Le = 7,
    /// Signed 32-bit PCM, big endian.
    S32Be = 8,
    /// Signed 24-bit PCM packed in three bytes, little endian.
    S24Le = 9,
    /// Signed 24-bit PCM packed in three bytes, big endian.
    S24Be = 10,
    /// Signed 24-bit PCM in the low bits of a 32-bit container, little endian.
    S24_32Le = 11,
    /// Signed 24-bit PCM in the low bits of a 32-bit container, big endian.
    S24_32Be = 12,
}

impl SampleFormat {
    /// Number of distinct formats.
    pub const COUNT: usize = 13;

    /// Every format in discriminant order.
    pub const ALL: [SampleFormat; Self::COUNT] = [
        SampleFormat::U8,
        SampleFormat::Alaw,
        SampleFormat::Ulaw,
        SampleFormat::S16Le,
        SampleFormat::S16Be,
        SampleFormat::Float32Le,
        SampleFormat::Float32Be,
        SampleFormat::S32Le,
        SampleFormat::S32Be,
        SampleFormat::S24Le,
        SampleFormat::S24Be,
        SampleFormat::S24_32Le,
        SampleFormat::S24_32Be,
    ];

    /// Signed 16-bit in host byte order.
    #[cfg(target_endian = "little")]
    pub const S16NE: SampleFormat = SampleFormat::S16Le;
    /// Signed 16-bit in host byte order.
    #[cfg(target_endian = "big")]
    pub const S16NE: SampleFormat = SampleFormat::S16Be;
    /// Signed 16-bit in reverse byte order.
    #[cfg(target_endian = "little")]
    pub const S16RE: SampleFormat = SampleFormat::S16Be;
    /// Signed 16-bit in reverse byte order.
    #[cfg(target_endian = "big")]
    pub const S16RE: SampleFormat = SampleFormat::S16Le;
    /// 32-bit float in host byte order.
    #[cfg(target_endian = "little")]
    pub const FLOAT32NE: SampleFormat = SampleFormat::Float32Le;
    /// 32-bit float in host byte order.
    #[cfg(target_endian = "big")]
    pub const FLOAT32NE: SampleFormat = SampleFormat::Float32Be;
    /// 32-bit float in reverse byte order.
    #[cfg(target_endian = "little")]
    pub const FLOAT32RE: SampleFormat = SampleFormat::Float32Be;
    /// 32-bit float in reverse byte order.
    #[cfg(target_endian = "big")]
    pub const FLOAT32RE: SampleFormat = SampleFormat::Float32Le;

    /// Position of this format in the dispatch tables.
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Look a format up by table index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Bytes occupied by one sample.
    pub const fn sample_size(self) -> usize {
        match self {
            SampleFormat::U8 | SampleFormat::Alaw | SampleFormat::Ulaw => 1,
            SampleFormat::S16Le | SampleFormat::S16Be => 2,
            SampleFormat::S24Le | SampleFormat::S24Be => 3,
            SampleFormat::Float32Le
            | SampleFormat::Float32Be
            | SampleFormat::S32Le
            | SampleFormat::S32Be
            | SampleFormat::S24_32Le
            | SampleFormat::S24_32Be => 4,
        }
    }

    /// Whether gains for this format are carried as floats rather than 16.16 fixed point.
    pub const fn is_float(self) -> bool {
        matches!(self, SampleFormat::Float32Le | SampleFormat::Float32Be)
    }

    /// Byte value that encodes silence for this format.
    ///
    /// Multi-byte formats are silent when every byte is zero.
    pub const fn silence_byte(self) -> u8 {
        match self {
            SampleFormat::U8 => 0x80,
            SampleFormat::Alaw => 0xd5,
            SampleFormat::Ulaw => 0xff,
            _ => 0x00,
        }
    }

    /// Canonical lowercase name.
    pub const fn name(self) -> &'static str {
        match self {
            SampleFormat::U8 => "u8",
            SampleFormat::Alaw => "alaw",
            SampleFormat::Ulaw => "ulaw",
            SampleFormat::S16Le => "s16le",
            SampleFormat::S16Be => "s16be",
            SampleFormat::Float32Le => "float32le",
            SampleFormat::Float32Be => "float32be",
            SampleFormat::S32Le => "s32le",
            SampleFormat::S32Be => "s32be",
            SampleFormat::S24Le => "s24le",
            SampleFormat::S24Be => "s24be",
            SampleFormat::S24_32Le => "s24-32le",
            SampleFormat::S24_32Be => "s24-32be",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleFormat {
    type Err = SpecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        if let Some(format) = Self::ALL.iter().find(|f| f.name() == lower) {
            return Ok(*format);
        }
        // Host-relative aliases.
        let (base, host) = match lower.strip_suffix("ne") {
            Some(base) => (base, true),
            None => match lower.strip_suffix("re") {
                Some(base) => (base, false),
                None => return Err(SpecError::UnknownFormat(s.to_string())),
            },
        };
        let little = host == cfg!(target_endian = "little");
        let name = format!("{base}{}", if little { "le" } else { "be" });
        Self::ALL
            .iter()
            .find(|f| f.name() == name)
            .copied()
            .ok_or_else(|| SpecError::UnknownFormat(s.to_string()))
    }
}

/// Format, rate and channel count of a stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SampleSpec {
    /// Sample encoding.
    pub format: SampleFormat,
    /// Frames per second.
    pub rate: u32,
    /// Interleaved channels per frame.
    pub channels: u8,
}

impl SampleSpec {
    /// Build a validated spec.
    pub fn new(format: SampleFormat, rate: u32, channels: usize) -> Result<Self, SpecError> {
        if rate == 0 || rate > RATE_MAX {
            return Err(SpecError::InvalidRate(rate));
        }
        if channels == 0 || channels > CHANNELS_MAX {
            return Err(SpecError::InvalidChannels(channels));
        }
        Ok(Self {
            format,
            rate,
            channels: channels as u8,
        })
    }

    /// Check rate and channel bounds on a spec built by hand.
    pub fn is_valid(&self) -> bool {
        self.rate > 0
            && self.rate <= RATE_MAX
            && self.channels > 0
            && usize::from(self.channels) <= CHANNELS_MAX
    }

    /// Channel count as `usize`.
    pub fn channels(&self) -> usize {
        usize::from(self.channels)
    }

    /// Bytes per sample.
    pub fn sample_size(&self) -> usize {
        self.format.sample_size()
    }

    /// Bytes per frame.
    pub fn frame_size(&self) -> usize {
        self.sample_size() * self.channels()
    }

    /// Bytes consumed per second of audio.
    pub fn bytes_per_second(&self) -> usize {
        self.frame_size() * self.rate as usize
    }

    /// Whether `length` bytes hold a whole number of frames.
    pub fn frame_aligned(&self, length: usize) -> bool {
        length % self.frame_size() == 0
    }
}

impl fmt::Display for SampleSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}ch {}Hz", self.format, self.channels, self.rate)
    }
}

/// Overwrite `data` with silence for `format`.
pub fn silence_memory(data: &mut [u8], format: SampleFormat) {
    data.fill(format.silence_byte());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_and_host_names() {
        for format in SampleFormat::ALL {
            assert_eq!(format.name().parse::<SampleFormat>(), Ok(format));
        }
        assert_eq!("S16NE".parse::<SampleFormat>(), Ok(SampleFormat::S16NE));
        assert_eq!("float32re".parse::<SampleFormat>(), Ok(SampleFormat::FLOAT32RE));
        assert!(matches!(
            "s20le".parse::<SampleFormat>(),
            Err(SpecError::UnknownFormat(_))
        ));
    }

    #[test]
    fn spec_validation() {
        assert!(SampleSpec::new(SampleFormat::S16Le, 44_100, 2).is_ok());
        assert_eq!(
            SampleSpec::new(SampleFormat::S16Le, 44_100, 33),
            Err(SpecError::InvalidChannels(33))
        );
        assert_eq!(
            SampleSpec::new(SampleFormat::S16Le, 0, 2),
            Err(SpecError::InvalidRate(0))
        );
    }

    #[test]
    fn frame_geometry() {
        let spec = SampleSpec::new(SampleFormat::S24Le, 48_000, 2).unwrap();
        assert_eq!(spec.frame_size(), 6);
        assert!(spec.frame_aligned(12));
        assert!(!spec.frame_aligned(9));
        assert_eq!(spec.bytes_per_second(), 288_000);
    }
}
