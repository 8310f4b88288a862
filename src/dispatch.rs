//! Process-wide per-format routine tables.
//!
//! Three tables are keyed by [`SampleFormat`]: gain combination, mixing and
//! in-place volume scaling. The mixing and volume tables can be overridden at
//! runtime, for instance by a SIMD layer installing faster routines during
//! startup. Lookups take a shared lock, replacements an exclusive one.

use byteorder::{BigEndian, LittleEndian};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use crate::format::SampleFormat;
use crate::kernel::{
    AlawKernel, Float32, MixSource, S16, S24, S24In32, S32, U8Kernel, UlawKernel, mix_generic,
    volume_generic,
};
use crate::linear::{
    CalcStreamVolumesFn, LinearVolume, calc_linear_float_stream_volumes, calc_linear_float_volume,
    calc_linear_integer_stream_volumes, calc_linear_integer_volume,
};
use crate::volume::ChannelVolumes;

/// Mix routine: `(streams, channels, destination)`.
pub type DoMixFn = fn(&[MixSource<'_>], usize, &mut [u8]);

/// In-place volume routine: `(samples, gains, channels)`.
pub type DoVolumeFn = fn(&mut [u8], &LinearVolume, usize);

/// Linearization routine for a single volume vector.
pub type CalcVolumeFn = fn(&ChannelVolumes) -> LinearVolume;

static MIX_TABLE: Lazy<RwLock<[DoMixFn; SampleFormat::COUNT]>> =
    Lazy::new(|| RwLock::new(SampleFormat::ALL.map(default_mix_func)));

static VOLUME_TABLE: Lazy<RwLock<[DoVolumeFn; SampleFormat::COUNT]>> =
    Lazy::new(|| RwLock::new(SampleFormat::ALL.map(default_volume_func)));

fn linear_integer(volume: &ChannelVolumes) -> LinearVolume {
    LinearVolume::Integer(calc_linear_integer_volume(volume))
}

fn linear_float(volume: &ChannelVolumes) -> LinearVolume {
    LinearVolume::Float(calc_linear_float_volume(volume))
}

/// Gain combiner for `format`: float for float formats, fixed point otherwise.
pub fn calc_stream_volumes_func(format: SampleFormat) -> CalcStreamVolumesFn {
    if format.is_float() {
        calc_linear_float_stream_volumes
    } else {
        calc_linear_integer_stream_volumes
    }
}

/// Volume linearizer for `format`.
pub fn calc_volume_func(format: SampleFormat) -> CalcVolumeFn {
    if format.is_float() {
        linear_float
    } else {
        linear_integer
    }
}

/// Reference mix routine for `format`.
pub fn default_mix_func(format: SampleFormat) -> DoMixFn {
    match format {
        SampleFormat::U8 => mix_generic::<U8Kernel>,
        SampleFormat::Alaw => mix_generic::<AlawKernel>,
        SampleFormat::Ulaw => mix_generic::<UlawKernel>,
        SampleFormat::S16Le => mix_generic::<S16<LittleEndian>>,
        SampleFormat::S16Be => mix_generic::<S16<BigEndian>>,
        SampleFormat::Float32Le => mix_generic::<Float32<LittleEndian>>,
        SampleFormat::Float32Be => mix_generic::<Float32<BigEndian>>,
        SampleFormat::S32Le => mix_generic::<S32<LittleEndian>>,
        SampleFormat::S32Be => mix_generic::<S32<BigEndian>>,
        SampleFormat::S24Le => mix_generic::<S24<LittleEndian>>,
        SampleFormat::S24Be => mix_generic::<S24<BigEndian>>,
        SampleFormat::S24_32Le => mix_generic::<S24In32<LittleEndian>>,
        SampleFormat::S24_32Be => mix_generic::<S24In32<BigEndian>>,
    }
}

/// Reference in-place volume routine for `format`.
pub fn default_volume_func(format: SampleFormat) -> DoVolumeFn {
    match format {
        SampleFormat::U8 => volume_generic::<U8Kernel>,
        SampleFormat::Alaw => volume_generic::<AlawKernel>,
        SampleFormat::Ulaw => volume_generic::<UlawKernel>,
        SampleFormat::S16Le => volume_generic::<S16<LittleEndian>>,
        SampleFormat::S16Be => volume_generic::<S16<BigEndian>>,
        SampleFormat::Float32Le => volume_generic::<Float32<LittleEndian>>,
        SampleFormat::Float32Be => volume_generic::<Float32<BigEndian>>,
        SampleFormat::S32Le => volume_generic::<S32<LittleEndian>>,
        SampleFormat::S32Be => volume_generic::<S32<BigEndian>>,
        SampleFormat::S24Le => volume_generic::<S24<LittleEndian>>,
        SampleFormat::S24Be => volume_generic::<S24<BigEndian>>,
        SampleFormat::S24_32Le => volume_generic::<S24In32<LittleEndian>>,
        SampleFormat::S24_32Be => volume_generic::<S24In32<BigEndian>>,
    }
}

/// Mix routine currently registered for `format`.
pub fn get_mix_func(format: SampleFormat) -> DoMixFn {
    MIX_TABLE.read()[format.index()]
}

/// Register `func` as the mix routine for `format`.
pub fn set_mix_func(format: SampleFormat, func: DoMixFn) {
    MIX_TABLE.write()[format.index()] = func;
    debug!(%format, "mix routine replaced");
}

/// Volume routine currently registered for `format`.
pub fn get_volume_func(format: SampleFormat) -> DoVolumeFn {
    VOLUME_TABLE.read()[format.index()]
}

/// Register `func` as the in-place volume routine for `format`.
pub fn set_volume_func(format: SampleFormat, func: DoVolumeFn) {
    VOLUME_TABLE.write()[format.index()] = func;
    debug!(%format, "volume routine replaced");
}

/// Restore the reference routines for every format.
pub fn reset_dispatch_tables() {
    *MIX_TABLE.write() = SampleFormat::ALL.map(default_mix_func);
    *VOLUME_TABLE.write() = SampleFormat::ALL.map(default_volume_func);
    debug!("dispatch tables reset");
}
