//! Per-format mixing and volume kernels.
//!
//! Every format shares one accumulate-and-saturate loop. A [`SampleKernel`]
//! supplies the pieces that differ: sample width, how a raw sample is decoded
//! and scaled by a gain, the accumulator type, and how the accumulator is
//! saturated and encoded back.
//!
//! 8-bit, 16-bit and companded kernels multiply the 16.16 gain in two halves,
//! `((v * lo) >> 16) + v * hi`, which keeps the product inside 32 bits. The
//! 24- and 32-bit kernels widen to 64 bits before shifting.

use std::marker::PhantomData;
use std::slice::ChunksExact;

use byteorder::ByteOrder;

use crate::format::CHANNELS_MAX;
use crate::g711;
use crate::linear::{LINEAR_LEN, LinearVolume};

/// One input to a mix routine: the readable bytes of a stream and its gains.
#[derive(Clone, Copy, Debug)]
pub struct MixSource<'a> {
    /// Interleaved samples, at least as long as the destination.
    pub samples: &'a [u8],
    /// Padded per-channel gains for this stream.
    pub linear: &'a LinearVolume,
}

/// Format-specific operations plugged into [`mix_generic`] and [`volume_generic`].
pub trait SampleKernel {
    /// Bytes per sample.
    const WIDTH: usize;
    /// Gain representation.
    type Gain: Copy + PartialOrd + Default;
    /// Accumulator wide enough for the sum of all scaled inputs.
    type Acc: Copy + Default;

    /// Borrow the gains in this kernel's representation.
    ///
    /// Panics if `linear` holds the other representation.
    fn gains(linear: &LinearVolume) -> &[Self::Gain; LINEAR_LEN];
    /// Decode one raw sample and multiply it by `gain`.
    fn scale(raw: &[u8], gain: Self::Gain) -> Self::Acc;
    /// Add a scaled sample to the accumulator.
    fn add(acc: Self::Acc, value: Self::Acc) -> Self::Acc;
    /// Saturate and encode the accumulator into `out`.
    fn store(acc: Self::Acc, out: &mut [u8]);
}

fn integer_gains(linear: &LinearVolume) -> &[i32; LINEAR_LEN] {
    match linear.as_integer() {
        Some(gains) => gains,
        None => panic!("integer sample kernel handed float gains"),
    }
}

fn float_gains(linear: &LinearVolume) -> &[f32; LINEAR_LEN] {
    match linear.as_float() {
        Some(gains) => gains,
        None => panic!("float sample kernel handed fixed-point gains"),
    }
}

#[inline(always)]
fn split_mul(v: i32, gain: i32) -> i32 {
    let hi = gain >> 16;
    let lo = gain & 0xffff;
    ((v * lo) >> 16) + v * hi
}

#[inline(always)]
fn wide_mul(v: i32, gain: i32) -> i64 {
    (i64::from(v) * i64::from(gain)) >> 16
}

#[inline(always)]
fn clamp_i16(acc: i32) -> i16 {
    acc.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
}

#[inline(always)]
fn clamp_i32(acc: i64) -> i32 {
    acc.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Unsigned 8-bit PCM.
pub struct U8Kernel;

impl SampleKernel for U8Kernel {
    const WIDTH: usize = 1;
    type Gain = i32;
    type Acc = i32;

    fn gains(linear: &LinearVolume) -> &[i32; LINEAR_LEN] {
        integer_gains(linear)
    }

    #[inline(always)]
    fn scale(raw: &[u8], gain: i32) -> i32 {
        split_mul(i32::from(raw[0]) - 0x80, gain)
    }

    #[inline(always)]
    fn add(acc: i32, value: i32) -> i32 {
        acc.saturating_add(value)
    }

    #[inline(always)]
    fn store(acc: i32, out: &mut [u8]) {
        out[0] = (acc.clamp(-0x80, 0x7f) + 0x80) as u8;
    }
}

/// 8-bit µ-law. Output loses its two low bits before encoding.
pub struct UlawKernel;

impl SampleKernel for UlawKernel {
    const WIDTH: usize = 1;
    type Gain = i32;
    type Acc = i32;

    fn gains(linear: &LinearVolume) -> &[i32; LINEAR_LEN] {
        integer_gains(linear)
    }

    #[inline(always)]
    fn scale(raw: &[u8], gain: i32) -> i32 {
        split_mul(i32::from(g711::ulaw_to_linear16(raw[0])), gain)
    }

    #[inline(always)]
    fn add(acc: i32, value: i32) -> i32 {
        acc.saturating_add(value)
    }

    #[inline(always)]
    fn store(acc: i32, out: &mut [u8]) {
        out[0] = g711::linear14_to_ulaw(clamp_i16(acc) >> 2);
    }
}

/// 8-bit A-law. Output loses its three low bits before encoding.
pub struct AlawKernel;

impl SampleKernel for AlawKernel {
    const WIDTH: usize = 1;
    type Gain = i32;
    type Acc = i32;

    fn gains(linear: &LinearVolume) -> &[i32; LINEAR_LEN] {
        integer_gains(linear)
    }

    #[inline(always)]
    fn scale(raw: &[u8], gain: i32) -> i32 {
        split_mul(i32::from(g711::alaw_to_linear16(raw[0])), gain)
    }

    #[inline(always)]
    fn add(acc: i32, value: i32) -> i32 {
        acc.saturating_add(value)
    }

    #[inline(always)]
    fn store(acc: i32, out: &mut [u8]) {
        out[0] = g711::linear13_to_alaw(clamp_i16(acc) >> 3);
    }
}

/// Signed 16-bit PCM in byte order `E`.
pub struct S16<E>(PhantomData<E>);

impl<E: ByteOrder> SampleKernel for S16<E> {
    const WIDTH: usize = 2;
    type Gain = i32;
    type Acc = i32;

    fn gains(linear: &LinearVolume) -> &[i32; LINEAR_LEN] {
        integer_gains(linear)
    }

    #[inline(always)]
    fn scale(raw: &[u8], gain: i32) -> i32 {
        split_mul(i32::from(E::read_i16(raw)), gain)
    }

    #[inline(always)]
    fn add(acc: i32, value: i32) -> i32 {
        acc.saturating_add(value)
    }

    #[inline(always)]
    fn store(acc: i32, out: &mut [u8]) {
        E::write_i16(out, clamp_i16(acc));
    }
}

/// Signed 32-bit PCM in byte order `E`.
pub struct S32<E>(PhantomData<E>);

impl<E: ByteOrder> SampleKernel for S32<E> {
    const WIDTH: usize = 4;
    type Gain = i32;
    type Acc = i64;

    fn gains(linear: &LinearVolume) -> &[i32; LINEAR_LEN] {
        integer_gains(linear)
    }

    #[inline(always)]
    fn scale(raw: &[u8], gain: i32) -> i64 {
        wide_mul(E::read_i32(raw), gain)
    }

    #[inline(always)]
    fn add(acc: i64, value: i64) -> i64 {
        acc.saturating_add(value)
    }

    #[inline(always)]
    fn store(acc: i64, out: &mut [u8]) {
        E::write_i32(out, clamp_i32(acc));
    }
}

/// Signed 24-bit PCM packed in three bytes, byte order `E`.
///
/// Samples are lifted into the top of an `i32` so saturation happens at the
/// 32-bit bounds, which are the 24-bit bounds shifted left by eight.
pub struct S24<E>(PhantomData<E>);

impl<E: ByteOrder> SampleKernel for S24<E> {
    const WIDTH: usize = 3;
    type Gain = i32;
    type Acc = i64;

    fn gains(linear: &LinearVolume) -> &[i32; LINEAR_LEN] {
        integer_gains(linear)
    }

    #[inline(always)]
    fn scale(raw: &[u8], gain: i32) -> i64 {
        wide_mul((E::read_u24(raw) << 8) as i32, gain)
    }

    #[inline(always)]
    fn add(acc: i64, value: i64) -> i64 {
        acc.saturating_add(value)
    }

    #[inline(always)]
    fn store(acc: i64, out: &mut [u8]) {
        E::write_u24(out, (clamp_i32(acc) as u32) >> 8);
    }
}

/// Signed 24-bit PCM in the low bits of a 32-bit container, byte order `E`.
///
/// The unused top byte is ignored on read and written as zero.
pub struct S24In32<E>(PhantomData<E>);

impl<E: ByteOrder> SampleKernel for S24In32<E> {
    const WIDTH: usize = 4;
    type Gain = i32;
    type Acc = i64;

    fn gains(linear: &LinearVolume) -> &[i32; LINEAR_LEN] {
        integer_gains(linear)
    }

    #[inline(always)]
    fn scale(raw: &[u8], gain: i32) -> i64 {
        wide_mul((E::read_u32(raw) << 8) as i32, gain)
    }

    #[inline(always)]
    fn add(acc: i64, value: i64) -> i64 {
        acc.saturating_add(value)
    }

    #[inline(always)]
    fn store(acc: i64, out: &mut [u8]) {
        E::write_u32(out, (clamp_i32(acc) as u32) >> 8);
    }
}

/// 32-bit IEEE float in byte order `E`. No saturation.
pub struct Float32<E>(PhantomData<E>);

impl<E: ByteOrder> SampleKernel for Float32<E> {
    const WIDTH: usize = 4;
    type Gain = f32;
    type Acc = f32;

    fn gains(linear: &LinearVolume) -> &[f32; LINEAR_LEN] {
        float_gains(linear)
    }

    #[inline(always)]
    fn scale(raw: &[u8], gain: f32) -> f32 {
        E::read_f32(raw) * gain
    }

    #[inline(always)]
    fn add(acc: f32, value: f32) -> f32 {
        acc + value
    }

    #[inline(always)]
    fn store(acc: f32, out: &mut [u8]) {
        E::write_f32(out, acc);
    }
}

struct Cursor<'a, G> {
    samples: ChunksExact<'a, u8>,
    gains: &'a [G; LINEAR_LEN],
}

/// Mix `streams` into `data`, one destination sample at a time.
///
/// Streams with a non-positive gain on the current channel contribute nothing
/// and are not decoded, but their cursor still advances.
pub fn mix_generic<K: SampleKernel>(streams: &[MixSource<'_>], channels: usize, data: &mut [u8]) {
    assert!(
        channels > 0 && channels <= CHANNELS_MAX,
        "invalid channel count {channels}"
    );

    let mut cursors: Vec<Cursor<'_, K::Gain>> = streams
        .iter()
        .map(|source| {
            assert!(
                source.samples.len() >= data.len(),
                "mix source of {} bytes is shorter than the {}-byte destination",
                source.samples.len(),
                data.len()
            );
            Cursor {
                samples: source.samples.chunks_exact(K::WIDTH),
                gains: K::gains(source.linear),
            }
        })
        .collect();

    let silent = K::Gain::default();
    let mut channel = 0;

    for out in data.chunks_exact_mut(K::WIDTH) {
        let mut acc = K::Acc::default();

        for cursor in cursors.iter_mut() {
            let raw = cursor.samples.next();
            let gain = cursor.gains[channel];
            if gain > silent {
                if let Some(raw) = raw {
                    acc = K::add(acc, K::scale(raw, gain));
                }
            }
        }

        K::store(acc, out);

        channel += 1;
        if channel >= channels {
            channel = 0;
        }
    }
}

/// Scale `data` in place by `linear`.
pub fn volume_generic<K: SampleKernel>(data: &mut [u8], linear: &LinearVolume, channels: usize) {
    assert!(
        channels > 0 && channels <= CHANNELS_MAX,
        "invalid channel count {channels}"
    );
    let gains = K::gains(linear);
    let mut channel = 0;

    for sample in data.chunks_exact_mut(K::WIDTH) {
        let scaled = K::scale(sample, gains[channel]);
        K::store(scaled, sample);

        channel += 1;
        if channel >= channels {
            channel = 0;
        }
    }
}
