//! Top-level mixing and volume entry points.

use tracing::{debug, trace};

use crate::dispatch::{calc_stream_volumes_func, calc_volume_func, get_mix_func, get_volume_func};
use crate::format::{SampleSpec, silence_memory};
use crate::kernel::MixSource;
use crate::linear::LinearVolume;
use crate::memblock::{ChunkRead, MemChunk};
use crate::volume::ChannelVolumes;

/// One stream handed to [`mix`].
#[derive(Clone, Debug)]
pub struct MixInfo {
    /// Samples to read.
    pub chunk: MemChunk,
    /// Per-channel software volume of this stream.
    pub volume: ChannelVolumes,
    /// Combined gains, filled in by [`mix`].
    pub linear: LinearVolume,
}

impl MixInfo {
    /// Describe a stream. Gains are computed when it is mixed.
    pub fn new(chunk: MemChunk, volume: ChannelVolumes) -> Self {
        Self {
            chunk,
            volume,
            linear: LinearVolume::default(),
        }
    }
}

/// Mix `streams` into `data` and return the number of bytes written.
///
/// With `mute` set, an all-muted master `volume`, or no streams, `data` is
/// filled with silence and its full length is returned without touching any
/// stream. Otherwise the result covers the shortest of `data` and every
/// stream chunk, rounded down to whole frames. `volume` defaults to unity.
///
/// Panics if `data` is empty or not frame aligned, if `spec` is invalid, or
/// if a volume's channel count differs from `spec`.
pub fn mix(
    streams: &mut [MixInfo],
    data: &mut [u8],
    spec: &SampleSpec,
    volume: Option<&ChannelVolumes>,
    mute: bool,
) -> usize {
    assert!(!data.is_empty(), "mix destination is empty");
    assert!(spec.is_valid(), "invalid sample spec {spec}");
    assert!(
        spec.frame_aligned(data.len()),
        "mix destination of {} bytes is not aligned to {spec}",
        data.len()
    );

    let volume = volume
        .copied()
        .unwrap_or_else(|| ChannelVolumes::reset(spec.channels()));
    assert_eq!(
        volume.channels(),
        spec.channels(),
        "master volume channel count"
    );

    if mute || volume.is_muted() || streams.is_empty() {
        trace!(
            format = %spec.format,
            streams = streams.len(),
            length = data.len(),
            mute,
            "mix produced silence"
        );
        silence_memory(data, spec.format);
        return data.len();
    }

    for stream in streams.iter() {
        assert_eq!(
            stream.volume.channels(),
            spec.channels(),
            "stream volume channel count"
        );
    }

    calc_stream_volumes_func(spec.format)(streams, &volume, spec);

    let views: Vec<ChunkRead<'_>> = streams.iter().map(|s| s.chunk.acquire()).collect();
    let length = views
        .iter()
        .fold(data.len(), |length, view| length.min(view.len()));
    let length = length - length % spec.frame_size();
    if length < data.len() {
        debug!(requested = data.len(), length, "mix clamped to shortest stream");
    }

    let sources: Vec<MixSource<'_>> = views
        .iter()
        .zip(streams.iter())
        .map(|(view, stream)| MixSource {
            samples: &view[..length],
            linear: &stream.linear,
        })
        .collect();

    get_mix_func(spec.format)(&sources, spec.channels(), &mut data[..length]);
    trace!(
        format = %spec.format,
        streams = sources.len(),
        length,
        "mixed"
    );

    drop(sources);
    drop(views);
    length
}

enum VolumePlan {
    Untouched,
    Silence,
    Scale(LinearVolume),
}

fn plan_volume(spec: &SampleSpec, volume: &ChannelVolumes) -> VolumePlan {
    assert!(spec.is_valid(), "invalid sample spec {spec}");
    assert_eq!(volume.channels(), spec.channels(), "volume channel count");

    if volume.is_norm() {
        VolumePlan::Untouched
    } else if volume.is_muted() {
        VolumePlan::Silence
    } else {
        VolumePlan::Scale(calc_volume_func(spec.format)(volume))
    }
}

/// Scale `data` in place by `volume`.
///
/// Unity leaves the bytes untouched and an all-muted volume writes silence.
pub fn volume_memory(data: &mut [u8], spec: &SampleSpec, volume: &ChannelVolumes) {
    assert!(
        spec.frame_aligned(data.len()),
        "buffer of {} bytes is not aligned to {spec}",
        data.len()
    );
    match plan_volume(spec, volume) {
        VolumePlan::Untouched => {}
        VolumePlan::Silence => silence_memory(data, spec.format),
        VolumePlan::Scale(linear) => {
            get_volume_func(spec.format)(data, &linear, spec.channels());
        }
    }
}

/// Scale the bytes of `chunk` in place by `volume`.
///
/// Chunks whose block is flagged silent are left alone.
pub fn volume_memchunk(chunk: &MemChunk, spec: &SampleSpec, volume: &ChannelVolumes) {
    assert!(
        spec.frame_aligned(chunk.length),
        "chunk of {} bytes is not aligned to {spec}",
        chunk.length
    );
    if chunk.memblock.is_silence() {
        trace!("volume skipped on silent block");
        return;
    }

    match plan_volume(spec, volume) {
        VolumePlan::Untouched => {}
        VolumePlan::Silence => silence_memchunk(chunk, spec),
        VolumePlan::Scale(linear) => {
            let do_volume = get_volume_func(spec.format);
            let mut view = chunk.acquire_mut();
            do_volume(&mut view, &linear, spec.channels());
            trace!(format = %spec.format, length = view.len(), "volume applied");
        }
    }
}

/// Overwrite the bytes of `chunk` with silence.
pub fn silence_memchunk(chunk: &MemChunk, spec: &SampleSpec) {
    silence_memory(&mut chunk.acquire_mut(), spec.format);
}
