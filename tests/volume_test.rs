use pretty_assertions::assert_eq;

use mix_kit::volume::sw_volume_from_linear;
use mix_kit::{
    ChannelVolumes, MemBlock, MemChunk, SampleFormat, SampleSpec, Volume, silence_memchunk,
    volume_memchunk, volume_memory,
};

fn spec(format: SampleFormat, channels: usize) -> SampleSpec {
    SampleSpec::new(format, 48_000, channels).unwrap()
}

fn s16le(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

#[test]
fn unity_volume_leaves_bytes_alone() {
    let data = vec![1, 2, 3, 4, 5, 6, 7, 8];
    let chunk = MemChunk::from_vec(data.clone());
    volume_memchunk(&chunk, &spec(SampleFormat::S16Be, 2), &ChannelVolumes::reset(2));
    assert_eq!(&chunk.acquire()[..], &data[..]);
}

#[test]
fn silent_block_is_skipped() {
    let data = s16le(&[1000, 2000]);
    let block = MemBlock::new(data.clone());
    block.set_is_silence(true);
    let chunk = MemChunk::new(block.clone());

    volume_memchunk(&chunk, &spec(SampleFormat::S16Le, 1), &ChannelVolumes::mute(1));
    assert_eq!(&chunk.acquire()[..], &data[..]);
    assert_eq!(block.n_acquired(), 0);
}

#[test]
fn muted_volume_writes_format_silence() {
    for format in [SampleFormat::U8, SampleFormat::Alaw, SampleFormat::Ulaw, SampleFormat::S24Le] {
        let spec = spec(format, 1);
        let chunk = MemChunk::from_vec(vec![0x42; spec.frame_size() * 4]);
        volume_memchunk(&chunk, &spec, &ChannelVolumes::mute(1));
        assert_eq!(
            &chunk.acquire()[..],
            &vec![format.silence_byte(); spec.frame_size() * 4][..],
            "{format}"
        );
    }
}

#[test]
fn half_volume_on_u8() {
    let mut data = vec![0x90, 0x70, 0x80];
    volume_memory(
        &mut data,
        &spec(SampleFormat::U8, 1),
        &ChannelVolumes::set(1, sw_volume_from_linear(0.5)),
    );
    assert_eq!(data, vec![0x88, 0x78, 0x80]);
}

#[test]
fn amplification_saturates_s16() {
    let mut data = s16le(&[20_000, -20_000, 100]);
    volume_memory(
        &mut data,
        &spec(SampleFormat::S16Le, 1),
        &ChannelVolumes::set(1, sw_volume_from_linear(2.0)),
    );
    let samples: Vec<i16> = data
        .chunks_exact(2)
        .map(|c| i16::from_le_bytes([c[0], c[1]]))
        .collect();
    assert_eq!(samples[0], i16::MAX);
    assert_eq!(samples[1], i16::MIN);
    assert!((samples[2] - 200).abs() <= 1, "{}", samples[2]);
}

#[test]
fn u8_minimum_amplified_stays_minimum() {
    let mut data = vec![0x00];
    volume_memory(
        &mut data,
        &spec(SampleFormat::U8, 1),
        &ChannelVolumes::set(1, sw_volume_from_linear(2.0)),
    );
    assert_eq!(data, vec![0x00]);
}

#[test]
fn float_volume_is_not_clamped() {
    let mut data = 0.75f32.to_be_bytes().to_vec();
    volume_memory(
        &mut data,
        &spec(SampleFormat::Float32Be, 1),
        &ChannelVolumes::set(1, sw_volume_from_linear(2.0)),
    );
    let value = f32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    assert!((value - 1.5).abs() < 1e-3, "{value}");
}

#[test]
fn per_channel_volume_on_stereo() {
    let spec = spec(SampleFormat::S32Le, 2);
    let volume = ChannelVolumes::from_slice(&[Volume::MUTED, Volume::NORM]).unwrap();
    let mut data: Vec<u8> = [7i32, 1_000_000, -7, -1_000_000]
        .iter()
        .flat_map(|s| s.to_le_bytes())
        .collect();
    volume_memory(&mut data, &spec, &volume);

    let expected: Vec<u8> = [0i32, 1_000_000, 0, -1_000_000]
        .iter()
        .flat_map(|s| s.to_le_bytes())
        .collect();
    assert_eq!(data, expected);
}

#[test]
fn reverse_endian_volume_matches_native() {
    let volume = ChannelVolumes::set(1, Volume(0x9000));
    let native: Vec<i32> = vec![8_000_000, -8_000_000, 12_345, -1];

    let mut le: Vec<u8> = native.iter().flat_map(|s| s.to_le_bytes()[..3].to_vec()).collect();
    let mut be: Vec<u8> = native.iter().flat_map(|s| s.to_be_bytes()[1..].to_vec()).collect();
    volume_memory(&mut le, &spec(SampleFormat::S24Le, 1), &volume);
    volume_memory(&mut be, &spec(SampleFormat::S24Be, 1), &volume);

    let swapped: Vec<u8> = be
        .chunks_exact(3)
        .flat_map(|c| [c[2], c[1], c[0]])
        .collect();
    assert_eq!(le, swapped);
}

#[test]
fn scaled_chunk_is_released() {
    let block = MemBlock::new(s16le(&[4000, 4000]));
    let chunk = MemChunk::new(block.clone());
    volume_memchunk(
        &chunk,
        &spec(SampleFormat::S16Le, 1),
        &ChannelVolumes::set(1, Volume(0x8000)),
    );
    assert_eq!(block.n_acquired(), 0);
    assert_eq!(&chunk.acquire()[..], &s16le(&[500, 500])[..]);
}

#[test]
fn silence_memchunk_uses_format_silence() {
    let chunk = MemChunk::from_vec(vec![0; 4]);
    silence_memchunk(&chunk, &spec(SampleFormat::Ulaw, 2));
    assert_eq!(&chunk.acquire()[..], &[0xff; 4][..]);
}
