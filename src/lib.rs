#![deny(missing_docs)]

//! Sample mixing and software volume kernel for a PCM audio server.
//!
//! [`mix`] sums any number of interleaved streams, each with its own
//! per-channel [`ChannelVolumes`], into one destination buffer under a master
//! volume, saturating to the destination [`SampleFormat`]. [`volume_memchunk`]
//! scales a single buffer in place. Thirteen encodings are supported: unsigned
//! 8-bit, µ-law, A-law, signed 16/24/32-bit and 24-in-32-bit PCM plus 32-bit
//! float, each multi-byte format in both byte orders.
//!
//! Per-format routines are looked up in process-wide tables (see
//! [`dispatch`]) that other layers may override at runtime.

use std::sync::Once;

pub mod dispatch;
pub mod format;
pub mod g711;
pub mod kernel;
pub mod linear;
pub mod memblock;
pub mod mix;
pub mod volume;


pub use dispatch::{get_mix_func, get_volume_func, set_mix_func, set_volume_func};
pub use format::{CHANNELS_MAX, SampleFormat, SampleSpec, SpecError, silence_memory};
pub use linear::LinearVolume;
pub use memblock::{MemBlock, MemChunk};
pub use mix::{MixInfo, mix, silence_memchunk, volume_memchunk, volume_memory};
pub use volume::{ChannelVolumes, Volume};

static TRACING_INIT: Once = Once::new();

/// Install a `tracing_subscriber` formatter once per process.
///
/// Calling this is optional; the library only emits events.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let _ = tracing_subscriber::fmt::try_init();
    });
}
