//! Save-state view of the channel list.
//!
//! The chip's persistent state is exactly its five [`Channel`] records. They are plain data with
//! a fixed layout, so an external state writer copies them verbatim instead of walking fields.

use crate::channel::Channel;
use crate::NUM_CHANNELS;
use std::mem;
use thiserror::Error;

/// Oldest state version that can be loaded into this layout.
pub const SNAPSHOT_MIN_VERSION: u32 = 0x029705;

pub const SNAPSHOT_AREA_NAME: &str = "K051649 Channel list";

pub const SNAPSHOT_LEN: usize = NUM_CHANNELS * mem::size_of::<Channel>();

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("channel list snapshot must be {expected} bytes, was {actual}")]
    Length { expected: usize, actual: usize },
    #[error("cannot restore a snapshot into an uninitialized chip")]
    Uninitialized,
}

#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    pub name: &'static str,
    pub min_version: u32,
    pub data: &'a [u8],
}

/// Mutable view of the channel list for a restorer that copies bytes in place.
///
/// Register fields are re-masked when the view is dropped, so arbitrary bytes written through
/// [`data`](Self::data) cannot leave a channel in a state the synthesizer does not expect.
#[derive(Debug)]
pub struct SnapshotAreaMut<'a> {
    pub name: &'static str,
    pub min_version: u32,
    channels: &'a mut [Channel; NUM_CHANNELS],
}

impl SnapshotAreaMut<'_> {
    #[must_use]
    pub fn data(&mut self) -> &mut [u8] {
        bytemuck::bytes_of_mut(self.channels)
    }
}

impl Drop for SnapshotAreaMut<'_> {
    fn drop(&mut self) {
        for channel in self.channels.iter_mut() {
            channel.sanitize();
        }
    }
}

pub(crate) fn describe(channels: &[Channel; NUM_CHANNELS]) -> Snapshot<'_> {
    Snapshot {
        name: SNAPSHOT_AREA_NAME,
        min_version: SNAPSHOT_MIN_VERSION,
        data: bytemuck::bytes_of(channels),
    }
}

pub(crate) fn area_mut(channels: &mut [Channel; NUM_CHANNELS]) -> SnapshotAreaMut<'_> {
    SnapshotAreaMut { name: SNAPSHOT_AREA_NAME, min_version: SNAPSHOT_MIN_VERSION, channels }
}

pub(crate) fn restore(
    channels: &mut [Channel; NUM_CHANNELS],
    bytes: &[u8],
) -> Result<(), SnapshotError> {
    if bytes.len() != SNAPSHOT_LEN {
        return Err(SnapshotError::Length { expected: SNAPSHOT_LEN, actual: bytes.len() });
    }

    bytemuck::bytes_of_mut(channels).copy_from_slice(bytes);
    for channel in channels {
        channel.sanitize();
    }

    Ok(())
}
