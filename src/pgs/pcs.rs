use super::ReadExt as _;
use std::io::{BufRead, Seek};
use thiserror::Error;

/// Error for `Presentation Composition Segment` handling.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading the segment buffer failed.
    #[error("Failed to read buffer with Presentation Composition Segment")]
    BufferRead(#[source] super::ReadError),
}

/// The composition state carried by a PCS, marking whether a display set
/// starts a new subtitle image or only updates the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositionState {
    /// A display update, reusing the current epoch's windows and palette.
    Normal,
    /// A refresh of the whole screen, same epoch.
    AcquisitionPoint,
    /// The start of a new epoch.
    EpochStart,
}

impl CompositionState {
    /// Whether this state begins a new subtitle item (spec: `is_start`).
    #[must_use]
    pub const fn is_start(self) -> bool {
        matches!(self, Self::AcquisitionPoint | Self::EpochStart)
    }
}

impl From<u8> for CompositionState {
    fn from(value: u8) -> Self {
        match value {
            0x80 => Self::EpochStart,
            0x40 => Self::AcquisitionPoint,
            _ => Self::Normal,
        }
    }
}

/// Presentation Composition Segment: layout and timing metadata for a display set.
#[derive(Debug)]
pub struct PresentationCompositionSegment {
    /// Presentation time of the owning display set, in milliseconds.
    pub pts_ms: u32,
    /// Video width in pixels.
    pub width: u16,
    /// Video height in pixels.
    pub height: u16,
    /// Composition state of this display set.
    pub composition_state: CompositionState,
    /// Palette id used by this composition.
    pub palette_id: u8,
    /// Number of composition objects announced by the segment.
    pub composition_object_count: u8,
}

pub(crate) fn read<R: BufRead + Seek>(
    reader: &mut R,
    segment_size: usize,
    pts_ms: u32,
) -> Result<PresentationCompositionSegment, Error> {
    let mut buf = vec![0u8; segment_size];
    reader
        .read_buffer(&mut buf)
        .map_err(Error::BufferRead)?;

    let get = |pos: usize| buf.get(pos).copied().unwrap_or(0);
    let width = u16::from_be_bytes([get(0), get(1)]);
    let height = u16::from_be_bytes([get(2), get(3)]);
    // buf[4] is frame rate, buf[5..7] is composition number, both unused.
    let composition_state = CompositionState::from(get(7));
    // buf[8] is palette update flag, unused.
    let palette_id = get(9);
    let composition_object_count = get(10);

    Ok(PresentationCompositionSegment {
        pts_ms,
        width,
        height,
        composition_state,
        palette_id,
        composition_object_count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composition_state_from_byte() {
        assert_eq!(CompositionState::from(0x80), CompositionState::EpochStart);
        assert_eq!(
            CompositionState::from(0x40),
            CompositionState::AcquisitionPoint
        );
        assert_eq!(CompositionState::from(0x00), CompositionState::Normal);
        assert!(CompositionState::EpochStart.is_start());
        assert!(CompositionState::AcquisitionPoint.is_start());
        assert!(!CompositionState::Normal.is_start());
    }

    #[test]
    fn reads_fixed_fields() {
        let mut data = vec![0x03, 0x20, 0x02, 0x58, 0x10, 0x00, 0x01, 0x80, 0x00, 0x00, 0x01];
        let mut cursor = std::io::Cursor::new(std::mem::take(&mut data));
        let pcs = read(&mut cursor, 11, 100).unwrap();
        assert_eq!(pcs.width, 0x0320);
        assert_eq!(pcs.height, 0x0258);
        assert_eq!(pcs.composition_state, CompositionState::EpochStart);
        assert_eq!(pcs.composition_object_count, 1);
    }
}
