use super::ReadExt as _;
use std::io::{BufRead, Seek};
use thiserror::Error;

/// Error for `Window Definition Segment` handling.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading the segment buffer failed.
    #[error("Failed to read buffer with Window Definition Segment")]
    BufferRead(#[source] super::ReadError),
}

/// A single window entry: placement of a subtitle window on screen.
#[derive(Debug, Clone, Copy)]
pub struct WindowEntry {
    /// Window id.
    pub id: u8,
    /// Horizontal offset of the window, in pixels.
    pub x_offset: u16,
    /// Vertical offset of the window, in pixels.
    pub y_offset: u16,
    /// Window width, in pixels.
    pub width: u16,
    /// Window height, in pixels.
    pub height: u16,
}

/// Window Definition Segment: placement of the windows used by a display set.
#[derive(Debug)]
pub struct WindowDefinitionSegment {
    /// The windows defined by this segment, in stream order.
    pub windows: Vec<WindowEntry>,
}

pub(crate) fn read<R: BufRead + Seek>(
    reader: &mut R,
    segment_size: usize,
) -> Result<WindowDefinitionSegment, Error> {
    let mut buf = vec![0u8; segment_size];
    reader
        .read_buffer(&mut buf)
        .map_err(Error::BufferRead)?;

    let count = buf.first().copied().unwrap_or(0) as usize;
    let mut windows = Vec::with_capacity(count);
    for idx in 0..count {
        let offset = 1 + idx * 9;
        if offset + 9 > buf.len() {
            break;
        }
        windows.push(WindowEntry {
            id: buf[offset],
            x_offset: u16::from_be_bytes([buf[offset + 1], buf[offset + 2]]),
            y_offset: u16::from_be_bytes([buf[offset + 3], buf[offset + 4]]),
            width: u16::from_be_bytes([buf[offset + 5], buf[offset + 6]]),
            height: u16::from_be_bytes([buf[offset + 7], buf[offset + 8]]),
        });
    }

    Ok(WindowDefinitionSegment { windows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_windows() {
        let mut data = vec![1u8, 0, 0, 10, 0, 20, 0, 100, 0, 50];
        let mut cursor = std::io::Cursor::new(std::mem::take(&mut data));
        let wds = read(&mut cursor, 10).unwrap();
        assert_eq!(wds.windows.len(), 1);
        assert_eq!(wds.windows[0].x_offset, 10);
        assert_eq!(wds.windows[0].y_offset, 20);
        assert_eq!(wds.windows[0].width, 100);
        assert_eq!(wds.windows[0].height, 50);
    }

    #[test]
    fn truncated_window_list_is_dropped_not_fatal() {
        let mut data = vec![2u8, 0, 0, 10, 0, 20, 0, 100, 0, 50];
        let mut cursor = std::io::Cursor::new(std::mem::take(&mut data));
        let wds = read(&mut cursor, 10).unwrap();
        assert_eq!(wds.windows.len(), 1);
    }
}
