use super::{PgsError, ReadExt as _};
use std::{
    fmt,
    io::{BufRead, ErrorKind, Seek},
};

/// Segment start Magic Number (`"PG"`).
const MAGIC_NUMBER: [u8; 2] = [0x50, 0x47];

/// Tag byte identifying the kind of a PGS segment.
#[repr(u8)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum SegmentTypeCode {
    /// Palette Definition Segment.
    Pds = 0x14,
    /// Object Definition Segment.
    Ods = 0x15,
    /// Presentation Composition Segment.
    Pcs = 0x16,
    /// Window Definition Segment.
    Wds = 0x17,
    /// End of Display Set marker.
    End = 0x80,
}

impl TryFrom<u8> for SegmentTypeCode {
    type Error = PgsError;
    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x14 => Ok(Self::Pds),
            0x15 => Ok(Self::Ods),
            0x16 => Ok(Self::Pcs),
            0x17 => Ok(Self::Wds),
            0x80 => Ok(Self::End),
            _ => Err(PgsError::SegmentInvalidTypeCode { value }),
        }
    }
}
impl From<SegmentTypeCode> for u8 {
    fn from(val: SegmentTypeCode) -> Self {
        val as Self
    }
}
impl From<SegmentTypeCode> for &'static str {
    fn from(val: SegmentTypeCode) -> Self {
        match val {
            SegmentTypeCode::Pds => "PDS",
            SegmentTypeCode::Ods => "ODS",
            SegmentTypeCode::Pcs => "PCS",
            SegmentTypeCode::Wds => "WDS",
            SegmentTypeCode::End => "END",
        }
    }
}
impl fmt::Debug for SegmentTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex: u8 = (*self).into();
        write!(f, "{hex:#02x}-{self}")
    }
}
impl fmt::Display for SegmentTypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let friendly: &str = (*self).into();
        write!(f, "{friendly}")
    }
}

/// A parsed segment header: 13 bytes of magic + timestamps + tag + size.
#[derive(Debug)]
pub(crate) struct SegmentHeader {
    pts: u32,
    type_code: SegmentTypeCode,
    size: u16,
}

impl SegmentHeader {
    /// Presentation time in milliseconds (pts is a 90kHz tick count).
    pub const fn presentation_time_ms(&self) -> u32 {
        self.pts / 90
    }
    pub const fn type_code(&self) -> SegmentTypeCode {
        self.type_code
    }
    pub const fn size(&self) -> u16 {
        self.size
    }
}

/// Length of the segment header.
const HEADER_LEN: usize = 2 + 4 + 4 + 1 + 2;

/// Read the next segment header, or `None` at a clean end of stream.
///
/// A missing `PG` magic or a header cut short (but not at a clean EOF) stops
/// the whole stream without returning an error: the design choice (spec §4.1)
/// is that malformed framing is non-fatal and the remainder is discarded.
pub(crate) fn read_header<R: BufRead>(reader: &mut R) -> Option<SegmentHeader> {
    let mut buffer = [0u8; HEADER_LEN];
    let mut filled = 0;
    while filled < HEADER_LEN {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(_) => return None,
        }
    }
    if filled < HEADER_LEN {
        return None;
    }
    parse_segment_header(buffer)
}

fn parse_segment_header(buffer: [u8; HEADER_LEN]) -> Option<SegmentHeader> {
    if buffer[0..2] != MAGIC_NUMBER {
        log::warn!(
            "Expected 'PG' magic, found {:#02x}{:#02x}; stopping at this trailer",
            buffer[0],
            buffer[1]
        );
        return None;
    }
    let pts = u32::from_be_bytes(buffer[2..6].try_into().unwrap());
    let type_code = SegmentTypeCode::try_from(buffer[10]).ok()?;
    let size = u16::from_be_bytes(buffer[11..13].try_into().unwrap());

    Some(SegmentHeader {
        pts,
        type_code,
        size,
    })
}

/// Skip a segment's payload without parsing it.
pub(crate) fn skip_segment<R: BufRead + Seek>(
    reader: &mut R,
    header: &SegmentHeader,
) -> Result<(), PgsError> {
    let data_size: usize = header.size() as usize;
    reader
        .skip_data(data_size)
        .map_err(|source| PgsError::SegmentRead {
            source,
            type_code: header.type_code(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_type_code_valid() {
        assert_eq!(
            SegmentTypeCode::try_from(0x14).unwrap(),
            SegmentTypeCode::Pds
        );
        assert_eq!(
            SegmentTypeCode::try_from(0x15).unwrap(),
            SegmentTypeCode::Ods
        );
        assert_eq!(
            SegmentTypeCode::try_from(0x16).unwrap(),
            SegmentTypeCode::Pcs
        );
        assert_eq!(
            SegmentTypeCode::try_from(0x17).unwrap(),
            SegmentTypeCode::Wds
        );
        assert_eq!(
            SegmentTypeCode::try_from(0x80).unwrap(),
            SegmentTypeCode::End
        );
    }

    #[test]
    fn segment_type_code_invalid() {
        assert!(matches!(
            SegmentTypeCode::try_from(0x00),
            Err(PgsError::SegmentInvalidTypeCode { value }) if value == 0x00));
        assert!(matches!(
            SegmentTypeCode::try_from(0x79),
            Err(PgsError::SegmentInvalidTypeCode { value }) if value == 0x79));
    }

    #[test]
    fn header_roundtrip() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MAGIC_NUMBER);
        bytes.extend_from_slice(&9000u32.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.push(SegmentTypeCode::Pcs as u8);
        bytes.extend_from_slice(&11u16.to_be_bytes());

        let mut cursor = std::io::Cursor::new(bytes);
        let header = read_header(&mut cursor).unwrap();
        assert_eq!(header.presentation_time_ms(), 100);
        assert_eq!(header.type_code(), SegmentTypeCode::Pcs);
        assert_eq!(header.size(), 11);
    }

    #[test]
    fn header_missing_magic_stops_cleanly() {
        let bytes = vec![0u8; HEADER_LEN];
        let mut cursor = std::io::Cursor::new(bytes);
        assert!(read_header(&mut cursor).is_none());
    }
}
