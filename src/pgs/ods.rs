use super::{u24::u24, ReadExt as _};
use std::io::{BufRead, Seek};
use thiserror::Error;

/// Error for `Object Definition Segment` handling.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading the segment buffer failed.
    #[error("Failed to read buffer with Object Definition Segment")]
    BufferRead(#[source] super::ReadError),
    /// An ODS fragment other than the first did not continue a pending sequence.
    #[error("Object Definition Segment continuation without a preceding First fragment")]
    UnexpectedContinuation,
}

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SequenceFlag {
    Last = 0x40,
    First = 0x80,
    FirstAndLast = 0xC0,
    Middle = 0x00,
}

impl From<u8> for SequenceFlag {
    fn from(value: u8) -> Self {
        match value {
            0x40 => Self::Last,
            0x80 => Self::First,
            0xC0 => Self::FirstAndLast,
            _ => Self::Middle,
        }
    }
}

/// An object still accumulating data across several ODS fragments.
#[derive(Debug)]
pub(crate) struct PendingObject {
    width: u16,
    height: u16,
    data: Vec<u8>,
}

/// The outcome of reading one ODS fragment.
#[derive(Debug)]
pub(crate) enum ObjectDefinitionSegment {
    /// A fragment whose sequence is still open; feed this back into `read` as
    /// `pending` together with the next ODS fragment.
    Partial(PendingObject),
    /// All fragments have been read: the RLE-encoded object is complete.
    Complete {
        width: u16,
        height: u16,
        data: Vec<u8>,
    },
}

pub(crate) fn read<R: BufRead + Seek>(
    reader: &mut R,
    segment_size: usize,
    pending: Option<PendingObject>,
) -> Result<ObjectDefinitionSegment, Error> {
    let mut buf = vec![0u8; segment_size];
    reader.read_buffer(&mut buf).map_err(Error::BufferRead)?;

    let get = |pos: usize| buf.get(pos).copied().unwrap_or(0);

    // object_id(2) + object_version_number(1) + sequence_flag(1) + data_length(3)
    let sequence_flag = SequenceFlag::from(get(3));
    // object_data_length includes width+height on the first fragment; the
    // reference decoder never needs it since fragments are reassembled
    // by concatenation and the final length is simply `data.len()`.
    let _object_data_length = u24::from([get(4), get(5), get(6)]).to_u32();

    let is_first = matches!(
        sequence_flag,
        SequenceFlag::First | SequenceFlag::FirstAndLast
    );
    let is_last = matches!(
        sequence_flag,
        SequenceFlag::Last | SequenceFlag::FirstAndLast
    );

    let (width, height, fragment_data) = if is_first {
        let width = u16::from_be_bytes([get(7), get(8)]);
        let height = u16::from_be_bytes([get(9), get(10)]);
        (width, height, buf.get(11..).unwrap_or(&[]))
    } else {
        let Some(pending) = &pending else {
            return Err(Error::UnexpectedContinuation);
        };
        (pending.width, pending.height, buf.get(7..).unwrap_or(&[]))
    };

    let mut data = if is_first {
        Vec::new()
    } else {
        pending.map_or_else(Vec::new, |p| p.data)
    };
    data.extend_from_slice(fragment_data);

    if is_last {
        Ok(ObjectDefinitionSegment::Complete {
            width,
            height,
            data,
        })
    } else {
        Ok(ObjectDefinitionSegment::Partial(PendingObject {
            width,
            height,
            data,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ods_header(flag: u8, payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![0u8, 1, 0, flag];
        let data_len = u32::try_from(payload.len() + 4).unwrap();
        let len_bytes = data_len.to_be_bytes();
        buf.extend_from_slice(&len_bytes[1..]);
        buf.extend_from_slice(payload);
        buf
    }

    #[test]
    fn single_fragment_is_immediately_complete() {
        let mut payload = vec![0u8, 4, 0, 1]; // width=4, height=1
        payload.extend_from_slice(&[0, 1, 0, 1]);
        let bytes = ods_header(0xC0, &payload);
        let size = bytes.len();
        let mut cursor = std::io::Cursor::new(bytes);
        match read(&mut cursor, size, None).unwrap() {
            ObjectDefinitionSegment::Complete {
                width,
                height,
                data,
            } => {
                assert_eq!(width, 4);
                assert_eq!(height, 1);
                assert_eq!(data, vec![0, 1, 0, 1]);
            }
            ObjectDefinitionSegment::Partial(_) => panic!("expected complete object"),
        }
    }

    #[test]
    fn multi_fragment_accumulates_across_calls() {
        let mut first_payload = vec![0u8, 4, 0, 1];
        first_payload.extend_from_slice(&[0, 1]);
        let first_bytes = ods_header(0x80, &first_payload);
        let first_size = first_bytes.len();
        let mut first_cursor = std::io::Cursor::new(first_bytes);
        let pending = match read(&mut first_cursor, first_size, None).unwrap() {
            ObjectDefinitionSegment::Partial(p) => p,
            ObjectDefinitionSegment::Complete { .. } => panic!("expected partial object"),
        };

        let last_bytes = ods_header(0x40, &[0, 1]);
        let last_size = last_bytes.len();
        let mut last_cursor = std::io::Cursor::new(last_bytes);
        match read(&mut last_cursor, last_size, Some(pending)).unwrap() {
            ObjectDefinitionSegment::Complete {
                width,
                height,
                data,
            } => {
                assert_eq!(width, 4);
                assert_eq!(height, 1);
                assert_eq!(data, vec![0, 1, 0, 1]);
            }
            ObjectDefinitionSegment::Partial(_) => panic!("expected complete object"),
        }
    }

    #[test]
    fn continuation_without_pending_errors() {
        let bytes = ods_header(0x40, &[0, 1]);
        let size = bytes.len();
        let mut cursor = std::io::Cursor::new(bytes);
        assert!(matches!(
            read(&mut cursor, size, None),
            Err(Error::UnexpectedContinuation)
        ));
    }
}
