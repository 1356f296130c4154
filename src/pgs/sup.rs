use super::{
    display_set::{DisplaySet, RawImage},
    ods, pcs, pds, segment, wds, PgsError, SegmentTypeCode,
};
use log::warn;
use std::{
    fs::File,
    io::{BufRead, BufReader, Seek},
    path::Path,
};

/// Parses a `.sup` (Presentation Graphic Stream) byte stream into a sequence
/// of [`DisplaySet`]s.
///
/// A palette carries over across display sets within the same epoch (a
/// stream commonly only resends PDS on the epoch's first display set), so
/// the parser keeps the most recently seen palette around rather than
/// resetting it at every `END`.
///
/// Malformed framing never surfaces as an error to callers (spec §4.1,
/// §7 `InvalidSegment`): a missing magic, an unknown tag, or a segment cut
/// short by a truncated file all just end the iterator early, after
/// logging a warning. Display sets already yielded stay valid.
pub struct SupParser<Reader>
where
    Reader: BufRead + Seek,
{
    reader: Reader,
    current_palette: pds::Palette,
    pending_ods: Option<ods::PendingObject>,
    building: DisplaySet,
    pcs_count: u32,
    wds_count: u32,
    done: bool,
}

impl<Reader> SupParser<Reader>
where
    Reader: BufRead + Seek,
{
    /// Create a parser from a buffered, seekable reader.
    pub fn new(reader: Reader) -> Self {
        Self {
            reader,
            current_palette: pds::Palette::default(),
            pending_ods: None,
            building: DisplaySet::default(),
            pcs_count: 0,
            wds_count: 0,
            done: false,
        }
    }
}

impl SupParser<BufReader<File>> {
    /// Open a `.sup` file and build a parser reading it.
    ///
    /// # Errors
    ///
    /// Returns [`PgsError::Io`] if the file cannot be opened.
    pub fn from_path(path: &Path) -> Result<Self, PgsError> {
        let file = File::open(path).map_err(|source| PgsError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<Reader> Iterator for SupParser<Reader>
where
    Reader: BufRead + Seek,
{
    type Item = DisplaySet;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            let Some(header) = segment::read_header(&mut self.reader) else {
                self.done = true;
                return None;
            };
            let type_code = header.type_code();
            let size = usize::from(header.size());

            let result = match type_code {
                SegmentTypeCode::Pds => pds::read(&mut self.reader, size)
                    .map(|parsed| {
                        self.current_palette.apply(&parsed.entries);
                    })
                    .map_err(PgsError::from),
                SegmentTypeCode::Ods => ods::read(&mut self.reader, size, self.pending_ods.take())
                    .map(|outcome| match outcome {
                        ods::ObjectDefinitionSegment::Partial(pending) => {
                            self.pending_ods = Some(pending);
                        }
                        ods::ObjectDefinitionSegment::Complete {
                            width,
                            height: _,
                            data,
                        } => {
                            self.building.raw_images.push(RawImage {
                                width_hint: width,
                                data,
                            });
                        }
                    })
                    .map_err(PgsError::from),
                SegmentTypeCode::Pcs => {
                    pcs::read(&mut self.reader, size, header.presentation_time_ms())
                        .map(|parsed| {
                            self.pcs_count += 1;
                            self.building.pcs = Some(parsed);
                        })
                        .map_err(PgsError::from)
                }
                SegmentTypeCode::Wds => wds::read(&mut self.reader, size)
                    .map(|parsed| {
                        self.wds_count += 1;
                        self.building.wds = Some(parsed);
                    })
                    .map_err(PgsError::from),
                SegmentTypeCode::End => segment::skip_segment(&mut self.reader, &header),
            };

            if let Err(err) = result {
                warn!("Stopping PGS stream: {err} ({type_code})");
                self.done = true;
                return None;
            }

            if type_code == SegmentTypeCode::End {
                if self.pcs_count != 1 {
                    warn!("Display set has {} PCS, expected exactly 1", self.pcs_count);
                }
                if self.wds_count != 1 {
                    warn!("Display set has {} WDS, expected exactly 1", self.wds_count);
                }
                self.pcs_count = 0;
                self.wds_count = 0;

                self.building.palette = self.current_palette.clone();
                let finished = std::mem::take(&mut self.building);
                return Some(finished);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn segment(tag: u8, pts: u32, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0x50, 0x47];
        bytes.extend_from_slice(&pts.to_be_bytes());
        bytes.extend_from_slice(&0u32.to_be_bytes());
        bytes.push(tag);
        bytes.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    fn minimal_stream() -> Vec<u8> {
        let mut stream = Vec::new();

        // PCS: width,height,frame_rate,composition_number,state=EPOCH_START,palette_update,palette_id,count
        let pcs_payload = [0, 10, 0, 1, 0x10, 0, 0, 0x80, 0, 0, 0];
        stream.extend(segment(0x16, 9000, &pcs_payload));

        // WDS: one window, offset (10,20), size 4x1
        let wds_payload = [1, 0, 0, 10, 0, 20, 0, 4, 0, 1];
        stream.extend(segment(0x17, 9000, &wds_payload));

        // PDS: two entries, 0=black opaque, 1=white opaque
        let pds_payload = [0, 0, 0, 16, 128, 128, 255, 1, 235, 128, 128, 255];
        stream.extend(segment(0x14, 9000, &pds_payload));

        // ODS: FirstAndLast, object 4x1 "0,1,0,1"
        let mut ods_payload = vec![0, 1, 0, 0xC0, 0, 0, 8, 0, 4, 0, 1];
        ods_payload.extend_from_slice(&[1, 1, 1, 1]);
        stream.extend(segment(0x15, 9000, &ods_payload));

        stream.extend(segment(0x80, 9000, &[]));
        stream
    }

    #[test]
    fn parses_minimal_display_set() {
        let stream = minimal_stream();

        let parser = SupParser::new(Cursor::new(stream));
        let sets: Vec<_> = parser.collect();
        assert_eq!(sets.len(), 1);
        let ds = &sets[0];
        assert!(ds.is_start());
        assert!(ds.has_image());
        assert_eq!(ds.window_offset(), Some((10, 20)));
        assert_eq!(ds.pts_ms(), 100);
    }

    #[test]
    fn empty_stream_yields_no_display_sets() {
        let parser = SupParser::new(Cursor::new(Vec::new()));
        let sets: Vec<_> = parser.collect();
        assert!(sets.is_empty());
    }

    #[test]
    fn truncated_trailer_stops_without_losing_prior_sets() {
        let mut stream = minimal_stream();
        // Append a second segment's header only, cut off mid-payload.
        stream.extend(segment(0x16, 18_000, &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]));
        stream.truncate(stream.len() - 5);

        let parser = SupParser::new(Cursor::new(stream));
        let sets: Vec<_> = parser.collect();
        assert_eq!(sets.len(), 1);
    }

    #[test]
    fn unknown_tag_byte_stops_the_stream() {
        let mut stream = minimal_stream();
        stream.extend(segment(0x99, 20_000, &[]));
        let parser = SupParser::new(Cursor::new(stream));
        let sets: Vec<_> = parser.collect();
        assert_eq!(sets.len(), 1);
    }
}
