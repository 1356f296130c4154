use std::io::{self, Read};
use thiserror::Error;

/// Error for `Palette Definition Segment` handling.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading the segment buffer failed.
    #[error("Failed to read buffer with Palette Definition Segment")]
    BufferRead(#[source] io::Error),
}

/// A single palette color, in `YCbCr` + alpha.
#[derive(Debug, Clone, Copy)]
pub struct PaletteEntry {
    /// Luminance.
    pub y: u8,
    /// Chrominance blue.
    pub cb: u8,
    /// Chrominance red.
    pub cr: u8,
    /// Opacity (0 = fully transparent).
    pub alpha: u8,
}

impl Default for PaletteEntry {
    fn default() -> Self {
        Self {
            y: 0,
            cb: 0,
            cr: 0,
            alpha: 0,
        }
    }
}

/// A full 256-entry palette, directly indexed by entry id.
///
/// The PDS payload only lists the entries actually in use, so the table is
/// pre-filled with fully transparent black and only the referenced slots are
/// overwritten, mirroring the sparse array used by the reference decoder.
#[derive(Debug, Clone)]
pub struct Palette([PaletteEntry; 256]);

impl Palette {
    /// Look up a palette entry by id. Entries never explicitly set read back
    /// as fully transparent black, matching out-of-palette color references
    /// found in corrupt streams.
    pub fn get(&self, id: u8) -> PaletteEntry {
        self.0[id as usize]
    }

    /// Overlay entries from a newly parsed PDS onto this palette. A single
    /// epoch can send its palette across several PDS, each one only
    /// updating the entries it carries; untouched entries keep their prior
    /// value instead of being reset.
    pub(crate) fn apply(&mut self, entries: &[(u8, PaletteEntry)]) {
        for &(id, entry) in entries {
            self.0[id as usize] = entry;
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self([PaletteEntry::default(); 256])
    }
}

/// Palette Definition Segment: the colors it carries, to be overlaid onto
/// the epoch's running [`Palette`].
#[derive(Debug)]
pub(crate) struct PaletteDefinitionSegment {
    pub entries: Vec<(u8, PaletteEntry)>,
}

pub(crate) fn read<R: Read>(
    reader: &mut R,
    segment_size: usize,
) -> Result<PaletteDefinitionSegment, Error> {
    let mut buf = vec![0u8; segment_size];
    reader.read_exact(&mut buf).map_err(Error::BufferRead)?;

    let mut entries = Vec::new();
    if segment_size >= 2 {
        for chunk in buf[2..].chunks_exact(5) {
            let id = chunk[0];
            entries.push((
                id,
                PaletteEntry {
                    y: chunk[1],
                    cr: chunk[2],
                    cb: chunk[3],
                    alpha: chunk[4],
                },
            ));
        }
    }

    Ok(PaletteDefinitionSegment { entries })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_referenced_entries_and_leaves_rest_transparent() {
        let mut data = vec![0u8, 0u8];
        data.extend_from_slice(&[3, 200, 128, 128, 255]);
        let pds = read(&mut data.as_slice(), data.len()).unwrap();

        let mut palette = Palette::default();
        palette.apply(&pds.entries);

        let entry = palette.get(3);
        assert_eq!(entry.y, 200);
        assert_eq!(entry.alpha, 255);
        let untouched = palette.get(5);
        assert_eq!(untouched.alpha, 0);
    }

    #[test]
    fn apply_only_overwrites_touched_entries() {
        let mut palette = Palette::default();
        palette.apply(&[(
            0,
            PaletteEntry {
                y: 16,
                cb: 128,
                cr: 128,
                alpha: 255,
            },
        )]);
        palette.apply(&[(
            1,
            PaletteEntry {
                y: 235,
                cb: 128,
                cr: 128,
                alpha: 255,
            },
        )]);
        assert_eq!(palette.get(0).y, 16);
        assert_eq!(palette.get(1).y, 235);
    }
}
