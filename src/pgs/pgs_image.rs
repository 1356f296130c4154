use super::{pds::PaletteEntry, rle, Palette};
use crate::image::ImageSize;
use image::{GrayImage, Luma, Rgba, RgbaImage};
use std::cell::OnceCell;

/// A subtitle bitmap: raw RLE object data plus the palette it was painted
/// with, decoding lazily on first use.
pub struct PgsImage {
    width_hint: u16,
    raw: Vec<u8>,
    palette: Palette,
    decoded: OnceCell<rle::DecodedImage>,
}

impl PgsImage {
    /// Build an image from an ODS's raw object data and its in-scope palette.
    #[must_use]
    pub fn new(width_hint: u16, raw: Vec<u8>, palette: Palette) -> Self {
        Self {
            width_hint,
            raw,
            palette,
            decoded: OnceCell::new(),
        }
    }

    fn decoded(&self) -> &rle::DecodedImage {
        self.decoded
            .get_or_init(|| rle::decode(&self.raw, self.width_hint))
    }

    fn entry_at(&self, idx: u8) -> PaletteEntry {
        self.palette.get(idx)
    }

    /// Render the OCR-friendly binary variant: dark ink on a white background.
    #[must_use]
    pub fn to_binary_image(&self) -> GrayImage {
        let decoded = self.decoded();
        let width = u32::try_from(decoded.width).unwrap_or(0);
        let height = u32::try_from(decoded.height).unwrap_or(0);
        GrayImage::from_fn(width, height, |x, y| {
            let idx = (y as usize) * decoded.width + (x as usize);
            let entry = decoded
                .indices
                .get(idx)
                .copied()
                .map_or_else(|| self.entry_at(0), |color| self.entry_at(color));
            Luma([if entry.y > 127 { 0 } else { 255 }])
        })
    }

    /// Render the full-color BGRA variant used for debug dumps.
    #[must_use]
    pub fn to_color_image(&self) -> RgbaImage {
        let decoded = self.decoded();
        let width = u32::try_from(decoded.width).unwrap_or(0);
        let height = u32::try_from(decoded.height).unwrap_or(0);
        RgbaImage::from_fn(width, height, |x, y| {
            let idx = (y as usize) * decoded.width + (x as usize);
            let entry = decoded
                .indices
                .get(idx)
                .copied()
                .map_or_else(|| self.entry_at(0), |color| self.entry_at(color));
            Rgba(ycbcr_to_bgra(entry))
        })
    }
}

impl ImageSize for PgsImage {
    fn width(&self) -> u32 {
        u32::try_from(self.decoded().width).unwrap_or(0)
    }
    fn height(&self) -> u32 {
        u32::try_from(self.decoded().height).unwrap_or(0)
    }
}

fn ycbcr_to_bgra(entry: PaletteEntry) -> [u8; 4] {
    let y = f32::from(entry.y);
    let cb = f32::from(entry.cb) - 128.0;
    let cr = f32::from(entry.cr) - 128.0;

    let r = y + 1.402 * cr;
    let g = y - 0.344_136 * cb - 0.714_136 * cr;
    let b = y + 1.772 * cb;

    [
        b.clamp(0.0, 255.0) as u8,
        g.clamp(0.0, 255.0) as u8,
        r.clamp(0.0, 255.0) as u8,
        entry.alpha,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pgs::pds;

    fn palette_with(entries: &[(u8, PaletteEntry)]) -> Palette {
        let mut data = vec![0u8, 0u8];
        for (id, entry) in entries {
            data.push(*id);
            data.push(entry.y);
            data.push(entry.cr);
            data.push(entry.cb);
            data.push(entry.alpha);
        }
        let mut palette = Palette::default();
        palette.apply(&pds::read(&mut data.as_slice(), data.len()).unwrap().entries);
        palette
    }

    #[test]
    fn binary_image_maps_bright_luma_to_black_ink() {
        let white = PaletteEntry {
            y: 235,
            cb: 128,
            cr: 128,
            alpha: 255,
        };
        let black = PaletteEntry {
            y: 16,
            cb: 128,
            cr: 128,
            alpha: 255,
        };
        let palette = palette_with(&[(0, black), (1, white)]);
        // one pixel: color1 (bright/white entry), then EOL
        let raw = vec![1u8, 0, 0, 0];
        let image = PgsImage::new(2, raw, palette);
        let rendered = image.to_binary_image();
        assert_eq!(rendered.width(), 1);
        assert_eq!(rendered.get_pixel(0, 0).0, [0]);
    }

    #[test]
    fn decoding_is_lazy_and_cached() {
        let palette = palette_with(&[(0, PaletteEntry::default())]);
        let image = PgsImage::new(1, vec![1u8, 0, 0], palette);
        assert_eq!(image.width(), 1);
        assert_eq!(image.width(), 1);
    }
}
