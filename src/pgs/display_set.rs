use super::{
    pcs::PresentationCompositionSegment, pds::Palette, pgs_image::PgsImage,
    wds::WindowDefinitionSegment,
};

/// One object's RLE data, as reassembled from its ODS fragment(s).
#[derive(Default)]
pub(super) struct RawImage {
    pub width_hint: u16,
    pub data: Vec<u8>,
}

/// One composed subtitle frame: the segments collected between two `END`
/// markers (spec §4.2).
#[derive(Default)]
pub struct DisplaySet {
    pub(super) pcs: Option<PresentationCompositionSegment>,
    pub(super) wds: Option<WindowDefinitionSegment>,
    pub(super) raw_images: Vec<RawImage>,
    pub(super) palette: Palette,
}

impl DisplaySet {
    /// Presentation time of this display set, in milliseconds.
    #[must_use]
    pub fn pts_ms(&self) -> u32 {
        self.pcs.as_ref().map_or(0, |pcs| pcs.pts_ms)
    }

    /// Whether this display set starts a new subtitle item, i.e. its PCS
    /// composition state is `AcquisitionPoint` or `EpochStart`.
    #[must_use]
    pub fn is_start(&self) -> bool {
        self.pcs
            .as_ref()
            .is_some_and(|pcs| pcs.composition_state.is_start())
    }

    /// Whether this display set carries a decodable subtitle image.
    #[must_use]
    pub fn has_image(&self) -> bool {
        !self.raw_images.is_empty()
    }

    /// Build the subtitle image from this display set's accumulated ODS
    /// data and the palette it held at `END`.
    ///
    /// When the display set carries several object definitions, their raw
    /// data is concatenated in ODS order and decoded as a single bitmap
    /// (spec §4.4): in practice a display set almost always holds exactly
    /// one object, but the format does not forbid more.
    #[must_use]
    pub fn build_image(&self) -> Option<PgsImage> {
        let first = self.raw_images.first()?;
        let width_hint = first.width_hint;
        let data = self
            .raw_images
            .iter()
            .flat_map(|raw| raw.data.iter().copied())
            .collect::<Vec<_>>();
        Some(PgsImage::new(width_hint, data, self.palette.clone()))
    }

    /// The window offset `(x, y)` used to place the image on screen: the
    /// minimum over every window this display set defines.
    #[must_use]
    pub fn window_offset(&self) -> Option<(u16, u16)> {
        let windows = self.wds.as_ref()?;
        windows
            .windows
            .iter()
            .map(|w| (w.x_offset, w.y_offset))
            .reduce(|(ax, ay), (bx, by)| (ax.min(bx), ay.min(by)))
    }
}
