use image::{EncodableLayout, Pixel, PixelWithColorType};
use std::{
    borrow::Borrow,
    fs::create_dir_all,
    io,
    ops::Deref,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Errors raised while dumping debug images to disk.
#[derive(Error, Debug)]
pub enum DumpError {
    /// The destination folder could not be created.
    #[error("Could not create path for dump images '{}'", path.display())]
    Folder {
        /// Path of the folder.
        path: PathBuf,
        /// Source error.
        source: io::Error,
    },

    /// One image could not be written to disk.
    #[error("Could not write image dump file '{}'", filename.display())]
    DumpImage {
        /// Path of the file that failed to write.
        filename: PathBuf,
        /// Source error.
        source: image::ImageError,
    },
}

/// Dump a sequence of images into `path`, numbered `000000.png`, `000001.png`, ...
///
/// Used to inspect intermediate mosaic/OCR images when debugging a rip.
///
/// # Errors
///
/// Returns [`DumpError`] if the folder cannot be created or a file cannot be written.
#[profiling::function]
pub fn dump_images<'a, Iter, Img, P, Container>(path: &str, images: Iter) -> Result<(), DumpError>
where
    P: Pixel + PixelWithColorType + 'a,
    [P::Subpixel]: EncodableLayout,
    Container: Deref<Target = [P::Subpixel]> + 'a,
    Img: Borrow<image::ImageBuffer<P, Container>>,
    Iter: IntoIterator<Item = Img>,
{
    let folder_path = PathBuf::from(path);

    if !folder_path.is_dir() {
        create_dir_all(folder_path.as_path()).map_err(|source| DumpError::Folder {
            path: folder_path.clone(),
            source,
        })?;
    }

    images
        .into_iter()
        .enumerate()
        .try_for_each(move |(i, img)| {
            let mut filepath = folder_path.clone();
            filepath.push(format!("{i:06}.png"));
            dump_image(&filepath, img.borrow()).map_err(|source| DumpError::DumpImage {
                filename: filepath,
                source,
            })
        })
}

fn dump_image<P, Pix, Container>(
    filename: P,
    image: &image::ImageBuffer<Pix, Container>,
) -> Result<(), image::ImageError>
where
    P: AsRef<Path>,
    Pix: Pixel + PixelWithColorType,
    [Pix::Subpixel]: EncodableLayout,
    Container: Deref<Target = [Pix::Subpixel]>,
{
    image.save(filename)
}
