//! EXIF orientation handling.
//!
//! Camera sensors store pixels in sensor order and record how the picture
//! should be turned in the EXIF `Orientation` tag. Everything downstream
//! (thumbnails, stored dimensions) works on upright pixels.

use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// The eight EXIF orientations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// 1
    #[default]
    Normal,
    /// 2
    FlipHorizontal,
    /// 3
    Rotate180,
    /// 4
    FlipVertical,
    /// 5: rotate 90 clockwise, then flip horizontally
    Transpose,
    /// 6
    Rotate90,
    /// 7: rotate 270 clockwise, then flip horizontally
    Transverse,
    /// 8
    Rotate270,
}

impl Orientation {
    /// Map an EXIF code; anything missing or outside 1..=8 is upright.
    pub fn from_exif(code: Option<u16>) -> Self {
        match code {
            Some(2) => Orientation::FlipHorizontal,
            Some(3) => Orientation::Rotate180,
            Some(4) => Orientation::FlipVertical,
            Some(5) => Orientation::Transpose,
            Some(6) => Orientation::Rotate90,
            Some(7) => Orientation::Transverse,
            Some(8) => Orientation::Rotate270,
            _ => Orientation::Normal,
        }
    }

    pub fn code(self) -> u16 {
        match self {
            Orientation::Normal => 1,
            Orientation::FlipHorizontal => 2,
            Orientation::Rotate180 => 3,
            Orientation::FlipVertical => 4,
            Orientation::Transpose => 5,
            Orientation::Rotate90 => 6,
            Orientation::Transverse => 7,
            Orientation::Rotate270 => 8,
        }
    }

    /// Codes 5 to 8 turn the picture on its side
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Orientation::Transpose
                | Orientation::Rotate90
                | Orientation::Transverse
                | Orientation::Rotate270
        )
    }

    /// Dimensions after correction
    pub fn oriented_dimensions(self, width: u32, height: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// The orientation that undoes this one
    pub fn inverse(self) -> Self {
        match self {
            Orientation::Rotate90 => Orientation::Rotate270,
            Orientation::Rotate270 => Orientation::Rotate90,
            other => other,
        }
    }

    /// Turn stored pixels upright
    pub fn apply(self, image: DynamicImage) -> DynamicImage {
        match self {
            Orientation::Normal => image,
            Orientation::FlipHorizontal => image.fliph(),
            Orientation::Rotate180 => image.rotate180(),
            Orientation::FlipVertical => image.flipv(),
            Orientation::Transpose => image.rotate90().fliph(),
            Orientation::Rotate90 => image.rotate90(),
            Orientation::Transverse => image.rotate270().fliph(),
            Orientation::Rotate270 => image.rotate270(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    /// Every pixel distinct so any misplacement shows up
    fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(width, height, |x, y| {
            Rgb([x as u8, y as u8, (x * 7 + y * 13) as u8])
        }))
    }

    #[test]
    fn codes_round_trip() {
        for code in 1..=8u16 {
            assert_eq!(Orientation::from_exif(Some(code)).code(), code);
        }
    }

    #[test]
    fn unknown_codes_are_upright() {
        assert_eq!(Orientation::from_exif(None), Orientation::Normal);
        assert_eq!(Orientation::from_exif(Some(0)), Orientation::Normal);
        assert_eq!(Orientation::from_exif(Some(9)), Orientation::Normal);
    }

    #[test]
    fn apply_then_inverse_is_identity() {
        let original = gradient(5, 3);
        for code in 1..=8u16 {
            let orientation = Orientation::from_exif(Some(code));
            let restored = orientation
                .inverse()
                .apply(orientation.apply(original.clone()));
            assert_eq!(restored.to_rgb8(), original.to_rgb8(), "code {code}");
        }
    }

    #[test]
    fn sideways_codes_swap_dimensions() {
        let original = gradient(6, 4);
        for code in 1..=8u16 {
            let orientation = Orientation::from_exif(Some(code));
            let turned = orientation.apply(original.clone());
            let expected = orientation.oriented_dimensions(6, 4);
            assert_eq!((turned.width(), turned.height()), expected, "code {code}");
            assert_eq!(orientation.swaps_dimensions(), code >= 5);
        }
    }

    #[test]
    fn rotate90_moves_bottom_left_to_top_left() {
        let original = gradient(3, 2).to_rgb8();
        let turned = Orientation::Rotate90.apply(gradient(3, 2)).to_rgb8();
        assert_eq!(turned.get_pixel(0, 0), original.get_pixel(0, 1));
    }

    #[test]
    fn transpose_swaps_axes() {
        let original = gradient(4, 3).to_rgb8();
        let turned = Orientation::Transpose.apply(gradient(4, 3)).to_rgb8();
        for y in 0..3 {
            for x in 0..4 {
                assert_eq!(turned.get_pixel(y, x), original.get_pixel(x, y));
            }
        }
    }
}
