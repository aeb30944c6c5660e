//! Grayscale reduction.
//!
//! Collapses the three color channels of every pixel into one scalar and
//! writes it back into blue, green and red, with alpha forced opaque. This
//! is the first step of the pipeline: a color buffer in, a gray buffer of
//! the same dimensions out.
//!
//! Weighted methods use exact integer arithmetic, so the result is the
//! truncation of the exact weighted sum (white stays 255).

use serde::{Deserialize, Serialize};

use crate::buffer::{ALPHA, BLUE, GREEN, PixelBuffer, RED};
use crate::parallel;
use crate::types::ImagingError;

/// How to reduce `(R, G, B)` to one gray value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GrayscaleMethod {
    /// `(R + G + B) / 3`, truncated.
    Average,
    /// ITU-R BT.601 luma: `0.299 R + 0.587 G + 0.114 B`.
    #[default]
    Bt601,
    /// ITU-R BT.709 luma: `0.2126 R + 0.7152 G + 0.0722 B`.
    Bt709,
    /// `0.25 R + 0.5 G + 0.25 B`.
    WeightedQuarter,
    /// Largest of the three channels.
    Max,
    /// Smallest of the three channels.
    Min,
}

impl GrayscaleMethod {
    /// All methods in code order.
    pub const ALL: [Self; 6] = [
        Self::Average,
        Self::Bt601,
        Self::Bt709,
        Self::WeightedQuarter,
        Self::Max,
        Self::Min,
    ];

    /// Reduce one color to its gray value.
    #[must_use]
    pub fn reduce(self, r: u8, g: u8, b: u8) -> u8 {
        let (r32, g32, b32) = (u32::from(r), u32::from(g), u32::from(b));
        let v = match self {
            Self::Average => (r32 + g32 + b32) / 3,
            Self::Bt601 => (2990 * r32 + 5870 * g32 + 1140 * b32) / 10_000,
            Self::Bt709 => (2126 * r32 + 7152 * g32 + 722 * b32) / 10_000,
            Self::WeightedQuarter => (r32 + 2 * g32 + b32) / 4,
            Self::Max => return r.max(g).max(b),
            Self::Min => return r.min(g).min(b),
        };
        // Every weight set sums to one, so v <= 255.
        u8::try_from(v).unwrap_or(u8::MAX)
    }
}

impl TryFrom<u8> for GrayscaleMethod {
    type Error = ImagingError;

    /// Decode a numeric method code (`0..=5`, in [`GrayscaleMethod::ALL`] order).
    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(code))
            .copied()
            .ok_or_else(|| ImagingError::InvalidParameter(format!("unknown grayscale method {code}")))
    }
}

/// Convert a buffer to gray using `method`.
#[must_use = "returns the gray buffer"]
pub fn grayscale(src: &PixelBuffer, method: GrayscaleMethod) -> PixelBuffer {
    parallel::map_pixels(src, |s, d| {
        let v = method.reduce(s[RED], s[GREEN], s[BLUE]);
        d[BLUE] = v;
        d[GREEN] = v;
        d[RED] = v;
        d[ALPHA] = 255;
    })
}

/// In-place variant of [`grayscale`].
pub fn grayscale_in_place(buf: &mut PixelBuffer, method: GrayscaleMethod) {
    parallel::map_pixels_in_place(buf, |px| {
        let v = method.reduce(px[RED], px[GREEN], px[BLUE]);
        px[BLUE] = v;
        px[GREEN] = v;
        px[RED] = v;
        px[ALPHA] = 255;
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Rgb;

    fn one_pixel(color: Rgb) -> PixelBuffer {
        PixelBuffer::filled(1, 1, color)
    }

    fn gray_of(color: Rgb, method: GrayscaleMethod) -> u8 {
        grayscale(&one_pixel(color), method).as_bytes()[BLUE]
    }

    #[test]
    fn bt601_pure_red_is_76() {
        assert_eq!(gray_of(Rgb::RED, GrayscaleMethod::Bt601), 76);
    }

    #[test]
    fn channel_order_is_respected() {
        // Pure red sits in byte 2, so BT.601 must weigh it by 0.299 not 0.114.
        let buf = PixelBuffer::from_raw(1, 1, vec![0, 0, 255, 255]).unwrap();
        let out = grayscale(&buf, GrayscaleMethod::Bt601);
        assert_eq!(out.as_bytes(), &[76, 76, 76, 255]);
    }

    #[test]
    fn white_stays_white_for_every_method() {
        for method in GrayscaleMethod::ALL {
            assert_eq!(gray_of(Rgb::WHITE, method), 255, "{method:?}");
            assert_eq!(gray_of(Rgb::BLACK, method), 0, "{method:?}");
        }
    }

    #[test]
    fn average_truncates() {
        assert_eq!(gray_of(Rgb::new(1, 1, 0), GrayscaleMethod::Average), 0);
        assert_eq!(gray_of(Rgb::new(10, 20, 31), GrayscaleMethod::Average), 20);
    }

    #[test]
    fn weighted_methods() {
        let c = Rgb::new(200, 100, 40);
        // 0.2126*200 + 0.7152*100 + 0.0722*40 = 116.928
        assert_eq!(gray_of(c, GrayscaleMethod::Bt709), 116);
        // 50 + 50 + 10
        assert_eq!(gray_of(c, GrayscaleMethod::WeightedQuarter), 110);
        assert_eq!(gray_of(c, GrayscaleMethod::Max), 200);
        assert_eq!(gray_of(c, GrayscaleMethod::Min), 40);
    }

    #[test]
    fn green_outweighs_red_outweighs_blue() {
        let r = gray_of(Rgb::RED, GrayscaleMethod::Bt601);
        let g = gray_of(Rgb::GREEN, GrayscaleMethod::Bt601);
        let b = gray_of(Rgb::BLUE, GrayscaleMethod::Bt601);
        assert!(g > r && r > b, "R={r} G={g} B={b}");
    }

    #[test]
    fn alpha_is_forced_opaque_and_size_preserved() {
        let buf = PixelBuffer::from_raw(2, 1, vec![9, 9, 9, 0, 1, 2, 3, 128]).unwrap();
        let out = grayscale(&buf, GrayscaleMethod::Average);
        assert_eq!(out.size(), buf.size());
        assert!(out.pixels().all(|p| p[ALPHA] == 255));
    }

    #[test]
    fn in_place_matches_allocating() {
        let buf = PixelBuffer::from_fn(9, 4, |x, y| [(x * 20) as u8, (y * 50) as u8, 77, 255]);
        for method in GrayscaleMethod::ALL {
            let mut in_place = buf.clone();
            grayscale_in_place(&mut in_place, method);
            assert_eq!(in_place, grayscale(&buf, method));
        }
    }

    #[test]
    fn method_codes() {
        assert_eq!(GrayscaleMethod::try_from(0).unwrap(), GrayscaleMethod::Average);
        assert_eq!(GrayscaleMethod::try_from(3).unwrap(), GrayscaleMethod::WeightedQuarter);
        assert!(matches!(
            GrayscaleMethod::try_from(6),
            Err(ImagingError::InvalidParameter(_))
        ));
    }
}
