//! Threshold classification into a strict black/white mask.
//!
//! A pixel is *inside* a [`Threshold`] when each of its blue, green and red
//! bytes falls within the inclusive per-channel band `[min, max]`. Which
//! side becomes white is chosen by [`Polarity`]; the two polarities are
//! exact complements. Output channels are always 0 or 255 and alpha is 255.

use serde::{Deserialize, Serialize};

use crate::buffer::{ALPHA, BLUE, GREEN, PixelBuffer, RED};
use crate::parallel;
use crate::types::{ImagingError, Rgb};

/// Inclusive per-channel band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threshold {
    /// Lower bound per channel (inclusive).
    pub min: Rgb,
    /// Upper bound per channel (inclusive).
    pub max: Rgb,
}

impl Default for Threshold {
    fn default() -> Self {
        Self::below(Rgb::gray(127))
    }
}

impl Threshold {
    /// Band `[0, max]` on each channel.
    #[must_use]
    pub const fn below(max: Rgb) -> Self {
        Self {
            min: Rgb::BLACK,
            max,
        }
    }

    /// Band `[0, max]` with the same bound on all three channels.
    #[must_use]
    pub const fn gray(max: u8) -> Self {
        Self::below(Rgb::gray(max))
    }

    /// Band `[min, max]`.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::InvalidParameter`] if any channel of `min`
    /// exceeds the same channel of `max` (the band would be empty).
    pub fn banded(min: Rgb, max: Rgb) -> Result<Self, ImagingError> {
        let threshold = Self { min, max };
        threshold.validate()?;
        Ok(threshold)
    }

    /// Check that every channel band is non-empty.
    ///
    /// # Errors
    ///
    /// Returns [`ImagingError::InvalidParameter`] naming the offending channel.
    pub fn validate(&self) -> Result<(), ImagingError> {
        for (name, lo, hi) in [
            ("red", self.min.r, self.max.r),
            ("green", self.min.g, self.max.g),
            ("blue", self.min.b, self.max.b),
        ] {
            if lo > hi {
                return Err(ImagingError::InvalidParameter(format!(
                    "{name} threshold min {lo} exceeds max {hi}"
                )));
            }
        }
        Ok(())
    }

    /// Whether the color `(r, g, b)` lies inside the band.
    #[must_use]
    pub const fn contains(&self, r: u8, g: u8, b: u8) -> bool {
        self.min.r <= r
            && r <= self.max.r
            && self.min.g <= g
            && g <= self.max.g
            && self.min.b <= b
            && b <= self.max.b
    }
}

/// Which class becomes white.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Polarity {
    /// Inside the threshold -> white (255), outside -> black (0).
    #[default]
    InsideWhite,
    /// Inside the threshold -> black (0), outside -> white (255).
    InsideBlack,
}

impl Polarity {
    /// The opposite polarity.
    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::InsideWhite => Self::InsideBlack,
            Self::InsideBlack => Self::InsideWhite,
        }
    }

    const fn level(self, inside: bool) -> u8 {
        match (self, inside) {
            (Self::InsideWhite, true) | (Self::InsideBlack, false) => 255,
            (Self::InsideWhite, false) | (Self::InsideBlack, true) => 0,
        }
    }
}

impl TryFrom<u8> for Polarity {
    type Error = ImagingError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Self::InsideWhite),
            1 => Ok(Self::InsideBlack),
            other => Err(ImagingError::InvalidParameter(format!(
                "unknown polarity {other}"
            ))),
        }
    }
}

fn classify(s: &[u8], d: &mut [u8], threshold: &Threshold, polarity: Polarity) {
    let v = polarity.level(threshold.contains(s[RED], s[GREEN], s[BLUE]));
    d[BLUE] = v;
    d[GREEN] = v;
    d[RED] = v;
    d[ALPHA] = 255;
}

/// Binarize `src` against `threshold` with the chosen polarity.
///
/// # Errors
///
/// Returns [`ImagingError::InvalidParameter`] if the threshold band is empty
/// on any channel.
pub fn binarize(
    src: &PixelBuffer,
    threshold: &Threshold,
    polarity: Polarity,
) -> Result<PixelBuffer, ImagingError> {
    threshold.validate()?;
    Ok(parallel::map_pixels(src, |s, d| {
        classify(s, d, threshold, polarity);
    }))
}

/// Binarize with inside pixels white and outside pixels black.
///
/// # Errors
///
/// See [`binarize`].
pub fn binarize_inside_white(
    src: &PixelBuffer,
    threshold: &Threshold,
) -> Result<PixelBuffer, ImagingError> {
    binarize(src, threshold, Polarity::InsideWhite)
}

/// Binarize with inside pixels black and outside pixels white.
///
/// # Errors
///
/// See [`binarize`].
pub fn binarize_inside_black(
    src: &PixelBuffer,
    threshold: &Threshold,
) -> Result<PixelBuffer, ImagingError> {
    binarize(src, threshold, Polarity::InsideBlack)
}

/// In-place variant of [`binarize`]. The buffer is untouched on error.
///
/// # Errors
///
/// See [`binarize`].
pub fn binarize_in_place(
    buf: &mut PixelBuffer,
    threshold: &Threshold,
    polarity: Polarity,
) -> Result<(), ImagingError> {
    threshold.validate()?;
    parallel::map_pixels_in_place(buf, |px| {
        let inside = threshold.contains(px[RED], px[GREEN], px[BLUE]);
        let v = polarity.level(inside);
        px[BLUE] = v;
        px[GREEN] = v;
        px[RED] = v;
        px[ALPHA] = 255;
    });
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn gradient() -> PixelBuffer {
        PixelBuffer::from_fn(16, 16, |x, y| {
            [(x * 16) as u8, (y * 16) as u8, ((x + y) * 8) as u8, 255]
        })
    }

    fn levels(buf: &PixelBuffer) -> Vec<u8> {
        buf.pixels().map(|p| p[BLUE]).collect()
    }

    #[test]
    fn output_is_strictly_two_level() {
        let out = binarize_inside_white(&gradient(), &Threshold::gray(100)).unwrap();
        for p in out.pixels() {
            assert!(p[BLUE] == 0 || p[BLUE] == 255);
            assert_eq!(p[BLUE], p[GREEN]);
            assert_eq!(p[BLUE], p[RED]);
            assert_eq!(p[ALPHA], 255);
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let t = Threshold::banded(Rgb::new(10, 20, 30), Rgb::new(40, 50, 60)).unwrap();
        assert!(t.contains(10, 20, 30));
        assert!(t.contains(40, 50, 60));
        assert!(!t.contains(9, 20, 30));
        assert!(!t.contains(40, 51, 60));
        assert!(!t.contains(40, 50, 61));
    }

    #[test]
    fn single_threshold_checks_every_channel() {
        // B=10, G=10, R=200: red is above its bound so the pixel is outside.
        let buf = PixelBuffer::from_raw(1, 1, vec![10, 10, 200, 255]).unwrap();
        let t = Threshold::below(Rgb::new(100, 100, 100));
        assert_eq!(levels(&binarize_inside_white(&buf, &t).unwrap()), vec![0]);
        let t = Threshold::below(Rgb::new(200, 100, 100));
        assert_eq!(levels(&binarize_inside_white(&buf, &t).unwrap()), vec![255]);
    }

    #[test]
    fn polarities_are_complements() {
        let src = gradient();
        let t = Threshold::banded(Rgb::new(30, 0, 40), Rgb::new(200, 180, 250)).unwrap();
        let white = binarize_inside_white(&src, &t).unwrap();
        let black = binarize_inside_black(&src, &t).unwrap();
        for (w, b) in white.pixels().zip(black.pixels()) {
            assert_eq!(w[BLUE], 255 - b[BLUE]);
        }
    }

    #[test]
    fn inside_black_below_white_is_idempotent() {
        let t = Threshold::gray(128);
        let once = binarize_inside_black(&gradient(), &t).unwrap();
        let twice = binarize_inside_black(&once, &t).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_band_is_rejected() {
        let err = Threshold::banded(Rgb::new(0, 50, 0), Rgb::new(255, 49, 255)).unwrap_err();
        assert!(matches!(err, ImagingError::InvalidParameter(ref m) if m.contains("green")));

        let bad = Threshold {
            min: Rgb::gray(10),
            max: Rgb::gray(5),
        };
        let mut buf = gradient();
        let before = buf.clone();
        assert!(binarize(&buf, &bad, Polarity::InsideWhite).is_err());
        assert!(binarize_in_place(&mut buf, &bad, Polarity::InsideWhite).is_err());
        assert_eq!(buf, before);
    }

    #[test]
    fn in_place_matches_allocating() {
        let src = gradient();
        let t = Threshold::gray(90);
        for polarity in [Polarity::InsideWhite, Polarity::InsideBlack] {
            let mut buf = src.clone();
            binarize_in_place(&mut buf, &t, polarity).unwrap();
            assert_eq!(buf, binarize(&src, &t, polarity).unwrap());
        }
    }

    #[test]
    fn polarity_codes_and_flip() {
        assert_eq!(Polarity::try_from(1).unwrap(), Polarity::InsideBlack);
        assert!(Polarity::try_from(2).is_err());
        assert_eq!(Polarity::InsideWhite.flipped(), Polarity::InsideBlack);
    }

    #[test]
    fn threshold_serde_round_trip() {
        let t = Threshold::banded(Rgb::new(1, 2, 3), Rgb::new(4, 5, 6)).unwrap();
        let json = serde_json::to_string(&t).unwrap();
        let back: Threshold = serde_json::from_str(&json).unwrap();
        assert_eq!(t, back);
    }
}
