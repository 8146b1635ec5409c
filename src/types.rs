use fixed::types::I32F32;

/// A length in millimetres, stored as a fixed-point value so that layout
/// arithmetic is deterministic across platforms. One unit of resolution is
/// a milli-millimetre (1/1000 mm).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mm(I32F32);

impl Mm {
    pub const ZERO: Mm = Mm(I32F32::from_bits(0));

    pub fn from_f32(value: f32) -> Mm {
        if !value.is_finite() {
            return Mm::ZERO;
        }
        let milli = (value as f64 * 1000.0).round();
        let milli = milli.clamp(i64::MIN as f64, i64::MAX as f64) as i64;
        Mm::from_milli_i64(milli)
    }

    pub fn from_i32(value: i32) -> Mm {
        Mm::from_milli_i64((value as i64) * 1000)
    }

    pub fn to_f32(self) -> f32 {
        self.0.to_num()
    }

    pub fn to_milli_i64(self) -> i64 {
        let bits = self.0.to_bits() as i128;
        let denom = 1i128 << 32;
        let scaled = bits * 1000;
        let adj = if scaled >= 0 { denom / 2 } else { -denom / 2 };
        let milli = (scaled + adj) / denom;
        milli.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    pub fn from_milli_i64(milli: i64) -> Mm {
        Mm::from_milli_i128(milli as i128)
    }

    fn from_milli_i128(milli: i128) -> Mm {
        let denom = 1i128 << 32;
        let adj = if milli >= 0 { 500 } else { -500 };
        let bits = (milli * denom + adj) / 1000;
        let bits = bits.clamp(i64::MIN as i128, i64::MAX as i128) as i64;
        Mm(I32F32::from_bits(bits))
    }

    /// Converts to milli-points (1/1000 pt at 72 pt/inch, 25.4 mm/inch),
    /// rounding half away from zero. Integer math keeps the PDF output
    /// byte-identical for identical inputs.
    pub fn to_point_milli(self) -> i64 {
        let milli_mm = self.to_milli_i64() as i128;
        // pt = mm * 72 / 25.4 == milli_mm * 7200 / 2540
        let num = milli_mm * 7200;
        let value = if num >= 0 {
            (num + 1270) / 2540
        } else {
            (num - 1270) / 2540
        };
        value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }

    pub fn max(self, other: Mm) -> Mm {
        if self >= other { self } else { other }
    }

    pub fn min(self, other: Mm) -> Mm {
        if self <= other { self } else { other }
    }

    pub fn is_positive(self) -> bool {
        self > Mm::ZERO
    }
}

impl std::ops::Add for Mm {
    type Output = Mm;
    fn add(self, rhs: Mm) -> Mm {
        Mm::from_milli_i128(self.to_milli_i64() as i128 + rhs.to_milli_i64() as i128)
    }
}

impl std::ops::AddAssign for Mm {
    fn add_assign(&mut self, rhs: Mm) {
        *self = *self + rhs;
    }
}

impl std::ops::Sub for Mm {
    type Output = Mm;
    fn sub(self, rhs: Mm) -> Mm {
        Mm::from_milli_i128(self.to_milli_i64() as i128 - rhs.to_milli_i64() as i128)
    }
}

impl std::ops::SubAssign for Mm {
    fn sub_assign(&mut self, rhs: Mm) {
        *self = *self - rhs;
    }
}

impl std::ops::Mul<i32> for Mm {
    type Output = Mm;
    fn mul(self, rhs: i32) -> Mm {
        let milli = self.to_milli_i64() as i128;
        Mm::from_milli_i128(milli.saturating_mul(rhs as i128))
    }
}

impl std::ops::Div<i32> for Mm {
    type Output = Mm;
    fn div(self, rhs: i32) -> Mm {
        if rhs == 0 {
            return Mm::ZERO;
        }
        let milli = self.to_milli_i64() as i128;
        Mm::from_milli_i128(div_round_i128(milli, rhs as i128))
    }
}

impl std::ops::Neg for Mm {
    type Output = Mm;
    fn neg(self) -> Mm {
        Mm::from_milli_i128(-(self.to_milli_i64() as i128))
    }
}

impl std::iter::Sum for Mm {
    fn sum<I: Iterator<Item = Mm>>(iter: I) -> Mm {
        iter.fold(Mm::ZERO, |acc, v| acc + v)
    }
}

fn div_round_i128(num: i128, den: i128) -> i128 {
    if den == 0 {
        return 0;
    }
    let den_abs = den.abs();
    if num >= 0 {
        (num + den_abs / 2) / den
    } else {
        -(((-num) + den_abs / 2) / den_abs) * den.signum()
    }
}

/// Multiplies a height by a pixel aspect ratio (width / height), in integer
/// milli-mm space. A zero pixel height yields the height unchanged, matching
/// the square fallback for degenerate assets.
pub fn scale_by_aspect(height: Mm, px_width: u32, px_height: u32) -> Mm {
    if px_height == 0 {
        return height;
    }
    let milli = height.to_milli_i64() as i128;
    let num = milli * px_width as i128;
    let den = px_height as i128;
    let value = if num >= 0 {
        (num + den / 2) / den
    } else {
        (num - den / 2) / den
    };
    Mm::from_milli_i64(value.clamp(i64::MIN as i128, i64::MAX as i128) as i64)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: Mm,
    pub height: Mm,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };

    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }
}

/// ISO A-series sheets the marking shop actually stocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaperSize {
    A1,
    A2,
    A3,
    A4,
}

impl PaperSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaperSize::A1 => "A1",
            PaperSize::A2 => "A2",
            PaperSize::A3 => "A3",
            PaperSize::A4 => "A4",
        }
    }

    pub fn from_str(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "A1" => Some(PaperSize::A1),
            "A2" => Some(PaperSize::A2),
            "A3" => Some(PaperSize::A3),
            "A4" => Some(PaperSize::A4),
            _ => None,
        }
    }

    /// Portrait dimensions in millimetres.
    pub fn portrait_mm(&self) -> Size {
        let (w, h) = match self {
            PaperSize::A1 => (594, 841),
            PaperSize::A2 => (420, 594),
            PaperSize::A3 => (297, 420),
            PaperSize::A4 => (210, 297),
        };
        Size {
            width: Mm::from_i32(w),
            height: Mm::from_i32(h),
        }
    }

    pub fn oriented(&self, orientation: Orientation) -> Size {
        let portrait = self.portrait_mm();
        match orientation {
            Orientation::Portrait => portrait,
            Orientation::Landscape => Size {
                width: portrait.height,
                height: portrait.width,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Orientation::Portrait => "Portrait",
            Orientation::Landscape => "Landscape",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn milli_round_trip() {
        assert_eq!(Mm::from_milli_i64(12345).to_milli_i64(), 12345);
        assert_eq!(Mm::from_f32(20.0).to_milli_i64(), 20000);
        assert_eq!(Mm::from_f32(-3.5).to_milli_i64(), -3500);
    }

    #[test]
    fn arithmetic_is_exact_in_milli_space() {
        let a = Mm::from_f32(10.25);
        let b = Mm::from_f32(0.75);
        assert_eq!((a + b).to_milli_i64(), 11000);
        assert_eq!((a - b).to_milli_i64(), 9500);
        assert_eq!((b * 4).to_milli_i64(), 3000);
    }

    #[test]
    fn point_conversion_matches_72_per_inch() {
        // 25.4 mm == exactly 72 pt.
        assert_eq!(Mm::from_f32(25.4).to_point_milli(), 72_000);
        assert_eq!(Mm::from_i32(210).to_point_milli(), 595_276);
        assert_eq!(Mm::ZERO.to_point_milli(), 0);
    }

    #[test]
    fn aspect_scaling() {
        // 2:1 asset at 100mm height -> 200mm width.
        assert_eq!(
            scale_by_aspect(Mm::from_i32(100), 200, 100),
            Mm::from_i32(200)
        );
        // Degenerate pixel height falls back to square.
        assert_eq!(
            scale_by_aspect(Mm::from_i32(100), 200, 0),
            Mm::from_i32(100)
        );
    }

    #[test]
    fn paper_orientation_swaps_axes() {
        let portrait = PaperSize::A4.oriented(Orientation::Portrait);
        let landscape = PaperSize::A4.oriented(Orientation::Landscape);
        assert_eq!(portrait.width, landscape.height);
        assert_eq!(portrait.height, landscape.width);
        assert_eq!(portrait.width, Mm::from_i32(210));
    }
}
