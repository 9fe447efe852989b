/// A straight-alpha RGBA color, as stored in brushes and color buttons.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Debug, Default)]
pub struct Color(pub [f32; 4]);
impl Color {
    pub const BLACK: Self = Self([0.0, 0.0, 0.0, 1.0]);
    pub const WHITE: Self = Self([1.0; 4]);
    /// Files written before schema 7 had no stroke flags. Eraser strokes were
    /// instead tagged with this exact (nonsensical) color.
    pub const LEGACY_ERASER: Self = Self([23.0, 34.0, 45.0, 56.0]);
    #[must_use]
    pub fn rgb(&self) -> Rgb {
        Rgb([self.0[0], self.0[1], self.0[2]])
    }
    #[must_use]
    pub fn alpha(&self) -> f32 {
        self.0[3]
    }
}

/// An opaque color without alpha, as stored for the picker and the background.
#[repr(transparent)]
#[derive(Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Debug, Default)]
pub struct Rgb(pub [f32; 3]);
impl Rgb {
    pub const WHITE: Self = Self([1.0; 3]);
    #[must_use]
    pub fn with_alpha(self, alpha: f32) -> Color {
        let [r, g, b] = self.0;
        Color([r, g, b, alpha])
    }
    /// Convert from hue in degrees `[0, 360)`, saturation and value in `[0, 1]`.
    #[must_use]
    pub fn from_hsv([h, s, v]: [f32; 3]) -> Self {
        let h = h.rem_euclid(360.0) / 60.0;
        let chroma = v * s;
        let x = chroma * (1.0 - ((h % 2.0) - 1.0).abs());
        let m = v - chroma;
        // Truncation intended, h is in [0, 6)
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let [r, g, b] = match h as u32 {
            0 => [chroma, x, 0.0],
            1 => [x, chroma, 0.0],
            2 => [0.0, chroma, x],
            3 => [0.0, x, chroma],
            4 => [x, 0.0, chroma],
            _ => [chroma, 0.0, x],
        };
        Self([r + m, g + m, b + m])
    }
}

#[cfg(test)]
mod test {
    use super::Rgb;
    fn close(a: Rgb, b: [f32; 3]) -> bool {
        a.0.iter().zip(b).all(|(a, b)| (a - b).abs() < 1e-5)
    }
    #[test]
    fn hsv_primaries() {
        assert!(close(Rgb::from_hsv([0.0, 1.0, 1.0]), [1.0, 0.0, 0.0]));
        assert!(close(Rgb::from_hsv([120.0, 1.0, 1.0]), [0.0, 1.0, 0.0]));
        assert!(close(Rgb::from_hsv([240.0, 1.0, 1.0]), [0.0, 0.0, 1.0]));
        // Negative hue wraps around
        assert!(close(Rgb::from_hsv([-120.0, 1.0, 1.0]), [0.0, 0.0, 1.0]));
    }
    #[test]
    fn hsv_greyscale() {
        assert!(close(Rgb::from_hsv([77.0, 0.0, 0.5]), [0.5, 0.5, 0.5]));
    }
}
