use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u8, pub u8, pub u8, pub u8);

impl Color {
    pub const TRANSPARENT: Color = Color(0, 0, 0, 0);
    pub const BLACK: Color = Color(0, 0, 0, 255);
    pub const WHITE: Color = Color(255, 255, 255, 255);

    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Color(r, g, b, 255)
    }
    pub fn from_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Color(r, g, b, a)
    }
    pub fn from_hex(hex: &str) -> Self {
        let s = hex.trim_start_matches('#');
        let (r, g, b, a) = match s.len() {
            6 => (
                u8::from_str_radix(&s[0..2], 16).unwrap_or(0),
                u8::from_str_radix(&s[2..4], 16).unwrap_or(0),
                u8::from_str_radix(&s[4..6], 16).unwrap_or(0),
                255,
            ),
            8 => (
                u8::from_str_radix(&s[0..2], 16).unwrap_or(0),
                u8::from_str_radix(&s[2..4], 16).unwrap_or(0),
                u8::from_str_radix(&s[4..6], 16).unwrap_or(0),
                u8::from_str_radix(&s[6..8], 16).unwrap_or(255),
            ),
            _ => {
                log::warn!("unrecognised hex color {:?}", hex);
                (0, 0, 0, 255)
            }
        };
        Color(r, g, b, a)
    }

    /// From normalized `[0, 1]` channels, the form most host APIs use.
    pub fn from_f32(r: f32, g: f32, b: f32, a: f32) -> Self {
        fn ch(v: f32) -> u8 {
            (v.clamp(0.0, 1.0) * 255.0).round() as u8
        }
        Color(ch(r), ch(g), ch(b), ch(a))
    }

    pub fn to_f32(self) -> [f32; 4] {
        [
            self.0 as f32 / 255.0,
            self.1 as f32 / 255.0,
            self.2 as f32 / 255.0,
            self.3 as f32 / 255.0,
        ]
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Color(self.0, self.1, self.2, a)
    }

    /// Scales the RGB channels, saturating at white. Alpha is kept.
    pub fn scale_rgb(self, factor: f32) -> Self {
        let s = |c: u8| ((c as f32 * factor).round().clamp(0.0, 255.0)) as u8;
        Color(s(self.0), s(self.1), s(self.2), self.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        assert_eq!(Color::from_hex("#34AF82"), Color(0x34, 0xAF, 0x82, 255));
        assert_eq!(Color::from_hex("10203040"), Color(0x10, 0x20, 0x30, 0x40));
        assert_eq!(Color::from_hex("nope"), Color::BLACK);
    }

    #[test]
    fn test_f32_conversion() {
        let c = Color::from_f32(0.2, 0.2, 0.2, 0.8);
        assert_eq!(c, Color(51, 51, 51, 204));
        let [r, _, _, a] = Color::WHITE.to_f32();
        assert_eq!(r, 1.0);
        assert_eq!(a, 1.0);
    }

    #[test]
    fn test_scale_rgb_saturates() {
        assert_eq!(Color(200, 100, 0, 7).scale_rgb(1.5), Color(255, 150, 0, 7));
    }
}
