use serde::{Deserialize, Serialize, Serializer};

use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{PlacardError, PlacardResult};

/// A color packed as 64-bit ARGB (`0x00000000_AARRGGBB`).
///
/// The model stores colors in this packed form; renderers unpack to RGBA8 at
/// the paint boundary. Bits above the low 32 are ignored on read so that
/// values produced by platforms with wider color words still round-trip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PackedColor(pub u64);

impl PackedColor {
    /// Opaque white.
    pub const WHITE: Self = Self(0xFFFF_FFFF);
    /// Opaque black.
    pub const BLACK: Self = Self(0xFF00_0000);

    /// Pack ARGB8 components.
    pub fn from_argb(a: u8, r: u8, g: u8, b: u8) -> Self {
        Self(
            (u64::from(a) << 24) | (u64::from(r) << 16) | (u64::from(g) << 8) | u64::from(b),
        )
    }

    /// Alpha component.
    pub fn alpha(self) -> u8 {
        ((self.0 >> 24) & 0xFF) as u8
    }

    /// Red component.
    pub fn red(self) -> u8 {
        ((self.0 >> 16) & 0xFF) as u8
    }

    /// Green component.
    pub fn green(self) -> u8 {
        ((self.0 >> 8) & 0xFF) as u8
    }

    /// Blue component.
    pub fn blue(self) -> u8 {
        (self.0 & 0xFF) as u8
    }

    /// Straight-alpha RGBA8 components in `[r, g, b, a]` order.
    pub fn to_rgba8(self) -> [u8; 4] {
        [self.red(), self.green(), self.blue(), self.alpha()]
    }

    /// Convert to premultiplied RGBA8.
    pub fn to_premul(self) -> Rgba8Premul {
        Rgba8Premul::from_straight_rgba(self.red(), self.green(), self.blue(), self.alpha())
    }

    /// Return the same color with its alpha multiplied by `opacity`
    /// (clamped to `[0, 1]`).
    pub fn with_opacity(self, opacity: f64) -> Self {
        let o = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            1.0
        };
        let a = (f64::from(self.alpha()) * o).round() as u8;
        Self::from_argb(a, self.red(), self.green(), self.blue())
    }

    /// Parse a `#RRGGBB` or `#AARRGGBB` hex string (leading `#` optional).
    pub fn parse_hex(s: &str) -> PlacardResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        fn hex_byte(pair: &str) -> PlacardResult<u8> {
            u8::from_str_radix(pair, 16)
                .map_err(|_| PlacardError::validation(format!("invalid hex byte \"{pair}\"")))
        }

        match s.len() {
            6 => {
                let r = hex_byte(&s[0..2])?;
                let g = hex_byte(&s[2..4])?;
                let b = hex_byte(&s[4..6])?;
                Ok(Self::from_argb(255, r, g, b))
            }
            8 => {
                let a = hex_byte(&s[0..2])?;
                let r = hex_byte(&s[2..4])?;
                let g = hex_byte(&s[4..6])?;
                let b = hex_byte(&s[6..8])?;
                Ok(Self::from_argb(a, r, g, b))
            }
            _ => Err(PlacardError::validation(
                "hex color must be #RRGGBB or #AARRGGBB (case-insensitive)",
            )),
        }
    }

    fn to_hex(self) -> String {
        format!(
            "#{:02X}{:02X}{:02X}{:02X}",
            self.alpha(),
            self.red(),
            self.green(),
            self.blue()
        )
    }
}

impl Serialize for PackedColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PackedColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Packed(u64),
            Hex(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Packed(v) => Ok(Self(v & 0xFFFF_FFFF)),
            Repr::Hex(s) => Self::parse_hex(&s).map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn packs_and_unpacks_components() {
        let c = PackedColor::from_argb(0x80, 0x11, 0x22, 0x33);
        assert_eq!(c.0, 0x8011_2233);
        assert_eq!(c.alpha(), 0x80);
        assert_eq!(c.red(), 0x11);
        assert_eq!(c.green(), 0x22);
        assert_eq!(c.blue(), 0x33);
    }

    #[test]
    fn parses_hex_rgb_and_argb() {
        assert_eq!(
            PackedColor::parse_hex("#ff0000").unwrap(),
            PackedColor::from_argb(255, 255, 0, 0)
        );
        assert_eq!(
            PackedColor::parse_hex("800000ff").unwrap(),
            PackedColor::from_argb(0x80, 0, 0, 255)
        );
        assert!(PackedColor::parse_hex("#f00").is_err());
    }

    #[test]
    fn serde_accepts_hex_and_packed_int() {
        let c: PackedColor = serde_json::from_value(json!("#FF112233")).unwrap();
        assert_eq!(c, PackedColor::from_argb(0xFF, 0x11, 0x22, 0x33));

        let c: PackedColor = serde_json::from_value(json!(0xFF00_00FFu64)).unwrap();
        assert_eq!(c, PackedColor::from_argb(0xFF, 0, 0, 0xFF));

        let round: PackedColor =
            serde_json::from_str(&serde_json::to_string(&c).unwrap()).unwrap();
        assert_eq!(round, c);
    }

    #[test]
    fn with_opacity_scales_alpha_only() {
        let c = PackedColor::from_argb(200, 10, 20, 30).with_opacity(0.5);
        assert_eq!(c.alpha(), 100);
        assert_eq!(c.red(), 10);
        let c = PackedColor::WHITE.with_opacity(f64::NAN);
        assert_eq!(c.alpha(), 255);
    }
}
