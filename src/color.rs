//! Node colors.
//!
//! [`Rgb`] is an opaque 8-bit color. Parsing accepts any CSS color string
//! understood by the `color` crate ("#add8e6", "lightblue", "rgb(1, 2, 3)");
//! formatting always produces lowercase `#rrggbb`.

use std::{fmt, str::FromStr};

use color::{DynamicColor, Srgb};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Default node fill.
    pub const LIGHT_BLUE: Rgb = Rgb::new(0xad, 0xd8, 0xe6);

    /// Default node border.
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
}

impl Default for Rgb {
    fn default() -> Self {
        Self::LIGHT_BLUE
    }
}

impl FromStr for Rgb {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parsed = DynamicColor::from_str(s.trim())
            .map_err(|err| format!("invalid color `{s}`: {err}"))?;
        let rgba = parsed.to_alpha_color::<Srgb>().to_rgba8();
        Ok(Self::new(rgba.r, rgba.g, rgba.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_hex() {
        assert_eq!("#ADD8E6".parse::<Rgb>().unwrap(), Rgb::LIGHT_BLUE);
    }

    #[test]
    fn parse_named() {
        assert_eq!("lightblue".parse::<Rgb>().unwrap(), Rgb::LIGHT_BLUE);
        assert_eq!("red".parse::<Rgb>().unwrap(), Rgb::new(255, 0, 0));
    }

    #[test]
    fn parse_invalid() {
        let err = "not-a-color".parse::<Rgb>().unwrap_err();
        assert!(err.contains("not-a-color"), "got: {err}");
    }

    #[test]
    fn display_is_lowercase_hex() {
        assert_eq!(Rgb::new(255, 16, 0).to_string(), "#ff1000");
    }
}
