//! Image request types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ImageError;

/// Output resolution, written as "WIDTHxHEIGHT" in config files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        Self::new(512, 512)
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for ImageSize {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| ImageError::InvalidSize(s.to_string()))?;

        let width: u32 = w.trim().parse().map_err(|_| ImageError::InvalidSize(s.to_string()))?;
        let height: u32 = h.trim().parse().map_err(|_| ImageError::InvalidSize(s.to_string()))?;

        if width == 0 || height == 0 {
            return Err(ImageError::InvalidSize(s.to_string()));
        }

        Ok(Self::new(width, height))
    }
}

impl TryFrom<String> for ImageSize {
    type Error = ImageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ImageSize> for String {
    fn from(size: ImageSize) -> Self {
        size.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size() {
        assert_eq!("512x512".parse::<ImageSize>().unwrap(), ImageSize::new(512, 512));
        assert_eq!(" 1024X768 ".parse::<ImageSize>().unwrap(), ImageSize::new(1024, 768));
    }

    #[test]
    fn test_parse_size_rejects_garbage() {
        assert!("512".parse::<ImageSize>().is_err());
        assert!("axb".parse::<ImageSize>().is_err());
        assert!("0x512".parse::<ImageSize>().is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ImageSize::new(640, 480).to_string(), "640x480");
    }

    #[test]
    fn test_serde_as_string() {
        let size: ImageSize = serde_yaml::from_str("\"256x128\"").unwrap();
        assert_eq!(size, ImageSize::new(256, 128));
        assert_eq!(serde_json::to_string(&size).unwrap(), "\"256x128\"");
    }
}
