// Pixel formats understood by drivers, textures and quirk records.
use serde::{Deserialize, Serialize};

/// Texture pixel formats.
///
/// Serialized names follow the identifiers used in driver quirk files
/// (`_32_ARGB8888`, `_DXT1`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PixelFormat {
    #[serde(rename = "_32_ARGB8888")]
    Argb8888,
    #[serde(rename = "_32_RGB888")]
    Xrgb8888,
    #[serde(rename = "_24_RGB888")]
    Rgb888,
    #[serde(rename = "_16_RGB565")]
    Rgb565,
    #[serde(rename = "_16_RGB555")]
    Rgb555,
    #[serde(rename = "_16_ARGB1555")]
    Argb1555,
    #[serde(rename = "_16_ARGB4444")]
    Argb4444,
    #[serde(rename = "_8_RGB332")]
    Rgb332,
    #[serde(rename = "_8_ARGB2222")]
    Argb2222,
    #[serde(rename = "_DXT1")]
    Dxt1,
    #[serde(rename = "_DXT3")]
    Dxt3,
    #[serde(rename = "_DXT5")]
    Dxt5,
}

impl PixelFormat {
    /// Bytes per pixel for uncompressed formats, `None` for block-compressed ones.
    pub fn bytes_per_pixel(self) -> Option<u32> {
        match self {
            Self::Argb8888 | Self::Xrgb8888 => Some(4),
            Self::Rgb888 => Some(3),
            Self::Rgb565 | Self::Rgb555 | Self::Argb1555 | Self::Argb4444 => Some(2),
            Self::Rgb332 | Self::Argb2222 => Some(1),
            Self::Dxt1 | Self::Dxt3 | Self::Dxt5 => None,
        }
    }

    pub fn is_compressed(self) -> bool {
        self.bytes_per_pixel().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quirk_file_identifiers_deserialize() {
        let formats: Vec<PixelFormat> =
            serde_json::from_str(r#"["_32_ARGB8888", "_16_RGB565", "_DXT1"]"#).unwrap();
        assert_eq!(
            formats,
            vec![PixelFormat::Argb8888, PixelFormat::Rgb565, PixelFormat::Dxt1]
        );
    }

    #[test]
    fn compressed_formats_have_no_pixel_size() {
        assert_eq!(PixelFormat::Rgb888.bytes_per_pixel(), Some(3));
        assert!(PixelFormat::Dxt5.is_compressed());
    }
}
