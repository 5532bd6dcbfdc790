use crate::error::{IconifyError, Result};
use image::imageops::FilterType;
use std::fmt;
use std::str::FromStr;

/// Resampling kernel used when scaling the master icon.
///
/// Names are validated against what the imaging library offers rather than a
/// fixed list baked into callers; see [`ResizeMode::supported`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeMode(FilterType);

/// Canonical names paired with the kernel they select.
const KERNELS: &[(&str, FilterType)] = &[
    ("nearest", FilterType::Nearest),
    ("bilinear", FilterType::Triangle),
    ("bicubic", FilterType::CatmullRom),
    ("gaussian", FilterType::Gaussian),
    ("lanczos3", FilterType::Lanczos3),
];

/// Alternate spellings accepted on input
const ALIASES: &[(&str, &str)] = &[
    ("nearestneighbor", "nearest"),
    ("nearest-neighbor", "nearest"),
    ("triangle", "bilinear"),
    ("linear", "bilinear"),
    ("catmullrom", "bicubic"),
    ("catmull-rom", "bicubic"),
    ("cubic", "bicubic"),
];

impl ResizeMode {
    pub const NEAREST: Self = Self(FilterType::Nearest);
    pub const BILINEAR: Self = Self(FilterType::Triangle);
    pub const BICUBIC: Self = Self(FilterType::CatmullRom);
    pub const GAUSSIAN: Self = Self(FilterType::Gaussian);
    pub const LANCZOS3: Self = Self(FilterType::Lanczos3);

    /// Canonical names of every supported mode.
    pub fn supported() -> Vec<&'static str> {
        KERNELS.iter().map(|(name, _)| *name).collect()
    }

    pub fn name(&self) -> &'static str {
        KERNELS
            .iter()
            .find(|(_, filter)| *filter == self.0)
            .map(|(name, _)| *name)
            .unwrap_or("bilinear")
    }

    pub fn filter(&self) -> FilterType {
        self.0
    }
}

impl Default for ResizeMode {
    fn default() -> Self {
        Self::BILINEAR
    }
}

impl FromStr for ResizeMode {
    type Err = IconifyError;

    fn from_str(name: &str) -> Result<Self> {
        let wanted = name.trim().to_ascii_lowercase();
        let canonical = ALIASES
            .iter()
            .find(|(alias, _)| *alias == wanted)
            .map(|(_, canonical)| *canonical)
            .unwrap_or(wanted.as_str());

        KERNELS
            .iter()
            .find(|(known, _)| *known == canonical)
            .map(|(_, filter)| Self(*filter))
            .ok_or_else(|| {
                IconifyError::InvalidOptions(format!(
                    "Unsupported resize mode {name:?}, expected one of: {}",
                    Self::supported().join(", ")
                ))
            })
    }
}

impl fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_default_is_bilinear_family() {
        assert_eq!(ResizeMode::default().filter(), FilterType::Triangle);
        assert_eq!(ResizeMode::default().to_string(), "bilinear");
    }

    #[test]
    fn test_aliases_resolve_to_canonical_kernels() {
        assert_eq!("nearestNeighbor".parse::<ResizeMode>().unwrap(), ResizeMode::NEAREST);
        assert_eq!("Catmull-Rom".parse::<ResizeMode>().unwrap(), ResizeMode::BICUBIC);
        assert_eq!(" lanczos3 ".parse::<ResizeMode>().unwrap(), ResizeMode::LANCZOS3);
        assert_eq!("linear".parse::<ResizeMode>().unwrap(), ResizeMode::BILINEAR);
    }

    #[test]
    fn test_every_supported_name_round_trips() {
        for name in ResizeMode::supported() {
            let mode: ResizeMode = name.parse().unwrap();
            assert_eq!(mode.name(), name);
        }
    }

    #[test]
    fn test_unknown_mode_is_invalid_options() {
        let err = "hermite".parse::<ResizeMode>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidOptions);
        assert!(err.to_string().contains("hermite"));
        assert!(err.to_string().contains("lanczos3"));
    }
}
