//! Generate the icon set of a browser extension from one master image.
//!
//! The manifest's `icons`, `browser_action.default_icon` and
//! `page_action.default_icon` size maps are resolved into deduplicated
//! entries, and the master icon is resized once per entry. Output formats
//! follow each entry's file extension.
//!
//! ```no_run
//! use manifest_iconify::{generate, write_all, GenerateOptions, ResizeMode};
//!
//! let options = GenerateOptions::new("src/manifest.json", "master.png")
//!     .with_resize_mode(ResizeMode::LANCZOS3);
//! let icons = generate(&options)?;
//! write_all(&icons)?;
//! # Ok::<(), manifest_iconify::IconifyError>(())
//! ```

pub mod error;
pub mod generate;
pub mod icon;
pub mod imaging;
pub mod manifest;
pub mod resize_mode;

pub use error::{ErrorKind, IconifyError, Result};
pub use generate::{generate, write_all, GenerateOptions};
pub use icon::{GeneratedIcon, IconSource, MasterIcon, SquarePolicy};
pub use manifest::{resolve, Manifest, ManifestEntry, PathStrictness};
pub use resize_mode::ResizeMode;
