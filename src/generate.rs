use crate::error::Result;
use crate::icon::{GeneratedIcon, IconSource, MasterIcon, SquarePolicy};
use crate::imaging;
use crate::manifest::{Manifest, PathStrictness};
use crate::resize_mode::ResizeMode;
use rayon::prelude::*;
use std::path::PathBuf;

/// Inputs for [`generate`]
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Path to the extension's manifest.json
    pub manifest: PathBuf,
    /// Master icon every declared size is resized from
    pub master_icon: IconSource,
    pub resize_mode: ResizeMode,
    /// Directory the declared icon paths are resolved against.
    /// Defaults to the manifest's directory.
    pub out_dir: Option<PathBuf>,
    pub square_policy: SquarePolicy,
    pub path_strictness: PathStrictness,
    /// Resize entries on the rayon thread pool
    pub parallel: bool,
}

impl GenerateOptions {
    pub fn new(manifest: impl Into<PathBuf>, master_icon: impl Into<IconSource>) -> Self {
        Self {
            manifest: manifest.into(),
            master_icon: master_icon.into(),
            resize_mode: ResizeMode::default(),
            out_dir: None,
            square_policy: SquarePolicy::default(),
            path_strictness: PathStrictness::default(),
            parallel: true,
        }
    }

    pub fn with_resize_mode(mut self, mode: ResizeMode) -> Self {
        self.resize_mode = mode;
        self
    }

    pub fn with_out_dir(mut self, out_dir: impl Into<PathBuf>) -> Self {
        self.out_dir = Some(out_dir.into());
        self
    }

    pub fn with_square_policy(mut self, policy: SquarePolicy) -> Self {
        self.square_policy = policy;
        self
    }

    pub fn with_path_strictness(mut self, strictness: PathStrictness) -> Self {
        self.path_strictness = strictness;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Generate every icon declared by the manifest from the master icon.
///
/// Nothing is written to disk; see [`GeneratedIcon::write`] and [`write_all`].
/// Icons are returned in the order their entries were resolved. Any failure
/// aborts the whole call.
pub fn generate(options: &GenerateOptions) -> Result<Vec<GeneratedIcon>> {
    let manifest = Manifest::load(&options.manifest)?;
    let master = MasterIcon::load(options.master_icon.clone(), options.square_policy)?;
    let entries = manifest.entries(options.path_strictness)?;

    let base_dir = options
        .out_dir
        .clone()
        .unwrap_or_else(|| manifest.base_dir().to_path_buf());

    // Check every target up front so resizing cannot fail halfway
    let targets = entries
        .iter()
        .map(|entry| {
            let path = entry.output_path(&base_dir);
            let format = imaging::check_target(&path, entry.size, entry.size)?;
            Ok((entry.size, path, format))
        })
        .collect::<Result<Vec<_>>>()?;

    let mode = options.resize_mode;
    let icons: Vec<GeneratedIcon> = if options.parallel {
        targets
            .into_par_iter()
            .map(|(size, path, format)| master.resize_as(size, size, path, format, mode))
            .collect()
    } else {
        targets
            .into_iter()
            .map(|(size, path, format)| master.resize_as(size, size, path, format, mode))
            .collect()
    };

    tracing::info!(
        count = icons.len(),
        manifest = %options.manifest.display(),
        mode = %mode,
        "generated icons"
    );

    Ok(icons)
}

/// Write generated icons to their output paths.
///
/// Every icon is encoded before the first file is written, so an encoding
/// failure leaves the output directory untouched.
pub fn write_all(icons: &[GeneratedIcon]) -> Result<()> {
    let encoded = icons
        .iter()
        .map(|icon| icon.encode().map(|bytes| (icon, bytes)))
        .collect::<Result<Vec<_>>>()?;

    for (icon, bytes) in &encoded {
        icon.write_encoded(bytes)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
    use std::path::Path;
    use tempfile::TempDir;

    fn write_master(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let image = RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x * 2 % 256) as u8, (y * 2 % 256) as u8, 128, 255])
        });
        let path = dir.join(name);
        let image = DynamicImage::ImageRgba8(image);
        // JPEG has no alpha channel
        if name.ends_with(".jpg") {
            DynamicImage::ImageRgb8(image.to_rgb8()).save(&path).unwrap();
        } else {
            image.save(&path).unwrap();
        }
        path
    }

    fn write_manifest(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn fixture(manifest: &str) -> (TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let master = write_master(dir.path(), "master.png", 64, 64);
        let manifest = write_manifest(dir.path(), "manifest.json", manifest);
        (dir, manifest, master)
    }

    #[test]
    fn test_minimal_manifest_yields_one_icon() {
        let (dir, manifest, master) = fixture(r#"{"icons": {"16": "icon.png"}}"#);

        let icons = generate(&GenerateOptions::new(manifest, master)).unwrap();

        assert_eq!(icons.len(), 1);
        assert_eq!(icons[0].output_path(), dir.path().join("icon.png"));

        let decoded = image::load_from_memory(&icons[0].encode().unwrap()).unwrap();
        assert_eq!(decoded.dimensions(), (16, 16));
    }

    #[test]
    fn test_full_manifest_sizes_paths_and_formats() {
        let (dir, manifest, master) = fixture(
            r#"{
                "manifest_version": 2,
                "icons": { "16": "icon-16.png", "128": "icon-128.bmp" },
                "browser_action": { "default_icon": { "19": "a/icon-19.png" } },
                "page_action": { "default_icon": { "38": "img.jpg" } }
            }"#,
        );

        let icons = generate(&GenerateOptions::new(manifest, master)).unwrap();
        let expected = [
            ("icon-16.png", 16, ImageFormat::Png),
            ("icon-128.bmp", 128, ImageFormat::Bmp),
            ("a/icon-19.png", 19, ImageFormat::Png),
            ("img.jpg", 38, ImageFormat::Jpeg),
        ];

        assert_eq!(icons.len(), expected.len());
        for (icon, (path, size, format)) in icons.iter().zip(expected) {
            assert_eq!(icon.output_path(), dir.path().join(path));

            let bytes = icon.encode().unwrap();
            assert_eq!(image::guess_format(&bytes).unwrap(), format);
            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!(decoded.dimensions(), (size, size));
        }
    }

    #[test]
    fn test_duplicate_across_fields_yields_single_icon() {
        let (dir, manifest, master) = fixture(
            r#"{
                "icons": { "16": "icon.png" },
                "browser_action": { "default_icon": { "16": "icon.png" } }
            }"#,
        );

        let options =
            GenerateOptions::new(manifest, master).with_resize_mode(ResizeMode::NEAREST);
        let icons = generate(&options).unwrap();

        assert_eq!(icons.len(), 1);
        assert_eq!(icons[0].output_path(), dir.path().join("icon.png"));
        assert_eq!(icons[0].dimensions(), (16, 16));
    }

    #[test]
    fn test_conflict_aborts_generation() {
        let (_dir, manifest, master) =
            fixture(r#"{"icons": {"128": "icon.png", "16": "icon.png"}}"#);

        let err = generate(&GenerateOptions::new(manifest, master)).unwrap_err();
        let message = err.to_string();

        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert!(message.contains("128"));
        assert!(message.contains("16"));
        assert!(message.contains("icon.png"));
    }

    #[test]
    fn test_missing_manifest_names_path() {
        let dir = tempfile::tempdir().unwrap();
        let master = write_master(dir.path(), "master.png", 32, 32);
        let missing = dir.path().join("does-not-exist.json");

        let err = generate(&GenerateOptions::new(&missing, master)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::ManifestRead);
        assert!(err.to_string().contains(&missing.display().to_string()));
    }

    #[test]
    fn test_missing_master_names_path() {
        let (dir, manifest, _master) = fixture(r#"{"icons": {"16": "icon.png"}}"#);
        let missing = dir.path().join("does-not-exist.jpg");

        let err = generate(&GenerateOptions::new(manifest, missing.as_path())).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::IconRead);
        assert!(err.to_string().contains("does-not-exist.jpg"));
    }

    #[test]
    fn test_non_square_master() {
        let dir = tempfile::tempdir().unwrap();
        let master = write_master(dir.path(), "not-square.png", 128, 64);
        let manifest = write_manifest(
            dir.path(),
            "manifest.json",
            r#"{"icons": {"16": "icon.png"}}"#,
        );

        let options = GenerateOptions::new(&manifest, master.as_path());
        let err = generate(&options).unwrap_err();
        assert_eq!(err.to_string(), "The icon has size 128x64 which is not square");

        let icons = generate(&options.with_square_policy(SquarePolicy::Allow)).unwrap();
        assert_eq!(icons[0].dimensions(), (16, 16));
    }

    #[test]
    fn test_master_from_buffer() {
        let (_dir, manifest, master) = fixture(r#"{"icons": {"48": "icon.png"}}"#);
        let bytes = std::fs::read(master).unwrap();

        let icons = generate(&GenerateOptions::new(manifest, bytes)).unwrap();
        assert_eq!(icons[0].dimensions(), (48, 48));
    }

    #[test]
    fn test_jpeg_master_to_png_output() {
        let dir = tempfile::tempdir().unwrap();
        let master = write_master(dir.path(), "master.jpg", 64, 64);
        let manifest = write_manifest(
            dir.path(),
            "manifest.json",
            r#"{"icons": {"32": "icon-32.png"}}"#,
        );

        let icons = generate(&GenerateOptions::new(manifest, master)).unwrap();
        let bytes = icons[0].encode().unwrap();

        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        assert_eq!(image::load_from_memory(&bytes).unwrap().dimensions(), (32, 32));
    }

    #[test]
    fn test_invalid_extension_fails_before_resizing() {
        let (_dir, manifest, master) =
            fixture(r#"{"icons": {"16": "icon.png", "32": "icon.unknown"}}"#);

        let err = generate(&GenerateOptions::new(manifest, master)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    }

    #[test]
    fn test_size_beyond_encoder_limit_fails_before_writing() {
        let (dir, manifest, master) =
            fixture(r#"{"icons": {"16": "a.png", "512": "icon.ico"}}"#);

        let err = generate(&GenerateOptions::new(manifest, master)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
        assert!(err.to_string().contains("icon.ico"));
        assert!(!dir.path().join("a.png").exists());
    }

    #[test]
    fn test_ico_within_limit_is_generated() {
        let (dir, manifest, master) =
            fixture(r#"{"icons": {"16": "a.png", "48": "icon.ico"}}"#);

        let icons = generate(&GenerateOptions::new(manifest, master)).unwrap();
        write_all(&icons).unwrap();

        assert!(dir.path().join("a.png").exists());
        let ico = std::fs::read(dir.path().join("icon.ico")).unwrap();
        assert_eq!(image::guess_format(&ico).unwrap(), ImageFormat::Ico);
    }

    #[test]
    fn test_huge_declared_size_is_rejected() {
        let (dir, manifest, master) = fixture(r#"{"icons": {"4294967295": "x.png"}}"#);

        let err = generate(&GenerateOptions::new(manifest, master)).unwrap_err();

        assert_eq!(err.kind(), ErrorKind::InvalidSize);
        assert!(err.to_string().contains("4294967295"));
        assert!(!dir.path().join("x.png").exists());
    }

    #[test]
    fn test_write_all_encodes_everything_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let master_path = write_master(dir.path(), "master.png", 512, 512);
        let master = MasterIcon::load(master_path.into(), SquarePolicy::Require).unwrap();

        // Built outside generate so the oversized .ico reaches the encoder
        let good = master.resize_as(
            16,
            16,
            dir.path().join("a.png"),
            ImageFormat::Png,
            ResizeMode::default(),
        );
        let bad = master.resize_as(
            512,
            512,
            dir.path().join("icon.ico"),
            ImageFormat::Ico,
            ResizeMode::default(),
        );

        let err = write_all(&[good, bad]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IconEncode);
        assert!(!dir.path().join("a.png").exists());
    }

    #[test]
    fn test_malformed_manifest() {
        let (_dir, manifest, master) = fixture(r#"{"icons": "#);

        let err = generate(&GenerateOptions::new(manifest, master)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ManifestParse);
    }

    #[test]
    fn test_out_dir_overrides_manifest_dir() {
        let (_dir, manifest, master) = fixture(r#"{"icons": {"16": "/icons/16.png"}}"#);
        let out = tempfile::tempdir().unwrap();

        let icons =
            generate(&GenerateOptions::new(manifest, master).with_out_dir(out.path())).unwrap();
        assert_eq!(icons[0].output_path(), out.path().join("icons").join("16.png"));

        write_all(&icons).unwrap();
        let written = image::open(out.path().join("icons").join("16.png")).unwrap();
        assert_eq!(written.dimensions(), (16, 16));
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let (_dir, manifest, master) = fixture(
            r#"{
                "icons": { "16": "i16.png", "32": "i32.png", "48": "i48.png", "128": "i128.png" },
                "page_action": { "default_icon": { "19": "i19.png", "38": "i38.png" } }
            }"#,
        );

        let options = GenerateOptions::new(manifest, master);
        let parallel = generate(&options).unwrap();
        let sequential = generate(&options.clone().with_parallel(false)).unwrap();

        let paths = |icons: &[GeneratedIcon]| -> Vec<PathBuf> {
            icons.iter().map(|i| i.output_path().to_path_buf()).collect()
        };
        assert_eq!(paths(&parallel), paths(&sequential));
        for (a, b) in parallel.iter().zip(&sequential) {
            assert_eq!(a.image().as_bytes(), b.image().as_bytes());
        }
    }
}
