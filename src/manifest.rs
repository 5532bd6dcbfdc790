use crate::error::{IconifyError, Result};
use crate::imaging::MAX_DIMENSION;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Manifest fields that map size strings to icon paths, in resolution order
pub const ICON_FIELDS: &[&str] = &[
    "icons",
    "browser_action.default_icon",
    "page_action.default_icon",
];

/// One declared icon: a pixel size and a path relative to the manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub size: u32,
    pub path: String,
}

impl ManifestEntry {
    /// Where this icon lands under `base_dir`.
    ///
    /// Extension manifests often write paths rooted at the extension
    /// directory (`/icons/16.png`), so a leading slash is not treated as absolute.
    pub fn output_path(&self, base_dir: &Path) -> PathBuf {
        base_dir.join(self.path.trim_start_matches(['/', '\\']))
    }
}

/// How strictly icon path values are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathStrictness {
    /// Only JSON strings are valid paths.
    #[default]
    Strict,
    /// Numbers and booleans are converted to their JSON text.
    Lenient,
}

/// A parsed manifest and the directory its icon paths are relative to
#[derive(Debug, Clone)]
pub struct Manifest {
    base_dir: PathBuf,
    content: Value,
}

impl Manifest {
    /// Read and parse a manifest file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| IconifyError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;

        let content = serde_json::from_str(&data).map_err(|source| IconifyError::ManifestParse {
            path: path.to_path_buf(),
            source,
        })?;

        let base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::from_value(content, base_dir))
    }

    pub fn from_value(content: Value, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            content,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    /// Resolve the deduplicated icon entries declared by this manifest.
    pub fn entries(&self, strictness: PathStrictness) -> Result<Vec<ManifestEntry>> {
        resolve(&self.content, strictness)
    }
}

/// Collect icon declarations from the known fields and collapse duplicates.
///
/// Fields are read in [`ICON_FIELDS`] order and each field's sizes in ascending
/// order. Entries keep the position of their first occurrence. The same path
/// declared with two different sizes is a [`IconifyError::Conflict`] naming the
/// later size first.
pub fn resolve(content: &Value, strictness: PathStrictness) -> Result<Vec<ManifestEntry>> {
    let declared = collect_declarations(content, strictness)?;

    let mut accepted: Vec<ManifestEntry> = Vec::with_capacity(declared.len());
    for entry in declared {
        // Accepted paths are unique, so the first match is the only one
        match accepted.iter().find(|seen| seen.path == entry.path) {
            Some(seen) if seen.size == entry.size => {
                tracing::debug!(size = entry.size, path = %entry.path, "skipping duplicate icon");
            }
            Some(seen) => {
                return Err(IconifyError::Conflict {
                    path: entry.path,
                    size: entry.size,
                    existing_size: seen.size,
                });
            }
            None => accepted.push(entry),
        }
    }

    Ok(accepted)
}

fn collect_declarations(content: &Value, strictness: PathStrictness) -> Result<Vec<ManifestEntry>> {
    let mut declared = Vec::new();

    for field in ICON_FIELDS {
        let icons = match lookup(content, field) {
            None | Some(Value::Null) => continue,
            Some(Value::Object(icons)) => icons,
            Some(_) => {
                tracing::warn!(field, "icon field is not a size map, skipping");
                continue;
            }
        };

        let mut field_entries = icons
            .iter()
            .map(|(size, path)| {
                Ok(ManifestEntry {
                    size: parse_size(size)?,
                    path: parse_path(path, strictness)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        // Size keys are walked numerically, not in document order
        field_entries.sort_by_key(|entry| entry.size);
        declared.extend(field_entries);
    }

    Ok(declared)
}

/// Follow a dotted field path through nested objects.
fn lookup<'a>(content: &'a Value, field: &str) -> Option<&'a Value> {
    field
        .split('.')
        .try_fold(content, |value, segment| value.get(segment))
}

fn parse_size(token: &str) -> Result<u32> {
    let size = token
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|size| *size > 0)
        .ok_or_else(|| IconifyError::InvalidSize {
            size: token.to_string(),
        })?;

    if size > MAX_DIMENSION {
        return Err(IconifyError::SizeTooLarge {
            size,
            max: MAX_DIMENSION,
        });
    }
    Ok(size)
}

fn parse_path(value: &Value, strictness: PathStrictness) -> Result<String> {
    match (value, strictness) {
        (Value::String(path), _) => Ok(path.clone()),
        (Value::Number(n), PathStrictness::Lenient) => Ok(n.to_string()),
        (Value::Bool(b), PathStrictness::Lenient) => Ok(b.to_string()),
        (other, _) => Err(IconifyError::InvalidPath {
            path: other.to_string(),
        }),
    }
}
