use crate::error::MarkPlateError;
use crate::types::{Mm, scale_by_aspect};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Characters the asset set cannot use as file stems keep reserved stand-in
/// keys: `.` is stored as `_` and `/` as `#`. Everything else is matched by
/// its lowercase form. Both the resolver and the index builder go through
/// this one function.
pub fn normalize_key(ch: char) -> String {
    match ch {
        '.' => "_".to_string(),
        '/' => "#".to_string(),
        _ => ch.to_lowercase().collect(),
    }
}

/// Metrics of a single glyph asset, or the absence of one. Missing glyphs
/// degrade to a square fallback; they are never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlyphAsset {
    Resolved { px_width: u32, px_height: u32 },
    Missing,
}

/// Read-only collaborator that owns the glyph image files. Implementations
/// may hit the filesystem; the layout core only ever sees the immutable
/// [`GlyphIndex`] snapshot built from one of these.
pub trait GlyphSource {
    /// Sorted list of normalized keys this source can serve.
    fn keys(&self) -> Vec<String>;

    fn has_asset(&self, key: &str) -> bool;

    /// Native pixel dimensions of the asset registered under `key`.
    fn pixel_dimensions(&self, key: &str) -> Result<(u32, u32), MarkPlateError>;

    /// Encoded image bytes for embedding. Sources that cannot provide bytes
    /// report an asset error; adapters then fall back to a placeholder box.
    fn image_bytes(&self, key: &str) -> Result<Vec<u8>, MarkPlateError>;
}

/// Directory-backed glyph store: one image file per character, keyed by the
/// lowercased file stem (`A.png` serves `a`, `_.png` serves `.`).
pub struct GlyphLibrary {
    entries: BTreeMap<String, PathBuf>,
}

impl GlyphLibrary {
    /// Scans `dir` for png/jpg/jpeg files. A missing or unreadable directory
    /// yields an empty library, matching the degrade-only error posture of
    /// the resolver.
    pub fn open(dir: impl AsRef<Path>) -> Self {
        let mut entries = BTreeMap::new();
        let mut names: Vec<PathBuf> = match std::fs::read_dir(dir.as_ref()) {
            Ok(iter) => iter
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| is_supported_image_path(path))
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        for path in names {
            let Some(stem) = path.file_stem().and_then(|v| v.to_str()) else {
                continue;
            };
            entries.insert(stem.to_lowercase(), path);
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl GlyphSource for GlyphLibrary {
    fn keys(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    fn has_asset(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    fn pixel_dimensions(&self, key: &str) -> Result<(u32, u32), MarkPlateError> {
        let path = self
            .entries
            .get(key)
            .ok_or_else(|| MarkPlateError::Asset(format!("no glyph asset for key '{}'", key)))?;
        image::image_dimensions(path)
            .map_err(|err| MarkPlateError::Asset(format!("unreadable glyph '{}': {}", key, err)))
    }

    fn image_bytes(&self, key: &str) -> Result<Vec<u8>, MarkPlateError> {
        let path = self
            .entries
            .get(key)
            .ok_or_else(|| MarkPlateError::Asset(format!("no glyph asset for key '{}'", key)))?;
        Ok(std::fs::read(path)?)
    }
}

fn is_supported_image_path(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|v| v.to_str()) else {
        return false;
    };
    matches!(ext.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg")
}

#[derive(Debug, Clone)]
struct GlyphEntry {
    px_width: u32,
    px_height: u32,
    data: Option<Vec<u8>>,
}

/// Immutable per-run snapshot of glyph metrics and image bytes. Built once
/// from a [`GlyphSource`] before layout; never mutated afterwards, so a plan
/// and both renderings of it always agree on every width.
#[derive(Debug, Clone, Default)]
pub struct GlyphIndex {
    entries: BTreeMap<String, GlyphEntry>,
}

impl GlyphIndex {
    pub fn from_source(source: &dyn GlyphSource) -> Self {
        let mut entries = BTreeMap::new();
        for key in source.keys() {
            // A source that lists a key but cannot produce dimensions is
            // treated as missing that glyph entirely.
            let Ok((px_width, px_height)) = source.pixel_dimensions(&key) else {
                log::warn!("glyph '{}' listed but unreadable, treating as missing", key);
                continue;
            };
            let data = source.image_bytes(&key).ok();
            entries.insert(
                key,
                GlyphEntry {
                    px_width,
                    px_height,
                    data,
                },
            );
        }
        Self { entries }
    }

    /// Snapshot with no assets at all; every character resolves to the
    /// square fallback.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(|k| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&self, ch: char) -> GlyphAsset {
        match self.entries.get(&normalize_key(ch)) {
            Some(entry) => GlyphAsset::Resolved {
                px_width: entry.px_width,
                px_height: entry.px_height,
            },
            None => GlyphAsset::Missing,
        }
    }

    /// Rendered width of `ch` at `height`, plus whether an asset backs it.
    /// Width is `height * aspect` for resolved glyphs and `height` (square)
    /// for missing ones. Whitespace never reaches this function; the layout
    /// engine spends the fixed space width instead.
    pub fn resolve_width(&self, ch: char, height: Mm) -> (Mm, bool) {
        match self.resolve(ch) {
            GlyphAsset::Resolved {
                px_width,
                px_height,
            } => (scale_by_aspect(height, px_width, px_height), true),
            GlyphAsset::Missing => (height, false),
        }
    }

    /// Encoded image bytes for a normalized key, when the snapshot holds
    /// them. Adapters draw the placeholder box when this is `None`.
    pub fn image_bytes(&self, key: &str) -> Option<&[u8]> {
        self.entries.get(key).and_then(|e| e.data.as_deref())
    }

    pub fn pixel_dimensions(&self, key: &str) -> Option<(u32, u32)> {
        self.entries.get(key).map(|e| (e.px_width, e.px_height))
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::MemoryGlyphSource;
    use super::*;

    #[test]
    fn normalize_maps_reserved_characters() {
        assert_eq!(normalize_key('.'), "_");
        assert_eq!(normalize_key('/'), "#");
        assert_eq!(normalize_key('A'), "a");
        assert_eq!(normalize_key('7'), "7");
    }

    #[test]
    fn resolved_width_follows_aspect_ratio() {
        let mut source = MemoryGlyphSource::default();
        source.with_dimensions("a", 120, 240);
        let index = GlyphIndex::from_source(&source);

        let (width, has_asset) = index.resolve_width('A', Mm::from_i32(100));
        assert!(has_asset);
        assert_eq!(width, Mm::from_i32(50));
    }

    #[test]
    fn missing_glyph_falls_back_to_square() {
        let index = GlyphIndex::empty();
        let (width, has_asset) = index.resolve_width('Z', Mm::from_i32(75));
        assert!(!has_asset);
        assert_eq!(width, Mm::from_i32(75));
    }

    #[test]
    fn unreadable_asset_is_treated_as_missing() {
        let mut source = MemoryGlyphSource::default();
        source.with_dimensions("a", 100, 100).with_unreadable("b");
        let index = GlyphIndex::from_source(&source);

        assert_eq!(index.resolve('b'), GlyphAsset::Missing);
        let (width, has_asset) = index.resolve_width('b', Mm::from_i32(100));
        assert!(!has_asset);
        assert_eq!(width, Mm::from_i32(100));
    }

    #[test]
    fn dot_resolves_through_reserved_key() {
        let mut source = MemoryGlyphSource::default();
        source.with_dimensions("_", 50, 100);
        let index = GlyphIndex::from_source(&source);

        let (width, has_asset) = index.resolve_width('.', Mm::from_i32(100));
        assert!(has_asset);
        assert_eq!(width, Mm::from_i32(50));
        assert_eq!(index.resolve('/'), GlyphAsset::Missing);
    }
}
