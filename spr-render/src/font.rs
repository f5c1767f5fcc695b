use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use anyhow::{Context, Result, anyhow};

/// Searched in order when no font path is configured.
pub const FONT_CANDIDATES: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Loads the configured font, or the first system font found in [`FONT_CANDIDATES`].
pub fn load_font(path: Option<&Path>) -> Result<FontVec> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => FONT_CANDIDATES
            .iter()
            .map(PathBuf::from)
            .find(|p| p.exists())
            .ok_or_else(|| {
                anyhow!("no usable font found; set display.font_path in the config")
            })?,
    };

    let bytes =
        std::fs::read(&path).with_context(|| format!("failed to read font {}", path.display()))?;
    let font = FontVec::try_from_vec(bytes)
        .map_err(|e| anyhow!("invalid font {}: {e}", path.display()))?;
    tracing::debug!(font = %path.display(), "font loaded");
    Ok(font)
}
