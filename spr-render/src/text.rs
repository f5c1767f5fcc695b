use std::collections::HashMap;
use std::sync::Arc;

use ab_glyph::{Font, Glyph, PxScale, ScaleFont, point};
use string_cache::DefaultAtom as Atom;
use tiny_skia::{Color, Pixmap, PremultipliedColorU8};

/// Horizontal advance of `text` at `size_px`, kerning included.
pub fn text_width<F: Font>(font: &F, size_px: f32, text: &str) -> f32 {
    let sf = font.as_scaled(PxScale::from(size_px));
    let mut width = 0.0;
    let mut prev = None;
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(p) = prev {
            width += sf.kern(p, id);
        }
        width += sf.h_advance(id);
        prev = Some(id);
    }
    width
}

/// Greedy word wrap. Words wider than `max_width` get a line of their own.
pub fn wrap_lines(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{line} {word}");
        if measure(&candidate) <= max_width {
            line = candidate;
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Rasterizes a single line of text into a tight, transparent, premultiplied pixmap.
///
/// Returns `None` when the text has no visible glyph (empty words, spaces).
pub fn render_text_pixmap<F: Font>(
    text: &str,
    font_size: f32,
    font: &F,
    color: Color,
) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let outlines: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();

    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for out in &outlines {
        let b = out.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }

    if outlines.is_empty() {
        return None;
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;

    let stride = w as usize;
    let dst = pm.pixels_mut();
    let cu = color.to_color_u8();

    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            // premultiply by coverage, then source-over onto what is already there
            let a = (cov * cu.alpha() as f32 / 255.0).clamp(0.0, 1.0);
            let sa = (a * 255.0) as u8;
            let inv = 1.0 - a;
            let bg = dst[i];
            let blend = |s: u8, d: u8| ((s as f32 * a) as u8).saturating_add((d as f32 * inv) as u8);
            let r = blend(cu.red(), bg.red());
            let g = blend(cu.green(), bg.green());
            let bl = blend(cu.blue(), bg.blue());
            let al = sa.saturating_add((bg.alpha() as f32 * inv) as u8);

            if let Some(px) = PremultipliedColorU8::from_rgba(r.min(al), g.min(al), bl.min(al), al)
            {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}

#[derive(Hash, Eq, PartialEq, Clone)]
struct TextKey {
    text: Atom,
    size_bits: u32,
    rgba: [u8; 4],
}

pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Rendered text pixmaps keyed by content, size and color.
///
/// Holds at most `capacity` entries; inserting past that starts over from empty.
pub struct TextCache {
    map: HashMap<TextKey, Option<Arc<Pixmap>>>,
    capacity: usize,
}

impl TextCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            map: HashMap::with_capacity(capacity.min(256)),
            capacity,
        }
    }

    pub fn get_or_render<F: Font>(
        &mut self,
        font: &F,
        text: &str,
        size_px: f32,
        color: Color,
    ) -> Option<Arc<Pixmap>> {
        let c = color.to_color_u8();
        let key = TextKey {
            text: Atom::from(text),
            size_bits: size_px.to_bits(),
            rgba: [c.red(), c.green(), c.blue(), c.alpha()],
        };
        if let Some(p) = self.map.get(&key) {
            return p.clone();
        }
        let pm = render_text_pixmap(text, size_px, font, color).map(Arc::new);
        if self.map.len() >= self.capacity {
            tracing::trace!(entries = self.map.len(), "text cache full, dropping entries");
            self.map.clear();
        }
        self.map.insert(key, pm.clone());
        pm
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Default for TextCache {
    fn default() -> Self {
        Self::new()
    }
}
