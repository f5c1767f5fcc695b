use ab_glyph::FontVec;
use anyhow::{Result, anyhow};
use spr_core::{ButtonScreen, ComprehensionCheck, FieldKind, FormState, Stage, SurveyForm};
use tiny_skia::{Color, Paint, Pixmap, PixmapPaint, Rect, Transform};

use crate::text::{TextCache, render_text_pixmap, text_width, wrap_lines};

const BACKGROUND: Color = Color::BLACK;
const FOREGROUND: Color = Color::WHITE;

fn dim() -> Color {
    Color::from_rgba8(170, 170, 170, 255)
}

fn accent() -> Color {
    Color::from_rgba8(255, 200, 90, 255)
}

fn error_red() -> Color {
    Color::from_rgba8(255, 110, 110, 255)
}

/// What the window shows for the current stage.
#[derive(Debug, Clone, Copy)]
pub enum View<'a> {
    Blank,
    Button(&'a ButtonScreen),
    Word(&'a str),
    Question(&'a ComprehensionCheck),
    Form {
        form: &'a SurveyForm,
        state: &'a FormState,
        error: Option<&'a str>,
    },
}

impl<'a> View<'a> {
    pub fn from_stage(
        stage: Option<&'a Stage>,
        form_state: Option<&'a FormState>,
        error: Option<&'a str>,
    ) -> Self {
        match (stage, form_state) {
            (Some(Stage::Button { screen, .. }), _) => View::Button(screen),
            (Some(Stage::Word { word, .. }), _) => View::Word(word),
            (Some(Stage::Question { check, .. }), _) => View::Question(check),
            (Some(Stage::Form { form, .. }), Some(state)) => View::Form { form, state, error },
            _ => View::Blank,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextSizes {
    pub word: f32,
    pub text: f32,
}

impl Default for TextSizes {
    fn default() -> Self {
        Self {
            word: 48.0,
            text: 24.0,
        }
    }
}

/// Software renderer drawing one stage per frame onto an opaque RGBA canvas
pub struct SkiaRenderer {
    width: u32,
    height: u32,
    center: (f32, f32),
    font: FontVec,
    sizes: TextSizes,
    text_cache: TextCache,
    canvas: Pixmap,
    button_rect: Option<Rect>,
}

impl SkiaRenderer {
    pub fn new(width: u32, height: u32, font: FontVec, sizes: TextSizes) -> Result<Self> {
        let canvas = Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| anyhow!("cannot create a {width}x{height} canvas"))?;
        Ok(Self {
            width,
            height,
            center: (width as f32 / 2.0, height as f32 / 2.0),
            font,
            sizes,
            text_cache: TextCache::new(),
            canvas,
            button_rect: None,
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<()> {
        self.canvas = Pixmap::new(new_width.max(1), new_height.max(1))
            .ok_or_else(|| anyhow!("cannot resize canvas to {new_width}x{new_height}"))?;
        self.width = new_width;
        self.height = new_height;
        self.center = (new_width as f32 / 2.0, new_height as f32 / 2.0);
        self.button_rect = None;
        Ok(())
    }

    /// Bounds of the button drawn in the last frame, if it had one.
    pub fn button_rect(&self) -> Option<Rect> {
        self.button_rect
    }

    pub fn hits_button(&self, x: f32, y: f32) -> bool {
        self.button_rect.is_some_and(|r| {
            x >= r.left() && x <= r.right() && y >= r.top() && y <= r.bottom()
        })
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    pub fn cached_texts(&self) -> usize {
        self.text_cache.len()
    }

    /// Draws `view` and copies the finished canvas into `frame` (RGBA8, same size).
    pub fn render_frame(&mut self, view: View<'_>, frame: &mut [u8]) -> Result<()> {
        self.draw(view);
        let data = self.canvas.data();
        if frame.len() != data.len() {
            return Err(anyhow!(
                "frame buffer is {} bytes, canvas is {}",
                frame.len(),
                data.len()
            ));
        }
        // opaque background: premultiplied and straight alpha are the same bytes
        frame.copy_from_slice(data);
        Ok(())
    }

    pub fn draw(&mut self, view: View<'_>) {
        self.canvas.fill(BACKGROUND);
        self.button_rect = None;

        match view {
            View::Blank => {}
            View::Word(word) => {
                self.draw_text_centered(word, self.sizes.word, FOREGROUND, self.center);
            }
            View::Question(check) => self.draw_question(check),
            View::Button(screen) => self.draw_button_screen(screen),
            View::Form { form, state, error } => self.draw_form(form, state, error),
        }
    }

    fn draw_question(&mut self, check: &ComprehensionCheck) {
        let (cx, cy) = self.center;
        let size = self.sizes.text * 1.3;
        let lines = self.wrap(&check.question, size);
        let line_h = size * 1.4;
        let mut y = cy - line_h * lines.len() as f32 / 2.0;
        for line in &lines {
            self.draw_text_centered(line, size, FOREGROUND, (cx, y));
            y += line_h;
        }
        self.draw_text_centered(&check.prompt, self.sizes.text, dim(), (cx, y + line_h));
    }

    fn draw_button_screen(&mut self, screen: &ButtonScreen) {
        let cx = self.center.0;
        let text = self.sizes.text;
        let mut y = self.height as f32 * 0.2;

        self.draw_text_centered(&screen.title, text * 1.5, FOREGROUND, (cx, y));
        y += text * 3.0;

        for paragraph in &screen.paragraphs {
            for line in self.wrap(paragraph, text) {
                self.draw_text_centered(&line, text, FOREGROUND, (cx, y));
                y += text * 1.4;
            }
            y += text * 0.8;
        }

        self.draw_button(&screen.button, (cx, y + text * 1.5));
    }

    fn draw_form(&mut self, form: &SurveyForm, state: &FormState, error: Option<&str>) {
        let cx = self.center.0;
        let text = self.sizes.text;
        let mut y = self.height as f32 * 0.15;

        for line in self.wrap(&form.preamble, text) {
            self.draw_text_centered(&line, text, FOREGROUND, (cx, y));
            y += text * 1.4;
        }
        y += text;

        for (i, field) in form.fields.iter().enumerate() {
            let focused = i == state.focus();
            let value = state.value(i).unwrap_or_default();
            let marker = if field.required { " *" } else { "" };
            let label_color = if focused { accent() } else { FOREGROUND };
            self.draw_text_centered(
                &format!("{}{marker}", field.label),
                text,
                label_color,
                (cx, y),
            );
            y += text * 1.4;

            let shown = match &field.kind {
                FieldKind::Radio { options } => options
                    .iter()
                    .map(|o| {
                        if o == value {
                            format!("[x] {o}")
                        } else {
                            format!("[ ] {o}")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("    "),
                FieldKind::Number | FieldKind::TextArea if focused => format!("{value}_"),
                FieldKind::Number | FieldKind::TextArea if value.is_empty() => "-".to_string(),
                FieldKind::Number | FieldKind::TextArea => value.to_string(),
            };
            let value_color = if focused { FOREGROUND } else { dim() };
            // the line being typed changes every keystroke and is not worth caching
            let live = focused && !matches!(field.kind, FieldKind::Radio { .. });
            for line in self.wrap(&shown, text) {
                if live {
                    let pixmap = render_text_pixmap(&line, text, &self.font, value_color);
                    if let Some(pixmap) = pixmap {
                        self.blit_centered(&pixmap, (cx, y));
                    }
                } else {
                    self.draw_text_centered(&line, text, value_color, (cx, y));
                }
                y += text * 1.4;
            }
            y += text * 0.8;
        }

        if let Some(msg) = error {
            self.draw_text_centered(msg, text, error_red(), (cx, y));
            y += text * 1.4;
        }
        self.draw_text_centered(
            "Tab: next field    Left/Right: choose option    Enter: submit",
            text * 0.75,
            dim(),
            (cx, y + text * 0.5),
        );
        self.draw_button(&form.button, (cx, y + text * 3.0));
    }

    fn draw_button(&mut self, label: &str, center: (f32, f32)) {
        let size = self.sizes.text;
        let w = text_width(&self.font, size, label) + size * 2.0;
        let h = size * 2.0;
        let Some(rect) = Rect::from_xywh(center.0 - w / 2.0, center.1 - h / 2.0, w, h) else {
            return;
        };

        let mut paint = Paint::default();
        paint.set_color(Color::from_rgba8(60, 60, 60, 255));
        paint.anti_alias = false;
        self.canvas.fill_rect(rect, &paint, Transform::identity(), None);

        self.draw_text_centered(label, size, FOREGROUND, center);
        self.button_rect = Some(rect);
    }

    fn wrap(&self, text: &str, size: f32) -> Vec<String> {
        let max_width = (self.width as f32 - 80.0).clamp(200.0, 1000.0);
        wrap_lines(text, max_width, |s| text_width(&self.font, size, s))
    }

    fn draw_text_centered(&mut self, text: &str, size: f32, color: Color, pos: (f32, f32)) {
        if let Some(pm) = self.text_cache.get_or_render(&self.font, text, size, color) {
            self.blit_centered(&pm, pos);
        }
    }

    fn blit_centered(&mut self, pixmap: &Pixmap, pos: (f32, f32)) {
        let x = (pos.0 - pixmap.width() as f32 * 0.5).round() as i32;
        let y = (pos.1 - pixmap.height() as f32 * 0.5).round() as i32;
        self.canvas.draw_pixmap(
            x,
            y,
            pixmap.as_ref(),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}
