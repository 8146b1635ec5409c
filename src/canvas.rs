use crate::types::{Color, Mm, Size};

/// Drawing commands recorded per page. Positions are millimetres from the
/// page's top-left corner; stroke widths and font sizes are in points, the
/// print-side convention. Text commands take the baseline y.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    SetFillColor(Color),
    SetStrokeColor(Color),
    SetLineWidth(f32),
    SetFontSize(f32),
    MoveTo {
        x: Mm,
        y: Mm,
    },
    LineTo {
        x: Mm,
        y: Mm,
    },
    Stroke,
    DrawRect {
        x: Mm,
        y: Mm,
        width: Mm,
        height: Mm,
    },
    /// Text centered horizontally on `x`.
    DrawStringCentered {
        x: Mm,
        y: Mm,
        text: String,
    },
    /// Glyph image stretched into the given box. `resource_id` is the
    /// normalized glyph key, resolved against the run's glyph snapshot.
    DrawImage {
        x: Mm,
        y: Mm,
        width: Mm,
        height: Mm,
        resource_id: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub commands: Vec<Command>,
}

impl Page {
    fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub page_size: Size,
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone)]
struct GraphicsState {
    fill_color: Color,
    stroke_color: Color,
    line_width: f32,
    font_size: f32,
}

impl GraphicsState {
    fn initial() -> Self {
        Self {
            fill_color: Color::BLACK,
            stroke_color: Color::BLACK,
            line_width: 1.0,
            font_size: 12.0,
        }
    }
}

/// Records commands for one document, deduplicating state changes so that
/// identical plans produce identical command streams.
pub struct Canvas {
    page_size: Size,
    pages: Vec<Page>,
    current: Page,
    state: GraphicsState,
}

impl Canvas {
    pub fn new(page_size: Size) -> Self {
        Self {
            page_size,
            pages: Vec::new(),
            current: Page::new(),
            state: GraphicsState::initial(),
        }
    }

    pub fn page_size(&self) -> Size {
        self.page_size
    }

    pub fn set_fill_color(&mut self, color: Color) {
        if self.state.fill_color == color {
            return;
        }
        self.state.fill_color = color;
        self.current.commands.push(Command::SetFillColor(color));
    }

    pub fn set_stroke_color(&mut self, color: Color) {
        if self.state.stroke_color == color {
            return;
        }
        self.state.stroke_color = color;
        self.current.commands.push(Command::SetStrokeColor(color));
    }

    pub fn set_line_width(&mut self, width: f32) {
        let width = width.max(0.0);
        if self.state.line_width == width {
            return;
        }
        self.state.line_width = width;
        self.current.commands.push(Command::SetLineWidth(width));
    }

    pub fn set_font_size(&mut self, size: f32) {
        if self.state.font_size == size {
            return;
        }
        self.state.font_size = size;
        self.current.commands.push(Command::SetFontSize(size));
    }

    pub fn move_to(&mut self, x: Mm, y: Mm) {
        self.current.commands.push(Command::MoveTo { x, y });
    }

    pub fn line_to(&mut self, x: Mm, y: Mm) {
        self.current.commands.push(Command::LineTo { x, y });
    }

    pub fn stroke(&mut self) {
        self.current.commands.push(Command::Stroke);
    }

    pub fn draw_rect(&mut self, x: Mm, y: Mm, width: Mm, height: Mm) {
        self.current.commands.push(Command::DrawRect {
            x,
            y,
            width,
            height,
        });
    }

    pub fn draw_string_centered(&mut self, x: Mm, y: Mm, text: impl Into<String>) {
        self.current.commands.push(Command::DrawStringCentered {
            x,
            y,
            text: text.into(),
        });
    }

    pub fn draw_image(
        &mut self,
        x: Mm,
        y: Mm,
        width: Mm,
        height: Mm,
        resource_id: impl Into<String>,
    ) {
        self.current.commands.push(Command::DrawImage {
            x,
            y,
            width,
            height,
            resource_id: resource_id.into(),
        });
    }

    /// Closes the current page and starts a fresh one with default state.
    pub fn show_page(&mut self) {
        let current = std::mem::replace(&mut self.current, Page::new());
        self.pages.push(current);
        self.state = GraphicsState::initial();
    }

    pub fn is_current_empty(&self) -> bool {
        self.current.commands.is_empty()
    }

    pub fn finish(mut self) -> Document {
        if !self.current.commands.is_empty() || self.pages.is_empty() {
            self.show_page();
        }
        Document {
            page_size: self.page_size,
            pages: self.pages,
        }
    }
}
