use crate::core::FileEntry;
use crate::highlight;
use crate::selection::{DrawSnapshot, SelectionState};
use crate::terminal::{self, WindowSize};
use crate::transform::{self, CaseStyle, SeparatorPolicy};
use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, SetAttribute, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, Write};
use std::ops::Range;

const NEWLINE: &str = "\r\n";
const MIN_LEGEND_WIDTH: usize = 40;
const LEGEND_SPACER: &str = "  ·  ";
const LEGEND: &[&str] = &[
    "↑/k up",
    "↓/j down",
    "space toggle",
    "^A toggle all",
    "^F edit filters",
    "enter confirm",
    "q quit",
];
const EDIT_CAPTION: &str = "comma-separated substrings  ·  enter apply  ·  esc cancel";

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub title: String,
    pub highlight: Color,
    pub show_preview: bool,
    pub style: CaseStyle,
    pub separator: SeparatorPolicy,
}

pub struct Renderer {
    settings: RenderSettings,
    last: Option<DrawSnapshot>,
    window: fn() -> WindowSize,
}

impl Renderer {
    pub fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
            last: None,
            window: terminal::window_size,
        }
    }

    pub fn with_window(mut self, window: fn() -> WindowSize) -> Self {
        self.window = window;
        self
    }

    /// Redraws the whole screen unless nothing visible changed since the
    /// last draw and `force` is off. Returns whether anything was written.
    pub fn draw<W: Write>(
        &mut self,
        out: &mut W,
        state: &SelectionState,
        files: &[FileEntry],
        force: bool,
    ) -> io::Result<bool> {
        let snapshot = state.snapshot();
        if !force && self.last.as_ref() == Some(&snapshot) {
            return Ok(false);
        }

        let size = (self.window)();
        let width = usize::from(size.columns)
            .saturating_sub(2)
            .max(MIN_LEGEND_WIDTH);

        queue!(out, Clear(ClearType::All), MoveTo(0, 0))?;
        queue!(
            out,
            SetAttribute(Attribute::Bold),
            Print(&self.settings.title),
            SetAttribute(Attribute::Reset),
            Print(NEWLINE)
        )?;
        let legend = wrap_chips(LEGEND, LEGEND_SPACER, width);
        for line in &legend {
            dim_line(out, line)?;
        }
        let filters = if state.filters().is_empty() {
            "(none)".to_string()
        } else {
            state.filters().join(", ")
        };
        queue!(out, Print("Filters: "), Print(filters), Print(NEWLINE), Print(NEWLINE))?;

        let editing = state.edit_buffer();
        let header = legend.len() + 3;
        let footer = if editing.is_some() { 3 } else { 0 };
        let height = usize::from(size.rows)
            .saturating_sub(header + footer + 1)
            .max(1);
        let visible = visible_range(files.len(), state.cursor(), height);

        if files.is_empty() {
            dim_line(out, "  (no files)")?;
        }
        for index in visible.clone() {
            self.draw_row(out, state, &files[index], index)?;
        }
        if visible.len() < files.len() {
            let position = format!("  {}-{} of {}", visible.start + 1, visible.end, files.len());
            dim_line(out, &position)?;
        }

        if let Some(buffer) = editing {
            queue!(out, Print(NEWLINE), Print("Filter> "), Print(buffer), Print(NEWLINE))?;
            dim_line(out, EDIT_CAPTION)?;
        }

        out.flush()?;
        self.last = Some(snapshot);
        Ok(true)
    }

    fn draw_row<W: Write>(
        &self,
        out: &mut W,
        state: &SelectionState,
        entry: &FileEntry,
        index: usize,
    ) -> io::Result<()> {
        let is_cursor = index == state.cursor();
        let marker = if state.selected().contains(&index) { "[x]" } else { "[ ]" };
        let pointer = if is_cursor { ">" } else { " " };

        // The cursor row is in inverse video already, so matches there are
        // underlined instead of colored.
        if is_cursor {
            queue!(out, SetAttribute(Attribute::Reverse))?;
        }
        queue!(out, Print(format!("{pointer} {marker} ")))?;

        let mask = highlight::match_mask(&entry.filename, state.filters());
        for segment in highlight::segments(&entry.filename, &mask) {
            if !segment.matched {
                queue!(out, Print(&segment.text))?;
            } else if is_cursor {
                queue!(
                    out,
                    SetAttribute(Attribute::Underlined),
                    Print(&segment.text),
                    SetAttribute(Attribute::NoUnderline)
                )?;
            } else {
                queue!(
                    out,
                    SetAttribute(Attribute::Bold),
                    SetForegroundColor(self.settings.highlight),
                    Print(&segment.text),
                    SetAttribute(Attribute::Reset)
                )?;
            }
        }

        if self.settings.show_preview {
            let preview = transform::preview_name(
                &entry.filename,
                state.filters(),
                self.settings.style,
                &self.settings.separator,
            );
            queue!(
                out,
                SetAttribute(Attribute::Dim),
                Print(format!("  → {preview}")),
                SetAttribute(Attribute::NormalIntensity)
            )?;
        }
        if is_cursor {
            queue!(out, SetAttribute(Attribute::NoReverse))?;
        }
        queue!(out, SetAttribute(Attribute::Reset), Print(NEWLINE))
    }
}

fn dim_line<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    queue!(
        out,
        SetAttribute(Attribute::Dim),
        Print(text),
        SetAttribute(Attribute::Reset),
        Print(NEWLINE)
    )
}

/// Greedy line packing; a chip is never split, even when wider than `width`.
pub fn wrap_chips(chips: &[&str], spacer: &str, width: usize) -> Vec<String> {
    let spacer_width = spacer.chars().count();
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_width = 0;
    for chip in chips {
        let chip_width = chip.chars().count();
        if line_width > 0 && line_width + spacer_width + chip_width > width {
            lines.push(std::mem::take(&mut line));
            line_width = 0;
        }
        if line_width > 0 {
            line.push_str(spacer);
            line_width += spacer_width;
        }
        line.push_str(chip);
        line_width += chip_width;
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Page of `height` rows that contains the cursor.
fn visible_range(total: usize, cursor: usize, height: usize) -> Range<usize> {
    if total <= height {
        return 0..total;
    }
    let start = (cursor / height) * height;
    start..(start + height).min(total)
}

pub fn parse_color(value: &str) -> Color {
    let value = value.trim();
    if let Some(hex) = value.strip_prefix('#') {
        if hex.len() == 6 && hex.is_ascii() {
            let parse = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
            if let (Some(r), Some(g), Some(b)) = (parse(0..2), parse(2..4), parse(4..6)) {
                return Color::Rgb { r, g, b };
            }
        }
    }
    match value.to_ascii_lowercase().as_str() {
        "black" => Color::Black,
        "red" => Color::DarkRed,
        "green" => Color::DarkGreen,
        "yellow" => Color::DarkYellow,
        "blue" => Color::DarkBlue,
        "magenta" => Color::DarkMagenta,
        "cyan" => Color::DarkCyan,
        "white" => Color::White,
        "gray" | "grey" => Color::Grey,
        "darkgray" | "darkgrey" => Color::DarkGrey,
        "lightred" => Color::Red,
        "lightgreen" => Color::Green,
        "lightyellow" => Color::Yellow,
        "lightblue" => Color::Blue,
        "lightmagenta" => Color::Magenta,
        "lightcyan" => Color::Cyan,
        _ => Color::DarkYellow,
    }
}
