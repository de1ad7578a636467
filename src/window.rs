//! Rectangular render surfaces over the terminal grid.

use ratatui::{buffer::Buffer, layout::Rect, style::Style};
use unicode_width::UnicodeWidthChar;

const TITLE_HEIGHT: u16 = 1;
const MARKET_HEIGHT: u16 = 4;
const LABEL_HEIGHT: u16 = 1;
const COMMAND_HEIGHT: u16 = 1;

/// A region of the screen that clips everything printed into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Window {
    pub area: Rect,
}

impl Window {
    pub fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            area: Rect::new(x, y, width, height),
        }
    }

    pub fn width(&self) -> usize {
        self.area.width as usize
    }

    pub fn height(&self) -> usize {
        self.area.height as usize
    }

    /// Print `text` at an offset inside the window.
    ///
    /// The cursor advances by each character's display width, so wide glyphs
    /// take two cells. Anything that would land past the right edge is
    /// dropped. Returns the number of columns the text occupies, clipped or not.
    pub fn print(&self, buf: &mut Buffer, x: usize, y: usize, style: Style, text: &str) -> usize {
        let mut col = x;
        for ch in text.chars() {
            let width = ch.width().unwrap_or(0);
            if width == 0 {
                continue;
            }
            if y < self.height() && col + width <= self.width() {
                self.set_cell(buf, col, y, ch, style);
                for hidden in 1..width {
                    self.reset_cell(buf, col + hidden, y);
                }
            }
            col += width;
        }
        col - x
    }

    /// Blank every cell in the window and reset its colors.
    pub fn clear(&self, buf: &mut Buffer) {
        for y in 0..self.height() {
            for x in 0..self.width() {
                self.reset_cell(buf, x, y);
            }
        }
    }

    fn position(&self, x: usize, y: usize) -> (u16, u16) {
        (self.area.x + x as u16, self.area.y + y as u16)
    }

    fn set_cell(&self, buf: &mut Buffer, x: usize, y: usize, ch: char, style: Style) {
        if let Some(cell) = buf.cell_mut(self.position(x, y)) {
            cell.reset();
            cell.set_char(ch).set_style(style);
        }
    }

    fn reset_cell(&self, buf: &mut Buffer, x: usize, y: usize) {
        if let Some(cell) = buf.cell_mut(self.position(x, y)) {
            cell.reset();
        }
    }
}

/// The fixed vertical partition of the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Screen {
    pub title: Window,
    pub market: Window,
    pub labels: Window,
    pub stocks: Window,
    pub command: Window,
}

impl Screen {
    /// Lay out every window for a terminal of the given size.
    pub fn new(width: u16, height: u16) -> Self {
        let chrome = TITLE_HEIGHT + MARKET_HEIGHT + LABEL_HEIGHT + COMMAND_HEIGHT;
        let labels_y = TITLE_HEIGHT + MARKET_HEIGHT;

        Self {
            title: Window::new(0, 0, width, TITLE_HEIGHT),
            market: Window::new(0, TITLE_HEIGHT, width, MARKET_HEIGHT),
            labels: Window::new(0, labels_y, width, LABEL_HEIGHT),
            stocks: Window::new(
                0,
                labels_y + LABEL_HEIGHT,
                width,
                height.saturating_sub(chrome),
            ),
            command: Window::new(
                0,
                height.saturating_sub(COMMAND_HEIGHT),
                width,
                COMMAND_HEIGHT,
            ),
        }
    }

    /// Rows available for quotes.
    pub fn stock_rows(&self) -> usize {
        self.stocks.height()
    }

    pub fn windows(&self) -> [Window; 5] {
        [
            self.title,
            self.market,
            self.labels,
            self.stocks,
            self.command,
        ]
    }
}
