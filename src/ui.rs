//! The view controller: quote snapshot, visible window, selection and sort.
//!
//! `Ui` is the only writer of derived view state. It never changes the
//! input mode; the application loop passes the mode in when drawing.

use crate::api::{QuoteSource, market_name};
use crate::app::Mode;
use crate::error::CommandError;
use crate::layout::{Layout, format_number};
use crate::line_editor::{LineEditor, Outcome};
use crate::models::{Quote, SortDirection};
use crate::profile::Profile;
use crate::window::Screen;
use chrono::Local;
use crossterm::event::KeyEvent;
use ratatui::{
    Frame,
    buffer::Buffer,
    style::{Color, Modifier, Style},
};
use tracing::{debug, warn};
use unicode_width::UnicodeWidthStr;

const APP_TITLE: &str = concat!("tickerdash ", env!("CARGO_PKG_VERSION"));
const TIME_FORMAT: &str = "%a %b %e %H:%M:%S %Z %Y";

pub struct Ui<S> {
    source: S,
    profile: Profile,
    market_symbols: Vec<String>,
    layout: Layout,
    screen: Screen,
    editor: LineEditor,
    /// Current snapshot, in display order
    quotes: Vec<Quote>,
    market: Vec<Quote>,
    /// Absolute index of the highlighted row
    selected: usize,
    /// Index of the first visible row
    offset: usize,
    visible_rows: usize,
    selected_column: usize,
    /// Column the active sort was taken on
    sorted_column: usize,
    sort_direction: SortDirection,
}

impl<S: QuoteSource> Ui<S> {
    pub fn new(
        source: S,
        profile: Profile,
        market_symbols: Vec<String>,
        width: u16,
        height: u16,
    ) -> Self {
        Self {
            source,
            profile,
            market_symbols,
            layout: Layout::new(),
            screen: Screen::new(width, height),
            editor: LineEditor::new(),
            quotes: Vec::new(),
            market: Vec::new(),
            selected: 0,
            offset: 0,
            visible_rows: 0,
            selected_column: 0,
            sorted_column: 0,
            sort_direction: SortDirection::None,
        }
    }

    /// Fetch the working list and the market band.
    ///
    /// A failed fetch leaves the previous snapshot on screen and reports the
    /// error in the command row, unless a prompt is being typed.
    pub async fn refresh(&mut self) {
        let keep = if self.sort_direction.is_active() {
            self.selected_symbol()
        } else {
            None
        };

        let result = self.source.fetch_quotes(self.profile.tickers()).await;
        match result {
            Ok(quotes) => {
                debug!(quotes = quotes.len(), "replacing snapshot");
                self.quotes = quotes;
                self.reconcile_window();
                if self.sort_direction.is_active() {
                    self.sort_snapshot();
                    if let Some(symbol) = keep {
                        self.select_symbol(&symbol);
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "quote fetch failed, keeping last snapshot");
                if !self.editor.is_active() {
                    self.editor.report_error(format!("fetch failed: {err}"));
                }
            }
        }

        let result = self.source.fetch_quotes(&self.market_symbols).await;
        match result {
            Ok(market) => self.market = market,
            Err(err) => warn!(error = %err, "market fetch failed"),
        }
    }

    /// Recompute the visible window for the current snapshot and screen.
    fn reconcile_window(&mut self) {
        let len = self.quotes.len();
        self.visible_rows = self.screen.stock_rows().min(len);
        if len == 0 {
            return;
        }

        let budget = self.row_budget();
        self.selected = self.selected.min(len - 1);
        self.offset = self.offset.min(len.saturating_sub(budget));
        if self.selected < self.offset {
            self.offset = self.selected;
        }
        if self.selected >= self.offset + budget {
            self.offset = self.selected + 1 - budget;
        }
    }

    /// Rows the selection may move through before scrolling. A screen too
    /// small for any rows still tracks the selection as if one were shown.
    fn row_budget(&self) -> usize {
        self.visible_rows.max(1)
    }

    pub fn navigate_down(&mut self) {
        if self.selected + 1 >= self.quotes.len() {
            return;
        }
        self.selected += 1;
        if self.selected >= self.offset + self.row_budget() {
            self.offset += 1;
        }
    }

    pub fn navigate_up(&mut self) {
        if self.quotes.is_empty() || self.selected == 0 {
            return;
        }
        self.selected -= 1;
        if self.selected < self.offset {
            self.offset -= 1;
        }
    }

    pub fn navigate_to_start(&mut self) {
        while self.selected > 0 && !self.quotes.is_empty() {
            self.navigate_up();
        }
    }

    pub fn navigate_to_end(&mut self) {
        while self.selected + 1 < self.quotes.len() {
            self.navigate_down();
        }
    }

    pub fn page_down(&mut self) {
        for _ in 0..self.row_budget() {
            self.navigate_down();
        }
    }

    pub fn page_up(&mut self) {
        for _ in 0..self.row_budget() {
            self.navigate_up();
        }
    }

    /// Walk the selection to `target` one row at a time.
    fn select_index(&mut self, target: usize) {
        if self.quotes.is_empty() {
            return;
        }
        let target = target.min(self.quotes.len() - 1);
        while self.selected < target {
            self.navigate_down();
        }
        while self.selected > target {
            self.navigate_up();
        }
    }

    fn select_symbol(&mut self, symbol: &str) -> bool {
        match self.quotes.iter().position(|q| q.symbol == symbol) {
            Some(index) => {
                self.select_index(index);
                true
            }
            None => false,
        }
    }

    fn reset_selection(&mut self) {
        self.selected = 0;
        self.offset = 0;
    }

    pub fn navigate_column_left(&mut self) {
        self.selected_column = self.selected_column.saturating_sub(1);
    }

    pub fn navigate_column_right(&mut self) {
        if self.selected_column + 1 < self.layout.len() {
            self.selected_column += 1;
        }
    }

    pub fn jump_column_first(&mut self) {
        self.selected_column = 0;
    }

    pub fn jump_column_last(&mut self) {
        self.selected_column = self.layout.len().saturating_sub(1);
    }

    pub fn sort_ascending(&mut self) {
        self.sort_by_selected_column(SortDirection::Ascending);
    }

    pub fn sort_descending(&mut self) {
        self.sort_by_selected_column(SortDirection::Descending);
    }

    fn sort_by_selected_column(&mut self, direction: SortDirection) {
        self.sorted_column = self.selected_column;
        self.sort_direction = direction;
        if self.quotes.is_empty() {
            return;
        }

        let keep = self.selected_symbol();
        self.sort_snapshot();
        if let Some(symbol) = keep {
            self.select_symbol(&symbol);
        }
    }

    /// Stable-sort the snapshot and carry the new order into the profile.
    fn sort_snapshot(&mut self) {
        let Some(column) = self.layout.column(self.sorted_column).copied() else {
            return;
        };
        let direction = self.sort_direction;
        self.quotes
            .sort_by(|a, b| direction.apply((column.value)(a).compare(&(column.value)(b))));

        // Tickers the feed did not return keep their place at the end.
        let mut order: Vec<String> = self.quotes.iter().map(|q| q.symbol.clone()).collect();
        for ticker in self.profile.tickers() {
            if !order.contains(ticker) {
                order.push(ticker.clone());
            }
        }
        self.profile.set_tickers(order);
    }

    /// Open a prompt for `ch`, discarding any previous editor state.
    pub fn prompt(&mut self, ch: char) -> bool {
        self.editor.done();
        self.editor.start_prompt(ch)
    }

    pub fn handle_editor_key(&mut self, key: KeyEvent) {
        self.editor.handle_key(key);
    }

    pub fn cancel_prompt(&mut self) {
        self.editor.done();
    }

    /// Run the active prompt's command, refetching when the working list changed.
    pub async fn execute_command(&mut self) {
        let command = self.editor.command();
        let selected = self.selected_quote().map(|q| (self.selected, q.symbol.clone()));
        let result = self.editor.execute(
            &mut self.profile,
            selected.as_ref().map(|(index, symbol)| (*index, symbol.as_str())),
        );
        self.editor.done();

        match result {
            Ok(Outcome::Added(ticker)) => {
                self.refresh().await;
                self.select_symbol(&ticker);
            }
            Ok(Outcome::Deleted(reselect)) => {
                self.refresh().await;
                if let Some(index) = reselect {
                    self.select_index(index);
                }
            }
            Ok(Outcome::Found { index, ticker }) => {
                // Listed but absent from the last fetch: no row to land on.
                if !self.select_symbol(&ticker) {
                    debug!(index, %ticker, "search hit has no row in snapshot");
                    self.editor
                        .report_error(CommandError::TickerNotFound(ticker).to_string());
                }
            }
            Ok(Outcome::Saved(message)) => {
                self.editor.report(message);
                if let Err(err) = self.profile.save() {
                    warn!(error = %err, "could not write saved portfolio");
                    self.editor.report_error(format!("failed to save profile: {err}"));
                }
                self.refresh().await;
                self.reset_selection();
            }
            Ok(Outcome::Portfolio(message)) => {
                self.editor.report(message);
                self.refresh().await;
                self.reset_selection();
            }
            Ok(Outcome::Unchanged) => {}
            Err(err) => {
                debug!(?command, error = %err, "command rejected");
                self.editor.report_error(err.to_string());
            }
        }
    }

    /// Lay out the windows for a new terminal size.
    pub fn resize(&mut self, width: u16, height: u16) {
        self.screen = Screen::new(width, height);
        self.reconcile_window();
    }

    pub fn report_error(&mut self, text: impl Into<String>) {
        self.editor.report_error(text);
    }

    pub fn dismiss_status(&mut self) {
        self.editor.dismiss_status();
    }

    pub fn selected_quote(&self) -> Option<&Quote> {
        self.quotes.get(self.selected)
    }

    fn selected_symbol(&self) -> Option<String> {
        self.selected_quote().map(|q| q.symbol.clone())
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Render every window. The command row is drawn last so an active
    /// prompt always wins over row content.
    pub fn draw(&self, frame: &mut Frame, mode: Mode) {
        let buf = frame.buffer_mut();
        for window in self.screen.windows() {
            window.clear(buf);
        }

        self.draw_title(buf);
        self.draw_market(buf);
        self.draw_labels(buf, mode);
        self.draw_stocks(buf, mode);

        let cursor = self.editor.draw(&self.screen.command, buf);
        if let Some(position) = cursor {
            frame.set_cursor_position(position);
        }
    }

    fn draw_title(&self, buf: &mut Buffer) {
        let window = &self.screen.title;
        let half = window.width() / 2;
        let now = Local::now().format(TIME_FORMAT).to_string();
        let title = format!("{APP_TITLE:<half$}{now:>half$}");
        window.print(
            buf,
            0,
            0,
            Style::default().add_modifier(Modifier::BOLD),
            &title,
        );
    }

    fn draw_market(&self, buf: &mut Buffer) {
        let window = &self.screen.market;
        let (mut x, mut y) = (0, 0);

        for quote in &self.market {
            let label = format!("{} ", market_name(&quote.symbol));
            let change = format!(
                "{} ({:.2}%)  ",
                format_number(quote.last, 2),
                quote.change_percent
            );
            if x + label.width() + change.width() > window.width() {
                y += 1;
                x = 0;
            }
            // The band's last line stays empty as a separator.
            if y + 1 >= window.height() {
                break;
            }
            x += window.print(buf, x, y, Style::default().fg(Color::Yellow), &label);
            x += window.print(buf, x, y, Style::default(), &change);
        }
    }

    fn draw_labels(&self, buf: &mut Buffer, mode: Mode) {
        let window = &self.screen.labels;
        let mut x = 0;

        for (index, column) in self.layout.columns().iter().enumerate() {
            let name = if index == self.sorted_column && self.sort_direction.is_active() {
                format!("{} {}", column.name, self.sort_direction.glyph())
            } else {
                column.name.to_string()
            };
            let label = format!("{:<width$}", name, width = column.width);
            let style = if index == self.selected_column && mode == Mode::Sort {
                Style::default().fg(Color::Black).bg(Color::White)
            } else {
                Style::default().add_modifier(Modifier::UNDERLINED)
            };
            x += window.print(buf, x, 0, style, &label);
        }
    }

    fn draw_stocks(&self, buf: &mut Buffer, mode: Mode) {
        let window = &self.screen.stocks;
        let rows = self
            .quotes
            .iter()
            .enumerate()
            .skip(self.offset)
            .take(self.visible_rows);

        for (row, (index, quote)) in rows.enumerate() {
            let style = if index == self.selected && mode != Mode::Sort {
                Style::default().fg(Color::Black).bg(Color::White)
            } else {
                Style::default().fg(change_color(quote.change))
            };
            window.print(buf, 0, row, style, &self.layout.format_row(quote));
        }
    }
}

#[cfg(test)]
impl<S> Ui<S> {
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn window_offset(&self) -> usize {
        self.offset
    }

    pub fn visible_rows(&self) -> usize {
        self.visible_rows
    }

    pub fn selected_column(&self) -> usize {
        self.selected_column
    }

    pub fn sort_direction(&self) -> SortDirection {
        self.sort_direction
    }

    pub fn editor(&self) -> &LineEditor {
        &self.editor
    }
}

fn change_color(change: f64) -> Color {
    if change > 0.0 {
        Color::Green
    } else if change < 0.0 {
        Color::Red
    } else {
        Color::Blue
    }
}
