//! Single-line modal input bound to the command row.

use crate::error::CommandError;
use crate::profile::Profile;
use crate::window::Window;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Position,
    style::{Color, Style},
};
use unicode_width::UnicodeWidthStr;

/// A command started from normal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `a`: add comma-separated tickers
    Add,
    /// `d`: delete the selected ticker after confirmation
    Delete,
    /// `/`: jump to a ticker
    Search,
    /// `:`: portfolio management
    Colon,
}

impl Command {
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            'a' => Some(Command::Add),
            'd' => Some(Command::Delete),
            '/' => Some(Command::Search),
            ':' => Some(Command::Colon),
            _ => None,
        }
    }

    pub fn prompt(self) -> &'static str {
        match self {
            Command::Add => "add tickers: ",
            Command::Delete => "delete selected ticker? y/n :",
            Command::Search => "/",
            Command::Colon => ":",
        }
    }
}

/// What an executed command did to the working list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Tickers were added; select this one once quotes arrive
    Added(String),
    /// The selected ticker was removed; reselect this row if any
    Deleted(Option<usize>),
    /// The ticker exists in the working list
    Found { index: usize, ticker: String },
    /// A colon command ran; the message goes to the command row
    Portfolio(String),
    /// A portfolio was saved; the profile should be written out now
    Saved(String),
    /// Nothing changed
    Unchanged,
}

/// A one-shot message for the command row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub is_error: bool,
}

#[derive(Debug, Default)]
pub struct LineEditor {
    command: Option<Command>,
    /// Cursor position in characters
    cursor: usize,
    input: String,
    status: Option<Status>,
}

impl LineEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a prompt for `ch`. Unknown command characters are ignored.
    pub fn start_prompt(&mut self, ch: char) -> bool {
        match Command::from_char(ch) {
            Some(command) => {
                self.command = Some(command);
                self.input.clear();
                self.cursor = 0;
                true
            }
            None => false,
        }
    }

    pub fn command(&self) -> Option<Command> {
        self.command
    }

    pub fn is_active(&self) -> bool {
        self.command.is_some()
    }

    #[cfg(test)]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[cfg(test)]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[cfg(test)]
    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if !self.is_active() {
            return;
        }

        match key.code {
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.insert_char(ch)
            }
            KeyCode::Backspace => self.delete_prev_char(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Home => self.cursor = 0,
            KeyCode::End => self.cursor = self.input.chars().count(),
            _ => {}
        }
    }

    /// Run the active command against the working list.
    ///
    /// `selected` is the highlighted row's index and ticker, if any.
    pub fn execute(
        &self,
        profile: &mut Profile,
        selected: Option<(usize, &str)>,
    ) -> Result<Outcome, CommandError> {
        match self.command {
            Some(Command::Add) => {
                let tickers = parse_tickers(&self.input)?;
                profile.add_tickers(&tickers);
                match tickers.last() {
                    Some(last) => Ok(Outcome::Added(last.clone())),
                    None => Ok(Outcome::Unchanged),
                }
            }
            Some(Command::Delete) => {
                if self.input.trim().to_lowercase() != "y" {
                    return Ok(Outcome::Unchanged);
                }
                match selected {
                    Some((index, ticker)) if profile.remove_ticker(ticker) => {
                        Ok(Outcome::Deleted(index.checked_sub(1)))
                    }
                    _ => Ok(Outcome::Unchanged),
                }
            }
            Some(Command::Search) => {
                let ticker = self.input.trim().to_uppercase();
                match profile.ticker_index(&ticker) {
                    Some(index) => Ok(Outcome::Found { index, ticker }),
                    None => Err(CommandError::TickerNotFound(self.input.trim().to_string())),
                }
            }
            Some(Command::Colon) => execute_colon(&self.input, profile),
            None => Ok(Outcome::Unchanged),
        }
    }

    /// Leave the prompt: clear input, cursor, prompt and any message.
    pub fn done(&mut self) {
        self.command = None;
        self.input.clear();
        self.cursor = 0;
        self.status = None;
    }

    pub fn report(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            is_error: false,
        });
    }

    pub fn report_error(&mut self, text: impl Into<String>) {
        self.status = Some(Status {
            text: text.into(),
            is_error: true,
        });
    }

    pub fn dismiss_status(&mut self) {
        self.status = None;
    }

    /// Draw the command row. Returns where the input cursor should sit
    /// while a prompt is active.
    pub fn draw(&self, window: &Window, buf: &mut Buffer) -> Option<Position> {
        window.clear(buf);

        if let Some(status) = &self.status {
            let style = if status.is_error {
                Style::default().fg(Color::Red).bg(Color::White)
            } else {
                Style::default()
            };
            window.print(buf, 0, 0, style, &status.text);
            return None;
        }

        let command = self.command?;
        let prompt_width = window.print(buf, 0, 0, Style::default(), command.prompt());
        window.print(buf, prompt_width, 0, Style::default(), &self.input);

        let before_cursor: String = self.input.chars().take(self.cursor).collect();
        let x = (prompt_width + before_cursor.width()).min(window.width().saturating_sub(1));
        Some(Position::new(window.area.x + x as u16, window.area.y))
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn insert_char(&mut self, ch: char) {
        let at = self.byte_offset(self.cursor);
        self.input.insert(at, ch);
        self.cursor += 1;
    }

    fn delete_prev_char(&mut self) {
        if self.cursor == 0 {
            return;
        }
        let at = self.byte_offset(self.cursor - 1);
        self.input.remove(at);
        self.cursor -= 1;
    }

    fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn move_right(&mut self) {
        if self.cursor < self.input.chars().count() {
            self.cursor += 1;
        }
    }
}

/// Split `GOOG, aapl,BRK-B` into upper-cased tickers.
fn parse_tickers(input: &str) -> Result<Vec<String>, CommandError> {
    let tickers: Vec<String> = input
        .split(',')
        .map(|t| t.trim().to_uppercase())
        .collect();

    let valid = tickers
        .iter()
        .all(|t| !t.is_empty() && t.chars().all(|c| c.is_ascii_alphabetic() || c == '-'));
    if !valid {
        return Err(CommandError::InvalidTickers(input.trim().to_string()));
    }

    Ok(tickers)
}

fn execute_colon(input: &str, profile: &mut Profile) -> Result<Outcome, CommandError> {
    let mut args = input.split_whitespace();
    let Some(command) = args.next() else {
        return Err(CommandError::UnknownCommand(String::new()));
    };

    let message = match command {
        "save" => {
            let name = args
                .next()
                .ok_or_else(|| CommandError::MissingPortfolioName(command.to_string()))?;
            profile.save_portfolio(name);
            return Ok(Outcome::Saved(format!("saved portfolio as '{name}'")));
        }
        "load" => {
            let name = args
                .next()
                .ok_or_else(|| CommandError::MissingPortfolioName(command.to_string()))?;
            profile.load_portfolio(name)?;
            format!("loaded portfolio '{name}'")
        }
        "new" => {
            profile.clear_tickers();
            "creating new portfolio".to_string()
        }
        "list" => format!("saved portfolios: {}", profile.portfolio_names().join(", ")),
        other => return Err(CommandError::UnknownCommand(other.to_string())),
    };

    Ok(Outcome::Portfolio(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::layout::Rect;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn typed(command: char, text: &str) -> LineEditor {
        let mut editor = LineEditor::new();
        assert!(editor.start_prompt(command));
        for ch in text.chars() {
            editor.handle_key(key(KeyCode::Char(ch)));
        }
        editor
    }

    fn profile(tickers: &[&str]) -> Profile {
        Profile::new(
            "unused.json",
            tickers.iter().map(|t| t.to_string()).collect(),
        )
    }

    #[test]
    fn test_unknown_prompt_is_ignored() {
        let mut editor = LineEditor::new();
        assert!(!editor.start_prompt('x'));
        assert!(!editor.is_active());
    }

    #[test]
    fn test_keys_are_ignored_without_prompt() {
        let mut editor = LineEditor::new();
        editor.handle_key(key(KeyCode::Char('a')));
        assert_eq!(editor.input(), "");
    }

    #[test]
    fn test_insert_in_the_middle() {
        let mut editor = typed('a', "GOG");
        editor.handle_key(key(KeyCode::Left));
        editor.handle_key(key(KeyCode::Char('O')));
        assert_eq!(editor.input(), "GOOG");
        assert_eq!(editor.cursor(), 3);
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut editor = typed('/', "ab");
        editor.handle_key(key(KeyCode::Right));
        assert_eq!(editor.cursor(), 2);
        for _ in 0..5 {
            editor.handle_key(key(KeyCode::Left));
        }
        assert_eq!(editor.cursor(), 0);
        editor.handle_key(key(KeyCode::Backspace));
        assert_eq!(editor.input(), "ab");
    }

    #[test]
    fn test_backspace_mid_buffer() {
        let mut editor = typed('/', "a日c");
        editor.handle_key(key(KeyCode::Left));
        editor.handle_key(key(KeyCode::Backspace));
        assert_eq!(editor.input(), "ac");
        assert_eq!(editor.cursor(), 1);
    }

    #[test]
    fn test_add_validates_and_dedups() {
        let mut profile = profile(&["GOOG"]);
        let editor = typed('a', " ibm , goog,BRK-B ");
        assert_eq!(
            editor.execute(&mut profile, None),
            Ok(Outcome::Added("BRK-B".to_string()))
        );
        assert_eq!(profile.tickers(), ["GOOG", "IBM", "BRK-B"]);
    }

    #[test]
    fn test_add_rejects_bad_input() {
        let mut profile = profile(&["GOOG"]);
        for input in ["", "GOOG,,IBM", "BRK.B", "12"] {
            let editor = typed('a', input);
            assert!(matches!(
                editor.execute(&mut profile, None),
                Err(CommandError::InvalidTickers(_))
            ));
        }
        assert_eq!(profile.tickers(), ["GOOG"]);
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let mut profile = profile(&["GOOG", "AAPL"]);
        let editor = typed('d', "n");
        assert_eq!(
            editor.execute(&mut profile, Some((1, "AAPL"))),
            Ok(Outcome::Unchanged)
        );
        assert_eq!(profile.tickers().len(), 2);

        let editor = typed('d', " Y ");
        assert_eq!(
            editor.execute(&mut profile, Some((1, "AAPL"))),
            Ok(Outcome::Deleted(Some(0)))
        );
        assert_eq!(profile.tickers(), ["GOOG"]);
    }

    #[test]
    fn test_delete_first_row_and_empty_list() {
        let mut profile = profile(&["GOOG"]);
        let editor = typed('d', "y");
        assert_eq!(
            editor.execute(&mut profile, Some((0, "GOOG"))),
            Ok(Outcome::Deleted(None))
        );
        assert_eq!(editor.execute(&mut profile, None), Ok(Outcome::Unchanged));
    }

    #[test]
    fn test_search() {
        let mut profile = profile(&["GOOG", "AAPL"]);
        assert_eq!(
            typed('/', " aapl").execute(&mut profile, None),
            Ok(Outcome::Found {
                index: 1,
                ticker: "AAPL".to_string()
            })
        );
        assert_eq!(
            typed('/', "msft").execute(&mut profile, None),
            Err(CommandError::TickerNotFound("msft".to_string()))
        );
    }

    #[test]
    fn test_colon_round_trip() {
        let mut profile = profile(&["GOOG", "AAPL"]);
        assert_eq!(
            typed(':', "save p1").execute(&mut profile, None),
            Ok(Outcome::Saved("saved portfolio as 'p1'".to_string()))
        );
        typed(':', "new").execute(&mut profile, None).unwrap();
        assert!(profile.tickers().is_empty());
        assert_eq!(
            typed(':', "load p1").execute(&mut profile, None),
            Ok(Outcome::Portfolio("loaded portfolio 'p1'".to_string()))
        );
        assert_eq!(profile.tickers(), ["GOOG", "AAPL"]);
        assert_eq!(
            typed(':', "list").execute(&mut profile, None),
            Ok(Outcome::Portfolio("saved portfolios: p1".to_string()))
        );
    }

    #[test]
    fn test_colon_errors() {
        let mut profile = profile(&["GOOG"]);
        assert_eq!(
            typed(':', "load nope").execute(&mut profile, None),
            Err(CommandError::PortfolioNotFound("nope".to_string()))
        );
        assert_eq!(
            typed(':', "frobnicate now").execute(&mut profile, None),
            Err(CommandError::UnknownCommand("frobnicate".to_string()))
        );
        assert_eq!(
            typed(':', "save").execute(&mut profile, None),
            Err(CommandError::MissingPortfolioName("save".to_string()))
        );
    }

    #[test]
    fn test_done_clears_everything() {
        let mut editor = typed('/', "abc");
        editor.report("hello");
        editor.done();
        assert!(!editor.is_active());
        assert_eq!(editor.input(), "");
        assert_eq!(editor.cursor(), 0);
        assert!(editor.status().is_none());
    }

    #[test]
    fn test_draw_prompt_and_cursor() {
        let area = Rect::new(0, 0, 30, 2);
        let mut buf = Buffer::empty(area);
        let window = Window::new(0, 1, 30, 1);
        let editor = typed('a', "GOOG");

        let cursor = editor.draw(&window, &mut buf);
        let line: String = (0..30).map(|x| buf[(x, 1)].symbol().to_string()).collect();
        assert!(line.starts_with("add tickers: GOOG"));
        assert_eq!(cursor, Some(Position::new(17, 1)));
    }

    #[test]
    fn test_status_replaces_prompt() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 40, 1));
        let window = Window::new(0, 0, 40, 1);
        let mut editor = LineEditor::new();
        editor.report_error("portfolio not found: x");

        assert_eq!(editor.draw(&window, &mut buf), None);
        assert_eq!(buf[(0, 0)].symbol(), "p");
        assert_eq!(buf[(0, 0)].fg, Color::Red);
    }
}
