//! Application loop: input modes, event producers and dispatch.
//!
//! Three producers (signals, terminal input and the refresh timer) feed one
//! channel. The loop consumes it one event at a time, so view state is only
//! ever touched from here.

use crate::api::QuoteSource;
use crate::browser;
use crate::ui::Ui;
use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

/// Input mode. Only the loop changes it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// A line editor prompt is open
    Command,
    /// Choosing and sorting by a column
    Sort,
}

#[derive(Debug)]
pub enum AppEvent {
    Input(Event),
    Tick,
    Terminate,
    BrowserCooldownElapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App<S> {
    ui: Ui<S>,
    mode: Mode,
    refresh_interval: Duration,
    browser_debounce: Duration,
    /// Set while repeat browser opens are suppressed
    browser_cooldown: bool,
    open_url: fn(&str) -> io::Result<()>,
    events: UnboundedSender<AppEvent>,
    receiver: UnboundedReceiver<AppEvent>,
}

impl<S: QuoteSource> App<S> {
    pub fn new(ui: Ui<S>, refresh_interval: Duration, browser_debounce: Duration) -> Self {
        let (events, receiver) = mpsc::unbounded_channel();
        Self {
            ui,
            mode: Mode::Normal,
            refresh_interval,
            browser_debounce,
            browser_cooldown: false,
            open_url: browser::open_url,
            events,
            receiver,
        }
    }

    #[cfg(test)]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Run until the user quits or a termination signal arrives, then save
    /// the profile.
    pub async fn run(mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        self.spawn_producers()?;
        info!(
            interval = %humantime::format_duration(self.refresh_interval),
            "dashboard started"
        );

        let result = self.event_loop(terminal).await;
        let saved = self.finish();
        result.and(saved)
    }

    /// Persist the profile on the way out, whichever path ended the loop.
    fn finish(&self) -> Result<()> {
        let profile = self.ui.profile();
        profile
            .save()
            .with_context(|| format!("Failed to save profile: {}", profile.path().display()))?;
        info!(tickers = profile.tickers().len(), "profile saved");
        Ok(())
    }

    async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        self.ui.refresh().await;
        self.draw(terminal)?;

        while let Some(event) = self.receiver.recv().await {
            if self.handle_event(event).await == Flow::Quit {
                break;
            }
            self.draw(terminal)?;
        }

        Ok(())
    }

    fn draw(&self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        terminal
            .draw(|frame| self.ui.draw(frame, self.mode))
            .context("Failed to draw frame")?;
        Ok(())
    }

    fn spawn_producers(&self) -> Result<()> {
        spawn_signal_listener(self.events.clone());
        spawn_input_reader(self.events.clone())?;
        spawn_refresh_timer(self.events.clone(), self.refresh_interval);
        Ok(())
    }

    pub async fn handle_event(&mut self, event: AppEvent) -> Flow {
        match event {
            AppEvent::Terminate => {
                info!("terminating");
                Flow::Quit
            }
            AppEvent::Tick => {
                debug!("refresh timer fired");
                self.ui.refresh().await;
                Flow::Continue
            }
            AppEvent::BrowserCooldownElapsed => {
                self.browser_cooldown = false;
                Flow::Continue
            }
            AppEvent::Input(Event::Resize(width, height)) => {
                debug!(width, height, "terminal resized");
                self.ui.resize(width, height);
                Flow::Continue
            }
            AppEvent::Input(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                self.handle_key(key).await
            }
            AppEvent::Input(_) => Flow::Continue,
        }
    }

    async fn handle_key(&mut self, key: KeyEvent) -> Flow {
        // Raw mode swallows SIGINT, so Ctrl+C is handled as a key.
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return Flow::Quit;
        }

        self.ui.dismiss_status();
        match self.mode {
            Mode::Normal => self.handle_normal_key(key).await,
            Mode::Command => {
                self.handle_command_key(key).await;
                Flow::Continue
            }
            Mode::Sort => self.handle_sort_key(key),
        }
    }

    async fn handle_normal_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => return Flow::Quit,
            KeyCode::Char(ch @ ('a' | 'd' | '/' | ':')) => {
                if self.ui.prompt(ch) {
                    self.mode = Mode::Command;
                }
            }
            KeyCode::Char('s') => self.mode = Mode::Sort,

            KeyCode::Down | KeyCode::Char('j') => self.ui.navigate_down(),
            KeyCode::Up | KeyCode::Char('k') => self.ui.navigate_up(),
            KeyCode::Home | KeyCode::Char('g') => self.ui.navigate_to_start(),
            KeyCode::End | KeyCode::Char('G') => self.ui.navigate_to_end(),
            KeyCode::PageDown => self.ui.page_down(),
            KeyCode::PageUp => self.ui.page_up(),

            KeyCode::Char('r') => self.ui.refresh().await,
            KeyCode::Enter | KeyCode::Char('o') => self.open_selected(),
            _ => {}
        }
        Flow::Continue
    }

    async fn handle_command_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                self.ui.execute_command().await;
                self.mode = Mode::Normal;
            }
            KeyCode::Esc => {
                self.ui.cancel_prompt();
                self.mode = Mode::Normal;
            }
            _ => self.ui.handle_editor_key(key),
        }
    }

    fn handle_sort_key(&mut self, key: KeyEvent) -> Flow {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => return Flow::Quit,
            KeyCode::Esc => self.mode = Mode::Normal,

            KeyCode::Left | KeyCode::Char('h') | KeyCode::Char('b') => {
                self.ui.navigate_column_left()
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Char('e') => {
                self.ui.navigate_column_right()
            }
            KeyCode::Char('0') => self.ui.jump_column_first(),
            KeyCode::Char('$') => self.ui.jump_column_last(),

            KeyCode::Down | KeyCode::Char('j') => self.ui.sort_descending(),
            KeyCode::Up | KeyCode::Char('k') => self.ui.sort_ascending(),
            _ => {}
        }
        Flow::Continue
    }

    /// Open the selected ticker's quote page, at most once per debounce window.
    fn open_selected(&mut self) {
        if self.browser_cooldown {
            debug!("browser open suppressed");
            return;
        }
        let Some(quote) = self.ui.selected_quote() else {
            return;
        };
        let url = browser::quote_url(&quote.symbol);

        self.browser_cooldown = true;
        let events = self.events.clone();
        let debounce = self.browser_debounce;
        tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            let _ = events.send(AppEvent::BrowserCooldownElapsed);
        });

        info!(%url, "opening quote page");
        if let Err(err) = (self.open_url)(&url) {
            warn!(error = %err, "could not open browser");
            self.ui.report_error(format!("could not open browser: {err}"));
        }
    }
}

#[cfg(unix)]
async fn wait_for_termination() -> io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;
    tokio::select! {
        _ = interrupt.recv() => {}
        _ = terminate.recv() => {}
        _ = hangup.recv() => {}
    }
    Ok(())
}

#[cfg(not(unix))]
async fn wait_for_termination() -> io::Result<()> {
    tokio::signal::ctrl_c().await
}

fn spawn_signal_listener(events: UnboundedSender<AppEvent>) {
    tokio::spawn(async move {
        match wait_for_termination().await {
            Ok(()) => {
                info!("termination signal received");
                let _ = events.send(AppEvent::Terminate);
            }
            Err(err) => warn!(error = %err, "could not listen for termination signals"),
        }
    });
}

/// Terminal reads block, so they get a plain thread rather than a runtime
/// worker. The thread is abandoned when the process exits.
fn spawn_input_reader(events: UnboundedSender<AppEvent>) -> Result<()> {
    std::thread::Builder::new()
        .name("input".to_string())
        .spawn(move || {
            loop {
                match event::read() {
                    Ok(event) => {
                        if events.send(AppEvent::Input(event)).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        error!(error = %err, "terminal input failed");
                        let _ = events.send(AppEvent::Terminate);
                        break;
                    }
                }
            }
        })
        .context("Failed to spawn input thread")?;
    Ok(())
}

fn spawn_refresh_timer(events: UnboundedSender<AppEvent>, period: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; startup already fetched.
        interval.tick().await;
        loop {
            interval.tick().await;
            if events.send(AppEvent::Tick).is_err() {
                break;
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SortDirection;
    use crate::profile::Profile;
    use crate::ui::tests::{MockSource, mock, ui_with};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static OPENED: AtomicUsize = AtomicUsize::new(0);

    fn counting_open(_url: &str) -> io::Result<()> {
        OPENED.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn failing_open(_url: &str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "no opener"))
    }

    async fn app_with(count: usize) -> App<MockSource> {
        let ui = ui_with(count, 160, 24).await;
        App::new(ui, Duration::from_secs(60), Duration::from_millis(20))
    }

    fn key(code: KeyCode) -> AppEvent {
        AppEvent::Input(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
    }

    async fn press(app: &mut App<MockSource>, code: KeyCode) -> Flow {
        app.handle_event(key(code)).await
    }

    async fn type_text(app: &mut App<MockSource>, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch)).await;
        }
    }

    #[tokio::test]
    async fn test_prompt_keys_enter_command_mode() {
        let mut app = app_with(3).await;
        for ch in ['a', 'd', '/', ':'] {
            press(&mut app, KeyCode::Char(ch)).await;
            assert_eq!(app.mode(), Mode::Command);
            press(&mut app, KeyCode::Esc).await;
            assert_eq!(app.mode(), Mode::Normal);
        }
        press(&mut app, KeyCode::Char('x')).await;
        assert_eq!(app.mode(), Mode::Normal);
    }

    #[tokio::test]
    async fn test_command_keys_go_to_editor() {
        let mut app = app_with(3).await;
        press(&mut app, KeyCode::Char(':')).await;
        // 'q' is text here, not quit.
        assert_eq!(press(&mut app, KeyCode::Char('q')).await, Flow::Continue);
        assert_eq!(app.ui.editor().input(), "q");
        press(&mut app, KeyCode::Backspace).await;
        type_text(&mut app, "new").await;
        press(&mut app, KeyCode::Enter).await;

        assert_eq!(app.mode(), Mode::Normal);
        assert!(app.ui.profile().tickers().is_empty());
        assert_eq!(
            app.ui.editor().status().unwrap().text,
            "creating new portfolio"
        );
    }

    #[tokio::test]
    async fn test_status_cleared_by_next_key() {
        let mut app = app_with(3).await;
        press(&mut app, KeyCode::Char('/')).await;
        type_text(&mut app, "nope").await;
        press(&mut app, KeyCode::Enter).await;
        assert!(app.ui.editor().status().unwrap().is_error);

        press(&mut app, KeyCode::Char('j')).await;
        assert!(app.ui.editor().status().is_none());
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let mut app = app_with(1).await;
        assert_eq!(press(&mut app, KeyCode::Char('q')).await, Flow::Quit);
        assert_eq!(press(&mut app, KeyCode::Char('Q')).await, Flow::Quit);

        press(&mut app, KeyCode::Char('s')).await;
        assert_eq!(press(&mut app, KeyCode::Char('q')).await, Flow::Quit);

        press(&mut app, KeyCode::Esc).await;
        press(&mut app, KeyCode::Char('a')).await;
        let ctrl_c = AppEvent::Input(Event::Key(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
        )));
        assert_eq!(app.handle_event(ctrl_c).await, Flow::Quit);
        assert_eq!(app.handle_event(AppEvent::Terminate).await, Flow::Quit);
    }

    #[tokio::test]
    async fn test_quit_key_then_finish_saves_profile() {
        let mut app = app_with(2).await;
        press(&mut app, KeyCode::Char('a')).await;
        type_text(&mut app, "IBM").await;
        press(&mut app, KeyCode::Enter).await;

        assert_eq!(press(&mut app, KeyCode::Char('q')).await, Flow::Quit);
        app.finish().unwrap();

        let saved = Profile::load_or_create(app.ui.profile().path()).unwrap();
        assert_eq!(saved.tickers(), ["T00", "T01", "IBM"]);
    }

    #[tokio::test]
    async fn test_terminate_then_finish_saves_profile() {
        let mut app = app_with(3).await;
        press(&mut app, KeyCode::Char(':')).await;
        type_text(&mut app, "new").await;
        press(&mut app, KeyCode::Enter).await;

        assert_eq!(app.handle_event(AppEvent::Terminate).await, Flow::Quit);
        app.finish().unwrap();

        let saved = Profile::load_or_create(app.ui.profile().path()).unwrap();
        assert!(saved.tickers().is_empty());
    }

    #[tokio::test]
    async fn test_finish_reports_unwritable_profile() {
        let source = MockSource::new();
        // A regular file where the profile's parent directory should be.
        let blocker = source.profile_path();
        std::fs::write(&blocker, "").unwrap();
        let profile = Profile::new(blocker.join("profile.json"), vec!["GOOG".to_string()]);
        let ui = Ui::new(source, profile, Vec::new(), 160, 24);
        let app = App::new(ui, Duration::from_secs(60), Duration::from_millis(20));

        let err = app.finish().unwrap_err();
        assert!(format!("{err:#}").contains("Failed to save profile"));
    }

    #[tokio::test]
    async fn test_normal_navigation() {
        let mut app = app_with(5).await;
        press(&mut app, KeyCode::Char('j')).await;
        press(&mut app, KeyCode::Down).await;
        assert_eq!(app.ui.selected_index(), 2);
        press(&mut app, KeyCode::Char('k')).await;
        assert_eq!(app.ui.selected_index(), 1);
        press(&mut app, KeyCode::Char('G')).await;
        assert_eq!(app.ui.selected_index(), 4);
        press(&mut app, KeyCode::Home).await;
        assert_eq!(app.ui.selected_index(), 0);
    }

    #[tokio::test]
    async fn test_release_events_are_ignored() {
        let mut app = app_with(5).await;
        let release = KeyEvent::new_with_kind(
            KeyCode::Char('j'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
        );
        app.handle_event(AppEvent::Input(Event::Key(release))).await;
        assert_eq!(app.ui.selected_index(), 0);
    }

    #[tokio::test]
    async fn test_sort_mode_keys() {
        let mut app = app_with(4).await;
        press(&mut app, KeyCode::Char('s')).await;
        assert_eq!(app.mode(), Mode::Sort);

        press(&mut app, KeyCode::Char('l')).await;
        assert_eq!(app.ui.selected_column(), 1);
        press(&mut app, KeyCode::Char('j')).await;
        assert_eq!(app.ui.sort_direction(), SortDirection::Descending);
        assert_eq!(app.ui.quotes()[0].symbol, "T03");

        press(&mut app, KeyCode::Up).await;
        assert_eq!(app.ui.sort_direction(), SortDirection::Ascending);
        assert_eq!(app.ui.quotes()[0].symbol, "T00");

        press(&mut app, KeyCode::Char('$')).await;
        let last = app.ui.selected_column();
        assert!(last > 1);
        press(&mut app, KeyCode::Char('b')).await;
        assert_eq!(app.ui.selected_column(), last - 1);
        press(&mut app, KeyCode::Char('0')).await;
        assert_eq!(app.ui.selected_column(), 0);

        press(&mut app, KeyCode::Esc).await;
        assert_eq!(app.mode(), Mode::Normal);
    }

    #[tokio::test]
    async fn test_tick_refreshes_snapshot() {
        let mut app = app_with(2).await;
        mock(&app.ui).insert("T00", 99.0, 1.0);
        assert_eq!(
            app.handle_event(AppEvent::Tick).await,
            Flow::Continue
        );
        assert_eq!(app.ui.quotes()[0].last, 99.0);
    }

    #[tokio::test]
    async fn test_resize_event() {
        let mut app = app_with(20).await;
        app.handle_event(AppEvent::Input(Event::Resize(160, 12))).await;
        assert_eq!(app.ui.visible_rows(), 5);
    }

    #[tokio::test]
    async fn test_browser_open_is_debounced() {
        let mut app = app_with(2).await;
        app.open_url = counting_open;

        press(&mut app, KeyCode::Char('o')).await;
        press(&mut app, KeyCode::Enter).await;
        assert_eq!(OPENED.load(Ordering::SeqCst), 1);

        let elapsed = tokio::time::timeout(Duration::from_secs(2), app.receiver.recv())
            .await
            .unwrap();
        assert!(matches!(elapsed, Some(AppEvent::BrowserCooldownElapsed)));
        app.handle_event(AppEvent::BrowserCooldownElapsed).await;

        press(&mut app, KeyCode::Char('o')).await;
        assert_eq!(OPENED.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_browser_failure_is_reported() {
        let mut app = app_with(2).await;
        app.open_url = failing_open;

        press(&mut app, KeyCode::Char('o')).await;
        let status = app.ui.editor().status().unwrap();
        assert!(status.is_error);
        assert!(status.text.contains("no opener"));
    }

    #[tokio::test]
    async fn test_browser_ignores_empty_snapshot() {
        let mut app = app_with(0).await;
        app.open_url = failing_open;
        press(&mut app, KeyCode::Char('o')).await;
        assert!(app.ui.editor().status().is_none());
        assert!(!app.browser_cooldown);
    }
}
