use super::client::ApiClient;
use super::ui;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use dayledger::core::{DayKey, EntryDraft, MergeMode, SpendItem};
use dayledger::navigator::{DayView, HistoryNavigator, LoadTicket, StepDirection};
use dayledger::notes;
use dayledger::store::DateRange;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::error::Error;
use std::io;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tui_textarea::TextArea;

/// Horizontal drag distance (terminal columns) that counts as a page swipe.
pub const MIN_DRAG_COLUMNS: u16 = 6;

/// What the single-line input at the bottom is collecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A date to jump to.
    Jump,
    /// A note line to append to the day.
    Note,
    /// A spend line, written as `description amount`.
    Spend,
}

pub struct LoadReply {
    pub ticket: LoadTicket,
    pub outcome: Result<EntryDraft, String>,
}

/// The overwrite draft that remains after removing one spend item.
fn draft_without_item(draft: &EntryDraft, index: usize) -> Option<EntryDraft> {
    if index >= draft.spent_items.len() {
        return None;
    }
    let mut remaining = draft.clone();
    remaining.spent_items.remove(index);
    Some(remaining)
}

pub struct BrowserApp<'a> {
    pub client: ApiClient,
    pub navigator: HistoryNavigator,
    pub input: Option<(InputKind, TextArea<'a>)>,
    pub status: Option<String>,
    pub selected_item: Option<usize>,
    pub exit: bool,

    replies_tx: mpsc::UnboundedSender<LoadReply>,
    replies_rx: mpsc::UnboundedReceiver<LoadReply>,
    drag_origin: Option<u16>,
}

impl<'a> BrowserApp<'a> {
    /// Authenticates against the server and opens the browser at today.
    pub async fn connect(
        server: &str,
        username: &str,
        password: &str,
        register: bool,
    ) -> anyhow::Result<Self> {
        let client = ApiClient::connect(server, username, password, register).await?;
        let range = client.range().await?;
        let bounds = DateRange::from_dates(&range.dates, range.max);
        let (navigator, ticket) = HistoryNavigator::new(bounds);
        let (replies_tx, replies_rx) = mpsc::unbounded_channel();

        let mut app = Self {
            client,
            navigator,
            input: None,
            status: None,
            selected_item: None,
            exit: false,
            replies_tx,
            replies_rx,
            drag_origin: None,
        };
        app.spawn_load(ticket);
        Ok(app)
    }

    fn spawn_load(&mut self, ticket: LoadTicket) {
        self.selected_item = None;
        let client = self.client.clone();
        let tx = self.replies_tx.clone();
        tokio::spawn(async move {
            let outcome = client.day(ticket.date()).await.map_err(|e| e.to_string());
            let _ = tx.send(LoadReply { ticket, outcome });
        });
    }

    pub async fn run(&mut self) -> Result<(), Box<dyn Error>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let res = self.run_loop(&mut terminal).await;

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        if let Err(err) = res {
            println!("{:?}", err);
        }

        Ok(())
    }

    async fn run_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| ui::draw(f, self))?;

            // Short poll so load replies and flip expiry repaint promptly.
            if event::poll(Duration::from_millis(100))? {
                match event::read()? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        self.handle_key(key.code);
                    }
                    Event::Mouse(mouse) => self.handle_mouse(mouse),
                    _ => {}
                }
            }

            while let Ok(reply) = self.replies_rx.try_recv() {
                self.navigator.apply(reply.ticket, reply.outcome);
            }

            if self.exit {
                return Ok(());
            }
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        if self.input.is_some() {
            match code {
                KeyCode::Esc => {
                    self.input = None;
                }
                KeyCode::Enter => self.commit_input(),
                _ => {
                    if let Some((_, textarea)) = &mut self.input {
                        textarea.input(tui_textarea::Input::from(crossterm::event::KeyEvent::new(
                            code,
                            crossterm::event::KeyModifiers::NONE,
                        )));
                    }
                }
            }
            return;
        }

        match code {
            KeyCode::Esc | KeyCode::Char('q') => {
                self.exit = true;
            }
            KeyCode::Left => self.step(StepDirection::Back),
            KeyCode::Right => self.step(StepDirection::Forward),
            KeyCode::Char('g') => self.open_input(InputKind::Jump, String::new()),
            KeyCode::Char('a') => {
                let prefill = self.next_bullet_prefix();
                self.open_input(InputKind::Note, prefill);
            }
            KeyCode::Char('s') => self.open_input(InputKind::Spend, String::new()),
            KeyCode::Up => self.select_item(-1),
            KeyCode::Down => self.select_item(1),
            KeyCode::Char('x') => self.remove_selected_item(),
            KeyCode::Char('d') => self.delete_current(),
            KeyCode::Char('r') => self.reload_current(),
            _ => {}
        }
    }

    /// Moves the spend-list selection, wrapping at either end.
    fn select_item(&mut self, delta: i64) {
        let DayView::Loaded(draft) = self.navigator.view() else {
            return;
        };
        let len = draft.spent_items.len();
        if len == 0 {
            self.selected_item = None;
            return;
        }
        self.selected_item = Some(match self.selected_item {
            None if delta >= 0 => 0,
            None => len - 1,
            Some(i) => (i as i64 + delta).rem_euclid(len as i64) as usize,
        });
    }

    /// Removes the selected spend item by overwriting the day with the
    /// remaining state, then reloads it.
    fn remove_selected_item(&mut self) {
        let Some(index) = self.selected_item else {
            return;
        };
        let DayView::Loaded(draft) = self.navigator.view() else {
            return;
        };
        let Some(remaining) = draft_without_item(draft, index) else {
            return;
        };
        self.save_and_reload(remaining, MergeMode::Overwrite);
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.drag_origin = Some(mouse.column);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                if let Some(origin) = self.drag_origin.take() {
                    if mouse.column >= origin + MIN_DRAG_COLUMNS {
                        // Dragging right pulls the previous page in.
                        self.step(StepDirection::Back);
                    } else if origin >= mouse.column + MIN_DRAG_COLUMNS {
                        self.step(StepDirection::Forward);
                    }
                }
            }
            _ => {}
        }
    }

    fn step(&mut self, direction: StepDirection) {
        if let Some(ticket) = self.navigator.step(direction, Instant::now()) {
            self.spawn_load(ticket);
        }
    }

    fn reload_current(&mut self) {
        let current = self.navigator.current_date();
        if let Some(ticket) = self.navigator.jump(current, Instant::now()) {
            self.spawn_load(ticket);
        }
    }

    /// The numbering prefix for a new note line, continuing the loaded notes.
    fn next_bullet_prefix(&self) -> String {
        let existing = match self.navigator.view() {
            DayView::Loaded(draft) => draft.notes.as_str(),
            _ => "",
        };
        // The extension always ends with the fresh bullet on its own line.
        let extended = notes::extend(existing);
        extended.rsplit('\n').next().unwrap_or("").to_string()
    }

    fn open_input(&mut self, kind: InputKind, prefill: String) {
        let mut textarea = if prefill.is_empty() {
            TextArea::default()
        } else {
            TextArea::new(vec![prefill])
        };
        textarea.move_cursor(tui_textarea::CursorMove::End);
        let title = match kind {
            InputKind::Jump => " Jump to date (YYYY-MM-DD) ",
            InputKind::Note => " Append note ",
            InputKind::Spend => " Add spend (description amount) ",
        };
        textarea.set_block(
            ratatui::widgets::Block::default()
                .borders(ratatui::widgets::Borders::ALL)
                .title(title),
        );
        self.input = Some((kind, textarea));
        self.status = None;
    }

    fn commit_input(&mut self) {
        let Some((kind, textarea)) = self.input.take() else {
            return;
        };
        let text = textarea.lines().join("\n");
        match kind {
            InputKind::Jump => self.jump_to(&text),
            InputKind::Note => self.append_note(text),
            InputKind::Spend => self.add_spend(&text),
        }
    }

    fn jump_to(&mut self, raw: &str) {
        let date = match DayKey::parse(raw.trim()) {
            Ok(date) => date,
            Err(e) => {
                self.status = Some(e.to_string());
                return;
            }
        };
        match self.navigator.jump(date, Instant::now()) {
            Some(ticket) => self.spawn_load(ticket),
            None => {
                let bounds = self.navigator.bounds();
                self.status = Some(format!(
                    "{date} is outside {}..{}",
                    bounds.min(),
                    bounds.max()
                ));
            }
        }
    }

    fn append_note(&mut self, line: String) {
        if line.trim().is_empty() {
            return;
        }
        let draft = EntryDraft {
            notes: line,
            spent_items: vec![],
        };
        self.save_and_reload(draft, MergeMode::Append);
    }

    fn add_spend(&mut self, raw: &str) {
        let Some((description, amount_raw)) = raw.trim().rsplit_once(char::is_whitespace) else {
            self.status = Some("Expected: description amount".to_string());
            return;
        };
        let amount: f64 = match amount_raw.parse() {
            Ok(amount) => amount,
            Err(_) => {
                self.status = Some(format!("'{amount_raw}' is not an amount"));
                return;
            }
        };
        let item = match SpendItem::new(description.trim(), amount) {
            Ok(item) => item,
            Err(e) => {
                self.status = Some(e.to_string());
                return;
            }
        };
        let draft = EntryDraft {
            notes: String::new(),
            spent_items: vec![item],
        };
        self.save_and_reload(draft, MergeMode::Append);
    }

    /// Saves the draft to the current day on the server, then reloads it.
    /// Additions go through `Append`; destructive edits like removing one
    /// spend item re-submit the full remaining state with `Overwrite`.
    fn save_and_reload(&mut self, draft: EntryDraft, mode: MergeMode) {
        let date = self.navigator.current_date();
        let client = self.client.clone();
        let tx = self.replies_tx.clone();
        let Some(ticket) = self.navigator.jump(date, Instant::now()) else {
            return;
        };
        self.selected_item = None;
        tokio::spawn(async move {
            let outcome = match client.save_day(date, &draft, mode).await {
                Ok(()) => client.day(date).await.map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            let _ = tx.send(LoadReply { ticket, outcome });
        });
    }

    fn delete_current(&mut self) {
        let date = self.navigator.current_date();
        let client = self.client.clone();
        let tx = self.replies_tx.clone();
        let Some(ticket) = self.navigator.jump(date, Instant::now()) else {
            return;
        };
        tokio::spawn(async move {
            let outcome = match client.delete_day(date).await {
                Ok(()) => client.day(date).await.map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };
            let _ = tx.send(LoadReply { ticket, outcome });
        });
    }
}
