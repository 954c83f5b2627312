use crate::client::ChatClient;
use crate::transcript::{ChatEvent, ChatMessage, Role, SubmitError, Transcript};
use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, size};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Widget, Wrap};
use ratatui::{Frame, Terminal, TerminalOptions, Viewport};
use std::error::Error;
use std::io;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

type TuiTerminal = Terminal<CrosstermBackend<io::Stdout>>;
type UiResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

const LIVE_HEIGHT: u16 = 8;
const INPUT_HEIGHT: u16 = 6;

// Restores terminal settings even if the loop exits early.
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = io::stdout().flush();
    }
}

struct LineSpec {
    text: String,
    style: Style,
}

fn message_lines(message: &ChatMessage) -> Vec<LineSpec> {
    let (label, color) = match message.role {
        Role::User => ("You", Color::Blue),
        Role::Assistant => ("Assistant", Color::Yellow),
    };
    let mut lines = vec![LineSpec {
        text: format!("{} ({}):", label, message.timestamp.format("%H:%M")),
        style: Style::default().fg(color).add_modifier(Modifier::BOLD),
    }];
    for line in message.content.lines() {
        lines.push(LineSpec {
            text: format!("  {}", line),
            style: Style::default().fg(color),
        });
    }
    lines
}

fn notice_lines(notice: &str) -> Vec<LineSpec> {
    vec![LineSpec {
        text: format!("ℹ {}", notice),
        style: Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::ITALIC),
    }]
}

fn to_text(lines: &[LineSpec]) -> Text<'static> {
    Text::from(
        lines
            .iter()
            .map(|spec| Line::from(Span::styled(spec.text.clone(), spec.style)))
            .collect::<Vec<_>>(),
    )
}

fn rendered_height(lines: &[LineSpec], width: u16) -> u16 {
    let width = width.max(1) as usize;
    let total: usize = lines
        .iter()
        .map(|spec| spec.text.chars().count().max(1).div_ceil(width))
        .sum();
    total.min(u16::MAX as usize) as u16
}

#[derive(Debug)]
pub enum UiEvent {
    Chat(ChatEvent),
    Quit,
}

/// Multi-line input whose cursor column counts characters, not bytes.
struct InputBuffer {
    lines: Vec<String>,
    cursor_x: usize,
    cursor_y: usize,
}

impl InputBuffer {
    fn new() -> Self {
        Self {
            lines: vec![String::new()],
            cursor_x: 0,
            cursor_y: 0,
        }
    }

    fn clear(&mut self) {
        *self = Self::new();
    }

    fn line_len(&self, y: usize) -> usize {
        self.lines[y].chars().count()
    }

    fn byte_offset(line: &str, chars: usize) -> usize {
        line.char_indices()
            .nth(chars)
            .map_or(line.len(), |(offset, _)| offset)
    }

    fn insert_char(&mut self, c: char) {
        let line = &mut self.lines[self.cursor_y];
        let at = Self::byte_offset(line, self.cursor_x);
        line.insert(at, c);
        self.cursor_x += 1;
    }

    fn delete_char(&mut self) {
        if self.cursor_x > 0 {
            let line = &mut self.lines[self.cursor_y];
            let at = Self::byte_offset(line, self.cursor_x - 1);
            line.remove(at);
            self.cursor_x -= 1;
        } else if self.cursor_y > 0 {
            let tail = self.lines.remove(self.cursor_y);
            self.cursor_y -= 1;
            self.cursor_x = self.line_len(self.cursor_y);
            self.lines[self.cursor_y].push_str(&tail);
        }
    }

    fn new_line(&mut self) {
        let line = &mut self.lines[self.cursor_y];
        let at = Self::byte_offset(line, self.cursor_x);
        let remaining = line.split_off(at);
        self.lines.insert(self.cursor_y + 1, remaining);
        self.cursor_y += 1;
        self.cursor_x = 0;
    }

    fn move_left(&mut self) {
        if self.cursor_x > 0 {
            self.cursor_x -= 1;
        } else if self.cursor_y > 0 {
            self.cursor_y -= 1;
            self.cursor_x = self.line_len(self.cursor_y);
        }
    }

    fn move_right(&mut self) {
        if self.cursor_x < self.line_len(self.cursor_y) {
            self.cursor_x += 1;
        } else if self.cursor_y < self.lines.len() - 1 {
            self.cursor_y += 1;
            self.cursor_x = 0;
        }
    }

    fn move_up(&mut self) {
        if self.cursor_y > 0 {
            self.cursor_y -= 1;
            self.cursor_x = self.cursor_x.min(self.line_len(self.cursor_y));
        }
    }

    fn move_down(&mut self) {
        if self.cursor_y < self.lines.len() - 1 {
            self.cursor_y += 1;
            self.cursor_x = self.cursor_x.min(self.line_len(self.cursor_y));
        }
    }

    fn home(&mut self) {
        self.cursor_x = 0;
    }

    fn end(&mut self) {
        self.cursor_x = self.line_len(self.cursor_y);
    }

    fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.is_empty())
    }

    fn render(&self) -> Text<'static> {
        if self.is_empty() {
            return Text::from(Span::styled(
                "Ask about projects, research, or skills...",
                Style::default().fg(Color::DarkGray),
            ));
        }
        Text::from(
            self.lines
                .iter()
                .map(|l| Line::from(l.clone()))
                .collect::<Vec<_>>(),
        )
    }
}

pub struct App {
    transcript: Transcript,
    /// Number of transcript messages already written to scrollback.
    flushed: usize,
    input: InputBuffer,
    should_quit: bool,
    sender: mpsc::Sender<UiEvent>,
    receiver: mpsc::Receiver<UiEvent>,
    client: Arc<ChatClient>,
}

impl App {
    pub fn new(client: ChatClient, greeting: &str) -> Self {
        let (sender, receiver) = mpsc::channel(100);

        Self {
            transcript: Transcript::with_greeting(greeting),
            flushed: 0,
            input: InputBuffer::new(),
            should_quit: false,
            sender,
            receiver,
            client: Arc::new(client),
        }
    }

    fn open_message(&self) -> Option<&ChatMessage> {
        let open = self.transcript.open_message_id()?;
        self.transcript.messages().iter().rev().find(|m| m.id == open)
    }

    fn draw(&mut self, f: &mut Frame) {
        let [live_area, input_area] =
            Layout::vertical([Constraint::Min(1), Constraint::Length(INPUT_HEIGHT)])
                .areas(f.area());

        if let Some(message) = self.open_message() {
            let lines = message_lines(message);
            let height = rendered_height(&lines, live_area.width);
            let scroll = height.saturating_sub(live_area.height);
            let live = Paragraph::new(to_text(&lines))
                .wrap(Wrap { trim: false })
                .scroll((scroll, 0));
            f.render_widget(live, live_area);
        }

        let title = if self.transcript.is_loading() {
            " Message (Enter to send, Esc to quit) [Thinking...] "
        } else {
            " Message (Enter to send, Esc to quit) "
        };
        let input_paragraph = Paragraph::new(self.input.render())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(Style::default().fg(Color::DarkGray)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(input_paragraph, input_area);

        let cursor_x = (self.input.cursor_x + 1) as u16;
        let cursor_y = self.input.cursor_y as u16;
        let x = (input_area.x + cursor_x).min(input_area.right().saturating_sub(2));
        let y = (input_area.y + 1 + cursor_y).min(input_area.bottom().saturating_sub(2));
        f.set_cursor_position((x, y));
    }

    fn print_above(&self, terminal: &mut TuiTerminal, lines: &[LineSpec]) -> UiResult<()> {
        let width = terminal.size()?.width;
        let height = rendered_height(lines, width).saturating_add(1);
        let mut text = to_text(lines);
        text.extend(Text::raw("\n"));
        // Insert above the inline viewport so the log stays in scrollback.
        terminal.insert_before(height, |buf| {
            Paragraph::new(text)
                .wrap(Wrap { trim: false })
                .render(buf.area, buf);
        })?;
        Ok(())
    }

    /// Moves every completed message not yet shown into scrollback.
    fn flush_completed(&mut self, terminal: &mut TuiTerminal) -> UiResult<()> {
        let open = self.transcript.open_message_id().map(str::to_string);
        while let Some(message) = self.transcript.messages().get(self.flushed) {
            if open.as_deref() == Some(message.id.as_str()) {
                break;
            }
            let lines = message_lines(message);
            self.print_above(terminal, &lines)?;
            self.flushed += 1;
        }
        Ok(())
    }

    fn send(&mut self, terminal: &mut TuiTerminal) -> UiResult<()> {
        let message = match self.transcript.submit(&self.input.text()) {
            Ok(message) => message,
            Err(SubmitError::Empty) => return Ok(()),
            Err(err @ SubmitError::Busy) => {
                return self.print_above(terminal, &notice_lines(&err.to_string()));
            }
        };
        self.input.clear();
        self.flush_completed(terminal)?;

        let client = Arc::clone(&self.client);
        let sender = self.sender.clone();
        tokio::spawn(async move {
            client
                .exchange(message, move |event| {
                    let sender = sender.clone();
                    async move {
                        let _ = sender.send(UiEvent::Chat(event)).await;
                    }
                })
                .await;
        });
        Ok(())
    }

    fn handle_events(&mut self, terminal: &mut TuiTerminal) -> UiResult<bool> {
        while let Ok(event) = self.receiver.try_recv() {
            match event {
                UiEvent::Chat(event) => {
                    if let ChatEvent::Failed(err) = &event {
                        self.print_above(terminal, &notice_lines(&format!("Error: {}", err)))?;
                    }
                    self.transcript.apply(event);
                    self.flush_completed(terminal)?;
                }
                UiEvent::Quit => {
                    self.should_quit = true;
                    return Ok(false);
                }
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
                {
                    self.should_quit = true;
                    let _ = self.sender.try_send(UiEvent::Quit);
                    return Ok(false);
                }

                match key.code {
                    KeyCode::Esc => {
                        self.should_quit = true;
                        let _ = self.sender.try_send(UiEvent::Quit);
                        return Ok(false);
                    }
                    KeyCode::Enter => {
                        if key.modifiers.contains(KeyModifiers::SHIFT) {
                            self.input.new_line();
                        } else {
                            self.send(terminal)?;
                        }
                    }
                    KeyCode::Char(c) => self.input.insert_char(c),
                    KeyCode::Backspace => self.input.delete_char(),
                    KeyCode::Left => self.input.move_left(),
                    KeyCode::Right => self.input.move_right(),
                    KeyCode::Up => self.input.move_up(),
                    KeyCode::Down => self.input.move_down(),
                    KeyCode::Home => self.input.home(),
                    KeyCode::End => self.input.end(),
                    _ => {}
                }
            }
        }

        Ok(true)
    }
}

pub fn run_tui(client: ChatClient, greeting: &str) -> UiResult<()> {
    enable_raw_mode()?;
    let _guard = TerminalGuard;

    let mut stdout = io::stdout();
    let (_, rows) = size()?;
    if rows > 0 {
        // Push existing screen content into scrollback without clearing it.
        for _ in 0..rows {
            writeln!(stdout)?;
        }
        stdout.flush()?;
    }
    execute!(stdout, MoveTo(0, 0))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::with_options(
        backend,
        TerminalOptions {
            viewport: Viewport::Inline(LIVE_HEIGHT + INPUT_HEIGHT),
        },
    )?;

    let mut app = App::new(client, greeting);
    app.flush_completed(&mut terminal)?;
    terminal.draw(|f| app.draw(f))?;

    while !app.should_quit {
        if !app.handle_events(&mut terminal)? {
            break;
        }

        terminal.draw(|f| app.draw(f))?;

        std::thread::sleep(Duration::from_millis(10));
    }

    Ok(())
}

/// One-shot exchange: prints the reply to stdout as it streams.
pub async fn ask(client: &ChatClient, message: &str) -> UiResult<()> {
    if message.trim().is_empty() {
        return Err(SubmitError::Empty.into());
    }

    let mut stdout = io::stdout();
    client
        .stream_chat(message, &mut |event| {
            if let ChatEvent::Fragment(text) = event {
                let _ = write!(stdout, "{}", text);
                let _ = stdout.flush();
            }
            std::future::ready(())
        })
        .await?;
    writeln!(io::stdout())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};
    use ratatui::backend::TestBackend;

    fn typed(text: &str) -> InputBuffer {
        let mut buffer = InputBuffer::new();
        for ch in text.chars() {
            buffer.insert_char(ch);
        }
        buffer
    }

    #[test]
    fn input_buffer_shift_enter_inserts_new_line() {
        let mut buffer = typed("hello");
        buffer.new_line();
        for ch in "world".chars() {
            buffer.insert_char(ch);
        }

        assert_eq!(buffer.text(), "hello\nworld");
        assert_eq!(buffer.lines.len(), 2);
        assert_eq!(buffer.cursor_y, 1);
    }

    #[test]
    fn input_buffer_edits_multibyte_text_by_character() {
        let mut buffer = typed("héllo");
        buffer.move_left();
        buffer.move_left();
        buffer.move_left();
        buffer.delete_char();
        assert_eq!(buffer.text(), "hllo");

        buffer.insert_char('ë');
        buffer.new_line();
        assert_eq!(buffer.text(), "hë\nllo");

        buffer.delete_char();
        assert_eq!(buffer.text(), "hëllo");
        assert_eq!(buffer.cursor_x, 2);
    }

    fn message_at(role: Role, content: &str, hour: u32, minute: u32) -> ChatMessage {
        ChatMessage {
            id: "m1".to_string(),
            role,
            content: content.to_string(),
            timestamp: Local
                .with_ymd_and_hms(2025, 3, 1, hour, minute, 0)
                .unwrap(),
        }
    }

    #[test]
    fn message_header_shows_local_time() {
        let lines = message_lines(&message_at(Role::User, "hi\nthere", 14, 2));
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["You (14:02):", "  hi", "  there"]);

        let lines = message_lines(&message_at(Role::Assistant, "ok", 9, 5));
        assert_eq!(lines[0].text, "Assistant (09:05):");
    }

    #[test]
    fn rendered_height_wraps_on_characters() {
        let lines = message_lines(&message_at(Role::Assistant, "ééééé", 14, 2));
        // "Assistant (14:02):" is 18 wide, "  ééééé" is 7 wide.
        assert_eq!(rendered_height(&lines, 5), 4 + 2);
        assert_eq!(rendered_height(&lines, 80), 2);
    }

    #[test]
    fn draws_on_a_one_column_terminal() {
        let mut terminal = Terminal::new(TestBackend::new(1, 14)).unwrap();
        let mut app = App::new(ChatClient::new("http://127.0.0.1:1"), "hello");
        terminal.draw(|f| app.draw(f)).unwrap();
    }
}
