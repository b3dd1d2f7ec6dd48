use anyhow::Result;
use crossterm::{
    event::{
        self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
        Event, KeyCode, KeyModifiers,
    },
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};
use std::cell::Cell;
use std::rc::Rc;
use std::{env, io::stdout, path::PathBuf, process};
use textmark_config::Config;
use textmark_engine::{
    AnchorRect, Cmd, Document, Mark, MarkKind, MarkSet, PasteFixups, PopupController, ScrollLatch,
    Transform,
};

const SAMPLE: &str = "Select a run of text, then press Enter to transform it.\n\
\n\
Shift+arrows grow the selection. While the popup is open, press 1, 2 or 3\n\
to pick a transform, or Esc to close it. Transformed output is highlighted.\n\
\n\
This line has a bold statement inside it.\n\
Visit the project homepage for details, or paste over this paragraph to\n\
watch link formatting get stripped from the clipboard payload.\n";

/// Latch that parks the viewport while the popup is open.
struct ScrollFreeze(Rc<Cell<bool>>);

impl ScrollLatch for ScrollFreeze {
    fn hold(&mut self) {
        self.0.set(true);
    }
    fn release(&mut self) {
        self.0.set(false);
    }
}

struct App {
    doc: Document,
    doc_path: Option<PathBuf>,
    popup: PopupController<ScrollFreeze>,
    fixups: PasteFixups,
    /// Caret byte offset, always on a char boundary.
    cursor: usize,
    /// Selection anchor; `None` means a collapsed selection at the caret.
    select_anchor: Option<usize>,
    scroll: u16,
    scroll_frozen: Rc<Cell<bool>>,
    status: String,
}

impl App {
    fn new(doc: Document, doc_path: Option<PathBuf>) -> Self {
        let scroll_frozen = Rc::new(Cell::new(false));
        Self {
            doc,
            doc_path,
            popup: PopupController::with_latch(ScrollFreeze(scroll_frozen.clone())),
            fixups: PasteFixups::new(),
            cursor: 0,
            select_anchor: None,
            scroll: 0,
            scroll_frozen,
            status: String::from("Ready"),
        }
    }

    fn selection(&self) -> std::ops::Range<usize> {
        match self.select_anchor {
            Some(anchor) if anchor <= self.cursor => anchor..self.cursor,
            Some(anchor) => self.cursor..anchor,
            None => self.cursor..self.cursor,
        }
    }

    fn move_cursor(&mut self, code: KeyCode, extend: bool) {
        if extend {
            self.select_anchor.get_or_insert(self.cursor);
        } else {
            self.select_anchor = None;
        }
        let text = self.doc.text();
        self.cursor = match code {
            KeyCode::Left => prev_boundary(&text, self.cursor),
            KeyCode::Right => next_boundary(&text, self.cursor),
            KeyCode::Up => vertical_move(&text, self.cursor, -1),
            KeyCode::Down => vertical_move(&text, self.cursor, 1),
            KeyCode::Home => line_start(&text, self.cursor),
            KeyCode::End => line_end(&text, self.cursor),
            _ => self.cursor,
        };
    }

    /// Apply an edit typed by the user and resync caret and popup.
    fn edit(&mut self, cmd: Cmd) {
        self.doc.set_selection(self.selection());
        let patch = self.doc.apply(cmd);
        self.cursor = patch.new_selection.end;
        self.select_anchor = None;
        self.popup.document_changed();
    }

    fn insert_char(&mut self, c: char) {
        let selection = self.selection();
        if selection.is_empty() {
            self.edit(Cmd::InsertText {
                at: self.cursor,
                text: c.to_string(),
            });
        } else {
            self.edit(Cmd::ReplaceRange {
                range: selection,
                text: c.to_string(),
                marks: MarkSet::new(),
            });
        }
    }

    fn backspace(&mut self) {
        let selection = self.selection();
        if !selection.is_empty() {
            self.edit(Cmd::DeleteRange { range: selection });
        } else if self.cursor > 0 {
            let start = prev_boundary(&self.doc.text(), self.cursor);
            self.edit(Cmd::DeleteRange {
                range: start..self.cursor,
            });
        }
    }

    fn open_popup(&mut self, content_area: Rect) {
        let selection = self.selection();
        let rect = selection_rect(&self.doc.text(), &selection, content_area, self.scroll);
        if self.popup.open_requested(Some(&self.doc), selection, rect) {
            self.status = String::from("Pick a transform: 1, 2 or 3");
        } else {
            self.status = String::from("Select some non-blank text first");
        }
    }

    fn choose_transform(&mut self, transform: Transform) {
        match self.popup.transform_chosen(Some(&mut self.doc), transform) {
            Some(patch) => {
                self.cursor = patch.new_selection.end;
                self.select_anchor = None;
                self.status = format!("Applied {}", transform.label());
            }
            None => self.status = String::from("Selection went stale, try again"),
        }
    }

    /// Pasted clipboard content arrives carrying link formatting, which the
    /// deferred fixup strips on the next loop turn.
    fn paste(&mut self, text: String) {
        let mut marks = MarkSet::new();
        marks.add(Mark::with_attr(
            MarkKind::Link,
            "href",
            serde_json::json!("clipboard://payload"),
        ));
        self.edit(Cmd::ReplaceRange {
            range: self.selection(),
            text,
            marks,
        });
        self.fixups.schedule();
    }

    fn drain_fixups(&mut self) {
        if self.fixups.drain(&mut self.doc).is_some() {
            self.popup.document_changed();
            self.status = String::from("Pasted (link formatting stripped)");
        }
    }

    fn undo(&mut self) {
        if let Some(patch) = self.doc.undo() {
            self.cursor = patch.new_selection.end.min(self.doc.len());
            self.select_anchor = None;
            self.popup.document_changed();
            self.status = String::from("Undid last edit");
        } else {
            self.status = String::from("Nothing to undo");
        }
    }

    fn redo(&mut self) {
        if let Some(patch) = self.doc.redo() {
            self.cursor = patch.new_selection.end.min(self.doc.len());
            self.select_anchor = None;
            self.popup.document_changed();
            self.status = String::from("Redid edit");
        } else {
            self.status = String::from("Nothing to redo");
        }
    }

    fn save(&mut self) {
        match &self.doc_path {
            Some(path) => match std::fs::write(path, self.doc.to_bytes()) {
                Ok(()) => self.status = format!("Saved {}", path.display()),
                Err(e) => self.status = format!("Save failed: {e}"),
            },
            None => self.status = String::from("No file to save to (sample document)"),
        }
    }

    fn scroll_by(&mut self, delta: i32) {
        if self.scroll_frozen.get() {
            return;
        }
        self.scroll = self.scroll.saturating_add_signed(delta as i16);
    }
}

fn prev_boundary(text: &str, pos: usize) -> usize {
    text[..pos]
        .chars()
        .next_back()
        .map(|c| pos - c.len_utf8())
        .unwrap_or(0)
}

fn next_boundary(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map(|c| pos + c.len_utf8())
        .unwrap_or(text.len())
}

fn line_start(text: &str, pos: usize) -> usize {
    text[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0)
}

fn line_end(text: &str, pos: usize) -> usize {
    text[pos..].find('\n').map(|i| pos + i).unwrap_or(text.len())
}

/// Move the caret one line up or down, keeping the column where possible.
fn vertical_move(text: &str, pos: usize, delta: i32) -> usize {
    let start = line_start(text, pos);
    let col = text[start..pos].chars().count();

    let target_start = if delta < 0 {
        if start == 0 {
            return pos;
        }
        line_start(text, start - 1)
    } else {
        let end = line_end(text, pos);
        if end == text.len() {
            return pos;
        }
        end + 1
    };

    let target_end = line_end(text, target_start);
    let mut offset = target_start;
    for c in text[target_start..target_end].chars().take(col) {
        offset += c.len_utf8();
    }
    offset
}

/// Terminal-cell bounding rectangle of the selection inside `area`, or
/// `None` when the selection starts above the scrolled viewport.
fn selection_rect(
    text: &str,
    selection: &std::ops::Range<usize>,
    area: Rect,
    scroll: u16,
) -> Option<AnchorRect> {
    let (start_line, start_col) = line_col(text, selection.start);
    let (end_line, end_col) = line_col(text, selection.end);

    let top = (start_line as i64) - (scroll as i64);
    let bottom = (end_line as i64) - (scroll as i64) + 1;
    if top < 0 {
        return None;
    }

    Some(AnchorRect {
        top: area.y as f64 + top as f64,
        left: area.x as f64 + start_col as f64,
        bottom: area.y as f64 + bottom as f64,
        right: area.x as f64 + end_col as f64,
    })
}

fn line_col(text: &str, pos: usize) -> (usize, usize) {
    let line = text[..pos].matches('\n').count();
    let col = text[line_start(text, pos)..pos].chars().count();
    (line, col)
}

fn sample_document() -> Result<Document> {
    let mut doc = Document::from_bytes(SAMPLE.as_bytes())?;
    if let Some(at) = SAMPLE.find("bold statement") {
        doc.add_mark(Mark::new(MarkKind::Bold), at..at + "bold statement".len());
    }
    if let Some(at) = SAMPLE.find("project homepage") {
        doc.add_mark(
            Mark::with_attr(MarkKind::Link, "href", serde_json::json!("https://example.com")),
            at..at + "project homepage".len(),
        );
    }
    Ok(doc)
}

fn load_document() -> Result<(Document, Option<PathBuf>)> {
    let args: Vec<String> = env::args().collect();

    let path = if args.len() == 2 {
        Some(PathBuf::from(&args[1]))
    } else if args.len() == 1 {
        match Config::load() {
            Ok(config) => config.map(|c| c.document_path),
            Err(e) => {
                eprintln!("Error: Failed to load config file: {e}");
                eprintln!("Usage: {} [document-path]", args[0]);
                process::exit(1);
            }
        }
    } else {
        eprintln!("Usage: {} [document-path]", args[0]);
        process::exit(1);
    };

    match path {
        Some(path) => {
            let bytes = std::fs::read(&path)?;
            Ok((Document::from_bytes(&bytes)?, Some(path)))
        }
        None => Ok((sample_document()?, None)),
    }
}

fn main() -> Result<()> {
    let (doc, doc_path) = load_document()?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(doc, doc_path);
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app<B>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()>
where
    B: ratatui::backend::Backend,
    B::Error: Send + Sync + 'static,
{
    loop {
        // Scheduled paste fixups run once the paste itself has landed
        app.drain_fixups();

        let mut content_area = Rect::default();
        terminal.draw(|f| content_area = ui(f, app))?;

        match event::read()? {
            Event::Key(key) => {
                if app.popup.is_visible() {
                    match key.code {
                        KeyCode::Char('1') => app.choose_transform(Transform::ALL[0]),
                        KeyCode::Char('2') => app.choose_transform(Transform::ALL[1]),
                        KeyCode::Char('3') => app.choose_transform(Transform::ALL[2]),
                        KeyCode::Esc => {
                            app.popup.dismissed();
                            app.status = String::from("Popup closed");
                        }
                        _ => {}
                    }
                    continue;
                }
                let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
                match key.code {
                    KeyCode::Char('q') if ctrl => return Ok(()),
                    KeyCode::Char('z') if ctrl => app.undo(),
                    KeyCode::Char('y') if ctrl => app.redo(),
                    KeyCode::Char('s') if ctrl => app.save(),
                    KeyCode::Enter => app.open_popup(content_area),
                    KeyCode::Backspace => app.backspace(),
                    KeyCode::PageUp => app.scroll_by(-5),
                    KeyCode::PageDown => app.scroll_by(5),
                    KeyCode::Left | KeyCode::Right | KeyCode::Up | KeyCode::Down
                    | KeyCode::Home | KeyCode::End => {
                        app.move_cursor(key.code, key.modifiers.contains(KeyModifiers::SHIFT))
                    }
                    KeyCode::Char(c) if !ctrl => app.insert_char(c),
                    _ => {}
                }
            }
            Event::Paste(text) => app.paste(text),
            Event::Mouse(_) if app.popup.is_visible() => {
                // Click outside the menu closes it
                app.popup.dismissed();
                app.status = String::from("Popup closed");
            }
            _ => {}
        }
    }
}

/// Draw the frame; returns the inner content area so the event loop can
/// anchor the popup against it.
fn ui(f: &mut Frame, app: &App) -> Rect {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)].as_ref())
        .split(f.area());

    let content_block = Block::default().borders(Borders::ALL).title("textmark");
    let content_area = content_block.inner(chunks[0]);

    let lines = styled_lines(app);
    let content = Paragraph::new(lines)
        .block(content_block)
        .scroll((app.scroll, 0));
    f.render_widget(content, chunks[0]);

    // Status and key help
    let help = Paragraph::new(vec![
        Line::from(app.status.clone()),
        Line::from(
            "Shift+arrows: select | Enter: transform popup | Ctrl+Z/Y: undo/redo | Ctrl+S: save | Ctrl+Q: quit",
        ),
    ]);
    f.render_widget(help, chunks[1]);

    if let Some(snapshot) = app.popup.snapshot() {
        render_popup(f, content_area, snapshot.anchor.top, snapshot.anchor.left);
    }

    content_area
}

/// Render the document with per-char styling from marks, selection and
/// caret, merging contiguous same-style runs into spans.
fn styled_lines(app: &App) -> Vec<Line<'static>> {
    let text = app.doc.text();
    let selection = app.selection();

    let mut lines = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut run = String::new();
    let mut run_style = Style::default();
    let mut offset = 0;

    for c in text.chars() {
        if c == '\n' {
            if !run.is_empty() {
                spans.push(Span::styled(std::mem::take(&mut run), run_style));
            }
            lines.push(Line::from(std::mem::take(&mut spans)));
            offset += 1;
            continue;
        }

        let style = char_style(app, offset, &selection);
        if style != run_style && !run.is_empty() {
            spans.push(Span::styled(std::mem::take(&mut run), run_style));
        }
        run_style = style;
        run.push(c);
        offset += c.len_utf8();
    }
    if !run.is_empty() {
        spans.push(Span::styled(run, run_style));
    }
    lines.push(Line::from(spans));
    lines
}

fn char_style(app: &App, offset: usize, selection: &std::ops::Range<usize>) -> Style {
    let mut style = Style::default();
    for span in app.doc.spans() {
        if !span.range.contains(&offset) {
            continue;
        }
        style = match span.mark.kind {
            MarkKind::Bold => style.add_modifier(Modifier::BOLD),
            MarkKind::Italic => style.add_modifier(Modifier::ITALIC),
            MarkKind::Code => style.fg(Color::Magenta),
            MarkKind::Link => style.fg(Color::Blue).add_modifier(Modifier::UNDERLINED),
            MarkKind::InsertedText => style.bg(Color::Yellow).fg(Color::Black),
        };
    }
    if !selection.is_empty() && selection.contains(&offset) {
        style = style.add_modifier(Modifier::REVERSED);
    } else if offset == app.cursor {
        style = style.add_modifier(Modifier::SLOW_BLINK | Modifier::REVERSED);
    }
    style
}

fn render_popup(f: &mut Frame, content_area: Rect, top: f64, left: f64) {
    let labels: Vec<Line> = Transform::ALL
        .iter()
        .enumerate()
        .map(|(i, t)| Line::from(format!("{} {}", i + 1, t.label())))
        .collect();

    let width = 4 + Transform::ALL
        .iter()
        .map(|t| t.label().len())
        .max()
        .unwrap_or(0) as u16;
    let height = Transform::ALL.len() as u16 + 2;

    // Clamp the anchored position into the content area
    let x = (left as u16)
        .max(content_area.x)
        .min(content_area.right().saturating_sub(width));
    let y = (top as u16)
        .max(content_area.y)
        .min(content_area.bottom().saturating_sub(height));
    let area = Rect::new(x, y, width, height);

    let menu = Paragraph::new(labels)
        .block(Block::default().borders(Borders::ALL).title("Transform"));
    f.render_widget(Clear, area);
    f.render_widget(menu, area);
}
