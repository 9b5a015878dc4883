//! Interactive curation surface: a four-pane editor over one focal web
//! entity (identity fields, prefixes, tags, content tree).
//!
//! The TUI runs blocking on its own thread. Model changes arrive as
//! `SyncEvent`s on an unbounded channel; user intents leave as
//! `EditorMessage`s for the async side to execute. The arena itself is
//! only locked briefly each frame to take a display snapshot.

pub mod tree_view;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use curator_client::{Mutation, SharedArena, SyncEvent};
use curator_core::edit::{EditController, EditState};
use curator_core::entity::{EntityField, WebEntity};
use curator_core::lru::coerce_to_lru;
use curator_core::tags::{self, TagOp};
use curator_core::tree::{ContentTree, TreeRow};
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};
use std::io;
use tokio::sync::mpsc;

const FIELDS: [EntityField; 3] = [EntityField::Name, EntityField::Homepage, EntityField::Status];

/// User intents the async driver executes on the editor's behalf.
#[derive(Debug, Clone)]
pub enum EditorMessage {
    Submit(Mutation),
    LoadChildren(Vec<String>),
    Detach(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Identity,
    Prefixes,
    Tags,
    Tree,
}

impl Pane {
    fn next(self) -> Self {
        match self {
            Pane::Identity => Pane::Prefixes,
            Pane::Prefixes => Pane::Tags,
            Pane::Tags => Pane::Tree,
            Pane::Tree => Pane::Identity,
        }
    }
}

/// One selectable line in the tags pane. Header rows carry no value.
#[derive(Debug, Clone)]
struct TagLine {
    category: String,
    value: Option<String>,
    editable: bool,
}

pub struct App {
    arena: SharedArena,
    focus_id: String,
    tree: ContentTree,
    editor: EditController,
    pane: Pane,
    field_cursor: usize,
    prefix_cursor: usize,
    tag_cursor: usize,
    tree_cursor: usize,
    /// Text buffer for a tag being added to the selected category.
    tag_entry: Option<(String, String)>,
    /// Text buffer for a prefix being added (URL or LRU form).
    prefix_entry: Option<String>,
    notice: Option<String>,
    should_quit: bool,
    // Per-frame display snapshot, refreshed before each draw.
    snapshot: Option<WebEntity>,
    tag_lines: Vec<TagLine>,
    tree_rows: Vec<TreeRow>,
    events: mpsc::UnboundedReceiver<SyncEvent>,
    outbound: mpsc::UnboundedSender<EditorMessage>,
}

impl App {
    pub fn new(
        arena: SharedArena,
        focus_id: impl Into<String>,
        vocabulary: Vec<String>,
        events: mpsc::UnboundedReceiver<SyncEvent>,
        outbound: mpsc::UnboundedSender<EditorMessage>,
    ) -> Self {
        let focus_id = focus_id.into();
        Self {
            arena,
            tree: ContentTree::new(&focus_id),
            focus_id,
            editor: EditController::new().with_vocabulary(vocabulary),
            pane: Pane::Identity,
            field_cursor: 0,
            prefix_cursor: 0,
            tag_cursor: 0,
            tree_cursor: 0,
            tag_entry: None,
            prefix_entry: None,
            notice: None,
            should_quit: false,
            snapshot: None,
            tag_lines: Vec::new(),
            tree_rows: Vec::new(),
            events,
            outbound,
        }
    }

    /// Drain pending sync events without blocking.
    fn process_events(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                SyncEvent::Loaded { entity_id } => {
                    self.tree.mark_dirty(&entity_id);
                }
                SyncEvent::Applied { entity_id, op } => {
                    if entity_id == self.focus_id {
                        if let curator_client::MutationOp::SetField { field, .. } = op {
                            // The arena already holds the normalized value.
                            self.editor.commit_succeeded(field, None);
                        }
                        self.notice = Some("saved".to_string());
                    }
                    self.tree.mark_dirty(&entity_id);
                }
                SyncEvent::Rejected {
                    entity_id,
                    op,
                    reason,
                    ..
                } => {
                    if entity_id == self.focus_id {
                        if let curator_client::MutationOp::SetField { field, .. } = op {
                            // Nothing was written locally, so the revert
                            // is just releasing the session.
                            if self.editor.commit_failed(field, &reason).is_some() {
                                self.editor.revert_complete(field);
                            }
                        }
                    }
                    self.notice = Some(reason);
                }
            }
        }
    }

    /// Take a fresh display snapshot from the arena. Rows and tag
    /// lines are re-derived only when a subtree was marked dirty;
    /// cursor-only frames reuse the cached ones.
    fn refresh(&mut self) {
        let dirty = self.tree.take_dirty();
        if dirty.is_empty() && self.snapshot.is_some() {
            return;
        }
        let arena = self.arena.lock().unwrap();
        self.snapshot = arena.get(&self.focus_id).cloned();
        self.tree_rows = self.tree.rows(&arena);

        self.tag_lines.clear();
        if let Some(entity) = &self.snapshot {
            for category in entity.user_categories() {
                for value in &category.values {
                    self.tag_lines.push(TagLine {
                        category: category.name.clone(),
                        value: Some(value.clone()),
                        editable: true,
                    });
                }
                if category.values.is_empty() {
                    self.tag_lines.push(TagLine {
                        category: category.name.clone(),
                        value: None,
                        editable: true,
                    });
                }
            }
        }
    }

    fn editing_field(&self) -> Option<EntityField> {
        FIELDS
            .iter()
            .copied()
            .find(|f| self.editor.state(*f) == EditState::Editing)
    }

    fn current_field_value(&self, field: EntityField) -> String {
        match (&self.snapshot, field) {
            (Some(e), EntityField::Name) => e.name.clone(),
            (Some(e), EntityField::Homepage) => e.homepage.clone().unwrap_or_default(),
            (Some(e), EntityField::Status) => e.status.clone(),
            (None, _) => String::new(),
        }
    }

    fn submit(&mut self, mutation: Mutation) {
        let _ = self.outbound.send(EditorMessage::Submit(mutation));
    }

    fn handle_key(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        // Ctrl+C always bails; in-flight commits are left to resolve or
        // be detached by the driver.
        if code == KeyCode::Char('c') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        // An active text entry swallows keys first.
        if let Some(field) = self.editing_field() {
            self.handle_edit_key(field, code);
            return;
        }
        if self.tag_entry.is_some() {
            self.handle_tag_entry_key(code);
            return;
        }
        if self.prefix_entry.is_some() {
            self.handle_prefix_entry_key(code);
            return;
        }

        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab => {
                self.pane = self.pane.next();
                self.notice = None;
            }
            _ => match self.pane {
                Pane::Identity => self.handle_identity_key(code),
                Pane::Prefixes => self.handle_prefixes_key(code),
                Pane::Tags => self.handle_tags_key(code),
                Pane::Tree => self.handle_tree_key(code),
            },
        }
    }

    fn handle_edit_key(&mut self, field: EntityField, code: KeyCode) {
        match code {
            KeyCode::Esc => self.editor.cancel(field),
            KeyCode::Enter => {
                // Validation failure keeps the session editing with its
                // error on display; nothing is sent.
                if let Ok(normalized) = self.editor.confirm(field) {
                    self.submit(Mutation::set_field(&self.focus_id, field, normalized));
                }
            }
            KeyCode::Backspace => self.editor.pop_char(field),
            KeyCode::Char(c) => self.editor.push_char(field, c),
            _ => {}
        }
    }

    fn handle_identity_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.field_cursor = self.field_cursor.saturating_sub(1),
            KeyCode::Down => self.field_cursor = (self.field_cursor + 1).min(FIELDS.len() - 1),
            KeyCode::Enter => {
                let field = FIELDS[self.field_cursor];
                let current = self.current_field_value(field);
                if !self.editor.activate(field, &current) {
                    self.notice = Some("field is busy committing".to_string());
                }
            }
            _ => {}
        }
    }

    fn handle_prefixes_key(&mut self, code: KeyCode) {
        let count = self.snapshot.as_ref().map_or(0, |e| e.prefixes.len());
        match code {
            KeyCode::Up => self.prefix_cursor = self.prefix_cursor.saturating_sub(1),
            KeyCode::Down if count > 0 => {
                self.prefix_cursor = (self.prefix_cursor + 1).min(count - 1);
            }
            KeyCode::Char('a') => self.prefix_entry = Some(String::new()),
            KeyCode::Char('d') | KeyCode::Delete => {
                if count <= 1 {
                    self.notice =
                        Some("a web entity must keep at least one prefix".to_string());
                    return;
                }
                if let Some(entity) = &self.snapshot {
                    if let Some(lru) = entity.prefixes.get(self.prefix_cursor).cloned() {
                        self.submit(Mutation::remove_prefix(&self.focus_id, lru));
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_prefix_entry_key(&mut self, code: KeyCode) {
        let Some(buffer) = self.prefix_entry.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => self.prefix_entry = None,
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            KeyCode::Enter => {
                let raw = self.prefix_entry.take().unwrap_or_default();
                match coerce_to_lru(&raw) {
                    Ok(lru) => self.submit(Mutation::add_prefix(&self.focus_id, lru)),
                    Err(e) => self.notice = Some(e.to_string()),
                }
            }
            _ => {}
        }
    }

    fn handle_tags_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.tag_cursor = self.tag_cursor.saturating_sub(1),
            KeyCode::Down if !self.tag_lines.is_empty() => {
                self.tag_cursor = (self.tag_cursor + 1).min(self.tag_lines.len() - 1);
            }
            KeyCode::Char('a') => {
                if let Some(line) = self.tag_lines.get(self.tag_cursor) {
                    self.tag_entry = Some((line.category.clone(), String::new()));
                }
            }
            KeyCode::Char('d') | KeyCode::Delete => {
                let Some(line) = self.tag_lines.get(self.tag_cursor).cloned() else {
                    return;
                };
                let Some(value) = line.value else { return };
                // Pre-check locally so obviously-invalid removals never
                // reach the store.
                if let Some(entity) = &self.snapshot {
                    match tags::check(entity, &line.category, TagOp::Remove, &value) {
                        Ok(_) => self.submit(Mutation::remove_tag(
                            &self.focus_id,
                            line.category,
                            value,
                        )),
                        Err(e) => self.notice = Some(e.to_string()),
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_tag_entry_key(&mut self, code: KeyCode) {
        let Some((_, buffer)) = self.tag_entry.as_mut() else {
            return;
        };
        match code {
            KeyCode::Esc => self.tag_entry = None,
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) => buffer.push(c),
            KeyCode::Enter => {
                let Some((category, value)) = self.tag_entry.take() else {
                    return;
                };
                if let Some(entity) = &self.snapshot {
                    match tags::check(entity, &category, TagOp::Add, &value) {
                        Ok(trimmed) => {
                            self.submit(Mutation::add_tag(&self.focus_id, category, trimmed));
                        }
                        Err(e) => self.notice = Some(e.to_string()),
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_tree_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.tree_cursor = self.tree_cursor.saturating_sub(1),
            KeyCode::Down if !self.tree_rows.is_empty() => {
                self.tree_cursor = (self.tree_cursor + 1).min(self.tree_rows.len() - 1);
            }
            KeyCode::Enter | KeyCode::Char(' ') => {
                let Some(row) = self.tree_rows.get(self.tree_cursor).cloned() else {
                    return;
                };
                if !row.loaded {
                    let _ = self
                        .outbound
                        .send(EditorMessage::LoadChildren(vec![row.id]));
                    return;
                }
                if row.has_children {
                    self.tree.toggle(&row.id);
                    // Expanding may reveal children we have not fetched.
                    let missing = {
                        let arena = self.arena.lock().unwrap();
                        self.tree.missing_children(&arena)
                    };
                    if !missing.is_empty() {
                        let _ = self.outbound.send(EditorMessage::LoadChildren(missing));
                    }
                }
            }
            _ => {}
        }
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    fn pane_border(&self, pane: Pane) -> Style {
        if self.pane == pane {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    }

    fn render_identity(&self, f: &mut Frame, area: Rect) {
        let title = match &self.snapshot {
            Some(e) => format!(" {} ", e.id),
            None => " loading... ".to_string(),
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(self.pane_border(Pane::Identity));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let mut lines = Vec::new();
        for (idx, field) in FIELDS.iter().enumerate() {
            let selected = self.pane == Pane::Identity && idx == self.field_cursor;
            let label = format!("{:<10}", field.as_str());

            let line = match self.editor.session(*field) {
                Some(session) if session.state == EditState::Editing => Line::from(vec![
                    Span::styled(label, Style::default().fg(Color::DarkGray)),
                    Span::styled(
                        format!("{}▏", session.pending),
                        Style::default().fg(Color::Yellow),
                    ),
                ]),
                Some(session) if session.state == EditState::Committing => Line::from(vec![
                    Span::styled(label, Style::default().fg(Color::DarkGray)),
                    Span::styled(
                        format!("{} (saving...)", session.pending),
                        Style::default().fg(Color::Blue),
                    ),
                ]),
                _ => {
                    let mut style = Style::default().fg(Color::White);
                    if selected {
                        style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
                    }
                    Line::from(vec![
                        Span::styled(label, Style::default().fg(Color::DarkGray)),
                        Span::styled(self.current_field_value(*field), style),
                    ])
                }
            };
            lines.push(line);

            if let Some(session) = self.editor.session(*field) {
                if let Some(error) = &session.error {
                    lines.push(Line::from(Span::styled(
                        format!("          {}", error),
                        Style::default().fg(Color::Red),
                    )));
                }
            }
        }

        if let Some(entity) = &self.snapshot {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!(
                    "modified {}",
                    entity.last_modified_date.format("%Y-%m-%d %H:%M")
                ),
                Style::default().fg(Color::DarkGray),
            )));
        }

        f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
    }

    fn render_prefixes(&self, f: &mut Frame, area: Rect) {
        let count = self.snapshot.as_ref().map_or(0, |e| e.prefixes.len());
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Prefixes ({}) ", count))
            .border_style(self.pane_border(Pane::Prefixes));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let mut items: Vec<ListItem> = self
            .snapshot
            .iter()
            .flat_map(|e| e.prefixes.iter())
            .enumerate()
            .map(|(idx, lru)| {
                let mut style = Style::default().fg(Color::Green);
                if self.pane == Pane::Prefixes && idx == self.prefix_cursor {
                    style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
                }
                ListItem::new(lru.clone()).style(style)
            })
            .collect();

        if let Some(buffer) = &self.prefix_entry {
            items.push(
                ListItem::new(format!("+ {}▏", buffer))
                    .style(Style::default().fg(Color::Yellow)),
            );
        }
        f.render_widget(List::new(items), inner);
    }

    fn render_tags(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" Tags ")
            .border_style(self.pane_border(Pane::Tags));
        let inner = block.inner(area);
        f.render_widget(block, area);

        let mut lines: Vec<Line> = Vec::new();
        let mut last_category: Option<&str> = None;
        for (idx, tag_line) in self.tag_lines.iter().enumerate() {
            if last_category != Some(tag_line.category.as_str()) {
                // Entry buffer renders at the end of its category block.
                if let (Some((category, buffer)), Some(previous)) =
                    (&self.tag_entry, last_category)
                {
                    if category == previous {
                        lines.push(Line::from(Span::styled(
                            format!("  + {}▏", buffer),
                            Style::default().fg(Color::Yellow),
                        )));
                    }
                }
                lines.push(Line::from(Span::styled(
                    tag_line.category.clone(),
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD),
                )));
                last_category = Some(tag_line.category.as_str());
            }
            if let Some(value) = &tag_line.value {
                let mut style = Style::default().fg(Color::White);
                if self.pane == Pane::Tags && idx == self.tag_cursor {
                    style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
                }
                lines.push(Line::from(Span::styled(format!("  {}", value), style)));
            }
        }
        if let (Some((category, buffer)), Some(previous)) = (&self.tag_entry, last_category) {
            if category == previous {
                lines.push(Line::from(Span::styled(
                    format!("  + {}▏", buffer),
                    Style::default().fg(Color::Yellow),
                )));
            }
        }

        // Technical information: system-derived, never editable.
        if let Some(entity) = &self.snapshot {
            for category in entity.technical_categories() {
                lines.push(Line::from(Span::styled(
                    format!("{} (read-only)", category.name),
                    Style::default().fg(Color::DarkGray),
                )));
                for value in &category.values {
                    lines.push(Line::from(Span::styled(
                        format!("  {}", value),
                        Style::default().fg(Color::DarkGray),
                    )));
                }
            }
        }

        f.render_widget(Paragraph::new(lines), inner);
    }

    fn render_notice(&self, f: &mut Frame, area: Rect) {
        let text = self.notice.as_deref().unwrap_or("");
        let style = if text == "saved" {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Red)
        };
        f.render_widget(Paragraph::new(text).style(style), area);
    }

    fn render_hints(&self, f: &mut Frame, area: Rect) {
        let hints = Line::from(vec![
            Span::styled(" Tab ", Style::default().fg(Color::Black).bg(Color::Gray)),
            Span::raw(" Pane  "),
            Span::styled(" ↑/↓ ", Style::default().fg(Color::Black).bg(Color::Gray)),
            Span::raw(" Select  "),
            Span::styled(" Enter ", Style::default().fg(Color::Black).bg(Color::Gray)),
            Span::raw(" Edit/Confirm  "),
            Span::styled(" Esc ", Style::default().fg(Color::Black).bg(Color::Gray)),
            Span::raw(" Cancel  "),
            Span::styled(" a/d ", Style::default().fg(Color::Black).bg(Color::Gray)),
            Span::raw(" Add/Delete  "),
            Span::styled(" q ", Style::default().fg(Color::Black).bg(Color::Gray)),
            Span::raw(" Quit"),
        ]);
        f.render_widget(
            Paragraph::new(hints).style(Style::default().bg(Color::Black).fg(Color::Gray)),
            area,
        );
    }

    fn draw(&self, f: &mut Frame) {
        let size = f.area();
        let vertical = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(10),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(vertical[0]);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(9),
                Constraint::Length(7),
                Constraint::Min(6),
            ])
            .split(columns[0]);

        self.render_identity(f, left[0]);
        self.render_prefixes(f, left[1]);
        self.render_tags(f, left[2]);
        tree_view::render_tree(
            f,
            columns[1],
            &self.tree_rows,
            if self.pane == Pane::Tree {
                Some(self.tree_cursor)
            } else {
                None
            },
            self.pane_border(Pane::Tree),
        );
        self.render_notice(f, vertical[1]);
        self.render_hints(f, vertical[2]);
    }
}

/// Run the editor loop (blocking, run on a dedicated thread).
pub fn run_editor(
    arena: SharedArena,
    focus_id: String,
    vocabulary: Vec<String>,
    events: mpsc::UnboundedReceiver<SyncEvent>,
    outbound: mpsc::UnboundedSender<EditorMessage>,
) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(arena, &focus_id, vocabulary, events, outbound);

    loop {
        app.process_events();
        app.refresh();

        terminal.draw(|f| app.draw(f))?;

        if app.should_quit {
            break;
        }

        if event::poll(std::time::Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.handle_key(key.code, key.modifiers);
        }
    }

    // Anything still in flight for the focal entity must not land after
    // the editor is gone.
    let _ = app.outbound.send(EditorMessage::Detach(focus_id));

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Create the intent channel between the editor thread and the driver.
pub fn create_editor_channel() -> (
    mpsc::UnboundedSender<EditorMessage>,
    mpsc::UnboundedReceiver<EditorMessage>,
) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;
    use curator_core::arena::EntityArena;
    use std::sync::{Arc, Mutex};

    fn app_over(entity: WebEntity) -> (App, mpsc::UnboundedSender<SyncEvent>) {
        let mut arena = EntityArena::new();
        let focus = entity.id.clone();
        arena.insert(entity);
        let arena: SharedArena = Arc::new(Mutex::new(arena));
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        // The outbound receiver is dropped; intents in these tests go
        // nowhere, which `submit` tolerates.
        let (outbound_tx, _outbound_rx) = mpsc::unbounded_channel();
        let app = App::new(arena, focus, Vec::new(), event_rx, outbound_tx);
        (app, event_tx)
    }

    #[test]
    fn refresh_reuses_snapshot_when_nothing_is_dirty() {
        let entity = WebEntity::new("WE1", "Example").with_prefix("s:http|h:org|h:example|");
        let (mut app, _events) = app_over(entity);

        app.refresh();
        assert_eq!(app.snapshot.as_ref().unwrap().name, "Example");

        // A write that never announces itself stays invisible until a
        // subtree is marked dirty.
        app.arena
            .lock()
            .unwrap()
            .apply_field_update("WE1", EntityField::Name, "Renamed")
            .unwrap();
        app.refresh();
        assert_eq!(app.snapshot.as_ref().unwrap().name, "Example");
    }

    #[test]
    fn sync_event_makes_next_refresh_rederive() {
        let entity = WebEntity::new("WE1", "Example").with_prefix("s:http|h:org|h:example|");
        let (mut app, events) = app_over(entity);
        app.refresh();

        app.arena
            .lock()
            .unwrap()
            .apply_field_update("WE1", EntityField::Name, "Renamed")
            .unwrap();
        events
            .send(SyncEvent::Loaded {
                entity_id: "WE1".to_string(),
            })
            .unwrap();

        app.process_events();
        app.refresh();
        assert_eq!(app.snapshot.as_ref().unwrap().name, "Renamed");
    }

    #[test]
    fn first_refresh_populates_even_without_dirty_marks() {
        let entity = WebEntity::new("WE1", "Example").with_prefix("s:http|h:org|h:example|");
        let (mut app, _events) = app_over(entity);
        assert!(app.snapshot.is_none());
        app.refresh();
        assert!(app.snapshot.is_some());
        assert_eq!(app.tree_rows.len(), 1);
    }
}
