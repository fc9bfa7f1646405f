//! Application state and TUI event loop
//!
//! Manages the application state and handles user input for the
//! reference tree visualization.

use std::io;

use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};

use super::tree::{FlattenedNode, TreeNode};
use crate::asset::AssetIndex;
use crate::config::Rgb;
use crate::explorer::{Explorer, RebuildOutcome};
use crate::graph::LinkKind;

/// Virtual scroll state for efficient rendering of large trees
#[derive(Debug, Default, Clone)]
pub struct VirtualScrollState {
    /// First visible row index
    pub offset: usize,
    /// Number of visible rows in the viewport
    pub viewport_height: usize,
}

impl VirtualScrollState {
    /// Create a new virtual scroll state
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the viewport height
    pub fn set_viewport_height(&mut self, height: usize) {
        self.viewport_height = height;
    }

    /// Calculate the visible range for the current offset and total items
    pub fn visible_range(&self, total: usize) -> (usize, usize) {
        if total == 0 || self.viewport_height == 0 {
            return (0, 0);
        }
        let start = self.offset.min(total.saturating_sub(1));
        (start, (start + self.viewport_height).min(total))
    }

    /// Update offset to ensure selection is visible
    pub fn ensure_visible(&mut self, selected: usize, total: usize) {
        if total == 0 || self.viewport_height == 0 {
            return;
        }

        if selected < self.offset {
            self.offset = selected;
        } else if selected >= self.offset + self.viewport_height {
            self.offset = selected.saturating_sub(self.viewport_height - 1);
        }
    }
}

/// Application state
pub struct App<'a, I: AssetIndex + ?Sized> {
    /// Explorer holding the current graph
    pub explorer: Explorer,
    index: &'a I,
    /// Tree built from the current graph
    pub tree: Option<TreeNode>,
    /// Currently selected index in the flattened view
    pub selected_index: usize,
    /// Flattened representation for rendering
    pub flattened: Vec<FlattenedNode>,
    /// Filtered flattened view (when search is active)
    pub filtered: Vec<FlattenedNode>,
    /// Whether the application should quit
    pub should_quit: bool,
    /// List state for ratatui
    list_state: ListState,
    /// Whether search mode is active
    pub search_active: bool,
    /// Current search query
    pub search_query: String,
    /// Virtual scroll state for performance with large trees
    pub scroll_state: VirtualScrollState,
}

impl<'a, I: AssetIndex + ?Sized> App<'a, I> {
    /// Create a new application over an explorer and the index it queries
    pub fn new(explorer: Explorer, index: &'a I) -> Self {
        let mut app = Self {
            explorer,
            index,
            tree: None,
            selected_index: 0,
            flattened: Vec::new(),
            filtered: Vec::new(),
            should_quit: false,
            list_state: ListState::default(),
            search_active: false,
            search_query: String::new(),
            scroll_state: VirtualScrollState::new(),
        };
        app.sync_tree();
        app
    }

    /// Rebuild the tree from the explorer's graph and reset the view
    fn sync_tree(&mut self) {
        self.tree = TreeNode::from_graph(self.explorer.graph());
        self.search_active = false;
        self.search_query.clear();
        self.filtered.clear();
        self.selected_index = 0;
        self.scroll_state.offset = 0;
        self.refresh_flattened();
        self.list_state.select(Some(0));
    }

    /// Refresh the flattened view from the tree
    pub fn refresh_flattened(&mut self) {
        self.flattened = self.tree.as_ref().map(TreeNode::flatten).unwrap_or_default();

        if !self.flattened.is_empty() && self.selected_index >= self.flattened.len() {
            self.selected_index = self.flattened.len() - 1;
        }
    }

    /// Rows currently shown (filtered or full)
    fn visible_rows(&self) -> &[FlattenedNode] {
        if !self.search_query.is_empty() {
            &self.filtered
        } else {
            &self.flattened
        }
    }

    /// The selected row, if any
    pub fn selected_node(&self) -> Option<&FlattenedNode> {
        self.visible_rows().get(self.selected_index)
    }

    /// Re-root the graph on the selected node
    pub fn navigate_selected(&mut self) -> Option<RebuildOutcome> {
        let id = self.selected_node()?.id.clone();
        if self.explorer.root() == Some(&id) {
            return None;
        }
        let outcome = self.explorer.navigate(self.index, &id);
        self.sync_tree();
        Some(outcome)
    }

    /// Rebuild the current graph from the index
    pub fn refresh(&mut self) -> RebuildOutcome {
        let outcome = self.explorer.refresh(self.index);
        self.sync_tree();
        outcome
    }

    /// Select the row at `index`, clamped to the visible rows, and scroll to it
    pub fn select(&mut self, index: usize) {
        let total = self.visible_rows().len();
        if total == 0 {
            return;
        }
        self.selected_index = index.min(total - 1);
        self.list_state.select(Some(self.selected_index));
        self.scroll_state.ensure_visible(self.selected_index, total);
    }

    fn page_size(&self) -> usize {
        self.scroll_state.viewport_height.max(1)
    }

    pub fn select_next(&mut self) {
        self.select(self.selected_index + 1);
    }

    pub fn select_previous(&mut self) {
        self.select(self.selected_index.saturating_sub(1));
    }

    pub fn page_down(&mut self) {
        self.select(self.selected_index + self.page_size());
    }

    pub fn page_up(&mut self) {
        self.select(self.selected_index.saturating_sub(self.page_size()));
    }

    pub fn select_first(&mut self) {
        self.select(0);
    }

    pub fn select_last(&mut self) {
        self.select(usize::MAX);
    }

    /// Toggle expansion of the selected item
    ///
    /// Ignored while a filter is active, since filtered rows do not map to
    /// tree positions.
    pub fn toggle_selected(&mut self) {
        if !self.search_query.is_empty() {
            return;
        }
        let toggled = self
            .tree
            .as_mut()
            .is_some_and(|tree| tree.toggle_at_index(self.selected_index));
        if toggled {
            self.refresh_flattened();
        }
    }

    /// Signal that the application should quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    /// Get the tree prefix for a node at the given index
    fn get_tree_prefix(&self, index: usize) -> String {
        let Some(node) = self.flattened.get(index) else {
            return String::new();
        };

        // is_last_child of the nearest ancestor at each depth
        let mut ancestors_last: Vec<bool> = Vec::new();
        for n in self.flattened.iter().take(index) {
            if n.depth == 0 {
                continue;
            }
            ancestors_last.truncate(n.depth - 1);
            ancestors_last.resize(n.depth - 1, false);
            ancestors_last.push(n.is_last_child);
        }

        let mut prefix = String::new();
        for depth in 1..node.depth {
            if ancestors_last.get(depth - 1).copied().unwrap_or(true) {
                prefix.push_str("    ");
            } else {
                prefix.push_str("│   ");
            }
        }
        if node.depth > 0 {
            prefix.push_str(if node.is_last_child { "└── " } else { "├── " });
        }
        prefix
    }

    /// Start search mode
    pub fn start_search(&mut self) {
        self.search_active = true;
        self.search_query.clear();
    }

    /// Clear search and return to normal mode
    pub fn clear_search(&mut self) {
        self.search_active = false;
        self.search_query.clear();
        self.filtered.clear();
        self.selected_index = 0;
        self.list_state.select(Some(0));
    }

    /// Add a character to the search query
    pub fn search_push(&mut self, c: char) {
        self.search_query.push(c);
        self.update_filter();
    }

    /// Remove the last character from the search query
    pub fn search_pop(&mut self) {
        self.search_query.pop();
        self.update_filter();
    }

    fn update_filter(&mut self) {
        self.filtered = if self.search_query.is_empty() {
            Vec::new()
        } else {
            self.flattened
                .iter()
                .filter(|node| fuzzy_match(&node.search_text(), &self.search_query))
                .cloned()
                .collect()
        };
        self.selected_index = 0;
        self.list_state.select(Some(0));
    }

    /// Text for the status line
    pub fn status_line(&self) -> String {
        let status = self.explorer.status_text();
        if !status.is_empty() {
            return status;
        }
        match self.explorer.root() {
            Some(root) => format!(
                "{}: {} referencers",
                root,
                self.explorer.graph().node_count().saturating_sub(1)
            ),
            None => "No root selected".to_string(),
        }
    }

    fn link_color(&self, kind: LinkKind) -> Color {
        to_color(self.explorer.config().style.link_color(kind))
    }
}

/// Perform fuzzy matching of query against text (case-insensitive)
/// A match requires all characters of the query to appear in order in the text
fn fuzzy_match(text: &str, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }

    let text_lower = text.to_lowercase();
    let query_lower = query.to_lowercase();

    let mut query_chars = query_lower.chars().peekable();
    for c in text_lower.chars() {
        if query_chars.peek() == Some(&c) {
            query_chars.next();
        }
        if query_chars.peek().is_none() {
            return true;
        }
    }
    query_chars.peek().is_none()
}

fn to_color(rgb: Rgb) -> Color {
    Color::Rgb(rgb.0, rgb.1, rgb.2)
}

/// Maximum depth for color gradient calculations
const MAX_DEPTH_FOR_COLOR: usize = 10;

/// Brightness factor from 1.0 at the root down to 0.4 at `MAX_DEPTH_FOR_COLOR`
fn get_depth_brightness(depth: usize) -> f32 {
    let ratio = depth.min(MAX_DEPTH_FOR_COLOR) as f32 / MAX_DEPTH_FOR_COLOR as f32;
    1.0 - (ratio * 0.6)
}

/// Dim an RGB color for deeper nodes
fn apply_depth_color(base_color: Color, depth: usize) -> Color {
    let brightness = get_depth_brightness(depth);
    match base_color {
        Color::Rgb(r, g, b) => Color::Rgb(
            (r as f32 * brightness) as u8,
            (g as f32 * brightness) as u8,
            (b as f32 * brightness) as u8,
        ),
        other => other,
    }
}

/// Run the TUI application
pub fn run_app<B: Backend, I: AssetIndex + ?Sized>(
    terminal: &mut Terminal<B>,
    app: &mut App<'_, I>,
) -> io::Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                if app.search_active {
                    match key.code {
                        KeyCode::Esc => app.clear_search(),
                        // Leave search mode but keep the filter
                        KeyCode::Enter => app.search_active = false,
                        KeyCode::Backspace => app.search_pop(),
                        KeyCode::Char(c) => app.search_push(c),
                        KeyCode::Down | KeyCode::Tab => app.select_next(),
                        KeyCode::Up | KeyCode::BackTab => app.select_previous(),
                        _ => {}
                    }
                } else {
                    match key.code {
                        KeyCode::Char('q') => app.quit(),
                        KeyCode::Esc => {
                            if !app.search_query.is_empty() {
                                app.clear_search();
                            } else {
                                app.quit();
                            }
                        }
                        KeyCode::Char('/') => app.start_search(),
                        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
                        KeyCode::Char('k') | KeyCode::Up => app.select_previous(),
                        KeyCode::Enter => {
                            app.navigate_selected();
                        }
                        KeyCode::Char(' ') => app.toggle_selected(),
                        KeyCode::Char('r') => {
                            app.refresh();
                        }
                        KeyCode::PageDown | KeyCode::Char('d') => app.page_down(),
                        KeyCode::PageUp | KeyCode::Char('u') => app.page_up(),
                        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
                        KeyCode::End | KeyCode::Char('G') => app.select_last(),
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn render<I: AssetIndex + ?Sized>(frame: &mut Frame, app: &mut App<'_, I>) {
    let show_search = app.search_active || !app.search_query.is_empty();

    let mut constraints = vec![Constraint::Length(3)];
    if show_search {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Min(0));
    constraints.push(Constraint::Length(3));

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(frame.area());

    let body_index = if show_search { 2 } else { 1 };
    render_header(frame, app, chunks[0]);
    if show_search {
        render_search_bar(frame, app, chunks[1]);
    }

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[body_index]);
    render_tree(frame, app, body[0]);
    render_details(frame, app, body[1]);
    render_footer(frame, app, chunks[body_index + 1]);
}

fn render_header<I: AssetIndex + ?Sized>(frame: &mut Frame, app: &App<'_, I>, area: Rect) {
    let status = app.status_line();
    let style = if app.explorer.status_text().is_empty() {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
    };
    let header = Paragraph::new(status)
        .style(style)
        .block(Block::default().title("refscope").borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn render_search_bar<I: AssetIndex + ?Sized>(frame: &mut Frame, app: &App<'_, I>, area: Rect) {
    let (border_color, title) = if app.search_active {
        (Color::Yellow, "Search (Enter to confirm, Esc to cancel)")
    } else {
        (Color::Gray, "Filter (/ to edit, Esc to clear)")
    };

    let cursor = if app.search_active { "_" } else { "" };
    let result_count = if !app.search_query.is_empty() {
        format!(" ({} matches)", app.filtered.len())
    } else {
        String::new()
    };

    let content = Line::from(vec![
        Span::styled(format!("/{}", app.search_query), Style::default().fg(Color::White)),
        Span::styled(cursor, Style::default().fg(Color::Yellow).add_modifier(Modifier::SLOW_BLINK)),
        Span::styled(result_count, Style::default().fg(Color::DarkGray)),
    ]);

    let search_bar = Paragraph::new(content).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border_color)),
    );
    frame.render_widget(search_bar, area);
}

/// Render the reference tree with virtual scrolling
pub fn render_tree<I: AssetIndex + ?Sized>(frame: &mut Frame, app: &mut App<'_, I>, area: Rect) {
    let has_search = !app.search_query.is_empty();
    let total_nodes = app.visible_rows().len();

    // Border takes 2 rows
    let viewport_height = (area.height as usize).saturating_sub(2);
    app.scroll_state.set_viewport_height(viewport_height);
    app.scroll_state.ensure_visible(app.selected_index, total_nodes);
    let (start_idx, end_idx) = app.scroll_state.visible_range(total_nodes);

    let style = &app.explorer.config().style;
    let items: Vec<ListItem> = app.visible_rows()[start_idx..end_idx]
        .iter()
        .enumerate()
        .map(|(visible_idx, node)| {
            let prefix = if has_search {
                String::new()
            } else {
                app.get_tree_prefix(start_idx + visible_idx)
            };

            let title_color = apply_depth_color(
                to_color(style.title_color(node.kind, node.depth == 0)),
                node.depth,
            );
            let title_spans = if has_search {
                highlight_matches(&node.title, &app.search_query, title_color)
            } else {
                vec![Span::styled(node.title.clone(), Style::default().fg(title_color))]
            };

            let mut spans = vec![
                Span::styled(prefix, Style::default().fg(Color::DarkGray)),
                Span::styled(node.expansion_indicator(), Style::default().fg(Color::Yellow)),
            ];
            if let Some(kind) = node.link {
                spans.push(Span::styled(
                    format!("{} ", kind.short_label()),
                    Style::default().fg(app.link_color(kind)),
                ));
            }
            spans.extend(title_spans);
            if !node.type_name.is_empty() {
                spans.push(Span::styled(
                    format!(" ({})", node.type_name),
                    Style::default().fg(Color::DarkGray),
                ));
            }
            if node.back_reference_count > 0 {
                spans.push(Span::styled(
                    format!(" *{}", node.back_reference_count),
                    Style::default().fg(Color::Magenta),
                ));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    app.list_state
        .select(Some(app.selected_index.saturating_sub(start_idx)));

    let title = if has_search {
        format!("Referencers (filtered: {} matches)", total_nodes)
    } else if total_nodes > viewport_height {
        format!("Referencers ({}-{} of {})", start_idx + 1, end_idx, total_nodes)
    } else {
        format!("Referencers ({})", total_nodes.saturating_sub(1))
    };

    let tree_list = List::new(items)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Gray)),
        )
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("► ");

    frame.render_stateful_widget(tree_list, area, &mut app.list_state);
}

fn render_details<I: AssetIndex + ?Sized>(frame: &mut Frame, app: &App<'_, I>, area: Rect) {
    let mut lines = Vec::new();
    if let Some(node) = app.selected_node() {
        lines.push(Line::from(Span::styled(
            node.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(node.id.to_string()));
        if !node.type_name.is_empty() {
            lines.push(Line::from(format!("Type: {}", node.type_name)));
        }
        if let Some(kind) = node.link {
            lines.push(Line::from(vec![
                Span::raw("Link: "),
                Span::styled(kind.name(), Style::default().fg(app.link_color(kind))),
            ]));
        }
        if let Some(visual) = app.explorer.graph().visual_node(&node.id) {
            lines.push(Line::from(format!(
                "Position: ({:.0}, {:.0})",
                visual.position.x, visual.position.y
            )));
            if !visual.back_references.is_empty() {
                lines.push(Line::from(""));
                lines.push(Line::from("Referencing fields:"));
                for reference in &visual.back_references {
                    lines.push(Line::from(format!("  {} [{}]", reference.field, reference.category)));
                }
            }
        }
    }

    let details = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().title("Details").borders(Borders::ALL));
    frame.render_widget(details, area);
}

/// Highlight matching characters in a string based on fuzzy search
fn highlight_matches(text: &str, query: &str, base_color: Color) -> Vec<Span<'static>> {
    let match_style = Style::default()
        .fg(Color::Magenta)
        .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    let base_style = Style::default().fg(base_color);

    let query_lower = query.to_lowercase();
    let mut query_chars = query_lower.chars().peekable();
    let mut result = Vec::new();
    let mut segment = String::new();
    let mut segment_is_match = false;

    for c in text.chars() {
        let c_lower = c.to_lowercase().next().unwrap_or(c);
        let is_match = query_chars.peek() == Some(&c_lower);
        if is_match {
            query_chars.next();
        }

        if is_match != segment_is_match && !segment.is_empty() {
            let style = if segment_is_match { match_style } else { base_style };
            result.push(Span::styled(std::mem::take(&mut segment), style));
        }
        segment.push(c);
        segment_is_match = is_match;
    }

    if !segment.is_empty() {
        let style = if segment_is_match { match_style } else { base_style };
        result.push(Span::styled(segment, style));
    }
    result
}

fn render_footer<I: AssetIndex + ?Sized>(frame: &mut Frame, app: &App<'_, I>, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let mut spans = if app.search_active {
        vec![
            Span::styled("Type", key),
            Span::raw(" to search  "),
            Span::styled("↑/↓", key),
            Span::raw(" Navigate  "),
            Span::styled("Enter", key),
            Span::raw(" Confirm  "),
            Span::styled("Esc", key),
            Span::raw(" Cancel"),
        ]
    } else {
        vec![
            Span::styled("/", key),
            Span::raw(" Search  "),
            Span::styled("j/k", key),
            Span::raw(" Nav  "),
            Span::styled("Enter", key),
            Span::raw(" Explore  "),
            Span::styled("Space", key),
            Span::raw(" Toggle  "),
            Span::styled("r", key),
            Span::raw(" Refresh  "),
            Span::styled("q", key),
            Span::raw(" Quit  │ "),
        ]
    };

    if !app.search_active {
        for kind in LinkKind::ALL {
            spans.push(Span::styled(kind.short_label(), Style::default().fg(app.link_color(kind))));
            spans.push(Span::raw(format!(" {}  ", kind)));
        }
    }

    let footer = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}
