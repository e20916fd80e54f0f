use crate::record::TransactionRecord;
use crate::store::RecordStore;
use crate::tools::{Tool, ToolRegistry};
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};
use std::collections::BTreeMap;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    ErrorCodes,
    Transactions,
    Views,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterType {
    None,
    AllTransactions,
    NeedsFix,
    Complete,
    ByErrorCode(String),
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::ErrorCodes => Page::Transactions,
            Page::Transactions => Page::Views,
            Page::Views => Page::ErrorCodes,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::ErrorCodes => Page::Views,
            Page::Transactions => Page::ErrorCodes,
            Page::Views => Page::Transactions,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::ErrorCodes => "Error Codes",
            Page::Transactions => "Failed Transactions",
            Page::Views => "Views",
        }
    }
}

pub struct App {
    pub store: RecordStore,
    /// Indices into `store.records()` that pass the active filter
    pub filtered: Vec<usize>,
    pub state: TableState,
    pub current_page: Page,
    pub error_codes_state: TableState,
    pub show_detail: bool,
    pub active_filter: FilterType,
}

impl App {
    pub fn new(store: RecordStore) -> Self {
        let mut state = TableState::default();
        if !store.is_empty() {
            state.select(Some(0));
        }

        let mut error_codes_state = TableState::default();
        error_codes_state.select(Some(0));

        let filtered = (0..store.len()).collect();

        Self {
            store,
            filtered,
            state,
            current_page: Page::Transactions,
            error_codes_state,
            show_detail: false,
            active_filter: FilterType::None,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn selected_record(&self) -> Option<&TransactionRecord> {
        self.state
            .selected()
            .and_then(|i| self.filtered.get(i))
            .and_then(|&idx| self.store.records().get(idx))
    }

    pub fn apply_filter(&mut self, filter: FilterType) {
        self.filtered = self
            .store
            .records()
            .iter()
            .enumerate()
            .filter(|(_, record)| match &filter {
                FilterType::None | FilterType::AllTransactions => true,
                FilterType::NeedsFix => !record.missing_fields().is_empty(),
                FilterType::Complete => record.missing_fields().is_empty(),
                FilterType::ByErrorCode(code) => record.error_code() == code,
            })
            .map(|(i, _)| i)
            .collect();
        self.active_filter = filter;

        if !self.filtered.is_empty() {
            self.state.select(Some(0));
        } else {
            self.state.select(None);
        }
    }

    pub fn clear_filter(&mut self) {
        self.apply_filter(FilterType::None);
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    /// (error code, transactions, transactions with missing fields), most frequent first
    pub fn error_code_summary(&self) -> Vec<(String, usize, usize)> {
        let mut summary: BTreeMap<String, (usize, usize)> = BTreeMap::new();

        for record in self.store.records() {
            let entry = summary.entry(record.error_code().to_string()).or_insert((0, 0));
            entry.0 += 1;
            if !record.missing_fields().is_empty() {
                entry.1 += 1;
            }
        }

        let mut result: Vec<_> = summary
            .into_iter()
            .map(|(code, (count, incomplete))| (code, count, incomplete))
            .collect();

        result.sort_by(|a, b| b.1.cmp(&a.1));
        result
    }

    pub fn needs_fix_count(&self) -> usize {
        self.store
            .records()
            .iter()
            .filter(|r| !r.missing_fields().is_empty())
            .count()
    }

    pub fn next(&mut self) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.filtered.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    /// Filter on the error code under the cursor of the error-code page
    pub fn filter_selected_error_code(&mut self) {
        let summary = self.error_code_summary();
        if let Some((code, _, _)) = self
            .error_codes_state
            .selected()
            .and_then(|i| summary.get(i))
        {
            self.apply_filter(FilterType::ByErrorCode(code.clone()));
            self.current_page = Page::Transactions;
        }
    }

    fn next_error_code(&mut self, forward: bool) {
        let len = self.error_code_summary().len();
        if len == 0 {
            return;
        }
        let i = self.error_codes_state.selected().unwrap_or(0);
        let i = if forward { (i + 1) % len } else { (i + len - 1) % len };
        self.error_codes_state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter if app.current_page == Page::ErrorCodes => {
                    app.filter_selected_error_code()
                }
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char('c') => {
                    app.clear_filter();
                    app.current_page = Page::Transactions;
                }
                KeyCode::Char('1') if app.current_page == Page::Views => {
                    app.apply_filter(FilterType::AllTransactions);
                    app.current_page = Page::Transactions;
                }
                KeyCode::Char('2') if app.current_page == Page::Views => {
                    app.apply_filter(FilterType::NeedsFix);
                    app.current_page = Page::Transactions;
                }
                KeyCode::Char('3') if app.current_page == Page::Views => {
                    app.apply_filter(FilterType::Complete);
                    app.current_page = Page::Transactions;
                }
                KeyCode::Down | KeyCode::Char('j') if app.current_page == Page::ErrorCodes => {
                    app.next_error_code(true)
                }
                KeyCode::Up | KeyCode::Char('k') if app.current_page == Page::ErrorCodes => {
                    app.next_error_code(false)
                }
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Home => app.state.select(Some(0)),
                KeyCode::End => {
                    if !app.filtered.is_empty() {
                        app.state.select(Some(app.filtered.len() - 1));
                    }
                }
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail && app.current_page == Page::Transactions {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        render_table(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::ErrorCodes => render_error_codes(f, chunks[1], app),
            Page::Transactions => render_table(f, chunks[1], app),
            Page::Views => render_views(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::ErrorCodes, Page::Transactions, Page::Views].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    let needs_fix = app.needs_fix_count();
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Total: {}", app.store.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("✗ {} incomplete", needs_fix),
        Style::default().fg(Color::Red),
    ));
    tab_spans.push(Span::raw("  "));
    tab_spans.push(Span::styled(
        format!("✓ {} complete", app.store.len() - needs_fix),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Transaction", "Error", "Member", "Name", "Missing"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let records = app.store.records();
    let rows = app.filtered.iter().filter_map(|&i| records.get(i)).map(|record| {
        let missing = record.missing_fields();
        let color = if missing.is_empty() { Color::Green } else { Color::Red };
        let name = format!(
            "{} {}",
            record.get("first_name").unwrap_or("?"),
            record.get("last_name").unwrap_or("?")
        );

        let cells = vec![
            Cell::from(record.transaction_id().unwrap_or("-").to_string()),
            Cell::from(record.error_code().to_string()),
            Cell::from(record.get("member_id").unwrap_or("-").to_string()),
            Cell::from(truncate(&name, 24)),
            Cell::from(missing.len().to_string()).style(Style::default().fg(color)),
        ];

        Row::new(cells).height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(14),
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Length(26),
            Constraint::Length(8),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Failed Transactions "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let mut lines = Vec::new();

    match app.selected_record().and_then(|r| r.transaction_id()) {
        Some(transaction_id) => {
            let tools = ToolRegistry::new(&app.store);
            for tool in Tool::ALL {
                lines.push(Line::from(Span::styled(
                    tool.name(),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                )));
                lines.push(Line::from(tools.invoke(tool, transaction_id).as_text()));
                lines.push(Line::from(""));
            }
        }
        None => lines.push(Line::from("No transaction_id provided.")),
    }

    let panel = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Remediation "),
        );

    f.render_widget(panel, area);
}

fn render_error_codes(f: &mut Frame, area: Rect, app: &mut App) {
    let summary = app.error_code_summary();

    let header_cells = ["Error Code", "Transactions", "Incomplete", "Resolution"]
        .iter()
        .map(|h| {
            Cell::from(*h).style(
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            )
        });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = summary.iter().map(|(code, count, incomplete)| {
        let color = if *incomplete > 0 { Color::Red } else { Color::Green };
        let resolution = crate::remediation::resolution_for_code(code).unwrap_or("Contact support.");

        Row::new(vec![
            Cell::from(code.clone()),
            Cell::from(count.to_string()),
            Cell::from(incomplete.to_string()).style(Style::default().fg(color)),
            Cell::from(resolution),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Error Codes - Enter to filter "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.error_codes_state);
}

fn render_views(f: &mut Frame, area: Rect, app: &App) {
    let needs_fix = app.needs_fix_count();
    let option = |key: &'static str, label: &'static str, count: usize, filter: FilterType| {
        let marker = if app.active_filter == filter {
            Span::styled("→", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD))
        } else {
            Span::raw(" ")
        };
        Line::from(vec![
            Span::raw("  "),
            marker,
            Span::styled(key, Style::default().fg(Color::Yellow)),
            Span::raw(format!(". {:<24}", label)),
            Span::styled(format!("{:>5} txs", count), Style::default().fg(Color::White)),
        ])
    };

    let content = vec![
        Line::from(""),
        Line::from(Span::styled(
            "  Quick Views & Filters",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        option("1", "All Transactions", app.store.len(), FilterType::AllTransactions),
        option("2", "Missing Fields", needs_fix, FilterType::NeedsFix),
        option("3", "All Fields Present", app.store.len() - needs_fix, FilterType::Complete),
    ];

    let views = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Views "),
    );

    f.render_widget(views, area);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, app.filtered.len()),
        Style::default().fg(Color::Cyan),
    )];

    let filter_name = match &app.active_filter {
        FilterType::None | FilterType::AllTransactions => None,
        FilterType::NeedsFix => Some("MISSING FIELDS".to_string()),
        FilterType::Complete => Some("COMPLETE".to_string()),
        FilterType::ByErrorCode(code) => Some(code.clone()),
    };
    if let Some(name) = filter_name {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Filter: {}", name),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("c", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" clear)"));
    }

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Details | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    status_spans.push(Span::styled("↑/↓", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Nav | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
