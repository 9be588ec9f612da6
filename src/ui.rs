use anyhow::Result;
use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use expense_manager::{
    all_expenses, fetch_expense_summary, fetch_expenses_by_month_range, year_month,
    CategoryTotal, Database, Expense,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Records,
    DateRange,
    MonthRange,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Records => Page::DateRange,
            Page::DateRange => Page::MonthRange,
            Page::MonthRange => Page::Records,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Records => Page::MonthRange,
            Page::DateRange => Page::Records,
            Page::MonthRange => Page::DateRange,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Records => "Records",
            Page::DateRange => "Date Range",
            Page::MonthRange => "Month Range",
        }
    }
}

pub struct App {
    pub expenses: Vec<Expense>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub date_totals: Vec<CategoryTotal>,
    pub month_totals: Vec<CategoryTotal>,
    pub current_page: Page,
    pub state: TableState,
}

impl App {
    pub fn new(
        expenses: Vec<Expense>,
        start: NaiveDate,
        end: NaiveDate,
        date_totals: Vec<CategoryTotal>,
        month_totals: Vec<CategoryTotal>,
    ) -> Self {
        let mut state = TableState::default();
        if !expenses.is_empty() {
            state.select(Some(0));
        }

        Self {
            expenses,
            start,
            end,
            date_totals,
            month_totals,
            current_page: Page::Records,
            state,
        }
    }

    /// Query everything the dashboard shows; each query is its own unit of work
    pub fn load(db: &Database, start: NaiveDate, end: NaiveDate) -> expense_manager::Result<Self> {
        let expenses = all_expenses(db)?;
        let date_totals = fetch_expense_summary(db, start, end)?;
        let month_totals =
            fetch_expenses_by_month_range(db, &start.to_string(), &end.to_string())?;

        Ok(Self::new(expenses, start, end, date_totals, month_totals))
    }

    fn row_count(&self) -> usize {
        match self.current_page {
            Page::Records => self.expenses.len(),
            Page::DateRange => self.date_totals.len(),
            Page::MonthRange => self.month_totals.len(),
        }
    }

    fn reset_selection(&mut self) {
        let selected = if self.row_count() == 0 { None } else { Some(0) };
        self.state.select(selected);
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
        self.reset_selection();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
        self.reset_selection();
    }

    pub fn next(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i < len - 1 => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn records_total(&self) -> f64 {
        self.expenses.iter().map(|e| e.amount).sum()
    }

    pub fn month_range_label(&self) -> String {
        let start = self.start.to_string();
        let end = self.end.to_string();
        format!("{} → {}", year_month(&start), year_month(&end))
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

    res?;
    Ok(())
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
                KeyCode::Tab => {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        app.previous_page();
                    } else {
                        app.next_page();
                    }
                }
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
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

    match app.current_page {
        Page::Records => render_records(f, chunks[1], app),
        Page::DateRange => {
            let title = format!(" Expenses {} → {} ", app.start, app.end);
            render_summary(f, chunks[1], &app.date_totals, &title, &mut app.state);
        }
        Page::MonthRange => {
            let title = format!(" Expenses {} ", app.month_range_label());
            render_summary(f, chunks[1], &app.month_totals, &title, &mut app.state);
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let pages = [Page::Records, Page::DateRange, Page::MonthRange];

    let mut tab_spans = vec![Span::styled(
        " 💰 Expense Manager  ",
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    )];
    for (i, page) in pages.iter().enumerate() {
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

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Records: {}", app.expenses.len()),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn render_records(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.expenses.iter().map(|e| {
        Row::new(vec![
            Cell::from(e.expense_date.to_string()),
            Cell::from(format!("{:.2}", e.amount)).style(Style::default().fg(Color::Red)),
            Cell::from(truncate(&e.category, 20)),
            Cell::from(truncate(e.notes.as_deref().unwrap_or(""), 40)),
        ])
        .height(1)
    });

    let title = format!(" All Expenses (total {:.2}) ", app.records_total());
    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(22),
            Constraint::Min(10),
        ],
    )
    .header(header_row(&["Date", "Amount", "Category", "Notes"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_summary(
    f: &mut Frame,
    area: Rect,
    totals: &[CategoryTotal],
    title: &str,
    state: &mut TableState,
) {
    if totals.is_empty() {
        let empty = Paragraph::new("  No expenses found in the selected range.").block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(title.to_string()),
        );
        f.render_widget(empty, area);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let grand: f64 = totals.iter().map(|t| t.total).sum();
    let rows = totals.iter().map(|t| {
        let share = if grand > 0.0 { t.total / grand * 100.0 } else { 0.0 };
        Row::new(vec![
            Cell::from(truncate(&t.category, 20)),
            Cell::from(format!("{:.2}", t.total)).style(Style::default().fg(Color::Red)),
            Cell::from(format!("{:.1}%", share)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(22),
            Constraint::Length(12),
            Constraint::Length(8),
        ],
    )
    .header(header_row(&["Category", "Total", "Share"]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(title.to_string()),
    )
    .highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, chunks[0], state);

    let labels: Vec<String> = totals.iter().map(|t| truncate(&t.category, 8)).collect();
    let bars: Vec<(&str, u64)> = labels
        .iter()
        .zip(totals)
        .map(|(label, t)| (label.as_str(), t.total.round().max(0.0) as u64))
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(" Total Expenses by Category "),
        )
        .data(bars.as_slice())
        .bar_width(9)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan));

    f.render_widget(chart, chunks[1]);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let status_spans = vec![
        Span::styled(
            format!(" Row: {}/{} ", selected, app.row_count()),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(" | "),
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Page | "),
        Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
        Span::raw(" Nav | "),
        Span::styled("q", Style::default().fg(Color::Red)),
        Span::raw(" Quit"),
    ];

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
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        expense_manager::parse_date(s).unwrap()
    }

    fn sample_app() -> App {
        let expenses = vec![
            Expense {
                id: 1,
                expense_date: date("2024-08-10"),
                amount: 100.50,
                category: "Food".to_string(),
                notes: Some("Biriyani".to_string()),
            },
            Expense {
                id: 2,
                expense_date: date("2024-08-15"),
                amount: 50.0,
                category: "Transport".to_string(),
                notes: None,
            },
        ];
        let totals = vec![CategoryTotal {
            category: "Food".to_string(),
            total: 100.50,
        }];

        App::new(expenses, date("2024-08-01"), date("2024-08-31"), totals, Vec::new())
    }

    #[test]
    fn test_page_cycle() {
        assert_eq!(Page::Records.next(), Page::DateRange);
        assert_eq!(Page::MonthRange.next(), Page::Records);
        assert_eq!(Page::Records.previous(), Page::MonthRange);
    }

    #[test]
    fn test_selection_wraps_and_resets_per_page() {
        let mut app = sample_app();
        assert_eq!(app.state.selected(), Some(0));

        app.next();
        app.next();
        assert_eq!(app.state.selected(), Some(0));

        app.previous();
        assert_eq!(app.state.selected(), Some(1));

        app.next_page();
        assert_eq!(app.current_page, Page::DateRange);
        assert_eq!(app.state.selected(), Some(0));

        // Month range page has no rows
        app.next_page();
        assert_eq!(app.state.selected(), None);
        app.next();
        assert_eq!(app.state.selected(), None);
    }

    #[test]
    fn test_records_total_and_month_label() {
        let app = sample_app();
        assert!((app.records_total() - 150.50).abs() < 1e-9);
        assert_eq!(app.month_range_label(), "2024-08 → 2024-08");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("Food", 8), "Food");
        assert_eq!(truncate("Café au lait", 8), "Café ...");
    }
}
