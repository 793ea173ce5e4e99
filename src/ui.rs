use ratatui::{
    Frame,
    layout::{Constraint, Flex, Layout, Position, Rect},
    style::{Style, Stylize},
    symbols::border,
    text::{Line, Span},
    widgets::{Block, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
};

use crate::domain::RenderError;
use crate::model::Popup;
use crate::render::{HeaderCell, PageButton, RenderTarget, RenderedPage};

pub const TABLE_HEADER_HEIGHT: u16 = 1;
pub const TABLE_BORDER: u16 = 2;
pub const PAGINATION_HEIGHT: u16 = 1;
pub const CMDLINE_HEIGH: u16 = 1;
pub const MIN_TABLE_WIDTH: u16 = 24;
pub const MAX_COLUMN_WIDTH: usize = 32;
pub const COLUMN_SPACING: u16 = 1;

/// Draws a `RenderedPage` into one ratatui frame.
pub struct FrameTarget<'a, 'b> {
    frame: &'a mut Frame<'b>,
}

impl<'a, 'b> FrameTarget<'a, 'b> {
    pub fn new(frame: &'a mut Frame<'b>) -> Self {
        Self { frame }
    }

    fn draw_table(&mut self, page: &RenderedPage, area: Rect) {
        let title = Line::from(page.title.as_str().bold());
        let instructions = Line::from(vec![
            " Page ".into(),
            "<←/→>".blue().bold(),
            " Sort ".into(),
            "<S>".blue().bold(),
            " Filter ".into(),
            "</>".blue().bold(),
            " Help ".into(),
            "<?>".blue().bold(),
            " Quit ".into(),
            "<Q> ".blue().bold(),
        ]);
        let block = Block::bordered()
            .title(title.centered())
            .title_bottom(instructions.centered())
            .border_set(border::THICK);

        let header = Row::new(page.headers.iter().map(header_cell)).height(TABLE_HEADER_HEIGHT);
        let rows = page
            .rows
            .iter()
            .map(|r| Row::new(r.iter().map(|v| Cell::from(v.as_str()))));

        let table = Table::new(rows, column_widths(page))
            .header(header)
            .block(block)
            .column_spacing(COLUMN_SPACING)
            .row_highlight_style(Style::new().reversed());

        let mut state = TableState::default().with_selected(page.selected_row);
        self.frame.render_stateful_widget(table, area, &mut state);
    }

    fn draw_pagination(&mut self, page: &RenderedPage, area: Rect) {
        let mut spans: Vec<Span> = Vec::new();
        for button in page.pagination.iter() {
            let span = match button {
                PageButton::Prev { enabled } => enabled_span("‹ Prev", *enabled),
                PageButton::Next { enabled } => enabled_span("Next ›", *enabled),
                PageButton::Page { number, current } => {
                    let s = Span::from(format!("{number}"));
                    if *current { s.bold().reversed() } else { s }
                }
                PageButton::Gap => Span::from("…").dim(),
            };
            spans.push(span);
            spans.push(Span::from(" "));
        }

        let info = format!("{}  {} ", page.summary, page.page_info);
        let [left, right] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(info.chars().count() as u16)])
                .areas(area);
        self.frame
            .render_widget(Paragraph::new(Line::from(spans)), left);
        self.frame
            .render_widget(Paragraph::new(Span::from(info).yellow()).right_aligned(), right);
    }

    fn draw_statusline(&mut self, page: &RenderedPage, area: Rect) {
        if let Some(search) = &page.search {
            let line = Line::from(vec![
                search.prompt.blue().bold(),
                Span::from(search.input.as_str()),
            ]);
            self.frame.render_widget(Paragraph::new(line), area);
            let x = area.x + (search.prompt.chars().count() + search.curser_pos) as u16;
            self.frame
                .set_cursor_position(Position::new(x.min(area.right().saturating_sub(1)), area.y));
            return;
        }

        let mut spans = Vec::new();
        if page.loading {
            spans.push("⟳ ".yellow().bold());
        }
        if !page.filter.is_empty() {
            spans.push("filter: ".blue());
            spans.push(Span::from(format!("{}  ", page.filter)).bold());
        }
        spans.push(Span::from(page.status.as_str()));
        self.frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn draw_popup(&mut self, popup: &Popup, area: Rect) {
        let popup_area = centered(area, 70, 80);
        let block = Block::bordered()
            .title(Line::from(Span::from(format!(" {} ", popup.title)).bold()).centered())
            .title_bottom(Line::from(" Close <Esc> ").centered())
            .border_set(border::ROUNDED);
        self.frame.render_widget(Clear, popup_area);
        self.frame.render_widget(
            Paragraph::new(popup.text.as_str())
                .wrap(Wrap { trim: false })
                .block(block),
            popup_area,
        );
    }
}

fn split(area: Rect) -> [Rect; 3] {
    Layout::vertical([
        Constraint::Min(0),
        Constraint::Length(PAGINATION_HEIGHT),
        Constraint::Length(CMDLINE_HEIGH),
    ])
    .areas(area)
}

/// Whether `area` can host the table borders, the header and at least one data row.
pub fn table_fits(area: Rect) -> bool {
    let [table_area, _, _] = split(area);
    table_area.height >= TABLE_BORDER + TABLE_HEADER_HEIGHT + 1 && table_area.width >= MIN_TABLE_WIDTH
}

impl RenderTarget for FrameTarget<'_, '_> {
    /// Draws nothing when the table does not fit.
    fn render(&mut self, page: &RenderedPage) -> Result<(), RenderError> {
        let area = self.frame.area();
        if !table_fits(area) {
            return Err(RenderError::RenderTargetMissing("table body"));
        }
        let [table_area, pagination_area, status_area] = split(area);

        self.draw_table(page, table_area);
        self.draw_pagination(page, pagination_area);
        self.draw_statusline(page, status_area);
        if let Some(popup) = &page.popup {
            self.draw_popup(popup, area);
        }
        Ok(())
    }
}

fn header_cell(h: &HeaderCell) -> Cell<'static> {
    let marker = match h.sort {
        Some(true) => " ▲",
        Some(false) => " ▼",
        None => "",
    };
    let span = Span::from(format!("{}{marker}", h.label)).bold();
    if h.selected {
        Cell::from(span.underlined().cyan())
    } else {
        Cell::from(span)
    }
}

fn column_widths(page: &RenderedPage) -> Vec<Constraint> {
    page.headers
        .iter()
        .enumerate()
        .map(|(idx, h)| {
            let header = h.label.chars().count() + 2; // room for the sort marker
            let widest = page
                .rows
                .iter()
                .filter_map(|r| r.get(idx))
                .map(|v| v.chars().count())
                .max()
                .unwrap_or(0);
            Constraint::Length(header.max(widest).min(MAX_COLUMN_WIDTH) as u16)
        })
        .collect()
}

fn enabled_span(label: &'static str, enabled: bool) -> Span<'static> {
    if enabled {
        label.blue().bold()
    } else {
        label.dim()
    }
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    area
}
