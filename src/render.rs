//! Turns the model into plain render data.
//!
//! `render` is a pure function: the same model state always produces the same
//! `RenderedPage`. Everything that actually draws lives behind `RenderTarget`.

use crate::contact::ContactField;
use crate::domain::{CMDMode, RenderError};
use crate::model::{Model, Popup};

/// Number of page buttons shown around the current page.
pub const PAGE_WINDOW: usize = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct HeaderCell {
    pub label: String,
    /// `Some(true)` ascending, `Some(false)` descending.
    pub sort: Option<bool>,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageButton {
    Prev { enabled: bool },
    Page { number: usize, current: bool },
    Gap,
    Next { enabled: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchLine {
    pub prompt: &'static str,
    pub input: String,
    pub curser_pos: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedPage {
    pub title: String,
    pub headers: Vec<HeaderCell>,
    pub rows: Vec<Vec<String>>,
    pub selected_row: Option<usize>,
    pub page_info: String,
    pub pagination: Vec<PageButton>,
    pub summary: String,
    pub filter: String,
    pub search: Option<SearchLine>,
    pub status: String,
    pub loading: bool,
    pub popup: Option<Popup>,
}

/// Anything a `RenderedPage` can be drawn onto.
pub trait RenderTarget {
    fn render(&mut self, page: &RenderedPage) -> Result<(), RenderError>;
}

pub fn page_info(page: usize, max_page: usize) -> String {
    format!("Page {page} of {max_page}")
}

/// Prev, a window of page numbers around `page` with gaps to the first and last page, next.
pub fn pagination(page: usize, max_page: usize) -> Vec<PageButton> {
    let mut buttons = vec![PageButton::Prev { enabled: page > 1 }];

    let half = PAGE_WINDOW / 2;
    let mut first = page.saturating_sub(half).max(1);
    let last = (first + PAGE_WINDOW - 1).min(max_page);
    first = last.saturating_sub(PAGE_WINDOW - 1).max(1);

    if first > 1 {
        buttons.push(PageButton::Page {
            number: 1,
            current: false,
        });
        if first > 2 {
            buttons.push(PageButton::Gap);
        }
    }
    for number in first..=last {
        buttons.push(PageButton::Page {
            number,
            current: number == page,
        });
    }
    if last < max_page {
        if last + 1 < max_page {
            buttons.push(PageButton::Gap);
        }
        buttons.push(PageButton::Page {
            number: max_page,
            current: false,
        });
    }

    buttons.push(PageButton::Next {
        enabled: page < max_page,
    });
    buttons
}

pub fn render(model: &Model) -> RenderedPage {
    let view = model.view();
    let sort = model.state().sort;

    let headers = ContactField::ALL
        .iter()
        .map(|&field| HeaderCell {
            label: field.header().to_string(),
            sort: sort.filter(|o| o.key == field).map(|o| o.ascending),
            selected: field.index() == model.cursor_column(),
        })
        .collect();

    let rows: Vec<Vec<String>> = view.rows.iter().map(|c| c.values()).collect();
    let selected_row = if rows.is_empty() {
        None
    } else {
        Some(model.cursor_row().min(rows.len() - 1))
    };

    let summary = if view.matching == view.total {
        format!("{} contacts", view.total)
    } else {
        format!("{} of {} contacts", view.matching, view.total)
    };

    let search = model.cmd_input().map(|(input, mode)| SearchLine {
        prompt: match mode {
            CMDMode::Filter => "/",
        },
        input: input.input.clone(),
        curser_pos: input.curser_pos,
    });

    RenderedPage {
        title: format!(" Contacts @ {} ", model.base_url()),
        headers,
        rows,
        selected_row,
        page_info: page_info(view.page, view.max_page),
        pagination: pagination(view.page, view.max_page),
        summary,
        filter: model.state().filter_text.clone(),
        search,
        status: model.status_message().to_string(),
        loading: model.fetch_pending(),
        popup: model.popup().cloned(),
    }
}
