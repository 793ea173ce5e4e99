use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, error, info, trace};

use crate::config::TVConfig;
use crate::contact::{Contact, ContactField};
use crate::domain::{CMDMode, FetchError, HELP_TEXT, Message};
use crate::inputter::{InputResult, Inputter};
use crate::pipeline;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Status {
    READY,
    LOADING,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Modus {
    TABLE,
    POPUP,
    CMDINPUT,
}

/// Side effects the event loop has to carry out for the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Fetch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub key: ContactField,
    pub ascending: bool,
}

/// Fetched rows plus the presentation state derived views are computed from.
///
/// `rows` keeps the order the service delivered; filter and sort only ever
/// work on references into it.
#[derive(Debug, Clone)]
pub struct ViewState {
    pub rows: Vec<Contact>,
    pub page: usize,
    pub page_size: usize,
    pub sort: Option<SortOrder>,
    pub filter_text: String,
}

/// The rows of the current page and the page metadata that goes with them.
#[derive(Debug)]
pub struct PageView<'a> {
    pub rows: Vec<&'a Contact>,
    pub page: usize,
    pub max_page: usize,
    pub total: usize,
    pub matching: usize,
}

impl ViewState {
    pub fn new(page_size: usize) -> Self {
        ViewState {
            rows: Vec::new(),
            page: 1,
            page_size: page_size.max(1),
            sort: None,
            filter_text: String::new(),
        }
    }

    /// Filtered and sorted rows, the set pages are cut from.
    ///
    /// Descending is the ascending order reversed, so toggling a column flips
    /// the visible order exactly, ties included.
    pub fn arranged(&self) -> Vec<&Contact> {
        let filtered = pipeline::filter(&self.rows, &self.filter_text);
        match self.sort {
            Some(order) => {
                let mut rows = pipeline::sort(filtered, order.key, true);
                if !order.ascending {
                    rows.reverse();
                }
                rows
            }
            None => filtered,
        }
    }

    pub fn derive(&self) -> PageView<'_> {
        let arranged = self.arranged();
        let matching = arranged.len();
        let max_page = pipeline::max_page(matching, self.page_size);
        let page = self.page.clamp(1, max_page);
        let rows = pipeline::paginate(&arranged, page, self.page_size).to_vec();
        PageView {
            rows,
            page,
            max_page,
            total: self.rows.len(),
            matching,
        }
    }

    pub fn max_page(&self) -> usize {
        pipeline::max_page(self.arranged().len(), self.page_size)
    }

    /// Move by `direction` pages, clamped into `[1, max_page]`.
    pub fn change_page(&mut self, direction: i64) {
        let requested = i64::try_from(self.page)
            .unwrap_or(i64::MAX)
            .saturating_add(direction);
        self.page = pipeline::clamp_page(requested, self.max_page());
    }

    pub fn goto_page(&mut self, page: i64) {
        self.page = pipeline::clamp_page(page, self.max_page());
    }

    /// Same key toggles the direction, a new key sorts ascending.
    pub fn sort_by(&mut self, key: ContactField) {
        self.sort = match self.sort {
            Some(order) if order.key == key => Some(SortOrder {
                key,
                ascending: !order.ascending,
            }),
            _ => Some(SortOrder {
                key,
                ascending: true,
            }),
        };
    }

    pub fn set_filter(&mut self, text: &str) {
        if self.filter_text != text {
            self.filter_text = text.to_string();
            self.page = 1;
        }
    }

    /// Change the page size while keeping the first row of the current page visible.
    pub fn set_page_size(&mut self, page_size: usize) {
        let first_row = (self.page.max(1) - 1) * self.page_size;
        self.page_size = page_size.max(1);
        self.page = first_row / self.page_size + 1;
        self.goto_page(self.page as i64);
    }

    pub fn replace_rows(&mut self, rows: Vec<Contact>) {
        self.rows = rows;
        self.page = 1;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub title: String,
    pub text: String,
}

pub struct Model {
    config: TVConfig,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    state: ViewState,
    cursor_row: usize,
    cursor_column: usize,
    popup: Option<Popup>,
    input: Inputter,
    last_input: InputResult,
    cmd_mode: Option<CMDMode>,
    fetch_pending: bool,
    status_message: String,
    clipboard: Option<Clipboard>,
}

impl Model {
    pub fn init(config: &TVConfig) -> Self {
        Self {
            config: config.clone(),
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            state: ViewState::new(config.page_size),
            cursor_row: 0,
            cursor_column: 0,
            popup: None,
            input: Inputter::default(),
            last_input: InputResult::default(),
            cmd_mode: None,
            fetch_pending: false,
            status_message: "Started ctv!".to_string(),
            clipboard: None,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn view(&self) -> PageView<'_> {
        self.state.derive()
    }

    pub fn cursor_row(&self) -> usize {
        self.cursor_row
    }

    pub fn cursor_column(&self) -> usize {
        self.cursor_column
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn cmd_input(&self) -> Option<(&InputResult, CMDMode)> {
        match (self.modus, self.cmd_mode) {
            (Modus::CMDINPUT, Some(mode)) => Some((&self.last_input, mode)),
            _ => None,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// True while key events should go to the command line unmapped.
    pub fn raw_keyevents(&self) -> bool {
        self.modus == Modus::CMDINPUT
    }

    pub fn fetch_pending(&self) -> bool {
        self.fetch_pending
    }

    pub fn selected_contact(&self) -> Option<&Contact> {
        self.view().rows.get(self.cursor_row).copied()
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Message) -> Option<Effect> {
        trace!("Update: Modus {:?}, Message {:?}", self.modus, message);
        match (self.modus, message) {
            (_, Message::Loaded(result)) => self.finish_fetch(result),
            (_, Message::Quit) => self.quit(),
            (Modus::CMDINPUT, Message::RawKey(key)) => self.raw_input(key),
            (Modus::POPUP, Message::Exit | Message::Enter | Message::Help) => self.close_popup(),
            (Modus::TABLE, msg) => return self.update_table(msg),
            (_, msg) => trace!("Ignoring {msg:?}"),
        }
        None
    }

    fn update_table(&mut self, message: Message) -> Option<Effect> {
        match message {
            Message::MoveUp => self.move_selection_up(),
            Message::MoveDown => self.move_selection_down(),
            Message::NextPage => self.change_page(1),
            Message::PrevPage => self.change_page(-1),
            Message::FirstPage => self.goto_page(1),
            Message::LastPage => self.goto_page(i64::MAX),
            Message::NextColumn => {
                self.cursor_column = (self.cursor_column + 1) % ContactField::ALL.len()
            }
            Message::PrevColumn => {
                self.cursor_column =
                    (self.cursor_column + ContactField::ALL.len() - 1) % ContactField::ALL.len()
            }
            Message::GrowPage => self.set_page_size(self.state.page_size + 1),
            Message::ShrinkPage => self.set_page_size(self.state.page_size.saturating_sub(1)),
            Message::Sort => {
                if let Some(field) = ContactField::from_index(self.cursor_column) {
                    self.sort_by(field);
                }
            }
            Message::SortColumn(idx) => {
                if let Some(field) = ContactField::from_index(idx) {
                    self.cursor_column = idx;
                    self.sort_by(field);
                }
            }
            Message::Filter => self.enter_cmd_mode(CMDMode::Filter),
            Message::Enter => self.show_selected_contact(),
            Message::Exit => {
                if !self.state.filter_text.is_empty() {
                    self.set_filter("");
                    self.set_status_message("Filter cleared");
                }
            }
            Message::CopyRow => self.copy_selected_row(),
            Message::Help => self.show_popup("Help", HELP_TEXT.to_string()),
            Message::Reload => return self.request_fetch(),
            msg => trace!("Ignoring {msg:?}"),
        }
        None
    }

    // ------------------------- Fetch handling ------------------------------ //

    /// Start a fetch unless one is already running.
    pub fn request_fetch(&mut self) -> Option<Effect> {
        if self.fetch_pending {
            debug!("Fetch already in flight, ignoring reload");
            self.set_status_message("Still loading ...");
            return None;
        }
        self.fetch_pending = true;
        self.status = Status::LOADING;
        self.set_status_message(format!("Loading contacts from {} ...", self.config.base_url));
        Some(Effect::Fetch)
    }

    pub fn finish_fetch(&mut self, result: Result<Vec<Contact>, FetchError>) {
        self.fetch_pending = false;
        if self.status == Status::LOADING {
            self.status = Status::READY;
        }
        match result {
            Ok(rows) => {
                let unchanged = rows == self.state.rows;
                let n = rows.len();
                self.state.replace_rows(rows);
                self.cursor_row = 0;
                info!("Loaded {n} contacts (unchanged: {unchanged})");
                if unchanged {
                    self.set_status_message(format!("Loaded {n} contacts, nothing changed"));
                } else {
                    self.set_status_message(format!("Loaded {n} contacts"));
                }
            }
            Err(e) => {
                error!("Error fetching data: {e}");
                self.set_status_message(format!("Error fetching data: {e}"));
            }
        }
    }

    // ------------------------- View state ---------------------------------- //

    pub fn change_page(&mut self, direction: i64) {
        self.state.change_page(direction);
        self.clamp_cursor();
        trace!("Page {}/{}", self.state.page, self.state.max_page());
    }

    pub fn goto_page(&mut self, page: i64) {
        self.state.goto_page(page);
        self.clamp_cursor();
    }

    pub fn sort_by(&mut self, field: ContactField) {
        self.state.sort_by(field);
        trace!("Sort {:?}", self.state.sort.map(|o| (o.key.key(), o.ascending)));
        if let Some(order) = self.state.sort {
            let direction = if order.ascending { "ascending" } else { "descending" };
            self.set_status_message(format!("Sorted by {} {direction}", field.header()));
        }
    }

    pub fn set_filter(&mut self, text: &str) {
        self.state.set_filter(text);
        self.clamp_cursor();
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.state.set_page_size(page_size);
        self.clamp_cursor();
        self.set_status_message(format!("{} rows per page", self.state.page_size));
    }

    fn clamp_cursor(&mut self) {
        let len = self.view().rows.len();
        self.cursor_row = self.cursor_row.min(len.saturating_sub(1));
    }

    fn move_selection_up(&mut self) {
        if self.cursor_row > 0 {
            self.cursor_row -= 1;
        } else if self.state.page > 1 {
            self.change_page(-1);
            self.cursor_row = self.view().rows.len().saturating_sub(1);
        }
    }

    fn move_selection_down(&mut self) {
        let view = self.view();
        let (len, page, max_page) = (view.rows.len(), view.page, view.max_page);
        if self.cursor_row + 1 < len {
            self.cursor_row += 1;
        } else if page < max_page {
            self.change_page(1);
            self.cursor_row = 0;
        }
    }

    // ------------------------- Popups and input ---------------------------- //

    fn show_popup(&mut self, title: &str, text: String) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
        self.popup = Some(Popup {
            title: title.to_string(),
            text,
        });
    }

    fn close_popup(&mut self) {
        trace!("Close popup ...");
        self.popup = None;
        self.modus = self.previous_modus;
        self.previous_modus = Modus::POPUP;
    }

    fn show_selected_contact(&mut self) {
        let Some(contact) = self.selected_contact() else {
            return;
        };
        let width = ContactField::ALL
            .iter()
            .map(|f| f.header().len())
            .max()
            .unwrap_or(0);
        let text = ContactField::ALL
            .iter()
            .map(|&f| format!("{:<width$}  {}", f.header(), contact.value(f)))
            .collect::<Vec<String>>()
            .join("\n");
        let title = format!("Contact {}", contact.id);
        self.show_popup(&title, text);
    }

    fn enter_cmd_mode(&mut self, mode: CMDMode) {
        trace!("Entering command mode {mode:?} ...");
        self.previous_modus = self.modus;
        self.modus = Modus::CMDINPUT;
        self.cmd_mode = Some(mode);
        self.input.clear();
        if mode == CMDMode::Filter {
            self.input.set(&self.state.filter_text);
        }
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        self.last_input = self.input.read(key);
        match self.cmd_mode {
            // The filter follows every keystroke, Esc clears it.
            Some(CMDMode::Filter) => {
                let text = self.last_input.input.clone();
                self.set_filter(&text);
            }
            None => {}
        }
        if self.last_input.finished {
            self.leave_cmd_mode();
        }
    }

    fn leave_cmd_mode(&mut self) {
        trace!("Handle cmd input {}", self.last_input.input);
        self.modus = self.previous_modus;
        self.previous_modus = Modus::CMDINPUT;
        if self.cmd_mode == Some(CMDMode::Filter) {
            let view = self.view();
            let msg = if self.last_input.canceled || self.state.filter_text.is_empty() {
                "Filter cleared".to_string()
            } else {
                format!("{} of {} contacts match", view.matching, view.total)
            };
            self.set_status_message(msg);
        }
        self.cmd_mode = None;
    }

    fn copy_selected_row(&mut self) {
        let Some(row) = self.selected_contact().map(Contact::as_csv) else {
            return;
        };
        trace!("Row content: {}", row);

        if self.clipboard.is_none() {
            match Clipboard::new() {
                Ok(clipboard) => self.clipboard = Some(clipboard),
                Err(e) => {
                    error!("Clipboard unavailable: {e:?}");
                    self.set_status_message("Clipboard unavailable");
                    return;
                }
            }
        }
        let copied = self.clipboard.as_mut().map(|c| c.set_text(row));
        match copied {
            Some(Ok(_)) => self.set_status_message("Copied contact to clipboard"),
            Some(Err(e)) => {
                error!("Error copying to clipboard: {e:?}");
                self.set_status_message("Copy to clipboard failed");
            }
            None => {}
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::sample;
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    fn contacts(n: i64) -> Vec<Contact> {
        (1..=n)
            .map(|i| sample(i, &format!("First{i}"), &format!("Last{i:02}")))
            .collect()
    }

    fn loaded_model(n: i64, page_size: usize) -> Model {
        let mut model = Model::init(&TVConfig::default().page_size(page_size));
        assert_eq!(model.request_fetch(), Some(Effect::Fetch));
        model.update(Message::Loaded(Ok(contacts(n))));
        model
    }

    fn page_ids(model: &Model) -> Vec<i64> {
        model.view().rows.iter().map(|c| c.id).collect()
    }

    fn key(code: KeyCode) -> Message {
        Message::RawKey(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn starts_empty_on_page_one() {
        let model = Model::init(&TVConfig::default());
        let view = model.view();
        assert_eq!(view.page, 1);
        assert_eq!(view.max_page, 1);
        assert!(view.rows.is_empty());
    }

    #[test]
    fn pages_of_twenty_five() {
        let mut model = loaded_model(25, 10);
        assert_eq!(model.view().max_page, 3);
        assert_eq!(page_ids(&model), (1..=10).collect::<Vec<_>>());
        model.update(Message::NextPage);
        model.update(Message::NextPage);
        assert_eq!(page_ids(&model), (21..=25).collect::<Vec<_>>());
    }

    #[test]
    fn change_page_always_clamps() {
        let mut model = loaded_model(25, 10);
        for direction in [-1000, -1, 0, 1, 2, 7, i64::MAX, i64::MIN] {
            model.change_page(direction);
            let page = model.state().page;
            assert!((1..=3).contains(&page), "page {page} after {direction}");
        }
        model.change_page(i64::MIN);
        assert_eq!(model.state().page, 1);
        model.update(Message::LastPage);
        assert_eq!(model.state().page, 3);
        model.update(Message::FirstPage);
        assert_eq!(model.state().page, 1);
    }

    #[test]
    fn sorting_same_column_twice_reverses() {
        let mut model = loaded_model(25, 100);
        model.update(Message::SortColumn(ContactField::LastName.index()));
        let first = page_ids(&model);
        assert_eq!(first, (1..=25).collect::<Vec<_>>());
        model.update(Message::SortColumn(ContactField::LastName.index()));
        let mut second = page_ids(&model);
        second.reverse();
        assert_eq!(first, second);
        // The fetched list keeps its order.
        let source: Vec<i64> = model.state().rows.iter().map(|c| c.id).collect();
        assert_eq!(source, (1..=25).collect::<Vec<_>>());
    }

    #[test]
    fn toggling_sort_on_ties_reverses_exactly() {
        let mut model = loaded_model(12, 100);
        // all sample rows share one city
        let city = ContactField::City.index();
        model.update(Message::SortColumn(city));
        let first = page_ids(&model);
        assert_eq!(first, (1..=12).collect::<Vec<_>>());
        model.update(Message::SortColumn(city));
        assert_eq!(page_ids(&model), (1..=12).rev().collect::<Vec<_>>());
        model.update(Message::SortColumn(city));
        assert_eq!(page_ids(&model), first);
    }

    #[test]
    fn new_sort_key_starts_ascending() {
        let mut model = loaded_model(5, 10);
        model.update(Message::SortColumn(0));
        model.update(Message::SortColumn(0));
        assert_eq!(model.state().sort.map(|o| o.ascending), Some(false));
        model.update(Message::SortColumn(1));
        assert_eq!(
            model.state().sort,
            Some(SortOrder {
                key: ContactField::FirstName,
                ascending: true
            })
        );
    }

    #[test]
    fn cursor_column_sort() {
        let mut model = loaded_model(5, 10);
        model.update(Message::NextColumn);
        model.update(Message::PrevColumn);
        model.update(Message::PrevColumn);
        assert_eq!(model.cursor_column(), ContactField::ALL.len() - 1);
        model.update(Message::Sort);
        assert_eq!(model.state().sort.map(|o| o.key), Some(ContactField::Country));
    }

    #[test]
    fn filter_input_is_live_and_resets_page() {
        let mut model = loaded_model(25, 10);
        model.update(Message::LastPage);
        model.update(Message::Filter);
        assert!(model.raw_keyevents());
        for c in "last2".chars() {
            model.update(key(KeyCode::Char(c)));
        }
        assert_eq!(model.state().page, 1);
        assert_eq!(page_ids(&model), vec![20, 21, 22, 23, 24, 25]);
        model.update(key(KeyCode::Enter));
        assert!(!model.raw_keyevents());
        assert_eq!(model.state().filter_text, "last2");
        assert_eq!(model.status_message(), "6 of 25 contacts match");

        model.update(Message::Exit);
        assert_eq!(model.state().filter_text, "");
        assert_eq!(model.view().matching, 25);
    }

    #[test]
    fn escape_cancels_filter() {
        let mut model = loaded_model(25, 10);
        model.update(Message::Filter);
        model.update(key(KeyCode::Char('z')));
        assert_eq!(model.view().matching, 0);
        assert_eq!(model.view().max_page, 1);
        model.update(key(KeyCode::Esc));
        assert_eq!(model.view().matching, 25);
        assert!(!model.raw_keyevents());
    }

    #[test]
    fn reload_while_pending_is_ignored() {
        let mut model = Model::init(&TVConfig::default());
        assert_eq!(model.update(Message::Reload), Some(Effect::Fetch));
        assert_eq!(model.status, Status::LOADING);
        assert_eq!(model.update(Message::Reload), None);
        model.update(Message::Loaded(Ok(contacts(3))));
        assert_eq!(model.status, Status::READY);
        assert_eq!(model.update(Message::Reload), Some(Effect::Fetch));
    }

    #[test]
    fn failed_fetch_keeps_previous_rows() {
        let mut model = loaded_model(25, 10);
        model.update(Message::NextPage);
        model.request_fetch();
        model.update(Message::Loaded(Err(FetchError::Status(503))));
        assert!(!model.fetch_pending());
        assert_eq!(model.state().rows.len(), 25);
        assert_eq!(model.state().page, 2);
        assert!(model.status_message().contains("503"));
    }

    #[test]
    fn successful_refetch_resets_page() {
        let mut model = loaded_model(25, 10);
        model.update(Message::LastPage);
        model.request_fetch();
        model.update(Message::Loaded(Ok(contacts(25))));
        assert_eq!(model.state().page, 1);
        assert!(model.status_message().contains("nothing changed"));
    }

    #[test]
    fn cursor_walks_across_pages() {
        let mut model = loaded_model(12, 5);
        for _ in 0..5 {
            model.update(Message::MoveDown);
        }
        assert_eq!(model.state().page, 2);
        assert_eq!(model.cursor_row(), 0);
        assert_eq!(model.selected_contact().map(|c| c.id), Some(6));
        model.update(Message::MoveUp);
        assert_eq!(model.state().page, 1);
        assert_eq!(model.selected_contact().map(|c| c.id), Some(5));
        model.update(Message::LastPage);
        assert_eq!(model.selected_contact().map(|c| c.id), Some(12));
    }

    #[test]
    fn page_size_change_keeps_first_row_visible() {
        let mut model = loaded_model(25, 10);
        model.update(Message::NextPage);
        model.set_page_size(4);
        // Row 11 lives on page 3 with four rows per page.
        assert_eq!(model.state().page, 3);
        assert_eq!(page_ids(&model), vec![9, 10, 11, 12]);
        model.set_page_size(0);
        assert_eq!(model.state().page_size, 1);
    }

    #[test]
    fn contact_popup_and_help() {
        let mut model = loaded_model(3, 10);
        model.update(Message::MoveDown);
        model.update(Message::Enter);
        let popup = model.popup().unwrap();
        assert_eq!(popup.title, "Contact 2");
        assert!(popup.text.contains("Last name"));
        assert!(popup.text.contains("Last02"));
        // Navigation is blocked while the popup is open.
        model.update(Message::NextPage);
        model.update(Message::Exit);
        assert!(model.popup().is_none());
        model.update(Message::Help);
        assert_eq!(model.popup().map(|p| p.title.as_str()), Some("Help"));
    }

    #[test]
    fn quit_from_any_mode() {
        let mut model = loaded_model(3, 10);
        model.update(Message::Filter);
        model.update(Message::Quit);
        assert_eq!(model.status, Status::QUITTING);
    }
}
