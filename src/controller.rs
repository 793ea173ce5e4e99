use std::time::Duration;
use tracing::trace;

use ratatui::crossterm::event::{self, Event, KeyCode, KeyModifiers};

use crate::config::TVConfig;
use crate::domain::{Message, TVError};
use crate::model::Model;

pub struct Controller {
    event_poll_time: u64,
}

impl Controller {
    pub fn new(cfg: &TVConfig) -> Self {
        Self {
            event_poll_time: cfg.event_poll_time,
        }
    }

    /// Wait up to the poll time for a key press and map it to a message.
    pub fn handle_event(&self, model: &Model) -> Result<Option<Message>, TVError> {
        if event::poll(Duration::from_millis(self.event_poll_time))?
            && let Event::Key(key) = event::read()?
            && key.kind == event::KeyEventKind::Press
        {
            if model.raw_keyevents() {
                return Ok(Some(Message::RawKey(key)));
            }
            return Ok(self.handle_key(key));
        }
        Ok(None)
    }

    pub fn handle_key(&self, key: event::KeyEvent) -> Option<Message> {
        let message = match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(Message::Quit),
            (KeyCode::Char('q'), _) => Some(Message::Quit),
            (KeyCode::Up | KeyCode::Char('k'), _) => Some(Message::MoveUp),
            (KeyCode::Down | KeyCode::Char('j'), _) => Some(Message::MoveDown),
            (KeyCode::Right | KeyCode::Char('l') | KeyCode::PageDown, _) => Some(Message::NextPage),
            (KeyCode::Left | KeyCode::Char('h') | KeyCode::PageUp, _) => Some(Message::PrevPage),
            (KeyCode::Home | KeyCode::Char('g'), _) => Some(Message::FirstPage),
            (KeyCode::End | KeyCode::Char('G'), _) => Some(Message::LastPage),
            (KeyCode::Tab, _) => Some(Message::NextColumn),
            (KeyCode::BackTab, _) => Some(Message::PrevColumn),
            (KeyCode::Char('+'), _) => Some(Message::GrowPage),
            (KeyCode::Char('-'), _) => Some(Message::ShrinkPage),
            (KeyCode::Char('s'), _) => Some(Message::Sort),
            (KeyCode::Char(c @ '0'..='9'), _) => c
                .to_digit(10)
                // `0` is the tenth column, like on a keyboard row.
                .map(|d| Message::SortColumn((d as usize + 9) % 10)),
            (KeyCode::Char('/') | KeyCode::Char('f'), _) => Some(Message::Filter),
            (KeyCode::Enter, _) => Some(Message::Enter),
            (KeyCode::Esc, _) => Some(Message::Exit),
            (KeyCode::Char('y'), _) => Some(Message::CopyRow),
            (KeyCode::Char('r'), _) => Some(Message::Reload),
            (KeyCode::Char('?'), _) => Some(Message::Help),
            _ => None,
        };
        trace!("Mapped: {key:?} => {message:?}");
        message
    }
}
