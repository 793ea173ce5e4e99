use ratatui::crossterm::event::KeyEvent;

use crate::contact::Contact;

pub const HELP_TEXT: &str = "\
Navigation
  ←/h  →/l      previous / next page
  ↑/k  ↓/j      move selection
  g / G         first / last page
  + / -         more / fewer rows per page

Table
  s             sort by selected column (again to reverse)
  1-9, 0        sort by column 1-10
  Tab / S-Tab   select next / previous column
  /             filter contacts
  Enter         show selected contact
  y             copy selected contact as CSV
  r             reload contacts

  ?             this help
  Esc           close popup / clear filter
  q             quit";

#[derive(Debug, thiserror::Error)]
pub enum TVError {
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("could not set up logging: {0}")]
    Logging(String),
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("server answered with HTTP {0}")]
    Status(u16),
    #[error("response is not valid JSON: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("unexpected data format: expected an array")]
    NotAnArray,
    #[error("unexpected contact record: {0}")]
    Shape(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("render target missing: {0}")]
    RenderTargetMissing(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CMDMode {
    Filter,
}

#[derive(Debug)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    NextPage,
    PrevPage,
    FirstPage,
    LastPage,
    NextColumn,
    PrevColumn,
    GrowPage,
    ShrinkPage,
    Sort,
    SortColumn(usize),
    Filter,
    Enter,
    Exit,
    CopyRow,
    Reload,
    Help,
    RawKey(KeyEvent),
    Loaded(Result<Vec<Contact>, FetchError>),
}
