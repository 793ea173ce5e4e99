use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderValue};
use serde_json::Value;
use tracing::{debug, info, instrument};
use url::Url;

use crate::contact::Contact;
use crate::domain::FetchError;

pub const CONTACTS_PATH: &str = "/api/contacts/all";

/// Fetches the complete contact list from the contacts service.
#[derive(Debug, Clone)]
pub struct ContactsLoader {
    client: Client,
    base_url: String,
}

impl ContactsLoader {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }

    /// `CONTACTS_PATH` appended to the base url, keeping any path prefix the base carries.
    pub fn endpoint(&self) -> Result<Url, FetchError> {
        let mut base = Url::parse(&self.base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(base.join(CONTACTS_PATH.trim_start_matches('/'))?)
    }

    /// One GET, no retries. Anything but a JSON array of contacts is an error.
    #[instrument(skip(self), fields(base_url = %self.base_url))]
    pub async fn load(&self) -> Result<Vec<Contact>, FetchError> {
        let url = self.endpoint()?;
        debug!("GET {url}");

        let rsp = self
            .client
            .get(url)
            .header(ACCEPT, HeaderValue::from_static("application/json"))
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = rsp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = rsp.json::<Value>().await.map_err(FetchError::Decode)?;
        let contacts = parse_contacts(body)?;
        info!("Fetched {} contacts", contacts.len());
        Ok(contacts)
    }
}

pub fn parse_contacts(body: Value) -> Result<Vec<Contact>, FetchError> {
    match body {
        Value::Array(items) => items
            .into_iter()
            .map(|item| serde_json::from_value(item).map_err(FetchError::from))
            .collect(),
        _ => Err(FetchError::NotAnArray),
    }
}
