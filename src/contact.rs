use serde::{Deserialize, Serialize};

/// One address book record as delivered by `/api/contacts/all`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ContactRecord")]
pub struct Contact {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone1: String,
    pub phone2: String,
    pub street: String,
    pub city: String,
    pub post_code: String,
    pub country: String,
}

/// Wire shape of a contact. Missing and `null` text fields become "".
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContactRecord {
    id: i64,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    // Older backends ship the same column as `secondName`.
    #[serde(default)]
    second_name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    phone1: Option<String>,
    #[serde(default)]
    phone2: Option<String>,
    #[serde(default)]
    street: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    post_code: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

impl From<ContactRecord> for Contact {
    fn from(r: ContactRecord) -> Self {
        Contact {
            id: r.id,
            first_name: r.first_name.unwrap_or_default(),
            last_name: r.last_name.or(r.second_name).unwrap_or_default(),
            email: r.email.unwrap_or_default(),
            phone1: r.phone1.unwrap_or_default(),
            phone2: r.phone2.unwrap_or_default(),
            street: r.street.unwrap_or_default(),
            city: r.city.unwrap_or_default(),
            post_code: r.post_code.unwrap_or_default(),
            country: r.country.unwrap_or_default(),
        }
    }
}

/// Column keys of the contacts table in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactField {
    Id,
    FirstName,
    LastName,
    Email,
    Phone1,
    Phone2,
    Street,
    City,
    PostCode,
    Country,
}

impl ContactField {
    pub const ALL: [ContactField; 10] = [
        ContactField::Id,
        ContactField::FirstName,
        ContactField::LastName,
        ContactField::Email,
        ContactField::Phone1,
        ContactField::Phone2,
        ContactField::Street,
        ContactField::City,
        ContactField::PostCode,
        ContactField::Country,
    ];

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }

    pub fn index(self) -> usize {
        // ALL is exhaustive, the lookup cannot miss.
        Self::ALL.iter().position(|&f| f == self).unwrap_or(0)
    }

    /// JSON key of the field.
    pub fn key(self) -> &'static str {
        match self {
            ContactField::Id => "id",
            ContactField::FirstName => "firstName",
            ContactField::LastName => "lastName",
            ContactField::Email => "email",
            ContactField::Phone1 => "phone1",
            ContactField::Phone2 => "phone2",
            ContactField::Street => "street",
            ContactField::City => "city",
            ContactField::PostCode => "postCode",
            ContactField::Country => "country",
        }
    }

    pub fn header(self) -> &'static str {
        match self {
            ContactField::Id => "ID",
            ContactField::FirstName => "First name",
            ContactField::LastName => "Last name",
            ContactField::Email => "Email",
            ContactField::Phone1 => "Phone 1",
            ContactField::Phone2 => "Phone 2",
            ContactField::Street => "Street",
            ContactField::City => "City",
            ContactField::PostCode => "Post code",
            ContactField::Country => "Country",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ContactField::Id)
    }
}

impl Contact {
    /// Display value of a single column.
    pub fn value(&self, field: ContactField) -> String {
        match field {
            ContactField::Id => self.id.to_string(),
            _ => self.text(field).to_string(),
        }
    }

    /// Borrowed text of a column. `id` has no text form and yields "".
    pub fn text(&self, field: ContactField) -> &str {
        match field {
            ContactField::Id => "",
            ContactField::FirstName => &self.first_name,
            ContactField::LastName => &self.last_name,
            ContactField::Email => &self.email,
            ContactField::Phone1 => &self.phone1,
            ContactField::Phone2 => &self.phone2,
            ContactField::Street => &self.street,
            ContactField::City => &self.city,
            ContactField::PostCode => &self.post_code,
            ContactField::Country => &self.country,
        }
    }

    pub fn values(&self) -> Vec<String> {
        ContactField::ALL.iter().map(|&f| self.value(f)).collect()
    }

    /// All column values joined by a single space, the text a row filter matches against.
    pub fn row_text(&self) -> String {
        self.values().join(" ")
    }

    /// CSV line of all values, quoting cells that contain separators or quotes.
    pub fn as_csv(&self) -> String {
        self.values()
            .iter()
            .map(|c| wrap_cell_content(c))
            .collect::<Vec<String>>()
            .join(",")
    }
}

fn wrap_cell_content(c: &str) -> String {
    let needs_escaping = c.contains('"');
    let needs_wrapping = needs_escaping || c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
    let mut out = String::from(c);

    if needs_escaping {
        out = out.replace('"', "\"\"");
    }
    if needs_wrapping {
        out = format!("\"{out}\"");
    }
    out
}

#[cfg(test)]
pub(crate) fn sample(id: i64, first_name: &str, last_name: &str) -> Contact {
    Contact {
        id,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email: format!("{}@example.com", first_name.to_lowercase()),
        city: "Vilnius".to_string(),
        country: "Lithuania".to_string(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_payload() {
        let json = r#"{"id": 7, "firstName": "Ona", "lastName": "Petraitė", "email": "ona@x.lt",
            "phone1": "+370 600", "phone2": null, "street": "Gedimino 1", "city": "Vilnius",
            "postCode": "01103", "country": "Lithuania"}"#;
        let c: Contact = serde_json::from_str(json).unwrap();
        assert_eq!(c.id, 7);
        assert_eq!(c.last_name, "Petraitė");
        assert_eq!(c.phone2, "");
        assert_eq!(c.post_code, "01103");
    }

    #[test]
    fn legacy_second_name_maps_to_last_name() {
        let c: Contact =
            serde_json::from_str(r#"{"id": 1, "firstName": "Jonas", "secondName": "Jonaitis"}"#)
                .unwrap();
        assert_eq!(c.last_name, "Jonaitis");
        assert_eq!(c.value(ContactField::LastName), "Jonaitis");
    }

    #[test]
    fn last_name_wins_over_second_name() {
        let c: Contact = serde_json::from_str(
            r#"{"id": 1, "firstName": "Jonas", "lastName": "Jonaitis", "secondName": "Old"}"#,
        )
        .unwrap();
        assert_eq!(c.last_name, "Jonaitis");
        let c: Contact = serde_json::from_str(
            r#"{"id": 2, "firstName": "Ona", "lastName": null, "secondName": "Onaitė"}"#,
        )
        .unwrap();
        assert_eq!(c.last_name, "Onaitė");
    }

    #[test]
    fn missing_id_is_rejected() {
        assert!(serde_json::from_str::<Contact>(r#"{"firstName": "Jonas"}"#).is_err());
    }

    #[test]
    fn field_index_lookup() {
        assert_eq!(ContactField::from_index(2), Some(ContactField::LastName));
        assert_eq!(ContactField::from_index(10), None);
        for (idx, f) in ContactField::ALL.iter().enumerate() {
            assert_eq!(f.index(), idx);
        }
        assert!(ContactField::Id.is_numeric());
        assert!(!ContactField::PostCode.is_numeric());
    }

    #[test]
    fn csv_line_quotes_cells() {
        let mut c = sample(3, "Ann", "O\"Neil");
        c.street = "Main St, 5".to_string();
        let csv = c.as_csv();
        assert!(csv.starts_with("3,Ann,\"O\"\"Neil\",ann@example.com,"));
        assert!(csv.contains(",\"Main St, 5\",Vilnius,"));
    }
}
