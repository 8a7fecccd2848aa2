use crate::error::{CuppaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Column order shared by the CSV codec and every export.
pub const FIELDS: [&str; 6] = ["id", "type", "location", "price", "date", "notes"];

/// A single coffee purchase.
///
/// Every field is kept as text: `price` is only interpreted for display
/// aggregation and `date` is an ISO `yyyy-MM-dd` string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
    pub price: String,
    pub date: String,
    #[serde(default)]
    pub notes: String,
}

impl Expense {
    /// Builds an expense with a freshly generated id.
    pub fn new(draft: ExpenseDraft) -> Self {
        Self::with_id(new_expense_id(), draft)
    }

    pub fn with_id(id: impl Into<String>, draft: ExpenseDraft) -> Self {
        Self {
            id: id.into(),
            kind: draft.kind,
            location: draft.location,
            price: draft.price,
            date: draft.date,
            notes: draft.notes,
        }
    }

    pub fn draft(&self) -> ExpenseDraft {
        ExpenseDraft {
            kind: self.kind.clone(),
            location: self.location.clone(),
            price: self.price.clone(),
            date: self.date.clone(),
            notes: self.notes.clone(),
        }
    }

    /// Numeric price, if the text parses as a decimal.
    pub fn price_amount(&self) -> Option<f64> {
        self.price.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }

    /// Value of a column by its CSV header name.
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "id" => Some(&self.id),
            "type" => Some(&self.kind),
            "location" => Some(&self.location),
            "price" => Some(&self.price),
            "date" => Some(&self.date),
            "notes" => Some(&self.notes),
            _ => None,
        }
    }

    /// Sets a column by its CSV header name. Unknown columns are ignored.
    pub fn set_field(&mut self, name: &str, value: String) {
        match name {
            "id" => self.id = value,
            "type" => self.kind = value,
            "location" => self.location = value,
            "price" => self.price = value,
            "date" => self.date = value,
            "notes" => self.notes = value,
            _ => {}
        }
    }

    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.id.len());
        &self.id[..end]
    }

    /// Checks required-field presence. Nothing beyond presence is validated.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(CuppaError::MissingField("id"));
        }
        self.draft().validate()
    }
}

/// An expense without its id: the payload of a full-record update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseDraft {
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
    pub price: String,
    pub date: String,
    #[serde(default)]
    pub notes: String,
}

impl ExpenseDraft {
    pub fn new(
        kind: impl Into<String>,
        location: impl Into<String>,
        price: impl Into<String>,
        date: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            location: location.into(),
            price: price.into(),
            date: date.into(),
            notes: String::new(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.kind.trim().is_empty() {
            return Err(CuppaError::MissingField("type"));
        }
        if self.location.trim().is_empty() {
            return Err(CuppaError::MissingField("location"));
        }
        if self.price.trim().is_empty() {
            return Err(CuppaError::MissingField("price"));
        }
        Ok(())
    }
}

pub fn new_expense_id() -> String {
    Uuid::new_v4().to_string()
}

/// Opaque token identifying one stored version of the record set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Revision(String);

impl Revision {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The full record set together with the revision it was read at.
/// `revision` is `None` when nothing has been stored yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    pub records: Vec<Expense>,
    pub revision: Option<Revision>,
}

impl Snapshot {
    pub fn new(records: Vec<Expense>, revision: Option<Revision>) -> Self {
        Self { records, revision }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records.iter().any(|e| e.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latte() -> ExpenseDraft {
        ExpenseDraft::new("Latte", "Cafe A", "150", "2024-01-01")
    }

    #[test]
    fn new_generates_distinct_ids() {
        let a = Expense::new(latte());
        let b = Expense::new(latte());
        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
    }

    #[test]
    fn serializes_kind_as_type() {
        let e = Expense::with_id("x1", latte());
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "Latte");
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn missing_notes_deserializes_empty() {
        let e: Expense = serde_json::from_str(
            r#"{"id":"1","type":"Mocha","location":"Home","price":"80","date":"2024-02-02"}"#,
        )
        .unwrap();
        assert_eq!(e.notes, "");
    }

    #[test]
    fn validate_requires_type_location_price() {
        assert!(latte().validate().is_ok());

        let mut d = latte();
        d.kind = "  ".into();
        assert!(matches!(d.validate(), Err(CuppaError::MissingField("type"))));

        let mut d = latte();
        d.location.clear();
        assert!(matches!(
            d.validate(),
            Err(CuppaError::MissingField("location"))
        ));

        let mut d = latte();
        d.price.clear();
        assert!(matches!(d.validate(), Err(CuppaError::MissingField("price"))));
    }

    #[test]
    fn notes_and_date_are_optional() {
        let d = ExpenseDraft::new("Latte", "Cafe A", "150", "");
        assert!(d.validate().is_ok());
    }

    #[test]
    fn price_amount_parses_decimal_text() {
        let mut e = Expense::with_id("1", latte());
        assert_eq!(e.price_amount(), Some(150.0));
        e.price = " 12.5 ".into();
        assert_eq!(e.price_amount(), Some(12.5));
        e.price = "free".into();
        assert_eq!(e.price_amount(), None);
    }

    #[test]
    fn short_id_truncates_to_eight_chars() {
        let e = Expense::with_id("0123456789abcdef", latte());
        assert_eq!(e.short_id(), "01234567");
        let e = Expense::with_id("abc", latte());
        assert_eq!(e.short_id(), "abc");
    }

    #[test]
    fn field_accessors_follow_header_names() {
        let mut e = Expense::with_id("1", latte());
        for name in FIELDS {
            assert!(e.field(name).is_some());
        }
        e.set_field("type", "Cortado".into());
        e.set_field("unknown", "ignored".into());
        assert_eq!(e.kind, "Cortado");
        assert_eq!(e.field("unknown"), None);
    }
}
