use crate::document::Node;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// The declared type of a schema attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    String,
    Integer,
    /// Literal `true` / `false`.
    Boolean,
    /// Calendar date; a trailing `Z`, UTC offset or time part is accepted and dropped.
    Date,
    /// RFC 3339 instant, or a naive `YYYY-MM-DDTHH:MM:SS` read as UTC.
    DateTime,
    /// The matched element itself, kept as a subtree.
    Raw,
}

impl ValueType {
    pub const fn name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::DateTime => "date-time",
            Self::Raw => "raw subtree",
        }
    }
}

/// A coerced attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    String(String),
    Integer(i64),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Raw(Node),
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Self::String(_) => ValueType::String,
            Self::Integer(_) => ValueType::Integer,
            Self::Boolean(_) => ValueType::Boolean,
            Self::Date(_) => ValueType::Date,
            Self::DateTime(_) => ValueType::DateTime,
            Self::Raw(_) => ValueType::Raw,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            _ => None,
        }
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Self::Raw(node) => Some(node),
            _ => None,
        }
    }

    /// Coerces node text to `value_type`.
    ///
    /// `Raw` cannot be produced from text alone; callers holding the element
    /// build `Value::Raw` directly.
    pub fn coerce(text: &str, value_type: ValueType) -> Result<Self, String> {
        match value_type {
            ValueType::String => Ok(Self::String(text.to_string())),
            ValueType::Integer => text
                .trim()
                .parse::<i64>()
                .map(Self::Integer)
                .map_err(|e| format!("{:?} is not an integer: {e}", text.trim())),
            ValueType::Boolean => match text.trim() {
                "true" => Ok(Self::Boolean(true)),
                "false" => Ok(Self::Boolean(false)),
                other => Err(format!("{other:?} is not a boolean")),
            },
            ValueType::Date => parse_date(text.trim()).map(Self::Date),
            ValueType::DateTime => parse_datetime(text.trim()).map(Self::DateTime),
            ValueType::Raw => Err("raw subtree requires an element match".to_string()),
        }
    }
}

fn parse_date(text: &str) -> Result<NaiveDate, String> {
    let invalid = || format!("{text:?} is not a date");
    // Birthdays and due dates often arrive as midnight date-times; keep the
    // calendar date as written rather than shifting it to UTC.
    if let Some((date, _)) = text.split_once('T') {
        parse_datetime(text).map_err(|_| invalid())?;
        return NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| invalid());
    }
    let (date, zone) = match (text.get(..10), text.get(10..)) {
        (Some(date), Some(zone)) => (date, zone),
        _ => return Err(invalid()),
    };
    let zone_ok = zone.is_empty()
        || zone == "Z"
        || (zone.len() == 6
            && zone.starts_with(['+', '-'])
            && chrono::NaiveTime::parse_from_str(&zone[1..], "%H:%M").is_ok());
    if !zone_ok {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| invalid())
}

fn parse_datetime(text: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| format!("{text:?} is not a date-time"))
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Integer(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Self::Date(d)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::DateTime(dt)
    }
}
