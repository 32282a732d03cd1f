//! Calendar items (meetings and appointments).

use crate::entity::Entity;
use crate::kind::EntityKind;
use crate::record::ExtractedRecord;
use crate::schema::{ExtractionSchema, FieldDef};
use crate::value::Value;
use chrono::{DateTime, NaiveDate, Utc};
use ewskit_types::ItemId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarItem;

static SCHEMA: LazyLock<ExtractionSchema> = LazyLock::new(|| {
    let mailbox = || {
        ExtractionSchema::new(
            "attendee",
            vec![
                FieldDef::string("name", "t:Mailbox/t:Name"),
                FieldDef::string("email", "t:Mailbox/t:EmailAddress"),
                FieldDef::string("response", "t:ResponseType"),
                FieldDef::datetime("last_response", "t:LastResponseTime"),
            ],
        )
    };

    ExtractionSchema::new(
        "calendar_item",
        vec![
            FieldDef::string("subject", "t:Subject"),
            FieldDef::string("location", "t:Location"),
            FieldDef::string("availability", "t:LegacyFreeBusyStatus"),
            FieldDef::datetime("start", "t:Start"),
            FieldDef::datetime("end", "t:End"),
            FieldDef::string("timezone", "t:TimeZone"),
            FieldDef::datetime("created_at", "t:DateTimeCreated"),
            FieldDef::boolean("is_cancelled", "t:IsCancelled"),
            FieldDef::string("sensitivity", "t:Sensitivity"),
            FieldDef::string("html_body", r#"t:Body[@BodyType="HTML"]"#),
            FieldDef::string("text_body", r#"t:Body[@BodyType="Text"]"#),
            FieldDef::string("item_type", "t:CalendarItemType"),
            FieldDef::integer("reminder_minutes_before_start", "t:ReminderMinutesBeforeStart"),
            FieldDef::boolean("reminder_is_set", "t:ReminderIsSet"),
            FieldDef::datetime("last_modified_at", "t:LastModifiedTime"),
            FieldDef::boolean("is_all_day", "t:IsAllDayEvent"),
            FieldDef::string("conversation_id", "t:ConversationId/@Id"),
            FieldDef::string("recurrence_id", "t:RecurrenceId"),
            FieldDef::raw("recurrence", "t:Recurrence"),
            FieldDef::date("recurrence_end_date", "t:Recurrence/t:EndDateRecurrence/t:EndDate"),
            FieldDef::integer("recurrence_interval", "t:Recurrence/*/t:Interval"),
            FieldDef::string("recurrence_days", "t:Recurrence/t:WeeklyRecurrence/t:DaysOfWeek"),
        ],
    )
    .with_repeated(
        "organizer",
        "t:Organizer/t:Mailbox",
        ExtractionSchema::new(
            "organizer",
            vec![
                FieldDef::string("name", "t:Name"),
                FieldDef::string("email", "t:EmailAddress"),
            ],
        ),
    )
    .with_repeated("required_attendees", "t:RequiredAttendees/t:Attendee", mailbox())
    .with_repeated("optional_attendees", "t:OptionalAttendees/t:Attendee", mailbox())
    .with_repeated("resources", "t:Resources/t:Attendee", mailbox())
    .with_repeated(
        "conflicting_meetings",
        "t:ConflictingMeetings/t:CalendarItem/t:ItemId",
        ExtractionSchema::new("conflict", vec![FieldDef::string("id", "@Id")]),
    )
});

impl EntityKind for CalendarItem {
    const ELEMENT: &'static str = "t:CalendarItem";

    fn schema() -> &'static ExtractionSchema {
        &SCHEMA
    }

    fn validate(entity: &Entity<Self>) -> Result<(), String> {
        let start = entity.start();
        if let (Some(start), Some(end)) = (start, entity.end()) {
            if end < start {
                return Err("end must not be before start".to_string());
            }
        }

        let Some(pattern) = entity.recurrence_pattern() else {
            return Ok(());
        };

        match (entity.recurrence_end_date(), start) {
            (None, _) => return Err("recurrence_end_date is required".to_string()),
            (Some(end), Some(start)) if end < start.date_naive() => {
                return Err("recurrence_end_date must be after start".to_string());
            }
            _ => {}
        }

        let interval = entity.get("recurrence_interval").and_then(Value::as_i64);
        let in_range = |max: i64| interval.is_some_and(|i| (1..=max).contains(&i));
        match pattern {
            RecurrencePattern::Daily if !in_range(999) => {
                Err("recurrence_interval must be in the range from 1 to 999".to_string())
            }
            RecurrencePattern::Weekly | RecurrencePattern::Monthly if !in_range(99) => {
                Err("recurrence_interval must be in the range from 1 to 99".to_string())
            }
            RecurrencePattern::Weekly => {
                let days = entity
                    .get_str("recurrence_days")
                    .ok_or_else(|| "recurrence_days is required".to_string())?;
                match days.split_whitespace().find(|d| !WEEKLY_DAYS.contains(d)) {
                    Some(unknown) => Err(format!("recurrence_days received unknown value: {unknown}")),
                    None => Ok(()),
                }
            }
            _ => Ok(()),
        }
    }
}

const WEEKLY_DAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// `t:CalendarItemType` of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CalendarItemType {
    Single,
    Occurrence,
    Exception,
    RecurringMaster,
}

impl CalendarItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "Single",
            Self::Occurrence => "Occurrence",
            Self::Exception => "Exception",
            Self::RecurringMaster => "RecurringMaster",
        }
    }

    /// Occurrences and exceptions belong to a recurring master.
    pub fn has_master(&self) -> bool {
        matches!(self, Self::Occurrence | Self::Exception)
    }
}

impl FromStr for CalendarItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Single" => Ok(Self::Single),
            "Occurrence" => Ok(Self::Occurrence),
            "Exception" => Ok(Self::Exception),
            "RecurringMaster" => Ok(Self::RecurringMaster),
            other => Err(format!("unknown calendar item type: {other}")),
        }
    }
}

/// Recurrence pattern, derived from the pattern element inside `t:Recurrence`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecurrencePattern {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl RecurrencePattern {
    fn from_element(local: &str) -> Option<Self> {
        match local {
            "DailyRecurrence" => Some(Self::Daily),
            "WeeklyRecurrence" => Some(Self::Weekly),
            "AbsoluteMonthlyRecurrence" | "RelativeMonthlyRecurrence" => Some(Self::Monthly),
            "AbsoluteYearlyRecurrence" | "RelativeYearlyRecurrence" => Some(Self::Yearly),
            _ => None,
        }
    }
}

/// A meeting participant read from an attendee or organizer mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub name: Option<String>,
    pub email: String,
    pub response: Option<String>,
    pub last_response: Option<DateTime<Utc>>,
    pub required: bool,
}

impl Attendee {
    /// Entries without an email address are dropped.
    fn from_record(record: &ExtractedRecord, required: bool) -> Option<Self> {
        Some(Self {
            name: record.get_str("name").map(str::to_string),
            email: record.get_str("email")?.to_string(),
            response: record.get_str("response").map(str::to_string),
            last_response: record.get("last_response").and_then(Value::as_datetime),
            required,
        })
    }
}

impl Entity<CalendarItem> {
    pub fn subject(&self) -> Option<&str> {
        self.get_str("subject")
    }

    pub fn location(&self) -> Option<&str> {
        self.get_str("location")
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.get("start").and_then(Value::as_datetime)
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.get("end").and_then(Value::as_datetime)
    }

    pub fn is_all_day(&self) -> bool {
        self.get("is_all_day").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn is_cancelled(&self) -> bool {
        self.get("is_cancelled").and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn recurrence_end_date(&self) -> Option<NaiveDate> {
        self.get("recurrence_end_date").and_then(Value::as_date)
    }

    /// Item type; unrecognized or absent types read as `None`.
    pub fn item_type(&self) -> Option<CalendarItemType> {
        self.get_str("item_type").and_then(|t| t.parse().ok())
    }

    /// Pattern of the recurrence, when the item recurs.
    pub fn recurrence_pattern(&self) -> Option<RecurrencePattern> {
        let node = self.get("recurrence").and_then(Value::as_node)?;
        node.children()
            .iter()
            .find_map(|child| RecurrencePattern::from_element(child.local_name()))
    }

    pub fn organizer(&self) -> Option<Attendee> {
        self.collection("organizer")
            .first()
            .and_then(|r| Attendee::from_record(r, true))
    }

    /// Required then optional attendees, in document order.
    pub fn attendees(&self) -> Vec<Attendee> {
        let required = self
            .collection("required_attendees")
            .iter()
            .filter_map(|r| Attendee::from_record(r, true));
        let optional = self
            .collection("optional_attendees")
            .iter()
            .filter_map(|r| Attendee::from_record(r, false));
        required.chain(optional).collect()
    }

    pub fn resources(&self) -> Vec<Attendee> {
        self.collection("resources")
            .iter()
            .filter_map(|r| Attendee::from_record(r, true))
            .collect()
    }

    /// Ids of meetings the server reports as conflicting with this one.
    pub fn conflicting_meeting_ids(&self) -> Vec<ItemId> {
        self.collection("conflicting_meetings")
            .iter()
            .filter_map(|r| r.get_str("id"))
            .filter_map(|id| ItemId::new(id).ok())
            .collect()
    }
}
