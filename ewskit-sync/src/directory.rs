//! Mailbox directory lookups: free/busy, rooms and id conversion.
//!
//! None of these produce tracked entities. Each answer is read into a
//! plain value through an [`ExtractionSchema`], the same way entities are.

use crate::client::Client;
use crate::error::{EwsError, EwsResult};
use crate::fault::{FaultOutcome, check_response};
use crate::request::{IdFormat, Request};
use crate::transport::Transport;
use chrono::{DateTime, Utc};
use ewskit_model::{
    Document, ExtractedRecord, ExtractionSchema, Extractor, FieldDef, Locator, Namespaces, Value,
};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::{debug, warn};

const FREE_BUSY_RESPONSES: &str = "//m:FreeBusyResponseArray/m:FreeBusyResponse";

static FREE_BUSY: LazyLock<ExtractionSchema> = LazyLock::new(|| {
    ExtractionSchema::new(
        "free_busy",
        vec![FieldDef::string("code", "m:ResponseMessage/m:ResponseCode")],
    )
    .with_repeated(
        "busy",
        "m:FreeBusyView/t:CalendarEventArray/t:CalendarEvent",
        ExtractionSchema::new(
            "calendar_event",
            vec![
                FieldDef::datetime("start", "t:StartTime"),
                FieldDef::datetime("end", "t:EndTime"),
                FieldDef::string("busy_type", "t:BusyType"),
            ],
        ),
    )
});

static MAILBOX: LazyLock<ExtractionSchema> = LazyLock::new(|| {
    ExtractionSchema::new(
        "mailbox",
        vec![
            FieldDef::string("name", "t:Name"),
            FieldDef::string("email_address", "t:EmailAddress"),
            FieldDef::string("routing_type", "t:RoutingType"),
            FieldDef::string("mailbox_type", "t:MailboxType"),
        ],
    )
});

/// How a mailbox owner shows up during a busy slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BusyType {
    Free,
    Tentative,
    Busy,
    OutOfOffice,
    WorkingElsewhere,
    NoData,
}

impl BusyType {
    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "Free" => Some(Self::Free),
            "Tentative" => Some(Self::Tentative),
            "Busy" => Some(Self::Busy),
            "OOF" => Some(Self::OutOfOffice),
            "WorkingElsewhere" => Some(Self::WorkingElsewhere),
            "NoData" => Some(Self::NoData),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusySlot {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub busy_type: Option<BusyType>,
}

/// Free/busy of one requested mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub mailbox: String,
    /// Status of this mailbox's answer; other mailboxes are unaffected by a failure.
    pub outcome: FaultOutcome,
    pub busy: Vec<BusySlot>,
}

/// A mailbox entry of the directory: a room list or a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mailbox {
    pub name: Option<String>,
    pub email_address: Option<String>,
    pub routing_type: Option<String>,
    pub mailbox_type: Option<String>,
}

impl Mailbox {
    fn from_record(record: &ExtractedRecord) -> Self {
        let text = |name: &str| record.get_str(name).map(str::to_string);
        Self {
            name: text("name"),
            email_address: text("email_address"),
            routing_type: text("routing_type"),
            mailbox_type: text("mailbox_type"),
        }
    }
}

/// Reads a free/busy response.
///
/// Answers pair with `mailboxes` by position. A response carrying no
/// per-mailbox answer at all is classified as a whole.
pub fn parse_availability(
    document: &Document,
    namespaces: &Namespaces,
    mailboxes: &[String],
) -> EwsResult<Vec<Availability>> {
    let extractor = Extractor::new(namespaces);
    let answers = extractor.scopes(document.root(), FREE_BUSY_RESPONSES)?;
    if answers.is_empty() {
        check_response(document, namespaces)?;
        return Ok(Vec::new());
    }
    if answers.len() != mailboxes.len() {
        warn!(
            "free/busy response has {} answers for {} mailboxes",
            answers.len(),
            mailboxes.len()
        );
    }

    mailboxes
        .iter()
        .zip(answers)
        .map(|(mailbox, node)| {
            let record = extractor.extract(node, &FREE_BUSY)?;
            let busy = record
                .collection("busy")
                .iter()
                .map(|slot| BusySlot {
                    start: slot.get("start").and_then(Value::as_datetime),
                    end: slot.get("end").and_then(Value::as_datetime),
                    busy_type: slot.get_str("busy_type").and_then(BusyType::from_wire),
                })
                .collect();
            Ok(Availability {
                mailbox: mailbox.clone(),
                outcome: FaultOutcome::classify(record.get_str("code")),
                busy,
            })
        })
        .collect()
}

fn check_availability(document: &Document, namespaces: &Namespaces) -> EwsResult<()> {
    let answers = Locator::parse(FREE_BUSY_RESPONSES)?.resolve_nodes(document.root(), namespaces)?;
    if answers.is_empty() {
        check_response(document, namespaces)?;
    }
    Ok(())
}

impl<T: Transport> Client<T> {
    /// Free/busy of each mailbox between `start` and `end`.
    pub async fn get_user_availability(
        &self,
        mailboxes: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> EwsResult<Vec<Availability>> {
        if mailboxes.is_empty() {
            return Ok(Vec::new());
        }
        if end <= start {
            return Err(EwsError::InvalidState(format!(
                "availability window ends ({end}) before it starts ({start})"
            )));
        }
        let request = Request::GetUserAvailability {
            mailboxes: mailboxes.to_vec(),
            start,
            end,
        };
        let document = self.send_checked(&request, check_availability).await?;
        parse_availability(&document, self.namespaces(), mailboxes)
    }

    /// Room lists published in the directory.
    pub async fn room_lists(&self) -> EwsResult<Vec<Mailbox>> {
        let document = self.send(&Request::GetRoomLists).await?;
        self.mailboxes(&document, "//m:RoomLists/t:Address")
    }

    /// Rooms of the room list at `room_list` (its email address).
    pub async fn rooms(&self, room_list: &str) -> EwsResult<Vec<Mailbox>> {
        let request = Request::GetRooms {
            room_list: room_list.to_string(),
        };
        let document = self.send(&request).await?;
        self.mailboxes(&document, "//m:Rooms/t:Room/t:Id")
    }

    fn mailboxes(&self, document: &Document, locator: &str) -> EwsResult<Vec<Mailbox>> {
        let records = Extractor::new(self.namespaces()).extract_repeated(
            document.root(),
            locator,
            &MAILBOX,
        )?;
        debug!("{} mailboxes at {}", records.len(), locator);
        Ok(records.iter().map(Mailbox::from_record).collect())
    }

    /// Converts `id` between formats, in the context of `mailbox`.
    ///
    /// Returns every alternate id the server produced, in document order.
    pub async fn convert_id(
        &self,
        id: &str,
        from: IdFormat,
        to: IdFormat,
        mailbox: &str,
    ) -> EwsResult<Vec<String>> {
        let request = Request::ConvertId {
            id: id.to_string(),
            from,
            to,
            mailbox: mailbox.to_string(),
        };
        let document = self.send(&request).await?;
        let converted = Locator::parse("//m:ConvertIdResponseMessage/m:AlternateId/@Id")?
            .resolve(document.root(), self.namespaces())?
            .iter()
            .map(|m| m.text().to_string())
            .collect();
        Ok(converted)
    }
}
