//! Shared test helpers for sync tests.

#![allow(dead_code)]

use async_trait::async_trait;
use ewskit_model::Document;
use ewskit_sync::{Client, ClientConfig, EwsError, EwsResult, Request, Transport};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const NS: &str = r#"xmlns:m="http://schemas.microsoft.com/exchange/services/2006/messages" xmlns:t="http://schemas.microsoft.com/exchange/services/2006/types""#;

/// In-memory transport replaying scripted responses and recording requests.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<EwsResult<Document>>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, xml: &str) {
        let document = Document::parse(xml).unwrap();
        self.responses.lock().unwrap().push_back(Ok(document));
    }

    pub fn push_error(&self, err: EwsError) {
        self.responses.lock().unwrap().push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &Request) -> EwsResult<Document> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(EwsError::Network("script exhausted".to_string())))
    }
}

pub fn test_config() -> ClientConfig {
    ClientConfig {
        retry_initial_interval_ms: 1,
        ..ClientConfig::new("https://mail.example.com/EWS/Exchange.asmx")
    }
}

pub fn client() -> (Client<Arc<ScriptedTransport>>, Arc<ScriptedTransport>) {
    let transport = ScriptedTransport::new();
    let client = Client::new(transport.clone(), test_config()).unwrap();
    (client, transport)
}

// ── Response builders ────────────────────────────────────────────

pub fn envelope(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
  <s:Body>{body}</s:Body>
</s:Envelope>"#
    )
}

/// A single-message response of `operation` with the given status and payload.
pub fn response(operation: &str, code: &str, payload: &str) -> String {
    let class = match code {
        "NoError" => "Success",
        _ => "Error",
    };
    envelope(&format!(
        r#"<m:{operation}Response {NS}>
  <m:ResponseMessages>
    <m:{operation}ResponseMessage ResponseClass="{class}">
      <m:ResponseCode>{code}</m:ResponseCode>
      {payload}
    </m:{operation}ResponseMessage>
  </m:ResponseMessages>
</m:{operation}Response>"#
    ))
}

pub fn items_response(operation: &str, items: &str) -> String {
    response(operation, "NoError", &format!("<m:Items>{items}</m:Items>"))
}

pub fn error_response(operation: &str, code: &str) -> String {
    response(
        operation,
        code,
        &format!("<m:MessageText>{code} happened</m:MessageText>"),
    )
}

pub fn calendar_item(id: &str, change_key: &str, subject: &str) -> String {
    format!(
        r#"<t:CalendarItem>
  <t:ItemId Id="{id}" ChangeKey="{change_key}"/>
  <t:Subject>{subject}</t:Subject>
  <t:Start>2024-05-01T10:00:00Z</t:Start>
  <t:End>2024-05-01T11:00:00Z</t:End>
  <t:CalendarItemType>Single</t:CalendarItemType>
</t:CalendarItem>"#
    )
}

pub fn id_only(id: &str, change_key: &str) -> String {
    format!(r#"<t:CalendarItem><t:ItemId Id="{id}" ChangeKey="{change_key}"/></t:CalendarItem>"#)
}

/// An id-only lookup answer, as sent back for a change key refresh.
pub fn refresh_response(id: &str, change_key: &str) -> String {
    items_response("GetItem", &id_only(id, change_key))
}

/// A listing page. `next_offset`/`includes_last` of `None` leave the attribute out.
pub fn find_item_page(
    items: &[String],
    next_offset: Option<u32>,
    total: u32,
    includes_last: Option<bool>,
) -> String {
    let mut attrs = format!(r#"TotalItemsInView="{total}""#);
    if let Some(offset) = next_offset {
        attrs.push_str(&format!(r#" IndexedPagingOffset="{offset}""#));
    }
    if let Some(last) = includes_last {
        attrs.push_str(&format!(r#" IncludesLastItemInRange="{last}""#));
    }
    response(
        "FindItem",
        "NoError",
        &format!(
            "<m:RootFolder {attrs}><t:Items>{}</t:Items></m:RootFolder>",
            items.concat()
        ),
    )
}

pub fn sync_response(
    creates: &[String],
    updates: &[String],
    deletes: &[&str],
    state: &str,
    includes_last: bool,
) -> String {
    let mut changes = String::new();
    for c in creates {
        changes.push_str(&format!("<t:Create>{c}</t:Create>"));
    }
    for u in updates {
        changes.push_str(&format!("<t:Update>{u}</t:Update>"));
    }
    for d in deletes {
        changes.push_str(&format!(r#"<t:Delete><t:ItemId Id="{d}" ChangeKey="x"/></t:Delete>"#));
    }
    response(
        "SyncFolderItems",
        "NoError",
        &format!(
            "<m:SyncState>{state}</m:SyncState>
             <m:IncludesLastItemInRange>{includes_last}</m:IncludesLastItemInRange>
             <m:Changes>{changes}</m:Changes>"
        ),
    )
}
