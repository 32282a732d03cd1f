use crate::entity::Entity;
use crate::kind::EntityKind;
use crate::schema::{ExtractionSchema, FieldDef};
use crate::value::Value;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message;

static SCHEMA: LazyLock<ExtractionSchema> = LazyLock::new(|| {
    let recipient = || {
        ExtractionSchema::new(
            "recipient",
            vec![
                FieldDef::string("name", "t:Name"),
                FieldDef::string("email", "t:EmailAddress"),
            ],
        )
    };

    ExtractionSchema::new(
        "message",
        vec![
            FieldDef::string("subject", "t:Subject"),
            FieldDef::string("sender_email", "t:Sender/t:Mailbox/t:EmailAddress"),
            FieldDef::string("sender_name", "t:Sender/t:Mailbox/t:Name"),
            FieldDef::string("from_email", "t:From/t:Mailbox/t:EmailAddress"),
            FieldDef::string("from_name", "t:From/t:Mailbox/t:Name"),
            FieldDef::string("culture", "t:Culture"),
            FieldDef::string("internet_message_id", "t:InternetMessageId"),
            FieldDef::string("references", "t:References"),
            FieldDef::string("in_reply_to", "t:InReplyTo"),
            FieldDef::boolean("has_attachments", "t:HasAttachments"),
            FieldDef::integer("size", "t:Size"),
            FieldDef::string("importance", "t:Importance"),
            FieldDef::datetime("received_at", "t:DateTimeReceived"),
            FieldDef::datetime("sent_at", "t:DateTimeSent"),
            FieldDef::datetime("created_at", "t:DateTimeCreated"),
            FieldDef::string("mime_content", "t:MimeContent"),
            FieldDef::string("html_body", r#"t:Body[@BodyType="HTML"]"#),
            FieldDef::string("text_body", r#"t:Body[@BodyType="Text"]"#),
            FieldDef::boolean("is_read", "t:IsRead"),
        ],
    )
    .with_repeated("to_recipients", "t:ToRecipients/t:Mailbox", recipient())
    .with_repeated("cc_recipients", "t:CcRecipients/t:Mailbox", recipient())
    .with_repeated("bcc_recipients", "t:BccRecipients/t:Mailbox", recipient())
    .with_repeated(
        "attachments",
        "t:Attachments/t:FileAttachment",
        ExtractionSchema::new(
            "attachment",
            vec![
                FieldDef::string("id", "t:AttachmentId/@Id"),
                FieldDef::string("name", "t:Name"),
                FieldDef::string("content_type", "t:ContentType"),
                FieldDef::string("content_id", "t:ContentId"),
            ],
        ),
    )
});

impl EntityKind for Message {
    const ELEMENT: &'static str = "t:Message";

    fn schema() -> &'static ExtractionSchema {
        &SCHEMA
    }
}

impl Entity<Message> {
    pub fn subject(&self) -> Option<&str> {
        self.get_str("subject")
    }

    pub fn is_read(&self) -> bool {
        self.get("is_read").and_then(Value::as_bool).unwrap_or(false)
    }

    /// `(name, email)` of each To recipient.
    pub fn to_recipients(&self) -> Vec<(Option<&str>, Option<&str>)> {
        self.collection("to_recipients")
            .iter()
            .map(|r| (r.get_str("name"), r.get_str("email")))
            .collect()
    }
}
