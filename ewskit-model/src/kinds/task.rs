use crate::entity::Entity;
use crate::kind::EntityKind;
use crate::schema::{ExtractionSchema, FieldDef};
use crate::value::Value;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Task;

static SCHEMA: LazyLock<ExtractionSchema> = LazyLock::new(|| {
    ExtractionSchema::new(
        "task",
        vec![
            FieldDef::string("folder_id", "t:ParentFolderId/@Id"),
            FieldDef::string("subject", "t:Subject"),
            FieldDef::string("text_body", r#"t:Body[@BodyType="Text"]"#),
            FieldDef::string("html_body", r#"t:Body[@BodyType="HTML"]"#),
            FieldDef::raw("categories", "t:Categories"),
            FieldDef::boolean("is_draft", "t:IsDraft"),
            FieldDef::datetime("sent_at", "t:DateTimeSent"),
            FieldDef::datetime("created_at", "t:DateTimeCreated"),
            FieldDef::date("due_date", "t:DueDate"),
            FieldDef::boolean("is_complete", "t:IsComplete"),
            FieldDef::string("owner", "t:Owner"),
            FieldDef::date("start_date", "t:StartDate"),
            FieldDef::date("complete_date", "t:CompleteDate"),
            FieldDef::string("status", "t:Status"),
            FieldDef::string("status_description", "t:StatusDescription"),
            FieldDef::integer("percent_complete", "t:PercentComplete"),
            FieldDef::string("importance", "t:Importance"),
            FieldDef::raw("companies", "t:Companies"),
            FieldDef::string("last_modified_by", "t:LastModifiedName"),
            FieldDef::datetime("last_modified_at", "t:LastModifiedTime"),
        ],
    )
});

impl EntityKind for Task {
    const ELEMENT: &'static str = "t:Task";

    fn schema() -> &'static ExtractionSchema {
        &SCHEMA
    }

    fn validate(entity: &Entity<Self>) -> Result<(), String> {
        match entity.get("percent_complete").and_then(Value::as_i64) {
            Some(p) if !(0..=100).contains(&p) => {
                Err(format!("percent_complete must be between 0 and 100, got {p}"))
            }
            _ => Ok(()),
        }
    }
}

impl Entity<Task> {
    pub fn subject(&self) -> Option<&str> {
        self.get_str("subject")
    }

    /// Category labels (`t:Categories/t:String`).
    pub fn categories(&self) -> Vec<&str> {
        string_list(self.get("categories"))
    }

    pub fn companies(&self) -> Vec<&str> {
        string_list(self.get("companies"))
    }
}

fn string_list(value: Option<&Value>) -> Vec<&str> {
    value
        .and_then(Value::as_node)
        .map(|node| {
            node.children()
                .iter()
                .filter(|c| c.local_name() == "String")
                .map(|c| c.text())
                .collect()
        })
        .unwrap_or_default()
}
