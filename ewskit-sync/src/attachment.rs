//! File attachments.

use crate::client::Client;
use crate::error::{EwsError, EwsResult};
use crate::request::Request;
use crate::transport::Transport;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use ewskit_model::{ExtractionSchema, Extractor, FieldDef};
use ewskit_types::AttachmentId;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tracing::debug;

static FILE_ATTACHMENT: LazyLock<ExtractionSchema> = LazyLock::new(|| {
    ExtractionSchema::new(
        "file_attachment",
        vec![
            FieldDef::string("name", "t:Name"),
            FieldDef::string("content_type", "t:ContentType"),
            FieldDef::string("content", "t:Content"),
        ],
    )
});

/// A downloaded file attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttachment {
    pub name: Option<String>,
    pub content_type: Option<String>,
    /// Decoded bytes; `None` when the server sent no content element.
    pub content: Option<Vec<u8>>,
}

impl<T: Transport> Client<T> {
    /// Downloads one file attachment.
    ///
    /// Returns `None` when the response holds no file attachment, e.g. for
    /// an attached item. If several come back, the last one wins.
    pub async fn get_attachment(&self, id: &AttachmentId) -> EwsResult<Option<FileAttachment>> {
        let request = Request::GetAttachment {
            ids: vec![id.clone()],
        };
        let document = self.send(&request).await?;
        let extractor = Extractor::new(self.namespaces());
        let Some(record) = extractor
            .extract_repeated(document.root(), "//t:FileAttachment", &FILE_ATTACHMENT)?
            .pop()
        else {
            debug!("no file attachment returned for {}", id);
            return Ok(None);
        };

        let content = record
            .get_str("content")
            .map(|encoded| {
                BASE64
                    .decode(encoded.trim())
                    .map_err(|e| EwsError::MalformedValue {
                        attribute: "content".to_string(),
                        reason: e.to_string(),
                    })
            })
            .transpose()?;

        Ok(Some(FileAttachment {
            name: record.get_str("name").map(str::to_string),
            content_type: record.get_str("content_type").map(str::to_string),
            content,
        }))
    }
}
