//! Classification of server status codes.
//!
//! Every response message carries a `ResponseCode`. Bulk responses carry
//! one per message, and the first failing one in document order decides
//! the outcome of the whole call.

use crate::error::{EwsError, EwsResult};
use ewskit_model::{Document, Extractor, Namespaces};
use serde::{Deserialize, Serialize};

const NO_ERROR: &str = "NoError";
const STALE_TOKEN: &str = "ErrorChangeKeyRequiredForWriteOperations";
const IRRESOLVABLE_CONFLICT: &str = "ErrorIrresolvableConflict";
const NOT_FOUND: &str = "ErrorItemNotFound";
const TRANSIENT: &str = "ErrorInternalServerTransientError";
const OCCURRENCE_OUT_OF_RANGE: &str = "ErrorCalendarOccurrenceIndexIsOutOfRecurrenceRange";

// Unprefixed so SOAP faults carrying the code in the errors namespace
// classify the same way as regular response messages.
const CODE_LOCATOR: &str = "//ResponseCode";
const MESSAGE_LOCATOR: &str = "//MessageText";
const FAULT_STRING_LOCATOR: &str = "//faultstring";

/// Outcome of one status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FaultOutcome {
    Success,
    /// Some requested elements were out of range; the rest succeeded.
    PartialSuccess,
    StaleToken,
    IrresolvableConflict,
    NotFound,
    TransientServerError,
    Fatal { code: Option<String> },
}

impl FaultOutcome {
    /// Classify a single status code. `None` means the response had none.
    pub fn classify(code: Option<&str>) -> Self {
        match code.map(str::trim) {
            None => Self::Fatal { code: None },
            Some(NO_ERROR) => Self::Success,
            Some(STALE_TOKEN) => Self::StaleToken,
            Some(IRRESOLVABLE_CONFLICT) => Self::IrresolvableConflict,
            Some(NOT_FOUND) => Self::NotFound,
            Some(TRANSIENT) => Self::TransientServerError,
            Some(OCCURRENCE_OUT_OF_RANGE) => Self::PartialSuccess,
            Some(other) => Self::Fatal {
                code: Some(other.to_string()),
            },
        }
    }

    /// Classify a whole response.
    ///
    /// The first failing status in document order wins. Partial success
    /// never masks a later failure.
    pub fn classify_response(document: &Document, namespaces: &Namespaces) -> EwsResult<Self> {
        let extractor = Extractor::new(namespaces);
        let codes = extractor.scopes(document.root(), CODE_LOCATOR)?;
        if codes.is_empty() {
            return Ok(Self::Fatal { code: None });
        }

        let mut outcome = Self::Success;
        for node in codes {
            match Self::classify(Some(node.text())) {
                Self::Success => {}
                Self::PartialSuccess => outcome = Self::PartialSuccess,
                failure => return Ok(failure),
            }
        }
        Ok(outcome)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success | Self::PartialSuccess)
    }

    /// Convert to the error taxonomy. Partial success counts as success.
    pub fn into_result(self, message: Option<String>) -> EwsResult<()> {
        match self {
            Self::Success | Self::PartialSuccess => Ok(()),
            Self::StaleToken => Err(EwsError::StaleToken),
            Self::IrresolvableConflict => Err(EwsError::IrresolvableConflict),
            Self::NotFound => Err(EwsError::NotFound),
            Self::TransientServerError => Err(EwsError::TransientServerError),
            Self::Fatal { code } => {
                let message = message.unwrap_or_else(|| match &code {
                    Some(code) => format!("server returned {code}"),
                    None => "server returned no status".to_string(),
                });
                Err(EwsError::Fatal { code, message })
            }
        }
    }
}

/// Classify a response and fail with the matching error.
///
/// Fatal errors carry the server's `MessageText` (or SOAP `faultstring`)
/// when there is one.
pub fn check_response(document: &Document, namespaces: &Namespaces) -> EwsResult<FaultOutcome> {
    let outcome = FaultOutcome::classify_response(document, namespaces)?;
    if outcome.is_success() {
        return Ok(outcome);
    }
    let message = match &outcome {
        FaultOutcome::Fatal { .. } => server_message(document, namespaces)?,
        _ => None,
    };
    outcome.clone().into_result(message).map(|()| outcome)
}

fn server_message(document: &Document, namespaces: &Namespaces) -> EwsResult<Option<String>> {
    let extractor = Extractor::new(namespaces);
    for locator in [MESSAGE_LOCATOR, FAULT_STRING_LOCATOR] {
        if let Some(node) = extractor.scopes(document.root(), locator)?.first() {
            let text = node.text().trim();
            if !text.is_empty() {
                return Ok(Some(text.to_string()));
            }
        }
    }
    Ok(None)
}
