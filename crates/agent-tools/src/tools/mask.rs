//! PII anonymization tool.

use async_trait::async_trait;
use brain_core::ToolId;
use serde_json::json;

use crate::error::ToolError;
use crate::pii::{mask, PiiCategory};
use crate::spec::{ParamSpec, ParamType, ToolSpec};
use crate::tool::{Tool, ToolArgs, ToolOutput};

const MAX_TEXT_CHARS: usize = 10_000;

/// Redacts names, emails, phone numbers and customer identifiers.
///
/// # Parameters
///
/// - `text` (required): Free text to sanitize.
pub struct AnonymizePii {
    spec: ToolSpec,
}

impl AnonymizePii {
    pub fn new() -> Self {
        Self {
            spec: ToolSpec::new(
                ToolId::Mask,
                "Scans text for PII (names, emails, phone numbers, customer ids) and \
                 redacts it. Useful for GDPR compliance before analysis.",
                vec![ParamSpec::required(
                    "text",
                    "Text to anonymize",
                    ParamType::Text {
                        max_len: Some(MAX_TEXT_CHARS),
                    },
                )],
            ),
        }
    }
}

impl Default for AnonymizePii {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for AnonymizePii {
    fn id(&self) -> ToolId {
        ToolId::Mask
    }

    fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let text = args.get_string("text")?;
        let (redacted, spans) = mask(&text);

        let count = |category: PiiCategory| spans.iter().filter(|s| s.category == category).count();
        let summary = format!(
            "{} names, {} emails, {} phone numbers, {} other identifiers",
            count(PiiCategory::Name),
            count(PiiCategory::Email),
            count(PiiCategory::Phone),
            count(PiiCategory::Other)
        );

        Ok(ToolOutput::new(
            redacted.clone(),
            json!({
                "masked_text": redacted,
                "spans": spans,
                "summary": summary,
            }),
        ))
    }
}
