//! Extraction prompt construction.

use schemars::schema_for;

use crate::models::loan::LoanInfo;

const DEFAULT_TEMPLATE: &str = "Extract the following information from the loan document text below.
If a piece of information is not found, return null for that field.

{format_instructions}

Document Text:
{text}

Extracted Information:";

/// Instructions describing the expected JSON output, including the
/// `LoanInfo` schema.
pub fn format_instructions() -> String {
    let schema = serde_json::to_string(&schema_for!(LoanInfo)).unwrap_or_default();
    format!(
        "The output must be a single JSON object that conforms to the JSON schema below. \
         Respond with the JSON object only, without commentary or code fences.\n\n\
         Here is the output schema:\n```\n{}\n```",
        schema
    )
}

/// Prompt with `{format_instructions}` and `{text}` placeholders.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
    format_instructions: String,
}

impl PromptTemplate {
    /// The loan extraction prompt.
    pub fn new() -> Self {
        Self::with_template(DEFAULT_TEMPLATE)
    }

    /// Use a custom template. Both placeholders are optional.
    pub fn with_template(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            format_instructions: format_instructions(),
        }
    }

    /// Fill in the template for a document text.
    ///
    /// Format instructions are substituted first so document text that
    /// happens to contain a placeholder is left untouched.
    pub fn render(&self, text: &str) -> String {
        match self.template.split_once("{text}") {
            Some((before, after)) => format!(
                "{}{}{}",
                before.replace("{format_instructions}", &self.format_instructions),
                text,
                after.replace("{format_instructions}", &self.format_instructions)
            ),
            None => self
                .template
                .replace("{format_instructions}", &self.format_instructions),
        }
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::new()
    }
}
