//! Parsing model completions into `LoanInfo`.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::error::ExtractionError;
use crate::models::loan::LoanInfo;

lazy_static! {
    static ref CODE_FENCE: Regex = Regex::new(r"(?s)```[A-Za-z]*\s*\n?(.*?)```").unwrap();
}

/// Locate the JSON object in a completion.
///
/// Models sometimes wrap the object in a code fence or surround it with
/// prose; the outermost braces are taken as the object.
fn json_candidate(completion: &str) -> Option<&str> {
    let body = CODE_FENCE
        .captures(completion)
        .and_then(|c| c.get(1))
        .map_or(completion, |m| m.as_str());

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (start < end).then(|| &body[start..=end])
}

/// Parse a completion into `LoanInfo`.
///
/// Every field is required; a missing or null field is an `OutputParse`
/// error.
pub fn parse_loan_info(completion: &str) -> Result<LoanInfo, ExtractionError> {
    let json = json_candidate(completion).ok_or_else(|| {
        ExtractionError::OutputParse("no JSON object found in model output".to_string())
    })?;

    serde_json::from_str(json).map_err(|e| {
        debug!("Unparseable model output: {}", completion);
        ExtractionError::OutputParse(format!("model output does not match the loan schema: {}", e))
    })
}
