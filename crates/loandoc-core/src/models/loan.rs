//! Structured loan data and extraction outcomes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::ExtractionError;

/// Loan fields extracted from application documents.
///
/// Doc comments on the fields are the descriptions the model sees in the
/// output schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LoanInfo {
    /// The total loan amount requested
    #[serde(deserialize_with = "lenient::float")]
    #[schemars(with = "f64")]
    pub loan_amount: f64,

    /// The annual interest rate as a percentage
    #[serde(deserialize_with = "lenient::float")]
    #[schemars(with = "f64")]
    pub interest_rate: f64,

    /// The loan tenure in months
    #[serde(deserialize_with = "lenient::integer")]
    #[schemars(with = "i64")]
    pub tenure_months: i64,

    /// The name of the borrower
    pub borrower_name: String,

    /// The stated purpose of the loan
    pub loan_purpose: String,

    /// Confidence score of the extraction (0-1)
    #[serde(deserialize_with = "lenient::float")]
    #[schemars(with = "f64")]
    pub confidence_score: f64,
}

impl LoanInfo {
    /// List every domain rule this record violates.
    pub fn validation_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        // Written as negated comparisons so NaN fails every rule.
        if !(self.loan_amount > 0.0) {
            issues.push(format!("loan amount must be positive, got {}", self.loan_amount));
        }

        if !(self.interest_rate > 0.0 && self.interest_rate <= 100.0) {
            issues.push(format!(
                "interest rate must be in (0, 100], got {}",
                self.interest_rate
            ));
        }

        if self.tenure_months <= 0 {
            issues.push(format!(
                "tenure must be a positive number of months, got {}",
                self.tenure_months
            ));
        }

        if self.borrower_name.is_empty() {
            issues.push("missing borrower name".to_string());
        }

        issues
    }

    /// Check the record against the domain rules.
    ///
    /// Extraction never calls this; callers decide what to do with a record
    /// that fails.
    pub fn validate(&self) -> bool {
        self.validation_issues().is_empty()
    }
}

/// Category of a failed extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ProviderConfiguration,
    ProviderCall,
    OutputParse,
    Validation,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FailureKind::ProviderConfiguration => "provider_configuration",
            FailureKind::ProviderCall => "provider_call",
            FailureKind::OutputParse => "output_parse",
            FailureKind::Validation => "validation",
        })
    }
}

/// Result of a loan field extraction, as handed back to callers.
///
/// Serializes as `{"status": "success", "data": {...}}` or
/// `{"status": "error", "error_kind": "...", "error_message": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExtractionOutcome {
    Success {
        data: LoanInfo,
    },
    Error {
        error_kind: FailureKind,
        error_message: String,
    },
}

impl ExtractionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn data(&self) -> Option<&LoanInfo> {
        match self {
            Self::Success { data } => Some(data),
            Self::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Error { error_message, .. } => Some(error_message),
        }
    }

    pub fn error_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success { .. } => None,
            Self::Error { error_kind, .. } => Some(*error_kind),
        }
    }

    /// Turn a success whose data fails validation into a validation error.
    pub fn validated(self) -> Self {
        match self {
            Self::Success { data } => {
                let issues = data.validation_issues();
                if issues.is_empty() {
                    Self::Success { data }
                } else {
                    ExtractionError::Validation(issues.join("; ")).into()
                }
            }
            error => error,
        }
    }

    /// Convert into a `Result`, rebuilding the typed error.
    pub fn into_result(self) -> Result<LoanInfo, ExtractionError> {
        match self {
            Self::Success { data } => Ok(data),
            Self::Error {
                error_kind,
                error_message,
            } => Err(match error_kind {
                FailureKind::ProviderConfiguration => {
                    ExtractionError::ProviderConfiguration(error_message)
                }
                FailureKind::ProviderCall => ExtractionError::ProviderCall(error_message),
                FailureKind::OutputParse => ExtractionError::OutputParse(error_message),
                FailureKind::Validation => ExtractionError::Validation(error_message),
            }),
        }
    }
}

impl From<ExtractionError> for ExtractionOutcome {
    fn from(error: ExtractionError) -> Self {
        let error_kind = match &error {
            ExtractionError::ProviderConfiguration(_) => FailureKind::ProviderConfiguration,
            ExtractionError::ProviderCall(_) => FailureKind::ProviderCall,
            ExtractionError::OutputParse(_) => FailureKind::OutputParse,
            ExtractionError::Validation(_) => FailureKind::Validation,
        };
        let error_message = match error {
            ExtractionError::ProviderConfiguration(m)
            | ExtractionError::ProviderCall(m)
            | ExtractionError::OutputParse(m)
            | ExtractionError::Validation(m) => m,
        };
        Self::Error {
            error_kind,
            error_message,
        }
    }
}

/// Number deserializers that accept numeric strings and integral floats,
/// since model output is not always strictly typed.
mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn float<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Number(n) => n
                .as_f64()
                .ok_or_else(|| D::Error::custom(format!("number out of range: {n}"))),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| D::Error::custom(format!("expected a number, found \"{s}\""))),
            other => Err(D::Error::custom(format!("expected a number, found {other}"))),
        }
    }

    pub fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let as_float = match &value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    return Ok(i);
                }
                n.as_f64()
            }
            Value::String(s) => {
                if let Ok(i) = s.trim().parse::<i64>() {
                    return Ok(i);
                }
                s.trim().parse::<f64>().ok()
            }
            _ => None,
        };

        match as_float {
            Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
            _ => Err(D::Error::custom(format!("expected an integer, found {value}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn valid() -> LoanInfo {
        LoanInfo {
            loan_amount: 10000.0,
            interest_rate: 7.5,
            tenure_months: 36,
            borrower_name: "Jane Doe".to_string(),
            loan_purpose: "Home renovation".to_string(),
            confidence_score: 0.9,
        }
    }

    #[test]
    fn test_validate_accepts_valid_record() {
        assert!(valid().validate());
        assert!(valid().validation_issues().is_empty());
    }

    #[test]
    fn test_validate_rejects_each_rule() {
        let cases: Vec<(&str, LoanInfo)> = vec![
            ("zero amount", LoanInfo { loan_amount: 0.0, ..valid() }),
            ("zero rate", LoanInfo { interest_rate: 0.0, ..valid() }),
            ("rate above 100", LoanInfo { interest_rate: 150.0, ..valid() }),
            ("negative tenure", LoanInfo { tenure_months: -1, ..valid() }),
            ("empty borrower", LoanInfo { borrower_name: String::new(), ..valid() }),
            ("NaN amount", LoanInfo { loan_amount: f64::NAN, ..valid() }),
        ];

        for (name, info) in cases {
            assert!(!info.validate(), "{name} should fail validation");
            assert_eq!(info.validation_issues().len(), 1, "{name}");
        }
    }

    #[test]
    fn test_rate_of_exactly_100_is_valid() {
        assert!(LoanInfo { interest_rate: 100.0, ..valid() }.validate());
    }

    #[test]
    fn test_whitespace_borrower_name_is_not_empty() {
        let info = LoanInfo { borrower_name: " ".to_string(), ..valid() };
        assert!(info.validate());
    }

    #[test]
    fn test_confidence_is_not_validated() {
        let info = LoanInfo { confidence_score: 3.0, ..valid() };
        assert!(info.validate());
    }

    #[test]
    fn test_lenient_numbers() {
        let json = r#"{
            "loan_amount": "25000",
            "interest_rate": 6,
            "tenure_months": 48.0,
            "borrower_name": "John Smith",
            "loan_purpose": "",
            "confidence_score": "0.8"
        }"#;
        let info: LoanInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.loan_amount, 25000.0);
        assert_eq!(info.interest_rate, 6.0);
        assert_eq!(info.tenure_months, 48);
        assert_eq!(info.confidence_score, 0.8);
    }

    #[test]
    fn test_null_and_fractional_tenure_rejected() {
        let null_amount = r#"{"loan_amount": null, "interest_rate": 5, "tenure_months": 12,
            "borrower_name": "A", "loan_purpose": "B", "confidence_score": 1}"#;
        let err = serde_json::from_str::<LoanInfo>(null_amount).unwrap_err();
        assert!(err.to_string().contains("found null"));

        let fractional = r#"{"loan_amount": 1, "interest_rate": 5, "tenure_months": 12.5,
            "borrower_name": "A", "loan_purpose": "B", "confidence_score": 1}"#;
        assert!(serde_json::from_str::<LoanInfo>(fractional).is_err());
    }

    #[test]
    fn test_outcome_serialization() {
        let success = ExtractionOutcome::Success { data: valid() };
        let value = serde_json::to_value(&success).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["data"]["borrower_name"], "Jane Doe");

        let error: ExtractionOutcome = ExtractionError::OutputParse("bad json".to_string()).into();
        let value = serde_json::to_value(&error).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["error_kind"], "output_parse");
        assert_eq!(value["error_message"], "bad json");
    }

    #[test]
    fn test_validated() {
        let ok = ExtractionOutcome::Success { data: valid() }.validated();
        assert!(ok.is_success());

        let bad = ExtractionOutcome::Success {
            data: LoanInfo { tenure_months: 0, ..valid() },
        }
        .validated();
        assert_eq!(bad.error_kind(), Some(FailureKind::Validation));
        assert!(bad.error_message().unwrap().contains("tenure"));

        let call_failed: ExtractionOutcome =
            ExtractionError::ProviderCall("timeout".to_string()).into();
        assert_eq!(call_failed.clone().validated(), call_failed);
    }

    #[test]
    fn test_into_result_round_trips_kind() {
        let outcome: ExtractionOutcome = ExtractionError::ProviderCall("503".to_string()).into();
        assert_eq!(
            outcome.into_result(),
            Err(ExtractionError::ProviderCall("503".to_string()))
        );
    }
}
