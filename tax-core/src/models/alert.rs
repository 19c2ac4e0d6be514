use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCode {
    WashSaleDetected,
    CapitalLossCarryover,
    HsaExcessContribution,
    StudentLoanFilingStatus,
    PassiveLossSuspended,
    CharitableLimit,
    SstbLimitation,
    EicInvestmentIncomeLimit,
    EicFilingStatus,
    AotcIneligible,
    /// A loosely-typed field from an extracted document could not be read.
    CoercedField,
    /// An extracted record could not be classified and was dropped.
    UnrecognizedRecord,
    /// A derived amount did not fit in a decimal; the reported figure was used.
    AmountOverflow,
}

/// Advisory finding attached to a result. Never blocks computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceAlert {
    pub code: AlertCode,
    pub severity: Severity,
    pub message: String,
}

impl ComplianceAlert {
    pub fn info(
        code: AlertCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            severity: Severity::Info,
            message: message.into(),
        }
    }

    pub fn warning(
        code: AlertCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            severity: Severity::Warning,
            message: message.into(),
        }
    }

    pub fn error(
        code: AlertCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            severity: Severity::Error,
            message: message.into(),
        }
    }
}
