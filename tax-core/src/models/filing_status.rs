use serde::{Deserialize, Serialize};

/// Federal filing status. Exactly one applies to a return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilingStatus {
    #[default]
    #[serde(alias = "S")]
    Single,
    #[serde(alias = "MFJ")]
    MarriedFilingJointly,
    #[serde(alias = "MFS")]
    MarriedFilingSeparately,
    #[serde(alias = "HOH")]
    HeadOfHousehold,
}

impl FilingStatus {
    pub const ALL: [FilingStatus; 4] = [
        Self::Single,
        Self::MarriedFilingJointly,
        Self::MarriedFilingSeparately,
        Self::HeadOfHousehold,
    ];

    /// Short code, also accepted when deserializing.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Single => "S",
            Self::MarriedFilingJointly => "MFJ",
            Self::MarriedFilingSeparately => "MFS",
            Self::HeadOfHousehold => "HOH",
        }
    }

    /// Spouse fields on [`crate::TaxPayer`] are only meaningful when this is true.
    pub fn is_married(&self) -> bool {
        matches!(
            self,
            Self::MarriedFilingJointly | Self::MarriedFilingSeparately
        )
    }
}

impl std::fmt::Display for FilingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
