use serde::{Deserialize, Serialize};

use super::FilingStatus;

/// How a dependent is related to the taxpayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relationship {
    Child,
    Stepchild,
    FosterChild,
    Sibling,
    Grandchild,
    NieceOrNephew,
    Parent,
    Other,
}

impl Relationship {
    /// Relationships that pass the qualifying-child relationship test used by
    /// the child tax credit and the earned income credit.
    pub fn is_child_relation(&self) -> bool {
        !matches!(self, Self::Parent | Self::Other)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependent {
    #[serde(default)]
    pub name: String,
    pub age: u32,
    pub relationship: Relationship,
    #[serde(default)]
    pub student: bool,
    #[serde(default)]
    pub disabled: bool,
}

impl Dependent {
    /// Qualifying child for the earned income credit: under 19, under 24 if a
    /// full-time student, any age if permanently disabled.
    pub fn is_eic_qualifying_child(&self) -> bool {
        self.relationship.is_child_relation()
            && (self.disabled || self.age < 19 || (self.student && self.age < 24))
    }

    /// Qualifying child for the child tax credit.
    pub fn is_ctc_qualifying_child(
        &self,
        age_limit: u32,
    ) -> bool {
        self.relationship.is_child_relation() && self.age < age_limit
    }
}

/// The person (and spouse, for married statuses) filing the return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxPayer {
    pub filing_status: FilingStatus,
    #[serde(default)]
    pub age_65_or_older: bool,
    #[serde(default)]
    pub blind: bool,
    #[serde(default)]
    pub spouse_age_65_or_older: bool,
    #[serde(default)]
    pub spouse_blind: bool,
    #[serde(default)]
    pub dependents: Vec<Dependent>,
}

impl TaxPayer {
    pub fn new(filing_status: FilingStatus) -> Self {
        Self {
            filing_status,
            age_65_or_older: false,
            blind: false,
            spouse_age_65_or_older: false,
            spouse_blind: false,
            dependents: Vec::new(),
        }
    }

    /// Number of age-65 and blindness boxes checked. Spouse boxes only count
    /// for married filing statuses.
    pub fn additional_deduction_count(&self) -> u32 {
        let mut flags = vec![self.age_65_or_older, self.blind];
        if self.filing_status.is_married() {
            flags.extend([self.spouse_age_65_or_older, self.spouse_blind]);
        }
        flags.into_iter().filter(|flag| *flag).count() as u32
    }
}
