use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Holding-period / rate class of a capital gain record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HoldingPeriod {
    ShortTerm,
    LongTerm,
    /// Unrecaptured section 1250 gain (25% maximum rate).
    Unrecaptured1250,
    /// Collectibles gain (28% maximum rate).
    Collectibles,
}

/// Category-specific payload of an [`IncomeItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "snake_case")]
pub enum IncomeDetail {
    Wage {
        /// W-2 box 3. Defaults to the item amount.
        #[serde(default)]
        social_security_wages: Option<Decimal>,
        /// W-2 box 5. Defaults to the item amount.
        #[serde(default)]
        medicare_wages: Option<Decimal>,
    },
    Interest {
        #[serde(default)]
        tax_exempt: bool,
    },
    Dividend {
        /// Qualified portion of the ordinary dividend amount.
        #[serde(default)]
        qualified: Decimal,
    },
    CapitalGain {
        #[serde(default)]
        cost_basis: Decimal,
        holding: HoldingPeriod,
        #[serde(default)]
        wash_sale_loss_disallowed: bool,
    },
    /// Rental or other passive activity. Negative amounts are losses.
    Passive {
        property_id: String,
        #[serde(default = "default_true")]
        active_participation: bool,
    },
    Business {
        #[serde(default)]
        expenses: Decimal,
        #[serde(default)]
        w2_wages: Decimal,
        #[serde(default)]
        ubia: Decimal,
        #[serde(default)]
        sstb: bool,
    },
    SocialSecurity,
    IsoExercise {
        #[serde(default)]
        shares: Decimal,
        #[serde(default)]
        exercise_price: Decimal,
        #[serde(default)]
        fair_market_value: Decimal,
    },
    Other,
}

fn default_true() -> bool {
    true
}

/// A single reported income record (W-2, 1099, K-1, brokerage lot, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomeItem {
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// Gross/reported amount for the record.
    pub amount: Decimal,
    /// Federal income tax withheld on this record.
    #[serde(default)]
    pub withholding: Decimal,
    pub detail: IncomeDetail,
}

impl IncomeItem {
    pub fn new(
        id: impl Into<String>,
        amount: Decimal,
        detail: IncomeDetail,
    ) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            amount,
            withholding: Decimal::ZERO,
            detail,
        }
    }

    pub fn with_withholding(
        mut self,
        withholding: Decimal,
    ) -> Self {
        self.withholding = withholding;
        self
    }

    pub fn wage(
        id: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self::new(
            id,
            amount,
            IncomeDetail::Wage {
                social_security_wages: None,
                medicare_wages: None,
            },
        )
    }
}
