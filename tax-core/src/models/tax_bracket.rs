use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One band of a rate schedule. `max_income` is `None` for the top band.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub min_income: Decimal,
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
}

impl TaxBracket {
    pub fn new(
        min_income: Decimal,
        max_income: Option<Decimal>,
        rate: Decimal,
    ) -> Self {
        Self {
            min_income,
            max_income,
            rate,
        }
    }

    /// Portion of `income` that falls inside this band.
    pub fn span_of(
        &self,
        income: Decimal,
    ) -> Decimal {
        let top = match self.max_income {
            Some(max) => income.min(max),
            None => income,
        };
        (top - self.min_income).max(Decimal::ZERO)
    }
}
