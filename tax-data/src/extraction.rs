//! Normalization of loosely-typed records returned by document extraction.
//!
//! Extracted records look roughly like
//!
//! ```json
//! { "id": "w2-acme", "category": "wage", "amount": "$61,250.00",
//!   "withholding": 5400, "details": { "social_security_wages": "61250" } }
//! ```
//!
//! Field values come from free text, so every numeric field goes through
//! [`coerce_decimal`] and every flag through [`coerce_bool`]. This is the only
//! place where missing or unreadable numbers turn into zero; the engine
//! itself assumes its inputs are already typed.
//!
//! Required fields (`amount`, `cost_basis` on capital gains) warn when they
//! are missing. Optional detail fields fall back to their defaults silently
//! when absent and warn only when present but unreadable.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal_macros::dec;
use serde_json::{Map, Value};
use tax_core::calculations::common::round_half_up;
use tax_core::{
    AlertCode, ComplianceAlert, DeductionDetail, DeductionItem, HoldingPeriod, HsaCoverage,
    IncomeDetail, IncomeItem, SaltKind,
};
use tracing::{debug, warn};

/// Typed output of a normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub income: Vec<IncomeItem>,
    pub deductions: Vec<DeductionItem>,
    pub alerts: Vec<ComplianceAlert>,
}

impl Normalized {
    pub fn record_count(&self) -> usize {
        self.income.len() + self.deductions.len()
    }
}

/// Largest magnitude accepted from an extracted field. Anything bigger is a
/// misread, and would overflow the engine's sums.
pub const MAX_AMOUNT: Decimal = dec!(1_000_000_000_000_000);

/// Reads a monetary amount, rounded to cents.
///
/// Accepts JSON numbers and numeric strings; `$`, `,` and whitespace inside
/// strings are ignored and scientific notation is understood. Anything else
/// (missing, `null`, `"NaN"`, `"n/a"`, objects), or a number beyond
/// [`MAX_AMOUNT`] either way, becomes zero and pushes a
/// [`AlertCode::CoercedField`] warning naming `field`.
///
/// ```
/// use rust_decimal_macros::dec;
/// use serde_json::json;
/// use tax_data::extraction::coerce_decimal;
///
/// let mut alerts = Vec::new();
/// assert_eq!(coerce_decimal(Some(&json!("$1,234.50")), "amount", &mut alerts), dec!(1234.50));
/// assert_eq!(coerce_decimal(Some(&json!("n/a")), "amount", &mut alerts), dec!(0));
/// assert_eq!(alerts.len(), 1);
/// ```
pub fn coerce_decimal(
    value: Option<&Value>,
    field: &str,
    alerts: &mut Vec<ComplianceAlert>,
) -> Decimal {
    match value.and_then(read_decimal) {
        Some(amount) if amount.abs() > MAX_AMOUNT => {
            warn!(field, amount = %amount, "implausible extracted amount");
            alerts.push(ComplianceAlert::warning(
                AlertCode::CoercedField,
                format!("Field '{field}' is implausibly large ({amount}); using 0"),
            ));
            Decimal::ZERO
        }
        Some(amount) => round_half_up(amount),
        None => {
            alerts.push(ComplianceAlert::warning(
                AlertCode::CoercedField,
                format!(
                    "Field '{field}' has no readable number ({}); using 0",
                    describe(value)
                ),
            ));
            Decimal::ZERO
        }
    }
}

/// Reads a yes/no flag: JSON booleans, `1`/`0`, and the strings
/// `true/false`, `yes/no`, `y/n`, `1/0` in any case.
///
/// Absent or `null` values return `default` silently; anything else that
/// can't be read returns `default` with a warning.
pub fn coerce_bool(
    value: Option<&Value>,
    field: &str,
    default: bool,
    alerts: &mut Vec<ComplianceAlert>,
) -> bool {
    let parsed = match value {
        None | Some(Value::Null) => return default,
        Some(Value::Bool(flag)) => Some(*flag),
        Some(Value::Number(n)) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "y" | "1" => Some(true),
            "false" | "no" | "n" | "0" => Some(false),
            _ => None,
        },
        Some(_) => None,
    };

    parsed.unwrap_or_else(|| {
        alerts.push(ComplianceAlert::warning(
            AlertCode::CoercedField,
            format!(
                "Field '{field}' is not a yes/no value ({}); using {default}",
                describe(value)
            ),
        ));
        default
    })
}

/// Reads an ISO `YYYY-MM-DD` date. Absent values are `None`; unreadable
/// ones are `None` with a warning.
pub fn coerce_date(
    value: Option<&Value>,
    field: &str,
    alerts: &mut Vec<ComplianceAlert>,
) -> Option<NaiveDate> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if !s.trim().is_empty() => {
            match NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d") {
                Ok(date) => Some(date),
                Err(_) => {
                    alerts.push(ComplianceAlert::warning(
                        AlertCode::CoercedField,
                        format!("Field '{field}' is not a YYYY-MM-DD date ('{s}'); ignoring it"),
                    ));
                    None
                }
            }
        }
        Some(Value::String(_)) => None,
        Some(other) => {
            alerts.push(ComplianceAlert::warning(
                AlertCode::CoercedField,
                format!(
                    "Field '{field}' is not a date ({}); ignoring it",
                    describe(Some(other))
                ),
            ));
            None
        }
    }
}

fn read_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_number(&n.to_string()),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| !c.is_whitespace() && *c != '$' && *c != ',')
                .collect();
            if cleaned.is_empty() {
                None
            } else {
                parse_number(&cleaned)
            }
        }
        _ => None,
    }
}

fn parse_number(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

fn describe(value: Option<&Value>) -> String {
    match value {
        None => "missing".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => format!("'{s}'"),
        Some(Value::Array(_)) => "a list".to_string(),
        Some(Value::Object(_)) => "an object".to_string(),
        Some(other) => other.to_string(),
    }
}

/// Category names are matched case-insensitively with `-` and spaces
/// treated as `_`.
fn canonical_category(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect()
}

enum Record {
    Income(IncomeItem),
    Deduction(DeductionItem),
}

/// Normalizes a batch of extracted records.
///
/// Records with an unknown or missing category, or that aren't JSON
/// objects, are dropped with an [`AlertCode::UnrecognizedRecord`] error.
pub fn normalize_records(records: &[Value]) -> Normalized {
    let mut normalized = Normalized::default();

    for (index, record) in records.iter().enumerate() {
        let Some(object) = record.as_object() else {
            warn!(index, "dropping extracted record that is not an object");
            normalized.alerts.push(ComplianceAlert::error(
                AlertCode::UnrecognizedRecord,
                format!("Record {index} is not an object and was skipped"),
            ));
            continue;
        };

        match normalize_record(index, object, &mut normalized.alerts) {
            Some(Record::Income(item)) => normalized.income.push(item),
            Some(Record::Deduction(item)) => normalized.deductions.push(item),
            None => {}
        }
    }

    debug!(
        records = records.len(),
        income = normalized.income.len(),
        deductions = normalized.deductions.len(),
        alerts = normalized.alerts.len(),
        "normalized extracted records"
    );
    normalized
}

/// Normalizes a whole extraction payload: either a bare array of records or
/// an object with a `records` array.
pub fn normalize_document(document: &Value) -> Normalized {
    match document {
        Value::Array(records) => normalize_records(records),
        Value::Object(object) => match object.get("records") {
            Some(Value::Array(records)) => normalize_records(records),
            _ => normalize_records(std::slice::from_ref(document)),
        },
        other => normalize_records(std::slice::from_ref(other)),
    }
}

fn normalize_record(
    index: usize,
    object: &Map<String, Value>,
    alerts: &mut Vec<ComplianceAlert>,
) -> Option<Record> {
    let Some(category) = object.get("category").and_then(Value::as_str) else {
        warn!(index, "dropping extracted record without a category");
        alerts.push(ComplianceAlert::error(
            AlertCode::UnrecognizedRecord,
            format!("Record {index} has no category and was skipped"),
        ));
        return None;
    };
    let category = canonical_category(category);

    let id = match object.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("{category}-{index}"),
    };
    let description = object
        .get("description")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    let empty = Map::new();
    let details = object
        .get("details")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let fields = Fields {
        id: &id,
        details,
        alerts,
    };

    let record = match category.as_str() {
        "wage" | "wages" | "w2" | "w_2" => Some(Record::Income(fields.income(
            object,
            |f| IncomeDetail::Wage {
                social_security_wages: f.optional_decimal("social_security_wages"),
                medicare_wages: f.optional_decimal("medicare_wages"),
            },
        ))),
        "interest" => Some(Record::Income(fields.income(object, |f| {
            IncomeDetail::Interest {
                tax_exempt: f.flag("tax_exempt", false),
            }
        }))),
        "dividend" | "dividends" => Some(Record::Income(fields.income(object, |f| {
            IncomeDetail::Dividend {
                qualified: f.decimal_or_zero("qualified"),
            }
        }))),
        "capital_gain" => Some(Record::Income(fields.income(object, |f| {
            IncomeDetail::CapitalGain {
                cost_basis: f.required_decimal("cost_basis"),
                holding: f.holding(),
                wash_sale_loss_disallowed: f.flag("wash_sale_loss_disallowed", false),
            }
        }))),
        "passive" | "rental" => Some(Record::Income(fields.income(object, |f| {
            IncomeDetail::Passive {
                property_id: f.text("property_id").unwrap_or_else(|| f.id.to_string()),
                active_participation: f.flag("active_participation", true),
            }
        }))),
        "business" => Some(Record::Income(fields.income(object, |f| {
            IncomeDetail::Business {
                expenses: f.decimal_or_zero("expenses"),
                w2_wages: f.decimal_or_zero("w2_wages"),
                ubia: f.decimal_or_zero("ubia"),
                sstb: f.flag("sstb", false),
            }
        }))),
        "social_security" => Some(Record::Income(
            fields.income(object, |_| IncomeDetail::SocialSecurity),
        )),
        "iso_exercise" => Some(Record::Income(fields.income(object, |f| {
            IncomeDetail::IsoExercise {
                shares: f.decimal_or_zero("shares"),
                exercise_price: f.decimal_or_zero("exercise_price"),
                fair_market_value: f.decimal_or_zero("fair_market_value"),
            }
        }))),
        "other" | "other_income" => Some(Record::Income(
            fields.income(object, |_| IncomeDetail::Other),
        )),
        "mortgage_interest" => Some(Record::Deduction(fields.deduction(object, |f| {
            DeductionDetail::MortgageInterest {
                origination_date: coerce_date(
                    f.details.get("origination_date"),
                    &f.name("origination_date"),
                    f.alerts,
                ),
                balance: f.decimal_or_zero("balance"),
            }
        }))),
        "state_local_tax" | "salt" => Some(Record::Deduction(fields.deduction(object, |f| {
            DeductionDetail::StateLocalTax { kind: f.salt_kind() }
        }))),
        "charity" | "charitable" => Some(Record::Deduction(fields.deduction(object, |f| {
            DeductionDetail::Charity {
                cash: f.flag("cash", true),
            }
        }))),
        "medical" => Some(Record::Deduction(
            fields.deduction(object, |_| DeductionDetail::Medical),
        )),
        "hsa_contribution" | "hsa" => Some(Record::Deduction(fields.deduction(object, |f| {
            DeductionDetail::HsaContribution {
                coverage: f.hsa_coverage(),
                eligible_months: f.months(),
            }
        }))),
        "student_loan_interest" => Some(Record::Deduction(
            fields.deduction(object, |_| DeductionDetail::StudentLoanInterest),
        )),
        "tuition" => Some(Record::Deduction(fields.deduction(object, |f| {
            DeductionDetail::Tuition {
                student: f.text("student").unwrap_or_default(),
                half_time: f.flag("half_time", true),
                first_four_years: f.flag("first_four_years", true),
                drug_conviction: f.flag("drug_conviction", false),
            }
        }))),
        "energy_improvement" | "energy" => Some(Record::Deduction(
            fields.deduction(object, |_| DeductionDetail::EnergyImprovement),
        )),
        "adoption" => Some(Record::Deduction(
            fields.deduction(object, |_| DeductionDetail::Adoption),
        )),
        _ => {
            warn!(index, category = %category, "dropping extracted record with unknown category");
            fields.alerts.push(ComplianceAlert::error(
                AlertCode::UnrecognizedRecord,
                format!("Record '{id}' has unknown category '{category}' and was skipped"),
            ));
            None
        }
    };

    let mut record = record?;
    match &mut record {
        Record::Income(item) => item.description = description,
        Record::Deduction(item) => item.description = description,
    }
    Some(record)
}

/// Field readers bound to one record, so alert messages can name the
/// record the field came from.
struct Fields<'a> {
    id: &'a str,
    details: &'a Map<String, Value>,
    alerts: &'a mut Vec<ComplianceAlert>,
}

impl Fields<'_> {
    fn name(
        &self,
        field: &str,
    ) -> String {
        format!("{}.{field}", self.id)
    }

    fn income(
        mut self,
        object: &Map<String, Value>,
        detail: impl FnOnce(&mut Self) -> IncomeDetail,
    ) -> IncomeItem {
        let amount = coerce_decimal(object.get("amount"), &self.name("amount"), self.alerts);
        let withholding = match object.get("withholding") {
            None | Some(Value::Null) => Decimal::ZERO,
            value => coerce_decimal(value, &self.name("withholding"), self.alerts),
        };
        let detail = detail(&mut self);
        IncomeItem::new(self.id, amount, detail).with_withholding(withholding)
    }

    fn deduction(
        mut self,
        object: &Map<String, Value>,
        detail: impl FnOnce(&mut Self) -> DeductionDetail,
    ) -> DeductionItem {
        let amount = coerce_decimal(object.get("amount"), &self.name("amount"), self.alerts);
        let detail = detail(&mut self);
        DeductionItem::new(self.id, amount, detail)
    }

    fn required_decimal(
        &mut self,
        field: &str,
    ) -> Decimal {
        let name = self.name(field);
        coerce_decimal(self.details.get(field), &name, self.alerts)
    }

    fn decimal_or_zero(
        &mut self,
        field: &str,
    ) -> Decimal {
        self.optional_decimal(field).unwrap_or_default()
    }

    /// `None` when absent; zero with a warning when present but unreadable.
    fn optional_decimal(
        &mut self,
        field: &str,
    ) -> Option<Decimal> {
        match self.details.get(field) {
            None | Some(Value::Null) => None,
            value => {
                let name = self.name(field);
                Some(coerce_decimal(value, &name, self.alerts))
            }
        }
    }

    fn flag(
        &mut self,
        field: &str,
        default: bool,
    ) -> bool {
        let name = self.name(field);
        coerce_bool(self.details.get(field), &name, default, self.alerts)
    }

    fn text(
        &self,
        field: &str,
    ) -> Option<String> {
        match self.details.get(field) {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    fn months(&mut self) -> u8 {
        match self.details.get("eligible_months") {
            None | Some(Value::Null) => 12,
            value => {
                let name = self.name("eligible_months");
                let months = coerce_decimal(value, &name, self.alerts);
                months
                    .trunc()
                    .clamp(Decimal::ZERO, Decimal::from(12))
                    .to_u8()
                    .unwrap_or(12)
            }
        }
    }

    fn choice<T: Copy>(
        &mut self,
        field: &str,
        options: &[(&str, T)],
        fallback: T,
        fallback_name: &str,
    ) -> T {
        let raw = self.text(field).map(|s| canonical_category(&s));
        let found = raw
            .as_deref()
            .and_then(|raw| options.iter().find(|(name, _)| *name == raw));
        if let Some((_, value)) = found {
            return *value;
        }

        let shown = raw.map_or_else(|| "missing".to_string(), |s| format!("'{s}'"));
        let message = format!(
            "Field '{}' is {shown}; using {fallback_name}",
            self.name(field)
        );
        self.alerts
            .push(ComplianceAlert::warning(AlertCode::CoercedField, message));
        fallback
    }

    fn holding(&mut self) -> HoldingPeriod {
        self.choice(
            "holding",
            &[
                ("short_term", HoldingPeriod::ShortTerm),
                ("short", HoldingPeriod::ShortTerm),
                ("st", HoldingPeriod::ShortTerm),
                ("long_term", HoldingPeriod::LongTerm),
                ("long", HoldingPeriod::LongTerm),
                ("lt", HoldingPeriod::LongTerm),
                ("unrecaptured_1250", HoldingPeriod::Unrecaptured1250),
                ("section_1250", HoldingPeriod::Unrecaptured1250),
                ("collectibles", HoldingPeriod::Collectibles),
            ],
            HoldingPeriod::ShortTerm,
            "short_term",
        )
    }

    fn salt_kind(&mut self) -> SaltKind {
        self.choice(
            "kind",
            &[
                ("income", SaltKind::Income),
                ("sales", SaltKind::Sales),
                ("property", SaltKind::Property),
            ],
            SaltKind::Income,
            "income",
        )
    }

    fn hsa_coverage(&mut self) -> HsaCoverage {
        self.choice(
            "coverage",
            &[
                ("self_only", HsaCoverage::SelfOnly),
                ("self", HsaCoverage::SelfOnly),
                ("individual", HsaCoverage::SelfOnly),
                ("family", HsaCoverage::Family),
            ],
            HsaCoverage::SelfOnly,
            "self_only",
        )
    }
}
