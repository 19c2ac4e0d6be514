//! Year-specific tax law parameters injected into the engine.
//!
//! Every bracket, threshold, rate and limit the engine uses lives in a
//! [`TaxYearProfile`]. The built-in [`TaxYearProfile::tax_year_2025`] profile
//! is used by [`crate::compute`]; other years (or test fixtures) are loaded
//! from TOML/CSV by the `tax-data` crate and checked with
//! [`TaxYearProfile::validate`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{FilingStatus, TaxBracket};
use crate::calculations::worksheets::SeWorksheetConfig;

/// Errors raised when a profile is internally inconsistent.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("{table} schedule for {status} is empty")]
    EmptySchedule {
        table: &'static str,
        status: FilingStatus,
    },

    #[error("{table} schedule for {status} must start at zero, starts at {start}")]
    ScheduleStart {
        table: &'static str,
        status: FilingStatus,
        start: Decimal,
    },

    #[error("{table} schedule for {status} has a gap or overlap at {at}")]
    ScheduleGap {
        table: &'static str,
        status: FilingStatus,
        at: Decimal,
    },

    #[error("{table} schedule for {status} must end with an open-ended bracket")]
    ScheduleNotOpenEnded {
        table: &'static str,
        status: FilingStatus,
    },

    #[error("rate {name} must be between 0 and 1, got {value}")]
    InvalidRate { name: String, value: Decimal },

    #[error("phaseout range {name} is inverted: start {start} > end {end}")]
    InvertedPhaseout {
        name: String,
        start: Decimal,
        end: Decimal,
    },

    #[error("earned income credit table has no rows")]
    EmptyEicTable,

    #[error("limit {name} must be {bound}, got {value}")]
    InvalidLimit {
        name: String,
        bound: &'static str,
        value: Decimal,
    },
}

/// A value that differs by filing status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTable<T> {
    pub single: T,
    pub married_joint: T,
    pub married_separate: T,
    pub head_of_household: T,
}

impl<T> StatusTable<T> {
    pub fn get(
        &self,
        status: FilingStatus,
    ) -> &T {
        match status {
            FilingStatus::Single => &self.single,
            FilingStatus::MarriedFilingJointly => &self.married_joint,
            FilingStatus::MarriedFilingSeparately => &self.married_separate,
            FilingStatus::HeadOfHousehold => &self.head_of_household,
        }
    }

    pub fn get_mut(
        &mut self,
        status: FilingStatus,
    ) -> &mut T {
        match status {
            FilingStatus::Single => &mut self.single,
            FilingStatus::MarriedFilingJointly => &mut self.married_joint,
            FilingStatus::MarriedFilingSeparately => &mut self.married_separate,
            FilingStatus::HeadOfHousehold => &mut self.head_of_household,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FilingStatus, &T)> {
        FilingStatus::ALL
            .into_iter()
            .map(move |status| (status, self.get(status)))
    }
}

impl<T: Clone> StatusTable<T> {
    pub fn uniform(value: T) -> Self {
        Self {
            single: value.clone(),
            married_joint: value.clone(),
            married_separate: value.clone(),
            head_of_household: value,
        }
    }

    /// Joint filers get `joint`, separate filers get `separate`, everyone else `other`.
    pub fn by_marriage(
        other: T,
        joint: T,
        separate: T,
    ) -> Self {
        Self {
            single: other.clone(),
            married_joint: joint,
            married_separate: separate,
            head_of_household: other,
        }
    }
}

/// Income range over which a benefit phases out linearly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseoutRange {
    pub start: Decimal,
    pub end: Decimal,
}

impl PhaseoutRange {
    pub fn new(
        start: Decimal,
        end: Decimal,
    ) -> Self {
        Self { start, end }
    }

    /// Share of the benefit that survives at `income`: 1 below `start`,
    /// 0 at or above `end`, linear in between.
    pub fn factor(
        &self,
        income: Decimal,
    ) -> Decimal {
        if income < self.start {
            Decimal::ONE
        } else if income >= self.end {
            Decimal::ZERO
        } else {
            (self.end - income) / (self.end - self.start)
        }
    }

    /// How far `income` has moved through the range, 0 at `start`, 1 at `end`.
    pub fn progress(
        &self,
        income: Decimal,
    ) -> Decimal {
        Decimal::ONE - self.factor(income)
    }
}

/// What to do with a capital loss flagged as disallowed by the wash-sale rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WashSaleTreatment {
    /// Count the loss as reported and only raise an alert.
    #[default]
    ReportAsFiled,
    /// Exclude the disallowed loss from the capital loss totals.
    Disallow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionLimits {
    pub standard: StatusTable<Decimal>,
    /// Per 65+/blind box for single and head-of-household filers.
    pub additional_unmarried: Decimal,
    /// Per 65+/blind box for married filers.
    pub additional_married: Decimal,
    pub salt_cap: StatusTable<Decimal>,
    pub mortgage_debt_cap: StatusTable<Decimal>,
    /// Cap for acquisition debt originated on or before `mortgage_cap_cutoff`.
    pub grandfathered_mortgage_debt_cap: StatusTable<Decimal>,
    pub mortgage_cap_cutoff: NaiveDate,
    pub medical_agi_floor: Decimal,
    pub charity_cash_agi_limit: Decimal,
    pub charity_noncash_agi_limit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentLimits {
    pub hsa_self_only: Decimal,
    pub hsa_family: Decimal,
    pub hsa_senior_catch_up: Decimal,
    pub student_loan_interest_cap: Decimal,
    pub student_loan_phaseout: StatusTable<PhaseoutRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassiveLossLimits {
    pub special_allowance: Decimal,
    pub phaseout_start: Decimal,
    pub reduction_rate: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BenefitBase {
    pub base_amount: Decimal,
    pub adjusted_base_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialSecurityLimits {
    pub base: StatusTable<BenefitBase>,
    pub lower_rate: Decimal,
    pub upper_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapitalGainLimits {
    pub loss_limit: StatusTable<Decimal>,
    pub unrecaptured_1250_rate: Decimal,
    pub collectibles_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QbiLimits {
    pub rate: Decimal,
    pub threshold: StatusTable<PhaseoutRange>,
    pub wage_rate: Decimal,
    pub alt_wage_rate: Decimal,
    pub ubia_rate: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmtLimits {
    pub exemption: StatusTable<Decimal>,
    pub phaseout_start: StatusTable<Decimal>,
    pub phaseout_rate: Decimal,
    pub lower_rate: Decimal,
    pub upper_rate: Decimal,
    pub rate_boundary: StatusTable<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildCreditLimits {
    pub per_child: Decimal,
    pub other_dependent: Decimal,
    pub age_limit: u32,
    pub phaseout_threshold: StatusTable<Decimal>,
    pub reduction_per_step: Decimal,
    pub step: Decimal,
    pub refundable_per_child: Decimal,
    pub refundable_rate: Decimal,
    pub earned_income_floor: Decimal,
}

/// One row of the earned income credit table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EicRow {
    pub credit_rate: Decimal,
    pub max_earned_income: Decimal,
    pub phaseout_rate: Decimal,
    pub phaseout_start: Decimal,
    pub phaseout_start_joint: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EicLimits {
    pub investment_income_limit: Decimal,
    /// Indexed by qualifying-child count; the last row covers all larger counts.
    pub rows: Vec<EicRow>,
}

impl EicLimits {
    pub fn row_for(
        &self,
        children: usize,
    ) -> Option<&EicRow> {
        self.rows.get(children.min(self.rows.len().saturating_sub(1)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AotcLimits {
    pub full_credit_expenses: Decimal,
    pub partial_credit_expenses: Decimal,
    pub partial_rate: Decimal,
    pub refundable_rate: Decimal,
    pub refundable_cap: Decimal,
    pub phaseout: StatusTable<PhaseoutRange>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdoptionLimits {
    pub max_credit: Decimal,
    pub phaseout: PhaseoutRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditLimits {
    pub child: ChildCreditLimits,
    pub eic: EicLimits,
    pub aotc: AotcLimits,
    pub energy_rate: Decimal,
    pub adoption: AdoptionLimits,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurtaxLimits {
    pub niit_rate: Decimal,
    pub niit_threshold: StatusTable<Decimal>,
    pub medicare_rate: Decimal,
    pub medicare_threshold: StatusTable<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxYearProfile {
    pub tax_year: i32,
    #[serde(default)]
    pub wash_sale_treatment: WashSaleTreatment,
    pub ordinary_brackets: StatusTable<Vec<TaxBracket>>,
    pub capital_gains_brackets: StatusTable<Vec<TaxBracket>>,
    pub deductions: DeductionLimits,
    pub self_employment: SeWorksheetConfig,
    pub adjustments: AdjustmentLimits,
    pub passive: PassiveLossLimits,
    pub social_security: SocialSecurityLimits,
    pub capital_gains: CapitalGainLimits,
    pub qbi: QbiLimits,
    pub amt: AmtLimits,
    pub credits: CreditLimits,
    pub surtax: SurtaxLimits,
}

fn schedule(
    bounds: &[Decimal],
    rates: &[Decimal],
) -> Vec<TaxBracket> {
    let mut min = Decimal::ZERO;
    let mut brackets = Vec::with_capacity(rates.len());
    for (i, rate) in rates.iter().enumerate() {
        let max = bounds.get(i).copied();
        brackets.push(TaxBracket::new(min, max, *rate));
        if let Some(max) = max {
            min = max;
        }
    }
    brackets
}

impl TaxYearProfile {
    /// Parameters for tax year 2025.
    pub fn tax_year_2025() -> Self {
        let ordinary_rates = [
            dec!(0.10),
            dec!(0.12),
            dec!(0.22),
            dec!(0.24),
            dec!(0.32),
            dec!(0.35),
            dec!(0.37),
        ];
        let gains_rates = [dec!(0.00), dec!(0.15), dec!(0.20)];

        Self {
            tax_year: 2025,
            wash_sale_treatment: WashSaleTreatment::ReportAsFiled,
            ordinary_brackets: StatusTable {
                single: schedule(
                    &[
                        dec!(11925),
                        dec!(48475),
                        dec!(103350),
                        dec!(197300),
                        dec!(250525),
                        dec!(626350),
                    ],
                    &ordinary_rates,
                ),
                married_joint: schedule(
                    &[
                        dec!(23850),
                        dec!(96950),
                        dec!(206700),
                        dec!(394600),
                        dec!(501050),
                        dec!(751600),
                    ],
                    &ordinary_rates,
                ),
                married_separate: schedule(
                    &[
                        dec!(11925),
                        dec!(48475),
                        dec!(103350),
                        dec!(197300),
                        dec!(250525),
                        dec!(375800),
                    ],
                    &ordinary_rates,
                ),
                head_of_household: schedule(
                    &[
                        dec!(17000),
                        dec!(64850),
                        dec!(103350),
                        dec!(197300),
                        dec!(250500),
                        dec!(626350),
                    ],
                    &ordinary_rates,
                ),
            },
            capital_gains_brackets: StatusTable {
                single: schedule(&[dec!(48350), dec!(533400)], &gains_rates),
                married_joint: schedule(&[dec!(96700), dec!(600050)], &gains_rates),
                married_separate: schedule(&[dec!(48350), dec!(300000)], &gains_rates),
                head_of_household: schedule(&[dec!(64750), dec!(566700)], &gains_rates),
            },
            deductions: DeductionLimits {
                standard: StatusTable {
                    single: dec!(15600),
                    married_joint: dec!(31200),
                    married_separate: dec!(15600),
                    head_of_household: dec!(23400),
                },
                additional_unmarried: dec!(2000),
                additional_married: dec!(1600),
                salt_cap: StatusTable::by_marriage(dec!(10000), dec!(10000), dec!(5000)),
                mortgage_debt_cap: StatusTable::by_marriage(
                    dec!(750000),
                    dec!(750000),
                    dec!(375000),
                ),
                grandfathered_mortgage_debt_cap: StatusTable::by_marriage(
                    dec!(1000000),
                    dec!(1000000),
                    dec!(500000),
                ),
                mortgage_cap_cutoff: NaiveDate::from_ymd_opt(2017, 12, 15)
                    .unwrap_or(NaiveDate::MIN),
                medical_agi_floor: dec!(0.075),
                charity_cash_agi_limit: dec!(0.60),
                charity_noncash_agi_limit: dec!(0.30),
            },
            self_employment: SeWorksheetConfig {
                ss_wage_max: dec!(176100.00),
                ss_tax_rate: dec!(0.124),
                medicare_tax_rate: dec!(0.029),
                net_earnings_factor: dec!(0.9235),
                deduction_factor: dec!(0.50),
                min_se_threshold: dec!(400.00),
            },
            adjustments: AdjustmentLimits {
                hsa_self_only: dec!(4300),
                hsa_family: dec!(8550),
                hsa_senior_catch_up: dec!(1000),
                student_loan_interest_cap: dec!(2500),
                student_loan_phaseout: StatusTable::by_marriage(
                    PhaseoutRange::new(dec!(85000), dec!(100000)),
                    PhaseoutRange::new(dec!(170000), dec!(200000)),
                    PhaseoutRange::new(Decimal::ZERO, Decimal::ZERO),
                ),
            },
            passive: PassiveLossLimits {
                special_allowance: dec!(25000),
                phaseout_start: dec!(100000),
                reduction_rate: dec!(0.50),
            },
            social_security: SocialSecurityLimits {
                base: StatusTable::by_marriage(
                    BenefitBase {
                        base_amount: dec!(25000),
                        adjusted_base_amount: dec!(34000),
                    },
                    BenefitBase {
                        base_amount: dec!(32000),
                        adjusted_base_amount: dec!(44000),
                    },
                    BenefitBase {
                        base_amount: Decimal::ZERO,
                        adjusted_base_amount: Decimal::ZERO,
                    },
                ),
                lower_rate: dec!(0.50),
                upper_rate: dec!(0.85),
            },
            capital_gains: CapitalGainLimits {
                loss_limit: StatusTable::by_marriage(dec!(3000), dec!(3000), dec!(1500)),
                unrecaptured_1250_rate: dec!(0.25),
                collectibles_rate: dec!(0.28),
            },
            qbi: QbiLimits {
                rate: dec!(0.20),
                threshold: StatusTable::by_marriage(
                    PhaseoutRange::new(dec!(197300), dec!(247300)),
                    PhaseoutRange::new(dec!(394600), dec!(494600)),
                    PhaseoutRange::new(dec!(197300), dec!(247300)),
                ),
                wage_rate: dec!(0.50),
                alt_wage_rate: dec!(0.25),
                ubia_rate: dec!(0.025),
            },
            amt: AmtLimits {
                exemption: StatusTable::by_marriage(dec!(88100), dec!(137000), dec!(68500)),
                phaseout_start: StatusTable::by_marriage(
                    dec!(626350),
                    dec!(1252700),
                    dec!(626350),
                ),
                phaseout_rate: dec!(0.25),
                lower_rate: dec!(0.26),
                upper_rate: dec!(0.28),
                rate_boundary: StatusTable::by_marriage(dec!(239100), dec!(239100), dec!(119550)),
            },
            credits: CreditLimits {
                child: ChildCreditLimits {
                    per_child: dec!(2000),
                    other_dependent: dec!(500),
                    age_limit: 17,
                    phaseout_threshold: StatusTable::by_marriage(
                        dec!(200000),
                        dec!(400000),
                        dec!(200000),
                    ),
                    reduction_per_step: dec!(50),
                    step: dec!(1000),
                    refundable_per_child: dec!(1700),
                    refundable_rate: dec!(0.15),
                    earned_income_floor: dec!(2500),
                },
                eic: EicLimits {
                    investment_income_limit: dec!(11950),
                    rows: vec![
                        EicRow {
                            credit_rate: dec!(0.0765),
                            max_earned_income: dec!(8490),
                            phaseout_rate: dec!(0.0765),
                            phaseout_start: dec!(10620),
                            phaseout_start_joint: dec!(17730),
                        },
                        EicRow {
                            credit_rate: dec!(0.34),
                            max_earned_income: dec!(12730),
                            phaseout_rate: dec!(0.1598),
                            phaseout_start: dec!(23350),
                            phaseout_start_joint: dec!(30470),
                        },
                        EicRow {
                            credit_rate: dec!(0.40),
                            max_earned_income: dec!(17880),
                            phaseout_rate: dec!(0.2106),
                            phaseout_start: dec!(23350),
                            phaseout_start_joint: dec!(30470),
                        },
                        EicRow {
                            credit_rate: dec!(0.45),
                            max_earned_income: dec!(17880),
                            phaseout_rate: dec!(0.2106),
                            phaseout_start: dec!(23350),
                            phaseout_start_joint: dec!(30470),
                        },
                    ],
                },
                aotc: AotcLimits {
                    full_credit_expenses: dec!(2000),
                    partial_credit_expenses: dec!(2000),
                    partial_rate: dec!(0.25),
                    refundable_rate: dec!(0.40),
                    refundable_cap: dec!(1000),
                    phaseout: StatusTable::by_marriage(
                        PhaseoutRange::new(dec!(80000), dec!(90000)),
                        PhaseoutRange::new(dec!(160000), dec!(180000)),
                        PhaseoutRange::new(Decimal::ZERO, Decimal::ZERO),
                    ),
                },
                energy_rate: dec!(0.30),
                adoption: AdoptionLimits {
                    max_credit: dec!(17280),
                    phaseout: PhaseoutRange::new(dec!(259190), dec!(299190)),
                },
            },
            surtax: SurtaxLimits {
                niit_rate: dec!(0.038),
                niit_threshold: StatusTable::by_marriage(
                    dec!(200000),
                    dec!(250000),
                    dec!(125000),
                ),
                medicare_rate: dec!(0.009),
                medicare_threshold: StatusTable::by_marriage(
                    dec!(200000),
                    dec!(250000),
                    dec!(125000),
                ),
            },
        }
    }

    /// Checks that every schedule, rate and range in the profile is usable.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProfileError`] found.
    pub fn validate(&self) -> Result<(), ProfileError> {
        for (table, schedules) in [
            ("ordinary", &self.ordinary_brackets),
            ("capital gains", &self.capital_gains_brackets),
        ] {
            for (status, brackets) in schedules.iter() {
                validate_schedule(table, status, brackets)?;
            }
        }

        let rates = [
            ("deductions.medical_agi_floor", self.deductions.medical_agi_floor),
            (
                "deductions.charity_cash_agi_limit",
                self.deductions.charity_cash_agi_limit,
            ),
            (
                "deductions.charity_noncash_agi_limit",
                self.deductions.charity_noncash_agi_limit,
            ),
            ("passive.reduction_rate", self.passive.reduction_rate),
            ("social_security.lower_rate", self.social_security.lower_rate),
            ("social_security.upper_rate", self.social_security.upper_rate),
            (
                "capital_gains.unrecaptured_1250_rate",
                self.capital_gains.unrecaptured_1250_rate,
            ),
            (
                "capital_gains.collectibles_rate",
                self.capital_gains.collectibles_rate,
            ),
            ("qbi.rate", self.qbi.rate),
            ("qbi.wage_rate", self.qbi.wage_rate),
            ("qbi.alt_wage_rate", self.qbi.alt_wage_rate),
            ("qbi.ubia_rate", self.qbi.ubia_rate),
            ("amt.phaseout_rate", self.amt.phaseout_rate),
            ("amt.lower_rate", self.amt.lower_rate),
            ("amt.upper_rate", self.amt.upper_rate),
            (
                "credits.child.refundable_rate",
                self.credits.child.refundable_rate,
            ),
            ("credits.aotc.partial_rate", self.credits.aotc.partial_rate),
            (
                "credits.aotc.refundable_rate",
                self.credits.aotc.refundable_rate,
            ),
            ("credits.energy_rate", self.credits.energy_rate),
            ("surtax.niit_rate", self.surtax.niit_rate),
            ("surtax.medicare_rate", self.surtax.medicare_rate),
            ("self_employment.ss_tax_rate", self.self_employment.ss_tax_rate),
            (
                "self_employment.medicare_tax_rate",
                self.self_employment.medicare_tax_rate,
            ),
            (
                "self_employment.net_earnings_factor",
                self.self_employment.net_earnings_factor,
            ),
            (
                "self_employment.deduction_factor",
                self.self_employment.deduction_factor,
            ),
        ];
        for (name, value) in rates {
            check_rate(name, value)?;
        }

        // Divisors
        for (name, value) in [
            ("self_employment.ss_wage_max", self.self_employment.ss_wage_max),
            ("credits.child.step", self.credits.child.step),
        ] {
            if value <= Decimal::ZERO {
                return Err(ProfileError::InvalidLimit {
                    name: name.to_string(),
                    bound: "positive",
                    value,
                });
            }
        }

        for (name, value) in self.amount_limits() {
            if value < Decimal::ZERO {
                return Err(ProfileError::InvalidLimit {
                    name,
                    bound: "non-negative",
                    value,
                });
            }
        }

        if self.credits.eic.rows.is_empty() {
            return Err(ProfileError::EmptyEicTable);
        }
        for (i, row) in self.credits.eic.rows.iter().enumerate() {
            check_rate(&format!("credits.eic.rows[{i}].credit_rate"), row.credit_rate)?;
            check_rate(
                &format!("credits.eic.rows[{i}].phaseout_rate"),
                row.phaseout_rate,
            )?;
        }

        let mut ranges = vec![(
            "credits.adoption.phaseout".to_string(),
            self.credits.adoption.phaseout,
        )];
        for (name, table) in [
            ("adjustments.student_loan_phaseout", &self.adjustments.student_loan_phaseout),
            ("qbi.threshold", &self.qbi.threshold),
            ("credits.aotc.phaseout", &self.credits.aotc.phaseout),
        ] {
            ranges.extend(
                table
                    .iter()
                    .map(|(status, range)| (format!("{name}.{status}"), *range)),
            );
        }
        for (name, range) in ranges {
            if range.start > range.end {
                return Err(ProfileError::InvertedPhaseout {
                    name,
                    start: range.start,
                    end: range.end,
                });
            }
        }

        Ok(())
    }
}

impl TaxYearProfile {
    /// Every dollar cap, threshold and amount, named by its path.
    fn amount_limits(&self) -> Vec<(String, Decimal)> {
        let d = &self.deductions;
        let a = &self.adjustments;
        let child = &self.credits.child;
        let aotc = &self.credits.aotc;

        let mut limits: Vec<(String, Decimal)> = [
            ("deductions.additional_unmarried", d.additional_unmarried),
            ("deductions.additional_married", d.additional_married),
            (
                "self_employment.min_se_threshold",
                self.self_employment.min_se_threshold,
            ),
            ("adjustments.hsa_self_only", a.hsa_self_only),
            ("adjustments.hsa_family", a.hsa_family),
            ("adjustments.hsa_senior_catch_up", a.hsa_senior_catch_up),
            ("adjustments.student_loan_interest_cap", a.student_loan_interest_cap),
            ("passive.special_allowance", self.passive.special_allowance),
            ("passive.phaseout_start", self.passive.phaseout_start),
            ("credits.child.per_child", child.per_child),
            ("credits.child.other_dependent", child.other_dependent),
            ("credits.child.reduction_per_step", child.reduction_per_step),
            ("credits.child.refundable_per_child", child.refundable_per_child),
            ("credits.child.earned_income_floor", child.earned_income_floor),
            (
                "credits.eic.investment_income_limit",
                self.credits.eic.investment_income_limit,
            ),
            ("credits.aotc.full_credit_expenses", aotc.full_credit_expenses),
            ("credits.aotc.partial_credit_expenses", aotc.partial_credit_expenses),
            ("credits.aotc.refundable_cap", aotc.refundable_cap),
            ("credits.adoption.max_credit", self.credits.adoption.max_credit),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect();

        for (name, table) in [
            ("deductions.standard", &d.standard),
            ("deductions.salt_cap", &d.salt_cap),
            ("deductions.mortgage_debt_cap", &d.mortgage_debt_cap),
            (
                "deductions.grandfathered_mortgage_debt_cap",
                &d.grandfathered_mortgage_debt_cap,
            ),
            ("capital_gains.loss_limit", &self.capital_gains.loss_limit),
            ("amt.exemption", &self.amt.exemption),
            ("amt.phaseout_start", &self.amt.phaseout_start),
            ("amt.rate_boundary", &self.amt.rate_boundary),
            ("credits.child.phaseout_threshold", &child.phaseout_threshold),
            ("surtax.niit_threshold", &self.surtax.niit_threshold),
            ("surtax.medicare_threshold", &self.surtax.medicare_threshold),
        ] {
            limits.extend(
                table
                    .iter()
                    .map(|(status, value)| (format!("{name}.{status}"), *value)),
            );
        }

        for (i, row) in self.credits.eic.rows.iter().enumerate() {
            limits.push((
                format!("credits.eic.rows[{i}].max_earned_income"),
                row.max_earned_income,
            ));
            limits.push((format!("credits.eic.rows[{i}].phaseout_start"), row.phaseout_start));
            limits.push((
                format!("credits.eic.rows[{i}].phaseout_start_joint"),
                row.phaseout_start_joint,
            ));
        }

        limits
    }
}

impl Default for TaxYearProfile {
    fn default() -> Self {
        Self::tax_year_2025()
    }
}

fn check_rate(
    name: &str,
    value: Decimal,
) -> Result<(), ProfileError> {
    if value < Decimal::ZERO || value > Decimal::ONE {
        return Err(ProfileError::InvalidRate {
            name: name.to_string(),
            value,
        });
    }
    Ok(())
}

fn validate_schedule(
    table: &'static str,
    status: FilingStatus,
    brackets: &[TaxBracket],
) -> Result<(), ProfileError> {
    let first = brackets
        .first()
        .ok_or(ProfileError::EmptySchedule { table, status })?;
    if first.min_income != Decimal::ZERO {
        return Err(ProfileError::ScheduleStart {
            table,
            status,
            start: first.min_income,
        });
    }

    for (i, bracket) in brackets.iter().enumerate() {
        check_rate(&format!("{table}.{status}[{i}]"), bracket.rate)?;
        match (bracket.max_income, brackets.get(i + 1)) {
            (Some(max), Some(next)) if next.min_income != max || max <= bracket.min_income => {
                return Err(ProfileError::ScheduleGap {
                    table,
                    status,
                    at: max,
                });
            }
            (None, Some(next)) => {
                return Err(ProfileError::ScheduleGap {
                    table,
                    status,
                    at: next.min_income,
                });
            }
            (Some(_), None) => {
                return Err(ProfileError::ScheduleNotOpenEnded { table, status });
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn built_in_profile_is_valid() {
        assert_eq!(TaxYearProfile::tax_year_2025().validate(), Ok(()));
    }

    #[test]
    fn phaseout_factor_is_linear_between_bounds() {
        let range = PhaseoutRange::new(dec!(80000), dec!(90000));

        assert_eq!(range.factor(dec!(79999.99)), Decimal::ONE);
        assert_eq!(range.factor(dec!(85000)), dec!(0.5));
        assert_eq!(range.factor(dec!(90000)), Decimal::ZERO);
        assert_eq!(range.factor(dec!(120000)), Decimal::ZERO);
    }

    #[test]
    fn degenerate_phaseout_range_allows_nothing_at_zero() {
        let range = PhaseoutRange::new(Decimal::ZERO, Decimal::ZERO);

        assert_eq!(range.factor(Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn eic_row_lookup_saturates_at_last_row() {
        let eic = TaxYearProfile::tax_year_2025().credits.eic;

        assert_eq!(eic.row_for(1), eic.rows.get(1));
        assert_eq!(eic.row_for(7), eic.rows.get(3));
    }

    #[test]
    fn validate_rejects_gapped_schedule() {
        let mut profile = TaxYearProfile::tax_year_2025();
        profile.ordinary_brackets.single[1].min_income = dec!(12000);

        assert_eq!(
            profile.validate(),
            Err(ProfileError::ScheduleGap {
                table: "ordinary",
                status: FilingStatus::Single,
                at: dec!(11925),
            })
        );
    }

    #[test]
    fn validate_rejects_closed_top_bracket() {
        let mut profile = TaxYearProfile::tax_year_2025();
        if let Some(last) = profile.capital_gains_brackets.married_joint.last_mut() {
            last.max_income = Some(dec!(10000000));
        }

        assert_eq!(
            profile.validate(),
            Err(ProfileError::ScheduleNotOpenEnded {
                table: "capital gains",
                status: FilingStatus::MarriedFilingJointly,
            })
        );
    }

    #[test]
    fn validate_rejects_rate_above_one() {
        let mut profile = TaxYearProfile::tax_year_2025();
        profile.surtax.niit_rate = dec!(3.8);

        assert_eq!(
            profile.validate(),
            Err(ProfileError::InvalidRate {
                name: "surtax.niit_rate".to_string(),
                value: dec!(3.8),
            })
        );
    }

    #[test]
    fn validate_rejects_inverted_phaseout() {
        let mut profile = TaxYearProfile::tax_year_2025();
        profile.qbi.threshold.single = PhaseoutRange::new(dec!(300000), dec!(200000));

        assert_eq!(
            profile.validate(),
            Err(ProfileError::InvertedPhaseout {
                name: "qbi.threshold.S".to_string(),
                start: dec!(300000),
                end: dec!(200000),
            })
        );
    }

    #[test]
    fn validate_rejects_non_positive_wage_base() {
        let mut profile = TaxYearProfile::tax_year_2025();
        profile.self_employment.ss_wage_max = dec!(-1);

        assert_eq!(
            profile.validate(),
            Err(ProfileError::InvalidLimit {
                name: "self_employment.ss_wage_max".to_string(),
                bound: "positive",
                value: dec!(-1),
            })
        );
    }

    #[test]
    fn validate_rejects_zero_child_credit_step() {
        let mut profile = TaxYearProfile::tax_year_2025();
        profile.credits.child.step = dec!(0);

        assert_eq!(
            profile.validate(),
            Err(ProfileError::InvalidLimit {
                name: "credits.child.step".to_string(),
                bound: "positive",
                value: dec!(0),
            })
        );
    }

    #[test]
    fn validate_rejects_negative_child_credit_reduction() {
        let mut profile = TaxYearProfile::tax_year_2025();
        profile.credits.child.reduction_per_step = dec!(-50);

        assert_eq!(
            profile.validate(),
            Err(ProfileError::InvalidLimit {
                name: "credits.child.reduction_per_step".to_string(),
                bound: "non-negative",
                value: dec!(-50),
            })
        );
    }

    #[test]
    fn validate_rejects_negative_mortgage_caps() {
        let mut profile = TaxYearProfile::tax_year_2025();
        profile.deductions.mortgage_debt_cap.married_joint = dec!(-1);

        assert_eq!(
            profile.validate(),
            Err(ProfileError::InvalidLimit {
                name: "deductions.mortgage_debt_cap.MFJ".to_string(),
                bound: "non-negative",
                value: dec!(-1),
            })
        );

        let mut profile = TaxYearProfile::tax_year_2025();
        profile.deductions.grandfathered_mortgage_debt_cap.single = dec!(-1);

        assert_eq!(
            profile.validate(),
            Err(ProfileError::InvalidLimit {
                name: "deductions.grandfathered_mortgage_debt_cap.S".to_string(),
                bound: "non-negative",
                value: dec!(-1),
            })
        );
    }

    #[test]
    fn validate_rejects_negative_salt_cap_and_thresholds() {
        let mut profile = TaxYearProfile::tax_year_2025();
        profile.deductions.salt_cap.married_separate = dec!(-5000);

        assert!(matches!(
            profile.validate(),
            Err(ProfileError::InvalidLimit { name, .. }) if name == "deductions.salt_cap.MFS"
        ));

        let mut profile = TaxYearProfile::tax_year_2025();
        profile.surtax.niit_threshold.head_of_household = dec!(-1);

        assert!(matches!(
            profile.validate(),
            Err(ProfileError::InvalidLimit { name, .. }) if name == "surtax.niit_threshold.HOH"
        ));

        let mut profile = TaxYearProfile::tax_year_2025();
        profile.credits.eic.rows[2].phaseout_start = dec!(-1);

        assert!(matches!(
            profile.validate(),
            Err(ProfileError::InvalidLimit { name, .. })
                if name == "credits.eic.rows[2].phaseout_start"
        ));
    }

    #[test]
    fn zero_limits_are_allowed() {
        let mut profile = TaxYearProfile::tax_year_2025();
        profile.deductions.salt_cap = StatusTable::uniform(dec!(0));
        profile.credits.adoption.max_credit = dec!(0);

        assert_eq!(profile.validate(), Ok(()));
    }

    #[test]
    fn validate_checks_self_employment_rates() {
        let mut profile = TaxYearProfile::tax_year_2025();
        profile.self_employment.net_earnings_factor = dec!(1.5);

        assert_eq!(
            profile.validate(),
            Err(ProfileError::InvalidRate {
                name: "self_employment.net_earnings_factor".to_string(),
                value: dec!(1.5),
            })
        );
    }
}
