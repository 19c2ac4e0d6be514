//! Integration tests for the data boundary feeding a real engine.

use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;
use serde_json::json;
use tax_core::{FilingStatus, IncomeItem, TaxBracket, TaxEngine, TaxPayer, TaxYearProfile};
use tax_data::{BracketLoader, BracketLoaderError, load_profile, normalize_records, to_toml};

const TEST_CSV_2025: &str = include_str!("../test-data/tax_brackets_2025.csv");

#[test]
fn test_load_all_2025_brackets() {
    let records = BracketLoader::parse(TEST_CSV_2025.as_bytes()).expect("Failed to parse CSV");
    let mut profile = TaxYearProfile::tax_year_2025();

    let replaced = BracketLoader::apply(&mut profile, &records).expect("Failed to apply brackets");

    // 4 statuses x (ordinary + capital gains)
    assert_eq!(replaced, 8);
    assert_eq!(records.len(), 40);
    assert_eq!(profile, TaxYearProfile::tax_year_2025());
}

#[test]
fn test_loaded_brackets_drive_engine() {
    let flat = "tax_year,schedule,kind,min_income,max_income,rate\n\
                2025,X,ordinary,0,,0.20\n";
    let records = BracketLoader::parse(flat.as_bytes()).unwrap();
    let mut profile = TaxYearProfile::tax_year_2025();
    BracketLoader::apply(&mut profile, &records).unwrap();
    assert_eq!(
        profile.ordinary_brackets.single,
        vec![TaxBracket::new(dec!(0), None, dec!(0.20))]
    );
    let engine = TaxEngine::new(profile).unwrap();

    let result = engine.compute(
        &TaxPayer::new(FilingStatus::Single),
        &[IncomeItem::wage("w2", dec!(60000))],
        &[],
    );

    // (60,000 - 15,600) x 20%
    assert_eq!(result.regular_tax, dec!(8880.00));
}

#[test]
fn test_schedule_without_top_bracket_is_rejected() {
    let csv = "tax_year,schedule,kind,min_income,max_income,rate\n\
               2025,Z,capital_gains,0,64750,0.00\n";
    let records = BracketLoader::parse(csv.as_bytes()).unwrap();
    let mut profile = TaxYearProfile::tax_year_2025();

    let result = BracketLoader::apply(&mut profile, &records);

    assert!(matches!(result, Err(BracketLoaderError::Profile(_))));
}

#[test]
fn test_profile_file_round_trip() {
    let mut profile = TaxYearProfile::tax_year_2025();
    profile.deductions.standard.single = dec!(16000);
    let path = std::env::temp_dir().join(format!(
        "tax-data-profile-{}.toml",
        std::process::id()
    ));
    std::fs::write(&path, to_toml(&profile).unwrap()).unwrap();

    let loaded = load_profile(&path);
    std::fs::remove_file(&path).unwrap();

    assert_eq!(loaded.unwrap(), profile);
}

#[test]
fn test_extracted_records_compute_like_typed_ones() {
    let extracted = normalize_records(&[
        json!({ "id": "w2", "category": "wage", "amount": "$60,000.00", "withholding": "5,500" }),
        json!({ "id": "div", "category": "dividend", "amount": 800,
                "details": { "qualified": "600" } }),
    ]);
    let typed = vec![
        IncomeItem::wage("w2", dec!(60000)).with_withholding(dec!(5500)),
        IncomeItem::new(
            "div",
            dec!(800),
            tax_core::IncomeDetail::Dividend {
                qualified: dec!(600),
            },
        ),
    ];
    let engine = TaxEngine::default();
    let taxpayer = TaxPayer::new(FilingStatus::Single);

    assert!(extracted.alerts.is_empty());
    assert_eq!(
        engine.compute(&taxpayer, &extracted.income, &[]),
        engine.compute(&taxpayer, &typed, &[])
    );
}
