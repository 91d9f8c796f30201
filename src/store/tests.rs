#![allow(clippy::unwrap_used)]

use super::*;
use crate::models::UNCATEGORIZED;
use rust_decimal_macros::dec;

fn sample_snapshot() -> Snapshot {
    Snapshot {
        incomes: vec![
            Income::new("Salary".into(), dec!(1000), "2024-01-01 09:00:00".into()),
            Income::new("Bonus".into(), dec!(250.75), "2024-01-15 12:30:00".into()),
        ],
        budgets: vec![
            Budget {
                category: "food".into(),
                amount: dec!(300),
                remaining: dec!(250),
            },
            Budget::new("rent".into(), dec!(800)),
        ],
        expenses: vec![
            Expense::new(
                "Lunch".into(),
                dec!(50),
                "food".into(),
                "2024-01-02 13:00:00".into(),
            ),
            Expense::new(
                "Misc".into(),
                dec!(20.10),
                UNCATEGORIZED.into(),
                "2024-01-03 18:45:00".into(),
            ),
        ],
    }
}

// ── Schema ────────────────────────────────────────────────────

#[test]
fn test_fresh_database_has_current_version() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(db.schema_version().unwrap(), schema::CURRENT_VERSION);
}

#[test]
fn test_reopen_keeps_version_and_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fintrack.db");

    {
        let mut db = Database::open(&path).unwrap();
        db.save(&sample_snapshot()).unwrap();
    }

    let db = Database::open(&path).unwrap();
    assert_eq!(db.schema_version().unwrap(), schema::CURRENT_VERSION);
    assert_eq!(db.load().unwrap(), sample_snapshot());
}

// ── Slots ─────────────────────────────────────────────────────

#[test]
fn test_missing_slot_is_none() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.get_slot("incomes").unwrap().is_none());
}

#[test]
fn test_set_slot_overwrites() {
    let db = Database::open_in_memory().unwrap();
    db.set_slot("budgets", "[]").unwrap();
    db.set_slot("budgets", r#"[{"category":"a","amount":"1","remaining":"1"}]"#)
        .unwrap();
    let raw = db.get_slot("budgets").unwrap().unwrap();
    assert!(raw.contains("\"a\""));
}

#[test]
fn test_empty_store_loads_empty_collections() {
    let db = Database::open_in_memory().unwrap();
    assert_eq!(db.load().unwrap(), Snapshot::default());
}

#[test]
fn test_partial_slots_default_to_empty() {
    let db = Database::open_in_memory().unwrap();
    db.set_slot(
        INCOMES_SLOT,
        r#"[{"description":"Salary","amount":"1000","timestamp":"t"}]"#,
    )
    .unwrap();

    let snapshot = db.load().unwrap();
    assert_eq!(snapshot.incomes.len(), 1);
    assert!(snapshot.budgets.is_empty());
    assert!(snapshot.expenses.is_empty());
}

// ── Round-trip ────────────────────────────────────────────────

#[test]
fn test_save_then_load_is_exact() {
    let mut db = Database::open_in_memory().unwrap();
    let snapshot = sample_snapshot();
    db.save(&snapshot).unwrap();
    assert_eq!(db.load().unwrap(), snapshot);
}

#[test]
fn test_resave_loaded_state_is_stable() {
    let mut db = Database::open_in_memory().unwrap();
    db.save(&sample_snapshot()).unwrap();

    let loaded = db.load().unwrap();
    db.save(&loaded).unwrap();
    let reloaded = db.load().unwrap();

    assert_eq!(reloaded, loaded);
    assert_eq!(reloaded.incomes[1].amount.to_string(), "250.75");
    assert_eq!(reloaded.expenses[1].amount.to_string(), "20.10");
}

#[test]
fn test_save_replaces_previous_snapshot() {
    let mut db = Database::open_in_memory().unwrap();
    db.save(&sample_snapshot()).unwrap();
    db.save(&Snapshot::default()).unwrap();
    assert_eq!(db.load().unwrap(), Snapshot::default());
}

#[test]
fn test_amounts_are_stored_as_strings() {
    let mut db = Database::open_in_memory().unwrap();
    db.save(&sample_snapshot()).unwrap();
    let raw = db.get_slot(INCOMES_SLOT).unwrap().unwrap();
    assert!(raw.contains(r#""amount":"250.75""#));
}

// ── Legacy data ───────────────────────────────────────────────

#[test]
fn test_loads_numeric_amounts() {
    let db = Database::open_in_memory().unwrap();
    db.set_slot(
        EXPENSES_SLOT,
        r#"[{"description":"Lunch","amount":12.5,"category":"food","timestamp":"1/2/2024, 1:00:00 PM"}]"#,
    )
    .unwrap();
    db.set_slot(
        BUDGETS_SLOT,
        r#"[{"category":"food","amount":300,"remaining":287.5}]"#,
    )
    .unwrap();

    let snapshot = db.load().unwrap();
    assert_eq!(snapshot.expenses[0].amount, dec!(12.5));
    assert_eq!(snapshot.budgets[0].remaining, dec!(287.5));
}

#[test]
fn test_corrupt_slot_names_the_slot() {
    let db = Database::open_in_memory().unwrap();
    db.set_slot(BUDGETS_SLOT, "{not json").unwrap();
    let err = db.load().unwrap_err();
    assert!(format!("{err:#}").contains("budgets"));
}
