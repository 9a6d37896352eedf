mod common;

use std::fs::{self, File};
use std::io::Write;

use anyhow::Result;
use lodging_levy::application::{AppError, LedgerSession, LevyConfig};
use lodging_levy::domain::{BlankPolicy, LedgerError};
use lodging_levy::io::{Exporter, ImportOptions, Importer, SessionSnapshot};
use tempfile::TempDir;

use common::{fill_rows, lenient_session, row_texts, strict_session};

#[test]
fn test_import_csv_file_and_calculate() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("nights.csv");
    fs::write(&path, "night;amount\n1;95,00\n2;105,00\n3;\n")?;

    let config = LevyConfig::default().with_blank_policy(BlankPolicy::Lenient);
    let mut session = LedgerSession::mount(config);
    let result = Importer::new(&mut session)
        .import_amounts_csv(File::open(&path)?, ImportOptions::default())?;

    assert_eq!(result.imported, 3);
    assert!(result.is_clean());
    // (95 + 105 + 0) / 3 * 0.05 = 3.333...
    assert_eq!(session.calculate()?.amount_text, "3,33");
    Ok(())
}

#[test]
fn test_import_with_comma_delimiter() -> Result<()> {
    let mut session = strict_session();
    let options = ImportOptions {
        delimiter: b',',
        ..ImportOptions::default()
    };
    let data = "amount\n\"12,50\"\n7.5\n";
    Importer::new(&mut session).import_amounts_csv(data.as_bytes(), options)?;

    assert_eq!(row_texts(&session), vec!["12,50", "7.5"]);
    Ok(())
}

#[test]
fn test_export_and_restore_snapshot() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("snapshot.json");

    let mut session = strict_session();
    fill_rows(&mut session, &["80", "120,40"])?;
    session.calculate()?;
    Exporter::new(&session).export_json(File::create(&path)?)?;

    let snapshot: SessionSnapshot = serde_json::from_str(&fs::read_to_string(&path)?)?;
    assert_eq!(snapshot.version, "1");
    assert_eq!(snapshot.session_id, session.id());
    assert_eq!(
        snapshot.result.as_ref().map(|r| r.amount_text.as_str()),
        Some("5,01")
    );

    let mut restored = strict_session();
    let count = Importer::new(&mut restored).import_snapshot_json(File::open(&path)?)?;
    assert_eq!(count, 2);
    assert_eq!(row_texts(&restored), vec!["80", "120,40"]);
    assert!(restored.visible_result().is_none());
    assert_eq!(restored.calculate()?.amount_text, "5,01");
    Ok(())
}

#[test]
fn test_snapshot_import_keeps_session_policy() -> Result<()> {
    let mut lenient = lenient_session();
    fill_rows(&mut lenient, &["5", ""])?;
    assert_eq!(lenient.calculate()?.amount_text, "0,13");
    let mut lenient_json = Vec::new();
    Exporter::new(&lenient).export_json(&mut lenient_json)?;

    let mut strict = strict_session();
    Importer::new(&mut strict).import_snapshot_json(lenient_json.as_slice())?;
    assert_eq!(strict.ledger().blank_policy(), BlankPolicy::Strict);
    assert!(matches!(
        strict.calculate(),
        Err(AppError::Calculation(LedgerError::MissingAmount { row: 2 }))
    ));

    let mut strict_json = Vec::new();
    Exporter::new(&strict).export_json(&mut strict_json)?;
    let mut relaxed = lenient_session();
    Importer::new(&mut relaxed).import_snapshot_json(strict_json.as_slice())?;
    assert_eq!(relaxed.ledger().blank_policy(), BlankPolicy::Lenient);
    assert_eq!(relaxed.calculate()?.amount_text, "0,13");
    Ok(())
}

#[test]
fn test_export_rows_csv_to_file() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("rows.csv");

    let mut session = strict_session();
    fill_rows(&mut session, &["10", "", "30"])?;
    session.remove_row(2)?;
    let written = Exporter::new(&session).export_rows_csv(File::create(&path)?)?;

    assert_eq!(written, 2);
    let content = fs::read_to_string(&path)?;
    assert_eq!(content, "row;label;id;text\n1;Night 1;1;10\n2;Night 2;3;30\n");
    Ok(())
}

#[test]
fn test_config_file_drives_session() -> Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("levy.json");
    let mut file = File::create(&path)?;
    writeln!(
        file,
        r#"{{"blank_policy": "lenient", "normalize_on_commit": false, "row_label": "Nacht"}}"#
    )?;

    let config = LevyConfig::load(&path)?;
    let mut session = LedgerSession::mount(config);
    fill_rows(&mut session, &["4.5", ""])?;

    assert!(!session.commit_row(1)?);
    assert_eq!(session.row_label(2), "Nacht 2");
    assert_eq!(session.calculate()?.amount_text, "0,11");
    Ok(())
}
