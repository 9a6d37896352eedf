use std::io::Read;

use tracing::{debug, warn};

use crate::application::{AppError, LedgerSession};
use crate::domain::is_amount_input;
use crate::io::export::SessionSnapshot;

const AMOUNT_HEADER: &str = "amount";

/// Result of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportResult {
    pub imported: usize,
    pub errors: Vec<ImportError>,
}

impl ImportResult {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// A value that could not be loaded into a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportError {
    pub line: usize,
    pub error: String,
}

/// Options for import operations
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Check values without touching the session.
    pub dry_run: bool,
    /// Field delimiter; `;` because `,` is the decimal separator.
    pub delimiter: u8,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            delimiter: b';',
        }
    }
}

/// Loads amounts into a session, one row per value.
pub struct Importer<'a> {
    session: &'a mut LedgerSession,
}

impl<'a> Importer<'a> {
    pub fn new(session: &'a mut LedgerSession) -> Self {
        Self { session }
    }

    /// Import amounts from CSV. Reads the `amount` column when a header row
    /// names one, otherwise the first column of every record.
    ///
    /// The session is reset first; a rejected value leaves its row blank and
    /// is reported with its line number.
    pub fn import_amounts_csv<R: Read>(
        &mut self,
        reader: R,
        options: ImportOptions,
    ) -> Result<ImportResult, AppError> {
        let values = read_amount_column(reader, options.delimiter)?;
        let mut result = ImportResult::default();

        if options.dry_run {
            for (line, value) in values {
                if is_amount_input(&value) {
                    result.imported += 1;
                } else {
                    result.errors.push(rejected(line, &value));
                }
            }
            return Ok(result);
        }

        self.session.reset();
        for (index, (line, value)) in values.into_iter().enumerate() {
            let row = if index == 0 { 1 } else { self.session.add_row() };
            match self.session.edit_row(row, &value) {
                Ok(()) => result.imported += 1,
                Err(AppError::Edit(_)) => {
                    warn!(line, value = %value, "import value rejected");
                    result.errors.push(rejected(line, &value));
                }
                Err(e) => return Err(e),
            }
        }

        debug!(
            imported = result.imported,
            rejected = result.errors.len(),
            "amount import finished"
        );
        Ok(result)
    }

    /// Replace the session's rows with those of an exported JSON snapshot.
    /// Only the row texts are taken over; the session's own blank policy
    /// applies to them. Returns the number of rows restored.
    pub fn import_snapshot_json<R: Read>(&mut self, reader: R) -> Result<usize, AppError> {
        let snapshot: SessionSnapshot = serde_json::from_reader(reader)?;
        let policy = self.session.config().blank_policy;
        if snapshot.blank_policy != policy {
            warn!(
                snapshot = %snapshot.blank_policy,
                session = %policy,
                "snapshot taken under another blank policy; keeping the session's"
            );
        }

        self.session.restore(snapshot.texts());
        Ok(self.session.row_count())
    }
}

fn rejected(line: usize, value: &str) -> ImportError {
    ImportError {
        line,
        error: format!("Invalid amount: '{}'", value),
    }
}

/// Collect `(line, value)` pairs from the amount column.
fn read_amount_column<R: Read>(reader: R, delimiter: u8) -> Result<Vec<(usize, String)>, AppError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut column = 0;
    let mut values = Vec::new();

    for (index, record) in csv_reader.records().enumerate() {
        let record = record?;
        let line = index + 1;

        if index == 0 {
            if let Some(pos) = record
                .iter()
                .position(|field| field.eq_ignore_ascii_case(AMOUNT_HEADER))
            {
                column = pos;
                continue;
            }
        }

        values.push((line, record.get(column).unwrap_or("").to_string()));
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use crate::application::LevyConfig;

    use super::*;

    fn session() -> LedgerSession {
        LedgerSession::mount(LevyConfig::default())
    }

    #[test]
    fn test_import_first_column_without_header() {
        let mut session = session();
        let data = "10\n20\n";
        let result = Importer::new(&mut session)
            .import_amounts_csv(data.as_bytes(), ImportOptions::default())
            .unwrap();

        assert_eq!(result.imported, 2);
        assert!(result.is_clean());
        assert_eq!(session.row_count(), 2);
        assert_eq!(session.calculate().unwrap().amount_text, "0,75");
    }

    #[test]
    fn test_import_amount_column_by_header() {
        let mut session = session();
        let data = "date;amount;note\n2024-05-01;89,90;first\n2024-05-02;110.10;second\n";
        let result = Importer::new(&mut session)
            .import_amounts_csv(data.as_bytes(), ImportOptions::default())
            .unwrap();

        assert_eq!(result.imported, 2);
        let texts: Vec<&str> = session.rows().map(|r| r.entry.text.as_str()).collect();
        assert_eq!(texts, vec!["89,90", "110.10"]);
    }

    #[test]
    fn test_import_reports_rejected_values() {
        let mut session = session();
        let data = "amount\n10\nabc\n20\n";
        let result = Importer::new(&mut session)
            .import_amounts_csv(data.as_bytes(), ImportOptions::default())
            .unwrap();

        assert_eq!(result.imported, 2);
        assert_eq!(
            result.errors,
            vec![ImportError {
                line: 3,
                error: "Invalid amount: 'abc'".into()
            }]
        );
        assert_eq!(session.row_count(), 3);
        assert!(session.rows().nth(1).unwrap().entry.is_blank());
    }

    #[test]
    fn test_dry_run_leaves_session_untouched() {
        let mut session = session();
        session.edit_row(1, "42").unwrap();

        let options = ImportOptions {
            dry_run: true,
            ..ImportOptions::default()
        };
        let result = Importer::new(&mut session)
            .import_amounts_csv("1\n2\n-3\n".as_bytes(), options)
            .unwrap();

        assert_eq!(result.imported, 2);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(session.row_count(), 1);
        assert_eq!(session.rows().next().unwrap().entry.text, "42");
    }

    #[test]
    fn test_import_empty_input_resets_to_one_row() {
        let mut session = session();
        session.add_row();
        let result = Importer::new(&mut session)
            .import_amounts_csv("".as_bytes(), ImportOptions::default())
            .unwrap();

        assert_eq!(result.imported, 0);
        assert_eq!(session.row_count(), 1);
    }
}
