use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::{AppError, LedgerSession, SessionId};
use crate::domain::{AmountEntry, BlankPolicy, CalculationResult};

pub const SNAPSHOT_VERSION: &str = "1";

/// Everything the form shows at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub session_id: SessionId,
    pub mounted_at: DateTime<Utc>,
    pub blank_policy: BlankPolicy,
    pub entries: Vec<AmountEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<CalculationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SessionSnapshot {
    /// Row texts in display order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.text.as_str())
    }
}

/// Writes a session out as JSON or CSV.
pub struct Exporter<'a> {
    session: &'a LedgerSession,
}

impl<'a> Exporter<'a> {
    pub fn new(session: &'a LedgerSession) -> Self {
        Self { session }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let ledger = self.session.ledger();
        SessionSnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            exported_at: Utc::now(),
            session_id: self.session.id(),
            mounted_at: self.session.mounted_at(),
            blank_policy: ledger.blank_policy(),
            entries: ledger.entries().to_vec(),
            result: ledger.visible_result().cloned(),
            error: self.session.error_message(),
        }
    }

    pub fn export_json<W: Write>(&self, mut writer: W) -> Result<(), AppError> {
        serde_json::to_writer_pretty(&mut writer, &self.snapshot())?;
        writeln!(writer)?;
        Ok(())
    }

    /// Export rows as `row;label;id;text`. Returns the number of rows written.
    pub fn export_rows_csv<W: Write>(&self, writer: W) -> Result<usize, AppError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .from_writer(writer);

        csv_writer.write_record(["row", "label", "id", "text"])?;

        let mut count = 0;
        for row in self.session.rows() {
            csv_writer.write_record(&[
                row.number.to_string(),
                self.session.row_label(row.number),
                row.entry.id.to_string(),
                row.entry.text.clone(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }
}
