use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{AmountLedger, CalculationResult, EntryId, Row};

use super::{AppError, LevyConfig};

pub type SessionId = Uuid;

/// One mounted levy form. Owns its ledger exclusively; the ledger lives
/// exactly as long as the session and is dropped on `unmount`.
///
/// Rows are addressed by their visible 1-based number, the way a user
/// refers to them; the session maps numbers to stable entry ids.
#[derive(Debug)]
pub struct LedgerSession {
    id: SessionId,
    mounted_at: DateTime<Utc>,
    config: LevyConfig,
    ledger: AmountLedger,
}

impl LedgerSession {
    pub fn mount(config: LevyConfig) -> Self {
        let session = Self {
            id: Uuid::new_v4(),
            mounted_at: Utc::now(),
            ledger: AmountLedger::new(config.blank_policy),
            config,
        };
        info!(
            session = %session.id,
            policy = %session.config.blank_policy,
            "levy session mounted"
        );
        session
    }

    /// Replace all rows with the given texts, e.g. from an exported
    /// snapshot. The ledger keeps this session's blank policy whatever the
    /// texts were entered under.
    pub fn restore<I, S>(&mut self, texts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ledger = AmountLedger::from_texts(self.config.blank_policy, texts);
        info!(session = %self.id, rows = self.ledger.len(), "ledger restored");
    }

    pub fn unmount(self) {
        info!(
            session = %self.id,
            rows = self.ledger.len(),
            "levy session unmounted"
        );
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn mounted_at(&self) -> DateTime<Utc> {
        self.mounted_at
    }

    pub fn config(&self) -> &LevyConfig {
        &self.config
    }

    pub fn ledger(&self) -> &AmountLedger {
        &self.ledger
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.ledger.rows()
    }

    pub fn row_count(&self) -> usize {
        self.ledger.len()
    }

    /// Append a blank row and return its row number.
    pub fn add_row(&mut self) -> usize {
        let id = self.ledger.add_entry();
        debug!(session = %self.id, entry = id, "row added");
        self.ledger.len()
    }

    /// Remove a row; the last remaining row stays. Returns whether a row
    /// was removed.
    pub fn remove_row(&mut self, row: usize) -> Result<bool, AppError> {
        let id = self.entry_id(row)?;
        let removed = self.ledger.remove_entry(id);
        debug!(session = %self.id, row, entry = id, removed, "row remove requested");
        Ok(removed)
    }

    pub fn edit_row(&mut self, row: usize, text: &str) -> Result<(), AppError> {
        let id = self.entry_id(row)?;
        match self.ledger.update_entry(id, text) {
            Ok(()) => {
                debug!(session = %self.id, row, entry = id, "row edited");
                Ok(())
            }
            Err(err) => {
                debug!(session = %self.id, row, entry = id, %err, "row edit rejected");
                Err(err.into())
            }
        }
    }

    /// Row lost focus. Normalizes the amount when the session is configured
    /// to; returns whether the text changed.
    pub fn commit_row(&mut self, row: usize) -> Result<bool, AppError> {
        let id = self.entry_id(row)?;
        if !self.config.normalize_on_commit {
            return Ok(false);
        }
        let changed = self.ledger.normalize_on_commit(id)?;
        if changed {
            debug!(session = %self.id, row, entry = id, "row normalized");
        }
        Ok(changed)
    }

    pub fn calculate(&mut self) -> Result<CalculationResult, AppError> {
        match self.ledger.calculate() {
            Ok(result) => {
                info!(
                    session = %self.id,
                    rows = result.entry_count,
                    levy = %result.levy,
                    "levy calculated"
                );
                Ok(result)
            }
            Err(err) => {
                warn!(session = %self.id, %err, "levy calculation failed");
                Err(err.into())
            }
        }
    }

    pub fn reset(&mut self) {
        self.ledger.reset();
        info!(session = %self.id, "levy session reset");
    }

    pub fn visible_result(&self) -> Option<&CalculationResult> {
        self.ledger.visible_result()
    }

    pub fn error_message(&self) -> Option<String> {
        self.ledger.error().map(|e| e.to_string())
    }

    pub fn row_label(&self, number: usize) -> String {
        self.config.row_label(number)
    }

    fn entry_id(&self, row: usize) -> Result<EntryId, AppError> {
        row.checked_sub(1)
            .and_then(|index| self.ledger.entries().get(index))
            .map(|entry| entry.id)
            .ok_or(AppError::RowNotFound(row))
    }
}
