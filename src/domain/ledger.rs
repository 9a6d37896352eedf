use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    format_currency, is_amount_input, normalize_amount, parse_amount, AmountEntry, EntryId,
    ParseAmountError, Row, LEVY_RATE,
};

/// How `calculate` treats rows left blank.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlankPolicy {
    /// A blank row fails the calculation with `MissingAmount`.
    #[default]
    Strict,
    /// A blank row contributes zero but still counts as a night.
    Lenient,
}

impl BlankPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlankPolicy::Strict => "strict",
            BlankPolicy::Lenient => "lenient",
        }
    }
}

impl FromStr for BlankPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(BlankPolicy::Strict),
            "lenient" => Ok(BlankPolicy::Lenient),
            other => Err(format!("unknown blank policy '{}'", other)),
        }
    }
}

impl std::fmt::Display for BlankPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a calculation was refused. Rows are 1-based, as displayed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Please enter an amount in row {row}")]
    MissingAmount { row: usize },

    #[error("Row {row}: '{text}' is not a valid amount")]
    InvalidAmount { row: usize, text: String },

    #[error("Row {row}: amount is out of the supported range")]
    AmountTooLarge { row: usize },
}

/// Why an edit was not applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Entry not found: {0}")]
    EntryNotFound(EntryId),

    #[error("Rejected input: '{0}'")]
    Rejected(String),
}

/// Outcome of the last successful calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalculationResult {
    pub amount_text: String,
    pub currency_symbol: String,
    /// Unrounded levy the display text was formatted from.
    pub levy: Decimal,
    pub entry_count: usize,
}

/// Events that move the validation error flag.
enum ErrorTransition {
    Edited,
    Calculated,
    Failed(LedgerError),
    Reset,
}

/// Ordered list of nightly amounts and the levy derived from them.
///
/// Always holds at least one entry. The error flag follows a fixed table:
/// accepted edits, successful calculations and resets clear it, a failed
/// calculation sets it, everything else leaves it alone.
#[derive(Debug, Clone)]
pub struct AmountLedger {
    entries: Vec<AmountEntry>,
    next_id: EntryId,
    policy: BlankPolicy,
    result: Option<CalculationResult>,
    error: Option<LedgerError>,
}

impl Default for AmountLedger {
    fn default() -> Self {
        Self::new(BlankPolicy::default())
    }
}

impl AmountLedger {
    pub fn new(policy: BlankPolicy) -> Self {
        Self {
            entries: vec![AmountEntry::new(1)],
            next_id: 2,
            policy,
            result: None,
            error: None,
        }
    }

    /// Restore a ledger from raw texts. The input pattern is not applied, so
    /// anything stored here is checked again by `calculate`.
    pub fn from_texts<I, S>(policy: BlankPolicy, texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<AmountEntry> = texts
            .into_iter()
            .zip(1..)
            .map(|(text, id)| AmountEntry::new(id).with_text(text))
            .collect();

        if entries.is_empty() {
            return Self::new(policy);
        }

        let next_id = entries.len() as EntryId + 1;
        Self {
            entries,
            next_id,
            policy,
            result: None,
            error: None,
        }
    }

    pub fn blank_policy(&self) -> BlankPolicy {
        self.policy
    }

    pub fn entries(&self) -> &[AmountEntry] {
        &self.entries
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.entries
            .iter()
            .enumerate()
            .map(|(index, entry)| Row {
                number: index + 1,
                entry,
            })
    }

    pub fn entry(&self, id: EntryId) -> Option<&AmountEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last successful result, even if a later calculation failed.
    pub fn result(&self) -> Option<&CalculationResult> {
        self.result.as_ref()
    }

    /// Result to show: hidden while a validation error is pending.
    pub fn visible_result(&self) -> Option<&CalculationResult> {
        match self.error {
            Some(_) => None,
            None => self.result.as_ref(),
        }
    }

    pub fn error(&self) -> Option<&LedgerError> {
        self.error.as_ref()
    }

    pub fn add_entry(&mut self) -> EntryId {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(AmountEntry::new(id));
        id
    }

    /// Remove an entry. The last remaining entry is kept; returns whether
    /// anything was removed.
    pub fn remove_entry(&mut self, id: EntryId) -> bool {
        if self.entries.len() <= 1 {
            return false;
        }
        match self.position(id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Replace an entry's text if it matches the amount input pattern.
    pub fn update_entry(&mut self, id: EntryId, raw_text: &str) -> Result<(), EditError> {
        let index = self.position(id).ok_or(EditError::EntryNotFound(id))?;
        if !is_amount_input(raw_text) {
            return Err(EditError::Rejected(raw_text.to_string()));
        }

        self.entries[index].text = raw_text.to_string();
        self.transition(ErrorTransition::Edited);
        Ok(())
    }

    /// Rewrite a non-blank entry into its two-decimal comma form. Blank or
    /// unparseable text stays as it is. Returns whether the text changed.
    pub fn normalize_on_commit(&mut self, id: EntryId) -> Result<bool, EditError> {
        let index = self.position(id).ok_or(EditError::EntryNotFound(id))?;
        let entry = &mut self.entries[index];
        if entry.is_blank() {
            return Ok(false);
        }

        match normalize_amount(&entry.text) {
            Some(normalized) if normalized != entry.text => {
                entry.text = normalized;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Compute 5% of the average amount across all rows and publish it.
    /// On failure the previous result is kept but hidden.
    pub fn calculate(&mut self) -> Result<CalculationResult, LedgerError> {
        match self.compute() {
            Ok(result) => {
                self.result = Some(result.clone());
                self.transition(ErrorTransition::Calculated);
                Ok(result)
            }
            Err(err) => {
                self.transition(ErrorTransition::Failed(err.clone()));
                Err(err)
            }
        }
    }

    /// Back to a single blank entry with no result and no error.
    pub fn reset(&mut self) {
        let id = self.next_id;
        self.next_id += 1;
        self.entries = vec![AmountEntry::new(id)];
        self.result = None;
        self.transition(ErrorTransition::Reset);
    }

    fn compute(&self) -> Result<CalculationResult, LedgerError> {
        let mut sum = Decimal::ZERO;

        for row in self.rows() {
            if row.entry.is_blank() {
                match self.policy {
                    BlankPolicy::Strict => {
                        return Err(LedgerError::MissingAmount { row: row.number });
                    }
                    BlankPolicy::Lenient => continue,
                }
            }

            let invalid = || LedgerError::InvalidAmount {
                row: row.number,
                text: row.entry.text.clone(),
            };

            let too_large = LedgerError::AmountTooLarge { row: row.number };

            let value = parse_amount(&row.entry.text).map_err(|e| match e {
                ParseAmountError::TooLarge(_) => too_large.clone(),
                _ => invalid(),
            })?;
            if value < Decimal::ZERO {
                return Err(invalid());
            }
            sum = sum.checked_add(value).ok_or(too_large)?;
        }

        let entry_count = self.entries.len();
        let levy = sum / Decimal::from(entry_count) * LEVY_RATE;
        let formatted = format_currency(levy);

        Ok(CalculationResult {
            amount_text: formatted.amount_text,
            currency_symbol: formatted.currency_symbol,
            levy,
            entry_count,
        })
    }

    fn transition(&mut self, event: ErrorTransition) {
        self.error = match event {
            ErrorTransition::Failed(err) => Some(err),
            ErrorTransition::Edited | ErrorTransition::Calculated | ErrorTransition::Reset => None,
        };
    }

    fn position(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }
}
