use serde::{Deserialize, Serialize};

/// Entry ids are assigned monotonically and never reused within a ledger.
pub type EntryId = u64;

/// One user-editable amount row. `text` is the raw input as typed, with
/// either `,` or `.` as decimal separator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountEntry {
    pub id: EntryId,
    pub text: String,
}

impl AmountEntry {
    pub fn new(id: EntryId) -> Self {
        Self {
            id,
            text: String::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// An entry as displayed: `number` is its 1-based position in the list and
/// is recomputed whenever rows are removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row<'a> {
    pub number: usize,
    pub entry: &'a AmountEntry,
}
