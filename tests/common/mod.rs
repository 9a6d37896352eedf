// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use lodging_levy::application::{LedgerSession, LevyConfig};
use lodging_levy::domain::BlankPolicy;

/// Mount a session with default settings (strict blanks, normalize on commit).
pub fn strict_session() -> LedgerSession {
    LedgerSession::mount(LevyConfig::default())
}

pub fn lenient_session() -> LedgerSession {
    LedgerSession::mount(LevyConfig::default().with_blank_policy(BlankPolicy::Lenient))
}

/// Type one amount per row, adding rows as needed.
pub fn fill_rows(session: &mut LedgerSession, amounts: &[&str]) -> Result<()> {
    for (index, amount) in amounts.iter().enumerate() {
        let row = if index == 0 { 1 } else { session.add_row() };
        session.edit_row(row, amount)?;
    }
    Ok(())
}

pub fn row_texts(session: &LedgerSession) -> Vec<String> {
    session.rows().map(|r| r.entry.text.clone()).collect()
}
