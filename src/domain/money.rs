use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Share of the per-night average charged as levy (5%).
pub const LEVY_RATE: Decimal = dec!(0.05);

pub const CURRENCY_SYMBOL: &str = "€";
pub const DECIMAL_SEPARATOR: char = ',';
pub const GROUPING_SEPARATOR: char = '.';

const FRACTION_DIGITS: u32 = 2;
const MAX_INPUT_FRACTION_DIGITS: usize = 2;

/// Check raw input against the amount pattern: zero or more digits, optionally
/// followed by one `,` or `.` and at most two digits.
/// Example: "12", "12,5", "12.50", "" match; "12,505", "1.2.3", "-5" do not.
pub fn is_amount_input(text: &str) -> bool {
    let (whole, fraction) = match text.find(is_separator) {
        Some(pos) => (&text[..pos], Some(&text[pos + 1..])),
        None => (text, None),
    };

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    all_digits(whole)
        && fraction.is_none_or(|f| f.len() <= MAX_INPUT_FRACTION_DIGITS && all_digits(f))
}

fn is_separator(c: char) -> bool {
    c == ',' || c == '.'
}

/// Parse locale-formatted text into an exact decimal.
/// A comma separator is read as a period; a dangling separator is tolerated.
/// Well-formed numbers beyond `Decimal::MAX` (about 7.9e28) are `TooLarge`.
/// Example: "12,5" -> 12.5, "12," -> 12, ",5" -> 0.5
pub fn parse_amount(text: &str) -> Result<Decimal, ParseAmountError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(ParseAmountError::Blank);
    }
    if !trimmed.chars().any(|c| c.is_ascii_digit()) || trimmed.matches(is_separator).count() > 1 {
        return Err(ParseAmountError::InvalidFormat(trimmed.to_string()));
    }

    let mut canonical = trimmed.replace(DECIMAL_SEPARATOR, ".");
    if canonical.ends_with('.') {
        canonical.pop();
    }
    if canonical.starts_with('.') {
        canonical.insert(0, '0');
    }

    Decimal::from_str(&canonical).map_err(|_| {
        let unsigned = canonical.strip_prefix('-').unwrap_or(canonical.as_str());
        if unsigned.chars().all(|c| c.is_ascii_digit() || c == '.') {
            ParseAmountError::TooLarge(trimmed.to_string())
        } else {
            ParseAmountError::InvalidFormat(trimmed.to_string())
        }
    })
}

/// Rewrite an amount into its committed display form: two fraction digits,
/// comma separator, no grouping. Returns `None` for blank or unparseable text.
/// Example: "12.5" -> "12,50", "7" -> "7,00"
pub fn normalize_amount(text: &str) -> Option<String> {
    let value = parse_amount(text).ok()?;
    let fixed = format!("{:.2}", round_to_cents(value));
    Some(fixed.replace('.', &DECIMAL_SEPARATOR.to_string()))
}

fn round_to_cents(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(FRACTION_DIGITS, RoundingStrategy::MidpointAwayFromZero)
}

/// Currency amount split into the parts the display renders separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedAmount {
    pub amount_text: String,
    pub currency_symbol: String,
}

/// Format a value as a de-DE euro amount.
///
/// This is the only place rounding happens: half away from zero to two
/// fraction digits, so 0.125 becomes "0,13" and 0.124 becomes "0,12".
/// Example: 1234.5 -> ("1.234,50", "€")
pub fn format_currency(value: Decimal) -> FormattedAmount {
    let rounded = round_to_cents(value);
    let sign = if rounded < Decimal::ZERO { "-" } else { "" };

    let plain = format!("{:.2}", rounded.abs());
    let (whole, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    FormattedAmount {
        amount_text: format!(
            "{}{}{}{}",
            sign,
            group_thousands(whole),
            DECIMAL_SEPARATOR,
            fraction
        ),
        currency_symbol: CURRENCY_SYMBOL.to_string(),
    }
}

fn group_thousands(digits: &str) -> String {
    let len = digits.len();
    let mut grouped = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(GROUPING_SEPARATOR);
        }
        grouped.push(c);
    }
    grouped
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseAmountError {
    Blank,
    InvalidFormat(String),
    TooLarge(String),
}

impl fmt::Display for ParseAmountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseAmountError::Blank => write!(f, "amount is blank"),
            ParseAmountError::InvalidFormat(text) => write!(f, "invalid amount format: '{}'", text),
            ParseAmountError::TooLarge(text) => write!(f, "amount out of range: '{}'", text),
        }
    }
}

impl std::error::Error for ParseAmountError {}
