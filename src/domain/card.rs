//! Card number, brand and CVV checks.
//!
//! Everything here is pure and total: inputs are free text as typed by the
//! user, and every check strips non-digit characters before looking at it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Commonly guessed security codes that are never accepted.
const DENIED_CVVS: [&str; 14] = [
    "123", "321", "111", "222", "333", "444", "555", "666", "777", "888", "999", "000", "012",
    "987",
];

/// Card network, derived from the IIN prefix of the card number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Diners,
    Jcb,
    #[default]
    Unknown,
}

impl CardBrand {
    /// Number of digits the card number must have, `None` for any length in 13..=19.
    pub fn card_length(self) -> Option<usize> {
        match self {
            Self::Amex => Some(15),
            Self::Diners => Some(14),
            Self::Visa | Self::Mastercard | Self::Discover | Self::Jcb => Some(16),
            Self::Unknown => None,
        }
    }

    pub fn cvv_length(self) -> usize {
        match self {
            Self::Amex => 4,
            _ => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Visa => "visa",
            Self::Mastercard => "mastercard",
            Self::Amex => "amex",
            Self::Discover => "discover",
            Self::Diners => "diners",
            Self::Jcb => "jcb",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keeps only the ASCII digits of `raw`.
pub fn normalize_digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// Luhn check over the digits of `raw`; fails outside 13..=19 digits.
pub fn validate_card_number(raw: &str) -> bool {
    let digits = normalize_digits(raw);
    if !(13..=19).contains(&digits.len()) {
        return false;
    }

    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let digit = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = digit * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                digit
            }
        })
        .sum();

    sum % 10 == 0
}

/// Detects the brand from the IIN prefix.
///
/// Prefix tables overlap (amex and diners both start with `3`), so the order
/// of the checks below is part of the contract.
pub fn card_type(raw: &str) -> CardBrand {
    let digits = normalize_digits(raw);
    let starts = |prefixes: &[&str]| prefixes.iter().any(|p| digits.starts_with(p));

    if starts(&["4"]) {
        CardBrand::Visa
    } else if starts(&["51", "52", "53", "54", "55"]) {
        CardBrand::Mastercard
    } else if starts(&["34", "37"]) {
        CardBrand::Amex
    } else if starts(&[
        "6011", "65", "644", "645", "646", "647", "648", "649", "622",
    ]) {
        CardBrand::Discover
    } else if starts(&["36", "38", "300", "301", "302", "303", "304", "305"]) {
        CardBrand::Diners
    } else if starts(&["35"]) {
        CardBrand::Jcb
    } else {
        CardBrand::Unknown
    }
}

pub fn validate_card_length(raw: &str, brand: CardBrand) -> bool {
    let len = normalize_digits(raw).len();
    match brand.card_length() {
        Some(expected) => len == expected,
        None => (13..=19).contains(&len),
    }
}

/// Plausibility check for a security code.
///
/// Letters and separators are dropped before checking, so `"a2b8c6"` is
/// judged as `"286"`.
pub fn validate_cvv(raw: &str, brand: CardBrand) -> bool {
    let digits = normalize_digits(raw);
    if digits.len() != brand.cvv_length() {
        return false;
    }

    let bytes = digits.as_bytes();
    if bytes.iter().all(|&b| b == bytes[0]) {
        return false;
    }
    if bytes.windows(2).all(|w| w[1] == w[0] + 1) {
        return false;
    }
    if bytes.windows(2).all(|w| w[0] == w[1] + 1) {
        return false;
    }

    !DENIED_CVVS.contains(&digits.as_str())
}

/// Groups the digits of `raw` in blocks of four separated by a space.
pub fn format_card_number(raw: &str) -> String {
    let digits = normalize_digits(raw);
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 4);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && i % 4 == 0 {
            formatted.push(' ');
        }
        formatted.push(c);
    }
    formatted
}

/// Last four digits of the card number, or all of them when shorter.
pub fn last_four(raw: &str) -> String {
    let digits = normalize_digits(raw);
    let start = digits.len().saturating_sub(4);
    digits[start..].to_string()
}
