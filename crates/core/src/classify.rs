//! Input token classification.
//!
//! Every scanned or typed token is exactly one of: a printer address, a
//! print quantity, or a part identifier. Rules are tried in a fixed order:
//! quantity, then address, then the identifier default.

use std::fmt;

/// Count used when the operator submits an empty token.
pub const DEFAULT_QUANTITY: &str = "1";

/// Longest quantity accepted, in digits.
const MAX_QUANTITY_DIGITS: usize = 3;

/// Hex digits in a link-layer address without separators.
const ADDRESS_HEX_DIGITS: usize = 12;

/// A classified input token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "kind", content = "value", rename_all = "snake_case")
)]
pub enum Token {
    /// Printer address in colon-separated form (`AA:BB:CC:DD:EE:FF`).
    /// Only uppercase hex is recognized.
    Address(String),
    /// Print quantity: one to three digits, kept verbatim (`"007"` stays `"007"`).
    Quantity(String),
    /// Anything else: the part number to print, trimmed.
    Identifier(String),
}

impl Token {
    /// Short lowercase name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Token::Address(_) => "address",
            Token::Quantity(_) => "quantity",
            Token::Identifier(_) => "identifier",
        }
    }

    /// The normalized value carried by the token.
    pub fn value(&self) -> &str {
        match self {
            Token::Address(v) | Token::Quantity(v) | Token::Identifier(v) => v,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind(), self.value())
    }
}

/// Which rule a trimmed token satisfies.
enum Shape {
    Quantity,
    Address,
    Other,
}

fn shape(token: &str) -> Shape {
    if token.is_empty()
        || (token.len() <= MAX_QUANTITY_DIGITS && token.bytes().all(|b| b.is_ascii_digit()))
    {
        Shape::Quantity
    } else if token.len() == ADDRESS_HEX_DIGITS && token.bytes().all(is_upper_hex) {
        Shape::Address
    } else {
        Shape::Other
    }
}

/// Address digits are `0-9` and uppercase `A-F` only.
fn is_upper_hex(b: u8) -> bool {
    b.is_ascii_digit() || (b'A'..=b'F').contains(&b)
}

/// Classify one raw input token.
///
/// The token is trimmed first. Empty input is a quantity of
/// [`DEFAULT_QUANTITY`]. No input is rejected: whatever is neither a quantity
/// nor an address is an identifier.
///
/// ```
/// use label_terminal_core::{Token, classify};
///
/// assert_eq!(classify("AABBCCDDEEFF"), Token::Address("AA:BB:CC:DD:EE:FF".into()));
/// assert_eq!(classify(" 12 "), Token::Quantity("12".into()));
/// assert_eq!(classify(""), Token::Quantity("1".into()));
/// assert_eq!(classify("PN-1234"), Token::Identifier("PN-1234".into()));
/// ```
pub fn classify(token: &str) -> Token {
    let token = token.trim();
    match shape(token) {
        Shape::Quantity if token.is_empty() => Token::Quantity(DEFAULT_QUANTITY.to_string()),
        Shape::Quantity => Token::Quantity(token.to_string()),
        Shape::Address => Token::Address(colon_separated(token)),
        Shape::Other => Token::Identifier(token.to_string()),
    }
}

/// Insert a colon after every two characters of an ASCII hex string.
fn colon_separated(hex: &str) -> String {
    let mut out = String::with_capacity(hex.len() + hex.len() / 2);
    for (i, c) in hex.chars().enumerate() {
        if i > 0 && i % 2 == 0 {
            out.push(':');
        }
        out.push(c);
    }
    out
}
