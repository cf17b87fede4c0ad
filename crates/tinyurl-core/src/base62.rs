//! Base-62 encoding of counter values.
//!
//! Digits come first, then upper-case, then lower-case letters. The output
//! has no padding and grows with the magnitude of the input, so `0` is `"0"`
//! and `u64::MAX` takes 11 symbols.

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// The longest encoding any `u64` can produce.
pub const MAX_ENCODED_LEN: usize = 11;

/// Encodes `value` in base 62.
pub fn encode(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    let mut buf = [0u8; MAX_ENCODED_LEN];
    let mut pos = buf.len();
    while value > 0 {
        pos -= 1;
        buf[pos] = ALPHABET[(value % 62) as usize];
        value /= 62;
    }

    buf[pos..].iter().map(|&b| b as char).collect()
}

/// Decodes a base-62 string back into its integer value.
///
/// Returns `None` for empty input, symbols outside the alphabet, or values
/// that do not fit in a `u64`.
pub fn decode(encoded: &str) -> Option<u64> {
    if encoded.is_empty() {
        return None;
    }

    encoded.bytes().try_fold(0u64, |acc, b| {
        let digit = symbol_value(b)?;
        acc.checked_mul(62)?.checked_add(digit)
    })
}

/// Returns `true` if `b` is one of the 62 symbols.
pub fn is_symbol(b: u8) -> bool {
    b.is_ascii_alphanumeric()
}

fn symbol_value(b: u8) -> Option<u64> {
    let value = match b {
        b'0'..=b'9' => b - b'0',
        b'A'..=b'Z' => b - b'A' + 10,
        b'a'..=b'z' => b - b'a' + 36,
        _ => return None,
    };
    Some(u64::from(value))
}
