//! Street-number range and point-address parsing.
//!
//! Registry B sometimes encodes a building frontage as two consecutive
//! street numbers ("77 79 HUDSON ST" means 77 through 79). Queens
//! block-and-lot addresses ("30-12 20TH AVE") look similar once
//! normalized but are literal point addresses and must never be read as
//! a numeric range.

use crate::normalize::normalize_address;

/// A parsed street-number range on a normalized street key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRange {
    pub low: u32,
    pub high: u32,
    pub street: String,
}

impl AddressRange {
    pub fn contains(&self, n: u32) -> bool {
        self.low <= n && n <= self.high
    }

    pub fn midpoint(&self) -> f64 {
        (self.low as f64 + self.high as f64) / 2.0
    }
}

/// True when the RAW address starts with a hyphenated block-lot pair.
/// Checked before normalization because normalization turns the hyphen
/// into a space.
fn is_block_lot(raw: &str) -> bool {
    let s = raw.trim_start();
    let Some(dash) = s.find('-') else {
        return false;
    };
    let (head, tail) = s.split_at(dash);
    !head.is_empty()
        && head.bytes().all(|b| b.is_ascii_digit())
        && tail[1..].bytes().take_while(|b| b.is_ascii_digit()).count() > 0
}

/// Parse a raw address as a street-number range.
///
/// Two leading integers followed by a street name form a range when
/// `high >= low` and the span stays within `span_max` (implausibly wide
/// spans are address noise, not frontages). Single-number and block-lot
/// addresses return `None`.
pub fn parse_range(raw: &str, span_max: u32) -> Option<AddressRange> {
    if is_block_lot(raw) {
        return None;
    }
    let normed = normalize_address(raw);
    let mut tokens = normed.split_whitespace();
    let low: u32 = tokens.next()?.parse().ok()?;
    let high: u32 = tokens.next()?.parse().ok()?;
    let street: Vec<&str> = tokens.collect();
    if street.is_empty() || high < low || high - low > span_max {
        return None;
    }
    Some(AddressRange {
        low,
        high,
        street: street.join(" "),
    })
}

/// Parse an already-normalized address as (house number, street key).
pub fn parse_house_number(normalized: &str) -> Option<(u32, &str)> {
    let (first, rest) = normalized.split_once(' ')?;
    let num: u32 = first.parse().ok()?;
    if rest.is_empty() || rest.starts_with(|c: char| c.is_ascii_digit()) {
        // "77 79 HUDSON ST" is a range, not a point address
        return None;
    }
    Some((num, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_leading_numbers_make_a_range() {
        let r = parse_range("77 79 HUDSON ST", 30).unwrap();
        assert_eq!((r.low, r.high), (77, 79));
        assert_eq!(r.street, "HUDSON ST");
        assert!(r.contains(78));
        assert!(!r.contains(81));
    }

    #[test]
    fn range_street_is_normalized() {
        let r = parse_range("77 79 Hudson Street", 30).unwrap();
        assert_eq!(r.street, "HUDSON ST");
    }

    #[test]
    fn block_lot_is_never_a_range() {
        assert_eq!(parse_range("30-12 20TH AVE", 30), None);
        assert_eq!(parse_range("  64-18 BROADWAY", 30), None);
    }

    #[test]
    fn single_number_is_a_point_address() {
        assert_eq!(parse_range("77 HUDSON ST", 30), None);
    }

    #[test]
    fn descending_or_too_wide_spans_rejected() {
        assert_eq!(parse_range("79 77 HUDSON ST", 30), None);
        assert_eq!(parse_range("1 500 BROADWAY", 30), None);
    }

    #[test]
    fn point_address_parse() {
        assert_eq!(
            parse_house_number("77 HUDSON ST"),
            Some((77, "HUDSON ST"))
        );
        assert_eq!(parse_house_number("REAR OF LOBBY"), None);
        assert_eq!(parse_house_number("77 79 HUDSON ST"), None);
        assert_eq!(parse_house_number("77"), None);
    }
}
