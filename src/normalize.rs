//! Address and name canonicalization.
//!
//! `normalize_address` is pure and total: anything that does not parse as
//! (house number, street) still comes out as a best-effort uppercase key.
//! Such venues simply never satisfy the exact or range passes.

use crate::models::Venue;
use unicode_normalization::UnicodeNormalization;

/// Fill the cached derived keys on a validated venue.
pub fn attach_keys(v: &mut Venue) {
    v.normalized_address = normalize_address(&v.raw_address);
    v.normalized_name = normalize_name(&v.name);
}

/// Lowercase, strip diacritics and punctuation, collapse whitespace.
/// Used for venue names (dedup keys and the geo-pass similarity gate).
pub fn normalize_name(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.nfd() {
        if unicode_normalization::char::is_combining_mark(ch) {
            continue;
        }
        if ch.is_alphanumeric() {
            for lc in ch.to_lowercase() {
                out.push(lc);
            }
        } else if ch.is_whitespace() || ch.is_ascii_punctuation() {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
        }
    }
    out.truncate(out.trim_end().len());
    out
}

/// Canonical street-suffix vocabulary. Long forms and alternate
/// abbreviations both map to one fixed abbreviation so the two registries
/// normalize identically regardless of which form they use.
fn canonical_suffix(token: &str) -> Option<&'static str> {
    let mapped = match token {
        "STREET" | "STR" => "ST",
        "AVENUE" | "AV" => "AVE",
        "BOULEVARD" | "BVD" => "BLVD",
        "DRIVE" => "DR",
        "LANE" => "LN",
        "PLACE" => "PL",
        "ROAD" => "RD",
        "COURT" => "CT",
        "CIRCLE" => "CIR",
        "TERRACE" | "TERR" => "TER",
        "PARKWAY" | "PKY" => "PKWY",
        "HIGHWAY" | "HGWY" => "HWY",
        "SQUARE" => "SQ",
        "TURNPIKE" => "TPKE",
        "EXPRESSWAY" | "EXPWY" => "EXPY",
        "EAST" => "E",
        "WEST" => "W",
        "NORTH" => "N",
        "SOUTH" => "S",
        "SAINT" => "ST",
        _ => return None,
    };
    Some(mapped)
}

/// "1ST" -> "1", "86TH" -> "86". Numbered streets lose their ordinal so
/// "5TH AVE" and "5 AVE" produce the same key.
fn strip_ordinal(token: &str) -> Option<&str> {
    let digits_end = token.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }
    match &token[digits_end..] {
        "ST" | "ND" | "RD" | "TH" => Some(&token[..digits_end]),
        _ => None,
    }
}

fn is_all_digits(token: &str) -> bool {
    !token.is_empty() && token.bytes().all(|b| b.is_ascii_digit())
}

/// Unit-style token like "1A", "B2" or "2B3": letters and digits mixed.
fn is_unit_token(token: &str) -> bool {
    token.bytes().any(|b| b.is_ascii_digit())
        && token.bytes().any(|b| b.is_ascii_alphabetic())
        && token.bytes().all(|b| b.is_ascii_alphanumeric())
        && token.len() <= 4
}

const UNIT_DESIGNATORS: [&str; 8] = ["STE", "SUITE", "APT", "UNIT", "FL", "FLOOR", "RM", "ROOM"];

/// Either a canonical suffix abbreviation or a form that maps to one.
fn is_street_suffix(token: &str) -> bool {
    canonical_suffix(token).is_some()
        || matches!(
            token,
            "ST" | "AVE"
                | "BLVD"
                | "DR"
                | "LN"
                | "PL"
                | "RD"
                | "CT"
                | "CIR"
                | "TER"
                | "PKWY"
                | "HWY"
                | "SQ"
                | "TPKE"
                | "EXPY"
        )
}

/// Canonicalize a raw address into a comparable key.
///
/// Transformations, in order: uppercase; drop "AKA ..." secondary-address
/// clauses and parentheticals; punctuation to spaces; strip trailing
/// unit/suite/floor fragments; strip ordinal suffixes; drop leading zeros
/// in numbers; canonicalize street suffixes; collapse whitespace.
pub fn normalize_address(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();

    // Drop parenthetical clauses before tokenizing.
    let mut cleaned = String::with_capacity(upper.len());
    let mut depth = 0usize;
    for ch in upper.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '.' | ',' | '#' | '-' | '\'' => {
                if depth == 0 {
                    cleaned.push(' ');
                }
            }
            c if depth == 0 => cleaned.push(c),
            _ => {}
        }
    }

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();

    // "81 HUDSON ST AKA 1 HARRISON ST" -> keep the primary address only
    if let Some(pos) = tokens.iter().position(|t| *t == "AKA") {
        tokens.truncate(pos);
    }

    // Trailing unit designator plus its value: "100 BROADWAY STE 200"
    if tokens.len() >= 2 {
        let tail = tokens.len() - 2;
        if UNIT_DESIGNATORS.contains(&tokens[tail]) {
            tokens.truncate(tail);
        } else if UNIT_DESIGNATORS.contains(&tokens[tokens.len() - 1]) {
            tokens.pop();
        }
    }
    // Trailing bare unit: "25 N MOORE ST 1A" or a lone floor number.
    // Only strip when something is left in front of it, so a bare house
    // number is never consumed.
    if tokens.len() >= 2 {
        let last = tokens[tokens.len() - 1];
        if is_unit_token(last) {
            tokens.pop();
        } else if is_all_digits(last) && !is_all_digits(tokens[0]) {
            // trailing floor number on a non-numbered address
            tokens.pop();
        } else if tokens.len() >= 3 && is_all_digits(last) {
            // "48 W 20 ST 2" style: number after an already-complete address
            let prev = tokens[tokens.len() - 2];
            if !is_all_digits(prev) && is_street_suffix(prev) {
                tokens.pop();
            }
        }
    }

    let mut out = String::with_capacity(cleaned.len());
    for tok in tokens {
        let tok = strip_ordinal(tok).unwrap_or(tok);
        let piece: &str = if is_all_digits(tok) {
            tok.trim_start_matches('0')
        } else {
            canonical_suffix(tok).unwrap_or(tok)
        };
        let piece = if piece.is_empty() { "0" } else { piece };
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(piece);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_diacritics_and_punctuation() {
        assert_eq!(normalize_name("Café Añejo"), "cafe anejo");
        assert_eq!(normalize_name("  JOE'S  PIZZA "), "joe s pizza");
        assert_eq!(normalize_name("Łukasz"), "łukasz");
    }

    #[test]
    fn suffix_canonicalization_both_directions() {
        assert_eq!(normalize_address("77 Hudson Street"), "77 HUDSON ST");
        assert_eq!(normalize_address("77 HUDSON ST"), "77 HUDSON ST");
        assert_eq!(normalize_address("100 Fifth Avenue"), "100 FIFTH AVE");
        assert_eq!(normalize_address("100 FIFTH AV"), "100 FIFTH AVE");
        assert_eq!(
            normalize_address("1 Grand Army Plaza West"),
            "1 GRAND ARMY PLAZA W"
        );
    }

    #[test]
    fn ordinal_suffixes_stripped() {
        assert_eq!(normalize_address("5TH AVE"), "5 AVE");
        assert_eq!(normalize_address("5 Avenue"), "5 AVE");
        assert_eq!(normalize_address("230 West 86th Street"), "230 W 86 ST");
        assert_eq!(normalize_address("1st avenue"), "1 AVE");
    }

    #[test]
    fn unit_fragments_stripped() {
        assert_eq!(normalize_address("25 N MOORE ST 1A"), "25 N MOORE ST");
        assert_eq!(normalize_address("100 BROADWAY STE 200"), "100 BROADWAY");
        assert_eq!(normalize_address("90 Bedford St Apt 3"), "90 BEDFORD ST");
        assert_eq!(normalize_address("48 W 20TH ST 2"), "48 W 20 ST");
    }

    #[test]
    fn aka_and_parentheticals_stripped() {
        assert_eq!(
            normalize_address("81 HUDSON ST AKA 1 HARRISON ST"),
            "81 HUDSON ST"
        );
        assert_eq!(
            normalize_address("12 Main Street (rear entrance)"),
            "12 MAIN ST"
        );
    }

    #[test]
    fn leading_zeros_dropped() {
        assert_eq!(normalize_address("007 Hudson St"), "7 HUDSON ST");
        assert_eq!(normalize_address("0 Bond St"), "0 BOND ST");
    }

    #[test]
    fn block_lot_hyphen_becomes_space() {
        // Both registries normalize block-lot the same way, so exact
        // matching still works; only range parsing treats it specially.
        assert_eq!(normalize_address("30-12 20TH AVE"), "30 12 20 AVE");
    }

    #[test]
    fn best_effort_on_unparsable() {
        assert_eq!(normalize_address("REAR OF LOBBY"), "REAR OF LOBBY");
        assert_eq!(normalize_address(""), "");
    }

    #[test]
    fn bare_house_number_survives() {
        assert_eq!(normalize_address("123"), "123");
    }
}
