//! Shared scoring helpers for the geo pass.

use crate::normalize::normalize_name;
use strsim::sorensen_dice;

/// Similarity between two venue display names in [0, 1].
/// Containment ("HUDSON BAR" vs "HUDSON BAR & GRILL") is common across
/// the two registries and scores a flat 0.85, mirroring how raw license
/// names embed the inspection DBA name.
pub(crate) fn name_similarity(a: &str, b: &str) -> f64 {
    let na = normalize_name(a);
    let nb = normalize_name(b);
    if na.is_empty() || nb.is_empty() {
        return 0.0;
    }
    if na == nb {
        return 1.0;
    }
    if na.contains(&nb) || nb.contains(&na) {
        return 0.85;
    }
    sorensen_dice(&na, &nb)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_names_score_one() {
        assert_eq!(name_similarity("Joe's Pizza", "JOE'S PIZZA"), 1.0);
    }

    #[test]
    fn containment_scores_085() {
        assert_eq!(
            name_similarity("Hudson Bar", "Hudson Bar & Grill LLC"),
            0.85
        );
    }

    #[test]
    fn unrelated_names_score_low() {
        assert!(name_similarity("Blue Bottle", "Katz Delicatessen") < 0.35);
    }

    #[test]
    fn empty_scores_zero() {
        assert_eq!(name_similarity("", "Cafe"), 0.0);
    }
}
