//! Column label normalization.
//!
//! Uploaded files routinely arrive with blank, `NaN`-like or duplicate
//! column labels. `make_unique` rewrites any label list into a unique,
//! non-empty set while leaving every label that was already unique intact.

use std::collections::{HashMap, HashSet};

/// True for labels that count as "no name at all"
fn is_blank(name: &str) -> bool {
    name.is_empty() || matches!(name.to_lowercase().as_str(), "nan" | "none")
}

/// Rewrite column labels into a unique, non-empty set.
///
/// Rules, applied left to right:
/// - blank or `NaN`-like labels become `col_<position>` (1-based);
/// - the n-th occurrence of a duplicated label becomes `<label>_<n>`;
/// - labels that appear exactly once are preserved verbatim, and no
///   generated name is ever allowed to shadow one of them — the suffix
///   counter keeps bumping until the candidate is free.
pub fn make_unique(names: &[String]) -> Vec<String> {
    // Base label per position, after trimming and placeholder substitution.
    let bases: Vec<(String, bool)> = names
        .iter()
        .enumerate()
        .map(|(i, raw)| {
            let trimmed = raw.trim();
            if is_blank(trimmed) {
                (format!("col_{}", i + 1), true)
            } else {
                (trimmed.to_string(), false)
            }
        })
        .collect();

    // Labels that occur exactly once keep their name; everyone else must
    // steer around them.
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for (base, placeholder) in &bases {
        if !placeholder {
            *occurrences.entry(base.as_str()).or_insert(0) += 1;
        }
    }
    let reserved: HashSet<&str> = occurrences
        .iter()
        .filter(|(_, n)| **n == 1)
        .map(|(name, _)| *name)
        .collect();

    let mut used: HashSet<String> = HashSet::new();
    let mut counters: HashMap<String, usize> = HashMap::new();
    let mut out = Vec::with_capacity(bases.len());

    for (base, placeholder) in &bases {
        let owns_name = !placeholder && reserved.contains(base.as_str());
        let mut candidate = base.clone();
        if used.contains(&candidate) || (!owns_name && reserved.contains(candidate.as_str())) {
            let counter = counters.entry(base.clone()).or_insert(1);
            loop {
                *counter += 1;
                candidate = format!("{}_{}", base, counter);
                if !used.contains(&candidate) && !reserved.contains(candidate.as_str()) {
                    break;
                }
            }
        }
        used.insert(candidate.clone());
        out.push(candidate);
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_already_unique_untouched() {
        let input = names(&["a", "b", "c"]);
        assert_eq!(make_unique(&input), input);
    }

    #[test]
    fn test_blank_and_nan_become_positional() {
        assert_eq!(
            make_unique(&names(&["", "NaN", "none", "x"])),
            names(&["col_1", "col_2", "col_3", "x"])
        );
    }

    #[test]
    fn test_duplicates_get_suffixes() {
        assert_eq!(
            make_unique(&names(&["a", "a", "a"])),
            names(&["a", "a_2", "a_3"])
        );
    }

    #[test]
    fn test_suffix_avoids_existing_name() {
        // "a_2" is originally unique and must survive verbatim; the
        // duplicated "a" has to skip over it.
        assert_eq!(
            make_unique(&names(&["a", "a", "a_2"])),
            names(&["a", "a_3", "a_2"])
        );
    }

    #[test]
    fn test_placeholder_avoids_real_column() {
        assert_eq!(
            make_unique(&names(&["", "col_1"])),
            names(&["col_1_2", "col_1"])
        );
    }

    #[test]
    fn test_whitespace_trimmed() {
        assert_eq!(make_unique(&names(&["  a  ", "b"])), names(&["a", "b"]));
    }

    proptest! {
        #[test]
        fn prop_unique_nonempty_same_length(input in proptest::collection::vec(".{0,12}", 0..24)) {
            let out = make_unique(&input);
            prop_assert_eq!(out.len(), input.len());
            let mut seen = std::collections::HashSet::new();
            for name in &out {
                prop_assert!(!name.is_empty());
                prop_assert!(seen.insert(name.clone()), "duplicate output name: {}", name);
            }
            // Originally-unique non-blank labels survive verbatim.
            let mut counts = std::collections::HashMap::new();
            for raw in &input {
                let t = raw.trim().to_string();
                if !is_blank(&t) {
                    *counts.entry(t).or_insert(0usize) += 1;
                }
            }
            for (raw, result) in input.iter().zip(&out) {
                let t = raw.trim();
                if !is_blank(t) && counts[t] == 1 {
                    prop_assert_eq!(t, result.as_str());
                }
            }
        }
    }
}
