//!
//! # Cell-Name Uniquification
//!

// Std-Lib
use std::collections::HashSet;

// Crates.io
use log::info;

///
/// Map an ordered list of names to a list of unique names.
///
/// The first occurrence of each name keeps it. Each later duplicate of `name`
/// becomes `{name}_{i}`, for the smallest `i >= 1` not already taken by any
/// original or previously assigned name. Never fails, and never modifies its input.
///
pub fn uniquify<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut taken: HashSet<String> = names.iter().map(|n| n.as_ref().to_string()).collect();
    let mut kept: HashSet<&str> = HashSet::with_capacity(names.len());
    let mut rv = Vec::with_capacity(names.len());
    for name in names.iter().map(AsRef::as_ref) {
        if kept.insert(name) {
            rv.push(name.to_string());
            continue;
        }
        let mut i: usize = 1;
        let mut candidate = format!("{}_{}", name, i);
        while taken.contains(&candidate) {
            i += 1;
            candidate = format!("{}_{}", name, i);
        }
        info!("Renaming duplicate cell `{}` to `{}`", name, candidate);
        taken.insert(candidate.clone());
        rv.push(candidate);
    }
    rv
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_names_pass_through() {
        assert_eq!(uniquify(&["a", "b", "c"]), vec!["a", "b", "c"]);
        assert!(uniquify::<&str>(&[]).is_empty());
    }
    #[test]
    fn duplicates_get_suffixes() {
        assert_eq!(uniquify(&["A", "A", "A"]), vec!["A", "A_1", "A_2"]);
        // Suffixes skip names already in use
        assert_eq!(
            uniquify(&["A", "A_1", "A", "A"]),
            vec!["A", "A_1", "A_2", "A_3"]
        );
        // Input is untouched, and the output is stable
        let names = vec!["x".to_string(), "x".to_string()];
        assert_eq!(uniquify(&names), uniquify(&names));
        assert_eq!(names, vec!["x", "x"]);
    }
}
