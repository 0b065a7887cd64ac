//! Cross-referencing a declared scene order against present files
//!
//! The declared order is authoritative. Reconciliation only drops entries
//! whose file is gone, drops repeated entries, renames an entry whose file
//! changed only in letter case, and appends files the order does not list.
//! Names are compared exactly; letter case matters.

use longform_model::SceneEntry;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// One correction or warning produced by reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inconsistency {
    /// Order entry whose file does not exist; dropped
    DanglingEntry {
        /// Scene name
        name: String,
    },
    /// Order entry listed more than once; later copies dropped
    DuplicateEntry {
        /// Scene name
        name: String,
    },
    /// Present file missing from the order; appended
    UntrackedFile {
        /// Scene name
        name: String,
    },
    /// Entry whose file only differs in letter case; renamed in place
    CaseOnlyRename {
        /// Name in the order
        from: String,
        /// Name on disk
        to: String,
    },
    /// Two present files whose names differ only in letter case; both kept
    CaseCollision {
        /// Names involved
        names: Vec<String>,
    },
}

impl Inconsistency {
    /// Check if the inconsistency changed the order
    #[must_use]
    pub fn is_correction(&self) -> bool {
        !matches!(self, Self::CaseCollision { .. })
    }
}

impl fmt::Display for Inconsistency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingEntry { name } => write!(f, "dropped missing scene '{name}'"),
            Self::DuplicateEntry { name } => write!(f, "dropped duplicate scene '{name}'"),
            Self::UntrackedFile { name } => write!(f, "appended untracked scene '{name}'"),
            Self::CaseOnlyRename { from, to } => write!(f, "renamed scene '{from}' to '{to}'"),
            Self::CaseCollision { names } => {
                write!(f, "scene names differ only in case: {}", names.join(", "))
            }
        }
    }
}

/// Result of [`cross_reference`]
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Reconciled {
    /// Corrected order
    pub scenes: Vec<SceneEntry>,
    /// What was corrected or noticed
    pub inconsistencies: Vec<Inconsistency>,
}

impl Reconciled {
    /// Check if the order was corrected
    #[must_use]
    pub fn is_corrected(&self) -> bool {
        self.inconsistencies.iter().any(Inconsistency::is_correction)
    }
}

/// Reconcile a declared order with the scene names present on disk
#[must_use]
pub fn cross_reference(declared: &[SceneEntry], present: &[String]) -> Reconciled {
    let present_set: HashSet<&str> = present.iter().map(String::as_str).collect();
    let declared_set: HashSet<&str> = declared.iter().map(|e| e.name.as_str()).collect();

    let mut seen: HashSet<String> = HashSet::new();
    let mut scenes = Vec::with_capacity(present.len());
    let mut inconsistencies = Vec::new();

    for entry in declared {
        if seen.contains(&entry.name) {
            inconsistencies.push(Inconsistency::DuplicateEntry {
                name: entry.name.clone(),
            });
            continue;
        }
        if present_set.contains(entry.name.as_str()) {
            seen.insert(entry.name.clone());
            scenes.push(entry.clone());
            continue;
        }

        let folded = entry.name.to_lowercase();
        let mut candidates = present.iter().filter(|name| {
            !declared_set.contains(name.as_str())
                && !seen.contains(*name)
                && name.to_lowercase() == folded
        });
        match (candidates.next(), candidates.next()) {
            (Some(to), None) => {
                inconsistencies.push(Inconsistency::CaseOnlyRename {
                    from: entry.name.clone(),
                    to: to.clone(),
                });
                seen.insert(to.clone());
                scenes.push(SceneEntry::indented(to.clone(), entry.indent));
            }
            _ => inconsistencies.push(Inconsistency::DanglingEntry {
                name: entry.name.clone(),
            }),
        }
    }

    let mut untracked: Vec<&String> = present.iter().filter(|n| !seen.contains(*n)).collect();
    untracked.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));
    untracked.dedup();
    for name in untracked {
        inconsistencies.push(Inconsistency::UntrackedFile { name: name.clone() });
        scenes.push(SceneEntry::new(name.clone()));
    }

    let mut by_fold: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in &scenes {
        by_fold
            .entry(entry.name.to_lowercase())
            .or_default()
            .push(entry.name.clone());
    }
    for names in by_fold.into_values().filter(|n| n.len() > 1) {
        inconsistencies.push(Inconsistency::CaseCollision { names });
    }

    Reconciled {
        scenes,
        inconsistencies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn names(scenes: &[SceneEntry]) -> Vec<&str> {
        scenes.iter().map(|s| s.name.as_str()).collect()
    }

    fn present(list: &[&str]) -> Vec<String> {
        list.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn consistent_order_is_untouched() {
        let declared = vec![SceneEntry::new("b"), SceneEntry::indented("a", 1)];
        let result = cross_reference(&declared, &present(&["a", "b"]));
        assert_eq!(result.scenes, declared);
        assert!(!result.is_corrected());
    }

    #[test]
    fn dangling_dropped_and_untracked_appended() {
        let declared = vec![SceneEntry::new("gone"), SceneEntry::new("kept")];
        let result = cross_reference(&declared, &present(&["kept", "New", "another"]));
        assert_eq!(names(&result.scenes), vec!["kept", "another", "New"]);
        assert_eq!(
            result.inconsistencies,
            vec![
                Inconsistency::DanglingEntry { name: "gone".into() },
                Inconsistency::UntrackedFile {
                    name: "another".into()
                },
                Inconsistency::UntrackedFile { name: "New".into() },
            ]
        );
    }

    #[test]
    fn duplicates_dropped() {
        let declared = vec![SceneEntry::new("a"), SceneEntry::new("a")];
        let result = cross_reference(&declared, &present(&["a"]));
        assert_eq!(names(&result.scenes), vec!["a"]);
        assert!(result.is_corrected());
    }

    #[test]
    fn case_only_rename_keeps_position_and_indent() {
        let declared = vec![
            SceneEntry::new("first"),
            SceneEntry::indented("chapter", 2),
            SceneEntry::new("last"),
        ];
        let result = cross_reference(&declared, &present(&["first", "Chapter", "last"]));
        assert_eq!(
            result.scenes,
            vec![
                SceneEntry::new("first"),
                SceneEntry::indented("Chapter", 2),
                SceneEntry::new("last"),
            ]
        );
    }

    #[test]
    fn case_collision_keeps_both() {
        let declared = vec![SceneEntry::new("scene")];
        let result = cross_reference(&declared, &present(&["scene", "Scene"]));
        assert_eq!(names(&result.scenes), vec!["scene", "Scene"]);
        assert!(result.inconsistencies.contains(&Inconsistency::CaseCollision {
            names: vec!["scene".into(), "Scene".into()]
        }));
    }

    #[test]
    fn case_rename_needs_whole_name_match() {
        let declared = vec![SceneEntry::new("x")];
        let result = cross_reference(&declared, &present(&["X1", "X"]));
        assert_eq!(names(&result.scenes), vec!["X", "X1"]);
        assert_eq!(
            result.inconsistencies[0],
            Inconsistency::CaseOnlyRename {
                from: "x".into(),
                to: "X".into()
            }
        );
    }

    #[test]
    fn ambiguous_case_match_is_dangling() {
        let declared = vec![SceneEntry::new("ab")];
        let result = cross_reference(&declared, &present(&["Ab", "AB"]));
        assert_eq!(names(&result.scenes), vec!["AB", "Ab"]);
        assert_eq!(
            result.inconsistencies[0],
            Inconsistency::DanglingEntry { name: "ab".into() }
        );
    }

    proptest! {
        #[test]
        fn every_present_name_exactly_once(
            declared in prop::collection::vec("[a-dA-D]", 0..8),
            on_disk in prop::collection::btree_set("[a-dA-D]", 0..8),
        ) {
            let declared: Vec<SceneEntry> = declared.into_iter().map(SceneEntry::new).collect();
            let on_disk: Vec<String> = on_disk.into_iter().collect();
            let result = cross_reference(&declared, &on_disk);

            let mut listed: Vec<&str> = names(&result.scenes);
            listed.sort_unstable();
            let mut expected: Vec<&str> = on_disk.iter().map(String::as_str).collect();
            expected.sort_unstable();
            prop_assert_eq!(listed, expected);

            // idempotent
            let again = cross_reference(&result.scenes, &on_disk);
            prop_assert!(!again.is_corrected());
            prop_assert_eq!(again.scenes, result.scenes);
        }
    }
}
