use std::collections::HashSet;

/// Process names that never take part in game matching.
///
/// Names and prefixes are stored lowercase, so every test is
/// case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionFilter {
    names: HashSet<String>,
    prefixes: Vec<String>,
}

impl ExclusionFilter {
    /// Build a filter. Empty entries are dropped; prefix order is kept.
    pub fn new<N, P>(names: N, prefixes: P) -> Self
    where
        N: IntoIterator,
        N::Item: AsRef<str>,
        P: IntoIterator,
        P::Item: AsRef<str>,
    {
        Self {
            names: names
                .into_iter()
                .filter(|n| !n.as_ref().is_empty())
                .map(|n| n.as_ref().to_lowercase())
                .collect(),
            prefixes: prefixes
                .into_iter()
                .filter(|p| !p.as_ref().is_empty())
                .map(|p| p.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// A filter that excludes nothing but empty names.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether `name` should be ignored during scans.
    ///
    /// Empty names are always excluded.
    pub fn is_excluded(&self, name: &str) -> bool {
        if name.is_empty() {
            return true;
        }

        let name = name.to_lowercase();
        self.names.contains(&name) || self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    pub fn name_count(&self) -> usize {
        self.names.len()
    }

    pub fn prefix_count(&self) -> usize {
        self.prefixes.len()
    }
}
