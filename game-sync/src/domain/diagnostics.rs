//! Full-scan report used for troubleshooting mappings.

use std::collections::BTreeSet;
use std::fmt;

use process_utils::ProcessSnapshot;

use super::exclusion::ExclusionFilter;
use super::mapping::GameMapping;

/// One unique, non-excluded process name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEntry {
    pub process: String,
    /// Games whose expected process name appears inside this one.
    pub potential_games: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiagnosticReport {
    pub entries: Vec<DiagnosticEntry>,
    /// Number of snapshot entries dropped by the exclusion filter.
    pub excluded: usize,
    /// Copy of the mapping the report was computed against.
    pub watched: Vec<(String, String)>,
}

impl DiagnosticReport {
    pub fn potential_matches(&self) -> impl Iterator<Item = &DiagnosticEntry> {
        self.entries.iter().filter(|e| !e.potential_games.is_empty())
    }
}

/// Unique non-excluded names sorted alphabetically, each tagged with the games
/// it could satisfy.
pub fn diagnose(
    snapshot: &ProcessSnapshot,
    mapping: &GameMapping,
    filter: &ExclusionFilter,
) -> DiagnosticReport {
    let mut excluded = 0;
    let mut unique = BTreeSet::new();

    for name in snapshot.iter() {
        if filter.is_excluded(name) {
            excluded += 1;
            continue;
        }
        unique.insert(name);
    }

    let entries = unique
        .into_iter()
        .map(|process| {
            let lower = process.to_lowercase();
            let potential_games = mapping
                .iter()
                .filter(|(_, expected)| {
                    !expected.is_empty() && lower.contains(&expected.to_lowercase())
                })
                .map(|(game, _)| game.to_string())
                .collect();
            DiagnosticEntry {
                process: process.to_string(),
                potential_games,
            }
        })
        .collect();

    DiagnosticReport {
        entries,
        excluded,
        watched: mapping
            .iter()
            .map(|(g, p)| (g.to_string(), p.to_string()))
            .collect(),
    }
}

impl fmt::Display for DiagnosticReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Total unique (non-excluded) processes: {} (excluded skipped: {})",
            self.entries.len(),
            self.excluded
        )?;
        writeln!(f, "Looking for these game processes:")?;
        for (game, process) in &self.watched {
            writeln!(f, "  - {game}: '{process}'")?;
        }
        writeln!(f, "Running processes (non-excluded):")?;
        for (i, entry) in self.entries.iter().enumerate() {
            if entry.potential_games.is_empty() {
                writeln!(f, "  {i:3}. {}", entry.process)?;
            } else {
                writeln!(
                    f,
                    "  {i:3}. {}  <-- potential match: {}",
                    entry.process,
                    entry.potential_games.join(", ")
                )?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnose() {
        let snapshot: ProcessSnapshot = [
            "svchost.exe",
            "r5apex.exe",
            "code.exe",
            "svchost.exe",
            "code.exe",
        ]
        .into_iter()
        .collect();
        let mapping: GameMapping = [("Apex Legends", "R5Apex.exe"), ("Chess", "chess.exe")]
            .into_iter()
            .collect();
        let filter = ExclusionFilter::new(["svchost.exe"], Vec::<&str>::new());

        let report = diagnose(&snapshot, &mapping, &filter);
        assert_eq!(report.excluded, 2);
        let names: Vec<_> = report.entries.iter().map(|e| e.process.as_str()).collect();
        assert_eq!(names, vec!["code.exe", "r5apex.exe"]);

        let matches: Vec<_> = report.potential_matches().collect();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].potential_games, vec!["Apex Legends".to_string()]);

        let rendered = report.to_string();
        assert!(rendered.contains("potential match: Apex Legends"));
        assert!(rendered.contains("Chess: 'chess.exe'"));
    }
}
