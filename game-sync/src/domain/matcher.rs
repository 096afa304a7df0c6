//! Infers the running game from a process snapshot.

use process_utils::ProcessSnapshot;

use super::JUST_CHATTING;
use super::exclusion::ExclusionFilter;
use super::mapping::GameMapping;

/// The configured game that matched, and the process that matched it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameMatch {
    pub game: String,
    pub process: String,
}

/// Whether an observed process name satisfies an expected one.
///
/// Tested in order: exact, case-insensitive equality, then case-insensitive
/// "expected appears inside observed". The containment test is one-way: a
/// truncated observed name never matches a longer expected name.
pub(crate) fn process_matches(observed: &str, expected: &str) -> bool {
    if observed == expected {
        return true;
    }

    let observed = observed.to_lowercase();
    let expected = expected.to_lowercase();
    observed == expected || (!expected.is_empty() && observed.contains(&expected))
}

/// Find the first (process, game) pair that matches.
///
/// Processes are visited in snapshot order and, for each process, games in
/// mapping order. The first hit ends the scan.
pub fn detect_match(
    snapshot: &ProcessSnapshot,
    mapping: &GameMapping,
    filter: &ExclusionFilter,
) -> Option<GameMatch> {
    snapshot
        .iter()
        .filter(|name| !filter.is_excluded(name))
        .find_map(|name| {
            mapping
                .iter()
                .find(|(_, expected)| process_matches(name, expected))
                .map(|(game, _)| GameMatch {
                    game: game.to_string(),
                    process: name.to_string(),
                })
        })
}

/// Detected game label, or [`JUST_CHATTING`] when nothing configured runs.
pub fn detect_game(
    snapshot: &ProcessSnapshot,
    mapping: &GameMapping,
    filter: &ExclusionFilter,
) -> String {
    detect_match(snapshot, mapping, filter)
        .map(|m| m.game)
        .unwrap_or_else(|| JUST_CHATTING.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(names: &[&str]) -> ProcessSnapshot {
        names.iter().copied().collect()
    }

    fn mapping(entries: &[(&str, &str)]) -> GameMapping {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_excluded_process_is_skipped() {
        let filter = ExclusionFilter::new(["explorer.exe"], Vec::<&str>::new());
        let game = detect_game(
            &snapshot(&["explorer.exe", "VALORANT-Win64-Shipping.exe"]),
            &mapping(&[("Valorant", "VALORANT-Win64-Shipping.exe")]),
            &filter,
        );
        assert_eq!(game, "Valorant");
    }

    #[test]
    fn test_exclusion_wins_over_mapping() {
        let filter = ExclusionFilter::new(["game.exe"], Vec::<&str>::new());
        let game = detect_game(
            &snapshot(&["game.exe"]),
            &mapping(&[("Game", "game.exe")]),
            &filter,
        );
        assert_eq!(game, JUST_CHATTING);
    }

    #[test]
    fn test_no_match_returns_sentinel() {
        let game = detect_game(
            &snapshot(&["notepad.exe", "code.exe"]),
            &mapping(&[("Chess", "chess.exe"), ("Apex", "r5apex.exe")]),
            &ExclusionFilter::empty(),
        );
        assert_eq!(game, JUST_CHATTING);

        let game = detect_game(
            &snapshot(&[]),
            &mapping(&[("Chess", "chess.exe")]),
            &ExclusionFilter::empty(),
        );
        assert_eq!(game, JUST_CHATTING);

        let game = detect_game(
            &snapshot(&["chess.exe"]),
            &GameMapping::new(),
            &ExclusionFilter::empty(),
        );
        assert_eq!(game, JUST_CHATTING);
    }

    #[test]
    fn test_case_insensitive_equality() {
        let game = detect_game(
            &snapshot(&["eldenring.EXE"]),
            &mapping(&[("Elden Ring", "EldenRing.exe")]),
            &ExclusionFilter::empty(),
        );
        assert_eq!(game, "Elden Ring");
    }

    #[test]
    fn test_mapping_order_beats_specificity() {
        let result = detect_match(
            &snapshot(&["foobar.exe"]),
            &mapping(&[("A", "foo.exe"), ("B", "foobar.exe")]),
            &ExclusionFilter::empty(),
        );
        // "foo.exe" is not a substring of "foobar.exe", so B wins here.
        assert_eq!(result.unwrap().game, "B");

        let result = detect_match(
            &snapshot(&["foobar.exe"]),
            &mapping(&[("A", "bar.exe"), ("B", "foobar.exe")]),
            &ExclusionFilter::empty(),
        );
        assert_eq!(result.unwrap().game, "A");
    }

    #[test]
    fn test_substring_is_expected_in_observed_only() {
        let map = mapping(&[("Valorant", "VALORANT-Win64-Shipping.exe")]);
        let game = detect_game(&snapshot(&["VALORANT"]), &map, &ExclusionFilter::empty());
        assert_eq!(game, JUST_CHATTING);

        let map = mapping(&[("Valorant", "valorant")]);
        let game = detect_game(
            &snapshot(&["VALORANT-Win64-Shipping.exe"]),
            &map,
            &ExclusionFilter::empty(),
        );
        assert_eq!(game, "Valorant");
    }

    #[test]
    fn test_first_process_in_snapshot_wins() {
        let map = mapping(&[("A", "a.exe"), ("B", "b.exe")]);
        let result = detect_match(
            &snapshot(&["b.exe", "a.exe"]),
            &map,
            &ExclusionFilter::empty(),
        )
        .unwrap();
        assert_eq!(
            result,
            GameMatch {
                game: "B".to_string(),
                process: "b.exe".to_string()
            }
        );
    }

    #[test]
    fn test_empty_expected_name_never_matches_by_substring() {
        let map = mapping(&[("Broken", ""), ("Chess", "chess.exe")]);
        let game = detect_game(&snapshot(&["chess.exe"]), &map, &ExclusionFilter::empty());
        assert_eq!(game, "Chess");
    }
}
