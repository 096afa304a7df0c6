/// Last game the monitor published for.
///
/// Starts empty so the first detection always counts as a change.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconciliationState {
    last_known_game: Option<String>,
}

impl ReconciliationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_known_game(&self) -> Option<&str> {
        self.last_known_game.as_deref()
    }

    /// Record `game`, reporting whether it differs from the last one.
    pub fn transition(&mut self, game: &str) -> Transition {
        match self.last_known_game.as_deref() {
            Some(last) if last == game => Transition::Unchanged,
            _ => Transition::Changed {
                previous: self.last_known_game.replace(game.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Unchanged,
    Changed { previous: Option<String> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition() {
        let mut state = ReconciliationState::new();
        assert_eq!(state.last_known_game(), None);

        assert_eq!(state.transition("Chess"), Transition::Changed { previous: None });
        assert_eq!(state.transition("Chess"), Transition::Unchanged);
        assert_eq!(
            state.transition("Just Chatting"),
            Transition::Changed {
                previous: Some("Chess".to_string())
            }
        );
        assert_eq!(state.last_known_game(), Some("Just Chatting"));
    }
}
