//! Key mapping from terminal events to panel actions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// What a key does on the simulated node panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelKey {
    /// Put preset tag N on the antenna, or take it off if it is already there
    ToggleTag(usize),
    /// Take whatever is on the antenna off
    ClearReader,
    /// Toggle dropped reads while a tag sits on the antenna
    ToggleFlaky,
    /// The station button
    Button,
    Quit,
}

/// Map keyboard input to panel actions.
pub fn map_key_event(key: KeyEvent) -> Option<PanelKey> {
    if should_quit(key) {
        return Some(PanelKey::Quit);
    }
    match key.code {
        KeyCode::Char(c @ '1'..='9') => Some(PanelKey::ToggleTag(c as usize - '1' as usize)),
        KeyCode::Char('0') | KeyCode::Backspace => Some(PanelKey::ClearReader),
        KeyCode::Char('f') | KeyCode::Char('F') => Some(PanelKey::ToggleFlaky),
        KeyCode::Char(' ') | KeyCode::Enter | KeyCode::Char('b') | KeyCode::Char('B') => {
            Some(PanelKey::Button)
        }
        _ => None,
    }
}

/// Check if key should stop the node.
pub fn should_quit(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc)
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_keys() {
        assert_eq!(
            map_key_event(KeyEvent::from(KeyCode::Char('1'))),
            Some(PanelKey::ToggleTag(0))
        );
        assert_eq!(
            map_key_event(KeyEvent::from(KeyCode::Char('3'))),
            Some(PanelKey::ToggleTag(2))
        );
        assert_eq!(
            map_key_event(KeyEvent::from(KeyCode::Char('0'))),
            Some(PanelKey::ClearReader)
        );
    }

    #[test]
    fn test_button_and_flaky_keys() {
        assert_eq!(
            map_key_event(KeyEvent::from(KeyCode::Char(' '))),
            Some(PanelKey::Button)
        );
        assert_eq!(
            map_key_event(KeyEvent::from(KeyCode::Char('F'))),
            Some(PanelKey::ToggleFlaky)
        );
        assert_eq!(map_key_event(KeyEvent::from(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_quit_keys() {
        assert!(should_quit(KeyEvent::from(KeyCode::Char('q'))));
        assert!(should_quit(KeyEvent::new(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL
        )));
        assert!(!should_quit(KeyEvent::from(KeyCode::Char('c'))));
        assert_eq!(
            map_key_event(KeyEvent::from(KeyCode::Esc)),
            Some(PanelKey::Quit)
        );
    }
}
