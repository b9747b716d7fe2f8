/// Rising-edge detector for an already-debounced button level.
#[derive(Debug, Clone, Default)]
pub struct ButtonEdge {
    last_level: bool,
}

impl ButtonEdge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the current level; true exactly once per press.
    pub fn rising(&mut self, level: bool) -> bool {
        let fired = level && !self.last_level;
        self.last_level = level;
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_held_button_fires_once() {
        let mut edge = ButtonEdge::new();
        assert!(!edge.rising(false));
        assert!(edge.rising(true));
        assert!(!edge.rising(true));
        assert!(!edge.rising(true));
        assert!(!edge.rising(false));
        assert!(edge.rising(true));
    }
}
