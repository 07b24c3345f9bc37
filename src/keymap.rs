#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    NextSection,
    PrevSection,
    NextDocument,
    PrevDocument,
    /// Toggle the visible section's done state
    ToggleDone,
    /// Handled by the page; no viewer state changes
    FocusSearch,
}

impl Command {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "j" | "ArrowDown" => Some(Command::NextSection),
            "k" | "ArrowUp" => Some(Command::PrevSection),
            "n" => Some(Command::NextDocument),
            "p" => Some(Command::PrevDocument),
            "x" => Some(Command::ToggleDone),
            "/" => Some(Command::FocusSearch),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Command::NextSection => "next-section",
            Command::PrevSection => "prev-section",
            Command::NextDocument => "next-document",
            Command::PrevDocument => "prev-document",
            Command::ToggleDone => "toggle-done",
            Command::FocusSearch => "focus-search",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_key() {
        assert_eq!(Command::from_key("j"), Some(Command::NextSection));
        assert_eq!(Command::from_key("ArrowUp"), Some(Command::PrevSection));
        assert_eq!(Command::from_key("/").map(Command::as_str), Some("focus-search"));
        assert_eq!(Command::from_key("J"), None);
        assert_eq!(Command::from_key("Enter"), None);
    }
}
