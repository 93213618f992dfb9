//! The user-facing action log

pub const LOG_INTRO: &str = "Output of WinRep actions appears here …";

/// Ordered list of log lines, owned by the UI thread
pub struct LogView {
    lines: Vec<String>,
}

impl LogView {
    pub fn new() -> Self {
        Self {
            lines: vec![LOG_INTRO.to_string()],
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Append text; embedded newlines become separate lines
    pub fn append(&mut self, text: &str) {
        self.lines.extend(text.split('\n').map(str::to_string));
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[cfg(test)]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.iter().any(|l| l.contains(needle))
    }

    /// Whole log as text for the clipboard
    pub fn to_text(&self) -> String {
        let mut text = self.lines.join("\n");
        text.push('\n');
        text
    }
}

impl Default for LogView {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_intro() {
        let log = LogView::new();
        assert_eq!(log.lines(), &[LOG_INTRO.to_string()]);
    }

    #[test]
    fn multi_line_text_splits() {
        let mut log = LogView::new();
        log.clear();
        log.append("first\n\nthird");
        assert_eq!(log.lines(), &["first", "", "third"]);
        assert_eq!(log.to_text(), "first\n\nthird\n");
        assert!(log.contains("thi"));
    }
}
