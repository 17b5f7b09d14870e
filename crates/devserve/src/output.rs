//! Colored terminal output on stderr.

use console::{Style, Term};

/// Width of the banner rule.
const BANNER_WIDTH: usize = 50;

/// Terminal output formatter.
pub(crate) struct Output {
    term: Term,
    green: Style,
    yellow: Style,
    red: Style,
    cyan_bold: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            green: Style::new().green(),
            yellow: Style::new().yellow(),
            red: Style::new().red(),
            cyan_bold: Style::new().cyan().bold(),
        }
    }

    /// Print a success message (green).
    pub(crate) fn success(&self, msg: &str) {
        self.styled(&self.green, msg);
    }

    /// Print a warning message (yellow).
    pub(crate) fn warning(&self, msg: &str) {
        self.styled(&self.yellow, msg);
    }

    /// Print an error message (red).
    pub(crate) fn error(&self, msg: &str) {
        self.styled(&self.red, msg);
    }

    /// Print the startup banner for a running server.
    pub(crate) fn banner(&self, url: &str, root: &str) {
        let rule = "=".repeat(BANNER_WIDTH);
        let lines = [
            String::new(),
            rule.clone(),
            format!("  - HTTP Server:  {url}"),
            format!("  - Serving:      {root}"),
            "  - Live Reload:  Enabled".to_owned(),
            "  - Caching:      Disabled".to_owned(),
            String::new(),
            "  Watching for file changes...".to_owned(),
            "  Press Ctrl+C to stop.".to_owned(),
            rule,
            String::new(),
        ];

        let (head, tail) = lines.split_at(2);
        for line in head {
            let _ = self.term.write_line(line);
        }
        self.styled(&self.cyan_bold, "  Development server is running");
        for line in tail {
            let _ = self.term.write_line(line);
        }
    }

    fn styled(&self, style: &Style, msg: &str) {
        let _ = self.term.write_line(&style.apply_to(msg).to_string());
    }
}
