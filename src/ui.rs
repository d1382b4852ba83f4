// ============================================================================
// src/ui.rs – Styled operator console (banner, phases, status lines, panels)
// ============================================================================

use console::{style, Style, Term};

pub const BANNER_BODY_WIDTH: usize = 58;

/// Console printer for everything the operator is meant to read.
/// Diagnostics go through `tracing` instead.
#[derive(Debug, Clone)]
pub struct UX {
    pub quiet: bool,
    term: Term,
}

impl UX {
    pub fn new() -> Self {
        Self {
            quiet: false,
            term: Term::stdout(),
        }
    }

    /// Printer that swallows everything (used by tests).
    pub fn quiet() -> Self {
        Self {
            quiet: true,
            term: Term::stdout(),
        }
    }

    fn line(&self, text: String) {
        if self.quiet {
            return;
        }
        let _ = self.term.write_line(&text);
    }

    pub fn banner(&self) {
        if self.quiet {
            return;
        }
        let _ = self.term.clear_screen();
        let frame = Style::new().color256(39).bold();
        let span = "═".repeat(BANNER_BODY_WIDTH + 2);
        let title = format!(
            "{:^width$}",
            "FLASHFORGE // image flasher + GPT/GRUB builder",
            width = BANNER_BODY_WIDTH + 2
        );
        self.line(frame.apply_to(format!("╔{}╗", span)).to_string());
        self.line(frame.apply_to(format!("║{}║", title)).to_string());
        self.line(frame.apply_to(format!("╚{}╝", span)).to_string());
    }

    pub fn phase(&self, title: &str) {
        self.line(String::new());
        self.line(style(format!("▸ {title}")).bold().white().to_string());
    }

    pub fn info(&self, msg: &str) {
        self.line(format!("{} {}", style("[*]").cyan().bold(), msg));
    }

    pub fn note(&self, msg: &str) {
        self.line(format!("{} {}", style("[~]").dim(), style(msg).dim()));
    }

    pub fn success(&self, msg: &str) {
        self.line(format!("{} {}", style("[+]").green().bold(), msg));
    }

    pub fn warn(&self, msg: &str) {
        self.line(format!(
            "{} {}",
            style("[!]").yellow().bold(),
            style(msg).yellow()
        ));
    }

    /// Errors always go to stderr, even in quiet mode.
    pub fn error(&self, msg: &str) {
        let _ = Term::stderr().write_line(&format!(
            "{} {}",
            style("[x]").red().bold(),
            style(msg).red()
        ));
    }

    /// Render a titled key/value block.
    pub fn data_panel(&self, title: &str, rows: &[(&str, String)]) {
        if self.quiet {
            return;
        }
        let key_width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        self.line(style(format!("┌─ {title}")).color256(39).to_string());
        for (key, value) in rows {
            let padded = format!("{:<width$}", key, width = key_width);
            self.line(format!("│ {}  {}", style(padded).bold(), value));
        }
        self.line(style("└─").color256(39).to_string());
    }

    /// Inline prompt, left on the current line for the operator's answer.
    pub fn prompt(&self, text: &str) {
        if self.quiet {
            return;
        }
        let _ = self.term.write_str(&style(text).color256(221).bold().to_string());
        let _ = self.term.flush();
    }

    /// Pass a block of raw tool output through untouched.
    pub fn raw(&self, text: &str) {
        for l in text.lines() {
            self.line(l.to_string());
        }
    }
}

impl Default for UX {
    fn default() -> Self {
        Self::new()
    }
}
