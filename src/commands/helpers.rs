//! Command helper utilities

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::Result;
use crate::manifester::Decision;
use crate::version::{self, VersionExpr};

/// Spinner shown on stderr while a resolution is running
///
/// Hidden automatically when stderr is not a terminal.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template(&format!("{{spinner}} {message}..."))
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    pb.set_style(style);
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Parse a `--version` flag; absent, empty or `latest` means latest
pub fn requested_version(flag: Option<&str>) -> Result<Option<VersionExpr>> {
    match flag {
        Some(version::LATEST) | None => Ok(None),
        Some(raw) => VersionExpr::parse_optional(raw),
    }
}

/// Print one line per merge decision
pub fn print_decisions(decisions: &[Decision]) {
    let green = Style::new().green().bold();
    let yellow = Style::new().yellow().bold();
    let dim = Style::new().dim();

    for decision in decisions {
        let marker = match decision {
            Decision::Added { .. } | Decision::Upgraded { .. } => green.apply_to("+"),
            Decision::Downgraded { .. } => yellow.apply_to("!"),
            Decision::Unchanged { .. } | Decision::Indirect { .. } => dim.apply_to("="),
        };
        println!("  {marker} {decision}");
    }
}
