//! Output styles using owo-colors stylesheet pattern

use owo_colors::Style;

use crate::domain::product::ProvisionStatus;

/// Centralized stylesheet for CLI output colors.
#[derive(Default, Clone)]
pub struct Styles {
    /// Success messages (green)
    pub success: Style,
    /// Warning messages (yellow)
    pub warning: Style,
    /// Error messages (red)
    pub error: Style,
    /// Info messages (blue)
    pub info: Style,
    /// Dimmed/secondary text
    pub dim: Style,
    /// Bold text
    pub bold: Style,
    /// Headers/section titles
    pub header: Style,
}

impl Styles {
    /// Apply colors to the stylesheet.
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.error = Style::new().red();
        self.info = Style::new().blue();
        self.dim = Style::new().dimmed();
        self.bold = Style::new().bold();
        self.header = Style::new().bold().cyan();
    }

    /// Green when available, yellow while changing, red otherwise.
    #[must_use]
    pub fn for_status(&self, status: &ProvisionStatus) -> Style {
        match status {
            ProvisionStatus::Available => self.success,
            ProvisionStatus::UnderChange => self.warning,
            _ => self.error,
        }
    }
}
