//! Status icons.

/// Icons prefixed to status lines.
#[derive(Debug, Clone)]
pub struct Icons {
    /// In-progress state (●)
    pub active: &'static str,
    /// Success state (✓)
    pub success: &'static str,
    /// Failed state (✗)
    pub error: &'static str,
    /// Warning state (⚠)
    pub warning: &'static str,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            active: "●",
            success: "✓",
            error: "✗",
            warning: "⚠",
        }
    }
}
