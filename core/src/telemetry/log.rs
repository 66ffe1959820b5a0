use log::{debug, error, info, warn};

/// Scoped logging handle handed to each component instead of a global logger.
#[derive(Debug, Clone, Copy)]
pub struct LogManager {
    scope: &'static str,
}

impl LogManager {
    pub fn new(scope: &'static str) -> Self {
        Self { scope }
    }

    pub fn scope(&self) -> &'static str {
        self.scope
    }

    pub fn record(&self, message: &str) {
        info!(target: self.scope, "{}", message);
    }

    pub fn debug(&self, message: &str) {
        debug!(target: self.scope, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        warn!(target: self.scope, "{}", message);
    }

    pub fn error(&self, message: &str) {
        error!(target: self.scope, "{}", message);
    }
}

impl Default for LogManager {
    fn default() -> Self {
        Self::new("surveycore")
    }
}
