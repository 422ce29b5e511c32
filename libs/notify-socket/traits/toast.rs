use std::time::Duration;
use tracing::{error, info, warn};

/// Visual severity of a toast
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToastLevel {
    Success,
    Error,
    Warning,
    Info,
    Default,
}

impl ToastLevel {
    /// Map a payload severity string onto a toast level
    ///
    /// Unrecognised severities fall back to `Info`.
    pub fn from_severity(severity: &str) -> Self {
        match severity {
            "error" => ToastLevel::Error,
            "warning" => ToastLevel::Warning,
            "success" => ToastLevel::Success,
            _ => ToastLevel::Info,
        }
    }
}

/// Optional toast parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToastOptions {
    pub description: Option<String>,
    pub duration: Option<Duration>,
}

impl ToastOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// User-facing notice surface
pub trait Toaster: Send + Sync {
    fn toast(&self, level: ToastLevel, title: &str, options: ToastOptions);
}

/// Toaster that discards every notice
pub struct NoOpToaster;

impl Toaster for NoOpToaster {
    fn toast(&self, _level: ToastLevel, _title: &str, _options: ToastOptions) {}
}

/// Toaster that writes notices to the tracing log
///
/// Used by headless hosts such as the `notify-listen` binary.
pub struct TracingToaster;

impl Toaster for TracingToaster {
    fn toast(&self, level: ToastLevel, title: &str, options: ToastOptions) {
        let description = options.description.unwrap_or_default();
        match level {
            ToastLevel::Error => error!("[toast] {} {}", title, description),
            ToastLevel::Warning => warn!("[toast] {} {}", title, description),
            ToastLevel::Success | ToastLevel::Info | ToastLevel::Default => {
                info!("[toast] {} {}", title, description)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_mapping() {
        assert_eq!(ToastLevel::from_severity("error"), ToastLevel::Error);
        assert_eq!(ToastLevel::from_severity("warning"), ToastLevel::Warning);
        assert_eq!(ToastLevel::from_severity("success"), ToastLevel::Success);
        assert_eq!(ToastLevel::from_severity("info"), ToastLevel::Info);
        assert_eq!(ToastLevel::from_severity("critical"), ToastLevel::Info);
    }
}
