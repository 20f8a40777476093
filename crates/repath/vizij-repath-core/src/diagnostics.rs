//! Diagnostics surfaced to the invoking user context.
//!
//! Each diagnostic is mirrored to the `log` facade when recorded so hosts that
//! only install a logger still see per-binding problems.

use serde::{Deserialize, Serialize};

use crate::clip::CurveBinding;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub binding: Option<CurveBinding>,
    pub message: String,
}

impl Diagnostic {
    fn emit(&self) {
        let target = self
            .binding
            .as_ref()
            .map(|b| format!("{}:{}", b.path, b.property_name))
            .unwrap_or_default();
        match self.severity {
            Severity::Info => log::info!("[{target}] {}", self.message),
            Severity::Warning => log::warn!("[{target}] {}", self.message),
            Severity::Error => log::error!("[{target}] {}", self.message),
        }
    }
}

/// Ordered diagnostic sink owned by a plan or an apply report.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(
        &mut self,
        severity: Severity,
        binding: Option<&CurveBinding>,
        message: impl Into<String>,
    ) {
        let d = Diagnostic {
            severity,
            binding: binding.cloned(),
            message: message.into(),
        };
        d.emit();
        self.entries.push(d);
    }

    pub fn warn(&mut self, binding: &CurveBinding, message: impl Into<String>) {
        self.push(Severity::Warning, Some(binding), message);
    }

    pub fn error(&mut self, binding: &CurveBinding, message: impl Into<String>) {
        self.push(Severity::Error, Some(binding), message);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.entries.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }
}
