//! Diagnostic extraction from Rolldown errors.
//!
//! Rolldown's diagnostic types change between releases, so extraction works
//! from their rendered form. The full text is always kept as the message;
//! file and position fields are best-effort.

use serde::{Deserialize, Serialize};

/// One diagnostic carried on an artifact or a bundler error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleDiagnostic {
    pub severity: DiagnosticSeverity,
    /// Verbatim diagnostic text, including plugin error messages.
    pub message: String,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
}

/// Diagnostic severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// Extract diagnostics from a Rolldown error value.
pub fn extract_from_debug(error: &dyn std::fmt::Debug) -> Vec<BundleDiagnostic> {
    let rendered = format!("{error:?}");

    if rendered.contains("BatchedBuildDiagnostic") {
        let parts: Vec<&str> = rendered
            .split("BatchedBuildDiagnostic")
            .filter(|s| !s.trim().is_empty())
            .collect();
        if parts.len() > 1 {
            return parts
                .iter()
                .map(|part| extract_single(part, DiagnosticSeverity::Error))
                .collect();
        }
    }

    vec![extract_single(&rendered, DiagnosticSeverity::Error)]
}

/// Convert bundler warnings into diagnostics.
pub fn extract_warnings(warnings: &[impl std::fmt::Debug]) -> Vec<BundleDiagnostic> {
    warnings
        .iter()
        .map(|w| extract_single(&format!("{w:?}"), DiagnosticSeverity::Warning))
        .collect()
}

fn extract_single(rendered: &str, severity: DiagnosticSeverity) -> BundleDiagnostic {
    // Debug rendering escapes quotes inside messages; undo that so message
    // text (notably resolution errors) survives verbatim.
    let message = rendered.replace("\\\"", "\"");
    BundleDiagnostic {
        severity,
        message,
        file: extract_file_path(rendered),
        line: extract_position(rendered, 0),
        column: extract_position(rendered, 1),
    }
}

/// Best-effort file path extraction from rendered text.
fn extract_file_path(text: &str) -> Option<String> {
    for ext in &[".mdx", ".jsx", ".tsx", ".js", ".ts", ".json"] {
        if let Some(pos) = text.find(ext) {
            let before = &text[..pos + ext.len()];
            for indicator in &["in ", "at ", "file: ", "\"", "'"] {
                if let Some(start) = before.rfind(indicator) {
                    let path = before[start + indicator.len()..].trim();
                    if !path.is_empty() {
                        return Some(path.to_string());
                    }
                }
            }
        }
    }
    None
}

/// Extract the `line:column` pair that follows a file path, if present.
fn extract_position(text: &str, index: usize) -> Option<u32> {
    let file = extract_file_path(text)?;
    let after = &text[text.find(&file)? + file.len()..];
    let after = after.strip_prefix(':')?;

    let mut parts = after.split(':');
    let part = parts.nth(index)?;
    let digits: String = part.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}
