use std::fmt;
use std::str::FromStr;

use crate::ItemIndex;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Text => "txt",
            OutputFormat::Markdown => "md",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown output format {0:?} (expected txt or md)")]
pub struct UnknownFormat(pub String);

impl FromStr for OutputFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(OutputFormat::Text),
            "md" | "markdown" => Ok(OutputFormat::Markdown),
            other => Err(UnknownFormat(other.to_string())),
        }
    }
}

/// Swap a `.txt`/`.md` suffix for the one `format` wants.
///
/// Names with neither suffix get the extension appended, so switching formats
/// on the same base name never stacks extensions.
pub fn normalize_extension(filename: &str, format: OutputFormat) -> String {
    let base = strip_suffix_ignore_case(filename, ".txt")
        .or_else(|| strip_suffix_ignore_case(filename, ".md"))
        .unwrap_or(filename);
    format!("{base}.{}", format.extension())
}

fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(suffix.len())?;
    let (base, tail) = (name.get(..split)?, name.get(split..)?);
    tail.eq_ignore_ascii_case(suffix).then_some(base)
}

/// `<sanitized-url>_<index>.<ext>`, e.g. `example_com_1.txt`.
pub fn output_filename(url: &str, index: ItemIndex, format: OutputFormat) -> String {
    format!("{}_{index}.{}", sanitize_url(url), format.extension())
}

/// Drops the `scheme://` prefix and maps everything outside `[A-Za-z0-9]`
/// to `_`.
pub fn sanitize_url(url: &str) -> String {
    let without_scheme = url
        .trim()
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(url.trim());
    let cleaned: String = without_scheme
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        "page".to_string()
    } else {
        cleaned.to_string()
    }
}
