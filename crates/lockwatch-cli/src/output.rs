// Output formatting for CLI

use anyhow::Result;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn from_str(s: &str) -> Self {
        match s {
            "json" => OutputFormat::Json,
            "yaml" => OutputFormat::Yaml,
            _ => OutputFormat::Text,
        }
    }

    /// Render a value as JSON or YAML; `None` for text output
    pub fn render_value<T: Serialize>(&self, value: &T) -> Result<Option<String>> {
        Ok(match self {
            OutputFormat::Json => Some(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Some(serde_yaml::to_string(value)?),
            // Text format is handled by each command
            OutputFormat::Text => None,
        })
    }

    pub fn print_value<T: Serialize>(&self, value: &T) -> Result<()> {
        if let Some(rendered) = self.render_value(value)? {
            println!("{}", rendered);
        }
        Ok(())
    }

    pub fn is_text(&self) -> bool {
        matches!(self, OutputFormat::Text)
    }
}

/// Print a simple key-value pair for text output
pub fn print_field(label: &str, value: &str) {
    println!("{:<22} {}", format!("{}:", label), value);
}

/// Print a section title with an underline
pub fn print_section(title: &str) {
    println!("{}", title);
    println!("{}", "=".repeat(title.chars().count()));
}

pub fn format_table_row(values: &[(&str, usize)]) -> String {
    values
        .iter()
        .map(|(val, width)| {
            let s = if val.chars().count() > *width {
                let kept: String = val.chars().take(width.saturating_sub(3)).collect();
                format!("{}...", kept)
            } else {
                val.to_string()
            };
            format!("{:<width$}", s, width = width)
        })
        .collect::<Vec<_>>()
        .join("  ")
        .trim_end()
        .to_string()
}

/// Print a table header
pub fn print_table_header(columns: &[(&str, usize)]) {
    println!("{}", format_table_row(columns));
}

/// Print a table row
pub fn print_table_row(values: &[(&str, usize)]) {
    println!("{}", format_table_row(values));
}

/// Percentages are always shown with two decimals
pub fn format_rate(rate: f64) -> String {
    format!("{:.2}%", rate)
}
