//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output
//! in various formats (JSON, YAML, human-readable), with a dedicated
//! human layout for case bodies and progress spinners for network calls.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use abiware_core::CaseRequestBody;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::{self, Write};
use std::time::Duration;
use tracing::{debug, trace};

/// Trait for formatting output with specialized support for case bodies
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format a translated case body
    fn format_case_body(&self, body: &CaseRequestBody) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => {
                Ok(serde_json::to_string_pretty(value)?)
            }
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }

    fn format_case_body(&self, body: &CaseRequestBody) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_case_body_human(body)),
            _ => self.format(body),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool, progress: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: progress && !quiet && io::stderr().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    #[allow(dead_code)]
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            show_progress: false,
            quiet,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write an error message
    pub fn error(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.red().to_string())
        } else {
            self.writeln(&format!("ERROR: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let mut value_json = serde_json::to_value(value)?;
        redaction::redact_json_value(&mut value_json);
        trace!(data = %value_json, "Outputting data");

        let formatted = self.format.format(value)?;
        self.writeln(formatted.trim_end())
    }

    /// Write a case body with specialized formatting
    pub fn case_body(&mut self, body: &CaseRequestBody) -> Result<()> {
        let formatted = self.format.format_case_body(body)?;
        self.writeln(formatted.trim_end())
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }
}

/// Helper function to create a spinner style
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Format a case body for human reading
fn format_case_body_human(body: &CaseRequestBody) -> String {
    let mut output = String::new();

    output.push_str("═══ Case Request ═══\n\n");

    push_attributes(&mut output, "General", &body.general, "  ");
    push_attributes(&mut output, "Dossier", &body.dossier, "  ");
    push_attributes(&mut output, "Request", &body.request, "  ");

    if body.contacts.is_empty() {
        output.push_str("Contacts: none\n");
    } else {
        output.push_str(&format!("Contacts ({}):\n", body.contacts.len()));
        for (i, contact) in body.contacts.iter().enumerate() {
            push_attributes(&mut output, &format!("  #{}", i + 1), contact, "    ");
        }
    }

    output
}

fn push_attributes(output: &mut String, title: &str, attributes: &Map<String, Value>, indent: &str) {
    if attributes.is_empty() {
        output.push_str(&format!("{}: (empty)\n", title));
        return;
    }

    output.push_str(&format!("{}:\n", title));
    let width = attributes.keys().map(String::len).max().unwrap_or(0);
    for (key, value) in attributes {
        output.push_str(&format!(
            "{}{:width$}  {}\n",
            indent,
            key,
            format_value_compact(value),
            width = width
        ));
    }
}

/// Format a JSON value in a compact, human-readable way
fn format_value_compact(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => format!("[{} items]", arr.len()),
        Value::Object(obj) => format!("{{{} fields}}", obj.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abiware_core::InboundPayload;
    use std::sync::{Arc, Mutex};

    /// Writer that keeps everything written to it
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Captured {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn writer(format: OutputFormat, quiet: bool) -> (OutputWriter, Captured) {
        let captured = Captured::default();
        let writer = OutputWriter::with_writer(format, false, quiet, Box::new(captured.clone()));
        (writer, captured)
    }

    fn sample_body() -> CaseRequestBody {
        abiware_core::preview_case(
            &InboundPayload::new()
                .with("dossierCode", "PU")
                .with("dossier_data", "Maison || Rue A || 12 || || || || || 5.1")
                .with("user_request", "REF1 || permit")
                .with(
                    "contact_contact",
                    "physical || Jean || Dupont || Rue B || 3 || || 4000 || Liège || BE || || jean@example.com",
                ),
        )
        .unwrap()
    }

    #[test]
    fn test_case_body_human() {
        let formatted = format_case_body_human(&sample_body());

        assert!(formatted.starts_with("═══ Case Request ═══"));
        assert!(formatted.contains("General:\n  dossierCode  PU\n"));
        assert!(formatted.contains("longitude"));
        assert!(formatted.contains("5,1"));
        assert!(formatted.contains("Contacts (1):\n  #1:\n"));
        assert!(formatted.contains("jean@example.com"));
    }

    #[test]
    fn test_case_body_human_empty_sections() {
        let formatted = format_case_body_human(&CaseRequestBody::default());
        assert!(formatted.contains("General: (empty)"));
        assert!(formatted.contains("Contacts: none"));
    }

    #[test]
    fn test_case_body_json() {
        let (mut output, captured) = writer(OutputFormat::Json, false);
        output.case_body(&sample_body()).unwrap();

        let value: Value = serde_json::from_str(&captured.text()).unwrap();
        assert_eq!(value["dossierCode"], "PU");
        assert_eq!(value["dossier"]["longitude"], "5,1");
    }

    #[test]
    fn test_messages_only_in_human_format() {
        let (mut output, captured) = writer(OutputFormat::Json, false);
        output.info("hello").unwrap();
        output.success("done").unwrap();
        output.section("Title").unwrap();
        assert!(captured.text().is_empty());

        let (mut output, captured) = writer(OutputFormat::Human, false);
        output.info("hello").unwrap();
        output.warning("careful").unwrap();
        assert_eq!(captured.text(), "INFO: hello\nWARNING: careful\n");
    }

    #[test]
    fn test_quiet_suppresses_info_but_not_data() {
        let (mut output, captured) = writer(OutputFormat::Human, true);
        output.info("hello").unwrap();
        output.data(&serde_json::json!({"id": 1})).unwrap();
        assert_eq!(captured.text(), "{\n  \"id\": 1\n}\n");
    }

    #[test]
    fn test_yaml_format() {
        let formatted = OutputFormat::Yaml
            .format(&serde_json::json!({"reference": "REF1"}))
            .unwrap();
        assert_eq!(formatted.trim(), "reference: REF1");
    }

    #[test]
    fn test_no_spinner_with_custom_writer() {
        let (output, _) = writer(OutputFormat::Human, false);
        assert!(output.spinner("working").is_none());
    }
}
