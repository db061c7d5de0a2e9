//! Output formatting for JSON values.

use std::io::{self, Write};

use serde_json::Value;

use crate::cli::OutputFormat;

/// Render one value in the chosen format.
pub fn render(format: OutputFormat, value: &Value) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(value).unwrap_or_default(),
        OutputFormat::JsonCompact => value.to_string(),
        OutputFormat::Plain => match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        },
    }
}

/// Print a rendered line to stdout.
pub fn print_line(output: &str) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}")?;
    stdout.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_strings_are_unquoted() {
        assert_eq!(render(OutputFormat::Plain, &json!("on")), "on");
        assert_eq!(render(OutputFormat::Plain, &json!({ "a": 1 })), r#"{"a":1}"#);
    }

    #[test]
    fn json_formats() {
        let value = json!({ "a": [1, 2] });
        assert_eq!(render(OutputFormat::JsonCompact, &value), r#"{"a":[1,2]}"#);
        assert!(render(OutputFormat::Json, &value).contains('\n'));
    }
}
