//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one value per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use bldr_state_core::{KeyPath, Schema};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

/// Replacement text for sensitive values.
pub const MASK: &str = "****";

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Dim `text` when color is on.
pub fn dim(text: &str, color: bool) -> String {
    if color {
        text.dimmed().to_string()
    } else {
        text.to_owned()
    }
}

/// Highlight a status word: green when complete, yellow otherwise.
pub fn status(text: &str, done: bool, color: bool) -> String {
    match (color, done) {
        (false, _) => text.to_owned(),
        (true, true) => text.green().to_string(),
        (true, false) => text.yellow().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `plain_fn` on each item to emit one line per item
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    plain_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            Ok(render_table(&rows))
        }
        OutputFormat::Plain => Ok(data.iter().map(plain_fn).collect::<Vec<_>>().join("\n")),
        structured => render_structured(structured, data),
    }
}

/// Render any serializable value with a custom table/plain view.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    match format {
        OutputFormat::Table | OutputFormat::Plain => Ok(detail_fn(data)),
        structured => render_structured(structured, data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Value helpers ────────────────────────────────────────────────────

/// One-line text for a JSON value: strings bare, everything else compact.
pub fn inline(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "null".into(),
        other => other.to_string(),
    }
}

/// Mask sensitive fields inside `value`, which was read at `path`.
///
/// Empty strings stay visible so an unset token still reads as unset.
pub fn redact(
    schema: &Schema,
    path: &KeyPath,
    mut value: serde_json::Value,
) -> serde_json::Value {
    for (field, spec) in schema.fields_under(path) {
        if !spec.sensitive {
            continue;
        }
        let relative = field.segments().get(path.len()..).unwrap_or_default();
        let mut slot = Some(&mut value);
        for segment in relative {
            slot = slot.and_then(|v| v.get_mut(segment.as_str()));
        }
        if let Some(slot) = slot {
            if slot.as_str().is_some_and(|s| !s.is_empty()) {
                *slot = serde_json::Value::String(MASK.into());
            }
        }
    }
    value
}

// ── Format-specific renderers ────────────────────────────────────────

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_structured<T: serde::Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        _ => serde_json::to_string_pretty(data)?,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn redact_masks_only_non_empty_sensitive_strings() {
        let schema = Schema::builder_web().unwrap();
        let session = KeyPath::parse("session").unwrap();

        let masked = redact(&schema, &session, json!({ "token": "abc" }));
        assert_eq!(masked, json!({ "token": MASK }));

        let unset = redact(&schema, &session, json!({ "token": "" }));
        assert_eq!(unset, json!({ "token": "" }));

        let leaf = KeyPath::parse("session.token").unwrap();
        assert_eq!(redact(&schema, &leaf, json!("abc")), json!(MASK));
    }

    #[test]
    fn redact_leaves_other_fields_alone() {
        let schema = Schema::builder_web().unwrap();
        let path = KeyPath::parse("router.route").unwrap();
        assert_eq!(redact(&schema, &path, json!("/pkgs")), json!("/pkgs"));
    }

    #[test]
    fn inline_prints_strings_bare() {
        assert_eq!(inline(&json!("x")), "x");
        assert_eq!(inline(&json!(true)), "true");
        assert_eq!(inline(&json!(["a", 1])), r#"["a",1]"#);
    }

    #[test]
    fn structured_formats_serialize() {
        let data = vec![json!({ "path": "a.b" })];
        let compact =
            render_single(OutputFormat::JsonCompact, &data, |_| String::new()).unwrap();
        assert_eq!(compact, r#"[{"path":"a.b"}]"#);
        let yaml = render_single(OutputFormat::Yaml, &data, |_| String::new()).unwrap();
        assert!(yaml.contains("path: a.b"));
    }
}
