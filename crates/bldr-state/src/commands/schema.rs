//! Schema listing.

use serde::Serialize;
use tabled::Tabled;

use bldr_state_core::{FieldSpec, KeyPath, Kind, Schema, Store};

use crate::cli::SchemaArgs;
use crate::config::Context;
use crate::error::CliError;
use crate::output;

// ── Entry + table row ───────────────────────────────────────────────

#[derive(Serialize)]
struct FieldEntry {
    path: String,
    kind: Kind,
    optional: bool,
    sensitive: bool,
    default: serde_json::Value,
}

impl FieldEntry {
    fn new(schema: &Schema, path: &KeyPath, spec: &FieldSpec) -> Self {
        Self {
            path: path.to_string(),
            kind: spec.kind,
            optional: spec.optional,
            sensitive: spec.sensitive,
            default: output::redact(schema, path, spec.default.to_json()),
        }
    }
}

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Optional")]
    optional: String,
    #[tabled(rename = "Default")]
    default: String,
}

impl From<&FieldEntry> for FieldRow {
    fn from(e: &FieldEntry) -> Self {
        Self {
            path: e.path.clone(),
            kind: e.kind.to_string(),
            optional: if e.optional { "yes" } else { "" }.into(),
            default: output::inline(&e.default),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &SchemaArgs, ctx: &Context) -> Result<(), CliError> {
    let store = ctx.store()?;
    let entries = entries(&store, args.prefix.as_deref())?;
    let out = output::render_list(
        ctx.format,
        &entries,
        |e| FieldRow::from(e),
        |e| e.path.clone(),
    )?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}

fn entries(store: &Store, prefix: Option<&str>) -> Result<Vec<FieldEntry>, CliError> {
    let schema = store.schema();
    let Some(prefix) = prefix else {
        return Ok(schema
            .fields()
            .map(|(path, spec)| FieldEntry::new(schema, path, spec))
            .collect());
    };

    let prefix = KeyPath::parse(prefix)?;
    // Validates that the prefix is a declared field or record.
    schema.lookup(&prefix)?;
    Ok(schema
        .fields_under(&prefix)
        .map(|(path, spec)| FieldEntry::new(schema, path, spec))
        .collect())
}
