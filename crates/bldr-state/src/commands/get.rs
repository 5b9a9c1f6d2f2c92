//! Path reads against a state snapshot.

use std::fmt::Write;

use indexmap::IndexMap;

use bldr_state_core::{KeyPath, StateTree};

use crate::cli::{GetArgs, OutputFormat};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

pub fn handle(args: &GetArgs, ctx: &Context) -> Result<(), CliError> {
    let store = ctx.store()?;
    let paths = parse_paths(&args.paths)?;
    let out = render(&store.snapshot(), &paths, ctx)?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}

pub(crate) fn parse_paths(raw: &[String]) -> Result<Vec<KeyPath>, CliError> {
    raw.iter()
        .map(|p| KeyPath::parse(p).map_err(CliError::from))
        .collect()
}

/// Render `paths` read from `tree`, masking sensitive values.
///
/// Structured formats produce a `path -> value` map; table and plain
/// print `path = value` lines (plain drops the path for a single read).
pub(crate) fn render(
    tree: &StateTree,
    paths: &[KeyPath],
    ctx: &Context,
) -> Result<String, CliError> {
    let mut values: IndexMap<String, serde_json::Value> = IndexMap::new();
    for path in paths {
        let value = tree.get(path)?.to_json();
        values.insert(path.to_string(), output::redact(tree.schema(), path, value));
    }

    output::render_single(ctx.format, &values, |values| {
        if values.len() == 1 && ctx.format == OutputFormat::Plain {
            return values.values().map(output::inline).collect();
        }
        let mut out = String::new();
        for (path, value) in values {
            let path = output::dim(path, ctx.color);
            let _ = writeln!(out, "{path} = {}", output::inline(value));
        }
        out.trim_end().to_owned()
    })
}
