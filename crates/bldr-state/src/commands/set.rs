//! Updates applied through the store.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::info;

use bldr_state_core::{KeyPath, Value};

use crate::cli::SetArgs;
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::get;

pub fn handle(args: &SetArgs, ctx: &Context) -> Result<(), CliError> {
    let updates = args
        .assignments
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<Result<Vec<_>, _>>()?;

    let store = ctx.store()?;
    let transitions = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&transitions);
    store.subscribe(move |_| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    let shown = if args.show.is_empty() {
        updates.iter().map(|(path, _)| path.clone()).collect()
    } else {
        get::parse_paths(&args.show)?
    };

    let tree = store.update_many(updates)?;
    info!(
        transitions = transitions.load(Ordering::Relaxed),
        "updates applied"
    );

    let out = get::render(&tree, &shown, ctx)?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}

/// Split `PATH=VALUE`. VALUE is parsed as JSON when it can be; anything
/// else is taken as a plain string.
fn parse_assignment(raw: &str) -> Result<(KeyPath, Value), CliError> {
    let (path, value) = raw.split_once('=').ok_or_else(|| CliError::Validation {
        field: "assignment".into(),
        reason: format!("expected PATH=VALUE, got '{raw}'"),
    })?;
    let path = KeyPath::parse(path.trim())?;
    let value = match serde_json::from_str::<serde_json::Value>(value) {
        Ok(json) => Value::try_from(json)?,
        Err(_) => Value::from(value),
    };
    Ok((path, value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn json_values_are_typed() {
        let (path, value) = parse_assignment("users.current.isSignedIn=true").unwrap();
        assert_eq!(path.to_string(), "users.current.isSignedIn");
        assert_eq!(value, Value::Bool(true));

        let (_, value) = parse_assignment("origins.currentPublicKeys=[\"a\",\"b\"]").unwrap();
        assert_eq!(value, Value::List(vec![Value::from("a"), Value::from("b")]));
    }

    #[test]
    fn non_json_values_are_strings() {
        let (_, value) = parse_assignment("router.route=/pkgs/core").unwrap();
        assert_eq!(value, Value::from("/pkgs/core"));

        let (_, value) = parse_assignment("router.route=").unwrap();
        assert_eq!(value, Value::from(""));
    }

    #[test]
    fn json_null_parses_to_null() {
        let (_, value) = parse_assignment("app.currentYear=null").unwrap();
        assert_eq!(value, Value::Null);
    }

    #[test]
    fn malformed_assignments_are_usage_errors() {
        let err = parse_assignment("router.route").unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));

        let err = parse_assignment("a..b=1").unwrap_err();
        assert!(matches!(err, CliError::InvalidPath { .. }));

        let err = parse_assignment("app.currentYear=1.5").unwrap_err();
        assert!(matches!(err, CliError::UnsupportedValue { .. }));
    }
}
