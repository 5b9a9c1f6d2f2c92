//! Config subcommand handlers.

use bldr_state_config::{Config, save_config, save_config_to};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Context};
use crate::error::CliError;
use crate::output;

/// Copy of `cfg` with the plaintext session token masked.
fn redacted(cfg: &Config) -> Config {
    let mut cfg = cfg.clone();
    if let Some(ref mut token) = cfg.session.token {
        if !token.is_empty() {
            output::MASK.clone_into(token);
        }
    }
    cfg
}

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = config::config_path(global);

    match args.command {
        ConfigCommand::Path => {
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let ctx = Context::load(global)?;
            let cfg = redacted(&ctx.config);
            let text = toml::to_string_pretty(&cfg)?;
            let out = output::render_single(ctx.format, &cfg, |_| text.clone())?;
            output::print_output(out.trim_end(), ctx.quiet);
            Ok(())
        }

        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                return Err(CliError::ConfigExists {
                    path: path.display().to_string(),
                });
            }
            match global.config {
                Some(ref path) => save_config_to(&Config::default(), path)?,
                None => save_config(&Config::default())?,
            }
            if !global.quiet {
                eprintln!("Config written to {}", path.display());
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redaction_hides_only_a_real_token() {
        let mut cfg = Config::default();
        cfg.session.token = Some("s3cret".into());
        cfg.session.token_env = Some("BLDR_TOKEN".into());

        let shown = redacted(&cfg);
        assert_eq!(shown.session.token.as_deref(), Some(output::MASK));
        assert_eq!(shown.session.token_env.as_deref(), Some("BLDR_TOKEN"));

        cfg.session.token = Some(String::new());
        assert_eq!(redacted(&cfg).session.token.as_deref(), Some(""));
    }
}
