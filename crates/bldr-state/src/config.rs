//! CLI-side configuration: `GlobalOpts`-aware wrappers over
//! `bldr-state-config`.
//!
//! Flags win over the config file; the config file wins over built-in
//! defaults. Core never sees any of this, it receives a `StoreConfig`
//! and a `SessionSource`.

use std::path::PathBuf;

use clap::ValueEnum;
use tracing::debug;

use bldr_state_config::{Config, load_config, load_config_from, resolve_session, to_store_config};
use bldr_state_core::{CookieHeader, SessionSource, Store};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// The config file this invocation reads: `--config`, else the platform path.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(bldr_state_config::config_path)
}

/// Everything a command needs besides its own arguments.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
    cookie: Option<String>,
}

impl Context {
    pub fn load(global: &GlobalOpts) -> Result<Self, CliError> {
        let config = match global.config {
            Some(ref path) => load_config_from(path)?,
            None => load_config()?,
        };

        let format = global
            .output
            .or_else(|| OutputFormat::from_str(&config.defaults.output, true).ok())
            .unwrap_or(OutputFormat::Table);
        let color = global
            .color
            .or_else(|| ColorMode::from_str(&config.defaults.color, true).ok())
            .unwrap_or(ColorMode::Auto);

        Ok(Self {
            format,
            color: output::should_color(color),
            quiet: global.quiet,
            cookie: global.cookie.clone(),
            config,
        })
    }

    /// Session source: `--cookie` if given, else the `[session]` chain.
    pub fn session(&self) -> Result<Box<dyn SessionSource>, CliError> {
        if let Some(ref header) = self.cookie {
            debug!("session token from --cookie");
            return Ok(Box::new(CookieHeader::new(header.clone())));
        }
        Ok(resolve_session(&self.config)?)
    }

    /// A fresh store seeded from config and the session source.
    pub fn store(&self) -> Result<Store, CliError> {
        let session = self.session()?;
        Ok(Store::builder_web(
            &to_store_config(&self.config),
            session.as_ref(),
        )?)
    }
}
