// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use crate::config::{config_path, Config};
use crate::error::{Error, Result};

/// Prints the effective configuration as TOML, defaults filled in.
pub fn run(state_dir: &Path) -> Result<()> {
    let config = Config::load(state_dir)?;
    let path = config_path(state_dir);
    let source = if path.exists() {
        path.display().to_string()
    } else {
        "defaults".to_string()
    };
    println!("# {source}");
    print!("{}", render(&config)?);
    Ok(())
}

pub(crate) fn render(config: &Config) -> Result<String> {
    toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
