//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use std::path::Path;

/// Execute the config command.
pub async fn execute_config(
    args: ConfigArgs,
    config: &Config,
    path: Option<&Path>,
    formatter: &Formatter,
) -> Result<()> {
    match args.action {
        ConfigAction::Init { force } => init_config(path, force, formatter),
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
        ConfigAction::Path => {
            println!("{}", Config::resolve_path(path)?.display());
            Ok(())
        }
    }
}

/// Write the default configuration.
fn init_config(path: Option<&Path>, force: bool, formatter: &Formatter) -> Result<()> {
    let target = Config::resolve_path(path)?;
    if target.exists() && !force {
        println!(
            "{}",
            formatter.warning(&format!(
                "{} already exists (use --force to overwrite)",
                target.display()
            ))
        );
        return Ok(());
    }
    let written = Config::default().save(Some(&target))?;
    println!(
        "{}",
        formatter.success(&format!("Configuration written to {}", written.display()))
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;

    #[test]
    fn test_init_does_not_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let formatter = Formatter::new(OutputFormat::Outline, false);

        init_config(Some(&path), false, &formatter).unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap(), Config::default());

        std::fs::write(&path, "[builder]\nmax_workers = 1\n").unwrap();
        init_config(Some(&path), false, &formatter).unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap().builder.max_workers, 1);

        init_config(Some(&path), true, &formatter).unwrap();
        assert_eq!(Config::load(Some(&path)).unwrap(), Config::default());
    }
}
