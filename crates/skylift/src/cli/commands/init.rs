//! Init command

use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use dialoguer::{Confirm, Input, MultiSelect, Password, Select};
use tracing::info;

use skylift_core::config::{
    edge_auth_fields, InitField, CHROME_INIT_FIELDS, DEFAULT_ENV_FILE, EDGE_API_VERSIONS,
    EDGE_INIT_FIELDS, FIREFOX_INIT_FIELDS,
};
use skylift_stores::StoreId;

use crate::cli::{output, Cli};
use crate::exit_codes;

/// Interactively write store credentials to an env file
#[derive(Debug, Args)]
pub struct InitCommand {
    /// Force overwrite existing env file
    #[arg(short, long)]
    pub force: bool,

    /// Env file to write
    #[arg(long, env = "SKYLIFT_ENV_FILE", default_value = DEFAULT_ENV_FILE)]
    pub env_file: PathBuf,
}

fn init_fields(store: StoreId) -> &'static [InitField] {
    match store {
        StoreId::Chrome => CHROME_INIT_FIELDS,
        StoreId::Firefox => FIREFOX_INIT_FIELDS,
        StoreId::Edge => EDGE_INIT_FIELDS,
    }
}

impl InitCommand {
    /// Execute the init command
    pub fn execute(&self, cli: &Cli) -> anyhow::Result<i32> {
        info!(force = self.force, env_file = %self.env_file.display(), "executing init command");

        if self.env_file.exists() && !self.force {
            let overwrite = Confirm::new()
                .with_prompt(format!(
                    "{} already exists. Overwrite?",
                    self.env_file.display()
                ))
                .default(false)
                .interact()?;

            if !overwrite {
                println!("{}", style("Aborted.").yellow());
                return Ok(exit_codes::SUCCESS);
            }
        }

        let names: Vec<&str> = StoreId::ALL.iter().map(|s| s.display_name()).collect();
        let selected = MultiSelect::new()
            .with_prompt("Which stores do you want to submit to? (space to select)")
            .items(&names)
            .interact()?;

        if selected.is_empty() {
            output::warning("No store selected, nothing written");
            return Ok(exit_codes::SUCCESS);
        }

        let mut values = Vec::new();
        for store in selected.into_iter().map(|i| StoreId::ALL[i]) {
            println!();
            println!("{}", output::header(store.display_name()));
            prompt_fields(init_fields(store), &mut values)?;

            // The two Edge APIs take different credentials
            if store == StoreId::Edge {
                let choice = Select::new()
                    .with_prompt("API version")
                    .items(EDGE_API_VERSIONS)
                    .default(0)
                    .interact()?;
                let version = EDGE_API_VERSIONS[choice];
                values.push(("EDGE_API_VERSION", version.to_string()));
                prompt_fields(edge_auth_fields(version), &mut values)?;
            }
        }

        write_env_file(&self.env_file, &values)?;

        if !cli.quiet {
            println!();
            output::success(&format!(
                "Wrote {} values to {}",
                values.len(),
                output::path_style().apply_to(self.env_file.display())
            ));
            println!();
            println!("Next steps:");
            println!("  1. Keep {} out of version control", self.env_file.display());
            println!(
                "  2. Run {} to check your credentials",
                style("skylift submit --dry-run").cyan()
            );
        }

        Ok(exit_codes::SUCCESS)
    }
}

fn prompt_fields(
    fields: &[InitField],
    values: &mut Vec<(&'static str, String)>,
) -> anyhow::Result<()> {
    for field in fields {
        if let Some(value) = prompt(field)? {
            values.push((field.key, value));
        }
    }
    Ok(())
}

fn prompt(field: &InitField) -> anyhow::Result<Option<String>> {
    let value = if field.secret {
        Password::new()
            .with_prompt(field.prompt)
            .allow_empty_password(true)
            .interact()?
    } else {
        let mut input = Input::<String>::new()
            .with_prompt(field.prompt)
            .allow_empty(true);
        if let Some(default) = field.default {
            input = input.default(default.to_string());
        }
        input.interact_text()?
    };

    let value = value.trim().to_string();
    Ok((!value.is_empty()).then_some(value))
}

/// Render `KEY=value` lines, quoting values that need it
fn render_env_file(values: &[(&str, String)]) -> String {
    let mut content = String::from("# Written by `skylift init`. Contains secrets.\n");
    for (key, value) in values {
        content.push_str(key);
        content.push('=');
        content.push_str(&quote_value(value));
        content.push('\n');
    }
    content
}

fn quote_value(value: &str) -> String {
    let plain = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_./:@+,".contains(c));
    if plain {
        value.to_string()
    } else if !value.contains('\'') {
        // Single quotes are literal, no `$` substitution
        format!("'{}'", value)
    } else {
        format!(
            "\"{}\"",
            value
                .replace('\\', "\\\\")
                .replace('"', "\\\"")
                .replace('$', "\\$")
        )
    }
}

fn write_env_file(path: &Path, values: &[(&str, String)]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_env_file(values))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skylift_core::config::{inline_from_env, load_env_file, resolve_config, EnvSource};
    use tempfile::TempDir;

    #[test]
    fn test_quote_value() {
        assert_eq!(quote_value("dist/chrome.zip"), "dist/chrome.zip");
        assert_eq!(quote_value("has space"), "'has space'");
        assert_eq!(quote_value("pa$word"), "'pa$word'");
        assert_eq!(quote_value("it's $5"), "\"it's \\$5\"");
    }

    #[test]
    fn test_written_file_is_readable_as_env_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join(".env.submit");
        let values = vec![
            ("CHROME_ZIP", "dist/chrome.zip".to_string()),
            ("CHROME_CLIENT_SECRET", "s3cr#t with \"quotes\"".to_string()),
            ("CHROME_REFRESH_TOKEN", "pa$word".to_string()),
            ("FIREFOX_JWT_SECRET", "it's $HOME \\ \"x\"".to_string()),
        ];

        write_env_file(&path, &values).unwrap();
        let env = load_env_file(&path).unwrap();

        for (key, value) in &values {
            assert_eq!(env.get(key).as_deref(), Some(value.as_str()), "{}", key);
        }
    }

    #[test]
    fn test_edge_answers_resolve_for_each_api_version() {
        let temp = TempDir::new().unwrap();
        for version in EDGE_API_VERSIONS {
            let mut values: Vec<(&str, String)> = EDGE_INIT_FIELDS
                .iter()
                .map(|f| (f.key, format!("{}-value", f.key.to_lowercase())))
                .collect();
            values.push(("EDGE_API_VERSION", version.to_string()));
            values.extend(
                edge_auth_fields(version)
                    .iter()
                    .map(|f| (f.key, "https://login.example/token".to_string())),
            );

            let path = temp.path().join(format!(".env.{}", version));
            write_env_file(&path, &values).unwrap();
            let env = load_env_file(&path).unwrap();
            let config = resolve_config(&inline_from_env(&env).unwrap()).unwrap();

            let edge = config.edge.unwrap();
            assert_eq!(edge.auth.api_version(), *version);
        }
    }

    #[test]
    fn test_every_store_has_init_fields() {
        for store in StoreId::ALL {
            assert!(!init_fields(store).is_empty());
        }
    }
}
