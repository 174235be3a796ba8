//! Config subcommand handlers.

use dialoguer::{Confirm, Input};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Init: interactive wizard ────────────────────────────────
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("dbmon configuration wizard");
            eprintln!("   Config path: {}\n", config_path.display());

            let mut cfg = config::load_config()?;

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()?;

            let base_url: String = Input::new()
                .with_prompt("Backend URL")
                .default("http://localhost:5001".into())
                .validate_with(|input: &String| -> Result<(), String> {
                    match input.parse::<url::Url>() {
                        Ok(u) if matches!(u.scheme(), "http" | "https") => Ok(()),
                        _ => Err("expected an http(s) URL".into()),
                    }
                })
                .interact_text()?;

            let insecure = Confirm::new()
                .with_prompt("Accept self-signed certificates?")
                .default(false)
                .interact()?;

            let mut profile = Profile::new(base_url);
            if insecure {
                profile.insecure = Some(true);
            }

            if cfg.profiles.contains_key(&profile_name)
                && !Confirm::new()
                    .with_prompt(format!("Overwrite existing profile '{profile_name}'?"))
                    .default(false)
                    .interact()?
            {
                eprintln!("Aborted.");
                return Ok(());
            }

            cfg.profiles.insert(profile_name.clone(), profile);
            if cfg.default_profile.is_none() || cfg.profiles.len() == 1 {
                cfg.default_profile = Some(profile_name.clone());
            }

            let written = config::save_config(&cfg)?;
            eprintln!("\nConfiguration written to {}", written.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: dbmon stats");
            Ok(())
        }

        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let out = output::render_single(
                global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("<unrenderable: {e}>")),
                |c| profile_names(c).join("\n"),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", config::config_path().display());
            Ok(())
        }

        // ── Use: switch the default profile ─────────────────────────
        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config()?;
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: profile_names(&cfg).join(", "),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Default profile set to '{name}'");
            }
            Ok(())
        }
    }
}

fn profile_names(cfg: &Config) -> Vec<String> {
    cfg.profiles.keys().cloned().collect()
}
