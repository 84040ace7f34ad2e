//! `config` subcommands. Synchronous: nothing here talks to the gateway.

use serde::Serialize;

use esplink_config::parse_server_url;
use esplink_core::config::DEFAULT_SERVER_URL;

use crate::cli::{ConfigArgs, ConfigCommand, ConfigInitArgs, GlobalOpts, OutputFormat};
use crate::config::{Config, Profile, config_path, load_config, save_config};
use crate::error::CliError;
use crate::output;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => show(global),
        ConfigCommand::Path => {
            output::print_output(&config_path().display().to_string(), global.quiet);
            Ok(())
        }
        ConfigCommand::Init(init_args) => init(&init_args, global),
    }
}

fn show(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = load_config()?;
    let out = match global.output {
        OutputFormat::Table | OutputFormat::Plain => render_toml(&cfg)?,
        OutputFormat::Json => output::render_json(&cfg, false)?,
        OutputFormat::JsonCompact => output::render_json(&cfg, true)?,
        OutputFormat::Yaml => output::render_yaml(&cfg)?,
    };
    output::print_output(out.trim_end(), global.quiet);
    Ok(())
}

fn render_toml<T: Serialize>(value: &T) -> Result<String, CliError> {
    toml::to_string_pretty(value).map_err(|e| CliError::Render(e.to_string()))
}

fn init(args: &ConfigInitArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let raw = args
        .url
        .as_deref()
        .or(global.server.as_deref())
        .unwrap_or(DEFAULT_SERVER_URL);
    let url = parse_server_url(raw)?;

    let mut cfg: Config = load_config()?;
    if cfg.profiles.contains_key(&args.name) && !args.force {
        return Err(CliError::ProfileExists {
            name: args.name.clone(),
        });
    }

    cfg.profiles.insert(
        args.name.clone(),
        Profile {
            server_url: url.to_string(),
            timeout: global.timeout,
            poll_interval: global.interval.map(|d| d.as_secs().max(1)),
        },
    );
    if cfg.default_profile.is_none() {
        cfg.default_profile = Some(args.name.clone());
    }

    let path = save_config(&cfg)?;
    tracing::info!(profile = %args.name, path = %path.display(), "profile saved");
    output::print_output(
        &format!("Saved profile '{}' to {}", args.name, path.display()),
        global.quiet,
    );
    Ok(())
}
