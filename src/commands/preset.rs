//! `preset` command handlers.

use anyhow::Context;
use clap::Subcommand;
use crate::core::AppState;
use crate::presets::{Preset, PresetUpdate};
use super::options::OptionArgs;

#[derive(Subcommand, Debug, Clone)]
pub enum PresetCommand {
    /// List saved presets
    List,
    /// Print one preset as JSON
    Show { preset: String },
    /// Save the current options, plus any overrides, as a new preset
    Add {
        name: String,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Change a preset's options
    Update {
        preset: String,
        #[command(flatten)]
        options: OptionArgs,
    },
    Rename { preset: String, name: String },
    Remove { preset: String },
    /// Make a preset's options the current ones
    Apply { preset: String },
}

pub async fn run_preset(state: &AppState, command: PresetCommand) -> anyhow::Result<()> {
    match command {
        PresetCommand::List => {
            let presets = state.presets().await;
            if presets.is_empty() {
                println!("No presets saved");
            }
            for preset in presets {
                println!("{}  {:<24} {}", preset.id, preset.name, preset.options.summary());
            }
        }
        PresetCommand::Show { preset } => {
            let preset = find(state, &preset).await?;
            println!("{}", serde_json::to_string_pretty(&preset)?);
        }
        PresetCommand::Add { name, options } => {
            let options = options.apply_to(state.options().await);
            let id = state.add_preset(&name, &options).await?;
            println!("Added preset {} ({})", id, options.summary());
        }
        PresetCommand::Update { preset, options } => {
            let preset = find(state, &preset).await?;
            let options = options.apply_to(preset.options.clone());
            state
                .update_preset(&preset.id, PresetUpdate {
                    name: None,
                    options: Some(options),
                })
                .await?;
            println!("Updated preset '{}'", preset.name);
        }
        PresetCommand::Rename { preset, name } => {
            let preset = find(state, &preset).await?;
            state.rename_preset(&preset.id, &name).await?;
            println!("Renamed '{}' to '{}'", preset.name, name);
        }
        PresetCommand::Remove { preset } => match state.find_preset(&preset).await {
            Some(found) => {
                state.remove_preset(&found.id).await?;
                println!("Removed preset '{}'", found.name);
            }
            None => println!("No preset named or with id '{}'", preset),
        },
        PresetCommand::Apply { preset } => {
            let options = state.apply_preset(&preset).await?;
            println!("Current options: {}", options.summary());
        }
    }
    Ok(())
}

async fn find(state: &AppState, key: &str) -> anyhow::Result<Preset> {
    state
        .find_preset(key)
        .await
        .with_context(|| format!("No preset named or with id '{}'", key))
}
