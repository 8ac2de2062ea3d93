//! `settings` command handlers.

use clap::Subcommand;
use tracing::debug;
use crate::core::AppState;
use super::options::{DestinationArgs, OptionArgs};

#[derive(Subcommand, Debug, Clone)]
pub enum SettingsCommand {
    /// Print the current options and destination
    Show,
    /// Change and persist the current options and destination
    Set {
        #[command(flatten)]
        options: OptionArgs,
        #[command(flatten)]
        destination: DestinationArgs,
    },
}

pub async fn run_settings(state: &AppState, command: SettingsCommand) -> anyhow::Result<()> {
    match command {
        SettingsCommand::Show => {}
        SettingsCommand::Set { options, destination } => {
            let next = options.apply_to(state.options().await);
            state.set_options(next).await?;
            if !destination.is_empty() {
                state.set_destination(destination.apply_to(state.destination().await)).await?;
            }
            debug!("Settings updated");
        }
    }

    let destination = state.destination().await;
    let snapshot = serde_json::json!({
        "currentOptions": state.options().await,
        "destinationType": destination.destination_type,
        "customDestinationPath": destination.custom_destination_path,
    });
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use crate::core::{DestinationSettings, ResizeOptions, ResizeType};
    use crate::presets::MemoryStore;
    use crate::processing::BatchConfig;
    use crate::processing::converter::tests::MockConverter;
    use crate::utils::LocalFileHost;

    #[tokio::test]
    async fn set_persists_options_and_destination() {
        let state = AppState::new(
            Arc::new(MockConverter::shrinking()),
            Arc::new(LocalFileHost::new()),
            Arc::new(MemoryStore::new()),
            BatchConfig::default(),
        )
        .unwrap();

        let command = SettingsCommand::Set {
            options: OptionArgs {
                resize: Some(ResizeType::Percentage),
                percentage: Some(50),
                ..OptionArgs::default()
            },
            destination: DestinationArgs {
                destination: None,
                output: Some("/exports".into()),
            },
        };
        run_settings(&state, command).await.unwrap();

        assert_eq!(state.options().await.resize, Some(ResizeOptions::percentage(50)));
        assert_eq!(state.destination().await, DestinationSettings::custom("/exports"));
    }
}
