use crate::cli::{
    AnalyticsCommand, Commands, PatternCommand, ReceiptCommand, ShopCommand, UserCommand,
};

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum OutputMode {
    Text,
    Json,
}

pub fn mode_for_command(command: &Commands) -> OutputMode {
    let json = match command {
        Commands::Ingest { json, .. } => *json,
        Commands::User { command } => match command {
            UserCommand::Register { json, .. }
            | UserCommand::LinkBot { json, .. }
            | UserCommand::FindBot { json, .. }
            | UserCommand::Activate { json, .. }
            | UserCommand::Deactivate { json, .. } => *json,
        },
        Commands::Shop { command } => match command {
            ShopCommand::List { json, .. }
            | ShopCommand::Resolve { json, .. }
            | ShopCommand::Update { json, .. }
            | ShopCommand::Delete { json, .. } => *json,
        },
        Commands::Pattern { command } => match command {
            PatternCommand::Add { json, .. }
            | PatternCommand::List { json, .. }
            | PatternCommand::Remove { json, .. } => *json,
        },
        Commands::Receipt { command } => match command {
            ReceiptCommand::List { json, .. }
            | ReceiptCommand::Show { json, .. }
            | ReceiptCommand::Delete { json, .. } => *json,
        },
        Commands::Analytics { command } => match command {
            AnalyticsCommand::Total { json, .. }
            | AnalyticsCommand::Monthly { json, .. }
            | AnalyticsCommand::TopProducts { json, .. }
            | AnalyticsCommand::ByShop { json, .. } => *json,
        },
    };

    if json {
        OutputMode::Json
    } else {
        OutputMode::Text
    }
}
