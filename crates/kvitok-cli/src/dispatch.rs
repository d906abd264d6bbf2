use kvitok_client::analytics::Pagination;
use kvitok_client::commands;
use kvitok_client::shops::ShopUpdate;
use kvitok_client::{ClientResult, SuccessEnvelope};

use crate::cli::{
    AnalyticsCommand, Cli, Commands, PatternCommand, ReceiptCommand, ShopCommand, UserCommand,
};

pub fn dispatch(cli: &Cli) -> ClientResult<SuccessEnvelope> {
    match &cli.command {
        Commands::Ingest { path, user, .. } => commands::ingest::run(path.clone(), user),
        Commands::User { command } => dispatch_user(command),
        Commands::Shop { command } => dispatch_shop(command),
        Commands::Pattern { command } => match command {
            PatternCommand::Add {
                shop_id,
                value,
                user,
                pattern_type,
                regex,
                priority,
                ..
            } => commands::patterns::add(user, shop_id, pattern_type, value, *regex, *priority),
            PatternCommand::List { user, .. } => commands::patterns::list(user),
            PatternCommand::Remove {
                pattern_id, user, ..
            } => commands::patterns::remove(user, pattern_id),
        },
        Commands::Receipt { command } => match command {
            ReceiptCommand::List {
                user, skip, limit, ..
            } => commands::receipts::list(user, *skip, *limit),
            ReceiptCommand::Show {
                receipt_id, user, ..
            } => commands::receipts::show(user, receipt_id),
            ReceiptCommand::Delete {
                receipt_id, user, ..
            } => commands::receipts::delete(user, receipt_id),
        },
        Commands::Analytics { command } => dispatch_analytics(command),
    }
}

fn dispatch_user(command: &UserCommand) -> ClientResult<SuccessEnvelope> {
    match command {
        UserCommand::Register {
            email,
            password_hash,
            full_name,
            ..
        } => commands::users::register(email, password_hash, full_name.as_deref()),
        UserCommand::LinkBot {
            user_id,
            bot_identity,
            ..
        } => commands::users::link_bot(user_id, bot_identity),
        UserCommand::FindBot { bot_identity, .. } => commands::users::find_by_bot(bot_identity),
        UserCommand::Activate { user_id, .. } => commands::users::set_active(user_id, true),
        UserCommand::Deactivate { user_id, .. } => commands::users::set_active(user_id, false),
    }
}

fn dispatch_shop(command: &ShopCommand) -> ClientResult<SuccessEnvelope> {
    match command {
        ShopCommand::List {
            user, favorites, ..
        } => commands::shops::list(user, *favorites),
        ShopCommand::Resolve {
            trade_name,
            address,
            user,
            ..
        } => commands::shops::resolve(user, trade_name, address.as_deref()),
        ShopCommand::Update {
            shop_id,
            user,
            category,
            favorite,
            notes,
            retail_name,
            ..
        } => commands::shops::update(
            user,
            shop_id,
            ShopUpdate {
                category: category.clone(),
                is_favorite: *favorite,
                notes: notes.clone(),
                retail_name: retail_name.clone(),
            },
        ),
        ShopCommand::Delete { shop_id, user, .. } => commands::shops::delete(user, shop_id),
    }
}

fn dispatch_analytics(command: &AnalyticsCommand) -> ClientResult<SuccessEnvelope> {
    match command {
        AnalyticsCommand::Total { user, .. } => commands::analytics::total(user),
        AnalyticsCommand::Monthly { user, year, .. } => commands::analytics::monthly(user, *year),
        AnalyticsCommand::TopProducts {
            user,
            months_back,
            limit,
            ..
        } => commands::analytics::top_products(user, *months_back, *limit),
        AnalyticsCommand::ByShop {
            user,
            sort_by,
            desc,
            offset,
            limit,
            page,
            page_size,
            ..
        } => commands::analytics::by_shop(
            user,
            sort_by.clone(),
            *desc,
            Pagination {
                offset: *offset,
                limit: *limit,
                page: *page,
                page_size: *page_size,
            },
        ),
    }
}

#[cfg(test)]
mod tests {
    use crate::cli::parse_from;

    #[test]
    fn unknown_commands_are_not_dispatchable() {
        let parsed = parse_from(["kvitok", "import", "create"]);
        assert!(parsed.is_err());
    }
}
