use clap::{Parser, Subcommand};

pub fn parse_year(value: &str) -> Result<i32, String> {
    let year = value
        .parse::<i32>()
        .map_err(|_| "year must be a four-digit number".to_string())?;
    if !(1..=9999).contains(&year) {
        return Err("year must be between 1 and 9999".to_string());
    }
    Ok(year)
}

pub fn parse_pattern_type(value: &str) -> Result<String, String> {
    match value.to_ascii_lowercase().as_str() {
        "name" | "address" | "both" => Ok(value.to_ascii_lowercase()),
        _ => Err("pattern type must be one of: name, address, both".to_string()),
    }
}

/// Extended help shown after `kvitok ingest --help`.
pub const INGEST_AFTER_HELP: &str = "\
Accepted input:
  One JSON document, or a top-level array of documents. Two shapes work:

  Wrapped export (external id outside the body):
    {\"_id\": \"5f1c...\", \"ticket\": {\"document\": {\"receipt\": { ... }}}}

  Flat receipt body:
    {\"dateTime\": \"2026-03-01T10:15:00\", \"totalSum\": 14980, \"items\": [ ... ]}

  <path> is a local file path. Use `-` (or omit the path) to read stdin.
  Example: cat receipts.json | kvitok ingest - --user usr_01...

Body fields:
  dateTime (required)      RFC 3339, naive local time read as UTC, or unix seconds
  totalSum (required)      integer kopecks
  items (required)         array of {name, price, quantity, sum}
  user / userInn           legal name and tax id of the seller
  retailPlace              trade name used to match a known shop
  retailPlaceAddress       outlet address
  operator / operatorInn   cashier
  fiscalDriveNumber, fiscalDocumentNumber, fiscalSign
                           used to recognise the same receipt under a new id

Re-running the same file is safe: duplicates are reported, never stored twice.
";

#[derive(Debug, Parser)]
#[command(
    name = "kvitok",
    version,
    about = "fiscal receipt ledger",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ingest fiscal receipt JSON for one user
    #[command(after_long_help = INGEST_AFTER_HELP)]
    Ingest {
        /// Path to a receipt JSON file (use `-` for stdin)
        path: Option<String>,
        /// Owner of the receipts
        #[arg(long)]
        user: String,
        /// Emit machine-readable JSON output
        #[arg(long)]
        json: bool,
    },
    /// Manage users and their bot identities
    #[command(arg_required_else_help = true)]
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
    /// Inspect and edit shops
    #[command(arg_required_else_help = true)]
    Shop {
        #[command(subcommand)]
        command: ShopCommand,
    },
    /// Manage shop matching rules
    #[command(arg_required_else_help = true)]
    Pattern {
        #[command(subcommand)]
        command: PatternCommand,
    },
    /// Browse stored receipts
    #[command(arg_required_else_help = true)]
    Receipt {
        #[command(subcommand)]
        command: ReceiptCommand,
    },
    /// Spending aggregates
    #[command(arg_required_else_help = true)]
    Analytics {
        #[command(subcommand)]
        command: AnalyticsCommand,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum UserCommand {
    /// Create a user
    Register {
        email: String,
        /// Pre-computed password hash, stored as given
        #[arg(long)]
        password_hash: String,
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Bind a messaging-bot identity to a user
    LinkBot {
        user_id: String,
        bot_identity: String,
        #[arg(long)]
        json: bool,
    },
    /// Look up the user bound to a bot identity
    FindBot {
        bot_identity: String,
        #[arg(long)]
        json: bool,
    },
    /// Allow a user to ingest again
    Activate {
        user_id: String,
        #[arg(long)]
        json: bool,
    },
    /// Stop a user from ingesting
    Deactivate {
        user_id: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ShopCommand {
    /// List the user's shops
    List {
        #[arg(long)]
        user: String,
        /// Only shops marked as favorite
        #[arg(long)]
        favorites: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show which shop a trade name resolves to
    Resolve {
        trade_name: String,
        #[arg(long)]
        address: Option<String>,
        #[arg(long)]
        user: String,
        #[arg(long)]
        json: bool,
    },
    /// Edit user-owned shop fields
    Update {
        shop_id: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        category: Option<String>,
        /// `true` or `false`
        #[arg(long)]
        favorite: Option<bool>,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        retail_name: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Delete a shop that has no receipts
    Delete {
        shop_id: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum PatternCommand {
    /// Map matching trade names or addresses to a shop
    Add {
        shop_id: String,
        /// Literal substring, or a regex with --regex
        value: String,
        #[arg(long)]
        user: String,
        /// What the pattern is matched against: name, address or both
        #[arg(long = "type", default_value = "name", value_parser = parse_pattern_type)]
        pattern_type: String,
        #[arg(long)]
        regex: bool,
        /// Lower runs first
        #[arg(long)]
        priority: Option<i64>,
        #[arg(long)]
        json: bool,
    },
    /// List rules in evaluation order
    List {
        #[arg(long)]
        user: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete a rule
    Remove {
        pattern_id: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum ReceiptCommand {
    /// List receipts, newest first
    List {
        #[arg(long)]
        user: String,
        #[arg(long)]
        skip: Option<i64>,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        json: bool,
    },
    /// Show one receipt with its items
    Show {
        receipt_id: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete a receipt and its items
    Delete {
        receipt_id: String,
        #[arg(long)]
        user: String,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum AnalyticsCommand {
    /// Lifetime totals by payment method
    Total {
        #[arg(long)]
        user: String,
        #[arg(long)]
        json: bool,
    },
    /// Per-month totals for one calendar year
    Monthly {
        #[arg(long)]
        user: String,
        #[arg(long, value_parser = parse_year)]
        year: i32,
        #[arg(long)]
        json: bool,
    },
    /// Items ranked by spend
    TopProducts {
        #[arg(long)]
        user: String,
        /// Only receipts from the last N calendar months
        #[arg(long)]
        months_back: Option<u32>,
        /// Between 1 and 50 (default 10)
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        json: bool,
    },
    /// Spending per shop with sorting and pagination
    ByShop {
        #[arg(long)]
        user: String,
        /// id, retail_name, legal_name, total_amount, receipts_count or receipt_avg
        #[arg(long)]
        sort_by: Option<String>,
        #[arg(long)]
        desc: bool,
        #[arg(long, allow_negative_numbers = true)]
        offset: Option<i64>,
        #[arg(long)]
        limit: Option<i64>,
        /// Page number starting at 1; takes precedence over --offset/--limit
        #[arg(long, allow_negative_numbers = true)]
        page: Option<i64>,
        #[arg(long)]
        page_size: Option<i64>,
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
pub fn parse_from<I, T>(itr: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(itr)
}
