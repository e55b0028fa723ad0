use clap::{Args, Parser, Subcommand};
use ede_core::EntityKind;

#[derive(Parser)]
#[command(name = "ede-admin", version, about = "Admin console for the language-learning platform")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Profile to load from the config directory
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Log debug output (-vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print one page of an entity list
    List(ListArgs),

    /// Print a single record
    Get(GetArgs),

    /// Interactive console over one entity list
    Console(ConsoleArgs),

    /// Save the effective configuration as a profile
    SaveProfile {
        /// Profile name
        name: String,
    },
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(value_parser = parse_entity)]
    pub entity: EntityKind,

    /// View location to start from, e.g. `language=yo&page=2`
    #[arg(long, default_value = "")]
    pub location: String,

    #[arg(long)]
    pub search: Option<String>,

    /// `name=value`, repeatable
    #[arg(long = "filter", value_name = "NAME=VALUE")]
    pub filters: Vec<String>,

    /// `key` or `key:desc`
    #[arg(long)]
    pub sort: Option<String>,

    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long)]
    pub page_size: Option<u32>,

    /// Print raw JSON records instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct GetArgs {
    #[arg(value_parser = parse_entity)]
    pub entity: EntityKind,

    pub id: String,
}

#[derive(Args)]
pub struct ConsoleArgs {
    #[arg(value_parser = parse_entity)]
    pub entity: EntityKind,

    /// View location to start from
    #[arg(long, default_value = "")]
    pub location: String,

    /// Start with polling enabled
    #[arg(long)]
    pub poll: bool,
}

fn parse_entity(value: &str) -> Result<EntityKind, String> {
    value.parse().map_err(|e: ede_core::UnknownEntity| e.to_string())
}
