//! CLI struct definitions for the stash command-line interface.
//!
//! All clap-derived types live here. Dispatch logic lives in `lib.rs`.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[clap(
    name = "stash",
    version = env!("CARGO_PKG_VERSION"),
    about = "Stash, a personal key value store."
)]
pub(crate) struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug)]
pub(crate) struct ListCli {
    /// Database to list, as @DB (defaults to the default database).
    pub db: Option<String>,
    /// List in reverse lexicographic order.
    #[clap(short = 'r', long)]
    pub reverse: bool,
    /// Only print keys and don't fetch values from the db.
    #[clap(short = 'k', long)]
    pub keys_only: bool,
    /// Only print values.
    #[clap(short = 'v', long)]
    pub values_only: bool,
    /// Delimiter to separate keys and values. Accepts quoted-string escapes
    /// such as \t, \n, \xNN, \NNN and \uNNNN.
    #[clap(short = 'd', long, default_value = "\t")]
    pub delimiter: String,
    /// Print binary values.
    #[clap(short = 'b', long)]
    pub show_binary: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Set a value for a key with an optional @ db.
    Set {
        /// KEY[@DB]
        key: String,
        /// Value to store (reads stdin when omitted).
        value: Option<String>,
    },

    /// Get a value for a key with an optional @ db.
    Get {
        /// KEY[@DB]
        key: String,
        /// Print binary values.
        #[clap(short = 'b', long)]
        show_binary: bool,
    },

    /// Delete a key with an optional @ db.
    Delete {
        /// KEY[@DB]
        key: String,
    },

    /// List key value pairs with an optional @ db.
    List(ListCli),

    /// List databases.
    #[clap(name = "list-dbs")]
    ListDbs {
        /// Output format: 'text' or 'json'.
        #[clap(long, default_value = "text")]
        format: String,
    },

    /// Delete a database and everything in it.
    #[clap(name = "delete-db")]
    DeleteDb {
        /// @DB
        db: String,
    },

    /// Sync a database with the configured remote mirror.
    Sync {
        /// @DB (defaults to the default database).
        db: Option<String>,
    },

    /// Replace a local database with its remote copy.
    Reset {
        /// @DB (defaults to the default database).
        db: Option<String>,
    },
}
