//! Stash: a personal key value store for the command line.
//!
//! Values are raw bytes stored under a key inside a named database. Users
//! address them as `KEY[@DB]`; a missing `@DB` means the `default` database.
//!
//! # Architecture
//!
//! - Each database is one directory under `<data-root>/kv/`, holding a SQLite
//!   file owned by the engine. The directory name is the database name.
//! - Every command opens exactly one [`core::store::Namespace`], runs a single
//!   transaction (or one full iteration) and closes it again.
//! - Naming a database that does not exist yields "did you mean" suggestions
//!   from [`core::resolver`] instead of a bare failure.
//! - Output to a terminal hides binary data unless `--show-binary` is given;
//!   piped output is always byte-exact.
//!
//! # Examples
//!
//! ```bash
//! stash set greeting hello
//! stash set token@work < token.bin
//! stash get token@work > token.bin
//! stash list @work -d ' = '
//! stash list-dbs
//! stash delete-db @work
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: addressing, storage handles, resolution, output, configuration
//! - [`plugins`]: the remote mirror behind `sync` and `reset`

mod cli;
pub mod core;
pub mod plugins;

use crate::cli::{Cli, Command, ListCli};
use crate::core::address;
use crate::core::config::{self, Config};
use crate::core::error::StashError;
use crate::core::logging;
use crate::core::output::{self, Formatter, ListOptions, Sink};
use crate::core::purge;
use crate::core::registry::{self, Registry};
use crate::core::resolver;
use crate::core::store::{Namespace, OpenMode};
use crate::core::tui::StdinConfirm;
use crate::plugins::remote::{DirRemote, Remote};

use clap::Parser;
use std::io::{self, Read, Write};

/// What a command intends to do with the namespace it opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Open the namespace a command targets.
///
/// Writes create the namespace on demand. Reads of an explicitly named
/// database that does not exist fail with suggestions; the default database is
/// always available.
pub fn open_namespace(
    registry: &Registry,
    config: &Config,
    db: &str,
    access: Access,
) -> Result<Namespace, StashError> {
    let opts = config.store_options();
    if access == Access::Read && !db.is_empty() {
        resolver::find_db(registry, db, config.suggest_strategy())?;
        return Namespace::open(registry, db, OpenMode::Existing, &opts);
    }
    Namespace::open(registry, db, OpenMode::Create, &opts)
}

fn remote_from(config: &Config) -> Result<DirRemote, StashError> {
    match &config.remote.dir {
        Some(dir) => Ok(DirRemote::new(dir)),
        None => Err(StashError::Remote(
            "no remote configured; set [remote] dir in config.toml".to_string(),
        )),
    }
}

fn cmd_set(
    registry: &Registry,
    config: &Config,
    key: &str,
    value: Option<String>,
) -> Result<(), StashError> {
    let addr = address::parse(key)?;
    let value = match value {
        Some(v) => v.into_bytes(),
        None => {
            let mut buf = Vec::new();
            io::stdin().lock().read_to_end(&mut buf)?;
            buf
        }
    };
    let mut ns = open_namespace(registry, config, &addr.db, Access::Write)?;
    ns.with_txn(false, |txn| txn.set(&addr.key, &value))?;
    ns.close()
}

fn cmd_get(
    registry: &Registry,
    config: &Config,
    key: &str,
    show_binary: bool,
) -> Result<(), StashError> {
    let addr = address::parse(key)?;
    let mut ns = open_namespace(registry, config, &addr.db, Access::Read)?;
    let value = ns.with_txn(true, |txn| txn.get(&addr.key))?;
    ns.close()?;

    let mut fmt = Formatter::new(io::stdout().lock(), Sink::detect(), show_binary);
    fmt.write_value(&value)?;
    fmt.flush()
}

fn cmd_delete(registry: &Registry, config: &Config, key: &str) -> Result<(), StashError> {
    let addr = address::parse(key)?;
    let mut ns = open_namespace(registry, config, &addr.db, Access::Write)?;
    ns.with_txn(false, |txn| txn.delete(&addr.key))?;
    ns.close()
}

fn list_options(list: &ListCli) -> Result<ListOptions, StashError> {
    Ok(ListOptions {
        reverse: list.reverse,
        keys_only: list.keys_only,
        values_only: list.values_only,
        delimiter: output::unescape_delimiter(&list.delimiter)?,
        show_binary: list.show_binary,
    })
}

fn cmd_list(registry: &Registry, config: &Config, list: ListCli) -> Result<(), StashError> {
    let opts = list_options(&list)?;
    let db = address::db_from_arg(list.db.as_deref())?;
    let mut ns = open_namespace(registry, config, &db, Access::Read)?;
    let mut fmt = Formatter::new(io::stdout().lock(), Sink::detect(), opts.show_binary);
    output::iterate(&mut ns, &opts, &mut fmt)?;
    ns.close()
}

fn cmd_list_dbs(registry: &Registry, format: &str) -> Result<(), StashError> {
    let dbs = registry::format_dbs(&registry.list()?);
    let mut out = io::stdout().lock();
    match format {
        "text" => {
            for db in &dbs {
                writeln!(out, "{}", db)?;
            }
        }
        "json" => {
            let json = serde_json::to_string_pretty(&dbs)
                .map_err(|e| StashError::Format(e.to_string()))?;
            writeln!(out, "{}", json)?;
        }
        other => {
            return Err(StashError::Format(format!(
                "unknown format '{}', use text or json",
                other
            )));
        }
    }
    Ok(())
}

fn cmd_delete_db(registry: &Registry, config: &Config, db: &str) -> Result<(), StashError> {
    let mut confirm = StdinConfirm;
    purge::delete_database(
        registry,
        db,
        config.suggest_strategy(),
        &mut confirm,
        &mut io::stderr(),
    )?;
    Ok(())
}

fn cmd_sync(registry: &Registry, config: &Config, db: Option<String>) -> Result<(), StashError> {
    let remote = remote_from(config)?;
    let db = address::db_from_arg(db.as_deref())?;
    let mut ns = open_namespace(registry, config, &db, Access::Write)?;
    let (imported, manifest) = remote.sync(&mut ns)?;
    let name = ns.name().to_string();
    ns.close()?;
    println!(
        "synced @{}: imported {} entries, pushed {} entries",
        name, imported, manifest.entries
    );
    Ok(())
}

fn cmd_reset(registry: &Registry, config: &Config, db: Option<String>) -> Result<(), StashError> {
    let remote = remote_from(config)?;
    let db = address::db_from_arg(db.as_deref())?;
    let name = address::effective_name(&db);
    let manifest = remote.reset(registry, name, &config.store_options())?;
    println!(
        "reset @{} from remote ({} entries, pushed at {})",
        name, manifest.entries, manifest.pushed_at
    );
    Ok(())
}

pub fn run() -> Result<(), StashError> {
    logging::init();
    let cli = Cli::parse();
    let registry = Registry::from_env()?;
    let config = config::load_config(&config::config_path(&registry.root))?;
    tracing::debug!(root = %registry.root.display(), "resolved data root");

    match cli.command {
        Command::Set { key, value } => cmd_set(&registry, &config, &key, value),
        Command::Get { key, show_binary } => cmd_get(&registry, &config, &key, show_binary),
        Command::Delete { key } => cmd_delete(&registry, &config, &key),
        Command::List(list) => cmd_list(&registry, &config, list),
        Command::ListDbs { format } => cmd_list_dbs(&registry, &format),
        Command::DeleteDb { db } => cmd_delete_db(&registry, &config, &db),
        Command::Sync { db } => cmd_sync(&registry, &config, db),
        Command::Reset { db } => cmd_reset(&registry, &config, db),
    }
}
