//! `cbank store`: comment bank database maintenance.

use clap::Subcommand;

use crate::{CliError, Env};

#[derive(Subcommand)]
pub enum StoreCommands {
    /// Create the comment bank tables (safe on an existing database)
    #[command(after_help = "\
Examples:
  cbank store init
  cbank --db ./bank.db store init")]
    Init,
}

pub fn cmd_store(env: &Env, cmd: StoreCommands) -> Result<(), CliError> {
    match cmd {
        StoreCommands::Init => cmd_store_init(env),
    }
}

fn cmd_store_init(env: &Env) -> Result<(), CliError> {
    let store = env.open_store()?;
    let comments = store.count_comments().map_err(CliError::store)?;
    println!("{} ({} comments)", env.db_path.display(), comments);
    Ok(())
}
