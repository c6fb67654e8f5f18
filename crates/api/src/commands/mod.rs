//! CLI commands - terminal to API bridge
//!
//! Every command returns the JSON value printed on stdout.

pub mod auth;
pub mod resources;

use std::time::Instant;

use serde_json::Value;

use crate::cli::Command;
use crate::context::AppContext;
use crate::utils::logging::log_command_execution;

/// Run one parsed command against the context.
///
/// # Errors
/// Propagates the command's failure; `ApiError`s stay downcastable.
pub async fn execute(ctx: &AppContext, command: Command) -> anyhow::Result<Value> {
    let name = command_name(&command);
    let started = Instant::now();

    let result = match command {
        Command::Login { email, password } => auth::login(ctx, &email, &password).await,
        Command::Register(args) => auth::register(ctx, args).await,
        Command::Logout => auth::logout(ctx).await,
        Command::Whoami => auth::whoami(ctx).await,
        Command::Get { path, query } => resources::get(ctx, &path, query).await,
        Command::List { resource, query } => resources::list(ctx, resource, &query).await,
        Command::Report(args) => resources::report(ctx, args.kind, &args.query()).await,
    };

    log_command_execution(name, started.elapsed(), result.as_ref().err());
    result
}

fn command_name(command: &Command) -> &'static str {
    match command {
        Command::Login { .. } => "auth::login",
        Command::Register(_) => "auth::register",
        Command::Logout => "auth::logout",
        Command::Whoami => "auth::whoami",
        Command::Get { .. } => "resources::get",
        Command::List { .. } => "resources::list",
        Command::Report(_) => "resources::report",
    }
}
