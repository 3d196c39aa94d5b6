use clap::Subcommand;
use uuid::Uuid;

use super::{Context, emit_toasts};
use crate::util::{print_json, report_session_error};

#[derive(Subcommand)]
pub enum ConnectionCommands {
    /// List your connections
    List,
    /// Send a connection request to another user
    Add {
        #[arg(long)]
        user_id: Uuid,
    },
    /// Remove a connection
    Remove {
        /// Connection id (see `pitchside connection list`)
        #[arg(long)]
        id: Uuid,
    },
}

pub async fn run(ctx: &Context, command: ConnectionCommands) -> i32 {
    let mut session = ctx.session();
    let code = match command {
        ConnectionCommands::List => match session.load_connections().await {
            Ok(connections) => print_json(&connections),
            Err(e) => report_session_error(&e),
        },
        ConnectionCommands::Add { user_id } => match session.add_connection(user_id).await {
            Ok(connection) => print_json(&connection),
            Err(e) => report_session_error(&e),
        },
        ConnectionCommands::Remove { id } => {
            // removal is applied to the freshly loaded list
            match session.load_connections().await {
                Ok(_) => match session.remove_connection(id).await {
                    Ok(()) => print_json(&session.connections()),
                    Err(e) => report_session_error(&e),
                },
                Err(e) => report_session_error(&e),
            }
        }
    };
    emit_toasts(&mut session);
    code
}
