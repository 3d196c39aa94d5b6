use clap::Subcommand;
use uuid::Uuid;

use super::{Context, emit_toasts};
use crate::util::{exit_error, print_json, report_session_error};

#[derive(Subcommand)]
pub enum MessageCommands {
    /// Show the conversation with one user
    List {
        #[arg(long)]
        with: Uuid,
    },
    /// Send a message
    Send {
        #[arg(long)]
        to: Uuid,
        #[arg(long)]
        body: String,
    },
}

pub async fn run(ctx: &Context, command: MessageCommands) -> i32 {
    let mut session = ctx.session();
    let code = match command {
        MessageCommands::List { with } => match session.list_messages(with).await {
            Ok(messages) => print_json(&messages),
            Err(e) => report_session_error(&e),
        },
        MessageCommands::Send { to, body } => {
            if body.trim().is_empty() {
                exit_error("Message body is empty", Some("Pass the text with --body."));
            }
            match session.send_message(to, &body).await {
                Ok(message) => print_json(&message),
                Err(e) => report_session_error(&e),
            }
        }
    };
    emit_toasts(&mut session);
    code
}
