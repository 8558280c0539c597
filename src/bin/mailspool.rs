#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI client for a mailspool server

use clap::{Parser, Subcommand};
use mailspool::{ClientConfig, Mail, SpoolClient};
use serde_json::json;
use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailspool")]
#[command(about = "Send, list, read and delete messages on a mailspool server")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Send a message
    Send {
        /// Sender name (1-8 characters)
        sender: String,

        /// Receiver mailbox (1-8 characters)
        receiver: String,

        /// Subject (1-80 characters)
        subject: String,

        /// Message body; read from stdin when omitted
        #[arg(long)]
        body: Option<String>,
    },

    /// List message ids in a mailbox
    List {
        /// Mailbox name
        user: String,
    },

    /// Show a single message by id
    Read {
        /// Mailbox name
        user: String,

        /// Message id
        id: u64,
    },

    /// Delete a message by id
    Delete {
        /// Mailbox name
        user: String,

        /// Message id
        id: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let client = SpoolClient::new(ClientConfig::from_env()?);

    match &args.command {
        Command::Send {
            sender,
            receiver,
            subject,
            body,
        } => {
            cmd_send(&client, &args, sender, receiver, subject, body.as_deref()).await?;
        }
        Command::List { user } => {
            cmd_list(&client, &args, user).await?;
        }
        Command::Read { user, id } => {
            cmd_read(&client, &args, user, *id).await?;
        }
        Command::Delete { user, id } => {
            cmd_delete(&client, &args, user, *id).await?;
        }
    }

    Ok(())
}

async fn cmd_send(
    client: &SpoolClient,
    args: &Args,
    sender: &str,
    receiver: &str,
    subject: &str,
    body: Option<&str>,
) -> anyhow::Result<()> {
    let text = match body {
        Some(text) => text.to_string(),
        None => {
            let mut text = String::new();
            tokio::io::stdin().read_to_string(&mut text).await?;
            text
        }
    };
    let lines = text.lines().map(str::to_string).collect();

    let mail = Mail::new(sender, receiver, subject, lines)?;
    client.send(&mail).await?;

    if args.json {
        println!("{}", json!({ "sent": true, "receiver": receiver }));
    } else {
        println!("Sent to {receiver}");
    }

    Ok(())
}

async fn cmd_list(client: &SpoolClient, args: &Args, user: &str) -> anyhow::Result<()> {
    let ids = client.list(user).await?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "user": user, "ids": ids }))?
        );
    } else if ids.is_empty() {
        println!("No messages for {user}.");
    } else {
        for id in &ids {
            println!("{id}");
        }
        println!("\n{} message(s)", ids.len());
    }

    Ok(())
}

async fn cmd_read(client: &SpoolClient, args: &Args, user: &str, id: u64) -> anyhow::Result<()> {
    let body = client.read(user, id).await?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "user": user, "id": id, "body": body }))?
        );
    } else {
        for line in &body {
            println!("{line}");
        }
    }

    Ok(())
}

async fn cmd_delete(
    client: &SpoolClient,
    args: &Args,
    user: &str,
    id: u64,
) -> anyhow::Result<()> {
    client.delete(user, id).await?;

    if args.json {
        println!("{}", json!({ "deleted": id, "user": user }));
    } else {
        println!("Deleted message {id} from {user}");
    }

    Ok(())
}
