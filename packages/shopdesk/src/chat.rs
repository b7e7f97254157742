//! Interactive chat console.
//!
//! Runs the synchronization client against stdin. Lines starting with `/`
//! are console commands; everything else is sent to the open conversation.

use std::time::Duration;

use anyhow::Result;
use chat_sync::{
    ApiError, ChatClient, ChatEntry, ChannelEvent, ClientUpdate, ConnectionState, Delivery,
    SendError, WsConnector,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::debug;

use crate::commands;
use crate::config::ConsoleConfig;

pub async fn chat_command(config: &ConsoleConfig) -> Result<()> {
    let api = commands::client(config);
    let connector = WsConnector::new(&config.channel_url, config.load_token());
    let (mut client, mut updates) = ChatClient::new(api, connector);

    let mut inbound = client.connect().await;

    eprintln!("shopdesk chat — /list, /open <id>, /close, /quit");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut reconnect = tokio::time::interval(Duration::from_secs(5));
    // The first tick fires immediately; skip it so connect() above settles.
    reconnect.tick().await;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_line(&mut client, line.trim()).await? {
                    break;
                }
            }
            event = recv_channel(&mut inbound) => {
                match event {
                    Some(event) => client.handle_channel_event(event),
                    None => {
                        // Transport pump ended; the Closed event already
                        // went through by now.
                        inbound = None;
                    }
                }
            }
            update = updates.recv() => {
                let Some(update) = update else { break };
                render_update(&client, update);
            }
            _ = reconnect.tick() => {
                if client.connection_state() == ConnectionState::Disconnected {
                    debug!("retrying push channel");
                    if let Some(rx) = client.connect().await {
                        inbound = Some(rx);
                    }
                }
            }
        }
    }

    Ok(())
}

/// Await the next channel event, or park forever when no channel is up.
async fn recv_channel(
    inbound: &mut Option<mpsc::UnboundedReceiver<ChannelEvent>>,
) -> Option<ChannelEvent> {
    match inbound {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Returns `false` when the console should exit.
async fn handle_line<A: chat_sync::ChatApi, C: chat_sync::Connector>(
    client: &mut ChatClient<A, C>,
    line: &str,
) -> Result<bool> {
    if line.is_empty() {
        return Ok(true);
    }

    if let Some(rest) = line.strip_prefix('/') {
        let (cmd, arg) = rest.split_once(' ').unwrap_or((rest, ""));
        match cmd {
            "quit" | "q" => return Ok(false),
            "list" => list_conversations(client).await?,
            "open" => {
                let id = arg.trim();
                if id.is_empty() {
                    eprintln!("usage: /open <conversation-id>");
                } else {
                    match client.select(id).await {
                        Ok(()) => {
                            for entry in client.messages() {
                                println!("{}", format_entry(entry));
                            }
                        }
                        Err(ApiError::Unavailable) => {
                            eprintln!("[shopdesk: server unreachable]")
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
            "close" => client.deselect(),
            other => eprintln!("unknown command: /{other}"),
        }
        return Ok(true);
    }

    let Some(active) = client.active_conversation().map(str::to_string) else {
        eprintln!("No conversation open. Use /open <id> first.");
        return Ok(true);
    };

    match client.send(&active, line).await {
        Ok(_) => {}
        Err(SendError::EmptyContent) => {}
        Err(SendError::NotActive(_)) => {
            eprintln!("No conversation open. Use /open <id> first.");
        }
        Err(SendError::DeliveryFailed { source, .. }) => {
            eprintln!("Send failed: {source}");
        }
    }
    Ok(true)
}

async fn list_conversations<A: chat_sync::ChatApi, C: chat_sync::Connector>(
    client: &ChatClient<A, C>,
) -> Result<()> {
    let conversations = match client.conversations().await {
        Ok(c) => c,
        Err(ApiError::Unavailable) => {
            eprintln!("[shopdesk: server unreachable]");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if conversations.is_empty() {
        println!("No conversations.");
        return Ok(());
    }
    println!("{:<38} {:<22} {}", "ID", "STARTED", "MESSAGES");
    println!("{}", "-".repeat(72));
    for convo in &conversations {
        let count = convo
            .message_count
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<38} {:<22} {}",
            convo.id,
            convo.created_at.format("%Y-%m-%d %H:%M"),
            count
        );
    }
    Ok(())
}

fn render_update<A: chat_sync::ChatApi, C: chat_sync::Connector>(
    client: &ChatClient<A, C>,
    update: ClientUpdate,
) {
    match update {
        ClientUpdate::Connection(state) => {
            let label = match state {
                ConnectionState::Disconnected => "offline",
                ConnectionState::Connecting => "connecting",
                ConnectionState::Live => "live",
            };
            eprintln!("[channel: {label}]");
        }
        ClientUpdate::MessagesChanged => {
            if let Some(entry) = client.messages().last() {
                println!("{}", format_entry(entry));
            }
        }
        ClientUpdate::ConversationListStale => {
            eprintln!("[activity in another conversation — /list to refresh]");
        }
        ClientUpdate::ChannelError(message) => {
            eprintln!("[channel error: {message}]");
        }
    }
}

fn format_entry(entry: &ChatEntry) -> String {
    let who = if entry.from_operator { "you" } else { "visitor" };
    let marker = match entry.delivery {
        Delivery::Delivered => "",
        Delivery::Pending => " …",
        Delivery::Failed => " (failed)",
    };
    format!(
        "[{}] {}: {}{}",
        entry.created_at.format("%H:%M"),
        who,
        entry.content,
        marker
    )
}
