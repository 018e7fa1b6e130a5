use anyhow::{bail, Context, Result};
use clap::Parser;
use podium_chat::{ChatConfig, ChatConfigUpdates, ChatEvent, ChatService, Participant};
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Speaker portal messages in the terminal", long_about = None)]
struct Args {
    /// JSON config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Chance that a sent message gets a reply (0.0 - 1.0)
    #[arg(short = 'p', long)]
    reply_probability: Option<f64>,

    /// Delay before a reply lands, in milliseconds
    #[arg(short = 'd', long)]
    reply_delay_ms: Option<u64>,

    /// Drop pending replies when switching conversations
    #[arg(long)]
    cancel_on_deselect: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .try_init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ChatConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ChatConfig::default(),
    };
    config.apply(ChatConfigUpdates {
        reply_probability: args.reply_probability,
        reply_delay_ms: args.reply_delay_ms,
        cancel_on_deselect: args.cancel_on_deselect.then_some(true),
        ..Default::default()
    });

    let (chat, mut events) = ChatService::new(config)?;
    info!("Signed in as {}", chat.current_user().name);

    println!("Messages - type /help for commands");
    print_conversations(&chat, false);
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            Some(event) = events.recv() => {
                handle_event(&chat, event);
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let input = line.trim();
                if input.is_empty() {
                    prompt();
                    continue;
                }
                if let Some(command) = input.strip_prefix('/') {
                    match handle_command(command, &chat) {
                        Ok(true) => break,
                        Ok(false) => {}
                        Err(e) => eprintln!("✗ {}", e),
                    }
                } else if let Err(e) = chat.send_message(&line) {
                    eprintln!("✗ {}", e);
                }
                prompt();
            }
        }
    }

    Ok(())
}

/// Returns true when the user asked to quit
fn handle_command(command: &str, chat: &ChatService) -> Result<bool> {
    let (name, rest) = command
        .split_once(' ')
        .map(|(n, r)| (n, r.trim()))
        .unwrap_or((command, ""));

    match name {
        "list" => print_conversations(chat, false),
        "recent" => print_conversations(chat, true),
        "open" => {
            if rest.is_empty() {
                bail!("Usage: /open <conversation-id>");
            }
            chat.select_conversation(rest)?;
            print_history(chat, rest)?;
        }
        "history" => match chat.active_conversation_id() {
            Some(id) => print_history(chat, &id)?,
            None => bail!("Select a conversation first"),
        },
        "new" => {
            if rest.is_empty() {
                bail!("Usage: /new <name>");
            }
            let slug = rest.to_lowercase().replace(char::is_whitespace, "-");
            let conversation =
                chat.start_conversation(vec![Participant::new(format!("user-{}", slug), rest)])?;
            println!("Started {}", conversation.id);
        }
        "help" => print_help(),
        "quit" | "exit" => return Ok(true),
        other => bail!("Unknown command: /{}", other),
    }
    Ok(false)
}

fn handle_event(chat: &ChatService, event: ChatEvent) {
    match event {
        ChatEvent::Notification(toast) => {
            println!("\n🔔 {}: {}", toast.title, toast.description);
            prompt();
        }
        ChatEvent::MessageAppended { message } => {
            let me = chat.current_user();
            let shown = chat.active_conversation_id().as_deref()
                == Some(message.conversation_id.as_str());
            if message.sender_id != me.id && shown {
                println!(
                    "\n[{}] {}: {}",
                    message.timestamp.format("%H:%M"),
                    message.sender_name,
                    message.content
                );
            }
        }
        ChatEvent::ConversationSelected { .. } | ChatEvent::UnreadChanged { .. } => {}
    }
}

fn print_conversations(chat: &ChatService, by_recency: bool) {
    let me = chat.current_user();
    let active = chat.active_conversation_id();
    let conversations = if by_recency {
        chat.list_conversations_by_recency()
    } else {
        chat.list_conversations()
    };

    for conversation in conversations {
        let marker = if active.as_deref() == Some(conversation.id.as_str()) {
            '*'
        } else {
            ' '
        };
        let initials = conversation
            .counterpart(&me.id)
            .map(Participant::initials)
            .unwrap_or_default();
        let unread = if conversation.unread_count > 0 {
            format!(" ({})", conversation.unread_count)
        } else {
            String::new()
        };
        println!(
            "{} {:<40} [{}] {}{}",
            marker,
            conversation.id,
            initials,
            conversation.display_name(&me.id),
            unread
        );
        if let Some(last) = &conversation.last_message {
            println!("    {}", last.content);
        }
    }
}

fn print_history(chat: &ChatService, conversation_id: &str) -> Result<()> {
    let me = chat.current_user();
    for message in chat.list_messages(conversation_id)? {
        let who = if message.sender_id == me.id {
            "you"
        } else {
            message.sender_name.as_str()
        };
        println!(
            "[{}] {}: {}",
            message.timestamp.format("%H:%M"),
            who,
            message.content
        );
    }
    Ok(())
}

fn print_help() {
    println!("Commands:");
    println!("  /list            conversations in their original order");
    println!("  /recent          conversations, most recent first");
    println!("  /open <id>       select a conversation and show its history");
    println!("  /history         show the active conversation again");
    println!("  /new <name>      start a conversation with someone new");
    println!("  /quit            leave");
    println!("Anything else is sent to the active conversation.");
}

fn prompt() {
    print!("> ");
    let _ = io::stdout().flush();
}
