// Line-oriented terminal driver for the chat widget.
// Commands start with '/'; any other line is sent as a question.

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use profile_chat::client::HttpReplySource;
use profile_chat::conversation::{self, Conversation, Message, Role};
use profile_chat::ProfileDocument;

#[derive(Debug, PartialEq)]
enum Command<'a> {
    Open,
    Close,
    Size,
    Clear,
    Suggest(Option<usize>),
    Help,
    Quit,
    Send(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    let trimmed = line.trim();
    let mut words = trimmed.split_whitespace();
    match words.next() {
        Some("/open") => Command::Open,
        Some("/close") => Command::Close,
        Some("/size") => Command::Size,
        Some("/clear") => Command::Clear,
        Some("/suggest") => Command::Suggest(words.next().and_then(|n| n.parse().ok())),
        Some("/help") => Command::Help,
        Some("/quit") | Some("/exit") => Command::Quit,
        _ => Command::Send(trimmed),
    }
}

fn render(subject: &str, message: &Message) -> String {
    let speaker = match message.role {
        Role::User => "you".to_string(),
        Role::Assistant => format!("{} AI", subject),
    };
    format!("[{}] {}", speaker, message.text)
}

async fn fetch_subject(server: &str) -> Result<String> {
    let url = format!("{}/api/profile", server.trim_end_matches('/'));
    let profile: ProfileDocument = reqwest::get(&url)
        .await
        .with_context(|| format!("Failed to reach chat server at {}", url))?
        .error_for_status()
        .context("Chat server refused the profile request")?
        .json()
        .await
        .context("Failed to decode profile from chat server")?;
    profile
        .name
        .filter(|name| !name.trim().is_empty())
        .context("Chat server returned a profile without a name")
}

pub async fn run_terminal_chat(server: &str) -> Result<()> {
    let subject = fetch_subject(server).await?;
    info!(%subject, %server, "Starting terminal chat");

    let source = HttpReplySource::new(server);
    let chat = Conversation::new(&subject);
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut shown = 0;

    let help = "Commands: /open /close /size /clear /suggest [N] /help /quit";
    stdout.write_all(format!("{}\n", help).as_bytes()).await?;

    loop {
        let state = chat.snapshot();
        if state.is_open {
            // A clear shrinks history; re-render from the top.
            if shown > state.messages.len() {
                shown = 0;
            }
            for message in &state.messages[shown..] {
                stdout.write_all(format!("{}\n", render(&subject, message)).as_bytes()).await?;
            }
            shown = state.messages.len();
            stdout.write_all(format!("({:?}) > ", state.display_mode).as_bytes()).await?;
        } else {
            stdout.write_all(b"(closed) > ").await?;
        }
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("Failed to read from stdin")? else {
            break;
        };

        match parse_command(&line) {
            Command::Open => {
                chat.open();
                shown = 0;
            }
            Command::Close => chat.close(),
            Command::Size => {
                chat.toggle_size();
            }
            Command::Clear => {
                if chat.clear() {
                    shown = 0;
                }
            }
            Command::Suggest(None) => {
                for (i, suggestion) in conversation::suggestions(&subject).iter().enumerate() {
                    stdout.write_all(format!("  {}: {}\n", i, suggestion).as_bytes()).await?;
                }
            }
            Command::Suggest(Some(index)) => {
                chat.send_suggestion(&source, index).await;
            }
            Command::Help => stdout.write_all(format!("{}\n", help).as_bytes()).await?,
            Command::Quit => break,
            Command::Send(text) => {
                chat.set_draft(text);
                if chat.snapshot().is_open && !text.is_empty() {
                    stdout.write_all(b"Typing...\n").await?;
                    stdout.flush().await?;
                }
                chat.send_draft(&source).await;
            }
        }
    }

    info!("Terminal chat finished.");
    Ok(())
}
