//! FarmAssist terminal client
//!
//! Reads commands from stdin, drives a local orchestrator, and renders
//! session events to stdout. Logs go to stderr as JSON.

use farm_assist::capture::{ImageFile, MicrophoneAccess};
use farm_assist::composer::{format_elapsed, InputTab};
use farm_assist::runtime::{local_orchestrator, LocalOrchestrator, SessionEvent};
use farm_assist::{AdvisorConfig, Role};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "\
Commands:
  <text>               send a message
  /draft <text>        set the draft without sending
  /image <path>...     attach image files
  /remove <n>          remove the n-th attached image (1-based)
  /record              start a voice note
  /stop                stop the voice note
  /tab text|images|voice
  /send                send whatever is pending
  /quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "farm_assist=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = AdvisorConfig::from_env();
    tracing::info!(
        response_delay_ms = u64::try_from(config.response_delay.as_millis()).unwrap_or(u64::MAX),
        max_image_bytes = config.max_image_bytes,
        "Starting FarmAssist"
    );

    let orchestrator = local_orchestrator(&config, MicrophoneAccess::Granted);
    let renderer = tokio::spawn(render(BroadcastStream::new(orchestrator.subscribe())));

    for turn in orchestrator.conversation().await {
        print_turn(turn.role(), turn.content(), turn.attachments().len());
    }
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if !dispatch(&orchestrator, line.trim()).await {
            break;
        }
    }

    orchestrator.shutdown().await;
    renderer.abort();
    Ok(())
}

/// Handle one input line. Returns `false` to quit.
async fn dispatch(orchestrator: &LocalOrchestrator, line: &str) -> bool {
    let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    match command {
        "" => {}
        "/quit" => return false,
        "/help" => println!("{HELP}"),
        "/draft" => orchestrator.set_text(rest).await,
        "/image" => {
            let files: Vec<ImageFile> = rest.split_whitespace().map(ImageFile::from_path).collect();
            let batch = orchestrator.add_image_files(&files).await;
            println!("[{} image(s) attached, {} failed]", batch.added.len(), batch.failed.len());
        }
        "/remove" => match rest.parse::<usize>() {
            Ok(n) if n > 0 => {
                if orchestrator.remove_image_at(n - 1).await.is_none() {
                    println!("[no image {n}]");
                }
            }
            _ => println!("[usage: /remove <n>]"),
        },
        "/record" => {
            if let Err(e) = orchestrator.start_recording().await {
                println!("[{e}]");
            }
        }
        "/stop" => match orchestrator.stop_recording().await {
            Ok(_) => println!("[voice note ready]"),
            Err(e) => println!("[{e}]"),
        },
        "/tab" => {
            let tab = match rest {
                "text" => InputTab::Text,
                "images" => InputTab::Images,
                "voice" => InputTab::Voice,
                _ => {
                    println!("[usage: /tab text|images|voice]");
                    return true;
                }
            };
            orchestrator.select_tab(tab).await;
        }
        "/send" => send(orchestrator).await,
        _ => {
            orchestrator.set_text(line).await;
            send(orchestrator).await;
        }
    }
    true
}

async fn send(orchestrator: &LocalOrchestrator) {
    if !orchestrator.can_submit().await {
        println!("[nothing to send]");
        return;
    }
    if let Err(e) = orchestrator.submit().await {
        println!("[{e}]");
    }
}

async fn render(mut events: BroadcastStream<SessionEvent>) {
    while let Some(event) = events.next().await {
        match event {
            Ok(SessionEvent::TurnAppended { turn }) => {
                print_turn(turn.role(), turn.content(), turn.attachments().len());
            }
            Ok(SessionEvent::RecordingTick { elapsed_seconds }) => {
                println!("[recording {}]", format_elapsed(elapsed_seconds));
            }
            Ok(SessionEvent::Notice { message }) => println!("[{message}]"),
            Ok(SessionEvent::StateChanged { state }) if state.is_in_flight() => {
                println!("[thinking...]");
            }
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "Renderer fell behind"),
        }
    }
}

fn print_turn(role: Role, content: &str, attachments: usize) {
    let who = match role {
        Role::User => "you",
        Role::Assistant => "FarmAssist",
    };
    if attachments > 0 {
        println!("{who}: {content} ({attachments} image(s))");
    } else {
        println!("{who}: {content}");
    }
}
