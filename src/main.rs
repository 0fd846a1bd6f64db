mod api;
mod app;
mod channel;
mod config;
mod conversations;
mod events;
mod feed;
mod models;
mod scenario;
mod session;

use log::{error, info};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use api::ApiClient;
use app::{App, Notice};
use channel::{EventChannel, MessageChannel, PollingChannel};
use config::{ChannelKind, Config};
use conversations::display_identity;
use feed::FeedView;
use session::SessionStore;

#[tokio::main]
async fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let demo = std::env::args().any(|arg| arg == "--demo");
    let config = Config::load();
    let store = SessionStore::new(&config.storage_dir());

    let session = if demo {
        scenario::demo_session()
    } else {
        match store.load().await {
            Ok(session) => session,
            Err(e) => {
                error!("no usable session: {}", e);
                eprintln!("You are not signed in. Sign in first, or run with --demo.");
                std::process::exit(1);
            }
        }
    };

    let api = ApiClient::new(&config.base_url, Some(session.token.clone()));
    let (mut app, mut notices) = App::new(session.clone(), api.clone());

    // idle pair keeps the select! arm alive when no event channel exists
    let (_idle_tx, mut events_rx) = mpsc::unbounded_channel();
    let mut channel: Box<dyn MessageChannel> = if demo {
        app.set_offline(true);
        Box::new(scenario::DemoChannel)
    } else {
        match config.channel {
            ChannelKind::Event => {
                match EventChannel::connect(&config.ws_url, &session.user_id).await {
                    Ok((ch, rx)) => {
                        info!("event channel connected to {}", config.ws_url);
                        events_rx = rx;
                        Box::new(ch)
                    }
                    Err(e) => {
                        error!("event channel unavailable, using polling: {}", e);
                        Box::new(PollingChannel::new(api.clone()))
                    }
                }
            }
            ChannelKind::Polling => Box::new(PollingChannel::new(api.clone())),
        }
    };

    if demo {
        app.seed_matches(scenario::demo_matches());
    } else {
        app.refresh_matches().await;
    }

    print_help();
    print_candidate(&app);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Ok(Some(line)) = line else { break };
                if !handle_command(line.trim(), &mut app, channel.as_mut(), &store, demo).await {
                    break;
                }
            }
            Some(event) = events_rx.recv() => {
                app.apply_event(event);
            }
            Some(notice) = notices.recv() => {
                match notice {
                    Notice::Info(text) => println!("* {text}"),
                    Notice::Warn(text) => println!("! {text}"),
                }
            }
        }
    }
    info!("session ended");
}

async fn handle_command(
    line: &str,
    app: &mut App,
    channel: &mut dyn MessageChannel,
    store: &SessionStore,
    demo: bool,
) -> bool {
    match line {
        "" => {}
        "q" | "quit" => return false,
        "h" | "help" => print_help(),
        "y" => {
            app.accept().await;
            print_candidate(app);
        }
        "n" => {
            app.reject().await;
            print_candidate(app);
        }
        "s" => {
            app.skip();
            print_candidate(app);
        }
        "r" | "refresh" => {
            if demo {
                app.seed_matches(scenario::demo_matches());
            } else {
                app.refresh_matches().await;
            }
            print_candidate(app);
        }
        "ls" => print_conversations(app),
        "me" => match app.my_profile().await {
            Some(profile) => {
                println!("{}", serde_json::to_string_pretty(&profile).unwrap_or_default());
            }
            None => println!("Profile unavailable."),
        },
        "logout" => {
            if let Err(e) = store.clear().await {
                error!("could not clear session: {}", e);
            }
            println!("Signed out.");
            return false;
        }
        _ => {
            if let Some(rest) = line.strip_prefix("open ") {
                open_conversation(rest.trim(), app, channel).await;
            } else if let Some(rest) = line.strip_prefix("edit ") {
                match serde_json::from_str(rest.trim()) {
                    Ok(profile) => {
                        app.update_my_profile(&profile).await;
                    }
                    Err(_) => println!(r#"Usage: edit {{"field": value, ...}}"#),
                }
            } else if app.selected().is_some() {
                app.send_message(channel, line).await;
                print_thread(app);
            } else {
                println!("Unknown command. Type h for help.");
            }
        }
    }
    true
}

async fn open_conversation(arg: &str, app: &mut App, channel: &mut dyn MessageChannel) {
    let Ok(index) = arg.parse::<usize>() else {
        println!("Usage: open <number> (see ls)");
        return;
    };
    let Some(id) = app
        .conversations()
        .get(index.wrapping_sub(1))
        .map(|c| c.id.clone())
    else {
        println!("No conversation {index}.");
        return;
    };
    app.select_conversation(&id, channel).await;
    print_thread(app);
}

fn print_candidate(app: &App) {
    match app.feed_view() {
        FeedView::Candidate { candidate, other } => {
            let identity = display_identity(candidate, &app.session().user_id);
            println!();
            println!(
                "--- {} ({:.0}% compatible) ---",
                identity.name, candidate.score
            );
            if let Some(profile) = other.profile() {
                if let Some(university) = &profile.university {
                    println!("    {university}");
                }
                if !profile.tags.is_empty() {
                    println!("    {}", profile.tags.join(", "));
                }
            }
            println!("    y = accept, n = reject, s = skip");
        }
        FeedView::NoMoreCandidates => {
            println!();
            println!("No more candidates. Type r to refresh.");
        }
    }
}

fn print_conversations(app: &App) {
    let strip = app.pending_strip();
    if !strip.is_empty() {
        println!("New matches:");
        for conversation in &strip {
            println!(
                "  {} ({:.0}%)",
                conversation.identity.name, conversation.compatibility
            );
        }
    }
    if app.conversations().is_empty() {
        println!("No conversations yet.");
        return;
    }
    println!("Conversations:");
    for (index, conversation) in app.conversations().iter().enumerate() {
        println!("  {}. {}", index + 1, conversation.identity.name);
    }
}

fn print_thread(app: &App) {
    let me = &app.session().user_id;
    for message in app.messages() {
        let who = if &message.sender_id == me { "me" } else { "them" };
        println!(
            "[{}] {}: {}",
            message.timestamp.format("%H:%M"),
            who,
            message.content
        );
    }
    if app.messages().is_empty() {
        println!("No messages yet. Start the conversation!");
    }
}

fn print_help() {
    println!("Commands: y/n/s decide, r refresh, ls conversations, open <n>,");
    println!("          me profile, edit <json> update profile, logout, q quit,");
    println!("          free text sends to the open conversation.");
}
