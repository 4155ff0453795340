//! portalcache - command-line access to conference portal data.
//!
//! Every read is served from the local cache when possible; `--refresh`
//! forces a trip to the portal. Works offline once data has been fetched.

use std::io;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use portalcache_core::cache::FileStore;
use portalcache_core::models::{EventConfig, Schedule, Session};
use portalcache_core::{Config, Outcome, PortalFacade, Update};

const USAGE: &str = "\
Usage: portalcache <command> [args] [--refresh] [--json]

Commands:
  events                          List events
  config <event>                  Show an event's configuration
  schedule <event>                Show an event's schedule
  watch-schedule <event>          Show the cached schedule, then the fresh one
  speaker <event> <id>            Look up a cached speaker
  session <event> <id>            Look up a cached session
  room <event> <id>               Look up a cached room
  tag <event> <id>                Look up a cached tag
  session-type <event> <id>       Look up a cached session type
  prefetch [event...]             Cache config and schedule for offline use
                                  (all listed events when none are given)
  clear-cache                     Delete all cached data

Options:
  --refresh   Ignore the cache and fetch from the portal
  --json      Print JSON instead of text

Environment:
  PORTALCACHE_BASE_URL, PORTALCACHE_LANG, RUST_LOG";

#[derive(Debug, Clone, PartialEq, Eq)]
enum LookupKind {
    Speaker,
    Session,
    Room,
    Tag,
    SessionType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Events,
    Config { event_id: String },
    Schedule { event_id: String },
    WatchSchedule { event_id: String },
    Lookup { kind: LookupKind, event_id: String, id: String },
    Prefetch { event_ids: Vec<String> },
    ClearCache,
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Cli {
    command: Command,
    refresh: bool,
    json: bool,
}

fn parse_args(args: &[String]) -> Result<Cli> {
    let mut refresh = false;
    let mut json = false;
    let mut positional = Vec::new();

    for arg in args {
        match arg.as_str() {
            "--refresh" | "-r" => refresh = true,
            "--json" => json = true,
            "--help" | "-h" => positional.insert(0, "help"),
            flag if flag.starts_with('-') => bail!("Unknown option: {}", flag),
            value => positional.push(value),
        }
    }

    let event = |index: usize| -> Result<String> {
        positional
            .get(index)
            .map(|s| s.to_string())
            .with_context(|| format!("Missing argument {}\n\n{}", index, USAGE))
    };

    let command = match positional.first().copied() {
        None | Some("help") => Command::Help,
        Some("events") => Command::Events,
        Some("config") => Command::Config { event_id: event(1)? },
        Some("schedule") => Command::Schedule { event_id: event(1)? },
        Some("watch-schedule") => Command::WatchSchedule { event_id: event(1)? },
        Some("prefetch") => Command::Prefetch {
            event_ids: positional[1..].iter().map(|s| s.to_string()).collect(),
        },
        Some("clear-cache") => Command::ClearCache,
        Some(name) => {
            let kind = match name {
                "speaker" => LookupKind::Speaker,
                "session" => LookupKind::Session,
                "room" => LookupKind::Room,
                "tag" => LookupKind::Tag,
                "session-type" => LookupKind::SessionType,
                other => bail!("Unknown command: {}\n\n{}", other, USAGE),
            };
            Command::Lookup {
                kind,
                event_id: event(1)?,
                id: event(2)?,
            }
        }
    };

    Ok(Cli {
        command,
        refresh,
        json,
    })
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_args(&args)?;
    if cli.command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    let mut config = Config::load()
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load config, using defaults");
            Config::default()
        })
        .with_env_overrides();
    info!(base_url = %config.portal_base_url, "portalcache starting");

    if cli.command == Command::ClearCache {
        let store = FileStore::new(config.cache_dir()?)?;
        let removed = store.clear().await?;
        println!("Removed {} cached document(s) from {}", removed, store.cache_dir().display());
        return Ok(());
    }

    let portal = PortalFacade::open(&config)?;
    run(&portal, &cli).await?;

    if let Some(event_id) = event_of(&cli.command) {
        if config.last_event_id.as_deref() != Some(event_id) {
            config.last_event_id = Some(event_id.to_string());
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
        }
    }
    Ok(())
}

fn event_of(command: &Command) -> Option<&str> {
    match command {
        Command::Config { event_id }
        | Command::Schedule { event_id }
        | Command::WatchSchedule { event_id }
        | Command::Lookup { event_id, .. } => Some(event_id),
        _ => None,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(portal: &PortalFacade, cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Events => {
            let events = portal.get_events(cli.refresh).await?;
            if cli.json {
                return print_json(&events);
            }
            for event in &events {
                println!("{:<24} {}", event.id, portal.display(&event.name));
            }
            print_age(portal, None).await;
        }
        Command::Config { event_id } => {
            let config = portal.get_event_config(event_id, cli.refresh).await?;
            if cli.json {
                return print_json(&config);
            }
            print_config(portal, &config);
            print_age(portal, Some(event_id)).await;
        }
        Command::Schedule { event_id } => {
            let Some(schedule) = portal.get_schedule(event_id, cli.refresh).await? else {
                println!("{} has no schedule", event_id);
                return Ok(());
            };
            if cli.json {
                return print_json(&schedule);
            }
            print_schedule(portal, &schedule);
            print_age(portal, Some(event_id)).await;
        }
        Command::WatchSchedule { event_id } => watch_schedule(portal, event_id, cli.json).await?,
        Command::Lookup { kind, event_id, id } => lookup(portal, kind, event_id, id, cli.json).await?,
        Command::Prefetch { event_ids } => prefetch(portal, event_ids, cli.refresh).await?,
        Command::ClearCache | Command::Help => {}
    }
    Ok(())
}

async fn watch_schedule(portal: &PortalFacade, event_id: &str, json: bool) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(2);

    let watch = async move {
        let result = portal.watch_schedule(event_id, &tx).await;
        drop(tx);
        result
    };
    let printer = async {
        while let Some(update) = rx.recv().await {
            let label = match &update {
                Update::Provisional(_) => "cached",
                Update::Final(_) => "fresh",
            };
            if json {
                let _ = print_json(update.value());
            } else {
                println!("== {} ==", label);
                print_schedule(portal, update.value());
            }
        }
    };

    let (result, ()) = tokio::join!(watch, printer);
    match result? {
        None => println!("{} has no schedule", event_id),
        Some(Outcome::Stale { error, .. }) => eprintln!("Showing cached schedule: {}", error),
        Some(Outcome::Fresh(_)) | Some(Outcome::Cancelled) => {}
    }
    Ok(())
}

async fn prefetch(portal: &PortalFacade, event_ids: &[String], refresh: bool) -> Result<()> {
    let event_ids = if event_ids.is_empty() {
        portal
            .get_events(refresh)
            .await?
            .into_iter()
            .map(|event| event.id)
            .collect()
    } else {
        event_ids.to_vec()
    };

    let mut failed = 0;
    for (event_id, result) in portal.prefetch(&event_ids).await {
        match result {
            Ok(()) => println!("{:<24} cached", event_id),
            Err(e) => {
                failed += 1;
                println!("{:<24} failed: {}", event_id, e);
            }
        }
    }
    if failed > 0 {
        bail!("{} of {} events could not be cached", failed, event_ids.len());
    }
    Ok(())
}

async fn lookup(portal: &PortalFacade, kind: &LookupKind, event_id: &str, id: &str, json: bool) -> Result<()> {
    let found = match kind {
        LookupKind::Speaker => portal.get_speaker(event_id, id).await.map(|speaker| {
            let text = format!(
                "{}\n{}\n{}",
                portal.display(&speaker.name),
                speaker.avatar_url,
                portal.display(&speaker.bio)
            );
            (serde_json::to_value(&speaker), text)
        }),
        LookupKind::Session => portal.get_session(event_id, id).await.map(|session| {
            let text = session_line(portal, &session);
            (serde_json::to_value(&session), text)
        }),
        LookupKind::Room => portal
            .get_room(event_id, id)
            .await
            .map(|room| (serde_json::to_value(&room), portal.display(&room.name).to_string())),
        LookupKind::Tag => portal
            .get_tag(event_id, id)
            .await
            .map(|tag| (serde_json::to_value(&tag), portal.display(&tag.name).to_string())),
        LookupKind::SessionType => portal
            .get_session_type(event_id, id)
            .await
            .map(|t| (serde_json::to_value(&t), portal.display(&t.name).to_string())),
    };

    match found {
        Some((value, text)) => {
            if json {
                print_json(&value?)?;
            } else {
                println!("{}", text);
            }
        }
        None => println!("Not cached: {:?} {} in {} (load the schedule first)", kind, id, event_id),
    }
    Ok(())
}

fn print_config(portal: &PortalFacade, config: &EventConfig) {
    println!("{} ({})", portal.display(&config.name), config.id);
    if let Some(range) = config.date_range {
        println!("Dates:   {} - {}", range.start, range.end);
    }
    if let Some(website) = &config.website {
        println!("Website: {}", website);
    }
    for feature in &config.features {
        let label = portal.display(&feature.label);
        match feature.url.as_deref() {
            Some(url) => println!("  [{}] {} {}", feature.kind, label, url),
            None => println!("  [{}] {}", feature.kind, label),
        }
        for network in feature.kind.wifi_networks() {
            println!("      SSID {} / {}", network.ssid, network.password);
        }
    }
}

fn session_line(portal: &PortalFacade, session: &Session) -> String {
    let room = session
        .room
        .as_ref()
        .map(|room| portal.display(&room.name))
        .unwrap_or(session.room_id.as_str());
    format!(
        "{}-{}  {:<16} {}",
        session.start.format("%m/%d %H:%M"),
        session.end.format("%H:%M"),
        room,
        portal.display(&session.title)
    )
}

fn print_schedule(portal: &PortalFacade, schedule: &Schedule) {
    for session in &schedule.sessions {
        println!("{}", session_line(portal, session));
        let speakers: Vec<&str> = session
            .speaker_ids
            .iter()
            .filter_map(|id| schedule.speakers.get(id))
            .map(|speaker| portal.display(&speaker.name))
            .collect();
        if !speakers.is_empty() {
            println!("{:>29}{}", "", speakers.join(", "));
        }
    }
}

async fn print_age(portal: &PortalFacade, event_id: Option<&str>) {
    if let Some(age) = portal.cache_age(event_id).await {
        eprintln!("(cached {})", age);
    }
}
