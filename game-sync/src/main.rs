mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use game_sync::config::{
    AppConfig, ConfigStore, ConfigUpdateEvent, ConfigWatcher, Credentials, ExclusionKind,
    bootstrap,
};
use game_sync::domain::{detect_game, diagnose};
use game_sync::logging::{filter_directive, init_console_logging, init_logging};
use game_sync::monitor::{GameMonitor, MonitorConfig};
use game_sync::publisher::ChannelPublisher;
use platforms_api::default_client;
use platforms_api::twitch::HelixClient;
use process_utils::{ProcessSource, SystemProcessSource};
use tokio_util::sync::CancellationToken;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use crate::cli::{Args, Commands, ExclusionAction, MappingAction};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Credentials may come from a .env file.
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = args.app_config();
    let directive = filter_directive(args.verbose, args.quiet);

    match args.command {
        Commands::Run { .. } => run(config, directive).await,
        Commands::Scan => {
            init_console_logging(directive)?;
            scan(&config).await
        }
        Commands::Processes => {
            init_console_logging(directive)?;
            processes(&config).await
        }
        Commands::Mapping { action } => {
            init_console_logging(directive)?;
            mapping(&config, action)
        }
        Commands::Exclusions { action } => {
            init_console_logging(directive)?;
            exclusions(&config, action)
        }
        Commands::Init { offline, .. } => {
            init_console_logging(directive)?;
            init(&config, offline).await
        }
    }
}

async fn run(config: AppConfig, directive: &str) -> anyhow::Result<()> {
    let (logging, _guard) = init_logging(&config.log_dir, directive)?;
    let paths = config.paths();
    info!(
        config_dir = %paths.dir.display(),
        log_dir = %logging.log_dir().unwrap_or(&config.log_dir).display(),
        filter = %logging.get_filter(),
        "Starting game-sync"
    );

    let credentials = Credentials::load(&paths.credentials).with_context(|| {
        format!(
            "loading credentials from {} (run `game-sync init` to create a template)",
            paths.credentials.display()
        )
    })?;
    let client = default_client(config.request_timeout)?;
    let helix = HelixClient::new(client, &credentials.to_helix())?
        .with_base_url(&config.helix_base_url)?;

    let store = Arc::new(ConfigStore::open(paths));
    let cancel = CancellationToken::new();
    logging.start_retention_cleanup(cancel.clone());
    logging.apply_persisted_filter(store.snapshot().mapping.log_filter.as_deref());

    // Re-apply the persisted log filter whenever the mapping file reloads.
    let mut config_events = store.subscribe();
    let filter_store = store.clone();
    let filter_cancel = cancel.clone();
    let filter_logging = logging.clone();
    let filter_task = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = filter_cancel.cancelled() => break,
                event = config_events.recv() => match event {
                    Ok(ConfigUpdateEvent::Reloaded { .. }) | Err(RecvError::Lagged(_)) => {
                        let snapshot = filter_store.snapshot();
                        filter_logging.apply_persisted_filter(snapshot.mapping.log_filter.as_deref());
                    }
                    Ok(_) => {}
                    Err(RecvError::Closed) => break,
                },
            }
        }
    });

    let watcher = match ConfigWatcher::spawn(store.clone(), cancel.clone()) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            warn!(error = %e, "Config hot reload disabled");
            None
        }
    };

    let monitor = GameMonitor::new(
        MonitorConfig::from(&config),
        store,
        Arc::new(SystemProcessSource::new()),
        ChannelPublisher::new(Arc::new(helix)),
    );

    let mut current = monitor.current_game();
    let mut monitor_events = monitor.subscribe();
    let presenter_cancel = cancel.clone();
    let presenter = tokio::spawn(async move {
        let mut shown: Option<String> = None;
        loop {
            tokio::select! {
                _ = presenter_cancel.cancelled() => break,
                event = monitor_events.recv() => match event {
                    Ok(event) => debug!("{}", event.description()),
                    Err(RecvError::Lagged(skipped)) => debug!(skipped, "Monitor events lagged"),
                    Err(RecvError::Closed) => break,
                },
                changed = current.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let game = current.borrow_and_update().clone();
                    if game != shown {
                        info!(game = game.as_deref().unwrap_or("-"), "Current game");
                        shown = game;
                    }
                }
            }
        }
    });

    let monitor_task = tokio::spawn(monitor.run(cancel.clone()));

    tokio::signal::ctrl_c()
        .await
        .context("waiting for Ctrl-C")?;
    info!("Shutdown requested");
    cancel.cancel();

    if let Err(e) = monitor_task.await {
        warn!(error = %e, "Game monitor task failed");
    }
    let _ = presenter.await;
    let _ = filter_task.await;
    if let Some(watcher) = watcher {
        watcher.join().await;
    }
    Ok(())
}

async fn take_snapshot() -> anyhow::Result<process_utils::ProcessSnapshot> {
    tokio::task::spawn_blocking(|| SystemProcessSource::new().snapshot())
        .await
        .context("enumerating processes")
}

async fn scan(config: &AppConfig) -> anyhow::Result<()> {
    let store = ConfigStore::open(config.paths());
    let snapshot = store.snapshot();
    let processes = take_snapshot().await?;

    let report = diagnose(&processes, snapshot.games(), &snapshot.exclusions);
    print!("{report}");
    println!(
        "Detected game: {}",
        detect_game(&processes, snapshot.games(), &snapshot.exclusions)
    );
    Ok(())
}

async fn processes(config: &AppConfig) -> anyhow::Result<()> {
    let store = ConfigStore::open(config.paths());
    let snapshot = store.snapshot();
    let processes = take_snapshot().await?;

    for entry in diagnose(&processes, snapshot.games(), &snapshot.exclusions).entries {
        println!("{}", entry.process);
    }
    Ok(())
}

fn mapping(config: &AppConfig, action: MappingAction) -> anyhow::Result<()> {
    let store = ConfigStore::open(config.paths());

    match action {
        MappingAction::List => {
            let snapshot = store.snapshot();
            println!("Title template: '{}'", snapshot.title_template());
            if snapshot.games().is_empty() {
                println!("No games configured.");
            }
            for (game, process) in snapshot.games().iter() {
                println!("{game}: {process} -> {}", snapshot.category_for(game));
            }
        }
        MappingAction::Add {
            game,
            process,
            category,
        } => {
            let snapshot = store.upsert_game(&game, &process, category.as_deref())?;
            println!(
                "Saved {}: {} -> {}",
                game.trim(),
                process.trim(),
                snapshot.category_for(game.trim())
            );
        }
        MappingAction::Remove { game } => {
            if store.remove_game(&game)? {
                println!("Removed {game}");
            } else {
                println!("{game} is not configured");
            }
        }
    }
    Ok(())
}

fn exclusions(config: &AppConfig, action: ExclusionAction) -> anyhow::Result<()> {
    let store = ConfigStore::open(config.paths());

    match action {
        ExclusionAction::List => {
            let snapshot = store.snapshot();
            for kind in [ExclusionKind::Name, ExclusionKind::Prefix] {
                let entries = snapshot.exclusion_record.entries(kind);
                println!("Excluded {kind}s ({}):", entries.len());
                for entry in entries {
                    println!("  {entry}");
                }
            }
        }
        ExclusionAction::Add { value, prefix } => {
            let kind = ExclusionAction::kind(prefix);
            store.add_exclusion(kind, &value)?;
            println!("Excluded {kind} {}", value.trim());
        }
        ExclusionAction::Remove { value, prefix } => {
            let kind = ExclusionAction::kind(prefix);
            if store.remove_exclusion(kind, &value)? {
                println!("Removed excluded {kind} {}", value.trim());
            } else {
                println!("{} is not an excluded {kind}", value.trim());
            }
        }
    }
    Ok(())
}

async fn init(config: &AppConfig, offline: bool) -> anyhow::Result<()> {
    let client = default_client(config.request_timeout)?;
    let url = (!offline).then_some(config.mapping_url.as_str());

    let report = bootstrap(&config.paths(), &client, url).await?;
    if report.created.is_empty() {
        println!("Configuration already present in {}", config.config_dir.display());
    }
    for path in &report.created {
        println!("Created {}", path.display());
    }
    if let Some(reason) = &report.mapping_fallback {
        println!("Default mapping unavailable ({reason}); wrote an empty config.json");
    }
    Ok(())
}
