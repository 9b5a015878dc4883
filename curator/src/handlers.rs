use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use colored::Colorize;
use curator_client::{HttpStore, Mutation, MutationOutcome, SyncCoordinator};
use curator_core::arena::EntityArena;
use curator_core::edit::validate_field;
use curator_core::entity::{EntityField, WebEntity};
use curator_core::lru::coerce_to_lru;
use curator_core::tags::{self, TagOp};
use curator_tui::EditorMessage;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;

// Pure helpers, kept separate from the I/O handlers so they stay
// testable.

/// Map the CLI field name onto the typed field.
pub fn parse_field(raw: &str) -> Option<EntityField> {
    match raw.to_ascii_lowercase().as_str() {
        "name" => Some(EntityField::Name),
        "homepage" => Some(EntityField::Homepage),
        "status" => Some(EntityField::Status),
        _ => None,
    }
}

/// Plain-text rendering of one entity record.
pub fn format_entity(entity: &WebEntity) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}  {}\n", entity.id, entity.name));
    out.push_str(&format!(
        "  homepage   {}\n",
        entity.homepage.as_deref().unwrap_or("-")
    ));
    out.push_str(&format!("  status     {}\n", entity.status));
    out.push_str(&format!(
        "  modified   {}\n",
        entity.last_modified_date.format("%Y-%m-%d %H:%M:%S")
    ));
    if let Some(crawled) = entity.last_crawl_date {
        out.push_str(&format!(
            "  crawled    {}\n",
            crawled.format("%Y-%m-%d %H:%M:%S")
        ));
    }

    out.push_str("  prefixes\n");
    for prefix in &entity.prefixes {
        out.push_str(&format!("    {}\n", prefix));
    }

    for category in entity.user_categories() {
        out.push_str(&format!(
            "  {}: {}\n",
            category.name,
            category.values.join(", ")
        ));
    }
    for category in entity.technical_categories() {
        out.push_str(&format!(
            "  {} (read-only): {}\n",
            category.name,
            category.values.join(", ")
        ));
    }

    if !entity.children.is_empty() {
        out.push_str(&format!("  sub-entities: {}\n", entity.children.len()));
    }
    out
}

/// Write one entity record as pretty JSON.
pub fn write_entity_json(path: &Path, entity: &WebEntity) -> Result<()> {
    let json = serde_json::to_string_pretty(entity)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    pb
}

fn connect(
    server: &Url,
) -> (
    Arc<SyncCoordinator>,
    tokio::sync::mpsc::UnboundedReceiver<curator_client::SyncEvent>,
) {
    let store = Arc::new(HttpStore::new(server.clone()));
    let arena = Arc::new(Mutex::new(EntityArena::new()));
    SyncCoordinator::new(store, arena)
}

fn report_outcome(outcome: &MutationOutcome) -> Result<()> {
    match outcome {
        MutationOutcome::Accepted { .. } => {
            println!("{} saved", "✓".green().bold());
            Ok(())
        }
        MutationOutcome::Rejected { reason, retryable } => {
            let hint = if *retryable { " (retryable)" } else { "" };
            bail!("rejected by store: {}{}", reason, hint)
        }
    }
}

// ----------------------------------------------------------------------
// Handlers
// ----------------------------------------------------------------------

pub async fn handle_show(args: &ArgMatches) -> Result<()> {
    let server = args.get_one::<Url>("server").unwrap();
    let id = args.get_one::<String>("ID").unwrap();

    let (coordinator, _events) = connect(server);
    let pb = spinner(&format!("Loading {}...", id));
    coordinator.load(id).await?;
    pb.finish_and_clear();

    let arena = coordinator.arena().lock().unwrap();
    let entity = arena
        .get(id)
        .ok_or_else(|| anyhow!("entity {} vanished after load", id))?;

    if let Some(path) = args.get_one::<std::path::PathBuf>("output") {
        write_entity_json(path, entity)?;
        println!("{} wrote {}", "✓".green().bold(), path.display());
    } else if args.get_flag("json") {
        println!("{}", serde_json::to_string_pretty(entity)?);
    } else {
        println!("{}", entity.name.bright_white().bold());
        print!("{}", format_entity(entity));
    }
    Ok(())
}

pub async fn handle_set(args: &ArgMatches) -> Result<()> {
    let server = args.get_one::<Url>("server").unwrap();
    let id = args.get_one::<String>("ID").unwrap();
    let field = parse_field(args.get_one::<String>("field").unwrap())
        .ok_or_else(|| anyhow!("unknown field"))?;
    let value = args.get_one::<String>("value").unwrap();

    let (coordinator, _events) = connect(server);
    let vocabulary = coordinator.load_vocabulary().await;
    coordinator.load(id).await?;

    // Validate locally first: invalid input never reaches the store.
    let normalized = validate_field(field, value, &vocabulary)?;

    let handle = coordinator.submit(Mutation::set_field(id, field, normalized));
    report_outcome(&handle.outcome().await)
}

pub async fn handle_tag(args: &ArgMatches, op: TagOp) -> Result<()> {
    let server = args.get_one::<Url>("server").unwrap();
    let id = args.get_one::<String>("ID").unwrap();
    let category = args.get_one::<String>("category").unwrap();
    let value = args.get_one::<String>("tag").unwrap();

    let (coordinator, _events) = connect(server);
    coordinator.load(id).await?;

    let trimmed = {
        let arena = coordinator.arena().lock().unwrap();
        let entity = arena
            .get(id)
            .ok_or_else(|| anyhow!("entity {} vanished after load", id))?;
        tags::check(entity, category, op, value)?
    };

    let mutation = match op {
        TagOp::Add => Mutation::add_tag(id, category, trimmed),
        TagOp::Remove => Mutation::remove_tag(id, category, trimmed),
    };
    let handle = coordinator.submit(mutation);
    report_outcome(&handle.outcome().await)
}

pub async fn handle_prefix(args: &ArgMatches, add: bool) -> Result<()> {
    let server = args.get_one::<Url>("server").unwrap();
    let id = args.get_one::<String>("ID").unwrap();
    let raw = args.get_one::<String>("prefix").unwrap();

    let lru = coerce_to_lru(raw)?;

    let (coordinator, _events) = connect(server);
    coordinator.load(id).await?;

    if !add {
        let arena = coordinator.arena().lock().unwrap();
        let entity = arena
            .get(id)
            .ok_or_else(|| anyhow!("entity {} vanished after load", id))?;
        if !entity.prefixes.iter().any(|p| p == &lru) {
            bail!("entity {} has no prefix {}", id, lru);
        }
        if entity.prefixes.len() == 1 {
            bail!("a web entity must keep at least one prefix");
        }
    }

    let mutation = if add {
        Mutation::add_prefix(id, lru)
    } else {
        Mutation::remove_prefix(id, lru)
    };
    let handle = coordinator.submit(mutation);
    report_outcome(&handle.outcome().await)
}

pub async fn handle_edit(args: &ArgMatches) -> Result<()> {
    let server = args.get_one::<Url>("server").unwrap();
    let id = args.get_one::<String>("ID").unwrap().clone();

    let (coordinator, sync_events) = connect(server);
    let vocabulary = coordinator.load_vocabulary().await;

    let pb = spinner(&format!("Loading {}...", id));
    coordinator.load(&id).await?;
    pb.finish_and_clear();

    let (intent_tx, mut intent_rx) = curator_tui::create_editor_channel();
    let arena = coordinator.arena().clone();
    let focus = id.clone();
    let editor = std::thread::spawn(move || {
        curator_tui::run_editor(arena, focus, vocabulary, sync_events, intent_tx)
    });

    // Drive the editor's intents until it detaches or hangs up.
    while let Some(message) = intent_rx.recv().await {
        match message {
            EditorMessage::Submit(mutation) => {
                // Outcomes reach the editor as sync events.
                let _ = coordinator.submit(mutation);
            }
            EditorMessage::LoadChildren(ids) => {
                for child in ids {
                    let coordinator = coordinator.clone();
                    tokio::spawn(async move {
                        let _ = coordinator.load(&child).await;
                    });
                }
            }
            EditorMessage::Detach(entity_id) => {
                coordinator.detach(&entity_id);
                break;
            }
        }
    }

    editor
        .join()
        .map_err(|_| anyhow!("editor thread panicked"))?
}
