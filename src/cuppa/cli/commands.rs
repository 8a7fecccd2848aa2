//! # CLI Layer
//!
//! This module is **one possible UI client** for cuppa. It is the only place
//! that reads the process environment, touches stdout/stderr, or decides the
//! exit code.
//!
//! ## Structure
//!
//! - `run()`: main dispatch logic (called by `main.rs`)
//! - `init_context()`: resolves data dir and config, then builds the store and API
//! - `handle_*()`: per-command handlers that call the API and print results

use super::render::{
    print_messages, render_config, render_expense_details, render_expense_table, render_summary,
};
use super::setup::{Cli, Commands};
use chrono::Local;
use clap::Parser;
use cuppa::api::{ConfigAction, CuppaApi, CuppaPaths, ExportTarget, ListOptions};
use cuppa::config::{BackendKind, CuppaConfig};
use cuppa::error::{CuppaError, Result};
use cuppa::logging;
use cuppa::model::ExpenseDraft;
use cuppa::store::fs::CsvFileStore;
use cuppa::store::github::GitHubContentApi;
use cuppa::store::remote::RemoteSnapshotStore;
use cuppa::store::ExpenseStore;
use directories::ProjectDirs;
use std::env;
use std::path::PathBuf;
use tracing::{debug, warn};

struct AppContext {
    api: CuppaApi<Box<dyn ExpenseStore>>,
    config: CuppaConfig,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Warning: {}", e);
    }

    let paths = CuppaPaths::new(resolve_data_dir(&cli)?);

    // Config edits never need a store, so they work before a backend is usable.
    if let Some(Commands::Config { key, value }) = &cli.command {
        return handle_config(&paths, key.clone(), value.clone());
    }

    let mut ctx = init_context(&cli, paths)?;

    match cli.command {
        Some(Commands::List { search, sort }) => handle_list(&ctx, search, sort.into()),
        Some(Commands::Add {
            kind,
            location,
            price,
            date,
            notes,
        }) => {
            let date = date.unwrap_or_else(today_iso);
            let draft = ExpenseDraft::new(kind, location, price, date)
                .with_notes(notes.unwrap_or_default());
            handle_add(&mut ctx, draft)
        }
        Some(Commands::Edit {
            id,
            kind,
            location,
            price,
            date,
            notes,
        }) => handle_edit(
            &mut ctx,
            &id,
            FieldEdits {
                kind,
                location,
                price,
                date,
                notes,
            },
        ),
        Some(Commands::View { id }) => handle_view(&ctx, &id),
        Some(Commands::Delete { ids }) => handle_delete(&mut ctx, &ids),
        Some(Commands::Import { paths }) => handle_import(&mut ctx, &paths),
        Some(Commands::Export { out, stdout }) => handle_export(&ctx, out, stdout),
        Some(Commands::Summary) => handle_summary(&ctx),
        Some(Commands::Init) => handle_init(&ctx),
        Some(Commands::Config { .. }) => Ok(()),
        None => handle_list(&ctx, None, Default::default()),
    }
}

/// `--data-dir`, else `CUPPA_DATA_DIR`, else the platform data directory.
fn resolve_data_dir(cli: &Cli) -> Result<PathBuf> {
    if let Some(dir) = &cli.data_dir {
        return Ok(dir.clone());
    }
    if let Some(dir) = env::var_os("CUPPA_DATA_DIR").filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    ProjectDirs::from("com", "cuppa", "cuppa")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| CuppaError::Config("Could not determine data directory".to_string()))
}

fn init_context(cli: &Cli, paths: CuppaPaths) -> Result<AppContext> {
    let mut config = CuppaConfig::load(&paths.data_dir)?;
    config.apply_env(|key| env::var(key).ok())?;
    if let Some(backend) = cli.backend {
        config.backend = backend.into();
    }

    let store: Box<dyn ExpenseStore> = match config.backend {
        BackendKind::Csv => Box::new(
            CsvFileStore::new(config.csv_path(&paths.data_dir)).with_dialect(config.csv_dialect),
        ),
        BackendKind::Github => {
            let remote = config.remote_config(env::var("GITHUB_TOKEN").ok())?;
            let client = GitHubContentApi::new(&remote)?;
            if !client.is_authenticated() {
                warn!("GITHUB_TOKEN is not set, remote requests are unauthenticated");
            }
            Box::new(RemoteSnapshotStore::new(client, remote.path))
        }
    };
    debug!(backend = %config.backend, location = %store.location(), "store ready");

    let api = CuppaApi::new(store, paths).with_dialect(config.csv_dialect);
    Ok(AppContext { api, config })
}

fn today_iso() -> String {
    Local::now().date_naive().format("%Y-%m-%d").to_string()
}

/// Wraps a write failure in the message the user sees.
fn failed_to(action: &'static str) -> impl FnOnce(CuppaError) -> CuppaError {
    move |e| CuppaError::Api(format!("Failed to {}: {}", action, e))
}

fn handle_list(ctx: &AppContext, search: Option<String>, sort: cuppa::api::SortOrder) -> Result<()> {
    let result = ctx.api.list_expenses(&ListOptions { search, sort })?;
    if !result.load_failed {
        print!(
            "{}",
            render_expense_table(
                &result.listed_expenses,
                result.summary.as_ref(),
                &ctx.config.currency
            )
        );
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_add(ctx: &mut AppContext, draft: ExpenseDraft) -> Result<()> {
    let result = ctx
        .api
        .create_expense(draft)
        .map_err(failed_to("save expense"))?;
    print_messages(&result.messages);
    for expense in &result.affected_expenses {
        println!("{}", expense.id);
    }
    Ok(())
}

struct FieldEdits {
    kind: Option<String>,
    location: Option<String>,
    price: Option<String>,
    date: Option<String>,
    notes: Option<String>,
}

fn handle_edit(ctx: &mut AppContext, id: &str, edits: FieldEdits) -> Result<()> {
    let current = ctx.api.view_expense(id)?;
    let Some(expense) = current.listed_expenses.first() else {
        return Err(CuppaError::NotFound(id.to_string()));
    };

    let mut draft = expense.draft();
    if let Some(kind) = edits.kind {
        draft.kind = kind;
    }
    if let Some(location) = edits.location {
        draft.location = location;
    }
    if let Some(price) = edits.price {
        draft.price = price;
    }
    if let Some(date) = edits.date {
        draft.date = date;
    }
    if let Some(notes) = edits.notes {
        draft.notes = notes;
    }

    let result = ctx
        .api
        .update_expense(&expense.id, draft)
        .map_err(failed_to("save expense"))?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_view(ctx: &AppContext, id: &str) -> Result<()> {
    let result = ctx.api.view_expense(id)?;
    print!(
        "{}",
        render_expense_details(&result.listed_expenses, &ctx.config.currency)
    );
    print_messages(&result.messages);
    Ok(())
}

fn handle_delete(ctx: &mut AppContext, ids: &[String]) -> Result<()> {
    let mut targets = Vec::with_capacity(ids.len());
    for needle in ids {
        targets.push(ctx.api.resolve_id(needle)?.unwrap_or_else(|| needle.clone()));
    }

    let result = ctx
        .api
        .delete_expenses(&targets)
        .map_err(failed_to("delete expense"))?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_import(ctx: &mut AppContext, paths: &[PathBuf]) -> Result<()> {
    let result = ctx
        .api
        .import_csv(paths)
        .map_err(failed_to("import expenses"))?;
    print_messages(&result.messages);
    Ok(())
}

fn handle_export(ctx: &AppContext, out: Option<PathBuf>, stdout: bool) -> Result<()> {
    let target = match (out, stdout) {
        (_, true) => ExportTarget::Stdout,
        (Some(path), false) if path.is_dir() => ExportTarget::Directory(path),
        (Some(path), false) => ExportTarget::File(path),
        (None, false) => ExportTarget::Directory(env::current_dir()?),
    };

    let result = ctx.api.export_csv(target, Local::now().date_naive())?;
    match &result.csv {
        Some(csv) => print!("{}", csv),
        None => print_messages(&result.messages),
    }
    Ok(())
}

fn handle_summary(ctx: &AppContext) -> Result<()> {
    let result = ctx.api.summary()?;
    if let Some(summary) = &result.summary {
        print!("{}", render_summary(summary, &ctx.config.currency));
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_config(paths: &CuppaPaths, key: Option<String>, value: Option<String>) -> Result<()> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(key), None) => ConfigAction::ShowKey(key),
        (Some(key), Some(value)) => ConfigAction::Set(key, value),
    };

    let result = cuppa::commands::config::run(paths, action)?;
    if result.has_errors() {
        let detail: Vec<_> = result.messages.iter().map(|m| m.content.as_str()).collect();
        return Err(CuppaError::Config(detail.join("; ")));
    }
    if result.messages.is_empty() {
        if let Some(config) = &result.config {
            print!("{}", render_config(config));
        }
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_init(ctx: &AppContext) -> Result<()> {
    let result = ctx.api.init()?;
    print_messages(&result.messages);
    Ok(())
}
