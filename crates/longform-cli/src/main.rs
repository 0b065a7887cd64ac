//! `longform` command line tool

mod cli;

use anyhow::{bail, Context};
use clap::Parser;
use cli::{Cli, Command};
use longform_core::{JsonFileSettingsStore, Longform, LongformConfig};
use longform_model::{FsVault, VaultPath};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

type App = Longform<FsVault, JsonFileSettingsStore>;

/// Logs go to stderr so stdout stays clean for manuscripts
fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "longform=info".into()),
    );
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = LongformConfig::new();
    if let Some(folder) = &cli.scripts {
        config = config.with_user_script_folder(folder.clone());
    }
    let vault = Arc::new(FsVault::new(&cli.vault));
    let store = JsonFileSettingsStore::new(cli.settings_path());
    let app = Longform::load(vault, store, config)
        .await
        .with_context(|| format!("failed to load vault {}", cli.vault.display()))?;

    let result = match cli.command {
        Command::Drafts { json } => drafts(&app, json),
        Command::Workflows => {
            workflows(&app);
            Ok(())
        }
        Command::Validate => validate(&app),
        Command::Compile {
            draft,
            workflow,
            output,
        } => compile(&app, &draft, workflow.as_deref(), output.as_deref()).await,
    };

    app.shutdown().await;
    result
}

fn drafts(app: &App, json: bool) -> anyhow::Result<()> {
    let drafts = app.list_drafts();
    if json {
        let listing: Vec<serde_json::Value> = drafts
            .iter()
            .map(|draft| {
                serde_json::json!({
                    "path": draft.vault_path.to_string(),
                    "title": draft.title,
                    "format": draft.format.to_string(),
                    "workflow": app.workflow_name_for(draft),
                    "scenes": draft.scene_list().iter().map(|s| s.path.to_string()).collect::<Vec<_>>(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    if drafts.is_empty() {
        println!("No drafts found.");
    }
    for draft in &drafts {
        println!("{} ({}, {})", draft.title, draft.vault_path, draft.format);
        for scene in draft.scene_list() {
            println!("  {}{}", "  ".repeat(scene.indent), scene.title);
        }
    }
    Ok(())
}

fn workflows(app: &App) {
    for name in app.list_workflows() {
        let Some(workflow) = app.get_workflow(name) else {
            continue;
        };
        println!("{name}");
        if let Some(description) = &workflow.description {
            println!("  {description}");
        }
        for (position, id) in workflow.step_ids().iter().enumerate() {
            println!("  {}. {id}", position + 1);
        }
    }
}

fn validate(app: &App) -> anyhow::Result<()> {
    let steps = app.registry().snapshot();
    let mut failures = 0;
    for name in app.list_workflows() {
        let Some(workflow) = app.get_workflow(name) else {
            continue;
        };
        let validation = workflow.validate(&steps);
        if validation.is_valid() {
            println!("ok    {name}");
            continue;
        }
        failures += 1;
        println!("error {name}");
        for unresolved in &validation.unresolved {
            println!("  unresolved step '{}' at position {}", unresolved.id, unresolved.position);
        }
        for mismatch in &validation.mismatches {
            println!("  {mismatch}");
        }
        for invalid in &validation.invalid_options {
            println!("  step '{}' at position {}: {}", invalid.id, invalid.position, invalid.source);
        }
    }
    if failures > 0 {
        bail!("{failures} workflow(s) failed validation");
    }
    Ok(())
}

async fn compile(
    app: &App,
    draft: &str,
    workflow: Option<&str>,
    output: Option<&std::path::Path>,
) -> anyhow::Result<()> {
    let index = VaultPath::new(draft).with_context(|| format!("invalid draft path '{draft}'"))?;
    let Some(found) = app.drafts().get(&index).cloned() else {
        bail!("no draft with index note '{index}'");
    };
    let name = workflow.map_or_else(|| app.workflow_name_for(&found), str::to_string);

    let artifact = app
        .run_workflow(&name, &index)
        .await
        .with_context(|| format!("failed to compile '{index}' with '{name}'"))?;
    match output {
        Some(path) => {
            tokio::fs::write(path, &artifact.text)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), steps = artifact.steps_run, "manuscript written");
        }
        None => println!("{}", artifact.text),
    }
    Ok(())
}
