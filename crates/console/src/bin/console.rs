use anyhow::{Context, Result, bail};
use backend::BackendClient;
use clap::{Parser, Subcommand};
use console::{ConsoleConfig, Session, render};
use records::{ActiveTab, DocumentFlag};
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "console", about = "Browse and manage the documents of a retrieval backend")]
struct Cli {
    /// Configuration file (default: console.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Collection uuid or name (default: the first collection)
    #[arg(long, short, global = true)]
    collection: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List collections
    Collections,
    /// Documents of a collection, grouped by file
    Documents {
        #[command(flatten)]
        view: ViewArgs,
        /// Show every chunk of one file
        #[arg(long)]
        show: Option<String>,
    },
    /// Chunks of a collection
    Chunks {
        #[command(flatten)]
        view: ViewArgs,
        /// Show the full content and metadata of one chunk
        #[arg(long)]
        show: Option<String>,
    },
    /// Document, chunk and character totals
    Stats {
        #[arg(long, default_value = "documents")]
        tab: ActiveTab,
    },
    /// Delete documents (file ids) or chunks (chunk ids)
    Delete {
        #[arg(long, default_value = "documents")]
        tab: ActiveTab,
        #[arg(required = true)]
        ids: Vec<String>,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Mark a chunk verified
    Verify {
        document_id: String,
        /// Clear the flag instead
        #[arg(long)]
        off: bool,
    },
    /// Mark a chunk vulnerable
    Vulnerable {
        document_id: String,
        #[arg(long)]
        off: bool,
    },
    /// Rename a collection or replace its metadata
    EditCollection {
        #[arg(long)]
        name: Option<String>,
        /// Metadata as a JSON object
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Write chunks to an Excel workbook
    Export {
        #[arg(long, short, default_value = "chunks_export.xlsx")]
        output: PathBuf,
        #[arg(long)]
        source: Vec<String>,
    },
    /// End the backend session
    Logout,
    /// Check the backend is reachable
    Health,
}

#[derive(clap::Args)]
struct ViewArgs {
    /// Only show these sources (repeatable)
    #[arg(long)]
    source: Vec<String>,
    #[arg(long, default_value_t = 1)]
    page: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConsoleConfig::load(cli.config.as_deref())?;
    let client = BackendClient::new(&config.backend).context("Failed to build backend client")?;

    if let Command::Health = cli.command {
        let status = client.health().await.context("Backend health check failed")?;
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    let session = Session::new(client, config.fetch.clone(), config.view.items_per_page);

    if let Command::Logout = cli.command {
        session.sign_out().await.context("Sign-out failed")?;
        println!("Signed out");
        return Ok(());
    }

    open_collection(&session, cli.collection.as_deref()).await?;
    run(&session, cli.command).await
}

/// Loads the collection list and opens the requested collection.
async fn open_collection(session: &Session, key: Option<&str>) -> Result<()> {
    session
        .fetch_collections()
        .await
        .context("Failed to fetch collections")?;

    let target = {
        let state = session.state().await;
        if state.collections.is_empty() {
            bail!("The backend has no collections");
        }
        match key {
            Some(key) => match state.resolve_collection(key) {
                Some(uuid) => Some(uuid),
                None => bail!("No collection named {key}"),
            },
            None => None,
        }
    };

    if let Some(uuid) = target {
        session.select_collection(&uuid).await?;
    }
    Ok(())
}

async fn load_view(session: &Session, tab: ActiveTab, sources: Vec<String>, page: usize) -> Result<()> {
    session
        .fetch_documents()
        .await
        .context("Failed to fetch documents")?;
    session
        .set_active_tab(tab)
        .await
        .context("Failed to load chunks")?;
    if !sources.is_empty() {
        session.set_selected_sources(sources).await;
    }
    session.go_to_page(page).await;
    Ok(())
}

async fn run(session: &Session, command: Command) -> Result<()> {
    match command {
        Command::Collections => {
            let state = session.state().await;
            print!(
                "{}",
                render::collections_table(&state.collections, state.selected_collection.as_deref())
            );
        }

        Command::Documents { view, show } => {
            load_view(session, ActiveTab::Documents, view.source, view.page).await?;
            let state = session.state().await;
            if let Some(file_id) = show {
                let groups = state.filtered_groups();
                let Some(group) = groups.iter().find(|g| g.file_id == file_id) else {
                    bail!("No document with file id {file_id}");
                };
                print!("{}", render::group_detail(group));
                return Ok(());
            }
            println!("{}\n", render::stats_line(&state.stats()));
            print!(
                "{}",
                render::groups_table(&state.current_groups_page(), &state.selected_documents)
            );
            println!("{}", render::page_footer(&state.groups_page));
        }

        Command::Chunks { view, show } => {
            load_view(session, ActiveTab::Chunks, view.source, view.page).await?;
            let state = session.state().await;
            if let Some(id) = show {
                let Some(chunk) = state.chunks.iter().find(|c| c.id == id) else {
                    bail!("No chunk with id {id}");
                };
                print!("{}", render::chunk_detail(chunk));
                return Ok(());
            }
            let verify = state.selected().is_some_and(|c| c.verify_checkbox());
            println!("{}\n", render::stats_line(&state.stats()));
            print!(
                "{}",
                render::chunks_table(
                    &state.current_chunks_page(),
                    &state.selected_chunks,
                    verify,
                    |id| state.is_pending(id)
                )
            );
            println!("{}", render::page_footer(&state.chunks_page));
        }

        Command::Stats { tab } => {
            load_view(session, tab, Vec::new(), 1).await?;
            let state = session.state().await;
            println!("{}", render::stats_line(&state.stats()));
            println!("Sources: {}", state.available_sources().join(", "));
        }

        Command::Delete { tab, ids, yes } => {
            load_view(session, tab, Vec::new(), 1).await?;
            for id in &ids {
                session.toggle_selection(id).await;
            }
            if !yes && !confirm(&format!("Delete {} {tab}?", ids.len()))? {
                println!("Cancelled");
                return Ok(());
            }
            match session.delete_selected().await.context("Delete failed")? {
                Some(count) => println!("Deleted {count} {tab}"),
                None => println!("Nothing to delete"),
            }
        }

        Command::Verify { document_id, off } => {
            set_flag(session, &document_id, DocumentFlag::Verified, !off).await?;
        }

        Command::Vulnerable { document_id, off } => {
            set_flag(session, &document_id, DocumentFlag::Vulnerable, !off).await?;
        }

        Command::EditCollection { name, metadata } => {
            let (uuid, current_name, current_metadata) = {
                let state = session.state().await;
                let Some(collection) = state.selected() else {
                    bail!("No collection selected");
                };
                let metadata = serde_json::to_string(&collection.metadata.clone().unwrap_or_default())?;
                (collection.uuid.clone(), collection.name.clone(), metadata)
            };
            let updated = session
                .update_collection(
                    &uuid,
                    name.as_deref().unwrap_or(&current_name),
                    metadata.as_deref().unwrap_or(&current_metadata),
                )
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message()))
                .context("Failed to update collection")?;
            println!("Updated collection {} ({})", updated.name, uuid);
        }

        Command::Export { output, source } => {
            session
                .fetch_documents()
                .await
                .context("Failed to fetch documents")?;
            if !source.is_empty() {
                session.set_selected_sources(source).await;
            }
            let written = session.export_chunks(&output).await?;
            println!("Exported {written} chunks to {}", output.display());
        }

        Command::Logout | Command::Health => {}
    }
    Ok(())
}

async fn set_flag(session: &Session, document_id: &str, flag: DocumentFlag, value: bool) -> Result<()> {
    session
        .set_flag(document_id, flag, value)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))
        .with_context(|| format!("Failed to update {}", flag.field()))?;
    println!("{document_id}: {} = {value}", flag.field());
    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    std::io::stdout().flush()?;
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
