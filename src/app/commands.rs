//! Command-line interface.
//!
//! Every command prints its result as pretty JSON on stdout.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use super::App;
use crate::config::{ConnectionProfile, ConnectionStore, Settings};
use crate::domain::{
    AddRecords, CollectionId, DatabaseRef, Metadata, NewCollection, Pagination, QueryRequest,
};

/// Browse and search a Chroma-compatible vector store.
#[derive(Debug, Parser)]
#[command(name = "vector-view", version, about)]
pub struct Cli {
    /// Settings file (defaults to the platform config directory).
    #[arg(long, global = true, env = "VECTOR_VIEW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Store base URL, e.g. http://localhost:8000/api/v2.
    #[arg(long, global = true)]
    pub url: Option<String>,

    #[arg(long, global = true)]
    pub tenant: Option<String>,

    #[arg(long, global = true)]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store heartbeat and embedding model state.
    Status,
    /// Identity of the authenticated caller.
    Identity,
    /// Tenants available for browsing.
    Tenants,
    /// Databases of the current tenant.
    Databases,
    /// Collections with record counts.
    Collections(PageArgs),
    /// One collection.
    Collection { id: String },
    /// Number of records in a collection.
    Count { id: String },
    /// A page of documents.
    Documents {
        id: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 20)]
        per_page: usize,
    },
    /// Stored embeddings projected onto two dimensions.
    Vectors {
        id: String,
        #[arg(long, default_value_t = 100)]
        limit: usize,
        /// Metadata filter as a JSON object.
        #[arg(long = "where")]
        where_filter: Option<String>,
    },
    /// Semantic search by text.
    Search {
        id: String,
        text: String,
        #[arg(long)]
        limit: Option<usize>,
        /// Metadata filter as a JSON object.
        #[arg(long = "where")]
        where_filter: Option<String>,
    },
    /// Embed documents locally and add them to a collection.
    Add {
        id: String,
        #[arg(required = true)]
        documents: Vec<String>,
        /// Metadata applied to every document, as a JSON object.
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Create a collection.
    CreateCollection {
        name: String,
        /// Collection metadata as a JSON object.
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Delete a collection.
    DeleteCollection { id: String },
    /// Manage saved connections.
    #[command(subcommand)]
    Connections(ConnectionsCommand),
}

#[derive(Debug, Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 100)]
    pub limit: usize,
    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

#[derive(Debug, Subcommand)]
pub enum ConnectionsCommand {
    /// List saved connections.
    List,
    /// Save a connection.
    Add {
        name: String,
        url: String,
        #[arg(long)]
        description: Option<String>,
        /// Embedding model for this store.
        #[arg(long)]
        model: Option<String>,
    },
    /// Make a connection active.
    Use { id: String },
    /// Stop using the active connection.
    Clear,
    /// Delete a connection.
    Remove { id: String },
}

impl Cli {
    /// Loads settings, applies the active connection, then the environment,
    /// then command-line flags.
    pub fn settings(&self, connections: &ConnectionStore) -> Result<Settings> {
        let mut settings = match self.settings_path() {
            Some(path) => Settings::load(&path)?,
            None => Settings::default(),
        };

        if let Some(profile) = connections.active() {
            tracing::debug!(connection = %profile.name, "Using saved connection");
            settings.api = profile.api_settings(&settings.api);
            if let Some(model) = &profile.embedding_model {
                settings.embedding.model = model.clone();
            }
        }

        settings.apply_env()?;

        if let Some(url) = &self.url {
            settings.api.base_url = url.clone();
        }
        if let Some(tenant) = &self.tenant {
            settings.api.tenant = tenant.clone();
        }
        if let Some(database) = &self.database {
            settings.api.database = database.clone();
        }
        Ok(settings)
    }

    fn settings_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(Settings::default_path)
    }

    fn connections_path(&self) -> Option<PathBuf> {
        match &self.config {
            Some(path) => Some(
                path.parent()
                    .map(|dir| dir.join("connections.json"))
                    .unwrap_or_else(|| PathBuf::from("connections.json")),
            ),
            None => ConnectionStore::default_path(),
        }
    }

    /// Runs the selected command and prints its JSON result.
    pub async fn run(self) -> Result<()> {
        let connections_path = self
            .connections_path()
            .context("No config directory available for saved connections")?;
        let mut connections = ConnectionStore::open(connections_path);

        let output = match &self.command {
            Command::Connections(command) => {
                let settings = self.settings(&connections)?;
                run_connections(&mut connections, command, &settings)?
            }
            command => {
                let app = App::new(self.settings(&connections)?)?;
                execute(&app, command).await?
            }
        };

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

/// Executes a store command against `app`.
pub async fn execute(app: &App, command: &Command) -> Result<Value> {
    let db = app.database();

    match command {
        Command::Status => json(app.status().await),
        Command::Identity => json(app.store().identity().await?),
        Command::Tenants => json(app.catalog().list_tenants()),
        Command::Databases => json(app.store().list_databases(&db.tenant).await?),
        Command::Collections(page) => {
            let page = Pagination {
                offset: page.offset,
                limit: page.limit,
            };
            json(app.catalog().collection_summaries(&db, page).await?)
        }
        Command::Collection { id } => json(app.store().get_collection(&db, &id.into()).await?),
        Command::Count { id } => json(app.store().count(&db, &id.into()).await?),
        Command::Documents { id, page, per_page } => json(
            app.catalog()
                .document_page(&db, &id.into(), *page, *per_page)
                .await?,
        ),
        Command::Vectors {
            id,
            limit,
            where_filter,
        } => {
            let filter = where_filter
                .as_deref()
                .map(|raw| parse_object("--where", raw).map(Value::from))
                .transpose()?;
            json(
                app.catalog()
                    .vector_points(&db, &id.into(), *limit, filter)
                    .await?,
            )
        }
        Command::Search {
            id,
            text,
            limit,
            where_filter,
        } => {
            let mut request = QueryRequest::new(db, id.as_str(), text.as_str())
                .with_limit(limit.unwrap_or(app.settings().search.default_limit));
            if let Some(filter) = where_filter {
                request = request.with_where(parse_object("--where", filter)?.into());
            }

            let outcome = app.search().search_by_text(&request).await?;
            if outcome.is_degraded() {
                eprintln!("warning: semantic search unavailable, results are not ranked");
            }
            json(outcome)
        }
        Command::Add {
            id,
            documents,
            metadata,
        } => add_documents(app, &db, &id.into(), documents, metadata.as_deref()).await,
        Command::CreateCollection { name, metadata } => {
            let mut collection = NewCollection::new(name);
            if let Some(metadata) = metadata {
                collection = collection.with_metadata(parse_object("--metadata", metadata)?);
            }
            json(app.store().create_collection(&db, &collection).await?)
        }
        Command::DeleteCollection { id } => {
            app.store().delete_collection(&db, &id.into()).await?;
            json(serde_json::json!({ "deleted": id }))
        }
        Command::Connections(_) => bail!("connections commands do not use a store"),
    }
}

async fn add_documents(
    app: &App,
    db: &DatabaseRef,
    collection: &CollectionId,
    documents: &[String],
    metadata: Option<&str>,
) -> Result<Value> {
    let metadata = metadata
        .map(|raw| parse_object("--metadata", raw))
        .transpose()?;
    let embeddings = app.embedder().embed_batch(documents).await?;

    let records = AddRecords {
        ids: documents
            .iter()
            .map(|_| uuid::Uuid::new_v4().to_string())
            .collect(),
        embeddings: Some(embeddings.into_iter().map(|e| e.into_inner()).collect()),
        documents: Some(documents.to_vec()),
        metadatas: metadata.map(|m| vec![m; documents.len()]),
    };
    app.store().add_documents(db, collection, &records).await?;

    tracing::info!(collection = %db.describe(collection), added = records.ids.len(), "Added documents");
    json(serde_json::json!({ "added": records.ids }))
}

fn run_connections(
    connections: &mut ConnectionStore,
    command: &ConnectionsCommand,
    settings: &Settings,
) -> Result<Value> {
    match command {
        ConnectionsCommand::List => json(serde_json::json!({
            "connections": connections.list(),
            "status": connections.status(),
        })),
        ConnectionsCommand::Add {
            name,
            url,
            description,
            model,
        } => {
            let mut profile = ConnectionProfile::new(name, url)
                .with_scope(&settings.api.tenant, &settings.api.database);
            profile.description = description.clone();
            profile.embedding_model = model.clone();

            let id = connections.add(profile)?;
            json(connections.get(&id))
        }
        ConnectionsCommand::Use { id } => json(connections.activate(id)?),
        ConnectionsCommand::Clear => {
            connections.deactivate()?;
            json(connections.status())
        }
        ConnectionsCommand::Remove { id } => json(connections.remove(id)?),
    }
}

fn parse_object(flag: &str, raw: &str) -> Result<Metadata> {
    serde_json::from_str(raw).with_context(|| format!("{flag} must be a JSON object"))
}

fn json(value: impl Serialize) -> Result<Value> {
    Ok(serde_json::to_value(value)?)
}
