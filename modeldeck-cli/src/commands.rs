//! Subcommand handlers.

use anyhow::{bail, Context};
use modeldeck_core::{
    panel::{RESPONSE_TOKENS_SLIDER, TEMPERATURE_SLIDER},
    temperature_hint, Database, DbModelStore, DbSetupStore, ModelRecord, ModelRegistry,
    ModelSource, OpenAiClient, PartialSourceSetup, ServerConfig, SetupPanel, Vendor,
};

use crate::{Cli, Command, ModelsCommand, SetupCommand, SourcesCommand};

/// Open the database and dispatch the subcommand.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let db = match cli.db {
        Some(path) => Database::open_at(path)?,
        None => Database::open()?,
    };
    db.migrate()?;
    tracing::debug!(path = %db.path().display(), "Database ready");

    match cli.command {
        Command::Sources(cmd) => sources(&db, cmd),
        Command::Setup(cmd) => setup(&db, cmd),
        Command::Models(cmd) => models(&db, cmd).await,
    }
}

fn sources(db: &Database, cmd: SourcesCommand) -> anyhow::Result<()> {
    match cmd {
        SourcesCommand::Add { vendor } => {
            if vendor != Vendor::OpenAi.to_string() {
                bail!("Unsupported vendor: {vendor}");
            }
            let existing = db.list_sources()?;
            let source = ModelSource::new_for_vendor(Vendor::parse_lossy(&vendor), &existing);
            db.save_source(&source)?;
            tracing::info!(source_id = %source.id, "Added source");
            println!("{}\t{}", source.id, source.label);
        }
        SourcesCommand::List => {
            for source in db.list_sources()? {
                println!("{}\t{}\t{}", source.id, source.vendor, source.label);
            }
        }
    }
    Ok(())
}

fn find_source(db: &Database, id: &str) -> anyhow::Result<ModelSource> {
    db.get_source(id)?
        .with_context(|| format!("Unknown source '{id}', add one with `modeldeck sources add`"))
}

fn setup(db: &Database, cmd: SetupCommand) -> anyhow::Result<()> {
    let server = ServerConfig::from_env();
    let store = DbSetupStore::new(db);

    match cmd {
        SetupCommand::Show { source } => {
            let source = find_source(db, &source)?;
            let panel = SetupPanel::new(&source, &store, &server);
            let setup = panel.setup()?;
            let key = panel.key_status()?;

            println!("source:       {} ({})", source.id, source.label);
            println!(
                "api key:      {}{}",
                mask_key(&setup.api_key),
                if key.error { "  [invalid]" } else { "" }
            );
            if server.has_server_key() {
                println!("              server key available");
            }
            println!("api host:     {}", or_default(&setup.api_host));
            println!("organization: {}", or_default(&setup.organization_id));
            println!("proxy key:    {}", mask_key(&setup.proxy_key));
            println!(
                "temperature:  {:.1} ({})  range {}-{}",
                setup.temperature,
                temperature_hint(setup.temperature),
                TEMPERATURE_SLIDER.min,
                TEMPERATURE_SLIDER.max
            );
            println!(
                "max tokens:   {}  range {}-{}",
                setup.max_response_tokens, RESPONSE_TOKENS_SLIDER.min, RESPONSE_TOKENS_SLIDER.max
            );
            println!("can fetch:    {}", panel.fetch_enabled(false)?);
            for hint in panel.key_hints()? {
                for (text, url) in hint.links() {
                    println!("see:          {text} {url}");
                }
            }
        }
        SetupCommand::Set {
            source,
            api_key,
            api_host,
            organization_id,
            proxy_key,
            temperature,
            max_response_tokens,
        } => {
            let source = find_source(db, &source)?;
            let update = PartialSourceSetup {
                api_key,
                api_host,
                organization_id,
                proxy_key,
                temperature,
                max_response_tokens,
            };
            if update.is_empty() {
                bail!("Nothing to set, pass at least one field");
            }
            SetupPanel::new(&source, &store, &server).update(update)?;
            println!("Updated {}", source.id);
        }
    }
    Ok(())
}

async fn models(db: &Database, cmd: ModelsCommand) -> anyhow::Result<()> {
    match cmd {
        ModelsCommand::Fetch { source } => {
            let source = find_source(db, &source)?;
            let server = ServerConfig::from_env();
            let store = DbSetupStore::new(db);
            let panel = SetupPanel::new(&source, &store, &server);

            let client = OpenAiClient::new(server.clone());
            let mut models = DbModelStore::open(db)?;
            let added = panel.refresh_models(&client, &mut models).await?;

            println!("Fetched {added} models for {}", source.id);
            print_models(models.registry().for_source(&source.id));
        }
        ModelsCommand::List { source } => {
            let registry = ModelRegistry::load_from_db(db)?;
            let records: Vec<&ModelRecord> = match source {
                Some(id) => registry.for_source(&id),
                None => {
                    let mut all: Vec<&ModelRecord> = registry.all().collect();
                    all.sort_by(|a, b| a.id.cmp(&b.id));
                    all
                }
            };
            print_models(records);
        }
    }
    Ok(())
}

fn print_models(records: Vec<&ModelRecord>) {
    for record in records {
        let created = record
            .created_at()
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<32} {:<20} {:>6}  {}  {}",
            record.id, record.label, record.context_tokens, created, record.description
        );
    }
}

fn or_default(value: &str) -> &str {
    if value.is_empty() {
        "(default)"
    } else {
        value
    }
}

/// Show only the first and last few characters of a secret.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    match chars.len() {
        0 => "(not set)".to_string(),
        n if n <= 10 => "*".repeat(n),
        n => format!(
            "{}...{}",
            chars[..5].iter().collect::<String>(),
            chars[n - 4..].iter().collect::<String>()
        ),
    }
}
