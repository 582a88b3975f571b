use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use indexmap::IndexMap;
use log::info;

use routedoc_core::config::{self, CONFIG_FILE_NAME, RoutedocConfig};
use routedoc_core::route_table::FileRoutes;
use routedoc_core::{
    Aggregator, Document, GeneratedFile, HandlerRegistry, RouteCache, RouteTable,
};
use routedoc_stubs::{StubOutcome, StubWriter};

#[derive(Parser)]
#[command(
    name = "routedoc",
    about = "Aggregate handler metadata into OpenAPI documents",
    version
)]
struct Cli {
    /// Path to the config file
    #[arg(short, long, global = true, default_value = CONFIG_FILE_NAME)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the configured documents and write them as JSON
    Generate {
        /// Build only this API
        #[arg(long)]
        api: Option<String>,

        /// Route dump to use instead of the configured one
        #[arg(long)]
        routes: Option<PathBuf>,

        /// Handler manifest to use instead of the configured one
        #[arg(long)]
        handlers: Option<PathBuf>,

        /// Output directory to use instead of the configured one
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Build and report without writing files
        #[arg(long)]
        no_files: bool,
    },

    /// Parse a route dump and print the normalized table
    Routes {
        /// Path to the route dump
        #[arg(short, long)]
        input: PathBuf,

        /// Only show one handler group
        #[arg(long)]
        group: Option<String>,

        /// Output format
        #[arg(long, default_value = "yaml")]
        format: OutputFormat,
    },

    /// Write a response template stub for `group#action`
    Stub {
        /// Handler action, e.g. `api/v1/examples#show`
        action_path: String,

        /// Key of the template in the `stubs.templates` config
        template: String,
    },

    /// Initialize a new routedoc configuration
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Yaml,
    Json,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Generate {
            api,
            routes,
            handlers,
            output,
            no_files,
        } => cmd_generate(&cli.config, api, routes, handlers, output, no_files),

        Commands::Routes {
            input,
            group,
            format,
        } => cmd_routes(input, group, format),

        Commands::Stub {
            action_path,
            template,
        } => cmd_stub(&cli.config, &action_path, &template),

        Commands::Init { force } => cmd_init(&cli.config, force),

        Commands::Completions { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::generate(shell, &mut cmd, "routedoc", &mut std::io::stdout());
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<RoutedocConfig> {
    Ok(config::load_config(path)?.unwrap_or_default())
}

/// Write generated files to disk under the given base directory.
fn write_files(base: &Path, files: &[GeneratedFile]) -> Result<()> {
    for file in files {
        let path = base.join(&file.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::write(&path, &file.content)
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!("wrote {}", path.display());
    }
    Ok(())
}

/// One pretty-printed `{api}.json` per document.
fn document_files(documents: &IndexMap<String, Arc<Document>>) -> Result<Vec<GeneratedFile>> {
    documents
        .iter()
        .map(|(name, doc)| {
            let mut content = serde_json::to_string_pretty(doc.as_ref())
                .with_context(|| format!("failed to encode document `{name}`"))?;
            content.push('\n');
            Ok(GeneratedFile {
                path: format!("{name}.json"),
                content,
            })
        })
        .collect()
}

fn paths_index_file(index: &IndexMap<String, String>) -> Result<GeneratedFile> {
    let mut content = serde_json::to_string_pretty(index)?;
    content.push('\n');
    Ok(GeneratedFile {
        path: "paths_index.json".to_string(),
        content,
    })
}

fn cmd_generate(
    config_path: &Path,
    api: Option<String>,
    routes: Option<PathBuf>,
    handlers: Option<PathBuf>,
    output: Option<PathBuf>,
    no_files: bool,
) -> Result<()> {
    let cfg = load_config(config_path)?;
    if cfg.docs.is_empty() {
        eprintln!("No documents configured. Add a `docs` section to your config.");
        return Ok(());
    }

    let handlers_path = handlers.unwrap_or_else(|| PathBuf::from(&cfg.handlers));
    let registry = HandlerRegistry::load(&handlers_path)
        .with_context(|| format!("failed to load handlers from {}", handlers_path.display()))?;

    let route_cache = match routes.or_else(|| cfg.routes.as_ref().map(PathBuf::from)) {
        Some(path) => RouteCache::new(FileRoutes::new(path)),
        None => RouteCache::empty(),
    };

    let aggregator = Aggregator::from_config(&cfg, registry, route_cache);
    let generated = aggregator.generate_all(api.as_deref());

    if !no_files && !generated.documents.is_empty() {
        let output_dir = output.unwrap_or_else(|| PathBuf::from(&cfg.output));
        let mut files = document_files(&generated.documents)?;
        if cfg.write_paths_index {
            files.push(paths_index_file(&aggregator.path_index())?);
        }
        write_files(&output_dir, &files)?;

        let width = generated.documents.keys().map(String::len).max().unwrap_or(0);
        for name in generated.documents.keys() {
            eprintln!("  `{name:>width$}.json` has been generated.");
        }
        eprintln!(
            "Generated {} documents in {}",
            generated.documents.len(),
            output_dir.display()
        );
    } else {
        for (name, doc) in &generated.documents {
            eprintln!(
                "  {name}: {} paths, {} tags",
                doc.paths.len(),
                doc.tags.len()
            );
        }
    }

    if !generated.is_success() {
        for (name, err) in &generated.failures {
            eprintln!("  failed `{name}`: {err}");
        }
        anyhow::bail!("{} document(s) failed to build", generated.failures.len());
    }
    Ok(())
}

fn cmd_routes(input: PathBuf, group: Option<String>, format: OutputFormat) -> Result<()> {
    let dump = fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let table = RouteTable::parse(&dump);

    let summary = match group {
        Some(ref name) => {
            let mut only = serde_json::Map::new();
            only.insert(name.clone(), serde_json::to_value(table.routes_of(name))?);
            serde_json::Value::Object(only)
        }
        None => serde_json::to_value(&table)?,
    };

    match format {
        OutputFormat::Yaml => print!("{}", serde_yaml_ng::to_string(&summary)?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(())
}

fn cmd_stub(config_path: &Path, action_path: &str, template: &str) -> Result<()> {
    let cfg = load_config(config_path)?;
    let writer = StubWriter::new(&cfg.stubs, ".");

    match writer.write(action_path, template)? {
        StubOutcome::Written(path) => eprintln!("Stub generated: {}", path.display()),
        StubOutcome::Kept(path) => eprintln!(
            "{} already exists. Set `stubs.overwrite: true` to replace it.",
            path.display()
        ),
        StubOutcome::Disabled => {
            eprintln!("Stub generation is disabled. Set `stubs.enabled: true` in your config.")
        }
    }
    Ok(())
}

fn cmd_init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(config_path, config::default_config_content())?;
    eprintln!("Created {}", config_path.display());
    Ok(())
}
