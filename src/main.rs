use clap::{Parser, Subcommand};
use docs_nav::config::{self, CONFIG_FILENAME, ProjectPaths, SiteConfig};
use docs_nav::metadata::Visibility;
use docs_nav::search::SearchIndex;
use docs_nav::watcher::{self, DevSession};
use docs_nav::{output, search_index, sidebar};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Shared flags for commands that decide dev-only visibility.
#[derive(clap::Args, Clone)]
struct VisibilityArgs {
    /// Include dev-only content (same as NODE_ENV=development)
    #[arg(long)]
    dev: bool,

    /// Include dev-only reference content (same as SHOW_REFERENCE=true)
    #[arg(long)]
    show_reference: bool,
}

impl VisibilityArgs {
    /// Environment policy, with each flag forcing its half on.
    fn resolve(&self) -> Visibility {
        let env = Visibility::from_env();
        Visibility {
            dev_mode: env.dev_mode || self.dev,
            show_reference: env.show_reference || self.show_reference,
        }
    }
}

#[derive(Parser)]
#[command(name = "docs-nav")]
#[command(about = "Sidebar and search generation for documentation sites")]
#[command(long_about = "\
Sidebar and search generation for documentation sites

The content directory is the data source. Directories become sidebar
sections, documents become entries, and _metadata.json files tune labels,
ordering and visibility.

Content structure:

  src/content/docs/
  ├── guides/                      # Section
  │   ├── _metadata.json           # { label, order, devOnly, items: { <base>: {...} } }
  │   ├── index.md                 # Folder index → slug \"guides\"
  │   ├── setup.md                 # Slug \"guides/setup\", label from title
  │   ├── setup.link               # Sidecar: entry links to this file's URL
  │   └── status.link              # Standalone link entry
  ├── reference/
  │   └── dashboard.astro          # Linked only if src/pages/reference/dashboard.astro exists
  └── _drafts/                     # Leading underscore: never listed

Ordering: metadata \"order\" ascending (default 999), ties keep discovery order.
Dev-only content is shown with NODE_ENV=development, SHOW_REFERENCE=true,
--dev or --show-reference.

Run 'docs-nav gen-config' to generate a documented docs-nav.toml.")]
#[command(version)]
struct Cli {
    /// Project root; configured paths resolve against it
    #[arg(long, default_value = ".", global = true)]
    project: PathBuf,

    /// Config file, relative to the project root
    #[arg(long, default_value = CONFIG_FILENAME, global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Build the sidebar and write it as JSON
    Sidebar {
        /// Output file (defaults to [sidebar] output)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Print the JSON to stdout instead of writing a file
        #[arg(long)]
        stdout: bool,

        #[command(flatten)]
        visibility: VisibilityArgs,
    },
    /// Build the sidebar and print it as an outline
    Check(VisibilityArgs),
    /// Extract search records from the content tree
    SearchIndex(VisibilityArgs),
    /// Query the generated search records
    Search {
        /// Query text
        query: String,

        /// Maximum number of results (defaults to [search] default_limit)
        #[arg(long)]
        limit: Option<usize>,

        /// Search records file (defaults to [search] output)
        #[arg(long)]
        index: Option<PathBuf>,
    },
    /// Regenerate the sidebar on changes and restart a dev server command
    Watch {
        #[command(flatten)]
        visibility: VisibilityArgs,

        /// Dev server command, restarted after every change
        #[arg(last = true)]
        command: Vec<String>,
    },
    /// Print a stock docs-nav.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Sidebar {
            out,
            stdout,
            visibility,
        } => {
            let (config, paths) = load(&cli.project, &cli.config)?;
            let items = sidebar::build_sidebar(&config, &paths, visibility.resolve());
            if stdout {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                let output = out.unwrap_or(paths.sidebar_output);
                sidebar::write_sidebar(&items, &output)?;
                output::print_sidebar_written(&items, &output);
            }
        }
        Command::Check(visibility) => {
            let (config, paths) = load(&cli.project, &cli.config)?;
            println!("==> Checking {}", paths.content_root.display());
            let items = sidebar::build_sidebar(&config, &paths, visibility.resolve());
            output::print_sidebar_outline(&items);
        }
        Command::SearchIndex(visibility) => {
            let (config, paths) = load(&cli.project, &cli.config)?;
            let records = search_index::build_records(&config, &paths, visibility.resolve());
            search_index::write_records(&records, &paths.search_output)?;
            output::print_records_written(records.len(), &paths.search_output);
        }
        Command::Search {
            query,
            limit,
            index,
        } => {
            let (config, paths) = load(&cli.project, &cli.config)?;
            let index_path = index.unwrap_or(paths.search_output);
            let search = SearchIndex::load(&index_path)?;
            let results = search.search(&query, limit.unwrap_or(config.search.default_limit));
            output::print_search_results(&results);
        }
        Command::Watch {
            visibility,
            command,
        } => {
            let (config, paths) = load(&cli.project, &cli.config)?;
            let session = DevSession::new(&cli.project, &cli.config, visibility.resolve(), command);
            watcher::watch(&paths, config.watch.debounce(), session)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Log to stderr so JSON on stdout stays clean. `RUST_LOG` overrides the
/// default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load the project config and resolve its paths.
fn load(project: &Path, config_file: &Path) -> Result<(SiteConfig, ProjectPaths), config::ConfigError> {
    let config = config::load_config(&project.join(config_file))?;
    let paths = ProjectPaths::resolve(&config, project, config_file);
    Ok((config, paths))
}
