use cinelite::cli::{self as prog_cli, OutputMode};
use cinelite::config::{Config, ConfigLayer};
use cinelite::store::snapshot;
use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cinelite", version, about = "cinelite movie catalogue CLI", long_about = None)]
struct Cli {
    #[arg(long, help = "Path to a config file (TOML). If omitted, CINELITE_CONFIG or ./cinelite.toml is used.")]
    config: Option<PathBuf>,
    #[arg(long, help = "Override the data snapshot path. Takes precedence over config/env.")]
    data: Option<PathBuf>,
    #[arg(long, help = "Log level: off|error|warn|info|debug|trace")]
    log_level: Option<String>,
    #[arg(long, help = "Record every dispatched request into the request table")]
    record_requests: bool,
    #[arg(long, help = "Print compact JSON instead of pretty output")]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List a resource with filters, sorting and pagination")]
    List {
        #[arg(help = "Resource route name (movies, ratings, tags, ...)")]
        resource: String,
        #[arg(long, help = "1-based page number")]
        page: Option<i64>,
        #[arg(long, help = "Max number of items per page")]
        limit: Option<i64>,
        #[arg(long, help = "Sort term field.{asc|desc}; repeatable")]
        sort: Vec<String>,
        #[arg(long, help = "Filter term operation(field, value); repeatable")]
        filter: Vec<String>,
    },
    #[command(about = "Read one record by id (compound ids join key fields with _)")]
    Get { resource: String, id: String },
    #[command(about = "Create a record from a JSON object")]
    Create {
        resource: String,
        #[arg(help = "JSON payload; omit with --stdin")]
        json: Option<String>,
        #[arg(long, help = "Read the JSON payload from stdin")]
        stdin: bool,
    },
    #[command(about = "Update fields of a record from a JSON object")]
    Update {
        resource: String,
        id: String,
        #[arg(help = "JSON payload; omit with --stdin")]
        json: Option<String>,
        #[arg(long, help = "Read the JSON payload from stdin")]
        stdin: bool,
    },
    #[command(about = "Delete a record by id")]
    Delete { resource: String, id: String },
    #[command(name = "browse-section", about = "List movies through a section's stored filters")]
    BrowseSection {
        id: String,
        #[arg(long)]
        page: Option<i64>,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long, help = "Sort term replacing the section's own; repeatable")]
        sort: Vec<String>,
        #[arg(long, help = "Filter term added to the section's own; repeatable")]
        filter: Vec<String>,
    },
    #[command(about = "List the available filter operators")]
    Operators,
    #[command(about = "Print parameter and endpoint documentation")]
    Docs,
    #[command(about = "Print query/write counters")]
    Metrics,
    #[command(about = "Create an empty data snapshot if missing")]
    Init,
}

fn payload(json: Option<String>, stdin: bool) -> Result<String, Box<dyn std::error::Error>> {
    if stdin {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        return Ok(buf);
    }
    json.ok_or_else(|| "missing JSON payload (pass it inline or use --stdin)".into())
}

fn to_command(cmd: Commands, data_path: PathBuf) -> Result<prog_cli::Command, Box<dyn std::error::Error>> {
    use prog_cli::Command as C;
    Ok(match cmd {
        Commands::List { resource, page, limit, sort, filter } => C::List { resource, page, limit, sort, filter },
        Commands::Get { resource, id } => C::Get { resource, id },
        Commands::Create { resource, json, stdin } => C::Create { resource, json: payload(json, stdin)? },
        Commands::Update { resource, id, json, stdin } => C::Update { resource, id, json: payload(json, stdin)? },
        Commands::Delete { resource, id } => C::Delete { resource, id },
        Commands::BrowseSection { id, page, limit, sort, filter } => {
            C::BrowseSection { id, page, limit, sort, filter }
        }
        Commands::Operators => C::Operators,
        Commands::Docs => C::Docs,
        Commands::Metrics => C::Metrics,
        Commands::Init => C::Init { data_path },
    })
}

fn main() {
    let cli = Cli::parse();
    // Precedence: CLI > env > config file > defaults
    let overrides = ConfigLayer {
        data_path: cli.data.clone(),
        record_requests: cli.record_requests.then_some(true),
        log: cinelite::config::LogLayer { level: cli.log_level.clone(), ..Default::default() },
        ..ConfigLayer::default()
    };
    let cfg = match Config::load(cli.config.as_deref(), overrides) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(2);
        }
    };
    if let Err(e) = cinelite::logger::configure(&cfg.log) {
        eprintln!("warning: logging disabled: {e}");
    }
    cinelite::query::telemetry::set_slow_query_ms(cfg.slow_query_ms);

    let (store, api) = match cinelite::open(&cfg.data_path) {
        Ok(opened) => opened,
        Err(e) => {
            eprintln!("error: cannot load {}: {e}", cfg.data_path.display());
            std::process::exit(1);
        }
    };
    let api = api
        .with_limits(cfg.page_limits())
        .recording_requests(cfg.record_requests);
    let mode = if cli.json { OutputMode::Json } else { OutputMode::Human };

    let r = to_command(cli.command, cfg.data_path.clone()).and_then(|cmd| {
        let write = cmd.is_write();
        let stdout = std::io::stdout();
        let status = prog_cli::run_with_format(&api, &store, cmd, mode, &mut stdout.lock())?;
        if write && (200..300).contains(&status) || cfg.record_requests {
            snapshot::save(&store, &cfg.data_path)?;
        }
        Ok(status)
    });
    match r {
        Ok(status) if (200..300).contains(&status) => {}
        Ok(status) => {
            log::debug!("command finished with status {status}");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
