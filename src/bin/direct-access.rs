use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use direct_access::config::loader::load_config;
use direct_access::export::{to_csv, CsvOptions};
use direct_access::utils::logging::{self, LogFormat, LogLevel, LoggingConfig};
use direct_access::{ClientConfig, DirectAccess, QueryOptions, TracingDiagnostics};
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// YAML client config; credentials fall back to DIRECTACCESS_* env vars
    #[arg(short, long, env = "CONFIG")]
    config: Option<String>,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Stream a dataset to stdout (JSON lines) or to a delimited file
    Query {
        dataset: String,
        /// filter as key=value, repeatable
        #[arg(short, long = "filter")]
        filters: Vec<String>,
        #[arg(short, long)]
        output: Option<String>,
        #[arg(long, default_value_t = ',')]
        delimiter: char,
    },
    /// Print the record count for a dataset query
    Count {
        dataset: String,
        #[arg(short, long = "filter")]
        filters: Vec<String>,
    },
    /// Print the DDL for a dataset
    Ddl {
        dataset: String,
        #[arg(long, default_value = "pg")]
        dialect: String,
    },
    /// Print the field documentation for a dataset
    Docs { dataset: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load config
    // -------------------------------

    let args = Args::parse();
    let mut config = match &args.config {
        Some(path) => load_config(path).with_context(|| format!("failed to load config '{}'", path))?,
        None => ClientConfig::from_env(),
    };
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    // -------------------------------
    // 2. Logging
    // -------------------------------

    logging::init_logging(&LoggingConfig::new(config.log_level, LogFormat::from_env()));

    // -------------------------------
    // 3. Create client (acquires a token unless one is configured)
    // -------------------------------

    let diagnostics = TracingDiagnostics::shared(config.log_level);
    let mut client = DirectAccess::with_diagnostics(config, diagnostics.clone()).await?;

    // -------------------------------
    // 4. Run command
    // -------------------------------

    match args.command {
        Command::Query { dataset, filters, output, delimiter } => {
            let options = parse_filters(&filters)?;
            let mut stream = client.query(&dataset, options)?;
            match output {
                Some(path) => {
                    let delimiter = u8::try_from(delimiter)
                        .map_err(|_| anyhow!("delimiter must be a single-byte character"))?;
                    let csv_options = CsvOptions { delimiter, progress_every: 10_000 };
                    let written = to_csv(stream, &path, &csv_options, &diagnostics).await?;
                    info!("wrote {} records to {}", written, path);
                }
                None => {
                    while let Some(record) = stream.next().await? {
                        println!("{}", serde_json::to_string(&record)?);
                    }
                }
            }
        }
        Command::Count { dataset, filters } => {
            let options = parse_filters(&filters)?;
            println!("{}", client.count(&dataset, &options).await?);
        }
        Command::Ddl { dataset, dialect } => {
            println!("{}", client.schema(&dataset, &dialect).await?);
        }
        Command::Docs { dataset } => match client.docs(&dataset).await? {
            Some(docs) => println!("{}", serde_json::to_string_pretty(&docs)?),
            None => info!("no documentation available for {}", dataset),
        },
    }

    Ok(())
}

fn parse_filters(filters: &[String]) -> Result<QueryOptions> {
    filters
        .iter()
        .map(|f| QueryOptions::parse_pair(f).ok_or_else(|| anyhow!("invalid filter '{}', expected key=value", f)))
        .collect::<Result<Vec<_>>>()
        .map(|pairs| pairs.into_iter().collect())
}
