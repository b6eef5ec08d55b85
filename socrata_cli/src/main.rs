use anyhow::{Context, Result};
use clap::Parser;
use socrata_api::{Client, DataTable, QueryParams, DEFAULT_PAGE_SIZE};
use tabled::builder::Builder;
use tabled::settings::Style;

/// Illustrative front end for the SODA client: one query, one printed table.
#[derive(Parser)]
#[command(name = "socrata")]
#[command(about = "Fetch rows from a Socrata Open Data (SODA) endpoint")]
struct Cli {
    /// Resource URL, e.g. https://data.seattle.gov/resource/3k2p-39jp.json
    endpoint: String,

    /// Application token. Falls back to the SODA_APP_TOKEN environment variable.
    #[arg(long)]
    token: Option<String>,

    /// Maximum number of rows per page ($limit).
    #[arg(long)]
    limit: Option<u64>,

    /// Filter predicate ($where), e.g. "magnitude > 3.0"
    #[arg(long, value_name = "PREDICATE")]
    r#where: Option<String>,

    /// Sort expression ($order), e.g. "date DESC"
    #[arg(long)]
    order: Option<String>,

    /// Extra column filters as name=value pairs.
    #[arg(long = "filter", value_name = "NAME=VALUE")]
    filters: Vec<String>,

    /// Page through the whole result set instead of fetching one page.
    #[arg(long)]
    page_through: bool,

    /// Rows per page when paging and no --limit is given.
    #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("socrata_api=info".parse().unwrap())
                .add_directive("socrata_cli=info".parse().unwrap()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let token = cli
        .token
        .or_else(|| std::env::var("SODA_APP_TOKEN").ok())
        .context("no application token: pass --token or set SODA_APP_TOKEN")?;

    let mut params = QueryParams::new();
    if let Some(limit) = cli.limit {
        params = params.with_limit(limit);
    }
    if let Some(predicate) = cli.r#where {
        params = params.with_where(predicate);
    }
    if let Some(order) = cli.order {
        params = params.with_order(order);
    }
    for filter in &cli.filters {
        let (name, value) = filter
            .split_once('=')
            .with_context(|| format!("bad --filter `{}`: expected name=value", filter))?;
        params = params.with(name, value);
    }

    let mut client = Client::new(cli.endpoint).with_token(token).with_params(params);
    tracing::debug!("query: {:?}", client.params());

    let table = if cli.page_through {
        client.fetch_all_pages(cli.page_size).await?
    } else {
        client.fetch_table().await?
    };

    print_table(&table);
    println!("{} rows", table.len());
    Ok(())
}

fn print_table(table: &DataTable) {
    let mut builder = Builder::default();
    builder.push_record(table.columns().iter().cloned());
    for row in table.rows() {
        builder.push_record(row.iter().map(|v| v.to_string()));
    }
    let mut rendered = builder.build();
    rendered.with(Style::markdown());
    println!("{}", rendered);
}
