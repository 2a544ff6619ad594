use std::sync::Arc;

use anyhow::{bail, Result};
use clap::Parser;
use serde_json::Value;
use tracing::info;

use tablekit::config::Config;
use tablekit::flash::FlashQueue;
use tablekit::http::{HttpContext, ReqwestTransport};
use tablekit::loader::LoadingIndicator;
use tablekit::models::{DateRange, Pagination};
use tablekit::render::{self, TableConfig};
use tablekit::table::{page_window, FetchOutcome, ItemRange, ListConfig, ListController};

mod cli;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Set default log level to INFO if not specified
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "tablekit=info");
    }

    // Initialize logging to both console and file
    use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt, Layer};

    let file_appender = tracing_appender::rolling::never(".", "tablekit.log");

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(EnvFilter::from_default_env())
        )
        .with(
            fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_filter(EnvFilter::from_default_env())
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::List {
            path,
            page,
            per_page,
            sort_field,
            sort_dir,
            from,
            to,
            query,
            columns,
        } => {
            // Reject a bad direction even when no sort field was given
            let direction = Commands::parse_sort_direction(sort_dir)?;

            let config = Config::from_env()?;
            config.validate()?;

            let mut list_config = ListConfig::from_config(&config, path)
                .with_per_page((*per_page).unwrap_or(config.per_page))
                .with_date_range(DateRange::from_dates(*from, *to));
            if let Some(field) = sort_field {
                list_config = list_config.with_sort(field, direction);
            }
            if let Some(query) = query {
                list_config = list_config.with_query(query);
            }

            run_list(&config, list_config, *page, columns).await?;
        }

        Commands::Pages {
            page,
            per_page,
            total_items,
            total_pages,
        } => {
            let per_page = (*per_page).max(1);
            let total_pages = (*total_pages).unwrap_or_else(|| {
                u32::try_from(total_items.div_ceil(u64::from(per_page))).unwrap_or(u32::MAX)
            });

            let mut pagination = Pagination {
                page: 1,
                per_page,
                total_items: *total_items,
                total_pages,
            };
            pagination.page = pagination.clamp_page(*page);

            println!(
                "{}",
                render::render_summary(&ItemRange::of(&pagination), pagination.page, total_pages)
            );
            let window = page_window(pagination.page, total_pages);
            println!("{}", render::render_page_window(&window, pagination.page));
        }
    }

    Ok(())
}

async fn run_list(
    config: &Config,
    list_config: ListConfig,
    page: u32,
    columns: &[String],
) -> Result<()> {
    let transport = Arc::new(ReqwestTransport::new(config)?);
    let indicator = LoadingIndicator::new();
    let flash = FlashQueue::new(config.flash_remove_delay());
    let context =
        HttpContext::new(transport, indicator.clone()).with_loader_grace(config.loader_grace());

    // Report the shared loader on stderr while requests are slow
    let mut loading = indicator.subscribe();
    tokio::spawn(async move {
        while loading.changed().await.is_ok() {
            if *loading.borrow() > 0 {
                eprintln!("⟳ Loading...");
            }
        }
    });

    let path = list_config.path.clone();
    info!("Fetching {}", path);

    let list: ListController<Value> = ListController::new(context, flash.clone(), list_config);
    let mut outcome = list.load().await;
    if outcome == FetchOutcome::Loaded && page > 1 {
        outcome = list.set_page(page).await;
    }

    for (_, message) in flash.entries() {
        eprintln!("{}", render::render_flash(&message));
    }

    ensure_loaded(outcome, &path)?;

    let view = list.view();
    if view.rows.is_empty() {
        println!("No results.");
    } else {
        let columns = render::columns_for(&view.rows, columns);
        println!("{}", render::render_table(&view.rows, &columns, &TableConfig::default()));
    }

    println!();
    println!(
        "{}",
        render::render_summary(
            &list.item_range(),
            view.pagination.page,
            view.pagination.total_pages
        )
    );
    println!("{}", render::render_page_window(&list.page_window(), view.pagination.page));

    Ok(())
}

/// Turn anything but a loaded page into a non-zero exit
fn ensure_loaded(outcome: FetchOutcome, path: &str) -> Result<()> {
    match outcome {
        FetchOutcome::Loaded => Ok(()),
        FetchOutcome::Aborted => bail!("Loading {} was cancelled", path),
        other => bail!("Failed to load {} ({:?})", path, other),
    }
}
