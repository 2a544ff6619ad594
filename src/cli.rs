use clap::{Parser, Subcommand};
use chrono::NaiveDate;
use tablekit::models::SortDirection;

#[derive(Parser)]
#[command(name = "tablekit")]
#[command(about = "Browse server-paginated collections from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch one page of a remote collection and print it as a table
    List {
        /// Endpoint path, relative to TABLEKIT_API_URL
        #[arg(short, long)]
        path: String,

        /// Page to fetch (1-based)
        #[arg(long, default_value = "1")]
        page: u32,

        /// Page size (defaults to TABLEKIT_PER_PAGE)
        #[arg(long)]
        per_page: Option<u32>,

        /// Column to sort by
        #[arg(long)]
        sort_field: Option<String>,

        /// Sort direction (asc, desc)
        #[arg(long, default_value = "desc")]
        sort_dir: String,

        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Free-text search
        #[arg(short, long)]
        query: Option<String>,

        /// Comma-separated columns to show (defaults to every field of the first row)
        #[arg(short, long, value_delimiter = ',')]
        columns: Vec<String>,
    },

    /// Print paginator math for the given totals without touching the network
    Pages {
        /// Current page
        #[arg(long, default_value = "1")]
        page: u32,

        /// Page size
        #[arg(long, default_value = "25")]
        per_page: u32,

        /// Total number of items
        #[arg(long)]
        total_items: u64,

        /// Total number of pages (computed from the item count when omitted)
        #[arg(long)]
        total_pages: Option<u32>,
    },
}

impl Commands {
    pub fn parse_sort_direction(direction: &str) -> Result<SortDirection, anyhow::Error> {
        SortDirection::parse(direction)
    }
}
