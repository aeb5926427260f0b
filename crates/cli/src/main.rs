use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;

use stacks_app::catalog::models::{SortField, SortOrder};
use stacks_app::catalog::repository::{page_slice, InMemoryItemRepository, ItemRepository};
use stacks_app::catalog::view_model::{ProductViewModel, ViewModelConfig};
use stacks_app::library::Library;
use stacks_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "stacks", version, about = "Library lending and product catalog")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// List the library shelf
    Books {
        /// Case-insensitive filter on book name
        #[arg(long)]
        search: Option<String>,
    },
    /// Borrow books in order as one user and print the result
    Borrow {
        #[arg(long, default_value = "user1")]
        user: String,
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Query the product catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
}

#[derive(Debug, Subcommand)]
enum CatalogCommand {
    /// One page of the catalog, optionally sorted within the page
    Page {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        size: Option<usize>,
        #[arg(long)]
        sort_by: Option<SortField>,
        #[arg(long, default_value = "asc")]
        order: SortOrder,
    },
    /// Items whose name or brand contains the query
    Search {
        query: String,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long)]
        size: Option<usize>,
    },
    /// The whole catalog in order
    Sort {
        #[arg(long)]
        by: SortField,
        #[arg(long, default_value = "asc")]
        order: SortOrder,
    },
    /// Scroll the product screen through a number of pages
    Browse {
        #[arg(long, default_value_t = 1)]
        pages: usize,
        /// Overrides catalog.load_more_delay_ms
        #[arg(long)]
        delay_ms: Option<u64>,
    },
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().with_context(|| "failed to load Stacks settings")?;

    match cli.command {
        Command::Serve => stacks_app::app::serve(settings).await,
        Command::Books { search } => {
            let library = Library::new();
            let books = match search.as_deref() {
                Some(query) => library.search_books(query),
                None => library.books().to_vec(),
            };
            print_json(&books)
        }
        Command::Borrow { user, names } => {
            let mut library = Library::new();
            library.set_current_user(user.as_str());
            for name in &names {
                library
                    .borrow_book(name)
                    .with_context(|| format!("could not borrow '{name}'"))?;
            }
            print_json(&json!({
                "username": user,
                "borrowed_books": library.borrowed_books(),
                "books": library.books(),
            }))
        }
        Command::Catalog { command } => run_catalog(command, &settings).await,
    }
}

async fn run_catalog(command: CatalogCommand, settings: &Settings) -> anyhow::Result<()> {
    let repository = InMemoryItemRepository::seeded();
    let default_size = settings.catalog.page_size;

    match command {
        CatalogCommand::Page {
            page,
            size,
            sort_by,
            order,
        } => {
            let mut items = repository
                .fetch_items(page, size.unwrap_or(default_size))
                .await?;
            if let Some(sort_by) = sort_by {
                items = repository.sort_items(items, sort_by, order).await?;
            }
            print_json(&items)
        }
        CatalogCommand::Search { query, page, size } => {
            let matches = repository.search_items(&query).await?;
            let items = page_slice(&matches[..], page, size.unwrap_or(default_size))?;
            print_json(&items)
        }
        CatalogCommand::Sort { by, order } => {
            let items = repository.all_items().await?;
            let sorted = repository.sort_items(items, by, order).await?;
            print_json(&sorted)
        }
        CatalogCommand::Browse { pages, delay_ms } => {
            let mut catalog = settings.catalog.clone();
            if let Some(delay_ms) = delay_ms {
                catalog.load_more_delay_ms = delay_ms;
            }
            anyhow::ensure!(catalog.page_size > 0, "catalog.page_size must be at least 1");

            let screen = ProductViewModel::new(Arc::new(repository), ViewModelConfig::from(&catalog));
            screen.settle().await;
            for _ in 1..pages {
                if !screen.load_more_items() {
                    break;
                }
                screen.settle().await;
            }
            print_json(&screen.state())
        }
    }
}
