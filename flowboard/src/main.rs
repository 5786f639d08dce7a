//! Flowboard — Kanban board CLI.
//!
//! Talks to a flowboard-server backend and renders the board as text.
//! Mutations apply to the local cache immediately and roll back if the
//! backend rejects them. Configuration via CLI flags, environment
//! variables, or config file (`~/.config/flowboard/config.toml`).
//!
//! ```bash
//! # Show the board
//! cargo run --bin flowboard
//!
//! # Add a task to the top of the backlog
//! cargo run --bin flowboard -- add "Fix login flow" \
//!     --description "Session cookie expires too early" --priority high
//!
//! # Move a task (by id prefix) into another column at a drop index
//! cargo run --bin flowboard -- move a3f2c1d8 in-progress --index 1
//!
//! # Point at a different backend
//! FLOWBOARD_URL=http://boards.internal:4000 cargo run --bin flowboard
//! ```

use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use url::Url;

use flowboard::board::cache::TaskCache;
use flowboard::board::{BoardError, BoardEvent, BoardManager};
use flowboard::config::{CliArgs, ClientConfig};
use flowboard::repo::http::HttpRepository;
use flowboard_core::task::{
    Assignee, COLORS, Priority, Task, TaskColumn, TaskDraft, TaskId, TaskPatch,
};

#[derive(clap::Parser, Debug)]
#[command(version, about = "Kanban task board CLI")]
struct Cli {
    #[command(flatten)]
    args: CliArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Show the board (the default when no subcommand is given).
    Board {
        /// Show a single column only.
        #[arg(long)]
        column: Option<TaskColumn>,

        /// Case-insensitive title/description filter.
        #[arg(long)]
        search: Option<String>,
    },

    /// Add a task to the top of a column.
    Add {
        /// Task title.
        title: String,

        /// Task description.
        #[arg(long)]
        description: String,

        /// Destination column.
        #[arg(long, default_value = "backlog")]
        column: TaskColumn,

        /// Task priority.
        #[arg(long, default_value = "medium")]
        priority: Priority,

        /// Assignee name.
        #[arg(long)]
        assignee: Option<String>,

        /// Due date (e.g. 2026-09-01).
        #[arg(long)]
        due: Option<String>,

        /// Effort estimate (e.g. 2h).
        #[arg(long)]
        estimate: Option<String>,

        /// Color tag.
        #[arg(long)]
        color: Option<String>,
    },

    /// Edit fields of a task.
    Edit {
        /// Task id, or a unique prefix of one.
        id: String,

        /// New title.
        #[arg(long)]
        title: Option<String>,

        /// New description.
        #[arg(long)]
        description: Option<String>,

        /// New priority.
        #[arg(long)]
        priority: Option<Priority>,

        /// New assignee name.
        #[arg(long)]
        assignee: Option<String>,

        /// New due date.
        #[arg(long)]
        due: Option<String>,

        /// New effort estimate.
        #[arg(long)]
        estimate: Option<String>,

        /// New color tag.
        #[arg(long)]
        color: Option<String>,
    },

    /// Delete a task.
    Rm {
        /// Task id, or a unique prefix of one.
        id: String,
    },

    /// Move a task to another column.
    Move {
        /// Task id, or a unique prefix of one.
        id: String,

        /// Destination column.
        column: TaskColumn,

        /// Drop index in the destination column (0 = top).
        #[arg(long, default_value_t = 0)]
        index: usize,
    },

    /// Reorder a task within its column.
    Reorder {
        /// Task id, or a unique prefix of one.
        id: String,

        /// Drop index (0 = top).
        index: usize,
    },

    /// Re-sync the local cache from the backend and show the board.
    Refresh,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::load(&cli.args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&cli.args.log_level);

    let url = match Url::parse(&config.server_url) {
        Ok(url) => url,
        Err(e) => {
            eprintln!("error: invalid server url {:?}: {e}", config.server_url);
            std::process::exit(1);
        }
    };
    let client = match reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("error: failed to build http client: {e}");
            std::process::exit(1);
        }
    };

    let repo = HttpRepository::with_client(client, &url);
    let cache = Arc::new(TaskCache::new());
    let (manager, mut events) = BoardManager::with_page_size(
        repo,
        Arc::clone(&cache),
        config.event_buffer,
        config.page_size,
    );

    let command = cli.command.unwrap_or(Command::Board {
        column: None,
        search: None,
    });

    if let Err(e) = run(&manager, &mut events, command).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Initialize logging to stderr (stdout belongs to board output).
fn init_logging(level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(
    manager: &BoardManager<HttpRepository>,
    events: &mut mpsc::Receiver<BoardEvent>,
    command: Command,
) -> Result<(), BoardError> {
    match command {
        Command::Board { column, search } => {
            match column {
                // A single column is loaded page by page; the full board
                // in one authoritative fetch.
                Some(column) => {
                    manager.hydrate_column(column).await?;
                    while manager.load_more(column).await? > 0 {}
                }
                None => {
                    manager.refresh().await?;
                }
            }
            print_board(manager.cache(), column, search.as_deref());
            Ok(())
        }
        Command::Add {
            title,
            description,
            column,
            priority,
            assignee,
            due,
            estimate,
            color,
        } => {
            manager.refresh().await?;
            let draft = TaskDraft {
                title,
                description,
                column,
                priority,
                assignee: assignee.map(|name| Assignee {
                    name: Some(name),
                    avatar: None,
                }),
                time_estimate: estimate,
                due_date: due,
                color: color.map(|c| validate_color(&c)),
            };
            let task = manager.create_task(draft).await?;
            println!(
                "created {:?} ({}) in {}",
                task.title,
                short_id(&task.id),
                task.column.label()
            );
            settle_and_show(manager, events, Some(task.column)).await
        }
        Command::Edit {
            id,
            title,
            description,
            priority,
            assignee,
            due,
            estimate,
            color,
        } => {
            manager.refresh().await?;
            let task = resolve_task(manager.cache(), &id);
            let patch = TaskPatch {
                title,
                description,
                priority,
                assignee: assignee.map(|name| Assignee {
                    name: Some(name),
                    avatar: None,
                }),
                time_estimate: estimate,
                due_date: due,
                color: color.map(|c| validate_color(&c)),
                ..TaskPatch::default()
            };
            if patch.is_empty() {
                fail("nothing to change (pass at least one field flag)");
            }
            manager.update_task(&task.id, patch).await?;
            println!("updated {:?} ({})", task.title, short_id(&task.id));
            settle_and_show(manager, events, Some(task.column)).await
        }
        Command::Rm { id } => {
            manager.refresh().await?;
            let task = resolve_task(manager.cache(), &id);
            manager.delete_task(&task.id).await?;
            println!("deleted {:?} ({})", task.title, short_id(&task.id));
            settle_and_show(manager, events, Some(task.column)).await
        }
        Command::Move { id, column, index } => {
            manager.refresh().await?;
            let task = resolve_task(manager.cache(), &id);
            manager.move_task(&task.id, column, index).await?;
            println!(
                "moved {:?} to {} at index {index}",
                task.title,
                column.label()
            );
            settle_and_show(manager, events, Some(column)).await
        }
        Command::Reorder { id, index } => {
            manager.refresh().await?;
            let task = resolve_task(manager.cache(), &id);
            manager.reorder_task(&task.id, index, task.column).await?;
            println!("reordered {:?} to index {index}", task.title);
            settle_and_show(manager, events, Some(task.column)).await
        }
        Command::Refresh => {
            let count = manager.refresh().await?;
            println!("synced {count} tasks");
            print_board(manager.cache(), None, None);
            Ok(())
        }
    }
}

/// Drain the event channel, honor any refresh signal, and print the board.
async fn settle_and_show(
    manager: &BoardManager<HttpRepository>,
    events: &mut mpsc::Receiver<BoardEvent>,
    column: Option<TaskColumn>,
) -> Result<(), BoardError> {
    let mut refresh_needed = false;
    while let Ok(event) = events.try_recv() {
        match event {
            BoardEvent::Refresh => refresh_needed = true,
            BoardEvent::MutationFailed { operation, reason } => {
                eprintln!("{operation} failed: {reason}");
            }
        }
    }
    if refresh_needed {
        manager.refresh().await?;
    }
    print_board(manager.cache(), column, None);
    Ok(())
}

/// Print columns with their tasks in board order, one line per task plus
/// an optional detail line. Indices are drop indices usable with
/// `move`/`reorder`.
fn print_board(cache: &TaskCache, only: Option<TaskColumn>, search: Option<&str>) {
    for column in TaskColumn::ALL {
        if only.is_some_and(|c| c != column) {
            continue;
        }
        let tasks = cache.view_by_column(column, search);
        println!("{} ({})", column.label(), tasks.len());
        for (index, task) in tasks.iter().enumerate() {
            println!(
                "{index:>4}. [{}] {}  ({})",
                task.priority.as_str(),
                task.title,
                short_id(&task.id)
            );
            let details = detail_line(task);
            if !details.is_empty() {
                println!("      {details}");
            }
        }
        println!();
    }
}

fn detail_line(task: &Task) -> String {
    let mut parts = Vec::new();
    if let Some(assignee) = &task.assignee
        && let Some(name) = &assignee.name
    {
        parts.push(format!("@{name}"));
    }
    if let Some(due) = &task.due_date {
        parts.push(format!("due {due}"));
    }
    if let Some(estimate) = &task.time_estimate {
        parts.push(format!("est {estimate}"));
    }
    if let Some(color) = &task.color {
        parts.push(format!("tag {color}"));
    }
    parts.join("  ")
}

fn short_id(id: &TaskId) -> String {
    id.to_string().chars().take(8).collect()
}

/// Find the task whose id matches `id_or_prefix` exactly or uniquely by
/// prefix. Exits with an error for no match or an ambiguous one.
fn resolve_task(cache: &TaskCache, id_or_prefix: &str) -> Task {
    let snapshot = cache.snapshot();
    let mut matches = snapshot
        .iter()
        .filter(|t| t.id.to_string().starts_with(id_or_prefix));
    match (matches.next(), matches.next()) {
        (Some(task), None) => task.clone(),
        (Some(_), Some(_)) => fail(&format!("task id prefix {id_or_prefix:?} is ambiguous")),
        (None, _) => fail(&format!("no task with id {id_or_prefix:?}")),
    }
}

fn validate_color(color: &str) -> String {
    if COLORS.iter().any(|c| c.id == color) {
        return color.to_string();
    }
    let valid: Vec<&str> = COLORS.iter().map(|c| c.id).collect();
    fail(&format!(
        "unknown color {color:?} (expected one of: {})",
        valid.join(", ")
    ))
}

fn fail(message: &str) -> ! {
    eprintln!("error: {message}");
    std::process::exit(1);
}
