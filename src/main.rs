use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use taskpad::application::TaskManager;
use taskpad::components::task_row::TaskRow;
use taskpad::config::ClientConfig;
use taskpad::core::pagination::IntersectionEntry;
use taskpad::core::task::{Priority, TaskStatus};
use taskpad::message::Message;
use taskpad::pages::task_form::FormField;
use taskpad::pages::task_list::LIST_END;

#[derive(Parser, Debug)]
#[command(name = "taskpad", about = "List and edit tasks on a remote task server")]
struct Cli {
    /// Base URL of the task collection.
    #[arg(long, env = "TASKPAD_API_URL")]
    api_url: Option<String>,

    /// Config file (defaults to the user config dir).
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show tasks, scrolling through up to N pages.
    List {
        #[arg(long, default_value_t = 1)]
        pages: u32,
    },
    /// Create a task.
    Add(TaskFields),
    /// Update an existing task; the list is scanned for it first.
    Update {
        id: String,
        #[command(flatten)]
        fields: TaskFields,
    },
    /// Delete a listed task.
    Delete { id: String },
}

#[derive(Args, Debug)]
struct TaskFields {
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    /// TODO, IN_PROGRESS or COMPLETED.
    #[arg(long, value_parser = parse_status)]
    status: Option<TaskStatus>,
    /// LOW, MEDIUM or HIGH.
    #[arg(long, value_parser = parse_priority)]
    priority: Option<Priority>,
    /// YYYY-MM-DD.
    #[arg(long)]
    due: Option<String>,
}

impl TaskFields {
    fn into_messages(self) -> Vec<Message> {
        let mut messages = Vec::new();
        if let Some(v) = self.title {
            messages.push(Message::Form(FormField::Title(v)));
        }
        if let Some(v) = self.description {
            messages.push(Message::Form(FormField::Description(v)));
        }
        if let Some(v) = self.status {
            messages.push(Message::Form(FormField::Status(v)));
        }
        if let Some(v) = self.priority {
            messages.push(Message::Form(FormField::Priority(v)));
        }
        if let Some(v) = self.due {
            messages.push(Message::Form(FormField::DueDate(v)));
        }
        messages
    }
}

fn parse_status(s: &str) -> Result<TaskStatus, String> {
    TaskStatus::from_keyword(&s.to_uppercase()).ok_or_else(|| format!("unknown status: {}", s))
}

fn parse_priority(s: &str) -> Result<Priority, String> {
    Priority::from_keyword(&s.to_uppercase()).ok_or_else(|| format!("unknown priority: {}", s))
}

fn init_logging(debug: bool) {
    // Logs go to the systemd user journal (`journalctl --user -t taskpad -f`).
    // Wrapper filters: taskpad crate at info/debug (per config), everything else at warn.
    struct FilteredJournal {
        inner: systemd_journal_logger::JournalLog,
    }

    impl log::Log for FilteredJournal {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            if metadata.target().starts_with("taskpad") {
                let max = if taskpad::debug_logging() {
                    log::LevelFilter::Debug
                } else {
                    log::LevelFilter::Info
                };
                metadata.level() <= max
            } else {
                metadata.level() <= log::LevelFilter::Warn
            }
        }
        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                self.inner.log(record);
            }
        }
        fn flush(&self) {
            self.inner.flush();
        }
    }

    taskpad::set_debug_logging(debug);

    let journal = match systemd_journal_logger::JournalLog::new() {
        Ok(journal) => journal.with_syslog_identifier("taskpad".to_string()),
        Err(e) => {
            eprintln!("journal logging unavailable: {}", e);
            return;
        }
    };
    if log::set_boxed_logger(Box::new(FilteredJournal { inner: journal })).is_ok() {
        // Global max must be Debug so taskpad debug logs can pass through when toggled
        log::set_max_level(log::LevelFilter::Debug);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let mut config = ClientConfig::load(&config_path);
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    init_logging(cli.debug || config.debug_logging);

    let mut app = TaskManager::new(&config)?;
    app.update(Message::Load).await;

    match cli.command {
        Command::List { pages } => {
            while app.list().page() < pages && app.list().has_next_page() {
                let before = app.list().page();
                scroll_to_end(&mut app).await;
                if app.list().page() == before {
                    break;
                }
            }
        }
        Command::Add(fields) => {
            for message in fields.into_messages() {
                app.update(message).await;
            }
            submit(&mut app).await?;
        }
        Command::Update { id, fields } => {
            let row = find_row(&mut app, &id).await?;
            app.update(row.edit().into()).await;
            for message in fields.into_messages() {
                app.update(message).await;
            }
            submit(&mut app).await?;
        }
        Command::Delete { id } => {
            let row = find_row(&mut app, &id).await?;
            app.update(row.delete().into()).await;
        }
    }

    println!("{}", app.view());
    Ok(())
}

/// Find the row for `id`, loading further pages as needed.
async fn find_row(
    app: &mut TaskManager,
    id: &str,
) -> Result<TaskRow, Box<dyn std::error::Error>> {
    loop {
        if let Some(row) = app.list().rows().into_iter().find(|r| r.id == id) {
            return Ok(row);
        }
        let before = app.list().page();
        if !app.list().has_next_page() {
            break;
        }
        scroll_to_end(app).await;
        if app.list().page() == before {
            break;
        }
    }
    Err(format!("task {} not found", id).into())
}

/// Scroll the list-end sentinel out of view and back in.
async fn scroll_to_end(app: &mut TaskManager) {
    app.update(Message::Sentinel(IntersectionEntry::new(LIST_END, 0.0))).await;
    app.update(Message::Sentinel(IntersectionEntry::new(LIST_END, 1.0))).await;
}

async fn submit(app: &mut TaskManager) -> Result<(), Box<dyn std::error::Error>> {
    app.update(Message::SubmitForm).await;
    let errors = app.form().errors();
    let problems: Vec<&str> = [errors.title.as_deref(), errors.due_date.as_deref()]
        .into_iter()
        .flatten()
        .collect();
    if !problems.is_empty() {
        return Err(problems.join("; ").into());
    }
    Ok(())
}
