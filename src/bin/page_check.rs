use std::collections::HashMap;

use taskpad::config::ClientConfig;
use taskpad::core::list_merge::TaskListMerger;
use taskpad::query::TaskQueries;
use taskpad::remote::TaskApiClient;

/// Safety stop for servers that never return an empty page.
const MAX_PAGES: u32 = 500;

#[tokio::main]
async fn main() {
    if let Ok(journal) = systemd_journal_logger::JournalLog::new() {
        let journal = journal.with_syslog_identifier("taskpad-page-check".to_string());
        if journal.install().is_ok() {
            log::set_max_level(log::LevelFilter::Info);
        }
    }

    let mut config = ClientConfig::load(&ClientConfig::default_path());
    if let Some(url) = std::env::args().nth(1) {
        config.api_url = url;
    }

    let client = match TaskApiClient::new(&config.api_url) {
        Ok(c) => c,
        Err(e) => {
            println!("  Client error: {}", e);
            return;
        }
    };
    let queries = TaskQueries::new(client);
    println!("=== Page walk: {} ===\n", queries.client().base_url());
    let mut merger = TaskListMerger::new();

    // id -> first page it appeared on
    let mut first_seen: HashMap<String, u32> = HashMap::new();
    let mut repeated = Vec::new();
    let mut fetched = 0usize;

    let mut page = 1;
    while page <= MAX_PAGES {
        let result = queries.query(page).await;
        if let Some(err) = result.error {
            println!("  page {}: {}", page, err);
            break;
        }
        let tasks = result.data.unwrap_or_default();
        println!("  page {}: {} tasks", page, tasks.len());
        if tasks.is_empty() {
            break;
        }

        fetched += tasks.len();
        for task in &tasks {
            match first_seen.get(&task.id) {
                Some(&first) => repeated.push((task.id.clone(), first, page)),
                None => {
                    first_seen.insert(task.id.clone(), page);
                }
            }
        }
        merger.apply(Some(&tasks), page);
        page += 1;
    }

    println!();
    println!("Fetched: {} tasks over {} pages", fetched, page.saturating_sub(1));
    println!("Merged:  {} unique tasks", merger.len());

    if repeated.is_empty() {
        println!("No ids repeated across pages.");
    } else {
        println!("\n--- Repeated ids ({}) ---", repeated.len());
        for (id, first, again) in &repeated {
            println!("  {} (page {} and page {})", id, first, again);
        }
    }
}
