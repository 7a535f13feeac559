#![cfg(not(tarpaulin_include))]

use notes_share::{FileTypeFilter, PageSize, SortOption, ViewState, compute_listing, read_notes_file};
use std::env;
use std::process;

fn usage(program: &str) -> String {
    format!(
        "Usage: {} <notes.json> [--search <text>] [--sort newest|oldest|batchAZ|batchZA] \
         [--type all|pdf|doc|sheet|slide] [--per-page 6|12|24] [--page <n>]",
        program
    )
}

/// Apply command line flags to a fresh view
fn parse_view(args: &[String]) -> Result<ViewState, String> {
    let mut view = ViewState::new();
    let mut page = None;

    let mut iter = args.iter();
    while let Some(flag) = iter.next() {
        let value = iter
            .next()
            .ok_or_else(|| format!("Missing value for {}", flag))?;

        match flag.as_str() {
            "--search" => view.set_search_query(value.as_str()),
            "--sort" => view.set_sort_option(value.parse::<SortOption>()?),
            "--type" => view.set_file_type_filter(value.parse::<FileTypeFilter>()?),
            "--per-page" => {
                let size: usize = value
                    .parse()
                    .map_err(|_| format!("Invalid page size: {}", value))?;
                view.set_page_size(PageSize::try_from(size)?);
            }
            "--page" => {
                page = Some(
                    value
                        .parse::<usize>()
                        .map_err(|_| format!("Invalid page: {}", value))?,
                );
            }
            other => return Err(format!("Unknown option: {}", other)),
        }
    }

    // The page is applied last so the other setters don't reset it
    if let Some(page) = page {
        view.go_to_page(page);
    }
    Ok(view)
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        text.to_string()
    } else {
        let cut: String = text.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("notes-cli");

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        eprintln!("{}", usage(program));
        process::exit(2);
    }

    let mut view = match parse_view(&args[2..]) {
        Ok(view) => view,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!("{}", usage(program));
            process::exit(2);
        }
    };

    let notes = match read_notes_file(&args[1]) {
        Ok(notes) => notes,
        Err(e) => {
            eprintln!("Error: could not read {}: {}", args[1], e);
            process::exit(1);
        }
    };

    let page = compute_listing(&notes, &mut view);

    if let Some(message) = page.empty_message {
        println!("{}", message);
        return;
    }

    println!(
        "{:<3} {:<24} {:<20} {:<6} {:<24} Preview",
        "", "Batch", "Educator", "Type", "Uploaded"
    );
    for entry in &page.entries {
        println!(
            "{:<3} {:<24} {:<20} {:<6} {:<24} {}",
            entry.icon,
            truncate(entry.note.batch_name.as_deref().unwrap_or(""), 24),
            truncate(entry.note.educator_name.as_deref().unwrap_or(""), 20),
            entry.file_type.as_str(),
            entry.uploaded_at,
            entry.preview_url.as_deref().unwrap_or("-"),
        );
    }

    println!();
    println!(
        "Page {} of {} ({} of {} notes match)",
        page.current_page, page.total_pages, page.matching_notes, page.total_notes
    );
}
