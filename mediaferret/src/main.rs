use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use mediaferret::handlers::{parse_extension_list, parse_seed_url, parse_size_filter};
use mediaferret::{CrawlOptions, CrawlProgressCallback, execute_crawl, extract_url_path};
use mediaferret_core::model::{FileSizeFilter, SizeFilters};
use mediaferret_core::print_banner;
use mediaferret_core::report::{ReportFormat, generate_report, save_report};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    match chosen_command.subcommand() {
        Some(("crawl", primary_command)) => handle_crawl(primary_command, quiet).await,
        None => {
            // No subcommand provided, just show the banner
        }
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

fn parse_filter_arg(sub_matches: &ArgMatches, name: &str) -> Option<FileSizeFilter> {
    let raw = sub_matches.get_one::<String>(name)?;
    match parse_size_filter(raw) {
        Ok(filter) => Some(filter),
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            std::process::exit(1);
        }
    }
}

async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let url_arg = sub_matches.get_one::<String>("url").unwrap();
    let Some(seed_url) = parse_seed_url(url_arg) else {
        eprintln!("{} Invalid seed URL: {}", "✗".red(), url_arg);
        std::process::exit(1);
    };

    let extensions = match parse_extension_list(sub_matches.get_one::<String>("extensions").unwrap())
    {
        Ok(extensions) => extensions,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            std::process::exit(1);
        }
    };

    let depth = *sub_matches.get_one::<usize>("depth").unwrap_or(&0);
    let threads = *sub_matches.get_one::<usize>("threads").unwrap_or(&8);
    let deadline = *sub_matches.get_one::<u64>("deadline").unwrap_or(&120);
    let output = sub_matches.get_one::<std::path::PathBuf>("output");
    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);

    let min_size = parse_filter_arg(sub_matches, "min-size");
    let max_size = parse_filter_arg(sub_matches, "max-size");
    let size_filters = if min_size.is_some() || max_size.is_some() {
        Some(SizeFilters { min_size, max_size })
    } else {
        None
    };

    if !quiet {
        println!("\n🔍 Crawling {}", seed_url.bright_white());
        println!("Extensions: {}", extensions.join(", "));
        println!("Workers: {}", threads);
        println!("Max depth: {}\n", depth);
    }

    // Set up per-worker progress spinners
    let m = Arc::new(MultiProgress::new());
    let worker_bars: Arc<Mutex<HashMap<usize, ProgressBar>>> = Arc::new(Mutex::new(HashMap::new()));

    let progress_callback: Option<CrawlProgressCallback> = if quiet {
        None
    } else {
        for i in 0..threads {
            let pb = m.add(ProgressBar::new_spinner());
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.cyan} Worker {msg}")
                    .unwrap(),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb.set_message(format!("{}: idle", i));
            worker_bars.lock().await.insert(i, pb);
        }

        let worker_bars_clone = worker_bars.clone();
        Some(Arc::new(move |worker_id: usize, url: String| {
            let path = extract_url_path(&url);
            // Use try_lock to avoid blocking in async context
            if let Ok(bars) = worker_bars_clone.try_lock()
                && let Some(pb) = bars.get(&worker_id)
            {
                pb.set_message(format!("{}: {}", worker_id, path));
            }
        }))
    };

    let options = CrawlOptions {
        url: seed_url.clone(),
        extensions,
        crawl_depth: depth,
        workers: threads,
        deadline_secs: deadline,
        size_filters,
    };

    let result = execute_crawl(options, progress_callback).await;

    // Clear all progress bars
    for (_, pb) in worker_bars.lock().await.iter() {
        pb.finish_and_clear();
    }
    let _ = m.clear();

    match result {
        Ok(response) => {
            if !quiet {
                println!("\n{} Crawl complete!\n", "✓".green());
                println!("📊 Summary:");
                println!("  Files found: {}", response.files.len());
                if let Some(info) = &response.crawl_info {
                    println!("  Pages visited: {}", info.pages_visited);
                    println!("  Duration: {} ms", info.duration);
                }
                println!(
                    "  Thumbnail connections: {}\n",
                    response.thumbnail_connections.len()
                );
            }

            match output {
                Some(path) => match save_report(&response, &format, path) {
                    Ok(()) => {
                        if !quiet {
                            println!("Report saved to {}", path.display().to_string().bright_white());
                        }
                    }
                    Err(e) => {
                        eprintln!("{} {}", "✗".red(), e);
                        std::process::exit(1);
                    }
                },
                None => match generate_report(&response, &format) {
                    Ok(report) => print!("{}", report),
                    Err(e) => {
                        eprintln!("{} {}", "✗".red(), e);
                        std::process::exit(1);
                    }
                },
            }
        }
        Err(e) => {
            eprintln!("{} Crawl failed: {}", "✗".red(), e);
            std::process::exit(1);
        }
    }
}
