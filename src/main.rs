use clap::Parser;
use page_harvest::parsers::navtree;
use page_harvest::{Harvest, HarvestError, HarvestReport, Result};
use std::process::ExitCode;

mod args;
use args::{Args, Command};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    env_logger::init();

    // Parse command-line arguments
    let args = Args::parse();

    match run(args.command).await {
        Ok(code) => code,
        Err(e) => {
            ::log::error!("{}", e);
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> Result<ExitCode> {
    match command {
        Command::Harvest(harvest_args) => {
            let config = harvest_args.into_config()?;
            print_webdriver_note();
            ::log::info!("Starting harvest at {}", config.start_url);

            let start_time = std::time::Instant::now();
            let report = Harvest::new(config).run().await?;
            print_report(&report);
            ::log::info!(
                "Harvest complete - {} pages in {:.2} seconds",
                report.records.len(),
                start_time.elapsed().as_secs_f64()
            );

            Ok(if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Links(links_args) => {
            let (config, listing) = links_args.into_parts()?;
            print_webdriver_note();
            let links = Harvest::new(config).list_links(&listing).await?;
            for link in links {
                println!("{}", link);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::NavLabels { file, json } => {
            let snippet =
                std::fs::read_to_string(&file).map_err(|source| HarvestError::Io {
                    path: file.clone(),
                    source,
                })?;
            let nodes = navtree::parse(&snippet)?;
            if json {
                let rendered = serde_json::to_string_pretty(&nodes)
                    .map_err(|e| HarvestError::Config(e.to_string()))?;
                println!("{}", rendered);
            } else {
                for label in nodes.iter().flat_map(|n| n.labels()) {
                    println!("{}", label);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn print_webdriver_note() {
    ::log::debug!(
        "Browser automation requires a WebDriver server (e.g., ChromeDriver); \
         set WEBDRIVER_URL if not using the default http://localhost:4444"
    );
}

fn print_report(report: &HarvestReport) {
    for record in &report.records {
        println!("[{}] {} ({})", record.sequence, record.title, record.url);
        for path in &record.artifacts {
            println!("    {}", path.display());
        }
    }
    match (report.stop_reason(), report.error()) {
        (Some(reason), _) => println!("Finished: {}", reason),
        (None, Some(err)) => println!("Aborted: {}", err),
        (None, None) => {}
    }
}
