mod db;
mod dom;
mod export;
mod message;
mod model;
mod parser;

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::dom::HtmlPage;
use crate::message::{handle, Request};
use crate::model::ExtractionResult;

#[derive(Parser)]
#[command(
    name = "plan_scrape",
    about = "Extract structured meal-plan data from saved diet-coaching pages"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract meal-plan data from a saved page snapshot
    Scrape {
        /// Path to a saved HTML snapshot of the plan page
        input: PathBuf,
        /// Print the full extraction result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check that the extraction endpoint responds
    Ping,
    /// Show the last stored extraction
    Show,
    /// Export the last extraction (or a fresh one with --input)
    Export {
        /// Output format
        #[arg(value_enum)]
        format: ExportFormat,
        /// Re-scrape this snapshot instead of using the stored result
        #[arg(long)]
        input: Option<PathBuf>,
        /// Write here instead of the default file name
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the client name on the export
        #[arg(long)]
        client_name: Option<String>,
        /// Daily water goal in gallons
        #[arg(long)]
        water_goal: Option<String>,
        /// Leave collected meal notes out of the document export
        #[arg(long)]
        no_notes: bool,
        /// Leave the food-swap appendix out of the document export
        #[arg(long)]
        no_swaps: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    /// Full result as pretty-printed JSON
    Json,
    /// Plain-text summary for the clipboard
    Text,
    /// Paginated client-facing plan document
    Document,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scrape { input, json } => {
            let data = scrape_snapshot(&input)?;

            let conn = db::connect()?;
            db::init_schema(&conn)?;
            db::save_last_extraction(&conn, &data)?;

            println!(
                "Found {} meals ({} foods) for {}",
                data.meals.len(),
                data.food_count(),
                data.client_name
            );
            print_summary(&data);
            if json {
                println!("{}", export::to_json(&data)?);
            }
            Ok(())
        }
        Commands::Ping => {
            let response = handle(Request::Ping, None);
            println!("{}", response.message.unwrap_or_else(|| "ok".into()));
            Ok(())
        }
        Commands::Show => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;
            match db::load_last_extraction(&conn)? {
                Some(data) => {
                    println!(
                        "Last extraction for {} at {}",
                        data.client_name, data.extracted_at
                    );
                    print_summary(&data);
                }
                None => println!("No stored extraction. Run 'scrape' first."),
            }
            Ok(())
        }
        Commands::Export {
            format,
            input,
            output,
            client_name,
            water_goal,
            no_notes,
            no_swaps,
        } => {
            let conn = db::connect()?;
            db::init_schema(&conn)?;

            let data = match input {
                Some(path) => {
                    let fresh = scrape_snapshot(&path)?;
                    db::save_last_extraction(&conn, &fresh)?;
                    fresh
                }
                None => db::load_last_extraction(&conn)?
                    .context("no stored extraction; run 'scrape' first or pass --input")?,
            };

            let mut settings = db::load_settings(&conn)?;
            if let Some(name) = client_name {
                settings.client_name = Some(name);
            }
            if let Some(goal) = water_goal {
                settings.water_goal = goal;
            }
            if no_notes {
                settings.include_notes = false;
            }
            if no_swaps {
                settings.include_swaps = false;
            }
            db::save_settings(&conn, &settings)?;

            let opts = export::ExportOptions::resolve(&settings, &data);
            let (content, default_name) = match format {
                ExportFormat::Json => (
                    export::to_json(&data)?,
                    Some(export::file_name(&opts.client_name, ".json")),
                ),
                ExportFormat::Text => (export::text::clipboard_text(&data), None),
                ExportFormat::Document => (
                    export::document::render(&data, &opts),
                    Some(export::file_name(&opts.client_name, "_meal_plan.txt")),
                ),
            };

            match output.or(default_name.map(PathBuf::from)) {
                Some(path) => {
                    std::fs::write(&path, content)
                        .with_context(|| format!("writing export to {}", path.display()))?;
                    println!("Wrote {}", path.display());
                }
                None => print!("{}", content),
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {:.1}s", elapsed.as_secs_f64());
    }

    result
}

/// Load a saved page and run the scrape command against it. A missing or
/// unreadable snapshot is a transport-level error; a failure reported by the
/// extraction endpoint is a structured one. Both are distinct from an empty
/// but successful result.
fn scrape_snapshot(path: &Path) -> Result<ExtractionResult> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read page snapshot {}", path.display()))?;
    let page = HtmlPage::parse(&html);

    let response = handle(Request::Scrape, Some(&page));
    if !response.success {
        bail!(
            "extraction failed: {}",
            response.error.unwrap_or_else(|| "unknown error".into())
        );
    }
    response
        .data
        .context("extraction endpoint returned success without data")
}

fn print_summary(data: &ExtractionResult) {
    if !data.day_total.is_zero() {
        println!(
            "Day total: {} kcal | {}P | {}C | {}F",
            data.day_total.calories,
            data.day_total.protein,
            data.day_total.carbs,
            data.day_total.fat
        );
    }

    if data.meals.is_empty() {
        println!("No meals recognized on this page.");
        return;
    }

    println!(
        "{:>3} | {:<28} | {:>5} | {:>6} | {:>6} | {:>6} | {:>6}",
        "#", "Meal", "Foods", "kcal", "P", "C", "F"
    );
    println!("{}", "-".repeat(78));
    for (i, meal) in data.meals.iter().enumerate() {
        println!(
            "{:>3} | {:<28} | {:>5} | {:>6} | {:>6} | {:>6} | {:>6}",
            i + 1,
            truncate(&meal.name, 28),
            meal.foods.len(),
            meal.macros.calories,
            meal.macros.protein,
            meal.macros.carbs,
            meal.macros.fat
        );
    }

    if !data.meal_notes.is_empty() {
        println!("{} note(s) collected.", data.meal_notes.len());
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}
