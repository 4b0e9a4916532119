use std::env;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use meal_match::config::AppConfig;
use meal_match::pipeline::{
    self, format_match_for_display, format_ranked_for_display, format_steps_for_display,
    format_suggestions_for_display,
};
use meal_match::recommender::Recommender;

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    info!("Starting meal matcher");

    let config = AppConfig::from_env().context("Invalid configuration")?;
    let (recommender, source) = pipeline::load_or_build(&config)?;

    info!(
        recipes = recommender.recipe_count(),
        source = %source,
        "Ready for queries"
    );

    println!("Enter the ingredients you have, separated by commas.");
    println!("Start a line with '?' to autocomplete an ingredient list. Empty line quits.");

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            break;
        }

        let response = match line.strip_prefix('?') {
            Some(partial) => format_suggestions_for_display(
                &recommender.next_word_suggestions(partial, config.matching.suggestions),
            ),
            None => answer_query(&recommender, &config, line),
        };
        writeln!(stdout, "{}", response)?;
    }

    info!("Goodbye");
    Ok(())
}

fn answer_query(recommender: &Recommender, config: &AppConfig, line: &str) -> String {
    let matching = &config.matching;
    let result = recommender.best_match(line, matching.min_matches);
    let mut output = format_match_for_display(&result);

    if let Some(dish) = &result.dish {
        let steps = recommender.recipe_steps(dish, matching.max_steps);
        output.push('\n');
        output.push_str(&format_steps_for_display(dish, &steps));
    }

    let alternatives: Vec<_> = recommender
        .ranked_matches(line, matching.top_k, matching.alpha)
        .into_iter()
        .filter(|ranked| Some(&ranked.title) != result.dish.as_ref())
        .collect();
    if !alternatives.is_empty() {
        output.push('\n');
        output.push_str(&format_ranked_for_display(&alternatives));
    }

    output
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("MEAL_MATCH_LOG_JSON").map(|v| v == "1").unwrap_or(false);

    // Logs go to stderr so query output on stdout stays clean.
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
}
