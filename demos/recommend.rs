//! Builds a recommender from a small inline dataset and runs a few queries.
//!
//! Run with `cargo run --example recommend`.

use anyhow::Result;

use meal_match::config::MatchConfig;
use meal_match::corpus_builder::CorpusBuilder;
use meal_match::pipeline::{
    format_match_for_display, format_ranked_for_display, format_steps_for_display,
    format_suggestions_for_display,
};
use meal_match::recommender::Recommender;

const RECIPES: &str = "\
Title,Ingredients,Instructions
Roast Chicken,\"['1 whole chicken', '2 tsp salt', '1 tsp black pepper', '1 lemon']\",Season the chicken. Stuff with lemon. Roast for an hour.
Lemon Pasta,\"['200 g pasta', '1 lemon', '2 tbsp butter', 'salt']\",Boil the pasta. Toss with butter and lemon.
Garlic Bread,\"['1 baguette', '3 cloves garlic', '4 tbsp butter']\",Mash garlic into butter. Spread on bread. Bake!
";

fn main() -> Result<()> {
    env_logger::init();

    let tuning = MatchConfig::default();
    let artifacts = CorpusBuilder::new().build(RECIPES.as_bytes())?;
    let recommender = Recommender::new(artifacts, 4);

    for query in ["chicken, salt, lemon", "butter and garlic", "rice"] {
        println!("== {query}");
        let result = recommender.best_match(query, tuning.min_matches);
        print!("{}", format_match_for_display(&result));
        if let Some(dish) = &result.dish {
            let steps = recommender.recipe_steps(dish, tuning.max_steps);
            print!("{}", format_steps_for_display(dish, &steps));
        }
        print!(
            "{}",
            format_ranked_for_display(&recommender.ranked_matches(query, 3, tuning.alpha))
        );
        println!();
    }

    print!(
        "{}",
        format_suggestions_for_display(&recommender.next_word_suggestions("black", 3))
    );
    Ok(())
}
