use anyhow::{Context, Result};
use pantry_ai::cli::{parse_args, Command};
use pantry_ai::config::AppConfig;
use pantry_ai::logging::init_logging;
use pantry_ai::recipe::Ingredient;
use pantry_ai::server::serve;
use pantry_ai::service::PantryService;
use serde::Serialize;
use serde_json::json;

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = parse_args();
    let mut config = AppConfig::from_env();
    cli.apply_overrides(&mut config);
    init_logging(&config.log_level, config.log_format).context("Failed to initialize logging")?;

    let service = PantryService::from_config(&config)
        .await
        .context("Failed to initialize services")?;

    match cli.command {
        Command::Serve { .. } => serve(&config, service).await?,
        Command::Search {
            ingredients,
            diet,
            top_n,
        } => {
            let recipes = service.search(&ingredients, top_n, diet.as_deref());
            print_json(&json!({
                "count": recipes.len(),
                "recipes": recipes,
                "ingredients_searched": ingredients,
            }))?;
        }
        Command::Plan { ingredients, diet } => {
            print_json(&service.meal_plan(&ingredients, diet.as_deref()))?;
        }
        Command::Generate {
            ingredients,
            diet,
            cuisine,
        } => {
            let recipe = service.generate_recipe(&ingredients, &diet, &cuisine).await;
            print_json(&recipe)?;
        }
        Command::Nutrition { ingredients, title } => {
            let ingredients: Vec<Ingredient> = ingredients.into_iter().map(Ingredient::from).collect();
            let nutrition = service.analyze_nutrition(&title, &ingredients).await;
            print_json(&json!({ "nutrition": nutrition, "recipe_title": title }))?;
        }
        Command::Clusters => match service.clusters() {
            Ok(clusters) => print_json(&clusters)?,
            Err(e) => print_json(&json!({ "error": e.to_string() }))?,
        },
    }

    Ok(())
}
