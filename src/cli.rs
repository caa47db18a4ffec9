use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;

#[derive(Parser, Debug)]
#[command(author, version, about = "Pantry-based recipe recommendations", long_about = None)]
pub struct Cli {
    /// Path to the recipe JSON file (overrides RECIPES_PATH)
    #[arg(short, long, global = true)]
    pub recipes: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Rank stored recipes against your ingredients
    Search {
        /// Comma-separated ingredients
        #[arg(short, long, value_delimiter = ',', required = true)]
        ingredients: Vec<String>,
        /// vegetarian, vegan or gluten-free
        #[arg(short, long)]
        diet: Option<String>,
        #[arg(short = 'n', long, default_value_t = 5)]
        top_n: usize,
    },
    /// Build a weekly meal plan and shopping list
    Plan {
        #[arg(short, long, value_delimiter = ',', required = true)]
        ingredients: Vec<String>,
        #[arg(short, long)]
        diet: Option<String>,
    },
    /// Generate a new recipe
    Generate {
        #[arg(short, long, value_delimiter = ',', required = true)]
        ingredients: Vec<String>,
        #[arg(short, long, default_value = "")]
        diet: String,
        #[arg(short, long, default_value = "")]
        cuisine: String,
    },
    /// Estimate nutrition for a list of ingredients
    Nutrition {
        #[arg(short, long, value_delimiter = ',', required = true)]
        ingredients: Vec<String>,
        #[arg(short, long, default_value = "Generated Recipe")]
        title: String,
    },
    /// Show recipe clusters
    Clusters,
}

impl Cli {
    /// Command-line values win over the environment.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(path) = &self.recipes {
            config.recipes_path = path.clone();
        }
        if let Command::Serve { host, port } = &self.command {
            if let Some(host) = host {
                config.host = host.clone();
            }
            if let Some(port) = port {
                config.port = *port;
            }
        }
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_splits_ingredients() {
        let cli = Cli::try_parse_from([
            "pantry-ai",
            "search",
            "--ingredients",
            "chicken,rice",
            "--diet",
            "vegan",
        ])
        .unwrap();
        match cli.command {
            Command::Search {
                ingredients,
                diet,
                top_n,
            } => {
                assert_eq!(ingredients, vec!["chicken", "rice"]);
                assert_eq!(diet.as_deref(), Some("vegan"));
                assert_eq!(top_n, 5);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let cli = Cli::try_parse_from([
            "pantry-ai",
            "serve",
            "--port",
            "8081",
            "--recipes",
            "/tmp/r.json",
        ])
        .unwrap();
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.port, 8081);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.recipes_path, PathBuf::from("/tmp/r.json"));
    }

    #[test]
    fn test_ingredients_required() {
        assert!(Cli::try_parse_from(["pantry-ai", "plan"]).is_err());
    }
}
