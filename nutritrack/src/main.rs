// Nutritrack - nutrient intake tracker
// Command-line entry point over the persistence gateway

use anyhow::{bail, Context, Result};
use chrono::Local;
use nutritrack::app::{init_logging, AppState};
use nutritrack::config::AppConfig;
use nutritrack::database::CatalogueOrder;
use serde::Serialize;

const USAGE: &str = "usage:
  nutritrack foods [substring]      list catalogue foods, or search by substring
  nutritrack log <food_id> <amount> log an amount of a catalogue food eaten now
  nutritrack history                list logged foods, most recent first
  nutritrack unlog <eaten_id>       delete a logged food";

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_arg<T>(value: Option<&String>, name: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw = value.with_context(|| format!("missing <{}>\n{}", name, USAGE))?;
    raw.parse()
        .with_context(|| format!("invalid <{}>: {}", name, raw))
}

async fn run(state: &AppState, args: &[String]) -> Result<()> {
    let gateway = state.gateway().await?;

    match args.first().map(String::as_str) {
        Some("foods") => {
            let foods = match args.get(1).map(|s| s.trim()) {
                Some(substring) if !substring.is_empty() => {
                    gateway.search_catalogue_foods(substring).await
                }
                _ => gateway.list_catalogue_foods(CatalogueOrder::IdDescending).await,
            };
            print_json(&foods)
        }
        Some("log") => {
            let food_id: i64 = parse_arg(args.get(1), "food_id")?;
            let amount: f64 = parse_arg(args.get(2), "amount")?;
            if amount <= 0.0 {
                bail!("amount must be greater than zero");
            }

            let food = gateway
                .get_catalogue_food_by_id(food_id)
                .await
                .with_context(|| format!("no catalogue food with id {}", food_id))?;

            if !gateway.log_food(&food, amount, &Local::now()).await {
                bail!("failed to log {}", food.description);
            }
            tracing::info!("Logged {} of {}", amount, food.description);
            Ok(())
        }
        Some("history") => print_json(&gateway.list_logged_foods().await),
        Some("unlog") => {
            let eaten_id: i64 = parse_arg(args.get(1), "eaten_id")?;
            if !gateway.delete_logged_food(eaten_id).await {
                bail!("no logged food with id {}", eaten_id);
            }
            Ok(())
        }
        _ => bail!("{}", USAGE),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::from_env().await?;
    init_logging(&config.log_filter);

    tracing::info!("Starting nutritrack");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let state = AppState::new(config);

    let result = run(&state, &args).await;
    state.shutdown().await;
    result
}
