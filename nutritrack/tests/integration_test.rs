//! Integration tests for nutritrack
//!
//! These tests run the gateway against a file-backed store:
//! - Catalogue round trips and search
//! - Logging, re-scaling and ordering of consumption events
//! - The recipe workflow from in-progress lines to a catalogue food

use chrono::{Duration, FixedOffset, TimeZone, Utc};
use nutritrack::config::SENTINEL_FOOD_ID;
use nutritrack::database::{CatalogueOrder, NewCatalogueFood, Store};
use nutritrack::nutrients::{NutrientRecord, NUTRIENT_COUNT};
use nutritrack::services::{Gateway, RecipeService};
use nutritrack::timestamp::{encode, DisplayFormat};
use tempfile::TempDir;

/// Helper to create a gateway over a fresh store file
async fn create_test_gateway() -> (Gateway, Store, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let store = Store::open(&db_path).await.unwrap();
    let gateway = Gateway::new(&store, DisplayFormat::default());

    (gateway, store, temp_dir)
}

fn nutrients(base: f64) -> NutrientRecord {
    let mut values = [0.0; NUTRIENT_COUNT];
    for (i, value) in values.iter_mut().enumerate() {
        *value = base + i as f64 * 1.11;
    }
    NutrientRecord::from_array(values)
}

fn new_food(description: &str, base: f64) -> NewCatalogueFood {
    NewCatalogueFood {
        description: description.to_string(),
        nutrients: nutrients(base),
    }
}

#[tokio::test]
async fn test_catalogue_crud_operations() {
    let (gateway, _store, _temp) = create_test_gateway().await;

    // Create
    let id = gateway
        .insert_catalogue_food_returning_id(&new_food("Banana, raw", 12.5))
        .await
        .unwrap();

    // Read
    let food = gateway.get_catalogue_food_by_id(id).await.unwrap();
    assert_eq!(food.description, "Banana, raw");
    assert_eq!(food.nutrients, nutrients(12.5));

    // Update
    let mut edited = food.clone();
    edited.description = "Banana, ripe".to_string();
    edited.nutrients = nutrients(20.0);
    assert!(gateway.update_catalogue_food(&edited).await);
    assert_eq!(gateway.get_catalogue_food_by_id(id).await.unwrap(), edited);

    // List
    assert!(gateway.insert_catalogue_food(&new_food("Apple", 1.0)).await);
    let foods = gateway
        .list_catalogue_foods(CatalogueOrder::IdDescending)
        .await;
    assert_eq!(foods.len(), 2);
    assert_eq!(foods[0].description, "Apple");

    // Delete
    assert!(gateway.delete_catalogue_food(id).await);
    assert!(gateway.get_catalogue_food_by_id(id).await.is_none());
    assert!(!gateway.delete_catalogue_food(id).await);
}

#[tokio::test]
async fn test_search_functionality() {
    let (gateway, _store, _temp) = create_test_gateway().await;

    for name in ["Milk, whole", "Milk, skim", "Oat milk", "Bread"] {
        assert!(gateway.insert_catalogue_food(&new_food(name, 1.0)).await);
    }

    assert_eq!(gateway.search_catalogue_foods("Milk").await.len(), 2);
    assert_eq!(gateway.search_catalogue_foods("milk").await.len(), 1);
    assert!(gateway.search_catalogue_foods("Cheese").await.is_empty());
}

#[tokio::test]
async fn test_logging_workflow() {
    let (gateway, _store, _temp) = create_test_gateway().await;
    let id = gateway
        .insert_catalogue_food_returning_id(&new_food("Chicken breast", 5.0))
        .await
        .unwrap();
    let chicken = gateway.get_catalogue_food_by_id(id).await.unwrap();

    let offset = FixedOffset::east_opt(10 * 3600).unwrap();
    let lunch = offset.with_ymd_and_hms(2024, 6, 3, 12, 15, 0).unwrap();
    let dinner = lunch + Duration::hours(7);

    let lunch_id = gateway
        .log_food_returning_id(&chicken, 100.0, &lunch)
        .await
        .unwrap();
    let dinner_id = gateway
        .log_food_returning_id(&chicken, 250.0, &dinner)
        .await
        .unwrap();

    let entries = gateway.list_logged_foods().await;
    assert_eq!(
        entries.iter().map(|e| e.eaten_id).collect::<Vec<_>>(),
        vec![dinner_id, lunch_id]
    );

    let lunch_entry = &entries[1];
    assert_eq!(lunch_entry.date_eaten, "03/06/2024");
    assert_eq!(lunch_entry.time_eaten, "12:15");
    assert_eq!(lunch_entry.eaten_ts, encode(&lunch));
    assert_eq!(lunch_entry.nutrients, chicken.nutrients.rounded());

    // Halve the dinner portion
    let dinner_entry = &entries[0];
    assert!(gateway.update_logged_food(dinner_entry, 125.0, &dinner).await);
    let updated = gateway.get_logged_food_by_id(dinner_id).await.unwrap();
    for (after, before) in updated
        .nutrients
        .to_array()
        .iter()
        .zip(dinner_entry.nutrients.to_array())
    {
        assert!((after - before / 2.0).abs() <= 0.01 + 1e-9);
    }

    assert!(gateway.delete_logged_food(lunch_id).await);
    assert_eq!(gateway.list_logged_foods().await.len(), 1);
}

#[tokio::test]
async fn test_log_survives_catalogue_delete() {
    let (gateway, _store, _temp) = create_test_gateway().await;
    let id = gateway
        .insert_catalogue_food_returning_id(&new_food("Tea", 0.2))
        .await
        .unwrap();
    let tea = gateway.get_catalogue_food_by_id(id).await.unwrap();

    assert!(gateway.log_food(&tea, 250.0, &Utc::now()).await);
    assert!(gateway.delete_catalogue_food(id).await);

    let entries = gateway.list_logged_foods().await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].description, "Tea");
}

#[tokio::test]
async fn test_recipe_finalization() {
    let (gateway, _store, _temp) = create_test_gateway().await;
    let recipes = RecipeService::new(gateway.clone());

    let rice_id = gateway
        .insert_catalogue_food_returning_id(&new_food("Rice", 3.0))
        .await
        .unwrap();
    let beans_id = gateway
        .insert_catalogue_food_returning_id(&new_food("Beans", 8.0))
        .await
        .unwrap();
    let rice = gateway.get_catalogue_food_by_id(rice_id).await.unwrap();
    let beans = gateway.get_catalogue_food_by_id(beans_id).await.unwrap();

    assert!(recipes.add_ingredient(&rice, 150.0).await);
    assert!(recipes.add_ingredient(&beans, 50.0).await);
    let in_progress = gateway.list_in_progress_recipe_lines().await;
    assert_eq!(in_progress.len(), 2);

    let dish_id = recipes.finalize("Rice and beans").await.unwrap();

    assert!(gateway.list_in_progress_recipe_lines().await.is_empty());
    let attached = gateway.list_recipe_lines_by_food_id(dish_id).await;
    assert_eq!(attached.len(), 2);
    for (line, before) in attached.iter().zip(&in_progress) {
        assert_eq!(line.recipe_id, before.recipe_id);
        assert_eq!(line.nutrients, before.nutrients);
        assert_ne!(line.food_id, SENTINEL_FOOD_ID);
    }

    let dish = gateway.get_catalogue_food_by_id(dish_id).await.unwrap();
    // 150g of rice + 50g of beans normalized to 100g: (1.5 * 3 + 0.5 * 8) / 2
    assert!((dish.nutrients.energy - 4.25).abs() <= 0.01 + 1e-9);

    assert!(recipes.delete_recipe_food(dish_id).await);
    assert!(gateway.list_recipe_lines_by_food_id(dish_id).await.is_empty());
}

#[tokio::test]
async fn test_store_reopen_preserves_data() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("persist.db");

    let store = Store::open(&db_path).await.unwrap();
    let gateway = Gateway::new(&store, DisplayFormat::default());
    let id = gateway
        .insert_catalogue_food_returning_id(&new_food("Egg", 6.0))
        .await
        .unwrap();
    store.close().await;

    let store = Store::open(&db_path).await.unwrap();
    let gateway = Gateway::new(&store, DisplayFormat::default());
    let egg = gateway.get_catalogue_food_by_id(id).await.unwrap();
    assert_eq!(egg.nutrients, nutrients(6.0));
}

#[tokio::test]
async fn test_concurrent_writers_share_one_store() {
    let (gateway, _store, _temp) = create_test_gateway().await;

    let mut handles = Vec::new();
    for i in 0..10 {
        let gateway = gateway.clone();
        handles.push(tokio::spawn(async move {
            gateway
                .insert_catalogue_food(&new_food(&format!("Food {}", i), i as f64))
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap());
    }

    assert_eq!(
        gateway
            .list_catalogue_foods(CatalogueOrder::Unordered)
            .await
            .len(),
        10
    );
}
