use anyhow::Context;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use tracing::info;
use validator::Validate;

use crate::cli::{utils::{open_pool, output_success}, OutputFormat};
use crate::services::menu_service::{self, CreateCategoryInput, CreateItemInput};
use crate::services::restaurant_service::{self, CreateRestaurantInput};
use crate::services::ServiceError;
use crate::state::AppState;

/// Layout of a seed file.
///
/// ```yaml
/// restaurant:
///   slug: casa-ordo
///   name: Casa Ordo
///   openingHours:
///     monday: { open: "12:00", close: "22:00" }
/// categories:
///   - name: Tacos
///     sortOrder: 1
///     items:
///       - name: Pastor
///         price: "85.00"
/// ```
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub restaurant: Option<CreateRestaurantInput>,
    #[serde(default)]
    pub categories: Vec<SeedCategory>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    #[serde(flatten)]
    pub category: CreateCategoryInput,
    /// Item bodies without `categoryId`; it is filled in from the parent.
    #[serde(default)]
    pub items: Vec<serde_yaml::Mapping>,
}

pub fn parse(source: &str) -> anyhow::Result<SeedFile> {
    Ok(serde_yaml::from_str(source)?)
}

pub async fn handle(file: &Path, output_format: OutputFormat) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let seed = parse(&source).with_context(|| format!("parsing {}", file.display()))?;

    let state = AppState::postgres(open_pool().await?);
    let (categories, items) = apply(&state, seed).await?;

    output_success(
        output_format,
        &format!("Seeded {} categories and {} items", categories, items),
        Some(json!({ "categories": categories, "items": items })),
    )
}

/// Insert everything in `seed`. An existing active restaurant is left alone.
pub async fn apply(state: &AppState, seed: SeedFile) -> anyhow::Result<(usize, usize)> {
    if let Some(restaurant) = seed.restaurant {
        restaurant.validate()?;
        match restaurant_service::create(state, restaurant).await {
            Ok(config) => info!("Seeded restaurant {}", config.slug),
            Err(ServiceError::Conflict(message)) => info!("Skipping restaurant: {}", message),
            Err(e) => return Err(e.into()),
        }
    }

    let mut item_count = 0;
    let category_count = seed.categories.len();
    for SeedCategory { category, items } in seed.categories {
        category.validate()?;
        let category = menu_service::create_category(state, category).await?;

        for mut item in items {
            item.insert("categoryId".into(), category.id.to_string().into());
            let input: CreateItemInput = serde_yaml::from_value(serde_yaml::Value::Mapping(item))
                .with_context(|| format!("item in category {}", category.name))?;
            input.validate()?;
            menu_service::create_item(state, input).await?;
            item_count += 1;
        }
    }

    Ok((category_count, item_count))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_categories() {
        let seed = parse(
            r#"
categories:
  - name: Tacos
    sortOrder: 2
    items:
      - name: Pastor
        price: "85.00"
      - name: Suadero
        price: "80.00"
"#,
        )
        .unwrap();

        assert!(seed.restaurant.is_none());
        assert_eq!(seed.categories.len(), 1);
        assert_eq!(seed.categories[0].category.name, "Tacos");
        assert_eq!(seed.categories[0].category.sort_order, 2);
        assert_eq!(seed.categories[0].items.len(), 2);
    }
}
