pub mod food;
pub mod macro_text;
pub mod meals;
pub mod page;

use chrono::Utc;
use tracing::info;

use crate::dom::NodeView;
use crate::model::ExtractionResult;

/// One full extraction pass: page-level fields, meal blocks, notes.
///
/// Read-only over the document and stateless across calls; every invocation
/// builds a fresh result. Structural misses degrade to zero/empty values,
/// they never fail the run.
pub fn scrape_meal_plan<N: NodeView>(root: &N) -> ExtractionResult {
    info!("starting meal plan extraction");

    let client_name = page::extract_client_name(root);
    info!(client = %client_name, "client name resolved");

    let day_total = page::extract_day_total(root);
    let meals = meals::extract_meals(root);
    info!(meals = meals.len(), "meals extracted");

    let meal_notes = page::extract_meal_notes(root);
    info!(notes = meal_notes.len(), "notes collected");

    ExtractionResult {
        client_name,
        // Day total doubles as the macro target; an independent copy so the
        // two can be adjusted separately downstream.
        target_macros: day_total.clone(),
        day_total,
        meals,
        meal_notes,
        extracted_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlPage;
    use crate::model::MacroSet;

    fn scrape_fixture(name: &str) -> ExtractionResult {
        let html = std::fs::read_to_string(format!("tests/fixtures/{}.html", name)).unwrap();
        let page = HtmlPage::parse(&html);
        scrape_meal_plan(&page.root())
    }

    #[test]
    fn cards_fixture_full_scenario() {
        let result = scrape_fixture("cards");

        assert_eq!(result.client_name, "Jane Doe");
        assert_eq!(
            result.day_total,
            MacroSet {
                protein: 180.0,
                carbs: 220.0,
                fat: 70.0,
                calories: 2200
            }
        );
        assert_eq!(result.target_macros, result.day_total);

        assert_eq!(result.meals.len(), 3);

        // Breakfast: no total row, macros are the field-wise sum of foods.
        let breakfast = &result.meals[0];
        assert!(breakfast.name.starts_with("Breakfast"));
        assert_eq!(breakfast.time.as_deref(), Some("08:00 in the early morning"));
        assert_eq!(breakfast.foods.len(), 2);
        assert_eq!(breakfast.foods[0].name, "Chicken Breast");
        assert_eq!(breakfast.foods[0].amount, 150.0);
        assert_eq!(breakfast.foods[1].name, "Oats");
        assert_eq!(
            breakfast.macros,
            MacroSet {
                protein: 50.0,
                carbs: 50.0,
                fat: 11.0,
                calories: 550
            }
        );

        // Lunch: explicit MEAL TOTAL row taken verbatim, not the food sum.
        let lunch = &result.meals[1];
        assert!(lunch.name.starts_with("Lunch"));
        assert_eq!(lunch.foods.len(), 2);
        assert_eq!(
            lunch.macros,
            MacroSet {
                protein: 50.0,
                carbs: 60.0,
                fat: 10.0,
                calories: 600
            }
        );
        assert_ne!(lunch.macros, MacroSet::sum_of(&lunch.foods));

        // Snack: case/whitespace-differing duplicates merged into one food.
        let snack = &result.meals[2];
        assert_eq!(snack.foods.len(), 1);
        assert_eq!(snack.foods[0].name, "Almonds");
        assert_eq!(snack.foods[0].amount, 20.0);
        assert_eq!(snack.foods[0].macros.calories, 120);
        assert_eq!(snack.macros.calories, 120);

        assert_eq!(result.meal_notes.len(), 1);
        assert!(result.meal_notes[0].contains("water"));
    }

    #[test]
    fn table_fixture_uses_table_fallback() {
        let result = scrape_fixture("table");
        assert_eq!(result.client_name, "Mark Johnson");
        assert_eq!(result.day_total, MacroSet::default());
        assert_eq!(result.meals.len(), 2);
        assert_eq!(result.meals[0].macros.calories, 480);
        assert_eq!(result.meals[1].macros.calories, 620);
        assert!(result.meal_notes.is_empty());
    }

    #[test]
    fn target_macros_is_an_independent_copy() {
        let mut result = scrape_fixture("cards");
        result.day_total.calories = 1;
        result.day_total.protein = 1.0;
        assert_eq!(result.target_macros.calories, 2200);
        assert_eq!(result.target_macros.protein, 180.0);
    }

    #[test]
    fn empty_page_yields_empty_result_shape() {
        let page = HtmlPage::parse("<html><body></body></html>");
        let result = scrape_meal_plan(&page.root());
        assert_eq!(result.client_name, super::page::CLIENT_NAME_PLACEHOLDER);
        assert!(result.day_total.is_zero());
        assert!(result.meals.is_empty());
        assert!(result.meal_notes.is_empty());
    }
}
