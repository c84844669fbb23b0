use crate::model::ExtractionResult;

/// Plain-text summary for the clipboard: client name, target macros, then
/// every meal with its foods and totals. Downstream trackers parse the
/// "Target Macros:" block, so the line shapes here are load-bearing.
pub fn clipboard_text(result: &ExtractionResult) -> String {
    let client = if result.client_name.trim().is_empty() {
        "My Plan"
    } else {
        result.client_name.as_str()
    };

    let mut out = String::new();
    out.push_str(&format!("DIET PLAN: {}\n\n", client));

    out.push_str("Target Macros:\n");
    out.push_str(&format!("Calories: {} kcal\n", result.day_total.calories));
    out.push_str(&format!("Protein: {}g\n", result.day_total.protein));
    out.push_str(&format!("Carbs: {}g\n", result.day_total.carbs));
    out.push_str(&format!("Fat: {}g\n\n", result.day_total.fat));

    for (i, meal) in result.meals.iter().enumerate() {
        out.push_str(&format!("--- {} ---\n", meal.name.to_uppercase()));

        for food in &meal.foods {
            out.push_str(&format!("• {}: {} {}", food.name, food.amount, food.unit));
            if food.macros.calories > 0 {
                out.push_str(&format!(
                    " ({}kcal | {}P | {}C | {}F)",
                    food.macros.calories,
                    food.macros.protein,
                    food.macros.carbs,
                    food.macros.fat
                ));
            }
            out.push('\n');
        }

        if meal.macros.calories > 0 {
            out.push_str(&format!(
                "MEAL TOTAL: {}kcal | {}P | {}C | {}F\n",
                meal.macros.calories, meal.macros.protein, meal.macros.carbs, meal.macros.fat
            ));
        }

        if i < result.meals.len() - 1 {
            out.push('\n');
        }
    }

    out
}
