use crate::export::ExportOptions;
use crate::model::ExtractionResult;

/// Line budget per rendered page and wrap width, the text stand-ins for the
/// source document's physical page height and margins.
const PAGE_LINES: usize = 48;
const PAGE_WIDTH: usize = 72;

/// Coaching guidance printed on the cover of every plan.
const INTRO_PARAGRAPHS: &[&str] = &[
    "Sample meal plan: you don't have to follow this but it's a great place to start and follows your Macros. Use the food tracker in the app and plug in different foods. Anything with the red icon next to it in the app shows that the macros are verified.",
    "(Most of the green veggies are for fiber and micronutrients. They aren't a \"must\" but it's good to have but not necessary and will keep you fuller and more satisfied) but definitely get in the habit of tracking everything you put in your body. This is simply a guide. Once you get used to tracking it's easy! Just like everything it takes practice to get good!",
    "Diet drinks are fine along with water flavoring as long as it's 0/calorie (aim for a gallon a day) and Splenda and Truvia are completely fine! (Unless you have an allergy) Unless you are eating bags of this stuff at a time you will have no adverse effects!",
    "Also go with light dressings (skinny girl brand has great ones), and sugar free /ok low sugar condiments as much as you can. Walden Farms brand makes a zero calorie Ranch...it's not the best...but probably not the worst!",
    "Also use popcorn seasonings to help change the flavor of things. I use cheddar and ranch a lot!. You can also add green veggies like Green beans and Salads to any meal. Anything under 15 calories we don't really track unless we are in a hard prep.",
    "You may also invest in a travel on the go bag. I have an Isobag it's a lifesaver and if you have food and you bring them with you...I promise you will stay on target so so so much easier. Being prepared is the key to this! Just know microwaves are everywhere. Gas stations, offices, school, everywhere. So if you have your food you are ready! This bags are so worth it!",
];

/// Macro-equivalent substitutions offered in the appendix.
const FOOD_SWAPS: &[(&str, &str)] = &[
    (
        "Protein swaps:",
        "Chicken breast <-> ground turkey <-> cod <-> shrimp <-> Whey Isolate",
    ),
    (
        "Carb swaps:",
        "Sweet potato <-> yellow potatoes <-> quinoa <-> cream of rice",
    ),
    (
        "Fat swaps:",
        "Coconut oil <-> olive oil <-> avocado (weigh carefully)",
    ),
];

/// Render the paginated plan document: cover header, intro guidance, water
/// goal and target-macros box, one block per meal, daily totals, then the
/// optional swap appendix and collected notes.
pub fn render(result: &ExtractionResult, opts: &ExportOptions) -> String {
    let mut doc = PageBuilder::new();

    let rule = "=".repeat(PAGE_WIDTH);
    doc.push(rule.clone());
    doc.push(format!("  {} - DAILY MEAL PLAN", opts.client_name.to_uppercase()));
    doc.push(rule);
    doc.blank();

    for para in INTRO_PARAGRAPHS {
        let lines = wrap(para, PAGE_WIDTH);
        doc.ensure_space(lines.len() + 1);
        for line in lines {
            doc.push(line);
        }
        doc.blank();
    }

    doc.ensure_space(8);
    doc.push(format!(
        "Water Goal: {} gallon a day. (Get a jug. You can use water flavoring)",
        opts.water_goal
    ));
    doc.blank();
    doc.push("Target Macros:".to_string());
    doc.push(format!("  Protein: ~{} g", result.day_total.protein));
    doc.push(format!("  Carbs: ~{} g", result.day_total.carbs));
    doc.push(format!("  Fat: ~{} g", result.day_total.fat));
    doc.push(format!("  Total Calories: ~{}", result.day_total.calories));
    doc.blank();

    for meal in &result.meals {
        doc.ensure_space(4 + meal.foods.len());
        doc.push(meal_title(&meal.name, meal.time.as_deref()));
        doc.push("-".repeat(PAGE_WIDTH / 2));
        for food in &meal.foods {
            doc.push(format!("  • {} - {} {}", food.name, food.amount, food.unit));
        }
        if meal.macros.calories > 0 {
            doc.push(format!(
                "  Macros: {}P / {}C / {}F",
                meal.macros.protein.round(),
                meal.macros.carbs.round(),
                meal.macros.fat.round()
            ));
        }
        doc.blank();
    }

    doc.ensure_space(6);
    doc.push("DAILY MACRO TOTALS".to_string());
    doc.push(format!("  • Protein: ~{} g", result.day_total.protein));
    doc.push(format!("  • Carbs: ~{} g", result.day_total.carbs));
    doc.push(format!("  • Fat: ~{} g", result.day_total.fat));
    doc.push(format!("  • Calories: ~{}", result.day_total.calories));
    doc.blank();

    if opts.include_swaps {
        doc.ensure_space(2 + FOOD_SWAPS.len() * 3);
        doc.push("OPTIONAL FOOD SWAPS (Same Macros)".to_string());
        doc.blank();
        for (label, items) in FOOD_SWAPS {
            doc.push(label.to_string());
            for line in wrap(&format!("  • {}", items), PAGE_WIDTH) {
                doc.push(line);
            }
        }
        doc.blank();
    }

    if opts.include_notes && !result.meal_notes.is_empty() {
        doc.ensure_space(2 + result.meal_notes.len());
        doc.push("MEAL NOTES".to_string());
        for note in &result.meal_notes {
            for line in wrap(&format!("  • {}", note), PAGE_WIDTH) {
                doc.push(line);
            }
        }
    }

    doc.finish()
}

fn meal_title(name: &str, time: Option<&str>) -> String {
    let upper = name.to_uppercase();
    match time {
        // Header text usually embeds the time already; only append it when
        // it is not there yet.
        Some(time) if !upper.contains(&time.to_uppercase()) => format!("{} ({})", upper, time),
        _ => upper,
    }
}

/// Word-wrap to `width` columns; words longer than a line stand alone.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

struct PageBuilder {
    pages: Vec<Vec<String>>,
    current: Vec<String>,
}

impl PageBuilder {
    fn new() -> PageBuilder {
        PageBuilder {
            pages: Vec::new(),
            current: Vec::new(),
        }
    }

    fn push(&mut self, line: String) {
        if self.current.len() >= PAGE_LINES {
            self.break_page();
        }
        self.current.push(line);
    }

    fn blank(&mut self) {
        if !self.current.is_empty() && self.current.len() < PAGE_LINES {
            self.current.push(String::new());
        }
    }

    /// Break early when a block of `lines` would straddle the page boundary.
    fn ensure_space(&mut self, lines: usize) {
        if !self.current.is_empty() && self.current.len() + lines > PAGE_LINES {
            self.break_page();
        }
    }

    fn break_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.current));
    }

    fn finish(mut self) -> String {
        if !self.current.is_empty() {
            self.break_page();
        }
        let total = self.pages.len();
        self.pages
            .iter()
            .enumerate()
            .map(|(i, lines)| {
                let mut page = lines.join("\n");
                page.push_str(&format!("\n\n{:>width$}\n", format!("Page {} of {}", i + 1, total), width = PAGE_WIDTH));
                page
            })
            .collect::<Vec<_>>()
            .join("\u{c}\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FoodItem, MacroSet, Meal, Settings};
    use chrono::Utc;

    fn meal(name: &str, time: Option<&str>, foods: usize) -> Meal {
        Meal {
            name: name.to_string(),
            time: time.map(|t| t.to_string()),
            foods: (0..foods)
                .map(|i| FoodItem {
                    name: format!("Food {}", i + 1),
                    amount: 100.0,
                    unit: "g".to_string(),
                    macros: MacroSet {
                        protein: 10.0,
                        carbs: 20.0,
                        fat: 5.0,
                        calories: 200,
                    },
                })
                .collect(),
            macros: MacroSet {
                protein: 10.0,
                carbs: 20.0,
                fat: 5.0,
                calories: 200,
            },
            notes: String::new(),
        }
    }

    fn sample(meals: usize) -> ExtractionResult {
        ExtractionResult {
            client_name: "Jane Doe".to_string(),
            target_macros: MacroSet::default(),
            day_total: MacroSet {
                protein: 180.0,
                carbs: 220.0,
                fat: 70.0,
                calories: 2200,
            },
            meals: (0..meals)
                .map(|i| meal(&format!("Meal {}", i + 1), Some("12:00"), 3))
                .collect(),
            meal_notes: vec!["Weigh everything raw.".to_string()],
            extracted_at: Utc::now(),
        }
    }

    fn options() -> ExportOptions {
        ExportOptions::resolve(&Settings::default(), &sample(1))
    }

    #[test]
    fn document_structure_present() {
        let doc = render(&sample(2), &options());
        assert!(doc.contains("JANE DOE - DAILY MEAL PLAN"));
        assert!(doc.contains("Water Goal: 1 gallon"));
        assert!(doc.contains("Target Macros:"));
        assert!(doc.contains("MEAL 1 (12:00)"));
        assert!(doc.contains("• Food 1 - 100 g"));
        assert!(doc.contains("Macros: 10P / 20C / 5F"));
        assert!(doc.contains("DAILY MACRO TOTALS"));
        assert!(doc.contains("OPTIONAL FOOD SWAPS"));
        assert!(doc.contains("MEAL NOTES"));
        assert!(doc.contains("Weigh everything raw."));
    }

    #[test]
    fn swaps_and_notes_respect_flags() {
        let result = sample(1);
        let mut settings = Settings::default();
        settings.include_swaps = false;
        settings.include_notes = false;
        let doc = render(&result, &ExportOptions::resolve(&settings, &result));
        assert!(!doc.contains("OPTIONAL FOOD SWAPS"));
        assert!(!doc.contains("MEAL NOTES"));
    }

    #[test]
    fn long_plans_paginate() {
        let doc = render(&sample(20), &options());
        assert!(doc.contains("Page 1 of"));
        assert!(doc.contains('\u{c}'), "expected a page break");
        assert!(doc.contains("Page 2 of"));
    }

    #[test]
    fn time_not_duplicated_when_already_in_name() {
        assert_eq!(meal_title("Lunch (13:00)", Some("13:00")), "LUNCH (13:00)");
        assert_eq!(meal_title("Lunch", Some("13:00")), "LUNCH (13:00)");
        assert_eq!(meal_title("Dinner", None), "DINNER");
    }

    #[test]
    fn wrapping_respects_width() {
        let lines = wrap(&"word ".repeat(50), 20);
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
        assert!(lines.len() > 10);
    }
}
