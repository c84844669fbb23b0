use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The three tracked macronutrients plus calories.
///
/// `protein`/`carbs`/`fat` are grams and keep fractional precision; `calories`
/// is always rounded to a whole kcal. The two are extracted independently and
/// are not required to reconcile (4P + 4C + 9F need not equal kcal).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MacroSet {
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub calories: u32,
}

impl MacroSet {
    /// Field-wise sum; grouping and meal-total fallbacks are built on this.
    pub fn add(&mut self, other: &MacroSet) {
        self.protein += other.protein;
        self.carbs += other.carbs;
        self.fat += other.fat;
        self.calories += other.calories;
    }

    /// True when every field is zero — callers treat this as "not found,
    /// use fallback", never as an error.
    pub fn is_zero(&self) -> bool {
        self.protein == 0.0 && self.carbs == 0.0 && self.fat == 0.0 && self.calories == 0
    }

    pub fn sum_of(foods: &[FoodItem]) -> MacroSet {
        let mut total = MacroSet::default();
        for food in foods {
            total.add(&food.macros);
        }
        total
    }
}

/// One recognized food line.
///
/// Constructed once per accepted row, then only ever mutated by grouping,
/// which sums `amount` and all four macro fields of same-named entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodItem {
    pub name: String,
    pub amount: f64,
    /// Unit as extracted from the page ("g" when nothing better is found).
    pub unit: String,
    pub macros: MacroSet,
}

/// One meal section of the plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    /// Raw header text; may still embed a time in parentheses.
    pub name: String,
    /// First parenthesized substring of the header text, when present.
    pub time: Option<String>,
    /// Document order, after grouping.
    pub foods: Vec<FoodItem>,
    /// From an explicit "meal total" row when one exists, otherwise the
    /// field-wise sum of `foods`.
    pub macros: MacroSet,
    pub notes: String,
}

/// The single value crossing the extraction boundary.
///
/// Serialized field names match the JSON the coaching-platform extension
/// produced, so existing downstream tooling keeps reading exports unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub client_name: String,
    /// Value-copy of `day_total` taken at construction time. The two are
    /// independently adjustable afterwards.
    pub target_macros: MacroSet,
    pub day_total: MacroSet,
    pub meals: Vec<Meal>,
    /// Distinct note texts, first-seen order.
    pub meal_notes: Vec<String>,
    pub extracted_at: DateTime<Utc>,
}

impl ExtractionResult {
    pub fn food_count(&self) -> usize {
        self.meals.iter().map(|m| m.foods.len()).sum()
    }
}

/// User-tunable export settings, persisted across runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Overrides the extracted client name in exports when set.
    pub client_name: Option<String>,
    /// Gallons per day, free text ("1", "0.75", ...).
    pub water_goal: String,
    pub include_notes: bool,
    pub include_swaps: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            client_name: None,
            water_goal: "1".to_string(),
            include_notes: true,
            include_swaps: true,
        }
    }
}
