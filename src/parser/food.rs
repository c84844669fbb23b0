use std::sync::LazyLock;

use regex::Regex;
use tracing::trace;

use crate::dom::NodeView;
use crate::model::{FoodItem, MacroSet};
use crate::parser::macro_text::{parse_f64_loose, parse_macros};

/// Macro-label words that alone never name a food.
const STOP_WORDS: &[&str] = &["kcal", "protein", "carbs", "fat"];

/// Structural phrases marking non-food rows (summary rows, toolbars, nav).
const STOP_PHRASES: &[&str] = &[
    "meal total",
    "day total",
    "meal notes",
    "header",
    "total",
    "add food",
    "custom",
    "shopping list",
    "food swaps guide",
];

static BARE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\d+(?:\.\d+)?\s*(?:kcal|g|p|c|f|protein|carbs|fat)?$").unwrap()
});
static BARE_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?$").unwrap());
static PURE_NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").unwrap());
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(g|kg|ml|slice|piece|large egg|medium egg|large|medium)")
        .unwrap()
});
static NAME_AMOUNT_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\s*[–-]?\s*\d+[.,]?\d*\s*(?:g|kg|ml|slice|piece|large egg|medium egg|large|medium).*$",
    )
    .unwrap()
});
static TRAILING_DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+$").unwrap());
static LEADING_DIGITS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+\s*").unwrap());

/// Decide whether a candidate row is a food line and extract it.
///
/// Editable input fields are authoritative when present; rendered text is the
/// fallback. Returns None for rows that carry no food information.
pub fn extract_food<N: NodeView>(row: &N) -> Option<FoodItem> {
    let text = row.text();
    if text.chars().count() < 2 {
        return None;
    }
    if BARE_NUMBER_RE.is_match(&text) {
        return None;
    }
    let lower = text.to_lowercase();
    if STOP_WORDS.iter().any(|w| lower == *w) {
        return None;
    }
    if STOP_PHRASES.iter().any(|p| lower.contains(p)) {
        trace!(row = %text, "skipping structural row");
        return None;
    }

    let mut name = String::new();
    let mut amount = 0.0_f64;
    let mut unit = "g".to_string();
    let mut macros = MacroSet::default();

    let descendants = row.descendants();
    let inputs: Vec<&N> = descendants.iter().filter(|d| d.tag() == "input").collect();

    if !inputs.is_empty() {
        name = input_field_name(&descendants, &inputs, row);

        if let Some(weight) = descendants.iter().find(|d| d.has_class("hidden-weight-value")) {
            amount = weight
                .input_value()
                .and_then(|v| parse_f64_loose(&v))
                .unwrap_or(0.0);
        } else {
            // First input holding a bare number that is not one of the four
            // macro fields is taken as the quantity.
            for input in &inputs {
                let Some(val) = input.input_value() else { continue };
                let val = val.trim().to_string();
                if BARE_VALUE_RE.is_match(&val) && !is_macro_input(*input) {
                    amount = val.parse().unwrap_or(0.0);
                    break;
                }
            }
        }

        let kcal = macro_field(&descendants, &["calories-row", "calories-item"], "hidden-calories-value");
        let protein = macro_field(&descendants, &["protein-row", "protein-item"], "hidden-protein-value");
        let carbs = macro_field(
            &descendants,
            &["carbohydrate-row", "carbs-row", "carbohydrate-item"],
            "hidden-carbohydrate-value",
        );
        let fat = macro_field(&descendants, &["fat-row", "fat-item"], "hidden-fat-value");

        macros.calories = kcal.unwrap_or(0.0).round() as u32;
        macros.protein = protein.unwrap_or(0.0);
        macros.carbs = carbs.unwrap_or(0.0);
        macros.fat = fat.unwrap_or(0.0);

        if let Some(badge) = descendants.iter().find(|d| d.has_class("badge-light")) {
            unit = LEADING_DIGITS_RE.replace(&badge.text(), "").trim().to_string();
        } else if let Some(el) = descendants
            .iter()
            .find(|d| d.class_contains("unit") || d.class_contains("measure"))
        {
            unit = el.text();
        }
    }

    // No dedicated macro fields produced anything: recover from the row text.
    if macros.calories == 0 {
        macros = parse_macros(&text);
    }

    if name.is_empty() {
        if let Some(cell) = descendants.iter().find(|d| d.tag() == "td") {
            name = first_line(&cell.raw_text());
        }
    }
    if name.is_empty() {
        name = first_line(&row.raw_text());
    }

    if amount == 0.0 {
        if let Some(caps) = AMOUNT_RE.captures(&text) {
            amount = caps[1].parse().unwrap_or(0.0);
            unit = caps[2].to_string();
        }
    }

    let name = clean_name(&name);

    if name.chars().count() < 2 || PURE_NUMBER_RE.is_match(&name) {
        return None;
    }
    // A zero-information row is not a food.
    if amount == 0.0 && macros.calories == 0 {
        return None;
    }

    Some(FoodItem {
        name,
        amount,
        unit,
        macros,
    })
}

/// Strip a trailing "<number> <unit>..." suffix and any trailing digit run.
fn clean_name(name: &str) -> String {
    let stripped = NAME_AMOUNT_SUFFIX_RE.replace(name, "");
    TRAILING_DIGITS_RE.replace(&stripped, "").trim().to_string()
}

fn first_line(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("")
        .to_string()
}

fn is_macro_input<N: NodeView>(input: &N) -> bool {
    ["calories", "protein", "carbohydrate", "fat"]
        .iter()
        .any(|c| input.class_contains(c))
}

/// Name resolution for rows with editable fields: the dedicated name input,
/// else the nearest name-bearing sub-element, else the styled first-cell div
/// some card layouts use.
fn input_field_name<N: NodeView>(descendants: &[N], inputs: &[&N], row: &N) -> String {
    if let Some(input) = inputs
        .iter()
        .find(|i| i.attr("data-name").is_some_and(|v| v.contains("][name]")))
    {
        return input.input_value().unwrap_or_default().trim().to_string();
    }
    if let Some(el) = descendants
        .iter()
        .find(|d| d.class_contains("name") || d.tag() == "b" || d.tag() == "strong")
    {
        return el.text();
    }
    styled_first_cell_text(row).unwrap_or_default()
}

fn styled_first_cell_text<N: NodeView>(row: &N) -> Option<String> {
    row.descendants()
        .into_iter()
        .filter(|d| d.tag() == "td" && is_first_element_child(d))
        .find_map(|td| {
            td.descendants()
                .into_iter()
                .find(|d| d.tag() == "div" && d.attr("style").is_some_and(|s| s.contains("500")))
                .map(|d| d.text())
        })
}

fn is_first_element_child<N: NodeView>(el: &N) -> bool {
    el.parent()
        .and_then(|p| p.children().into_iter().next())
        .is_some_and(|first| first.same_node(el))
}

/// Value of one macro column: dedicated container first, input preferred over
/// rendered text, hidden per-macro input as the last structured resort.
/// None means the container does not exist at all.
fn macro_field<N: NodeView>(descendants: &[N], classes: &[&str], hidden_class: &str) -> Option<f64> {
    let container = descendants
        .iter()
        .find(|d| classes.iter().any(|c| d.has_class(c)))?;
    let input = container
        .descendants()
        .into_iter()
        .find(|d| d.tag() == "input")
        .or_else(|| {
            descendants
                .iter()
                .find(|d| d.tag() == "input" && d.has_class(hidden_class))
                .cloned()
        });
    let raw = match input {
        Some(i) => i.input_value().unwrap_or_default(),
        None => container.text(),
    };
    Some(parse_f64_loose(&raw).unwrap_or(0.0))
}
