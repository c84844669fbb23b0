use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::dom::NodeView;
use crate::model::{FoodItem, MacroSet, Meal};
use crate::parser::food::extract_food;
use crate::parser::macro_text::{parse_f64_loose, parse_macros};

/// How far the content search may climb from a meal header before giving up.
pub const MAX_ANCESTOR_HOPS: usize = 5;

/// Headers are short labels: more children or text than this and the element
/// is a content block, not a header.
const MAX_HEADER_CHILDREN: usize = 5;
const MAX_HEADER_TEXT: usize = 100;

static MEAL_NAME_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)meal\s*\d",
        r"(?i)breakfast",
        r"(?i)lunch",
        r"(?i)dinner",
        r"(?i)snack",
        r"(?i)pre[- ]?workout",
        r"(?i)post[- ]?workout",
        r"(?i)posiłek",
        r"(?i)śniadanie",
        r"(?i)obiad",
        r"(?i)kolacja",
        r"(?i)przekąska",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static TIME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\(([^)]+)\)").unwrap());
static TABLE_MEAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)meal|breakfast|lunch|dinner|snack").unwrap());

/// Extract all meals, trying strategies in priority order: header-anchored,
/// then table-anchored, then list-anchored. The first strategy yielding
/// non-empty results wins. Meals without foods never reach the result.
pub fn extract_meals<N: NodeView>(root: &N) -> Vec<Meal> {
    let headers = find_meal_headers(root);
    debug!(count = headers.len(), "meal header candidates");

    let mut meals: Vec<Meal> = headers
        .iter()
        .map(|h| extract_meal_from_header(root, h))
        .collect();
    meals.retain(|m| !m.foods.is_empty());

    if meals.is_empty() {
        debug!("no meals via headers, trying table layout");
        meals = extract_meals_from_tables(root);
        meals.retain(|m| !m.foods.is_empty());
    }
    if meals.is_empty() {
        meals = extract_meals_from_lists(root);
        meals.retain(|m| !m.foods.is_empty());
    }
    meals
}

/// Scan every element for short label-like nodes matching a meal-name
/// pattern. The first match in document order wins; later candidates that are
/// an ancestor or descendant of an accepted header are duplicates of it.
fn find_meal_headers<N: NodeView>(root: &N) -> Vec<N> {
    let mut headers: Vec<N> = Vec::new();
    for el in root.descendants() {
        if el.children().len() > MAX_HEADER_CHILDREN {
            continue;
        }
        let raw = el.raw_text();
        let text = raw.trim();
        if text.chars().count() > MAX_HEADER_TEXT {
            continue;
        }
        if !MEAL_NAME_RES.iter().any(|re| re.is_match(text)) {
            continue;
        }
        let duplicate = headers.iter().any(|h| h.contains(&el) || el.contains(h));
        if !duplicate {
            headers.push(el);
        }
    }
    headers
}

/// Build one meal from its header: resolve the content container (tab-panel
/// anchor target when the header sits in an in-page link, otherwise the
/// header's parent), then search rows upward within a bounded number of hops.
fn extract_meal_from_header<N: NodeView>(root: &N, header: &N) -> Meal {
    let mut meal = new_meal(header.raw_text().trim().to_string());

    let anchored = anchor_container(root, header);
    let from_anchor = anchored.is_some();
    let mut scope_opt = anchored.or_else(|| header.parent());

    let mut raw_foods: Vec<FoodItem> = Vec::new();
    for _ in 0..MAX_ANCESTOR_HOPS {
        let Some(scope) = scope_opt else { break };

        for row in candidate_rows(&scope) {
            if row.text().to_lowercase().contains("meal total") {
                apply_meal_total(&mut meal, &row);
                continue;
            }
            if let Some(food) = extract_food(&row) {
                raw_foods.push(food);
            }
        }

        if !raw_foods.is_empty() {
            break;
        }
        // An anchor-resolved container is authoritative: nothing there means
        // nothing anywhere, so do not search wider.
        if from_anchor {
            break;
        }
        scope_opt = scope.parent();
    }

    meal.foods = raw_foods;
    finish_meal(meal)
}

fn new_meal(name: String) -> Meal {
    let time = TIME_RE.captures(&name).map(|c| c[1].to_string());
    Meal {
        name,
        time,
        ..Meal::default()
    }
}

/// A header inside `<a href="#pane">` points at a tab panel living in a
/// different subtree; resolve to the element carrying that id.
fn anchor_container<N: NodeView>(root: &N, header: &N) -> Option<N> {
    let link = header
        .self_and_ancestors()
        .into_iter()
        .find(|n| n.tag() == "a")?;
    let id = link.attr("href")?.strip_prefix('#')?;
    if id.is_empty() {
        return None;
    }
    root.descendants()
        .into_iter()
        .find(|n| n.attr("id") == Some(id))
}

/// Row-like descendants of a scope: tabular rows preferred, item/food/row
/// classed elements otherwise. Only outermost candidates are kept — a row
/// nested inside another matched row would be double-counted.
fn candidate_rows<N: NodeView>(scope: &N) -> Vec<N> {
    let descendants = scope.descendants();
    let mut rows: Vec<N> = descendants
        .iter()
        .filter(|d| d.tag() == "tr")
        .cloned()
        .collect();
    if rows.is_empty() {
        rows = descendants
            .iter()
            .filter(|d| d.class_contains("item") || d.class_contains("food") || d.has_class("row"))
            .cloned()
            .collect();
    }
    rows.iter()
        .filter(|&row| {
            !rows
                .iter()
                .any(|other| !other.same_node(row) && other.contains(row))
        })
        .cloned()
        .collect()
}

/// A "meal total" row carries the authoritative meal-level summary: dedicated
/// sub-total fields when the layout has them, parsed row text otherwise.
fn apply_meal_total<N: NodeView>(meal: &mut Meal, row: &N) {
    let descendants = row.descendants();
    let sub_field = |class: &str| {
        descendants
            .iter()
            .find(|d| d.has_class(class))
            .map(|d| d.text())
    };

    if let Some(kcal) = sub_field("sub-total-calories") {
        meal.macros.calories = parse_f64_loose(&kcal).unwrap_or(0.0).round() as u32;
        meal.macros.protein = sub_field("sub-total-protein")
            .and_then(|t| parse_f64_loose(&t))
            .unwrap_or(0.0);
        meal.macros.carbs = sub_field("sub-total-carbs")
            .and_then(|t| parse_f64_loose(&t))
            .unwrap_or(0.0);
        meal.macros.fat = sub_field("sub-total-fat")
            .and_then(|t| parse_f64_loose(&t))
            .unwrap_or(0.0);
    } else {
        let macros = parse_macros(&row.text());
        if macros.calories > 0 {
            meal.macros = macros;
        }
    }
}

/// Shared meal finalization: group repeated foods by normalized name, then
/// fall back to the summed food macros when no total row provided any.
fn finish_meal(mut meal: Meal) -> Meal {
    meal.foods = group_foods(std::mem::take(&mut meal.foods));
    if meal.macros.calories == 0 && !meal.foods.is_empty() {
        meal.macros = MacroSet::sum_of(&meal.foods);
    }
    meal
}

/// Merge foods whose trimmed, case-lowered names are equal by summing amount
/// and all macro fields. First occurrence keeps its other fields.
fn group_foods(raw: Vec<FoodItem>) -> Vec<FoodItem> {
    let mut grouped: Vec<FoodItem> = Vec::new();
    for food in raw {
        let key = food.name.trim().to_lowercase();
        match grouped
            .iter_mut()
            .find(|f| f.name.trim().to_lowercase() == key)
        {
            Some(existing) => {
                existing.amount += food.amount;
                existing.macros.add(&food.macros);
            }
            None => grouped.push(food),
        }
    }
    grouped
}

/// Fallback for pages laying meals out as plain tables: a short row matching
/// a meal keyword opens a meal, a "meal total" row closes and commits it, the
/// table end commits whatever is still open.
fn extract_meals_from_tables<N: NodeView>(root: &N) -> Vec<Meal> {
    let mut meals = Vec::new();
    for table in root.descendants().into_iter().filter(|d| d.tag() == "table") {
        let mut current: Option<Meal> = None;
        for row in table.descendants().into_iter().filter(|d| d.tag() == "tr") {
            let text = row.text();
            let cells = row
                .descendants()
                .into_iter()
                .filter(|d| d.tag() == "td")
                .count();

            if TABLE_MEAL_RE.is_match(&text) && cells <= 2 {
                if let Some(meal) = current.take() {
                    meals.push(finish_meal(meal));
                }
                current = Some(new_meal(text));
                continue;
            }
            if text.to_lowercase().contains("meal total") {
                if let Some(mut meal) = current.take() {
                    meal.macros = parse_macros(&text);
                    meals.push(finish_meal(meal));
                }
                continue;
            }
            if let Some(meal) = current.as_mut() {
                if let Some(food) = extract_food(&row) {
                    meal.foods.push(food);
                }
            }
        }
        if let Some(meal) = current.take() {
            meals.push(finish_meal(meal));
        }
    }
    meals
}

/// Bullet/numbered-list layouts: a known gap. No page of that shape has been
/// captured yet, so this yields nothing rather than guessing at a structure.
fn extract_meals_from_lists<N: NodeView>(_root: &N) -> Vec<Meal> {
    debug!("list-based meal layout not implemented, yielding no meals");
    Vec::new()
}
