use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::dom::NodeView;
use crate::model::MacroSet;
use crate::parser::macro_text::{parse_f64_loose, parse_macros};

/// Returned when no plausible client name exists anywhere on the page.
pub const CLIENT_NAME_PLACEHOLDER: &str = "Client Meal Plan";

static BASELINE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)\s+baseline").unwrap());
static PERSON_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z][a-z]+\s+[A-Z]?[a-z]*").unwrap());

/// Locate the client name: the platform's own header class first, then a
/// chain of generic heading/label shapes, then the first h1, then a fixed
/// placeholder.
pub fn extract_client_name<N: NodeView>(root: &N) -> String {
    let descendants = root.descendants();

    // Platform-specific "Name Baseline" header.
    if let Some(header) = descendants.iter().find(|el| {
        el.has_class("card-label") && el.has_class("font-weight-bolder") && el.has_class("text-dark")
    }) {
        let text = BASELINE_RE
            .replace(header.raw_text().trim(), "")
            .trim()
            .to_string();
        if !text.is_empty() {
            return text;
        }
    }

    // Generic name-bearing shapes, tried in page-prominence order: headings,
    // client/name/title classed elements, headings inside header containers,
    // breadcrumbs and page titles.
    let passes: [&dyn Fn(&N) -> bool; 9] = [
        &|el| el.tag() == "h1",
        &|el| el.tag() == "h2",
        &|el| el.class_contains("client"),
        &|el| el.class_contains("name"),
        &|el| el.class_contains("title"),
        &|el| el.tag() == "h1" && el.ancestors().iter().any(|a| a.class_contains("header")),
        &|el| el.tag() == "h2" && el.ancestors().iter().any(|a| a.class_contains("header")),
        &|el| el.class_contains("breadcrumb"),
        &|el| el.class_contains("page-title"),
    ];
    for pass in passes {
        for el in &descendants {
            if !pass(el) {
                continue;
            }
            let text = el.raw_text().trim().to_string();
            let len = text.chars().count();
            if len <= 2 || len >= 100 {
                continue;
            }
            let lower = text.to_lowercase();
            if lower.contains("menu") || lower.contains("dashboard") {
                continue;
            }
            if lower.contains("baseline") {
                return BASELINE_RE.replace(&text, "").trim().to_string();
            }
            if PERSON_NAME_RE.is_match(&text) {
                return text;
            }
        }
    }

    if let Some(h1) = descendants.iter().find(|el| el.tag() == "h1") {
        return h1.raw_text().trim().to_string();
    }

    debug!("no client name found, using placeholder");
    CLIENT_NAME_PLACEHOLDER.to_string()
}

/// Locate the daily macro summary. A labelled "DAY TOTAL" container wins;
/// dedicated per-field elements are read inside it, and badge-like summary
/// elements override still-zero fields one by one.
pub fn extract_day_total<N: NodeView>(root: &N) -> MacroSet {
    let mut result = MacroSet::default();
    let descendants = root.descendants();

    let day_header = descendants.iter().find(|el| {
        el.has_class("card-label") && {
            let t = el.raw_text();
            t.contains("DAY TOTAL") || t.contains("Day 1 Totals")
        }
    });

    let container = match day_header {
        Some(header) => header
            .self_and_ancestors()
            .into_iter()
            .find(|n| n.has_class("card") || n.has_class("section") || n.tag() == "div"),
        None => descendants
            .iter()
            .find(|n| n.has_class("total-days-foods"))
            .cloned(),
    };

    if let Some(container) = container {
        let inner = container.descendants();
        let field = |class: &str| {
            inner
                .iter()
                .find(|n| n.has_class(class))
                .and_then(|n| parse_f64_loose(&n.text()))
        };
        if let Some(kcal) = field("total-calories") {
            result.calories = kcal.round() as u32;
        }
        if let Some(protein) = field("total-protein") {
            result.protein = protein;
        }
        if let Some(carbs) = field("total-carbs") {
            result.carbs = carbs;
        }
        if let Some(fat) = field("total-fat") {
            result.fat = fat;
        }
    }

    // Dedicated fields missing or empty: let summary badges fill in whatever
    // they know, field by field, never wholesale.
    if result.calories == 0 {
        for summary in descendants.iter().filter(|n| n.has_class("total-days-foods")) {
            for badge in summary.descendants().iter().filter(|n| n.has_class("badge")) {
                let macros = parse_macros(&badge.text());
                if macros.calories > 0 {
                    result.calories = macros.calories;
                }
                if macros.protein > 0.0 {
                    result.protein = macros.protein;
                }
                if macros.carbs > 0.0 {
                    result.carbs = macros.carbs;
                }
                if macros.fat > 0.0 {
                    result.fat = macros.fat;
                }
            }
        }
    }

    result
}

/// Collect free-text meal notes: dedicated note containers first, then
/// "Meal Notes" labels with their adjacent or surrounding text. Distinct
/// texts only, first-seen order kept.
pub fn extract_meal_notes<N: NodeView>(root: &N) -> Vec<String> {
    let mut notes: Vec<String> = Vec::new();
    let descendants = root.descendants();

    for el in &descendants {
        let dedicated = (el.tag() == "pre" && el.has_class("my-chat-pre"))
            || (el.tag() == "pre"
                && el
                    .ancestors()
                    .iter()
                    .any(|a| a.tag() == "div" && a.has_class("form-group")))
            || el.has_class("meal-notes-content");
        if dedicated {
            let text = el.raw_text().trim().to_string();
            if text.chars().count() > 3 {
                notes.push(text);
            }
        }
    }

    if notes.is_empty() {
        let labels = descendants.iter().filter(|el| {
            matches!(el.tag(), "label" | "h4" | "h5" | "b" | "span")
                && el.raw_text().to_lowercase().contains("meal notes")
        });
        for label in labels {
            let Some(parent) = label
                .ancestors()
                .into_iter()
                .find(|a| matches!(a.tag(), "div" | "section"))
            else {
                continue;
            };
            if let Some(next) = label.next_sibling() {
                let text = next.raw_text().trim().to_string();
                if !text.is_empty() {
                    notes.push(text);
                    continue;
                }
            }
            let text = parent
                .raw_text()
                .replacen(&label.raw_text(), "", 1)
                .trim()
                .to_string();
            let len = text.chars().count();
            if len > 5 && len < 1000 {
                notes.push(text);
            }
        }
    }

    let mut seen = HashSet::new();
    notes.retain(|n| seen.insert(n.clone()));
    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlPage;

    #[test]
    fn platform_header_with_baseline_suffix() {
        let html = "<html><body>\
            <h3 class='card-label font-weight-bolder text-dark'>Jane Doe Baseline</h3>\
            </body></html>";
        let page = HtmlPage::parse(html);
        assert_eq!(extract_client_name(&page.root()), "Jane Doe");
    }

    #[test]
    fn generic_heading_with_name_shape() {
        let html = "<html><body><h2>Dashboard Overview</h2><h2>Mark Johnson</h2></body></html>";
        let page = HtmlPage::parse(html);
        assert_eq!(extract_client_name(&page.root()), "Mark Johnson");
    }

    #[test]
    fn baseline_qualifier_stripped_in_generic_scan() {
        let html = "<html><body><div class='page-title'>Anna Kowalska baseline</div></body></html>";
        let page = HtmlPage::parse(html);
        assert_eq!(extract_client_name(&page.root()), "Anna Kowalska");
    }

    #[test]
    fn placeholder_when_nothing_matches() {
        let page = HtmlPage::parse("<html><body><p>42</p></body></html>");
        assert_eq!(extract_client_name(&page.root()), CLIENT_NAME_PLACEHOLDER);
    }

    #[test]
    fn day_total_from_labelled_card() {
        let html = "<html><body><div class='card'>\
            <span class='card-label'>DAY TOTAL</span>\
            <div class='total-days-foods'>\
              <span class='total-calories'>2200</span>\
              <span class='total-protein'>180</span>\
              <span class='total-carbs'>220</span>\
              <span class='total-fat'>70</span>\
            </div></div></body></html>";
        let page = HtmlPage::parse(html);
        let total = extract_day_total(&page.root());
        assert_eq!(total.calories, 2200);
        assert_eq!(total.protein, 180.0);
        assert_eq!(total.carbs, 220.0);
        assert_eq!(total.fat, 70.0);
    }

    #[test]
    fn day_total_comma_decimals_and_rounding() {
        let html = "<html><body><div class='card'>\
            <span class='card-label'>Day 1 Totals</span>\
            <span class='total-calories'>2199,6</span>\
            <span class='total-fat'>70,5</span>\
            </div></body></html>";
        let page = HtmlPage::parse(html);
        let total = extract_day_total(&page.root());
        assert_eq!(total.calories, 2200);
        assert_eq!(total.fat, 70.5);
        assert_eq!(total.protein, 0.0);
    }

    #[test]
    fn day_total_badges_override_missing_fields() {
        let html = "<html><body><div class='total-days-foods'>\
            <span class='badge'>2000 kcal</span>\
            <span class='badge'>150g protein</span>\
            <span class='badge'>60 g fat</span>\
            </div></body></html>";
        let page = HtmlPage::parse(html);
        let total = extract_day_total(&page.root());
        assert_eq!(total.calories, 2000);
        assert_eq!(total.protein, 150.0);
        assert_eq!(total.fat, 60.0);
        assert_eq!(total.carbs, 0.0);
    }

    #[test]
    fn day_total_on_empty_document_is_all_zero() {
        let page = HtmlPage::parse("<html><body></body></html>");
        assert_eq!(extract_day_total(&page.root()), MacroSet::default());
    }

    #[test]
    fn notes_from_dedicated_containers_deduplicated() {
        let html = "<html><body>\
            <pre class='my-chat-pre'>Drink water with every meal.</pre>\
            <div class='meal-notes-content'>Drink water with every meal.</div>\
            <div class='form-group'><pre>Weigh food raw, not cooked.</pre></div>\
            </body></html>";
        let page = HtmlPage::parse(html);
        let notes = extract_meal_notes(&page.root());
        assert_eq!(
            notes,
            vec![
                "Drink water with every meal.".to_string(),
                "Weigh food raw, not cooked.".to_string(),
            ]
        );
    }

    #[test]
    fn notes_from_label_sibling() {
        let html = "<html><body><div>\
            <label>Meal Notes</label>\
            <p>No dressing on the salad, lemon juice instead.</p>\
            </div></body></html>";
        let page = HtmlPage::parse(html);
        let notes = extract_meal_notes(&page.root());
        assert_eq!(notes, vec!["No dressing on the salad, lemon juice instead.".to_string()]);
    }

    #[test]
    fn notes_from_label_parent_text() {
        let html = "<html><body><div><span>Meal Notes</span>\
            Keep sauces separate and log them on their own.\
            </div></body></html>";
        let page = HtmlPage::parse(html);
        let notes = extract_meal_notes(&page.root());
        assert_eq!(notes.len(), 1);
        assert!(notes[0].contains("Keep sauces separate"));
    }

    #[test]
    fn no_notes_on_plain_page() {
        let page = HtmlPage::parse("<html><body><p>nothing here</p></body></html>");
        assert!(extract_meal_notes(&page.root()).is_empty());
    }
}
