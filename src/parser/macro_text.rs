use std::sync::LazyLock;

use regex::Regex;

use crate::model::MacroSet;

static COMMA_DECIMAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d),(\d)").unwrap());
static LEADING_FLOAT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?").unwrap());

static KCAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*k?cal").unwrap());

static PROTEIN_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*g?\s*p(?:rotein)?\b").unwrap());
static PROTEIN_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bp(?:rotein)?[:\s]+(\d+(?:\.\d+)?)").unwrap());

static CARBS_WORD_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*g?\s*carbs?\b").unwrap());
static CARBS_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bcarbs?[:\s]+(\d+(?:\.\d+)?)").unwrap());
// Bare single-letter carb forms. The regex crate has no lookaround, so the
// "never consume the c in kcal" guards live in code: see `carbs_from`.
static CARBS_BARE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*g?\s*[cC]\b").unwrap());
static CARBS_DELIM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)[cC]\b").unwrap());

static FAT_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*g?\s*f(?:at)?\b").unwrap());
static FAT_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bf(?:at)?[:\s]+(\d+(?:\.\d+)?)").unwrap());

/// Parse a free-text fragment ("320kcal 33P 42C 7F", "Protein: 180 g", ...)
/// into a macro record. Never fails: a field with no recognized pattern stays
/// 0, which callers treat as "not found", not as an error.
pub fn parse_macros(text: &str) -> MacroSet {
    let mut result = MacroSet::default();
    if text.trim().is_empty() {
        return result;
    }
    let clean = normalize(text);

    if let Some(caps) = KCAL_RE.captures(&clean) {
        result.calories = caps[1].parse::<f64>().map(|v| v.round() as u32).unwrap_or(0);
    }
    result.protein = labeled_field(&clean, &PROTEIN_SUFFIX_RE, &PROTEIN_PREFIX_RE);
    result.carbs = carbs_from(&clean).unwrap_or(0.0);
    result.fat = labeled_field(&clean, &FAT_SUFFIX_RE, &FAT_PREFIX_RE);

    result
}

/// Comma-as-decimal-separator to period (only between digits), whitespace
/// runs collapsed.
fn normalize(text: &str) -> String {
    let dotted = COMMA_DECIMAL_RE.replace_all(text, "${1}.${2}");
    dotted.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// parseFloat-style read of a rendered field value: leading number, trailing
/// junk ignored, comma decimals accepted. None when the text opens with
/// anything else.
pub fn parse_f64_loose(text: &str) -> Option<f64> {
    let clean = normalize(text);
    LEADING_FLOAT_RE
        .find(&clean)
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

fn labeled_field(clean: &str, suffix: &Regex, prefix: &Regex) -> f64 {
    suffix
        .captures(clean)
        .or_else(|| prefix.captures(clean))
        .and_then(|caps| caps[1].parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Four carb patterns of decreasing specificity, first match wins. The bare
/// "C" forms are tried last and carry explicit boundary guards because a lone
/// "C" is highly ambiguous ("kcal", "cal", "Chicken", ...).
fn carbs_from(clean: &str) -> Option<f64> {
    if let Some(caps) = CARBS_WORD_RE.captures(clean) {
        return caps[1].parse().ok();
    }
    if let Some(caps) = CARBS_PREFIX_RE.captures(clean) {
        return caps[1].parse().ok();
    }

    // "42 C", "15g C": the char right before the C must not be a letter,
    // which keeps the c of "kcal"/"cal" and letter-glued forms out.
    for caps in CARBS_BARE_RE.captures_iter(clean) {
        let c_pos = caps.get(0).unwrap().end() - 1;
        let before_c = clean[..c_pos].chars().next_back();
        if before_c.is_some_and(|ch| ch.is_ascii_alphabetic()) {
            continue;
        }
        return caps[1].parse().ok();
    }

    // "(15C", "| 15C": number glued to C, a delimiter required right before.
    for caps in CARBS_DELIM_RE.captures_iter(clean) {
        let start = caps.get(0).unwrap().start();
        let before = clean[..start].chars().next_back();
        if matches!(before, Some('|') | Some('(') | Some('[') | Some(' ')) {
            return caps[1].parse().ok();
        }
    }

    None
}
