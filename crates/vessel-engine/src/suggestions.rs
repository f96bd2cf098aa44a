//! Fuzzy matching and context-aware suggestions for template errors
//!
//! Uses Levenshtein distance to point operators at the function, filter or
//! item name they most likely meant.

/// Maximum Levenshtein distance to consider for suggestions
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Filters available in config templates (MiniJinja builtins)
pub const AVAILABLE_FILTERS: &[&str] = &[
    "default",
    "upper",
    "lower",
    "title",
    "capitalize",
    "replace",
    "trim",
    "join",
    "first",
    "last",
    "length",
    "reverse",
    "sort",
    "unique",
    "map",
    "select",
    "reject",
    "batch",
    "slice",
    "items",
    "int",
    "float",
    "abs",
    "round",
    "string",
    "list",
    "bool",
    "safe",
    "escape",
    "e",
    "urlencode",
];

/// Functions registered for config templates
pub const AVAILABLE_FUNCTIONS: &[&str] = &[
    "ConfigOption",
    "ConfigOptionIndex",
    "ConfigOptionData",
    "ConfigOptionEquals",
    "ConfigOptionNotEquals",
    "Base64Encode",
    "Base64Decode",
    "ToLower",
    "ToUpper",
    "TrimSpace",
    "Trim",
    "Now",
    "NowFmt",
    "RandomString",
    // Built-in MiniJinja globals
    "range",
    "dict",
    "namespace",
];

/// Suggestion result with confidence scoring
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggested correction
    pub text: String,
    /// Levenshtein distance (lower = better match)
    pub distance: usize,
    pub category: SuggestionCategory,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SuggestionCategory {
    Function,
    Filter,
    Item,
}

pub fn levenshtein(a: &str, b: &str) -> usize {
    strsim::levenshtein(a, b)
}

/// Find closest matches from a list of candidates
pub fn find_closest_matches(
    input: &str,
    candidates: &[&str],
    max_results: usize,
    category: SuggestionCategory,
) -> Vec<Suggestion> {
    let mut suggestions: Vec<Suggestion> = candidates
        .iter()
        .filter_map(|&candidate| {
            let distance = levenshtein(input, candidate);
            if distance <= MAX_SUGGESTION_DISTANCE && distance > 0 {
                Some(Suggestion {
                    text: candidate.to_string(),
                    distance,
                    category,
                })
            } else {
                None
            }
        })
        .collect();

    suggestions.sort_by_key(|s| s.distance);
    suggestions.truncate(max_results);
    suggestions
}

fn did_you_mean(matches: &[Suggestion]) -> String {
    let names: Vec<String> = matches.iter().map(|s| format!("`{}`", s.text)).collect();
    format!("Did you mean {}?", names.join(" or "))
}

/// Suggest a fix for a bare identifier used as a variable
///
/// Templates have no variables of their own, so a bare name is usually a
/// function called without parentheses or an item name missing its lookup.
pub fn suggest_undefined_variable(variable_name: &str) -> Option<String> {
    if AVAILABLE_FUNCTIONS.contains(&variable_name) {
        return Some(format!(
            "`{}` is a function. Call it: `{}(...)`",
            variable_name, variable_name
        ));
    }

    let matches = find_closest_matches(
        variable_name,
        AVAILABLE_FUNCTIONS,
        1,
        SuggestionCategory::Function,
    );
    if !matches.is_empty() {
        return Some(did_you_mean(&matches));
    }

    Some(format!(
        "Config items are not template variables. Use `ConfigOption(\"{}\")`",
        variable_name
    ))
}

/// Suggest corrections for an unknown filter
pub fn suggest_unknown_filter(filter_name: &str) -> Option<String> {
    let matches = find_closest_matches(
        filter_name,
        AVAILABLE_FILTERS,
        3,
        SuggestionCategory::Filter,
    );

    if !matches.is_empty() {
        Some(did_you_mean(&matches))
    } else {
        Some(format!(
            "Unknown filter `{}`. Common filters: default, upper, lower, trim, replace",
            filter_name
        ))
    }
}

/// Suggest corrections for an unknown function
pub fn suggest_unknown_function(func_name: &str) -> Option<String> {
    let matches = find_closest_matches(
        func_name,
        AVAILABLE_FUNCTIONS,
        3,
        SuggestionCategory::Function,
    );

    if !matches.is_empty() {
        Some(did_you_mean(&matches))
    } else {
        Some(format!(
            "Unknown function `{}`. Available functions: {}",
            func_name,
            AVAILABLE_FUNCTIONS.join(", ")
        ))
    }
}

/// Suggest declared item names close to `name`
pub fn suggest_item_name(name: &str, declared: &[&str]) -> Option<String> {
    let matches = find_closest_matches(name, declared, 3, SuggestionCategory::Item);
    if matches.is_empty() {
        None
    } else {
        Some(did_you_mean(&matches))
    }
}

/// Extract a quoted name from an error message
pub fn extract_variable_name(msg: &str) -> Option<String> {
    // "undefined variable `foo`" or "variable 'foo' is undefined"
    let patterns = [("`", "`"), ("'", "'"), ("\"", "\"")];

    for (start, end) in patterns {
        if let Some(start_idx) = msg.find(start) {
            let rest = &msg[start_idx + start.len()..];
            if let Some(end_idx) = rest.find(end) {
                return Some(rest[..end_idx].to_string());
            }
        }
    }
    None
}

/// Extract filter name from error message
pub fn extract_filter_name(msg: &str) -> Option<String> {
    extract_unknown_name(msg, "unknown filter: ").or_else(|| extract_variable_name(msg))
}

/// Extract function name from error message
///
/// MiniJinja reports `unknown function: Foo is unknown`.
pub fn extract_function_name(msg: &str) -> Option<String> {
    extract_unknown_name(msg, "unknown function: ").or_else(|| extract_variable_name(msg))
}

fn extract_unknown_name(msg: &str, prefix: &str) -> Option<String> {
    let start = msg.find(prefix)? + prefix.len();
    let name: String = msg[start..]
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if name.is_empty() { None } else { Some(name) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein("ConfigOptoin", "ConfigOption"), 2);
        assert_eq!(levenshtein("ToLower", "ToLower"), 0);
    }

    #[test]
    fn test_find_closest_matches() {
        let matches = find_closest_matches(
            "ConfigOptionEqual",
            AVAILABLE_FUNCTIONS,
            3,
            SuggestionCategory::Function,
        );
        assert_eq!(matches[0].text, "ConfigOptionEquals");
        assert_eq!(matches[0].distance, 1);
    }

    #[test]
    fn test_suggest_unknown_function() {
        let suggestion = suggest_unknown_function("ConfigOptoin").unwrap();
        assert!(suggestion.contains("`ConfigOption`"));

        let suggestion = suggest_unknown_function("xyzzyplugh").unwrap();
        assert!(suggestion.starts_with("Unknown function `xyzzyplugh`"));
    }

    #[test]
    fn test_suggest_undefined_variable() {
        let suggestion = suggest_undefined_variable("Now").unwrap();
        assert!(suggestion.contains("is a function"));

        let suggestion = suggest_undefined_variable("db_host").unwrap();
        assert!(suggestion.contains(r#"ConfigOption("db_host")"#));
    }

    #[test]
    fn test_suggest_item_name() {
        let declared = ["db_host", "db_port"];
        assert!(suggest_item_name("db_hots", &declared).unwrap().contains("db_host"));
        assert!(suggest_item_name("completely_different", &declared).is_none());
    }

    #[test]
    fn test_extract_function_name() {
        assert_eq!(
            extract_function_name("unknown function: ConfigOptoin is unknown (in a.default:1)"),
            Some("ConfigOptoin".to_string())
        );
        assert_eq!(
            extract_function_name("unknown function `Foo`"),
            Some("Foo".to_string())
        );
    }

    #[test]
    fn test_extract_variable_name() {
        assert_eq!(
            extract_variable_name("undefined variable `foo`"),
            Some("foo".to_string())
        );
        assert_eq!(
            extract_variable_name("variable 'bar' is undefined"),
            Some("bar".to_string())
        );
    }
}
