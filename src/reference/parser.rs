//! Parser for the named reference grammar.
//!
//! ```text
//! reference  := [ name-part "=" ] locator [ "#" params ]
//! name-part  := name [ ":" group ]
//! params     := key "=" value ( "&" key "=" value )*
//! ```
//!
//! `=` is legal inside URLs and `:` inside Windows paths, so the name part is
//! recognized conservatively:
//! 1. backslashes are turned into forward slashes before anything else;
//! 2. only the first `=` counts, and only when it comes before any `://`;
//! 3. the text before that `=` must not contain `#` or `/`;
//! 4. a `:` inside the name part separates name from group.
//!
//! The last `#` starts the parameters only if everything after it has the
//! `key=value(&key=value)*` shape. Otherwise the fragment belongs to the
//! locator. A genuine URL fragment that happens to look like `key=value` is
//! therefore read as parameters.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::NamedReference;
use crate::constants::SCHEME_SEPARATOR;
use crate::core::{DataSourceError, Result};

static PARAMETERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^=&#]+=[^=&#]*(?:&[^=&#]+=[^=&#]*)*$").expect("parameter regex is valid")
});

/// Parses `input` into a [`NamedReference`].
///
/// # Errors
///
/// Returns [`DataSourceError::MalformedReference`] when the input is blank or
/// leaves no locator once the name part and parameters are removed.
///
/// # Examples
///
/// ```rust
/// use tmplgen_cli::reference::parse;
///
/// let reference = parse("config=env:///")?;
/// assert_eq!(reference.name(), Some("config"));
/// assert_eq!(reference.locator(), "env:///");
///
/// let reference = parse("https://example.com/?q=1")?;
/// assert_eq!(reference.name(), None);
/// assert_eq!(reference.locator(), "https://example.com/?q=1");
/// # Ok::<(), tmplgen_cli::core::DataSourceError>(())
/// ```
pub fn parse(input: &str) -> Result<NamedReference> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(malformed(input, "reference is blank"));
    }

    let normalized = trimmed.replace('\\', "/");

    let (name, group, rest) = match split_name_part(&normalized) {
        Some((name_part, rest)) => {
            let (name, group) = split_name_and_group(name_part);
            (name, group, rest)
        }
        None => (None, None, normalized.as_str()),
    };

    let locator = rest.trim();
    if locator.is_empty() {
        return Err(malformed(input, "locator is empty"));
    }

    let (target, parameters) = split_parameters(locator);
    if target.is_empty() {
        return Err(malformed(input, "locator is empty"));
    }

    debug!(
        "Parsed reference '{}': name={:?} group={:?} target='{}' parameters={:?}",
        input, name, group, target, parameters
    );

    Ok(NamedReference::from_parts(name, group, locator.to_string(), target.to_string(), parameters))
}

/// Splits `name-part=` off the front, if the reference has one.
fn split_name_part(reference: &str) -> Option<(&str, &str)> {
    let eq = reference.find('=')?;

    if let Some(scheme) = reference.find(SCHEME_SEPARATOR) {
        if scheme < eq {
            return None;
        }
    }

    let name_part = &reference[..eq];
    if name_part.contains('#') || name_part.contains('/') {
        return None;
    }

    Some((name_part, &reference[eq + 1..]))
}

fn split_name_and_group(name_part: &str) -> (Option<String>, Option<String>) {
    match name_part.split_once(':') {
        Some((name, group)) => (non_blank(name), non_blank(group)),
        None => (non_blank(name_part), None),
    }
}

fn split_parameters(locator: &str) -> (&str, BTreeMap<String, String>) {
    let mut parameters = BTreeMap::new();

    let Some(hash) = locator.rfind('#') else {
        return (locator, parameters);
    };

    let fragment = &locator[hash + 1..];
    if !PARAMETERS.is_match(fragment) {
        return (locator, parameters);
    }

    for pair in fragment.split('&') {
        if let Some((key, value)) = pair.split_once('=') {
            parameters.insert(key.to_string(), value.to_string());
        }
    }

    (locator[..hash].trim_end(), parameters)
}

fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn malformed(input: &str, reason: &str) -> DataSourceError {
    DataSourceError::MalformedReference {
        reference: input.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input_is_malformed() {
        for input in ["", "   ", "\t\n"] {
            assert!(matches!(parse(input), Err(DataSourceError::MalformedReference { .. })));
        }
    }

    #[test]
    fn test_name_without_locator_is_malformed() {
        assert!(matches!(parse("name="), Err(DataSourceError::MalformedReference { .. })));
        assert!(matches!(parse("#charset=UTF-8"), Err(DataSourceError::MalformedReference { .. })));
    }

    #[test]
    fn test_plain_file_name() {
        let reference = parse("pom.xml").unwrap();
        assert_eq!(reference.name(), None);
        assert_eq!(reference.group(), None);
        assert_eq!(reference.locator(), "pom.xml");
        assert!(reference.parameters().is_empty());
    }

    #[test]
    fn test_env_without_name() {
        let reference = parse("env:///").unwrap();
        assert_eq!(reference.name(), None);
        assert_eq!(reference.group(), None);
        assert_eq!(reference.locator(), "env:///");
        assert!(reference.parameters().is_empty());
    }

    #[test]
    fn test_env_with_name() {
        let reference = parse("config=env:///").unwrap();
        assert_eq!(reference.name(), Some("config"));
        assert_eq!(reference.locator(), "env:///");

        let reference = parse("pwd=env:///PWD").unwrap();
        assert_eq!(reference.name(), Some("pwd"));
        assert!(reference.locator().ends_with("/PWD"));
    }

    #[test]
    fn test_name_and_group() {
        let reference = parse("users:csv=data/users.csv").unwrap();
        assert_eq!(reference.name(), Some("users"));
        assert_eq!(reference.group(), Some("csv"));
        assert_eq!(reference.locator(), "data/users.csv");

        let reference = parse(":csv=data/users.csv").unwrap();
        assert_eq!(reference.name(), None);
        assert_eq!(reference.group(), Some("csv"));

        let reference = parse("users:=data/users.csv").unwrap();
        assert_eq!(reference.name(), Some("users"));
        assert_eq!(reference.group(), None);

        let reference = parse(" users : csv = data/users.csv ").unwrap();
        assert_eq!(reference.name(), Some("users"));
        assert_eq!(reference.group(), Some("csv"));
        assert_eq!(reference.locator(), "data/users.csv");
    }

    #[test]
    fn test_fragment_parameters() {
        let reference = parse("users=file:///users.csv#charset=UTF-16&mimetype=text/csv").unwrap();
        assert_eq!(reference.name(), Some("users"));
        assert_eq!(reference.parameters().len(), 2);
        assert_eq!(reference.parameter("charset"), Some("UTF-16"));
        assert_eq!(reference.parameter("mimetype"), Some("text/csv"));
        assert_eq!(reference.target(), "file:///users.csv");
        assert_eq!(reference.locator(), "file:///users.csv#charset=UTF-16&mimetype=text/csv");
    }

    #[test]
    fn test_url_with_parameter_fragment_keeps_uri() {
        let reference = parse("http://google.com#charset=UTF-16").unwrap();
        assert_eq!(reference.name(), None);
        assert_eq!(reference.parameters().len(), 1);
        assert_eq!(reference.parameter("charset"), Some("UTF-16"));
        assert_eq!(reference.locator(), "http://google.com#charset=UTF-16");
        assert_eq!(reference.target(), "http://google.com");
    }

    #[test]
    fn test_non_parameter_fragment_stays_in_locator() {
        let reference = parse("https://example.com/docs#section-2").unwrap();
        assert!(reference.parameters().is_empty());
        assert_eq!(reference.target(), "https://example.com/docs#section-2");

        let reference = parse("https://example.com/#a=1&b").unwrap();
        assert!(reference.parameters().is_empty());
        assert_eq!(reference.target(), "https://example.com/#a=1&b");
    }

    #[test]
    fn test_equals_after_scheme_is_part_of_locator() {
        let reference = parse("https://example.com/search?q=rust&page=2").unwrap();
        assert_eq!(reference.name(), None);
        assert_eq!(reference.locator(), "https://example.com/search?q=rust&page=2");

        let reference = parse("search=https://example.com/search?q=rust").unwrap();
        assert_eq!(reference.name(), Some("search"));
        assert_eq!(reference.locator(), "https://example.com/search?q=rust");
    }

    #[test]
    fn test_equals_inside_path_is_part_of_locator() {
        let reference = parse("./reports/year=2024.csv").unwrap();
        assert_eq!(reference.name(), None);
        assert_eq!(reference.locator(), "./reports/year=2024.csv");

        let reference = parse("data.csv#charset=UTF-8").unwrap();
        assert_eq!(reference.name(), None);
        assert_eq!(reference.target(), "data.csv");
    }

    #[test]
    fn test_backslashes_are_normalized() {
        let reference = parse("data=C:\\work\\data\\users.csv").unwrap();
        assert_eq!(reference.name(), Some("data"));
        assert_eq!(reference.locator(), "C:/work/data/users.csv");

        let reference = parse("C:\\work\\users.csv").unwrap();
        assert_eq!(reference.name(), None);
        assert_eq!(reference.locator(), "C:/work/users.csv");
    }

    #[test]
    fn test_parameter_keys_are_case_sensitive() {
        let reference = parse("a.txt#Charset=UTF-16").unwrap();
        assert_eq!(reference.parameter("charset"), None);
        assert_eq!(reference.parameter("Charset"), Some("UTF-16"));
    }

    #[test]
    fn test_components_round_trip() {
        let cases = [
            ("users", "csv", "data/users.csv", "charset", "UTF-8"),
            ("cfg", "env", "env:///HOME", "mimeType", "text/plain"),
            ("page", "web", "https://example.com/index.html", "flavor", "vanilla"),
        ];

        for (name, group, locator, key, value) in cases {
            let input = format!("{name}:{group}={locator}#{key}={value}");
            let reference = parse(&input).unwrap();
            assert_eq!(reference.name(), Some(name));
            assert_eq!(reference.group(), Some(group));
            assert_eq!(reference.target(), locator);
            assert_eq!(reference.parameter(key), Some(value));
        }
    }
}
