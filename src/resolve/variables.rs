//! Aggregated results of multi-variable lookups.

use serde::Serialize;
use std::collections::BTreeMap;
use std::collections::btree_map;

/// Variable name to resolved value, ordered by name.
///
/// Returned by [`Resolver::get_all`](crate::resolve::Resolver::get_all) and
/// [`Resolver::get_all_for`](crate::resolve::Resolver::get_all_for).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ResolvedVariables {
    values: BTreeMap<String, String>,
}

impl ResolvedVariables {
    pub(crate) fn new(values: BTreeMap<String, String>) -> Self {
        Self { values }
    }

    /// The value of `name`, if it was resolved.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Number of resolved variables.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no variables were resolved.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Resolved variable names in name order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Take the underlying map.
    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.values
    }

    /// Render as `.env` file contents, one `NAME="value"` line per variable.
    ///
    /// Backslashes, double quotes and line breaks in values are escaped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use envar_registry::resolve::ResolvedVariables;
    /// # fn render(vars: &ResolvedVariables) {
    /// std::fs::write(".env.production", vars.to_dotenv()).ok();
    /// # }
    /// ```
    pub fn to_dotenv(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.values {
            out.push_str(name);
            out.push_str("=\"");
            for c in value.chars() {
                match c {
                    '\\' => out.push_str("\\\\"),
                    '"' => out.push_str("\\\""),
                    '\n' => out.push_str("\\n"),
                    '\r' => out.push_str("\\r"),
                    c => out.push(c),
                }
            }
            out.push_str("\"\n");
        }
        out
    }
}

impl IntoIterator for ResolvedVariables {
    type Item = (String, String);
    type IntoIter = btree_map::IntoIter<String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl FromIterator<(String, String)> for ResolvedVariables {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ResolvedVariables {
        [
            ("PORT".to_string(), "8080".to_string()),
            ("GREETING".to_string(), "say \"hi\"\nbye".to_string()),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_accessors() {
        let vars = sample();
        assert_eq!(vars.len(), 2);
        assert_eq!(vars.get("PORT"), Some("8080"));
        assert_eq!(vars.get("HOST"), None);
        assert_eq!(vars.names().collect::<Vec<_>>(), ["GREETING", "PORT"]);
    }

    #[test]
    fn test_to_dotenv() {
        assert_eq!(
            sample().to_dotenv(),
            "GREETING=\"say \\\"hi\\\"\\nbye\"\nPORT=\"8080\"\n"
        );
        assert_eq!(ResolvedVariables::default().to_dotenv(), "");
    }

    #[test]
    fn test_serializes_as_map() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["PORT"], "8080");
    }
}
