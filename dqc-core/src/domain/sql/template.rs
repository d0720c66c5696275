// dqc-core/src/domain/sql/template.rs

use std::collections::BTreeMap;

use serde::Serialize;

/// Substitutes `$name` placeholders in `template` from `vars`, left to
/// right. `$$` is an escaped literal `$` and collapses to a single `$`.
/// Placeholders with no entry in `vars` are emitted untouched so a later
/// pass can resolve them.
pub fn substitute(template: &str, vars: &BTreeMap<String, String>) -> String {
    substitute_inner(template, vars, false)
}

/// Rule-level variant: `$$` escapes survive uncollapsed so the later
/// column-level pass still sees them as escapes, not as placeholders.
pub fn substitute_partial(template: &str, vars: &BTreeMap<String, String>) -> String {
    substitute_inner(template, vars, true)
}

fn substitute_inner(
    template: &str,
    vars: &BTreeMap<String, String>,
    keep_escapes: bool,
) -> String {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        match chars.peek() {
            Some((_, '$')) => {
                chars.next();
                out.push('$');
                if keep_escapes {
                    out.push('$');
                }
            }
            Some((start, d)) if d.is_ascii_alphabetic() || *d == '_' => {
                let start = *start;
                let mut end = start;
                while let Some((j, c)) = chars.peek() {
                    if c.is_ascii_alphanumeric() || *c == '_' {
                        end = *j + c.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let name = &template[start..end];
                match vars.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push('$');
                        out.push_str(name);
                    }
                }
            }
            _ => {
                // Lone '$' (end of string or before a non-identifier char)
                out.push('$');
            }
        }
    }
    out
}

/// Escapes literal `$` so a pattern can be embedded in a template without
/// later substitution passes misreading it.
pub fn escape_dollars(text: &str) -> String {
    text.replace('$', "$$")
}

/// True when `$name` occurs as a whole placeholder token in `text`.
pub fn references_placeholder(text: &str, name: &str) -> bool {
    let mut rest = text;
    while let Some(pos) = rest.find('$') {
        let after = &rest[pos + 1..];
        if let Some(stripped) = after.strip_prefix(name) {
            let terminated = stripped
                .chars()
                .next()
                .map_or(true, |c| !c.is_ascii_alphanumeric() && c != '_');
            if terminated {
                return true;
            }
        }
        rest = after;
    }
    false
}

/// A compiled rule template whose single remaining open placeholder is
/// `$column`, bound once the rule is attached to a rule binding.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SqlTemplate {
    sql: String,
}

impl SqlTemplate {
    pub fn new(sql: impl Into<String>) -> Self {
        SqlTemplate { sql: sql.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.sql
    }

    /// Column-level pass: resolves `$column` and unescapes `$$`.
    pub fn bind_column(&self, column_name: &str) -> String {
        let mut vars = BTreeMap::new();
        vars.insert("column".to_string(), column_name.to_string());
        substitute(&self.sql, &vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_substitute_known_and_unknown() {
        let out = substitute(
            "$column BETWEEN $lower_bound AND $upper_bound",
            &vars(&[("lower_bound", "0"), ("upper_bound", "10")]),
        );
        assert_eq!(out, "$column BETWEEN 0 AND 10");
    }

    #[test]
    fn test_longer_names_are_not_clobbered_by_prefixes() {
        let out = substitute("$upper vs $upper_bound", &vars(&[("upper", "X")]));
        assert_eq!(out, "X vs $upper_bound");
    }

    #[test]
    fn test_escaped_dollar_survives() {
        let out = substitute("REGEXP_CONTAINS(x, '^a$$')", &vars(&[]));
        assert_eq!(out, "REGEXP_CONTAINS(x, '^a$')");
    }

    #[test]
    fn test_partial_substitution_keeps_escapes() {
        let out = substitute_partial("$x > 0 AND y != '$$'", &vars(&[("x", "1")]));
        assert_eq!(out, "1 > 0 AND y != '$$'");
    }

    #[test]
    fn test_lone_dollar_passes_through() {
        assert_eq!(substitute("price in $ ", &vars(&[])), "price in $ ");
        assert_eq!(substitute("trailing $", &vars(&[])), "trailing $");
    }

    #[test]
    fn test_references_placeholder() {
        assert!(references_placeholder("$x > 1", "x"));
        assert!(references_placeholder("($limit)", "limit"));
        assert!(!references_placeholder("$limits > 1", "limit"));
        assert!(!references_placeholder("limit > 1", "limit"));
    }

    #[test]
    fn test_bind_column() {
        let t = SqlTemplate::new("$column IS NOT NULL");
        assert_eq!(t.bind_column("x"), "x IS NOT NULL");
    }
}
