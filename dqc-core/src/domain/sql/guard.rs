// dqc-core/src/domain/sql/guard.rs

use crate::domain::error::DomainError;

/// Statement separators and comment markers, rejected anywhere in a rule
/// SQL parameter. Checked before AND after argument substitution so
/// injection smuggled through argument values is caught too.
const FORBIDDEN_TOKENS: [&str; 5] = [";", "--", "/*", "*/", "#"];

pub fn reject_forbidden_tokens(rule_id: &str, text: &str) -> Result<(), DomainError> {
    for token in FORBIDDEN_TOKENS {
        if text.contains(token) {
            return Err(DomainError::InjectionRejected {
                rule_id: rule_id.to_string(),
                token: token.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_passes() {
        assert!(reject_forbidden_tokens("R", "$column > 0 AND $column < 10").is_ok());
    }

    #[test]
    fn test_every_forbidden_token_rejected_anywhere() {
        for token in [";", "#", "--", "/*", "*/"] {
            for text in [
                format!("{token}leading"),
                format!("mid{token}dle"),
                format!("trailing{token}"),
            ] {
                let err = reject_forbidden_tokens("R", &text).unwrap_err();
                match err {
                    DomainError::InjectionRejected { rule_id, .. } => assert_eq!(rule_id, "R"),
                    other => panic!("unexpected error: {other}"),
                }
            }
        }
    }

    #[test]
    fn test_single_dash_is_fine() {
        assert!(reject_forbidden_tokens("R", "a - b").is_ok());
    }
}
