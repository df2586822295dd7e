//! `$VAR` / `${VAR}` expansion against the process environment.

use std::convert::Infallible;

/// Expands environment variable references in `input`.
///
/// Returns the expanded string and whether every referenced variable was present. Missing
/// variables expand to the empty string.
///
/// # Examples
///
/// ```
/// use jacket_config::expand::expand;
///
/// let (value, complete) = expand("plain text");
/// assert_eq!(value, "plain text");
/// assert!(complete);
///
/// let (value, complete) = expand("${JACKET_DOC_SURELY_UNSET}/data");
/// assert_eq!(value, "/data");
/// assert!(!complete);
/// ```
pub fn expand(input: &str) -> (String, bool) {
    let mut complete = true;
    let expanded = shellexpand::env_with_context(input, |name| -> Result<Option<String>, Infallible> {
        std::env::var(name).map_or_else(
            |_| {
                complete = false;
                Ok(Some(String::new()))
            },
            |value| Ok(Some(value)),
        )
    });
    let expanded = expanded.map_or_else(|_| input.to_owned(), std::borrow::Cow::into_owned);
    (expanded, complete)
}

/// Expands `input`, substituting missing variables with the empty string.
pub fn expand_lossy(input: &str) -> String {
    expand(input).0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_present() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("JACKET_HOST", "db.local");
            assert_eq!(expand("${JACKET_HOST}:3306"), ("db.local:3306".to_owned(), true));
            assert_eq!(expand("$JACKET_HOST"), ("db.local".to_owned(), true));
            Ok(())
        });
    }

    #[test]
    fn test_expand_missing() {
        let (value, complete) = expand("${JACKET_TEST_MISSING_VAR}:3306");
        assert_eq!(value, ":3306");
        assert!(!complete);
        assert_eq!(expand_lossy("a $JACKET_TEST_MISSING_VAR b"), "a  b");
    }
}
