//! Search query tokenization
//!
//! A query is a whitespace-separated list of tokens. A token is either a bare
//! term or `key:value`. Double quotes group words containing whitespace,
//! both for bare terms (`"two words"`) and values (`has-flag:"needs review"`).

/// One query token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryToken {
    /// Filter key, empty for bare terms
    pub key: String,
    pub value: String,
}

impl QueryToken {
    fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The token as written, minus quotes
    pub fn text(&self) -> String {
        if self.key.is_empty() {
            self.value.clone()
        } else {
            format!("{}:{}", self.key, self.value)
        }
    }
}

fn strip_quotes(text: &str) -> &str {
    let text = text.strip_prefix('"').unwrap_or(text);
    text.strip_suffix('"').unwrap_or(text)
}

fn split_raw_tokens(query: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in query.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                current.push(c);
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

/// Split a query into tokens
pub fn tokenize(query: &str) -> Vec<QueryToken> {
    split_raw_tokens(query)
        .into_iter()
        .filter_map(|raw| {
            let token = match raw.split_once(':') {
                Some((key, value)) if !key.is_empty() && !key.contains('"') => {
                    QueryToken::new(key, strip_quotes(value))
                }
                _ => QueryToken::new("", strip_quotes(&raw)),
            };
            (!token.value.is_empty() || !token.key.is_empty()).then_some(token)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_terms() {
        assert_eq!(
            tokenize("  rust   async "),
            vec![QueryToken::new("", "rust"), QueryToken::new("", "async")]
        );
        assert!(tokenize("").is_empty());
        assert!(tokenize("\"\"").is_empty());
    }

    #[test]
    fn test_key_value_and_quotes() {
        assert_eq!(
            tokenize(r#"has-flag:"needs review" "exact phrase" links-to:other"#),
            vec![
                QueryToken::new("has-flag", "needs review"),
                QueryToken::new("", "exact phrase"),
                QueryToken::new("links-to", "other"),
            ]
        );
    }

    #[test]
    fn test_value_may_contain_colons() {
        assert_eq!(
            tokenize("has-url:https://example.com"),
            vec![QueryToken::new("has-url", "https://example.com")]
        );
        assert_eq!(tokenize("has-url:").len(), 1);
    }

    #[test]
    fn test_token_text() {
        assert_eq!(QueryToken::new("ft", "word").text(), "ft:word");
        assert_eq!(QueryToken::new("", "word").text(), "word");
    }
}
