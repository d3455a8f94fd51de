/// Replace `${ENV_VAR}` and `${ENV_VAR:-fallback}` placeholders in raw config text.
///
/// Unresolvable variables without a fallback are left as-is.
pub fn substitute_env(input: &str) -> String {
    substitute_with(input, |name| std::env::var(name).ok())
}

/// Same as [`substitute_env`] but resolves variables through `lookup`.
pub fn substitute_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' || chars.peek() != Some(&'{') {
            result.push(ch);
            continue;
        }
        chars.next(); // consume '{'

        let mut placeholder = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == '}' {
                closed = true;
                break;
            }
            placeholder.push(c);
        }

        if !closed || placeholder.is_empty() {
            result.push_str("${");
            result.push_str(&placeholder);
            if closed {
                result.push('}');
            }
            continue;
        }

        let (name, fallback) = match placeholder.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (placeholder.as_str(), None),
        };

        match (lookup(name), fallback) {
            (Some(val), _) => result.push_str(&val),
            (None, Some(fallback)) => result.push_str(fallback),
            (None, None) => {
                result.push_str("${");
                result.push_str(&placeholder);
                result.push('}');
            },
        }
    }

    result
}
