//! Deterministic cache key construction
//!
//! Keys are built from a semantic namespace plus arguments through a static
//! template table, so an entity's cached state shares a common prefix and can
//! be invalidated en masse with a pattern. Identical `(namespace, args)`
//! always yield an identical key.

/// Static table of namespace -> key template mappings.
///
/// Placeholders `{0}`, `{1}`, ... are substituted positionally.
const NAMESPACE_TEMPLATES: &[(&str, &str)] = &[
    ("user", "user:{0}"),
    ("user_profile", "user:{0}:profile"),
    ("member", "member:{0}"),
    ("membership", "member:{0}:membership"),
    ("credits", "member:{0}:credits"),
    ("points", "member:{0}:points"),
    ("order", "order:{0}"),
    ("order_items", "order:{0}:items"),
    ("session", "session:{0}"),
    ("config", "config:{0}"),
    ("stats", "stats:{0}:{1}"),
];

/// Build a cache key from a namespace and arguments.
///
/// Unknown namespaces fall back to `namespace:arg0:arg1:...`. Arguments
/// beyond the template's placeholders are appended colon-joined, so extra
/// context can never be silently dropped from the key.
pub fn build(namespace: &str, args: &[&str]) -> String {
    let template = NAMESPACE_TEMPLATES
        .iter()
        .find(|(ns, _)| *ns == namespace)
        .map(|(_, template)| *template);

    match template {
        Some(template) => render(template, args),
        None => {
            let mut key = namespace.to_string();
            for arg in args {
                key.push(':');
                key.push_str(arg);
            }
            key
        }
    }
}

/// Build a memoization key from a function name and its serialized arguments
pub fn memo_key(func: &str, args_json: &str) -> String {
    format!("memo:{}:{}", func, args_json)
}

fn render(template: &str, args: &[&str]) -> String {
    let mut key = template.to_string();
    let mut extra = Vec::new();

    for (i, arg) in args.iter().enumerate() {
        let placeholder = format!("{{{}}}", i);
        if key.contains(&placeholder) {
            key = key.replace(&placeholder, arg);
        } else {
            extra.push(*arg);
        }
    }

    for arg in extra {
        key.push(':');
        key.push_str(arg);
    }

    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_namespace() {
        assert_eq!(build("user", &["42"]), "user:42");
        assert_eq!(build("credits", &["42"]), "member:42:credits");
        assert_eq!(build("stats", &["daily", "2024-01-01"]), "stats:daily:2024-01-01");
    }

    #[test]
    fn test_unknown_namespace_fallback() {
        assert_eq!(build("invoice", &["7", "pdf"]), "invoice:7:pdf");
        assert_eq!(build("invoice", &[]), "invoice");
    }

    #[test]
    fn test_extra_args_appended() {
        assert_eq!(build("user", &["42", "emails"]), "user:42:emails");
    }

    #[test]
    fn test_determinism() {
        let a = build("order", &["1001"]);
        let b = build("order", &["1001"]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_memo_key() {
        let key = memo_key("monthly_report", r#"{"month":1,"year":2024}"#);
        assert_eq!(key, r#"memo:monthly_report:{"month":1,"year":2024}"#);
    }
}
