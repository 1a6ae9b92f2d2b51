//! Identifier-to-column-name normalization.

/// Common initialisms folded into a single word segment before case
/// splitting, ordered longest first so e.g. `UUID` wins over `UID`.
const INITIALISMS: &[&str] = &[
    "ASCII", "HTTPS", "ASIN", "GUID", "HTML", "HTTP", "ISBN", "JSON", "SMTP", "UTF8", "UUID",
    "XSRF", "API", "CPU", "CSS", "DNS", "EOF", "LHS", "QPS", "RAM", "RHS", "RPC", "SKU", "SLA",
    "SSH", "TLS", "TTL", "UID", "UPC", "URI", "URL", "XML", "XSS", "ID", "IP", "UI", "VM",
];

/// Converts an identifier-style name into a lowercase underscore-separated
/// column name: initialisms are kept as single word segments, an underscore
/// is inserted before each maximal run of uppercase letters, runs of
/// non-alphanumeric characters collapse to a single underscore, and the
/// result is lowercased and trimmed. Applying it to an already-normalized
/// name is a no-op.
#[must_use]
pub fn column_name(name: &str) -> String {
    let folded = fold_initialisms(name);

    let mut out = String::with_capacity(folded.len() + 4);
    let mut prev_upper = false;
    for ch in folded.chars() {
        let upper = ch.is_ascii_uppercase();
        if upper && !prev_upper && !out.ends_with('_') {
            out.push('_');
        }
        prev_upper = upper;

        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }

    out.trim_matches('_').to_string()
}

/// Rewrites each initialism occurrence in title case (`URL` -> `Url`) so the
/// case-splitting pass treats it as one word. A match is only taken at a
/// word boundary: `HTTPServer` folds `HTTP`, not `HTTPS`.
fn fold_initialisms(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut rest = name;

    'scan: while !rest.is_empty() {
        for word in INITIALISMS {
            if let Some(tail) = rest.strip_prefix(word) {
                if tail.chars().next().is_none_or(|next| !next.is_ascii_lowercase()) {
                    let mut chars = word.chars();
                    if let Some(first) = chars.next() {
                        out.push(first);
                    }
                    out.extend(chars.map(|ch| ch.to_ascii_lowercase()));
                    rest = tail;
                    continue 'scan;
                }
            }
        }

        let Some(ch) = rest.chars().next() else {
            break;
        };
        out.push(ch);
        rest = &rest[ch.len_utf8()..];
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_camel_case() {
        assert_eq!(column_name("CreatedAt"), "created_at");
        assert_eq!(column_name("User"), "user");
        assert_eq!(column_name("accountBalance"), "account_balance");
    }

    #[test]
    fn keeps_initialisms_whole() {
        assert_eq!(column_name("UserID"), "user_id");
        assert_eq!(column_name("SourceURL"), "source_url");
        assert_eq!(column_name("APIKey"), "api_key");
        assert_eq!(column_name("UUID"), "uuid");
    }

    #[test]
    fn folds_at_word_boundaries() {
        // `HTTPS` must not swallow the `S` of `Server`.
        assert_eq!(column_name("HTTPServer"), "http_server");
        assert_eq!(column_name("HTTPSProxy"), "https_proxy");
        assert_eq!(column_name("UIDesign"), "ui_design");
    }

    #[test]
    fn collapses_non_alphanumerics() {
        assert_eq!(column_name("Foo Bar-Baz"), "foo_bar_baz");
        assert_eq!(column_name("__Weird__Name__"), "weird_name");
    }

    #[test]
    fn normalized_names_are_a_fixed_point() {
        for name in ["user_id", "created_at", "http_server", "a1_b2"] {
            assert_eq!(column_name(name), name);
        }
        let once = column_name("ParseURLPath");
        assert_eq!(column_name(&once), once);
    }
}
