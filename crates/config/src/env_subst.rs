/// Expand `${NAME}` and `${NAME:-fallback}` placeholders from the process environment.
///
/// Placeholders whose variable is unset (and have no fallback) are kept
/// verbatim, as is anything that is not a well-formed placeholder.
pub fn substitute_env(input: &str) -> String {
    expand(input, |name| std::env::var(name).ok())
}

pub(crate) fn expand(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };

        let body = &after[..end];
        let (name, fallback) = match body.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (body, None),
        };

        if is_var_name(name) {
            match (lookup(name), fallback) {
                (Some(value), _) => out.push_str(&value),
                (None, Some(fallback)) => out.push_str(fallback),
                (None, None) => out.push_str(&rest[start..start + 2 + end + 1]),
            }
        } else {
            out.push_str(&rest[start..start + 2 + end + 1]);
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}

fn is_var_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}
