use mailforge_model::Context;

/// Replace every `{{key}}` whose key is in `context` with the value's string
/// form. Unknown keys are left as literal text.
///
/// This is a single left-to-right pass, so substituted values are never
/// scanned again and the result does not depend on context order.
pub fn interpolate(content: &str, context: &Context) -> String {
    if context.is_empty() || !content.contains("{{") {
        return content.to_string();
    }

    let mut out = String::with_capacity(content.len());
    let mut rest = content;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + 2..];

        if let Some(end) = after_open.find("}}") {
            if let Some(value) = context.get(&after_open[..end]) {
                out.push_str(&value.to_string());
                rest = &after_open[end + 2..];
                continue;
            }
        }

        // No match here; emit one brace and rescan from the next one.
        out.push('{');
        rest = &rest[start + 1..];
    }

    out.push_str(rest);
    out
}
