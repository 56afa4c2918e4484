//! Template rendering.
//!
//! Templates reference variables with `{{$name}}` markers. Rendering is
//! exact string substitution, not a templating language.

/// Substitute `{{$name}}` markers with their values.
///
/// The template is scanned once from left to right, so text inserted for
/// one variable is never rescanned for markers. Markers without a value are
/// left untouched.
///
/// # Example
/// ```
/// use structrag_prompt::render;
///
/// let text = render("Query: {{$query}}", &[("query", "What is Rust?")]);
/// assert_eq!(text, "Query: What is Rust?");
/// ```
pub fn render(template: &str, variables: &[(&str, &str)]) -> String {
    const OPEN: &str = "{{$";
    const CLOSE: &str = "}}";

    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        output.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];

        let Some(end) = after_open.find(CLOSE) else {
            output.push_str(&rest[start..]);
            return output;
        };

        let name = &after_open[..end];
        match variables.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => output.push_str(value),
            None => output.push_str(&rest[start..start + OPEN.len() + end + CLOSE.len()]),
        }

        rest = &after_open[end + CLOSE.len()..];
    }

    output.push_str(rest);
    output
}
