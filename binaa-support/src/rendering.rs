//! Text rendering utilities for human-friendly diagnostics.
//!
//! Provides helpers to format cycle chains, result paths, qualified
//! type names and "did you mean?" suggestions.

/// Renders a cycle as a readable chain. Each entry depends on the next.
///
/// # Examples
/// ```
/// use binaa_support::rendering::render_chain;
///
/// let chain = vec!["#0 new_a", "#1 new_b", "#0 new_a"];
/// let rendered = render_chain(&chain);
/// assert_eq!(rendered, "#0 new_a → #1 new_b → #0 new_a");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Joins result path segments into the dotted provenance form.
///
/// ```
/// use binaa_support::rendering::render_path;
///
/// assert_eq!(render_path(&["[1]", "Foo", "Bar"]), "[1].Foo.Bar");
/// ```
pub fn render_path(segments: &[impl AsRef<str>]) -> String {
    segments
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(".")
}

/// Renders a type with its qualifiers, e.g. `Database[name = "ro"]`.
///
/// Returns the bare type when there are no qualifiers.
///
/// ```
/// use binaa_support::rendering::render_qualified;
///
/// let tokens = vec!["optional".to_string(), "name = \"ro\"".to_string()];
/// assert_eq!(render_qualified("Conn", &tokens), "Conn[optional, name = \"ro\"]");
/// assert_eq!(render_qualified("Conn", &[]), "Conn");
/// ```
pub fn render_qualified(type_name: &str, tokens: &[String]) -> String {
    if tokens.is_empty() {
        return type_name.to_string();
    }
    format!("{}[{}]", type_name, tokens.join(", "))
}

/// Shortens a fully qualified type name for display.
///
/// ```
/// use binaa_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::services::user::UserService");
/// assert_eq!(short, "UserService");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>");
/// assert_eq!(short, "Arc<dyn Logger>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    // "my_app::services::UserService" → "UserService"
    // "Arc<dyn my_app::Logger>" → "Arc<dyn Logger>"
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut current_segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                current_segment.clear();
            }
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | '&' | ';' => {
                result.push_str(&current_segment);
                result.push(ch);
                current_segment.clear();
            }
            _ => {
                current_segment.push(ch);
            }
        }
    }

    result.push_str(&current_segment);
    result
}

/// A registered slot that may be offered as a suggestion.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    /// Full type name of the slot.
    pub type_name: &'a str,
    /// Name or group; empty for the default slot of a type.
    pub qualifier: &'a str,
    pub grouped: bool,
    /// How the slot is shown to the user.
    pub label: String,
}

/// "Did you mean?" suggestions for a slot with no provider.
///
/// The same type under another name or group ranks first, then the
/// same type name from another module, then similarly named types.
///
/// ```
/// use binaa_support::rendering::{Candidate, suggest_similar};
///
/// let slot = |type_name: &'static str, qualifier: &'static str| Candidate {
///     type_name,
///     qualifier,
///     grouped: false,
///     label: format!("{type_name}[{qualifier}]"),
/// };
/// let available = [slot("app::Logger", ""), slot("app::Database", "replica")];
/// let found = suggest_similar(&slot("app::Database", "replca"), &available, 3);
/// assert_eq!(found, vec!["app::Database[replica]".to_string()]);
/// ```
pub fn suggest_similar(
    requested: &Candidate<'_>,
    available: &[Candidate<'_>],
    max_suggestions: usize,
) -> Vec<String> {
    let mut scored: Vec<(&Candidate<'_>, usize)> = available
        .iter()
        .filter_map(|candidate| score(requested, candidate).map(|s| (candidate, s)))
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.label.cmp(&b.0.label)));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(candidate, _)| candidate.label.clone())
        .collect()
}

fn score(requested: &Candidate<'_>, candidate: &Candidate<'_>) -> Option<usize> {
    let same_kind = candidate.grouped == requested.grouped;
    if candidate.type_name == requested.type_name {
        if same_kind && candidate.qualifier == requested.qualifier {
            return None;
        }
        let base = if same_kind { 200 } else { 180 };
        return Some(base + common_prefix(candidate.qualifier, requested.qualifier));
    }

    let requested_short = shorten_type_name(requested.type_name).to_lowercase();
    let short = shorten_type_name(candidate.type_name).to_lowercase();
    let qualifier_bonus = usize::from(same_kind && candidate.qualifier == requested.qualifier) * 5;

    if short == requested_short {
        return Some(150 + qualifier_bonus);
    }
    if short.contains(&requested_short) || requested_short.contains(&short) {
        return Some(80 + qualifier_bonus);
    }
    let common = common_prefix(&short, &requested_short);
    (common >= 3).then(|| (common * 10).min(70) + qualifier_bonus)
}

fn common_prefix(a: &str, b: &str) -> usize {
    a.chars().zip(b.chars()).take_while(|(x, y)| x == y).count()
}
