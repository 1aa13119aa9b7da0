//! Prompt rendering and completion normalization.

use crate::directory::EntityContext;

/// Substitute context values into a slot template.
///
/// Single left-to-right pass: substituted values are never rescanned, so braces
/// inside directory data come through verbatim. Unknown `{...}` tokens are left
/// untouched; missing identity attributes render as "Unknown".
pub fn render_template(template: &str, ctx: &EntityContext) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let Some(close) = tail.find('}') else {
            rest = tail;
            break;
        };
        let name = &tail[1..close];
        match placeholder_value(name, ctx) {
            Some(value) => {
                out.push_str(&value);
                rest = &tail[close + 1..];
            }
            None => {
                // copy the brace and resume scanning after it
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn placeholder_value(name: &str, ctx: &EntityContext) -> Option<String> {
    let candidate = &ctx.candidate;
    let or_unknown = |value: &Option<String>| value.clone().unwrap_or_else(|| "Unknown".to_string());

    let value = match name {
        "entity" => ctx.entity_name.clone(),
        "entity_code" => ctx.entity_code.clone(),
        "candidate" => candidate.name.clone(),
        "party" => candidate.party.clone(),
        "swot" => candidate.swot.clone(),
        "sentiment" => ctx.sentiment.label(),
        "avg_sentiment" => format!("{:.3}", ctx.sentiment.avg_score),
        "positive_pct" => format!("{:.1}", ctx.sentiment.positive_pct),
        "negative_pct" => format!("{:.1}", ctx.sentiment.negative_pct),
        "top_issue" => ctx.top_issue.clone(),
        "caste" => or_unknown(&candidate.caste),
        "religion" => or_unknown(&candidate.religion),
        "age" => candidate
            .age
            .map(|a| a.to_string())
            .unwrap_or_else(|| "Unknown".to_string()),
        "gender" => or_unknown(&candidate.gender),
        "education" => or_unknown(&candidate.education),
        "profession" => or_unknown(&candidate.profession),
        _ => return None,
    };
    Some(value)
}

/// Drop blank lines and trim each remaining line.
pub fn normalize_completion(raw: &str) -> String {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
