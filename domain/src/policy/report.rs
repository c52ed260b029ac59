//! Text rendering of run outputs

use super::entities::{Decision, PolicyCard};
use std::fmt::Write;

/// Render the implementation plan for an approved decision.
pub fn render_implementation_plan(card: Option<&PolicyCard>, decision: &Decision) -> String {
    let title = card.map(|c| c.title.as_str()).unwrap_or("Policy");
    let mut out = String::new();

    let _ = writeln!(out, "[{} - Implementation Plan]", title);
    let _ = writeln!(out);
    let _ = writeln!(out, "1. Overall objective");
    let _ = writeln!(out, "{}", card.map(|c| c.summary.as_str()).unwrap_or_default());
    let _ = writeln!(out);
    let _ = writeln!(out, "2. Duration");
    let _ = writeln!(out, "{} months", card.map(|c| c.duration_months).unwrap_or(12));
    let _ = writeln!(out);
    let _ = writeln!(out, "3. Key measures");
    for (i, measure) in card.map(|c| c.key_measures.as_slice()).unwrap_or_default().iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, measure);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "4. Budget");
    let _ = writeln!(
        out,
        "Total budget: {:.0}",
        card.map(|c| c.estimated_budget).unwrap_or(0.0)
    );
    if !decision.conditions.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "5. Conditions");
        for (i, condition) in decision.conditions.iter().enumerate() {
            let _ = writeln!(out, "  {}. {}", i + 1, condition);
        }
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "{}. Next steps", if decision.conditions.is_empty() { 5 } else { 6 });
    for (i, step) in decision.next_steps.iter().enumerate() {
        let _ = writeln!(out, "  {}. {}", i + 1, step);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::entities::Issue;

    #[test]
    fn test_render_includes_measures_and_steps() {
        let card = PolicyCard::fallback_for(&Issue::new("i", "Bus lanes", "Add lanes"));
        let decision = Decision::default_approval(Some(&card));
        let text = render_implementation_plan(Some(&card), &decision);

        assert!(text.starts_with("[Bus lanes - Implementation Plan]"));
        assert!(text.contains("12 months"));
        assert!(text.contains("  1. Establish a dedicated delivery team"));
        assert!(text.contains("Total budget: 100000000"));
        assert!(text.contains("6. Next steps"));
        assert!(text.contains("  2. Launch a pilot"));
    }

    #[test]
    fn test_render_without_card() {
        let decision = Decision::new(true, "text", "why");
        let text = render_implementation_plan(None, &decision);
        assert!(text.starts_with("[Policy - Implementation Plan]"));
        assert!(text.contains("5. Next steps"));
    }
}
