//! Round-by-round selection of disputes to settle.
//!
//! The random source is injected as a `draw` closure returning values in
//! `[0, 1)`, so the selection itself stays deterministic for a given stream.

use super::entities::Dispute;

/// Disputes chosen for settlement in one round
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RoundSelection {
    /// Ids in settlement order (highest severity first)
    pub selected: Vec<String>,
    /// True when nothing was drawn and the top dispute was forced
    pub forced: bool,
}

/// Pick which open disputes settle in `round`.
///
/// Open disputes are ordered by severity, highest first (stable). On the
/// final round all of them are selected. Otherwise each is selected when
/// `draw() <= p(severity, round)`; if none is, the first one is forced so
/// every round makes progress.
pub fn select_for_round<F>(open: &[&Dispute], round: u32, is_final: bool, mut draw: F) -> RoundSelection
where
    F: FnMut() -> f64,
{
    let mut ordered: Vec<&Dispute> = open.iter().copied().filter(|d| !d.is_resolved()).collect();
    ordered.sort_by_key(|d| std::cmp::Reverse(d.severity.weight()));

    if is_final {
        return RoundSelection {
            selected: ordered.iter().map(|d| d.id.clone()).collect(),
            forced: false,
        };
    }

    let selected: Vec<String> = ordered
        .iter()
        .filter(|d| draw() <= d.severity.resolve_probability(round))
        .map(|d| d.id.clone())
        .collect();

    if selected.is_empty()
        && let Some(first) = ordered.first()
    {
        return RoundSelection {
            selected: vec![first.id.clone()],
            forced: true,
        };
    }

    RoundSelection {
        selected,
        forced: false,
    }
}

/// Share of disputes resolved, in `[0, 1]`
pub fn convergence_score(resolved: usize, total: usize) -> f64 {
    (resolved as f64 / total.max(1) as f64).min(1.0)
}

/// Whether a score is close enough to full agreement
pub fn is_converged(score: f64, threshold: f64) -> bool {
    score >= 1.0 - threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispute::entities::Severity;

    fn disputes() -> Vec<Dispute> {
        vec![
            Dispute::new("low", "a", Severity::Low),
            Dispute::new("high", "b", Severity::High),
            Dispute::new("medium", "c", Severity::Medium),
        ]
    }

    #[test]
    fn test_high_severity_ordered_first() {
        let all = disputes();
        let open: Vec<&Dispute> = all.iter().collect();
        let selection = select_for_round(&open, 1, false, || 0.0);
        assert_eq!(selection.selected, vec!["high", "medium", "low"]);
        assert!(!selection.forced);
    }

    #[test]
    fn test_probabilistic_selection() {
        let all = disputes();
        let open: Vec<&Dispute> = all.iter().collect();
        // round 1: high 0.1, medium 0.2, low 0.6
        let draws = [0.5, 0.5, 0.5];
        let mut it = draws.iter();
        let selection = select_for_round(&open, 1, false, || *it.next().unwrap());
        assert_eq!(selection.selected, vec!["low"]);
    }

    #[test]
    fn test_forces_top_dispute_when_none_drawn() {
        let all = disputes();
        let open: Vec<&Dispute> = all.iter().collect();
        let selection = select_for_round(&open, 1, false, || 0.99);
        assert_eq!(selection.selected, vec!["high"]);
        assert!(selection.forced);
    }

    #[test]
    fn test_final_round_selects_everything() {
        let all = disputes();
        let open: Vec<&Dispute> = all.iter().collect();
        let selection = select_for_round(&open, 2, true, || 1.0);
        assert_eq!(selection.selected.len(), 3);
    }

    #[test]
    fn test_resolved_disputes_are_skipped() {
        let mut all = disputes();
        all[1].resolve("done").unwrap();
        let open: Vec<&Dispute> = all.iter().collect();
        let selection = select_for_round(&open, 1, false, || 0.99);
        assert_eq!(selection.selected, vec!["medium"]);
    }

    #[test]
    fn test_empty_open_set() {
        let selection = select_for_round(&[], 1, false, || 0.0);
        assert!(selection.selected.is_empty());
        assert!(!selection.forced);
    }

    #[test]
    fn test_convergence() {
        assert_eq!(convergence_score(0, 0), 0.0);
        assert_eq!(convergence_score(3, 4), 0.75);
        assert!(is_converged(0.9, 0.15));
        assert!(!is_converged(0.75, 0.15));
        assert!(is_converged(1.0, 0.0));
    }
}
