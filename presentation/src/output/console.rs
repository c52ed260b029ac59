//! Console output formatter for council runs

use colored::Colorize;
use council_application::RunSummary;
use council_domain::{
    Decision, NegotiationOutcome, Position, RunStatus, SettlementStatus, SharedState, TraceEvent,
};

/// Formats council results for console display
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Format every part of a run
    pub fn format(state: &SharedState) -> String {
        let mut output = String::new();

        output.push_str(&Self::header("Policy Council Run"));
        output.push('\n');
        output.push_str(&Self::run_line(state));

        if let Some(card) = &state.policy_card {
            output.push_str(&Self::section_header("Policy Card"));
            output.push_str(&format!("{} ({})\n", card.title.bold(), state.policy_version));
            output.push_str(&format!("{}\n", card.summary));
            output.push_str(&format!(
                "Budget {:.0} | {} months | {} people affected\n",
                card.estimated_budget, card.duration_months, card.affected_population
            ));
            for measure in &card.key_measures {
                output.push_str(&format!("  * {}\n", measure));
            }
        }

        if !state.memos.is_empty() {
            output.push_str(&Self::section_header("Department Memos"));
            for memo in &state.memos {
                output.push_str(&format!(
                    "\n{} {}\n{}\n",
                    format!("── {} ──", memo.department).yellow().bold(),
                    Self::position(memo.position),
                    memo.rationale
                ));
                for concern in &memo.concerns {
                    output.push_str(&format!("  ! {}\n", concern));
                }
            }
        }

        if !state.disputes.is_empty() {
            output.push_str(&Self::section_header("Disputes"));
            for dispute in &state.disputes {
                output.push_str(&format!(
                    "[{}] {} ({}) - {}\n",
                    dispute.severity,
                    dispute.topic.bold(),
                    dispute
                        .departments
                        .iter()
                        .map(|d| d.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                    dispute.status()
                ));
                if let Some(resolution) = &dispute.resolution {
                    output.push_str(&format!("  -> {}\n", resolution));
                }
            }
        }

        if !state.negotiation_history.is_empty() {
            output.push_str(&Self::section_header("Negotiation Rounds"));
            for round in &state.negotiation_history {
                output.push_str(&format!(
                    "Round {}: resolved {} | remaining {} | convergence {:.2}\n",
                    round.round_number,
                    round.disputes_addressed.len(),
                    round.remaining_disputes.len(),
                    round.convergence_score
                ));
            }
        }

        if let Some(settlement) = &state.dimension_settlement {
            output.push_str(&Self::section_header("Dimension Settlement"));
            output.push_str(&format!(
                "{} after {} round(s)\n",
                Self::settlement(settlement.status),
                settlement.rounds
            ));
            for (dimension, value) in &settlement.compromise {
                output.push_str(&format!("  {}: {}\n", dimension, value));
            }
        }

        if !state.gate_results.is_empty() {
            output.push_str(&Self::section_header("Review Gates"));
            for gate in &state.gate_results {
                let verdict = if gate.passed { "PASS".green() } else { "FAIL".red() };
                output.push_str(&format!("{} {}\n", verdict.bold(), gate.gate_name));
                for issue in &gate.issues {
                    output.push_str(&format!("  ! {}\n", issue));
                }
            }
        }

        if let Some(decision) = &state.decision {
            output.push_str(&Self::section_header("Decision"));
            output.push_str(&Self::decision(decision));
        }

        if !state.artifacts.is_empty() {
            output.push_str(&Self::section_header("Artifacts"));
            for artifact in &state.artifacts {
                output.push_str(&format!(
                    "  {} ({}, {} bytes)\n",
                    artifact.path, artifact.kind, artifact.size_bytes
                ));
            }
        }

        if let Some(error) = &state.error_message {
            output.push_str(&format!("\n{} {}\n", "Error:".red().bold(), error));
        }

        output.push_str(&Self::footer());
        output
    }

    /// Outcome and decision only
    pub fn format_summary(state: &SharedState) -> String {
        let mut output = String::new();
        output.push_str(&format!("{}\n\n", "=== Council Outcome ===".cyan().bold()));
        output.push_str(&Self::run_line(state));
        output.push('\n');

        match (&state.decision, &state.error_message) {
            (_, Some(error)) if state.run_status == RunStatus::Failed => {
                output.push_str(&format!("{} {}\n", "Failed:".red().bold(), error));
            }
            (Some(decision), _) => output.push_str(&Self::decision(decision)),
            (None, _) => output.push_str(&format!("{}\n", "No decision recorded".dimmed())),
        }
        output
    }

    /// Format as JSON
    pub fn format_json(state: &SharedState) -> String {
        serde_json::to_string_pretty(state).unwrap_or_else(|_| "{}".to_string())
    }

    /// Table of stored runs
    pub fn format_run_list(runs: &[RunSummary]) -> String {
        if runs.is_empty() {
            return format!("{}\n", "No runs stored".dimmed());
        }

        let mut output = format!(
            "{:<34} {:<10} {:<32} {}\n",
            "RUN".bold(),
            "STATUS".bold(),
            "STAGE".bold(),
            "TITLE".bold()
        );
        for run in runs {
            output.push_str(&format!(
                "{:<34} {:<10} {:<32} {}\n",
                run.run_id,
                Self::status(run.status),
                run.stage.as_str(),
                run.title
            ));
        }
        output
    }

    /// One line per trace event
    pub fn format_trace(events: &[TraceEvent]) -> String {
        let mut output = Self::section_header("Trace");
        for event in events {
            let agent = event
                .agent_id
                .as_ref()
                .map(|a| format!(" [{}]", a))
                .unwrap_or_default();
            output.push_str(&format!(
                "{} {:<22} {:<20}{} {}\n",
                event.timestamp.format("%H:%M:%S").to_string().dimmed(),
                event.stage.as_str(),
                event.event_type.as_str().cyan(),
                agent,
                event.message
            ));
        }
        output
    }

    /// Result of an offline dimension negotiation
    pub fn format_negotiation(outcome: &NegotiationOutcome) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("Dimension Negotiation"));
        output.push_str(&format!(
            "\n{} {}\n{} {} after {} round(s)\n",
            "Issue:".cyan().bold(),
            outcome.issue_id,
            "Status:".cyan().bold(),
            Self::settlement(outcome.status),
            outcome.rounds_run()
        ));

        output.push_str(&Self::section_header("Rounds"));
        for round in &outcome.rounds {
            let conflict = round.conflict_dimension.as_deref().unwrap_or("-");
            output.push_str(&format!(
                "Round {}: widest spread on {} ({:.2})\n",
                round.round, conflict, round.conflict_level
            ));
        }

        output.push_str(&Self::section_header("Final Proposals"));
        for (negotiator, proposal) in &outcome.final_proposals {
            let values: Vec<String> = proposal
                .iter()
                .map(|(dimension, value)| format!("{}={}", dimension, value))
                .collect();
            output.push_str(&format!("  {:<12} {}\n", negotiator, values.join(", ")));
        }

        output.push_str(&Self::section_header("Compromise"));
        for (dimension, value) in &outcome.compromise {
            output.push_str(&format!("  {}: {}\n", dimension.bold(), value));
        }
        output.push_str(&Self::footer());
        output
    }

    fn run_line(state: &SharedState) -> String {
        format!(
            "{} {}\n{} {}\n{} {} ({})\n",
            "Run:".cyan().bold(),
            state.run_id,
            "Issue:".cyan().bold(),
            state.issue.title,
            "Status:".cyan().bold(),
            Self::status(state.run_status),
            state.current_stage.display_name()
        )
    }

    fn decision(decision: &Decision) -> String {
        let verdict = if decision.approved {
            "APPROVED".green().bold()
        } else {
            "REJECTED".red().bold()
        };
        let mut output = format!("{}\n{}\n", verdict, decision.rationale);
        if !decision.conditions.is_empty() {
            output.push_str(&format!("\n{}\n", "Conditions:".yellow().bold()));
            for condition in &decision.conditions {
                output.push_str(&format!("  * {}\n", condition));
            }
        }
        if !decision.next_steps.is_empty() {
            output.push_str(&format!("\n{}\n", "Next steps:".cyan().bold()));
            for step in &decision.next_steps {
                output.push_str(&format!("  * {}\n", step));
            }
        }
        output
    }

    fn position(position: Position) -> String {
        match position {
            Position::Support => position.as_str().green().to_string(),
            Position::Oppose => position.as_str().red().to_string(),
            Position::Conditional => position.as_str().yellow().to_string(),
        }
    }

    fn status(status: RunStatus) -> String {
        match status {
            RunStatus::Completed => status.as_str().green().to_string(),
            RunStatus::Failed => status.as_str().red().to_string(),
            _ => status.as_str().yellow().to_string(),
        }
    }

    fn settlement(status: SettlementStatus) -> String {
        match status {
            SettlementStatus::Resolved => status.as_str().green().to_string(),
            SettlementStatus::ForcedResolution => status.as_str().yellow().to_string(),
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn section_header(title: &str) -> String {
        format!("\n{}\n{}\n", title.cyan().bold(), "-".repeat(40))
    }

    fn footer() -> String {
        format!("\n{}\n", "=".repeat(60).cyan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{
        Constraints, Dimension, GateResult, Issue, Memo, NegotiationEngine, Negotiator,
    };

    fn plain() {
        colored::control::set_override(false);
    }

    fn state() -> SharedState {
        let mut state = SharedState::new(
            "run_1",
            Issue::new("greening", "Urban Greening", "Plant trees"),
            Constraints::default(),
        );
        state.start();
        state.add_memo(Memo::new("finance", Position::Oppose, "Too expensive"));
        state.gate_results.push(GateResult::new("legal_review_gate", true));
        state
    }

    #[test]
    fn test_format_full_run() {
        plain();
        let mut state = state();
        state.set_decision(Decision::new(true, "Final text", "Benefits outweigh costs"));
        state.complete();

        let output = ConsoleFormatter::format(&state);
        assert!(output.contains("Urban Greening"));
        assert!(output.contains("── finance ──"));
        assert!(output.contains("oppose"));
        assert!(output.contains("PASS legal_review_gate"));
        assert!(output.contains("APPROVED"));
    }

    #[test]
    fn test_summary_shows_failure() {
        plain();
        let mut state = state();
        state.fail("fiscal_capacity_review_gate failed: over budget");

        let output = ConsoleFormatter::format_summary(&state);
        assert!(output.contains("Failed: fiscal_capacity_review_gate failed"));
        assert!(!output.contains("APPROVED"));
    }

    #[test]
    fn test_run_list() {
        plain();
        assert!(ConsoleFormatter::format_run_list(&[]).contains("No runs stored"));

        let runs = vec![RunSummary::from(&state())];
        let output = ConsoleFormatter::format_run_list(&runs);
        assert!(output.contains("run_1"));
        assert!(output.contains("running"));
        assert!(output.contains("Urban Greening"));
    }

    #[test]
    fn test_json_is_the_snapshot() {
        let state = state();
        let parsed: SharedState = serde_json::from_str(&ConsoleFormatter::format_json(&state)).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn test_format_negotiation() {
        plain();
        let outcome = NegotiationEngine::new(Negotiator::departments())
            .run("greening", &[Dimension::continuous("subsidy_rate", 0.0, 1.0)])
            .unwrap();
        let output = ConsoleFormatter::format_negotiation(&outcome);
        assert!(output.contains("subsidy_rate"));
        assert!(output.contains("finance"));
        assert!(output.contains(outcome.status.as_str()));
    }
}
