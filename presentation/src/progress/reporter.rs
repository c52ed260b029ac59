//! Progress reporting for council runs

use colored::Colorize;
use council_application::WorkflowProgress;
use council_domain::{Stage, TraceEvent, TraceEventType};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::sync::Mutex;

/// One console line for a trace event, or `None` for events the stage
/// display already covers
fn describe(event: &TraceEvent) -> Option<String> {
    let agent = event
        .agent_id
        .as_ref()
        .map(|a| format!("{}: ", a))
        .unwrap_or_default();
    let line = match event.event_type {
        TraceEventType::StageChange | TraceEventType::Completed => return None,
        TraceEventType::PolicyCardCreated => format!("{} {}", "+".cyan(), event.message),
        TraceEventType::MemoReady => format!("{} {}{}", "v".green(), agent, event.message),
        TraceEventType::DisputeUpdate => format!("{} {}", "!".yellow(), event.message),
        TraceEventType::NegotiationRound | TraceEventType::DimensionSettlement => {
            format!("{} {}", "~".cyan(), event.message)
        }
        TraceEventType::GateResult => {
            let passed = event
                .data
                .as_ref()
                .and_then(|d| d.get("passed"))
                .and_then(|p| p.as_bool())
                .unwrap_or(false);
            let mark = if passed { "v".green() } else { "x".red() };
            format!("{} {}{}", mark, agent, event.message)
        }
        TraceEventType::Decision => format!("{} {}", "*".bold(), event.message.bold()),
        TraceEventType::ArtifactCreated => format!("{} {}", "+".cyan(), event.message),
        TraceEventType::Error => format!("{} {}{}", "x".red(), agent, event.message.red()),
    };
    Some(format!("  {}", line))
}

fn entering(event: &TraceEvent) -> bool {
    event.event_type == TraceEventType::StageChange
        && event
            .data
            .as_ref()
            .and_then(|d| d.get("phase"))
            .and_then(|p| p.as_str())
            == Some("enter")
}

/// Reports progress with a stage bar and one line per notable event
pub struct ProgressReporter {
    multi: MultiProgress,
    stage_bar: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            stage_bar: Mutex::new(None),
        }
    }

    fn stage_style() -> ProgressStyle {
        ProgressStyle::default_bar()
            .template("{spinner:.green} {prefix:.bold.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-")
    }

    /// Leave the bar where a failed run stopped it
    pub fn finish(&self) {
        self.with_bar(|bar| {
            if let Some(pb) = bar.take() {
                pb.abandon_with_message(format!("{}", "stopped".red()));
            }
        });
    }

    fn with_bar(&self, f: impl FnOnce(&mut Option<ProgressBar>)) {
        if let Ok(mut bar) = self.stage_bar.lock() {
            f(&mut bar);
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkflowProgress for ProgressReporter {
    fn on_event(&self, event: &TraceEvent) {
        if entering(event) {
            let multi = &self.multi;
            self.with_bar(|bar| {
                let pb = bar.get_or_insert_with(|| {
                    let pb = multi.add(ProgressBar::new(Stage::SEQUENCE.len() as u64));
                    pb.set_style(Self::stage_style());
                    pb
                });
                pb.set_prefix(event.stage.display_name().to_string());
                pb.set_message("working...");
            });
            return;
        }

        if let Some(line) = describe(event) {
            let _ = self.multi.println(line);
        }

        if event.event_type == TraceEventType::Completed {
            self.with_bar(|bar| {
                if let Some(pb) = bar.take() {
                    pb.finish_with_message(format!("{}", "Council run complete!".green()));
                }
            });
        }
    }

    fn on_stage_complete(&self, stage: Stage) {
        self.with_bar(|bar| {
            if let Some(pb) = bar.as_ref() {
                pb.set_message(format!("{} done", stage.display_name()));
                pb.inc(1);
            }
        });
    }
}

/// Simple text-based progress (no fancy UI)
pub struct SimpleProgress;

impl WorkflowProgress for SimpleProgress {
    fn on_event(&self, event: &TraceEvent) {
        if entering(event) {
            println!("{} {}", "->".cyan(), event.stage.display_name().bold());
        } else if let Some(line) = describe(event) {
            println!("{}", line);
        }
    }

    fn on_stage_complete(&self, _stage: Stage) {
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::AgentId;
    use serde_json::json;

    #[test]
    fn test_describe_events() {
        colored::control::set_override(false);

        let memo = TraceEvent::new(Stage::DepartmentsGenerateMemos, TraceEventType::MemoReady, "Memo: oppose")
            .with_agent(AgentId::new("finance"));
        assert_eq!(describe(&memo).unwrap(), "  v finance: Memo: oppose");

        let failed_gate = TraceEvent::new(Stage::LegalReviewGate, TraceEventType::GateResult, "Gate failed")
            .with_data(json!({"passed": false}));
        assert_eq!(describe(&failed_gate).unwrap(), "  x Gate failed");

        let change = TraceEvent::new(Stage::Intake, TraceEventType::StageChange, "Entering Intake");
        assert!(describe(&change).is_none());
    }

    #[test]
    fn test_entering_reads_phase() {
        let enter = TraceEvent::new(Stage::Intake, TraceEventType::StageChange, "Entering Intake")
            .with_data(json!({"phase": "enter"}));
        let exit = TraceEvent::new(Stage::Intake, TraceEventType::StageChange, "Leaving Intake")
            .with_data(json!({"phase": "exit"}));
        assert!(entering(&enter));
        assert!(!entering(&exit));
    }

    #[test]
    fn test_reporter_tracks_stages_without_a_terminal() {
        let reporter = ProgressReporter::new();
        reporter.on_event(
            &TraceEvent::new(Stage::Intake, TraceEventType::StageChange, "Entering Intake")
                .with_data(json!({"phase": "enter"})),
        );
        reporter.on_stage_complete(Stage::Intake);
        assert_eq!(reporter.stage_bar.lock().unwrap().as_ref().unwrap().position(), 1);

        reporter.on_event(&TraceEvent::new(Stage::Completed, TraceEventType::Completed, "done"));
        assert!(reporter.stage_bar.lock().unwrap().is_none());
        reporter.finish();
    }
}
