//! Building run inputs from command-line arguments and issue files

use super::commands::RunArgs;
use council_application::RunWorkflowInput;
use council_domain::{Constraints, Issue};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Could not read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is not a valid issue document: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Give an issue file or both --title and --description")]
    MissingIssue,
}

/// Accepted shapes of an issue file
#[derive(Deserialize)]
#[serde(untagged)]
enum IssueDocument {
    Wrapped {
        issue: Issue,
        #[serde(default)]
        constraints: Option<Constraints>,
    },
    Bare(Issue),
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, InputError> {
    let text = std::fs::read_to_string(path).map_err(|source| InputError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| InputError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load an issue and its optional constraints from a JSON file
pub fn load_issue_file(path: &Path) -> Result<(Issue, Option<Constraints>), InputError> {
    Ok(match read_json(path)? {
        IssueDocument::Wrapped { issue, constraints } => (issue, constraints),
        IssueDocument::Bare(issue) => (issue, None),
    })
}

/// Issue id derived from a title: lowercase words joined by '-'
fn slug(title: &str) -> String {
    let words: Vec<String> = title
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();
    if words.is_empty() {
        "issue".to_string()
    } else {
        words.join("-")
    }
}

impl RunArgs {
    /// Resolve the issue, constraints and run id this invocation describes
    pub fn to_input(&self) -> Result<RunWorkflowInput, InputError> {
        let (issue, file_constraints) = match (&self.issue, &self.title, &self.description) {
            (Some(path), _, _) => load_issue_file(path)?,
            (None, Some(title), Some(description)) => {
                (Issue::new(slug(title), title.clone(), description.clone()), None)
            }
            _ => return Err(InputError::MissingIssue),
        };

        let mut constraints = match &self.constraints {
            Some(path) => read_json(path)?,
            None => file_constraints.unwrap_or_default(),
        };
        if let Some(ceiling) = self.budget_ceiling {
            constraints.budget_ceiling = ceiling;
        }

        let mut input = RunWorkflowInput::new(issue).with_constraints(constraints);
        if let Some(run_id) = &self.run_id {
            input = input.with_run_id(run_id.clone());
        }
        Ok(input)
    }
}
