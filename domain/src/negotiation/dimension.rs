//! Negotiable dimensions of an issue

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Shape of a dimension's value space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DimensionKind {
    /// Any number within `[low, high]`
    Continuous { range: [f64; 2] },
    /// One of a fixed, ordered list of options
    Enum {
        options: Vec<String>,
        #[serde(default)]
        default: Option<String>,
    },
}

/// A single negotiable dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dimension {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub kind: DimensionKind,
}

impl Dimension {
    pub fn continuous(id: impl Into<String>, low: f64, high: f64) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            kind: DimensionKind::Continuous { range: [low, high] },
        }
    }

    pub fn options<S: Into<String>>(id: impl Into<String>, options: Vec<S>, default: Option<&str>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            kind: DimensionKind::Enum {
                options: options.into_iter().map(Into::into).collect(),
                default: default.map(str::to_string),
            },
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Check the value space is usable
    pub fn validate(&self) -> Result<(), DomainError> {
        match &self.kind {
            DimensionKind::Continuous { range: [low, high] } => {
                if !low.is_finite() || !high.is_finite() || low > high {
                    return Err(DomainError::InvalidArgument(format!(
                        "dimension '{}' has an invalid range [{}, {}]",
                        self.id, low, high
                    )));
                }
            }
            DimensionKind::Enum { options, default } => {
                if options.is_empty() {
                    return Err(DomainError::InvalidArgument(format!(
                        "dimension '{}' has no options",
                        self.id
                    )));
                }
                if let Some(d) = default
                    && !options.contains(d)
                {
                    return Err(DomainError::InvalidArgument(format!(
                        "dimension '{}' default '{}' is not one of its options",
                        self.id, d
                    )));
                }
            }
        }
        Ok(())
    }

    /// Index of the default option (first option when none is declared)
    pub(crate) fn default_index(&self) -> usize {
        match &self.kind {
            DimensionKind::Enum {
                options,
                default: Some(d),
            } => options.iter().position(|o| o == d).unwrap_or(0),
            _ => 0,
        }
    }

    /// Convert an internal numeric value (a number, or an option index) back
    /// into a presentable value.
    pub(crate) fn value_at(&self, raw: f64) -> DimensionValue {
        match &self.kind {
            DimensionKind::Continuous { .. } => DimensionValue::Number(raw),
            DimensionKind::Enum { options, .. } => {
                let idx = (raw.round().max(0.0) as usize).min(options.len().saturating_sub(1));
                DimensionValue::Option(options[idx].clone())
            }
        }
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.kind, DimensionKind::Enum { .. })
    }
}

/// A proposed or settled value on one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimensionValue {
    Number(f64),
    Option(String),
}

impl std::fmt::Display for DimensionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DimensionValue::Number(n) => write!(f, "{:.2}", n),
            DimensionValue::Option(s) => write!(f, "{}", s),
        }
    }
}
