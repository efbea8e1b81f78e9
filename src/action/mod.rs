//! Declarative service actions.
//!
//! A service request carries exactly one [`Action`]: a point-to-point
//! [`Connection`], a directed [`Path`], or a full [`Mesh`] among N
//! connection points.

pub mod mesh;

use crate::constraint::Constraint;
use crate::endpoint::ConnectionPoint;
use serde::{Deserialize, Serialize};

/// One side of an action: a connection point plus its own constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub point: ConnectionPoint,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl Subject {
    pub fn new(point: impl Into<String>) -> Self {
        Self {
            point: ConnectionPoint::new(point),
            constraints: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }
}

/// Undirected connectivity between two subjects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    #[serde(default)]
    pub id: u32,
    pub source: Subject,
    pub destination: Subject,
}

impl Connection {
    pub fn new(source: Subject, destination: Subject) -> Self {
        Self {
            id: 0,
            source,
            destination,
        }
    }
}

/// Directed connectivity from source to destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    #[serde(default)]
    pub id: u32,
    pub source: Subject,
    pub destination: Subject,
}

impl Path {
    pub fn new(source: Subject, destination: Subject) -> Self {
        Self {
            id: 0,
            source,
            destination,
        }
    }
}

/// Full connectivity among an ordered list of subjects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub subjects: Vec<Subject>,
}

impl Mesh {
    pub fn new(subjects: Vec<Subject>) -> Self {
        Self { subjects }
    }
}

/// A declarative action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Action {
    Connection(Connection),
    Path(Path),
    Mesh(Mesh),
}

/// A top-level service request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub action: Action,
    /// Request-level constraints applied to every derived intent
    #[serde(default)]
    pub constraints: Vec<Constraint>,
    /// Accept a degraded alternative when constraints cannot be met
    #[serde(default)]
    pub negotiable: bool,
}

impl ServiceRequest {
    pub fn new(action: Action) -> Self {
        Self {
            action,
            constraints: Vec::new(),
            negotiable: false,
        }
    }

    #[must_use]
    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    #[must_use]
    pub fn negotiable(mut self, negotiable: bool) -> Self {
        self.negotiable = negotiable;
        self
    }
}

/// Bookkeeping shared across one decomposition run.
///
/// Hands out ids unique within the run and collects issues found along the
/// way. A tracker with issues is no longer valid.
#[derive(Debug, Default)]
pub struct Tracker {
    next_id: u32,
    issues: Vec<String>,
}

impl Tracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> u32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn record_issue(&mut self, issue: impl Into<String>) {
        let issue = issue.into();
        tracing::debug!(issue = %issue, "Decomposition issue recorded");
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Number of ids handed out so far.
    pub fn assigned(&self) -> u32 {
        self.next_id
    }
}
