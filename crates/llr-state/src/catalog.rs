//! # Reference Data Catalogs
//!
//! The set of status names a task may carry and the set of vehicle classes
//! an applicant may apply for. Both are loaded from the store at startup;
//! the defaults here seed an empty deployment.

use std::collections::BTreeSet;

/// Well-known status names the workflow attaches behaviour to.
pub mod status {
    /// Initial status of every new task.
    pub const NEW_APPLICATION: &str = "New Application";
    /// The transport office generated an application number.
    pub const APPLICATION_GENERATED: &str = "Application Generated";
    /// The learner's license was issued. Terminal.
    pub const LLR_ISSUED: &str = "LLR Issued";
    /// The application was returned to the applicant. Terminal.
    pub const RETURNED: &str = "Returned";
    /// Audit-only marker for field edits. Never a task status.
    pub const EDITED: &str = "Edited";

    /// Statuses excluded from the default task list.
    pub const TERMINAL: [&str; 2] = [LLR_ISSUED, RETURNED];

    /// Whether a status ends the workflow.
    pub fn is_terminal(status: &str) -> bool {
        TERMINAL.contains(&status)
    }
}

/// Ordered set of valid status names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCatalog {
    names: BTreeSet<String>,
}

impl StatusCatalog {
    /// Build a catalog from arbitrary names. Blank names and the reserved
    /// `Edited` marker are dropped.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names
            .into_iter()
            .map(|n| n.into().trim().to_string())
            .filter(|n| !n.is_empty() && n != status::EDITED)
            .collect();
        Self { names }
    }

    /// Whether `name` is a catalog member (exact match).
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Status names in alphabetical order.
    pub fn names(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }

    /// Number of statuses.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for StatusCatalog {
    fn default() -> Self {
        Self::from_names([
            status::NEW_APPLICATION,
            status::APPLICATION_GENERATED,
            status::LLR_ISSUED,
            status::RETURNED,
        ])
    }
}

/// Ordered set of vehicle-class names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleClassCatalog {
    names: BTreeSet<String>,
}

impl VehicleClassCatalog {
    /// Build a catalog from arbitrary names, dropping blanks.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names = names
            .into_iter()
            .map(|n| n.into().trim().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        Self { names }
    }

    /// Class names in alphabetical order.
    pub fn names(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }
}

impl Default for VehicleClassCatalog {
    fn default() -> Self {
        Self::from_names(["Car", "HMV", "LMV", "MCWG", "MCWOG", "Transport"])
    }
}
