//! Build outcome models.
//!
//! A snapshot of what the build system knows about a finished build: its
//! result, the result of the build before it, and the values that message
//! placeholders expand to.

use std::collections::BTreeMap;
use std::str::FromStr;

// =============================================================================
// Build Result Enum
// =============================================================================

/// Final status of a build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
}

impl BuildResult {
    /// Every result, in severity order
    pub const ALL: [BuildResult; 5] = [
        BuildResult::Success,
        BuildResult::Unstable,
        BuildResult::Failure,
        BuildResult::NotBuilt,
        BuildResult::Aborted,
    ];

    /// True for every result a build can recover from with a later success
    pub fn is_broken(self) -> bool {
        !matches!(self, BuildResult::Success)
    }
}

impl std::fmt::Display for BuildResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildResult::Success => write!(f, "SUCCESS"),
            BuildResult::Unstable => write!(f, "UNSTABLE"),
            BuildResult::Failure => write!(f, "FAILURE"),
            BuildResult::NotBuilt => write!(f, "NOT_BUILT"),
            BuildResult::Aborted => write!(f, "ABORTED"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown build result '{0}', expected one of SUCCESS, UNSTABLE, FAILURE, NOT_BUILT, ABORTED")]
pub struct ParseBuildResultError(pub String);

impl FromStr for BuildResult {
    type Err = ParseBuildResultError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        match normalized.as_str() {
            "SUCCESS" => Ok(BuildResult::Success),
            "UNSTABLE" => Ok(BuildResult::Unstable),
            "FAILURE" => Ok(BuildResult::Failure),
            "NOT_BUILT" | "NOTBUILT" => Ok(BuildResult::NotBuilt),
            "ABORTED" => Ok(BuildResult::Aborted),
            _ => Err(ParseBuildResultError(s.to_string())),
        }
    }
}

// =============================================================================
// Build Outcome Snapshot
// =============================================================================

/// Outcome of the current build and of the one right before it in the same job
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOutcome {
    /// `None` while the build has no result yet
    pub current: Option<BuildResult>,
    /// `None` for the first build of a job
    pub previous: Option<BuildResult>,
}

impl BuildOutcome {
    pub fn new(current: Option<BuildResult>, previous: Option<BuildResult>) -> Self {
        Self { current, previous }
    }

    /// Finished build with no earlier build in its history
    pub fn first(current: BuildResult) -> Self {
        Self::new(Some(current), None)
    }

    /// Finished build following a build with a known result
    pub fn after(previous: BuildResult, current: BuildResult) -> Self {
        Self::new(Some(current), Some(previous))
    }
}

// =============================================================================
// Build Context
// =============================================================================

/// Values available to message placeholders
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    pub job_name: Option<String>,
    pub build_number: Option<u64>,
    pub build_url: Option<String>,
    pub workspace: Option<String>,
    pub outcome: BuildOutcome,
    /// Build parameters and environment exposed as `${KEY}`
    pub variables: BTreeMap<String, String>,
}

impl BuildContext {
    pub fn new(outcome: BuildOutcome) -> Self {
        Self {
            outcome,
            ..Default::default()
        }
    }

    pub fn with_job_name(mut self, job_name: &str) -> Self {
        self.job_name = Some(job_name.to_string());
        self
    }

    pub fn with_build_number(mut self, build_number: u64) -> Self {
        self.build_number = Some(build_number);
        self
    }

    pub fn with_build_url(mut self, build_url: &str) -> Self {
        self.build_url = Some(build_url.to_string());
        self
    }

    pub fn with_workspace(mut self, workspace: &str) -> Self {
        self.workspace = Some(workspace.to_string());
        self
    }

    pub fn with_variable(mut self, key: &str, value: &str) -> Self {
        self.variables.insert(key.to_string(), value.to_string());
        self
    }

    /// Looks up a placeholder name. Built-in names win over variables.
    pub fn lookup(&self, name: &str) -> Option<String> {
        match name {
            "JOB_NAME" => self.job_name.clone(),
            "BUILD_NUMBER" => self.build_number.map(|n| n.to_string()),
            "BUILD_URL" => self.build_url.clone(),
            "WORKSPACE" => self.workspace.clone(),
            "BUILD_STATUS" | "BUILD_RESULT" => Some(
                self.outcome
                    .current
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "RUNNING".to_string()),
            ),
            "PREVIOUS_BUILD_STATUS" => Some(
                self.outcome
                    .previous
                    .map(|r| r.to_string())
                    .unwrap_or_default(),
            ),
            _ => self.variables.get(name).cloned(),
        }
    }
}
