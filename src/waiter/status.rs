//! Status vocabularies for remote operations

use std::fmt;

/// How the waiter should treat a reported status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// Done, successfully
    Success,
    /// Still running, keep polling
    InProgress,
    /// Done, but the remote system reports failure
    Failure,
    /// Not declared anywhere in the table
    Unrecognized,
}

/// Status sets for one backend API.
///
/// The sets are expected to be disjoint. When they are not, success wins over
/// failure, and failure wins over in-progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusTable {
    pub success: &'static [&'static str],
    pub in_progress: &'static [&'static str],
    pub failure: &'static [&'static str],
}

impl StatusTable {
    pub const fn new(
        success: &'static [&'static str],
        in_progress: &'static [&'static str],
        failure: &'static [&'static str],
    ) -> Self {
        Self {
            success,
            in_progress,
            failure,
        }
    }

    /// Classify a status string. Matching is exact (case-sensitive).
    pub fn classify(&self, status: &str) -> StatusClass {
        if self.success.contains(&status) {
            StatusClass::Success
        } else if self.failure.contains(&status) {
            StatusClass::Failure
        } else if self.in_progress.contains(&status) {
            StatusClass::InProgress
        } else {
            StatusClass::Unrecognized
        }
    }
}

impl fmt::Display for StatusTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "success={:?} in_progress={:?} failure={:?}",
            self.success, self.in_progress, self.failure
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: StatusTable = StatusTable::new(&["READY"], &["RUNNING", "STOPPING"], &["FAILED"]);

    #[test]
    fn test_classify() {
        assert_eq!(TABLE.classify("READY"), StatusClass::Success);
        assert_eq!(TABLE.classify("RUNNING"), StatusClass::InProgress);
        assert_eq!(TABLE.classify("STOPPING"), StatusClass::InProgress);
        assert_eq!(TABLE.classify("FAILED"), StatusClass::Failure);
        assert_eq!(TABLE.classify("BOGUS"), StatusClass::Unrecognized);
    }

    #[test]
    fn test_classify_is_case_sensitive() {
        assert_eq!(TABLE.classify("ready"), StatusClass::Unrecognized);
        assert_eq!(TABLE.classify(""), StatusClass::Unrecognized);
    }

    #[test]
    fn test_empty_failure_set() {
        let table = StatusTable::new(&["COMPLETE"], &["STARTING", "IN_PROGRESS"], &[]);
        assert_eq!(table.classify("FAILED"), StatusClass::Unrecognized);
    }
}
