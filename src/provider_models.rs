use serde::Deserialize;

/// Envelope the actor platform wraps every API payload in.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub data: T,
}

/// Metadata of one actor run as reported by the platform.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderRun {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub default_dataset_id: Option<String>,
}

/// Coarse run state the pipeline acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Succeeded,
    InProgress,
    Failed,
}

impl ProviderRun {
    /// Maps the platform's status string onto the pipeline's run states.
    ///
    /// Only a literal `SUCCEEDED` counts as success and only the queued and
    /// running statuses keep the poll loop alive; every other terminal or
    /// unrecognized status is treated as failure.
    pub fn state(&self) -> RunState {
        match self.status.as_str() {
            "SUCCEEDED" => RunState::Succeeded,
            "READY" | "RUNNING" => RunState::InProgress,
            _ => RunState::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with_status(status: &str) -> ProviderRun {
        ProviderRun {
            id: "run-1".to_string(),
            status: status.to_string(),
            default_dataset_id: None,
        }
    }

    #[test]
    fn only_succeeded_is_success() {
        assert_eq!(run_with_status("SUCCEEDED").state(), RunState::Succeeded);
        assert_eq!(run_with_status("READY").state(), RunState::InProgress);
        assert_eq!(run_with_status("RUNNING").state(), RunState::InProgress);
    }

    #[test]
    fn unrecognized_statuses_are_failures() {
        for status in ["FAILED", "ABORTED", "TIMED-OUT", "EXPLODED", ""] {
            assert_eq!(run_with_status(status).state(), RunState::Failed, "{status}");
        }
    }
}
