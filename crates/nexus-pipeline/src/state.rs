//! Run state shared by pipeline stages.
//!
//! One mutable context threads through a run. Each stage owns the state
//! while it executes and hands it back, so there is no locking and a test
//! can assert against a single value at the end.

use std::collections::HashMap;

/// Password baked into the generated dev certificate bundle.
///
/// mkcert always exports PKCS#12 bundles with this password.
pub const DEV_CERTS_PASSWORD: &str = "changeit";

/// Outcome of the most recently executed stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepStatus {
    #[default]
    Success,
    Failure,
}

/// What happened to a service's access policy.
///
/// No `Default` impl: a policy only counts as created when creation
/// actually succeeded, never by omission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyOutcome {
    /// No policy artifact was present, so nothing was attempted.
    NotAttempted,
    /// The policy exists under this name.
    Created { name: String },
    /// Creation was attempted and failed.
    Failed { reason: String },
}

impl PolicyOutcome {
    pub fn created_name(&self) -> Option<&str> {
        match self {
            PolicyOutcome::Created { name } => Some(name),
            _ => None,
        }
    }
}

/// Mutable context carried through every stage of one run.
#[derive(Debug, Clone)]
pub struct RunState {
    /// Docker network the environment runs on.
    pub network_name: String,
    pub network_id: String,
    /// Subnet in CIDR notation, e.g. `172.28.0.0/16`.
    pub subnet: String,
    /// Management token obtained from the ACL bootstrap.
    pub global_token: String,
    pub dev_certs_password: String,
    /// Policy outcome per service, recorded even when creation failed.
    pub policies: HashMap<String, PolicyOutcome>,
    /// Scoped token per service.
    pub service_tokens: HashMap<String, String>,
    /// Reachable URL per activated service.
    pub service_urls: HashMap<String, String>,
    pub status: StepStatus,
    /// Version tag shared by all images of the current build.
    pub image_version: String,
    pub errors: Vec<String>,
    pub logs: Vec<String>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            network_name: String::new(),
            network_id: String::new(),
            subnet: String::new(),
            global_token: String::new(),
            dev_certs_password: DEV_CERTS_PASSWORD.to_string(),
            policies: HashMap::new(),
            service_tokens: HashMap::new(),
            service_urls: HashMap::new(),
            status: StepStatus::Success,
            image_version: String::new(),
            errors: Vec::new(),
            logs: Vec::new(),
        }
    }

    /// Record a hard failure. The driver stops the run after this stage.
    pub fn fail(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::error!(%message, "stage failed");
        self.errors.push(message);
        self.status = StepStatus::Failure;
    }

    /// Record an error without stopping the run.
    pub fn soft_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(%message, "continuing after error");
        self.errors.push(message);
    }

    pub fn log(&mut self, message: impl Into<String>) {
        self.logs.push(message.into());
    }

    pub fn succeeded(&self) -> bool {
        self.status == StepStatus::Success
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_starts_successful() {
        let state = RunState::new();
        assert!(state.succeeded());
        assert!(state.errors.is_empty());
        assert_eq!(state.dev_certs_password, DEV_CERTS_PASSWORD);
    }

    #[test]
    fn fail_flips_status_and_records_message() {
        let mut state = RunState::new();
        state.fail("network unavailable");
        assert!(!state.succeeded());
        assert_eq!(state.errors, vec!["network unavailable".to_string()]);
    }

    #[test]
    fn soft_error_keeps_run_alive() {
        let mut state = RunState::new();
        state.soft_error("could not confirm address");
        assert!(state.succeeded());
        assert_eq!(state.errors.len(), 1);
    }

    #[test]
    fn policy_outcome_exposes_name_only_when_created() {
        let created = PolicyOutcome::Created {
            name: "users-policy".to_string(),
        };
        assert_eq!(created.created_name(), Some("users-policy"));
        assert_eq!(PolicyOutcome::NotAttempted.created_name(), None);
        let failed = PolicyOutcome::Failed {
            reason: "api error".to_string(),
        };
        assert_eq!(failed.created_name(), None);
    }
}
