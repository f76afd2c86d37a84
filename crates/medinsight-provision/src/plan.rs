//! The MedInsight identity setup: which entities to create, in which order.

use std::fmt;

use tracing::{error, info};

use crate::keycloak::{AdminClient, Outcome, ProvisionError, UserSpec};

/// Realm roles every MedInsight deployment needs.
pub const DEFAULT_ROLES: &[&str] = &[
    "ROLE_ADMIN",
    "ROLE_MEDECIN",
    "ROLE_PATIENT",
    "ROLE_GESTIONNAIRE",
    "ROLE_RESPONSABLE_SECURITE",
];

#[derive(Debug, Clone)]
pub struct ProvisionPlan {
    pub realm: String,
    pub client_id: String,
    pub roles: Vec<String>,
    pub user: UserSpec,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Realm(String),
    Role(String),
    Client(String),
    User(String),
    RoleMapping(String),
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Realm(name) => write!(f, "realm '{name}'"),
            Step::Role(name) => write!(f, "role '{name}'"),
            Step::Client(name) => write!(f, "client '{name}'"),
            Step::User(name) => write!(f, "user '{name}'"),
            Step::RoleMapping(name) => write!(f, "role mapping for '{name}'"),
        }
    }
}

#[derive(Debug)]
pub struct StepReport {
    pub step: Step,
    pub result: Result<Outcome, ProvisionError>,
}

/// Result of every step of a run, in execution order.
#[derive(Debug, Default)]
pub struct ProvisionReport {
    pub steps: Vec<StepReport>,
}

impl ProvisionReport {
    fn record(&mut self, step: Step, result: Result<Outcome, ProvisionError>) {
        match &result {
            Ok(outcome) => info!(%step, ?outcome, "provisioning step done"),
            Err(e) => error!(%step, error = %e, "provisioning step failed"),
        }
        self.steps.push(StepReport { step, result });
    }

    pub fn is_success(&self) -> bool {
        self.steps.iter().all(|s| s.result.is_ok())
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepReport> {
        self.steps.iter().filter(|s| s.result.is_err())
    }

    pub fn outcome(&self, step: &Step) -> Option<&Result<Outcome, ProvisionError>> {
        self.steps.iter().find(|s| &s.step == step).map(|s| &s.result)
    }
}

/// Run every step of `plan`. A failed step is recorded and the run moves
/// on; only the role mapping is skipped when the user step failed.
pub async fn provision(client: &AdminClient, plan: &ProvisionPlan) -> ProvisionReport {
    let mut report = ProvisionReport::default();

    report.record(
        Step::Realm(plan.realm.clone()),
        client.ensure_realm(&plan.realm).await,
    );

    for role in &plan.roles {
        report.record(
            Step::Role(role.clone()),
            client.ensure_role(&plan.realm, role).await,
        );
    }

    report.record(
        Step::Client(plan.client_id.clone()),
        client
            .ensure_client(&plan.realm, &plan.client_id)
            .await
            .map(|(outcome, _)| outcome),
    );

    let username = plan.user.username.clone();
    let user_id = match client.ensure_user(&plan.realm, &plan.user).await {
        Ok((outcome, id)) => {
            report.record(Step::User(username.clone()), Ok(outcome));
            Some(id)
        }
        Err(e) => {
            report.record(Step::User(username.clone()), Err(e));
            None
        }
    };

    let mapping = match user_id {
        Some(id) => client
            .assign_realm_roles(&plan.realm, &id, &plan.roles)
            .await
            .map(|_| Outcome::Created),
        None => Err(ProvisionError::Skipped(format!("user '{username}' unavailable"))),
    };
    report.record(Step::RoleMapping(username), mapping);

    report
}
