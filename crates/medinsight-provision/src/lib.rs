//! Identity-provider provisioning: admin REST client and the MedInsight setup plan.

pub mod keycloak;
pub mod plan;

pub use keycloak::{AdminClient, Outcome, ProvisionError, UserSpec};
pub use plan::{DEFAULT_ROLES, ProvisionPlan, ProvisionReport, Step, StepReport, provision};

#[cfg(test)]
mod mock;
