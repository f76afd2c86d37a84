//! Admin REST client for a Keycloak-style identity provider.
//!
//! Every `ensure_*` call checks for the entity first and reports
//! [`Outcome::AlreadyExists`] instead of failing when it is present.

use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },
    #[error("{entity} '{name}' not found after creation")]
    MissingAfterCreate { entity: &'static str, name: String },
    #[error("skipped: {0}")]
    Skipped(String),
}

/// What an idempotent provisioning call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Created,
    AlreadyExists,
}

/// The user account to create inside the realm.
#[derive(Debug, Clone)]
pub struct UserSpec {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct EntityRef {
    id: String,
}

/// Authenticated admin API client.
pub struct AdminClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl AdminClient {
    /// Use an already issued bearer token.
    ///
    /// `base_url` should be like `http://localhost:8180` (no trailing slash).
    pub fn with_token(base_url: &str, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Obtain an admin token from the master realm with the password grant.
    pub async fn login(
        base_url: &str,
        username: &str,
        password: &str,
    ) -> Result<Self, ProvisionError> {
        let base_url = base_url.trim_end_matches('/');
        let url = format!("{base_url}/realms/master/protocol/openid-connect/token");

        info!(url = %url, username, "requesting admin token");
        let client = reqwest::Client::new();
        let resp = client
            .post(&url)
            .form(&[
                ("username", username),
                ("password", password),
                ("grant_type", "password"),
                ("client_id", "admin-cli"),
            ])
            .send()
            .await?;
        let resp = check(resp).await?;
        let token: TokenResponse = resp.json().await?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            token: token.access_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn admin_url(&self, path: &str) -> String {
        format!("{}/admin/realms{path}", self.base_url)
    }

    /// Create `realm` unless `GET /admin/realms/{realm}` already finds it.
    pub async fn ensure_realm(&self, realm: &str) -> Result<Outcome, ProvisionError> {
        let resp = self
            .client
            .get(self.admin_url(&format!("/{realm}")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        if resp.status().is_success() {
            return Ok(Outcome::AlreadyExists);
        }

        let payload = json!({
            "realm": realm,
            "enabled": true,
            "registrationAllowed": true,
            "verifyEmail": false,
            "smtpServer": {},
            "bruteForceProtected": false,
        });
        let resp = self
            .client
            .post(self.admin_url(""))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;
        check(resp).await?;
        Ok(Outcome::Created)
    }

    /// Create a realm role. A 409 conflict means it already exists.
    pub async fn ensure_role(&self, realm: &str, role: &str) -> Result<Outcome, ProvisionError> {
        let resp = self
            .client
            .post(self.admin_url(&format!("/{realm}/roles")))
            .bearer_auth(&self.token)
            .json(&json!({ "name": role }))
            .send()
            .await?;
        if resp.status() == reqwest::StatusCode::CONFLICT {
            return Ok(Outcome::AlreadyExists);
        }
        check(resp).await?;
        Ok(Outcome::Created)
    }

    /// Create a public client and return its internal id.
    pub async fn ensure_client(
        &self,
        realm: &str,
        client_id: &str,
    ) -> Result<(Outcome, String), ProvisionError> {
        if let Some(id) = self.find_client(realm, client_id).await? {
            return Ok((Outcome::AlreadyExists, id));
        }

        let payload = json!({
            "clientId": client_id,
            "enabled": true,
            "publicClient": true,
            "directAccessGrantsEnabled": true,
            "standardFlowEnabled": true,
            "implicitFlowEnabled": false,
            "redirectUris": ["*"],
            "webOrigins": ["*"],
            "attributes": { "post.logout.redirect.uris": "*" },
        });
        let resp = self
            .client
            .post(self.admin_url(&format!("/{realm}/clients")))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;
        check(resp).await?;

        let id = self.find_client(realm, client_id).await?.ok_or_else(|| {
            ProvisionError::MissingAfterCreate {
                entity: "client",
                name: client_id.to_string(),
            }
        })?;
        Ok((Outcome::Created, id))
    }

    /// Create a user with a permanent password and return its id.
    pub async fn ensure_user(
        &self,
        realm: &str,
        user: &UserSpec,
    ) -> Result<(Outcome, String), ProvisionError> {
        if let Some(id) = self.find_user(realm, &user.username).await? {
            return Ok((Outcome::AlreadyExists, id));
        }

        let payload = json!({
            "username": user.username,
            "enabled": true,
            "email": user.email,
            "firstName": user.first_name,
            "lastName": user.last_name,
            "credentials": [{
                "type": "password",
                "value": user.password,
                "temporary": false,
            }],
        });
        let resp = self
            .client
            .post(self.admin_url(&format!("/{realm}/users")))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;
        check(resp).await?;

        let id = self.find_user(realm, &user.username).await?.ok_or_else(|| {
            ProvisionError::MissingAfterCreate {
                entity: "user",
                name: user.username.clone(),
            }
        })?;
        Ok((Outcome::Created, id))
    }

    /// Map every realm role named in `roles` onto the user.
    ///
    /// Returns the number of roles mapped. Names with no matching realm
    /// role are ignored.
    pub async fn assign_realm_roles(
        &self,
        realm: &str,
        user_id: &str,
        roles: &[String],
    ) -> Result<usize, ProvisionError> {
        let resp = self
            .client
            .get(self.admin_url(&format!("/{realm}/roles")))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let all_roles: Vec<Value> = check(resp).await?.json().await?;

        let to_assign: Vec<Value> = all_roles
            .into_iter()
            .filter(|r| {
                r.get("name")
                    .and_then(Value::as_str)
                    .is_some_and(|name| roles.iter().any(|wanted| wanted == name))
            })
            .collect();
        debug!(user_id, count = to_assign.len(), "assigning realm roles");

        let resp = self
            .client
            .post(self.admin_url(&format!("/{realm}/users/{user_id}/role-mappings/realm")))
            .bearer_auth(&self.token)
            .json(&to_assign)
            .send()
            .await?;
        check(resp).await?;
        Ok(to_assign.len())
    }

    async fn find_client(
        &self,
        realm: &str,
        client_id: &str,
    ) -> Result<Option<String>, ProvisionError> {
        let resp = self
            .client
            .get(self.admin_url(&format!("/{realm}/clients")))
            .bearer_auth(&self.token)
            .query(&[("clientId", client_id)])
            .send()
            .await?;
        let found: Vec<EntityRef> = check(resp).await?.json().await?;
        Ok(found.into_iter().next().map(|e| e.id))
    }

    async fn find_user(&self, realm: &str, username: &str) -> Result<Option<String>, ProvisionError> {
        let resp = self
            .client
            .get(self.admin_url(&format!("/{realm}/users")))
            .bearer_auth(&self.token)
            .query(&[("username", username)])
            .send()
            .await?;
        let found: Vec<EntityRef> = check(resp).await?.json().await?;
        Ok(found.into_iter().next().map(|e| e.id))
    }
}

/// Pass successful responses through; turn anything else into [`ProvisionError::Server`].
async fn check(resp: reqwest::Response) -> Result<reqwest::Response, ProvisionError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(ProvisionError::Server {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockIdp;

    fn admin_user() -> UserSpec {
        UserSpec {
            username: "admin".into(),
            email: "admin@medinsight.com".into(),
            first_name: "Admin".into(),
            last_name: "User".into(),
            password: "password".into(),
        }
    }

    #[test]
    fn client_trims_trailing_slash() {
        let client = AdminClient::with_token("http://localhost:8180/", "t".into());
        assert_eq!(client.base_url(), "http://localhost:8180");
    }

    #[tokio::test]
    async fn login_with_wrong_password_is_a_server_error() {
        let idp = MockIdp::start().await;
        let err = AdminClient::login(&idp.url, "admin", "wrong")
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ProvisionError::Server { status: 401, .. }));
    }

    #[tokio::test]
    async fn unauthenticated_calls_are_rejected() {
        let idp = MockIdp::start().await;
        let client = AdminClient::with_token(&idp.url, "forged".into());
        let err = client.ensure_realm("medinsight").await.unwrap_err();
        assert!(matches!(err, ProvisionError::Server { status: 401, .. }));
    }

    #[tokio::test]
    async fn realm_is_created_once() {
        let idp = MockIdp::start().await;
        let client = AdminClient::login(&idp.url, "admin", MockIdp::PASSWORD)
            .await
            .unwrap();

        assert_eq!(client.ensure_realm("medinsight").await.unwrap(), Outcome::Created);
        assert_eq!(
            client.ensure_realm("medinsight").await.unwrap(),
            Outcome::AlreadyExists
        );
        assert!(idp.state().realms.contains("medinsight"));
    }

    #[tokio::test]
    async fn role_conflict_means_already_exists() {
        let idp = MockIdp::start().await;
        let client = AdminClient::login(&idp.url, "admin", MockIdp::PASSWORD)
            .await
            .unwrap();
        client.ensure_realm("medinsight").await.unwrap();

        assert_eq!(
            client.ensure_role("medinsight", "ROLE_ADMIN").await.unwrap(),
            Outcome::Created
        );
        assert_eq!(
            client.ensure_role("medinsight", "ROLE_ADMIN").await.unwrap(),
            Outcome::AlreadyExists
        );
    }

    #[tokio::test]
    async fn client_lookup_returns_the_same_id() {
        let idp = MockIdp::start().await;
        let client = AdminClient::login(&idp.url, "admin", MockIdp::PASSWORD)
            .await
            .unwrap();
        client.ensure_realm("medinsight").await.unwrap();

        let (first, id1) = client
            .ensure_client("medinsight", "medinsight-client")
            .await
            .unwrap();
        let (second, id2) = client
            .ensure_client("medinsight", "medinsight-client")
            .await
            .unwrap();
        assert_eq!(first, Outcome::Created);
        assert_eq!(second, Outcome::AlreadyExists);
        assert_eq!(id1, id2);
        assert_eq!(idp.state().clients.len(), 1);
    }

    #[tokio::test]
    async fn user_gets_only_known_roles() {
        let idp = MockIdp::start().await;
        let client = AdminClient::login(&idp.url, "admin", MockIdp::PASSWORD)
            .await
            .unwrap();
        client.ensure_realm("medinsight").await.unwrap();
        client.ensure_role("medinsight", "ROLE_ADMIN").await.unwrap();
        client.ensure_role("medinsight", "ROLE_OTHER").await.unwrap();

        let (outcome, user_id) = client.ensure_user("medinsight", &admin_user()).await.unwrap();
        assert_eq!(outcome, Outcome::Created);

        let wanted = vec!["ROLE_ADMIN".to_string(), "ROLE_UNKNOWN".to_string()];
        let mapped = client
            .assign_realm_roles("medinsight", &user_id, &wanted)
            .await
            .unwrap();
        assert_eq!(mapped, 1);
        assert_eq!(idp.state().mappings[&user_id], vec!["ROLE_ADMIN".to_string()]);
    }
}
