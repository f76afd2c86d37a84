use clap::Parser;
use medinsight_provision::{AdminClient, DEFAULT_ROLES, ProvisionPlan, UserSpec, provision};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Create the MedInsight realm, roles, client, and admin user.
///
/// Safe to re-run: anything that already exists is left as is.
#[derive(Debug, Parser)]
#[command(name = "medinsight-provision", version)]
struct Args {
    /// Identity provider base URL.
    #[arg(long, env = "KEYCLOAK_URL", default_value = "http://localhost:8180")]
    url: String,

    /// Master-realm admin account.
    #[arg(long, env = "KEYCLOAK_ADMIN", default_value = "admin")]
    admin_user: String,

    #[arg(long, env = "KEYCLOAK_ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: String,

    #[arg(long, env = "KEYCLOAK_REALM", default_value = "medinsight")]
    realm: String,

    #[arg(long, env = "KEYCLOAK_CLIENT_ID", default_value = "medinsight-client")]
    client_id: String,

    /// Realm role to create and grant (repeatable).
    #[arg(long = "role", default_values_t = DEFAULT_ROLES.iter().map(|r| r.to_string()))]
    roles: Vec<String>,

    /// Application admin user to create in the realm.
    #[arg(long, default_value = "admin")]
    username: String,

    #[arg(long, default_value = "admin@medinsight.com")]
    email: String,

    #[arg(long, env = "MEDINSIGHT_ADMIN_PASSWORD", hide_env_values = true)]
    user_password: String,
}

impl Args {
    fn plan(&self) -> ProvisionPlan {
        ProvisionPlan {
            realm: self.realm.clone(),
            client_id: self.client_id.clone(),
            roles: self.roles.clone(),
            user: UserSpec {
                username: self.username.clone(),
                email: self.email.clone(),
                first_name: "Admin".into(),
                last_name: "User".into(),
                password: self.user_password.clone(),
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    info!(url = %args.url, realm = %args.realm, "provisioning identity provider");

    let client = AdminClient::login(&args.url, &args.admin_user, &args.admin_password).await?;
    let report = provision(&client, &args.plan()).await;

    let failed = report.failures().count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} provisioning steps failed", report.steps.len());
    }
    info!(
        steps = report.steps.len(),
        user = %args.username,
        "provisioning complete"
    );
    Ok(())
}
