use crate::api::{self, handlers::auth::AuthConfig};
use crate::cli::actions::Action;
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            frontend_url,
            session_ttl_seconds,
        } => {
            let auth_config =
                AuthConfig::new(frontend_url).with_session_ttl_seconds(session_ttl_seconds);

            api::new(port, dsn, auth_config).await?;
        }
    }

    Ok(())
}
