use crate::api;
use crate::cli::actions::Action;
use anyhow::Result;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            dsn,
            base_url,
            purge_interval,
        } => {
            let config =
                api::AppConfig::new(base_url).with_purge_interval_seconds(purge_interval);
            api::new(port, dsn, config).await?;
        }
    }

    Ok(())
}
