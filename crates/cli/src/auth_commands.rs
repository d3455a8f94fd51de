use {
    anyhow::{Context, Result},
    clap::Subcommand,
    rolemap_config::RolemapConfig,
    rolemap_oauth::OAuthFlow,
    serde_json::Value,
};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Print the HubSpot consent URL for the configured app.
    Url {
        /// Also open it in the default browser.
        #[arg(long)]
        open: bool,
    },
    /// Ask a running server whether it holds credentials.
    Status {
        /// Base URL of the running server.
        #[arg(long, default_value = "http://localhost:5000")]
        server: String,
    },
}

pub async fn handle_auth(action: AuthAction, config: &RolemapConfig) -> Result<()> {
    match action {
        AuthAction::Url { open } => url(config, open),
        AuthAction::Status { server } => status(&server).await,
    }
}

fn url(config: &RolemapConfig, launch: bool) -> Result<()> {
    if !config.oauth.has_client_credentials() {
        eprintln!("warning: HUBSPOT_CLIENT_ID / HUBSPOT_CLIENT_SECRET are not set");
    }
    let flow = OAuthFlow::new(rolemap_gateway::state::oauth_config(config));
    let url = flow.authorization_url()?;
    println!("{url}");

    if launch && open::that(&url).is_err() {
        println!("Could not open browser. Please visit the URL above.");
    }
    Ok(())
}

async fn status(server: &str) -> Result<()> {
    let endpoint = format!("{}/api/auth-status", server.trim_end_matches('/'));
    let body: Value = reqwest::get(&endpoint)
        .await
        .with_context(|| format!("could not reach {endpoint}"))?
        .error_for_status()?
        .json()
        .await?;

    let authenticated = body["authenticated"].as_bool().unwrap_or(false);
    if !authenticated {
        println!("not authenticated");
        return Ok(());
    }

    let expiry = body["expires_at"]
        .as_u64()
        .map_or("unknown".to_string(), |ts| {
            let now = rolemap_oauth::now_ms();
            if ts > now {
                let remaining = (ts - now) / 1000;
                let hours = remaining / 3600;
                let mins = (remaining % 3600) / 60;
                format!("valid ({hours}h {mins}m remaining)")
            } else {
                "expired, refreshes on next request".to_string()
            }
        });
    println!("authenticated [{expiry}]");
    Ok(())
}
