use anyhow::{bail, Context, Result};
use clap::{Subcommand, ValueEnum};
use ihorms_client::{
    ApiClient, ConfigManager, Credentials, LoginEncoding, Method, RequestDescriptor, RouteGuard,
    SessionStore, UserRole,
};
use serde_json::Value;
use std::io::BufRead;
use std::sync::Arc;

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and store the session
    Login {
        #[arg(short, long)]
        username: String,

        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Show the signed-in user
    Whoami {
        /// Fetch the profile from the server instead of the cached copy
        #[arg(long)]
        refresh: bool,
    },

    /// Sign out and delete the stored session
    Logout,

    /// Send an authenticated request and print the JSON response
    Request {
        /// HTTP method, e.g. GET or POST
        method: String,

        /// Path relative to the API prefix, e.g. /doctor/appointments
        path: String,

        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,
    },

    /// Check whether the signed-in user may open a screen for the given roles
    Check {
        /// Admitted roles, e.g. doctor nurse. None admits any signed-in user.
        roles: Vec<String>,
    },

    /// Update the stored configuration
    Configure {
        #[arg(long)]
        base_url: Option<String>,

        #[arg(long)]
        api_prefix: Option<String>,

        #[arg(long)]
        login_encoding: Option<EncodingArg>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum EncodingArg {
    Form,
    Json,
}

impl From<EncodingArg> for LoginEncoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Form => LoginEncoding::Form,
            EncodingArg::Json => LoginEncoding::Json,
        }
    }
}

impl Commands {
    pub async fn execute(self, config: &ConfigManager, session: Arc<SessionStore>) -> Result<()> {
        let client = ApiClient::new(config.get(), session.clone());

        match self {
            Commands::Login { username, password } => {
                let password = match password {
                    Some(p) => p,
                    None => read_password()?,
                };
                let session = client.login(&Credentials::new(username, password)).await?;
                println!(
                    "Signed in as {} ({})",
                    session.user.display_name(),
                    session.user.role
                );
            }
            Commands::Whoami { refresh } => {
                let user = if refresh {
                    Some(client.refresh_profile().await?)
                } else {
                    client.current_user()
                };
                let Some(user) = user else {
                    bail!("Not signed in");
                };
                println!("{}", serde_json::to_string_pretty(&user)?);
            }
            Commands::Logout => {
                client.logout().await;
                println!("Signed out");
            }
            Commands::Request { method, path, data } => {
                let method = Method::from_bytes(method.to_uppercase().as_bytes())
                    .with_context(|| format!("Invalid HTTP method: {method}"))?;
                let mut descriptor = RequestDescriptor::new(method, path);
                if let Some(data) = data {
                    let body: Value =
                        serde_json::from_str(&data).context("Request body is not valid JSON")?;
                    descriptor = descriptor.json(body);
                }
                let response = client.request(descriptor).await?;
                println!("{}", serde_json::to_string_pretty(&response)?);
            }
            Commands::Check { roles } => {
                let roles = roles
                    .iter()
                    .map(|r| r.parse::<UserRole>())
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(anyhow::Error::msg)?;
                let decision = RouteGuard::new(session).check(&roles);
                println!("{decision:?}");
                if !decision.is_allowed() {
                    bail!("Access denied: {decision:?}");
                }
            }
            Commands::Configure {
                base_url,
                api_prefix,
                login_encoding,
            } => {
                let mut updated = config.get();
                if let Some(url) = base_url {
                    updated.base_url = url;
                }
                if let Some(prefix) = api_prefix {
                    updated.api_prefix = prefix;
                }
                if let Some(encoding) = login_encoding {
                    updated.login_encoding = encoding.into();
                }
                config.save(updated)?;
                println!("Saved {}", config.path().display());
            }
        }

        Ok(())
    }
}

fn read_password() -> Result<String> {
    eprint!("Password: ");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
