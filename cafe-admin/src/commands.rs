//! CLI command definitions and dispatch.

use anyhow::{bail, Result};
use cafe_admin::routes::{CATEGORY, DASHBOARD, PRODUCT};
use cafe_admin::{AdminApp, ChangePasswordRequest, SignupRequest, Visit};
use clap::{Parser, Subcommand};
use common_auth::RouteKind;

/// Café admin console session tool
#[derive(Debug, Parser)]
#[command(name = "cafe-admin", version, about, long_about = None)]
pub struct Cli {
    /// Print session metrics collected during this run
    #[arg(long, global = true)]
    pub metrics: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Log in and store the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session token
    Logout,
    /// Register a new account
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        contact_number: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Ask the backend to mail a password reminder
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    /// Change the password of the logged-in account
    ChangePassword {
        #[arg(long)]
        old_password: String,
        #[arg(long)]
        new_password: String,
    },
    /// Check the stored token against the backend
    CheckToken,
    /// Open a route through the guard and load its data
    Visit { path: String },
    /// Show dashboard counters
    Dashboard,
    /// List categories
    Categories,
    /// List products
    Products,
    /// List bills
    Bills,
    /// Show the claims of the stored token
    Whoami,
    /// List the route table
    Routes,
}

impl Cli {
    pub async fn execute(&self, app: &AdminApp) -> Result<()> {
        match &self.command {
            Commands::Login { email, password } => {
                let visit = app.login(email, password).await?;
                print_visit(&visit);
            }
            Commands::Logout => {
                app.logout();
                println!("logged out; now at {}", app.current_route());
            }
            Commands::Signup {
                name,
                contact_number,
                email,
                password,
            } => {
                let request = SignupRequest {
                    name: name.clone(),
                    contact_number: contact_number.clone(),
                    email: email.clone(),
                    password: password.clone(),
                };
                println!("{}", app.signup(&request).await?);
            }
            Commands::ForgotPassword { email } => {
                println!("{}", app.forgot_password(email).await?);
            }
            Commands::ChangePassword {
                old_password,
                new_password,
            } => {
                let request = ChangePasswordRequest {
                    old_password: old_password.clone(),
                    new_password: new_password.clone(),
                };
                println!("{}", app.change_password(&request).await?);
            }
            Commands::CheckToken => {
                println!("token accepted: {}", app.check_token().await?);
            }
            Commands::Visit { path } => open(app, path).await?,
            Commands::Dashboard => open(app, DASHBOARD).await?,
            Commands::Categories => open(app, CATEGORY).await?,
            Commands::Products => open(app, PRODUCT).await?,
            Commands::Bills => {
                for bill in app.bills().await? {
                    println!(
                        "{:>5}  {:<24} {:<20} {:>6}  {}",
                        bill.id,
                        bill.uuid,
                        bill.name,
                        bill.total.map(|total| total.to_string()).unwrap_or_default(),
                        bill.payment_method.as_deref().unwrap_or("-")
                    );
                }
            }
            Commands::Whoami => match app.current_claims()? {
                Some(claims) => {
                    println!("subject: {}", claims.subject.as_deref().unwrap_or("-"));
                    println!("role:    {}", claims.role);
                    if let Some(expires_at) = claims.expires_at {
                        println!("expires: {}", expires_at.to_rfc3339());
                    }
                }
                None => println!("not logged in"),
            },
            Commands::Routes => {
                for route in app.routes().routes() {
                    let detail = match &route.kind {
                        RouteKind::Public => "public".to_string(),
                        RouteKind::Protected(access) => {
                            let roles: Vec<&str> =
                                access.roles().iter().map(|role| role.as_str()).collect();
                            format!("roles: {}", roles.join(", "))
                        }
                        RouteKind::Redirect(target) => format!("-> {target}"),
                    };
                    println!("{:<20} {}", route.path, detail);
                }
            }
        }
        Ok(())
    }
}

async fn open(app: &AdminApp, path: &str) -> Result<()> {
    let (visit, data) = app.open(path).await?;
    print_visit(&visit);
    if !visit.is_entered() {
        bail!("access to {path} denied");
    }
    if let Some(data) = data {
        println!("{data}");
    }
    Ok(())
}

fn print_visit(visit: &Visit) {
    match visit {
        Visit::Entered { path, role } => match role {
            Some(role) => println!("entered {path} as {role}"),
            None => println!("entered {path}"),
        },
        Visit::Denied {
            path,
            denial,
            redirected_to,
        } => println!(
            "denied {path} ({}); redirected to {redirected_to}",
            denial.reason()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_is_a_flag_on_any_command() {
        let cli = Cli::try_parse_from(["cafe-admin", "visit", "/cafe/order", "--metrics"])
            .expect("parses");
        assert!(cli.metrics);
        assert!(matches!(cli.command, Commands::Visit { ref path } if path == "/cafe/order"));

        let cli = Cli::try_parse_from(["cafe-admin", "routes"]).expect("parses");
        assert!(!cli.metrics);

        assert!(Cli::try_parse_from(["cafe-admin", "metrics"]).is_err());
    }

    #[test]
    fn page_commands_parse() {
        for name in ["dashboard", "categories", "products", "bills"] {
            assert!(Cli::try_parse_from(["cafe-admin", name]).is_ok(), "{name}");
        }
    }
}
