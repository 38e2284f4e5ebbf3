use anyhow::{Result, anyhow};
use colored::Colorize;
use mockapi_application::session::LOGIN_FAILED_MESSAGE;

use crate::console::Console;

pub async fn login(console: &Console, email: &str, password: &str) -> Result<()> {
    match console.session.login(email, password).await {
        Ok(state) => {
            let who = state
                .identity()
                .map(|user| user.email.clone())
                .unwrap_or_else(|| email.to_string());
            println!("{}", format!("Logged in as {}", who).green());
            Ok(())
        }
        Err(e) if e.is_invalid_credentials() => Err(anyhow!(e.user_message(LOGIN_FAILED_MESSAGE))),
        Err(e) if e.is_network() => Err(anyhow!(
            "Could not reach {}: {}",
            console.config.api.base_url,
            e
        )),
        Err(e) => Err(e.into()),
    }
}

pub fn logout(console: &Console) {
    let was_authenticated = console.session.is_authenticated();
    console.session.logout();
    if was_authenticated {
        println!("Logged out");
    } else {
        println!("{}", "Not logged in".bright_black());
    }
}

pub fn status(console: &Console) {
    if console.session.is_authenticated() {
        println!("{} ({})", "Authenticated".green(), console.config.api.base_url);
    } else {
        println!("{}", "Not logged in".yellow());
    }
}

pub async fn whoami(console: &Console) -> Result<()> {
    console.require_session()?;
    let user = console.session.refresh_identity().await.map_err(|e| {
        if e.is_unauthorized() {
            anyhow!("Session expired. Please log in again.")
        } else {
            e.into()
        }
    })?;
    println!("{} (id {})", user.email, user.id);
    if !user.is_active {
        println!("{}", "Account is inactive".yellow());
    }
    Ok(())
}

pub async fn register(console: &Console, email: &str, password: &str) -> Result<()> {
    let user = console
        .resources
        .register_user(email, password)
        .await
        .map_err(|e| anyhow!(e.user_message("Registration failed.")))?;
    println!(
        "{}",
        format!("Registered {}. Log in with `mockapi login --email {}`.", user.email, user.email)
            .green()
    );
    Ok(())
}
