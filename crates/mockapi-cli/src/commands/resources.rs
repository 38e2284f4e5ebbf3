use anyhow::{Result, anyhow};
use colored::Colorize;
use mockapi_core::MockApiError;
use mockapi_core::resource::NewEndpoint;

use crate::console::Console;

/// Turns a call failure into the message shown to the user.
fn describe(err: MockApiError) -> anyhow::Error {
    if err.is_unauthorized() {
        return anyhow!("Session expired or access denied. Please log in again.");
    }
    match err.detail() {
        Some(detail) => anyhow!("{}", detail),
        None => err.into(),
    }
}

pub async fn list_organizations(console: &Console) -> Result<()> {
    console.require_session()?;
    let organizations = console
        .resources
        .list_organizations()
        .await
        .map_err(describe)?;

    if organizations.is_empty() {
        println!("{}", "No organizations yet. Create one with `mockapi create-org`.".bright_black());
        return Ok(());
    }

    let mock_base = &console.config.mock_engine.base_url;
    for org in organizations {
        println!("{} {}", format!("[{}]", org.id).bright_black(), org.name.bold());
        for member in &org.members {
            println!("    {} {}", member.user.email, format!("({})", member.role).bright_black());
        }
        if org.projects.is_empty() {
            println!("  {}", "no projects".bright_black());
        }
        for project in &org.projects {
            println!(
                "  {} {} {}",
                format!("#{}", project.id).bright_black(),
                project.name,
                project.mock_url(mock_base).cyan()
            );
            for endpoint in &project.endpoints {
                println!("      {:<7} {}", endpoint.method, endpoint.path);
            }
        }
    }
    Ok(())
}

pub async fn create_organization(console: &Console, name: &str) -> Result<()> {
    console.require_session()?;
    let org = console
        .resources
        .create_organization(name)
        .await
        .map_err(describe)?;
    println!("{}", format!("Created organization {} (id {})", org.name, org.id).green());
    Ok(())
}

pub async fn create_project(console: &Console, organization_id: i64, name: &str, slug: &str) -> Result<()> {
    console.require_session()?;
    let project = console
        .resources
        .create_project(organization_id, name, slug)
        .await
        .map_err(describe)?;
    println!(
        "{}",
        format!("Created project {} (id {})", project.name, project.id).green()
    );
    println!("Mock URL: {}", project.mock_url(&console.config.mock_engine.base_url));
    Ok(())
}

pub async fn create_endpoint(
    console: &Console,
    project_id: i64,
    method: &str,
    path: &str,
    status: u16,
    body: String,
) -> Result<()> {
    console.require_session()?;
    let endpoint = NewEndpoint::new(method, path, status, body);
    let created = console
        .resources
        .create_endpoint(project_id, &endpoint)
        .await
        .map_err(describe)?;
    println!(
        "{}",
        format!("Created {} {} (id {})", created.method, created.path, created.id).green()
    );
    Ok(())
}
