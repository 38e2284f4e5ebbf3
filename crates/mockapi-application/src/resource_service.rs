//! Manager API resource calls used by the views.
//!
//! Every authenticated call goes through [`SessionManager::guard`], so a
//! 401/403 from any of them ends the session.

use mockapi_core::Result;
use mockapi_core::resource::{
    Endpoint, NewEndpoint, NewOrganization, NewProject, NewUser, Organization, Project,
};
use mockapi_core::session::UserIdentity;
use mockapi_interaction::ApiClient;
use std::sync::Arc;

use crate::session::{CURRENT_USER_PATH, SessionManager};

pub const ORGANIZATIONS_PATH: &str = "/organizations";
pub const REGISTER_PATH: &str = "/users/register";

pub struct ResourceService {
    session: Arc<SessionManager>,
}

impl ResourceService {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self { session }
    }

    fn client(&self) -> &ApiClient {
        self.session.client()
    }

    pub async fn list_organizations(&self) -> Result<Vec<Organization>> {
        self.session
            .guard(self.client().get_json(ORGANIZATIONS_PATH))
            .await
    }

    pub async fn create_organization(&self, name: &str) -> Result<Organization> {
        let body = NewOrganization {
            name: name.to_string(),
        };
        self.session
            .guard(self.client().post_json(ORGANIZATIONS_PATH, &body))
            .await
    }

    pub async fn create_project(
        &self,
        organization_id: i64,
        name: &str,
        url_slug: &str,
    ) -> Result<Project> {
        let path = format!("{}/{}/projects", ORGANIZATIONS_PATH, organization_id);
        let body = NewProject {
            name: name.to_string(),
            url_slug: url_slug.to_string(),
        };
        self.session
            .guard(self.client().post_json(&path, &body))
            .await
    }

    pub async fn create_endpoint(&self, project_id: i64, endpoint: &NewEndpoint) -> Result<Endpoint> {
        let path = format!("/projects/{}/endpoints", project_id);
        self.session
            .guard(self.client().post_json(&path, endpoint))
            .await
    }

    /// Looks a project up across every organization the user belongs to.
    pub async fn find_project(&self, project_id: i64) -> Result<Option<Project>> {
        let organizations = self.list_organizations().await?;
        Ok(organizations
            .into_iter()
            .flat_map(|org| org.projects)
            .find(|project| project.id == project_id))
    }

    /// Looks a project up by its URL slug.
    pub async fn find_project_by_slug(&self, url_slug: &str) -> Result<Option<Project>> {
        let organizations = self.list_organizations().await?;
        Ok(organizations
            .into_iter()
            .flat_map(|org| org.projects)
            .find(|project| project.url_slug == url_slug))
    }

    pub async fn current_user(&self) -> Result<UserIdentity> {
        self.session
            .guard(self.client().get_json(CURRENT_USER_PATH))
            .await
    }

    /// Creates an account. Unauthenticated; does not log in.
    pub async fn register_user(&self, email: &str, password: &str) -> Result<UserIdentity> {
        let body = NewUser {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.client().post_json(REGISTER_PATH, &body).await
    }
}
