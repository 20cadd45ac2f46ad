//! Admin SDK Directory API: user accounts.

use tracing::info;

use super::client::{endpoint, ApiClient};
use super::ApiError;
use crate::models::{User, UsersList};

/// Scope granting read/write access to user accounts
pub const ADMIN_DIRECTORY_USER_SCOPE: &str = "https://www.googleapis.com/auth/admin.directory.user";

const DIRECTORY_BASE_URL: &str = "https://admin.googleapis.com/admin/directory/v1";

/// Alias for the customer account of the authenticated administrator
pub const MY_CUSTOMER: &str = "my_customer";

#[derive(Debug, Clone)]
pub struct ListUsersQuery {
    pub customer: String,
    pub max_results: u32,
    pub order_by: Option<String>,
    pub page_token: Option<String>,
}

impl Default for ListUsersQuery {
    fn default() -> Self {
        Self {
            customer: MY_CUSTOMER.to_string(),
            max_results: 10,
            order_by: Some("email".to_string()),
            page_token: None,
        }
    }
}

#[derive(Clone)]
pub struct DirectoryClient {
    api: ApiClient,
    base_url: String,
}

impl DirectoryClient {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            base_url: DIRECTORY_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub async fn insert_user(&self, user: &User) -> Result<User, ApiError> {
        let url = endpoint(&self.base_url, &["users"])?;
        let created: User = self.api.post(url.as_str(), user).await?;
        info!(email = ?created.primary_email, "Created user");
        Ok(created)
    }

    /// Apply a sparse update; only fields present in `changes` are modified
    pub async fn patch_user(&self, user_key: &str, changes: &User) -> Result<User, ApiError> {
        let url = endpoint(&self.base_url, &["users", user_key])?;
        self.api.patch(url.as_str(), changes).await
    }

    pub async fn get_user(&self, user_key: &str) -> Result<User, ApiError> {
        let url = endpoint(&self.base_url, &["users", user_key])?;
        self.api.get(url.as_str()).await
    }

    pub async fn list_users(&self, query: &ListUsersQuery) -> Result<UsersList, ApiError> {
        let mut url = endpoint(&self.base_url, &["users"])?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("customer", &query.customer)
                .append_pair("maxResults", &query.max_results.to_string());
            if let Some(ref order_by) = query.order_by {
                pairs.append_pair("orderBy", order_by);
            }
            if let Some(ref token) = query.page_token {
                pairs.append_pair("pageToken", token);
            }
        }
        self.api.get(url.as_str()).await
    }

    pub async fn delete_user(&self, user_key: &str) -> Result<(), ApiError> {
        let url = endpoint(&self.base_url, &["users", user_key])?;
        self.api.delete(url.as_str()).await?;
        info!(user = user_key, "Deleted user");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthorizedTransport, Credential};
    use crate::config::ClientRegistration;
    use std::sync::Arc;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn directory_for(server: &MockServer) -> DirectoryClient {
        let registration = ClientRegistration {
            client_id: "client-123".to_string(),
            client_secret: "secret".to_string(),
            redirect_uri: "urn:ietf:wg:oauth:2.0:oob".to_string(),
            scopes: vec![ADMIN_DIRECTORY_USER_SCOPE.to_string()],
            auth_uri: format!("{}/auth", server.uri()),
            token_uri: format!("{}/token", server.uri()),
        };
        let transport =
            AuthorizedTransport::new(reqwest::Client::new(), registration, Credential::new("tok1"));
        DirectoryClient::new(ApiClient::new(Arc::new(transport)))
            .with_base_url(format!("{}/admin/directory/v1", server.uri()))
    }

    #[tokio::test]
    async fn test_patch_user_sends_sparse_body() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/admin/directory/v1/users/pdrink@example.com"))
            .and(header("authorization", "Bearer tok1"))
            .and(body_json(serde_json::json!({
                "primaryEmail": "pdrink@example.com",
                "password": "better"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "42",
                "primaryEmail": "pdrink@example.com"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let directory = directory_for(&server);
        let updated = directory
            .patch_user(
                "pdrink@example.com",
                &User::password_reset("pdrink@example.com", "better"),
            )
            .await
            .unwrap();
        assert_eq!(updated.id.as_deref(), Some("42"));
    }

    #[tokio::test]
    async fn test_insert_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/directory/v1/users"))
            .respond_with(ResponseTemplate::new(409).set_body_string("Entity already exists."))
            .expect(1)
            .mount(&server)
            .await;

        let directory = directory_for(&server);
        let err = directory
            .insert_user(&User::new_account("a@example.com", "A", "B", "pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_list_users_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/directory/v1/users"))
            .and(query_param("customer", "my_customer"))
            .and(query_param("maxResults", "10"))
            .and(query_param("orderBy", "email"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "users": [{"primaryEmail": "a@example.com"}, {"primaryEmail": "b@example.com"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let directory = directory_for(&server);
        let list = directory.list_users(&ListUsersQuery::default()).await.unwrap();
        assert_eq!(list.users.len(), 2);
        assert!(list.next_page_token.is_none());
    }

    #[tokio::test]
    async fn test_get_and_delete_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/directory/v1/users/a@example.com"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Resource Not Found: userKey"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/admin/directory/v1/users/a@example.com"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let directory = directory_for(&server);
        let err = directory.get_user("a@example.com").await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        directory.delete_user("a@example.com").await.unwrap();
    }
}
