use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::StudentId,
    protocol::{ExternalUser, UserPayload},
};
use url::Url;

use crate::error::ApiError;

pub const DEFAULT_API_BASE_URL: &str = "https://jsonplaceholder.typicode.com";

/// Remote collaborator holding the user records the roster is built from.
///
/// Writes are not expected to persist; implementations only report whether
/// the call itself succeeded.
#[async_trait]
pub trait StudentsApi: Send + Sync {
    async fn list_users(&self) -> Result<Vec<ExternalUser>, ApiError>;
    async fn create_user(&self, payload: &UserPayload) -> Result<ExternalUser, ApiError>;
    async fn update_user(
        &self,
        id: StudentId,
        payload: &UserPayload,
    ) -> Result<ExternalUser, ApiError>;
    async fn delete_user(&self, id: StudentId) -> Result<(), ApiError>;
}

pub struct HttpStudentsApi {
    http: Client,
    users_url: Url,
}

impl HttpStudentsApi {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: &str) -> Result<Self, ApiError> {
        let mut base = Url::parse(base_url.trim())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self {
            http,
            users_url: base.join("users")?,
        })
    }

    pub fn users_url(&self) -> &Url {
        &self.users_url
    }

    fn user_url(&self, id: StudentId) -> Result<Url, ApiError> {
        Ok(Url::parse(&format!("{}/{}", self.users_url, id.0))?)
    }
}

async fn decode<T: DeserializeOwned>(res: Response) -> Result<T, ApiError> {
    let bytes = res.error_for_status()?.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl StudentsApi for HttpStudentsApi {
    async fn list_users(&self) -> Result<Vec<ExternalUser>, ApiError> {
        let res = self.http.get(self.users_url.clone()).send().await?;
        decode(res).await
    }

    async fn create_user(&self, payload: &UserPayload) -> Result<ExternalUser, ApiError> {
        let res = self
            .http
            .post(self.users_url.clone())
            .json(payload)
            .send()
            .await?;
        decode(res).await
    }

    async fn update_user(
        &self,
        id: StudentId,
        payload: &UserPayload,
    ) -> Result<ExternalUser, ApiError> {
        let res = self
            .http
            .put(self.user_url(id)?)
            .json(payload)
            .send()
            .await?;
        decode(res).await
    }

    async fn delete_user(&self, id: StudentId) -> Result<(), ApiError> {
        self.http
            .delete(self.user_url(id)?)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
