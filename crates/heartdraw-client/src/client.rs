use reqwest::{Client, Response};
use tracing::debug;
use uuid::Uuid;

use heartdraw_types::api::{CreateHeartRequest, Credentials, ErrorBody, UpdateHeartRequest};
use heartdraw_types::models::{Heart, User};

use crate::{ClientError, Result};

/// Typed wrapper over the `/api` surface. Keeps the session cookie between
/// calls, so `login` once and the rest are authenticated.
#[derive(Clone)]
pub struct HeartClient {
    http: Client,
    base_url: String,
}

impl HeartClient {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:5000`.
    pub fn new(base_url: &str) -> Result<Self> {
        let http = Client::builder().cookie_store(true).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<User> {
        let resp = self
            .http
            .post(self.url("/register"))
            .json(&credentials(username, password))
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<User> {
        let resp = self
            .http
            .post(self.url("/login"))
            .json(&credentials(username, password))
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn logout(&self) -> Result<()> {
        let resp = self.http.post(self.url("/logout")).send().await?;
        check(resp).await?;
        Ok(())
    }

    pub async fn current_user(&self) -> Result<User> {
        let resp = self.http.get(self.url("/user")).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn list_hearts(&self) -> Result<Vec<Heart>> {
        let resp = self.http.get(self.url("/hearts")).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn get_heart(&self, id: Uuid) -> Result<Heart> {
        let resp = self.http.get(self.url(&format!("/hearts/{id}"))).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn create_heart(&self, req: &CreateHeartRequest) -> Result<Heart> {
        let resp = self.http.post(self.url("/hearts")).json(req).send().await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn update_heart(&self, id: Uuid, req: &UpdateHeartRequest) -> Result<Heart> {
        let resp = self
            .http
            .put(self.url(&format!("/hearts/{id}")))
            .json(req)
            .send()
            .await?;
        Ok(check(resp).await?.json().await?)
    }

    pub async fn delete_heart(&self, id: Uuid) -> Result<()> {
        let resp = self
            .http
            .delete(self.url(&format!("/hearts/{id}")))
            .send()
            .await?;
        check(resp).await?;
        Ok(())
    }
}

fn credentials(username: &str, password: &str) -> Credentials {
    Credentials {
        username: username.to_string(),
        password: password.to_string(),
    }
}

/// Turn a non-2xx response into [`ClientError::Status`] with the server's message.
async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let message = match resp.json::<ErrorBody>().await {
        Ok(body) => body.message,
        Err(_) => status.canonical_reason().unwrap_or("unknown error").to_string(),
    };
    debug!("{} from server: {}", status, message);
    Err(ClientError::Status { status, message })
}
