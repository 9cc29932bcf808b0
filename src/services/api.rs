use std::time::Duration as StdDuration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ApiConfig;
use crate::error::{AppError, AppResult};
use crate::models::{Event, EventPayload, Month, User, UserType};

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub username: String,
    /// bcrypt hash of the password, never the plain text.
    pub password: String,
    #[serde(rename = "type")]
    pub user_type: UserType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignupResult {
    #[serde(alias = "_id")]
    pub id: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResult {
    #[serde(alias = "_id")]
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(rename = "type", default)]
    pub user_type: UserType,
    #[serde(default)]
    pub events: Vec<String>,
    pub token: String,
}

impl LoginResult {
    pub fn into_parts(self) -> (User, String) {
        let user = User {
            id: self.id,
            username: self.username,
            email: self.email,
            user_type: self.user_type,
            events: self.events,
        };
        (user, self.token)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoveEventRequest {
    pub id: String,
}

/// `{error: {code, message, location}}` as sent by the server.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: serde_json::Value,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub location: Option<String>,
}

impl From<ApiErrorBody> for AppError {
    fn from(body: ApiErrorBody) -> Self {
        let code = match body.code {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        AppError::Api {
            code,
            message: body.message,
            location: body.location.filter(|l| !l.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Failure { error: ApiErrorBody },
    Success { result: T },
}

const UNAUTHORIZED: &str = "401";

/// Decode a `{result}` / `{error}` envelope. A body that is neither is a
/// decode error on success statuses and an unavailable service otherwise.
/// A 401 is always `Unauthorized`.
pub fn parse_envelope<T: DeserializeOwned>(success: bool, status: &str, body: &str) -> AppResult<T> {
    if status == UNAUTHORIZED {
        return Err(AppError::Unauthorized);
    }
    match serde_json::from_str::<Envelope<T>>(body) {
        Ok(Envelope::Success { result }) => Ok(result),
        Ok(Envelope::Failure { error }) => Err(error.into()),
        Err(_) if !success => Err(AppError::ServiceUnavailable(format!("{}: {}", status, body))),
        Err(e) => Err(e.into()),
    }
}

/// Read the id `/api/addevent` answers with. The server sends it as plain
/// text, sometimes JSON-quoted.
pub fn parse_created_id(body: &str) -> AppResult<String> {
    let trimmed = body.trim();
    if trimmed.starts_with('{') {
        if let Ok(Envelope::<serde_json::Value>::Failure { error }) = serde_json::from_str(trimmed) {
            return Err(error.into());
        }
    }
    let id = trimmed.trim_matches('"');
    if id.is_empty() {
        return Err(AppError::Internal(anyhow::anyhow!(
            "server returned an empty event id"
        )));
    }
    Ok(id.to_string())
}

// ============================================================================
// Client Seam
// ============================================================================

/// Everything the client needs from the calendar server.
#[async_trait]
pub trait CalendarApi: Send + Sync {
    async fn signup(&self, request: &SignupRequest) -> AppResult<SignupResult>;

    async fn login(&self, request: &LoginRequest) -> AppResult<LoginResult>;

    async fn update_from_server(&self, token: &str) -> AppResult<User>;

    async fn months(&self) -> AppResult<Vec<Month>>;

    async fn events(&self) -> AppResult<Vec<Event>>;

    /// Returns the id the server assigned.
    async fn add_event(&self, token: Option<&str>, payload: &EventPayload) -> AppResult<String>;

    async fn update_event(&self, token: Option<&str>, payload: &EventPayload) -> AppResult<()>;

    async fn remove_event(&self, token: Option<&str>, id: &str) -> AppResult<()>;
}

/// `CalendarApi` over HTTP. One attempt per call; failures are returned to
/// the caller as-is.
#[derive(Debug, Clone)]
pub struct HttpCalendarApi {
    client: Client,
    base_url: Url,
}

impl HttpCalendarApi {
    pub fn new(config: &ApiConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| AppError::Internal(e.into()))?;

        // Url::join drops the last path segment unless the base ends in '/'
        let mut base_url = config.base_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { client, base_url })
    }

    pub fn endpoint(&self, path: &str) -> AppResult<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn authorized(builder: RequestBuilder, token: Option<&str>) -> RequestBuilder {
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn envelope<T: DeserializeOwned>(response: Response) -> AppResult<T> {
        let status = response.status();
        let body = response.text().await?;
        parse_envelope(status.is_success(), status.as_str(), &body)
    }

    async fn ensure_success(response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status.as_str() == UNAUTHORIZED {
            return Err(AppError::Unauthorized);
        }
        let body = response.text().await.unwrap_or_default();
        if let Ok(Envelope::<serde_json::Value>::Failure { error }) = serde_json::from_str(&body) {
            return Err(error.into());
        }
        Err(AppError::ServiceUnavailable(format!("{}: {}", status, body)))
    }
}

#[async_trait]
impl CalendarApi for HttpCalendarApi {
    async fn signup(&self, request: &SignupRequest) -> AppResult<SignupResult> {
        let response = self
            .client
            .post(self.endpoint("users/signup")?)
            .json(request)
            .send()
            .await?;
        Self::envelope(response).await
    }

    async fn login(&self, request: &LoginRequest) -> AppResult<LoginResult> {
        let response = self
            .client
            .post(self.endpoint("users/login")?)
            .json(request)
            .send()
            .await?;
        Self::envelope(response).await
    }

    async fn update_from_server(&self, token: &str) -> AppResult<User> {
        let response = self
            .client
            .post(self.endpoint("user/updatefromserver")?)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await?;
        Self::envelope(response).await
    }

    async fn months(&self) -> AppResult<Vec<Month>> {
        let response = self.client.get(self.endpoint("months")?).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn events(&self) -> AppResult<Vec<Event>> {
        let response = self.client.get(self.endpoint("api/events")?).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.json().await?)
    }

    async fn add_event(&self, token: Option<&str>, payload: &EventPayload) -> AppResult<String> {
        let request = self.client.post(self.endpoint("api/addevent")?).json(payload);
        let response = Self::authorized(request, token).send().await?;
        let response = Self::ensure_success(response).await?;
        parse_created_id(&response.text().await?)
    }

    async fn update_event(&self, token: Option<&str>, payload: &EventPayload) -> AppResult<()> {
        let request = self
            .client
            .post(self.endpoint("api/updateevent")?)
            .json(payload);
        let response = Self::authorized(request, token).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }

    async fn remove_event(&self, token: Option<&str>, id: &str) -> AppResult<()> {
        let request = self
            .client
            .post(self.endpoint("api/removeevent")?)
            .json(&RemoveEventRequest { id: id.to_string() });
        let response = Self::authorized(request, token).send().await?;
        Self::ensure_success(response).await?;
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_success_yields_result() {
        let result: SignupResult =
            parse_envelope(true, "200", r#"{"result": {"id": "u1", "token": "t1"}}"#).unwrap();
        assert_eq!(result.id, "u1");
        assert_eq!(result.token, "t1");
    }

    #[test]
    fn envelope_error_keeps_location() {
        let err = parse_envelope::<SignupResult>(
            true,
            "200",
            r#"{"error": {"code": 11000, "message": "Username taken", "location": "username"}}"#,
        )
        .unwrap_err();
        match err {
            AppError::Api {
                code,
                message,
                location,
            } => {
                assert_eq!(code, "11000");
                assert_eq!(message, "Username taken");
                assert_eq!(location.as_deref(), Some("username"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn rejected_token_is_unauthorized() {
        let err = parse_envelope::<User>(
            false,
            "401",
            r#"{"error": {"code": 401, "message": "jwt expired"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized));
    }

    #[test]
    fn garbage_on_error_status_is_unavailable() {
        let err = parse_envelope::<SignupResult>(false, "502", "<html>bad gateway</html>")
            .unwrap_err();
        assert!(matches!(err, AppError::ServiceUnavailable(_)));
        let err = parse_envelope::<SignupResult>(true, "200", "{}").unwrap_err();
        assert!(matches!(err, AppError::Decode(_)));
    }

    #[test]
    fn login_result_decodes_user() {
        let body = r#"{"result": {"id": "u1", "email": "a@b.com", "username": "abc",
            "type": "user", "events": ["e1"], "token": "tok"}}"#;
        let result: LoginResult = parse_envelope(true, "200", body).unwrap();
        let (user, token) = result.into_parts();
        assert_eq!(user.user_type, UserType::User);
        assert_eq!(user.events, vec!["e1".to_string()]);
        assert_eq!(token, "tok");
    }

    #[test]
    fn created_id_accepts_plain_or_quoted_text() {
        assert_eq!(parse_created_id("64f1c0\n").unwrap(), "64f1c0");
        assert_eq!(parse_created_id("\"64f1c0\"").unwrap(), "64f1c0");
        assert!(parse_created_id("  ").is_err());
        assert!(matches!(
            parse_created_id(r#"{"error": {"code": 1, "message": "nope"}}"#),
            Err(AppError::Api { .. })
        ));
    }

    #[test]
    fn endpoints_resolve_under_base_path() {
        let config = ApiConfig {
            base_url: Url::parse("https://calendar.example.com/backend").unwrap(),
            request_timeout_seconds: 5,
        };
        let api = HttpCalendarApi::new(&config).unwrap();
        assert_eq!(
            api.endpoint("/api/events").unwrap().as_str(),
            "https://calendar.example.com/backend/api/events"
        );
        assert_eq!(
            api.endpoint("users/login").unwrap().as_str(),
            "https://calendar.example.com/backend/users/login"
        );
    }
}
