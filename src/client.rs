use reqwest::{Client, Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, Secret};

/// One story payload as the remote API expects it.
///
/// `url` is nullable on the server side; leaving it out of the serialized
/// body reproduces a request that never mentions the field.
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoryPayload {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// What a case gets back from the service: the status line plus the raw
/// body, left unparsed so assertions can decide how to read it.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// HTTP client bound to the Story Spoiler deployment for one run.
///
/// Constructed once after the credential exchange and shared read-only by
/// every case; the bearer token rides on each outgoing request. The runner
/// owns the instance and drops it at teardown, which releases the
/// underlying connection resources on every exit path.
#[derive(Debug)]
pub struct ApiClient {
    base_url: String,
    http_client: Client,
    session_token: Secret<String>,
}

impl ApiClient {
    pub fn new(base_url: String, session_token: Secret<String>) -> Result<Self, reqwest::Error> {
        // Transport defaults only: no timeout override, no retry policy.
        let http_client = Client::builder().build()?;
        Ok(Self {
            base_url,
            http_client,
            session_token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http_client
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(self.session_token.expose_secret())
    }

    async fn dispatch(&self, builder: RequestBuilder) -> Result<ApiResponse, reqwest::Error> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(ApiResponse { status, body })
    }

    /// Send an arbitrary authenticated request with no body.
    pub async fn execute(&self, method: Method, path: &str) -> Result<ApiResponse, reqwest::Error> {
        self.dispatch(self.request(method, path)).await
    }

    #[tracing::instrument(name = "Creating story", skip(self, story))]
    pub async fn create_story(&self, story: &StoryPayload) -> Result<ApiResponse, reqwest::Error> {
        self.dispatch(self.request(Method::POST, "/api/Story/Create").json(story))
            .await
    }

    // The service wants the story id both in the path and as a query parameter.
    #[tracing::instrument(name = "Editing story", skip(self, story))]
    pub async fn edit_story(
        &self,
        story_id: &str,
        story: &StoryPayload,
    ) -> Result<ApiResponse, reqwest::Error> {
        self.dispatch(
            self.request(Method::PUT, &format!("/api/Story/Edit/{story_id}"))
                .query(&[("storyId", story_id)])
                .json(story),
        )
        .await
    }

    #[tracing::instrument(name = "Listing stories", skip(self))]
    pub async fn list_stories(&self) -> Result<ApiResponse, reqwest::Error> {
        self.execute(Method::GET, "/api/Story/All").await
    }

    #[tracing::instrument(name = "Deleting story", skip(self))]
    pub async fn delete_story(&self, story_id: &str) -> Result<ApiResponse, reqwest::Error> {
        self.execute(Method::DELETE, &format!("/api/Story/Delete/{story_id}"))
            .await
    }
}
