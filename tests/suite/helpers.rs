use secrecy::Secret;
use std::sync::LazyLock;
use story_spoiler_e2e::configuration::{Settings, TargetSettings};
use story_spoiler_e2e::telemetry::{get_subscriber, init_subscriber};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

// Ensure that the `tracing` stack is only initialised once using `LazyLock`
static TRACING: LazyLock<()> = LazyLock::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
        init_subscriber(subscriber);
    }
});

pub const SESSION_TOKEN: &str = "test-session-token";
pub const STORY_ID: &str = "story-5481";

/// Matches a create request whose title and description are populated.
pub struct PopulatedStoryMatcher;
impl Match for PopulatedStoryMatcher {
    fn matches(&self, request: &Request) -> bool {
        story_fields(request).is_some_and(|(title, description)| {
            !title.is_empty() && !description.is_empty()
        })
    }
}

/// Matches a create request missing its required fields.
pub struct BlankStoryMatcher;
impl Match for BlankStoryMatcher {
    fn matches(&self, request: &Request) -> bool {
        story_fields(request)
            .is_some_and(|(title, description)| title.is_empty() || description.is_empty())
    }
}

fn story_fields(request: &Request) -> Option<(String, String)> {
    let body: serde_json::Value = serde_json::from_slice(&request.body).ok()?;
    let title = body.get("title")?.as_str()?.to_string();
    let description = body.get("description")?.as_str()?.to_string();
    Some((title, description))
}

pub struct StoryApi {
    pub server: MockServer,
}

impl StoryApi {
    pub fn settings(&self) -> Settings {
        Settings {
            target: TargetSettings {
                base_url: self.server.uri(),
                username: "IlianaD".to_string(),
                password: Secret::new("123123".to_string()),
            },
        }
    }

    /// Mounts the four negative-path endpoints, which behave the same on a
    /// healthy and on a broken deployment.
    pub async fn mount_negative_endpoints(&self) {
        Mock::given(method("POST"))
            .and(path("/api/Story/Create"))
            .and(BlankStoryMatcher)
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({ "msg": "Title and description are required!" })),
            )
            .expect(1)
            .mount(&self.server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/api/Story/Edit/47"))
            .and(query_param("storyId", "47"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(serde_json::json!({ "msg": "No spoilers..." })),
            )
            .expect(1)
            .mount(&self.server)
            .await;

        Mock::given(method("DELETE"))
            .and(path("/api/Story/Delete/404"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(serde_json::json!({ "msg": "Unable to delete this story spoiler!" })),
            )
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// Mounts a fully conforming happy path. Every mock insists on the
    /// bearer token handed out by the authentication mock, so a passing run
    /// also proves the token from setup reaches every call.
    pub async fn mount_happy_endpoints(&self) {
        let bearer = format!("Bearer {SESSION_TOKEN}");

        Mock::given(method("POST"))
            .and(path("/api/Story/Create"))
            .and(header("Authorization", bearer.as_str()))
            .and(PopulatedStoryMatcher)
            .respond_with(ResponseTemplate::new(201).set_body_json(
                serde_json::json!({ "storyId": STORY_ID, "msg": "Successfully created!" }),
            ))
            .expect(1)
            .mount(&self.server)
            .await;

        Mock::given(method("PUT"))
            .and(path(format!("/api/Story/Edit/{STORY_ID}")))
            .and(query_param("storyId", STORY_ID))
            .and(header("Authorization", bearer.as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "msg": "Successfully edited!" })),
            )
            .expect(1)
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/Story/All"))
            .and(header("Authorization", bearer.as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": STORY_ID, "title": "Story Spoiler", "description": "..." }
            ])))
            .expect(1)
            .mount(&self.server)
            .await;

        Mock::given(method("DELETE"))
            .and(path(format!("/api/Story/Delete/{STORY_ID}")))
            .and(header("Authorization", bearer.as_str()))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "msg": "Deleted successfully!" })),
            )
            .expect(1)
            .mount(&self.server)
            .await;
    }
}

/// Starts a mock deployment with a working authentication endpoint.
pub async fn spawn_story_api() -> StoryApi {
    LazyLock::force(&TRACING);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/User/Authentication"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "accessToken": SESSION_TOKEN })),
        )
        .mount(&server)
        .await;

    StoryApi { server }
}

/// Starts a mock deployment whose login endpoint answers `response`.
pub async fn spawn_story_api_with_login(response: ResponseTemplate) -> StoryApi {
    LazyLock::force(&TRACING);

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/User/Authentication"))
        .respond_with(response)
        .mount(&server)
        .await;

    StoryApi { server }
}
