//! The ordered Story Spoiler sequence: four happy-path cases that build on
//! each other, then three negative-path probes. The order is the dependency
//! graph: case 1 produces the story id that cases 2 and 4 consume.

use reqwest::StatusCode;

use crate::client::{ApiClient, StoryPayload};
use crate::runner::{
    Case, CaseFailure, CaseFuture, RunContext, expect_body_contains, expect_status, parse_json,
};

const CREATED_MESSAGE: &str = "Successfully created!";
const EDITED_FRAGMENT: &str = "Successfully edited";
const DELETED_FRAGMENT: &str = "Deleted successfully!";
const NOT_FOUND_FRAGMENT: &str = "No spoilers...";
const DELETE_FAILURE_FRAGMENT: &str = "Unable to delete this story spoiler!";

// Well-formed ids that no story on the server carries.
const UNKNOWN_EDIT_ID: &str = "47";
const UNKNOWN_DELETE_ID: &str = "404";

#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateStoryResponse {
    story_id: Option<String>,
    msg: Option<String>,
}

/// The full declared sequence, in execution order.
pub fn story_suite() -> Vec<Case> {
    vec![
        Case::new("create_story_returns_created", create_story_returns_created),
        Case::new("edit_created_story_returns_ok", edit_created_story_returns_ok),
        Case::new("list_all_stories_returns_some", list_all_stories_returns_some),
        Case::new(
            "delete_created_story_returns_ok",
            delete_created_story_returns_ok,
        ),
        Case::new(
            "create_story_without_required_fields_returns_bad_request",
            create_story_without_required_fields_returns_bad_request,
        ),
        Case::new(
            "edit_unknown_story_returns_not_found",
            edit_unknown_story_returns_not_found,
        ),
        Case::new(
            "delete_unknown_story_returns_bad_request",
            delete_unknown_story_returns_bad_request,
        ),
    ]
}

fn create_story_returns_created<'a>(
    client: &'a ApiClient,
    context: &'a mut RunContext,
) -> CaseFuture<'a> {
    Box::pin(async move {
        let story = StoryPayload {
            title: "Story Spoiler".to_string(),
            description: "This is a description of this story spoiler.".to_string(),
            url: Some(String::new()),
        };

        let response = client.create_story(&story).await?;
        expect_status(&response, StatusCode::CREATED)?;

        let body: CreateStoryResponse = parse_json(&response)?;
        let story_id = body.story_id.unwrap_or_default();
        if story_id.is_empty() {
            return Err(CaseFailure::MissingField {
                field: "storyId",
                body: response.body.clone(),
            });
        }
        context.record_story_id(story_id);

        if body.msg.as_deref() != Some(CREATED_MESSAGE) {
            return Err(CaseFailure::FieldMismatch {
                field: "msg",
                expected: CREATED_MESSAGE.to_string(),
                actual: body.msg,
            });
        }
        Ok(())
    })
}

fn edit_created_story_returns_ok<'a>(
    client: &'a ApiClient,
    context: &'a mut RunContext,
) -> CaseFuture<'a> {
    Box::pin(async move {
        let story_id = context.require_story_id()?;
        let story = StoryPayload {
            title: "Edit the created story spoiler".to_string(),
            description: "This is an edited story spoiler of existing story.".to_string(),
            url: Some(String::new()),
        };

        let response = client.edit_story(story_id, &story).await?;
        expect_status(&response, StatusCode::OK)?;
        expect_body_contains(&response, EDITED_FRAGMENT)
    })
}

fn list_all_stories_returns_some<'a>(
    client: &'a ApiClient,
    _context: &'a mut RunContext,
) -> CaseFuture<'a> {
    Box::pin(async move {
        let response = client.list_stories().await?;
        expect_status(&response, StatusCode::OK)?;

        let stories: Vec<serde_json::Value> = parse_json(&response)?;
        if stories.is_empty() {
            return Err(CaseFailure::EmptyCollection {
                body: response.body.clone(),
            });
        }
        Ok(())
    })
}

fn delete_created_story_returns_ok<'a>(
    client: &'a ApiClient,
    context: &'a mut RunContext,
) -> CaseFuture<'a> {
    Box::pin(async move {
        let story_id = context.require_story_id()?;

        let response = client.delete_story(story_id).await?;
        expect_status(&response, StatusCode::OK)?;
        expect_body_contains(&response, DELETED_FRAGMENT)
    })
}

fn create_story_without_required_fields_returns_bad_request<'a>(
    client: &'a ApiClient,
    _context: &'a mut RunContext,
) -> CaseFuture<'a> {
    Box::pin(async move {
        let story = StoryPayload {
            title: String::new(),
            description: String::new(),
            url: None,
        };

        let response = client.create_story(&story).await?;
        expect_status(&response, StatusCode::BAD_REQUEST)
    })
}

fn edit_unknown_story_returns_not_found<'a>(
    client: &'a ApiClient,
    _context: &'a mut RunContext,
) -> CaseFuture<'a> {
    Box::pin(async move {
        let story = StoryPayload {
            title: "Edited Non-Existing Story".to_string(),
            description: "This is an updated story description.".to_string(),
            url: Some(String::new()),
        };

        let response = client.edit_story(UNKNOWN_EDIT_ID, &story).await?;
        expect_status(&response, StatusCode::NOT_FOUND)?;
        expect_body_contains(&response, NOT_FOUND_FRAGMENT)
    })
}

fn delete_unknown_story_returns_bad_request<'a>(
    client: &'a ApiClient,
    _context: &'a mut RunContext,
) -> CaseFuture<'a> {
    Box::pin(async move {
        let response = client.delete_story(UNKNOWN_DELETE_ID).await?;
        expect_status(&response, StatusCode::BAD_REQUEST)?;
        expect_body_contains(&response, DELETE_FAILURE_FRAGMENT)
    })
}
