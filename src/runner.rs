use std::future::Future;
use std::pin::Pin;

use reqwest::StatusCode;

use crate::authentication::{AuthError, Credentials, request_session_token};
use crate::client::{ApiClient, ApiResponse};
use crate::configuration::Settings;

#[derive(thiserror::Error, Debug)]
pub enum SetupError {
    #[error("failed to obtain a session token")]
    Authentication(#[from] AuthError),
    #[error("failed to build the api client")]
    Client(#[from] reqwest::Error),
}

/// One way a case can fail. Every variant carries enough of the observed
/// response to render an expected-vs-actual report line.
#[derive(thiserror::Error, Debug)]
pub enum CaseFailure {
    #[error("expected status {expected}, got {actual} (body: {body})")]
    Status {
        expected: StatusCode,
        actual: StatusCode,
        body: String,
    },
    #[error("body does not contain {needle:?} (body: {body})")]
    MissingSubstring { needle: String, body: String },
    #[error("field {field:?} should be {expected:?}, got {actual:?}")]
    FieldMismatch {
        field: &'static str,
        expected: String,
        actual: Option<String>,
    },
    #[error("no non-empty {field:?} field in the body (body: {body})")]
    MissingField { field: &'static str, body: String },
    #[error("expected a non-empty collection (body: {body})")]
    EmptyCollection { body: String },
    #[error("no story id was captured by an earlier case")]
    MissingStoryId,
    #[error("malformed response body")]
    MalformedBody(#[from] serde_json::Error),
    #[error("request failed")]
    Transport(#[from] reqwest::Error),
}

pub fn expect_status(response: &ApiResponse, expected: StatusCode) -> Result<(), CaseFailure> {
    if response.status == expected {
        Ok(())
    } else {
        Err(CaseFailure::Status {
            expected,
            actual: response.status,
            body: response.body.clone(),
        })
    }
}

pub fn expect_body_contains(response: &ApiResponse, needle: &str) -> Result<(), CaseFailure> {
    if response.body.contains(needle) {
        Ok(())
    } else {
        Err(CaseFailure::MissingSubstring {
            needle: needle.to_string(),
            body: response.body.clone(),
        })
    }
}

pub fn parse_json<T: serde::de::DeserializeOwned>(
    response: &ApiResponse,
) -> Result<T, CaseFailure> {
    response.json().map_err(CaseFailure::MalformedBody)
}

/// Mutable state threaded through the ordered cases of one run.
///
/// The creation case writes the id of the story it created; later cases
/// that target that story read it back. The slot is passed `&mut` by the
/// runner rather than living in a static, so the producer/consumer
/// coupling is visible in each case's signature. An empty or absent id is
/// a deterministic failure for the reader, never a silent skip.
#[derive(Debug, Default)]
pub struct RunContext {
    created_story_id: Option<String>,
}

impl RunContext {
    pub fn record_story_id(&mut self, story_id: String) {
        self.created_story_id = Some(story_id);
    }

    pub fn require_story_id(&self) -> Result<&str, CaseFailure> {
        match self.created_story_id.as_deref() {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(CaseFailure::MissingStoryId),
        }
    }
}

pub type CaseFuture<'a> = Pin<Box<dyn Future<Output = Result<(), CaseFailure>> + Send + 'a>>;

/// One named unit of the sequence: a single request plus its assertions.
pub struct Case {
    name: &'static str,
    run: Box<dyn for<'a> Fn(&'a ApiClient, &'a mut RunContext) -> CaseFuture<'a> + Send + Sync>,
}

impl Case {
    pub fn new(
        name: &'static str,
        run: impl for<'a> Fn(&'a ApiClient, &'a mut RunContext) -> CaseFuture<'a>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self {
            name,
            run: Box::new(run),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    NotStarted,
    SettingUp,
    Running(usize),
    TearingDown,
    Done,
}

#[derive(Debug)]
pub struct CaseReport {
    name: &'static str,
    outcome: Result<(), CaseFailure>,
}

impl CaseReport {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn outcome(&self) -> &Result<(), CaseFailure> {
        &self.outcome
    }

    pub fn passed(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[derive(Debug)]
pub struct RunReport {
    phase: RunPhase,
    cases: Vec<CaseReport>,
}

impl RunReport {
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn cases(&self) -> &[CaseReport] {
        &self.cases
    }

    /// Conjunction of every case outcome, not a short-circuit.
    pub fn passed(&self) -> bool {
        self.cases.iter().all(CaseReport::passed)
    }

    pub fn failed_count(&self) -> usize {
        self.cases.iter().filter(|case| !case.passed()).count()
    }
}

/// Executes a declared sequence of cases against one shared client.
///
/// Setup runs once before the first case (credential exchange, then client
/// construction) and any setup error aborts the run before a single case
/// executes. Case failures are recorded and the sequence continues; the
/// client is released after the last case on every path, followed by the
/// optional teardown hook.
pub struct Runner {
    cases: Vec<Case>,
    on_teardown: Option<Box<dyn FnOnce() + Send>>,
}

impl Runner {
    pub fn new(cases: Vec<Case>) -> Self {
        Self {
            cases,
            on_teardown: None,
        }
    }

    pub fn on_teardown(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_teardown = Some(Box::new(hook));
        self
    }

    #[tracing::instrument(name = "Executing run", skip_all)]
    pub async fn execute(self, settings: &Settings) -> Result<RunReport, SetupError> {
        tracing::info!(phase = ?RunPhase::SettingUp, "run phase");
        let credentials = Credentials {
            username: settings.target.username.clone(),
            password: settings.target.password.clone(),
        };
        let session_token = request_session_token(&settings.target.base_url, &credentials).await?;
        let client = ApiClient::new(settings.target.base_url.clone(), session_token)?;
        Ok(self.execute_with_client(client).await)
    }

    /// Run every case in declared order against an already-built client.
    pub async fn execute_with_client(mut self, client: ApiClient) -> RunReport {
        let mut context = RunContext::default();
        let mut reports = Vec::with_capacity(self.cases.len());

        for (index, case) in self.cases.iter().enumerate() {
            tracing::info!(phase = ?RunPhase::Running(index), case = case.name, "run phase");
            let outcome = (case.run)(&client, &mut context).await;
            match &outcome {
                Ok(()) => tracing::info!(case = case.name, "case passed"),
                Err(failure) => tracing::error!(case = case.name, %failure, "case failed"),
            }
            reports.push(CaseReport {
                name: case.name,
                outcome,
            });
        }

        tracing::info!(phase = ?RunPhase::TearingDown, "run phase");
        drop(client);
        if let Some(hook) = self.on_teardown.take() {
            hook();
        }

        tracing::info!(phase = ?RunPhase::Done, "run phase");
        RunReport {
            phase: RunPhase::Done,
            cases: reports,
        }
    }
}
