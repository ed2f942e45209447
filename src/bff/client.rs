use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use super::BffApi;
use super::error::BffError;
use super::types::{
    ActivityToggleRequest, CancelEnrollRequest, CancelEnrollResponse, CancellationReceipt,
    ErrorBody, EvaluationRequest, ExternalSubmission, FilesQuery, ParticipantSessionRequest,
    ResendRequest,
};
use crate::enrollment::{ClassInfo, Student};
use crate::session::SessionGrant;
use crate::submission::Submission;

/// Connect and overall request timeouts applied to every call.
#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(30),
        }
    }
}

pub struct BffClient {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl BffClient {
    pub fn with_base_url(
        base_url: &str,
        token: Option<String>,
        timeouts: Timeouts,
    ) -> Result<Self, BffError> {
        let base_url =
            Url::parse(base_url).map_err(|e| BffError::InvalidBaseUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(BffError::InvalidBaseUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.request)
            .build()?;
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Replace the bearer token (e.g. after switching to participant mode).
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        self.request_as(method, segments, self.token.as_deref())
    }

    /// Like [`request`](Self::request) but authenticated with `token` instead
    /// of the client's own.
    fn request_as(&self, method: Method, segments: &[&str], token: Option<&str>) -> RequestBuilder {
        let url = self.endpoint(segments);
        let request_id = Uuid::new_v4().to_string();
        debug!(%method, %url, %request_id, "BFF request");
        let builder = self
            .client
            .request(method, url)
            .header("x-request-id", request_id);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, BffError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.message)
            .unwrap_or(text);
        warn!(status = status.as_u16(), %message, "BFF returned an error");
        Err(BffError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, BffError> {
        let response = self.send(builder).await?;
        Ok(response.json::<T>().await?)
    }
}

impl BffApi for BffClient {
    async fn get_class(&self, class_id: &str) -> Result<ClassInfo, BffError> {
        self.send_json(self.request(Method::GET, &["classes", class_id]))
            .await
    }

    async fn list_students(&self, class_id: &str) -> Result<Vec<Student>, BffError> {
        self.send_json(self.request(Method::GET, &["classes", class_id, "students"]))
            .await
    }

    async fn list_submissions(
        &self,
        class_id: &str,
        activity_id: Option<&str>,
    ) -> Result<Vec<Submission>, BffError> {
        let mut builder = self.request(Method::GET, &["classes", class_id, "submissions"]);
        if let Some(activity_id) = activity_id {
            builder = builder.query(&[("activity_id", activity_id)]);
        }
        self.send_json(builder).await
    }

    async fn update_submission(&self, id: &str, body: &EvaluationRequest) -> Result<(), BffError> {
        self.send(self.request(Method::PATCH, &["submissions", id]).json(body))
            .await?;
        Ok(())
    }

    async fn delete_submission(&self, id: &str, body: Option<&ResendRequest>) -> Result<(), BffError> {
        let mut builder = self.request(Method::DELETE, &["submissions", id]);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.send(builder).await?;
        Ok(())
    }

    async fn get_submission_files(&self, query: &FilesQuery) -> Result<Vec<u8>, BffError> {
        let response = self
            .send(self.request(Method::GET, &["submissions", "files"]).query(query))
            .await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn create_submission(&self, submission: &ExternalSubmission) -> Result<(), BffError> {
        let form = submission
            .form_fields()
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));
        self.send(self.request(Method::POST, &["submissions"]).multipart(form))
            .await?;
        Ok(())
    }

    async fn request_enrollment_cancellation(
        &self,
        enrollment_id: &str,
    ) -> Result<CancellationReceipt, BffError> {
        let response = self
            .send(self.request(
                Method::POST,
                &["enrollments", enrollment_id, "cancellation-request"],
            ))
            .await?;

        let status = response.status().as_u16();
        // Only 200 and 201 confirm the request was recorded.
        if status != 200 && status != 201 {
            return Err(BffError::Api {
                status,
                message: "cancellation request not confirmed".to_string(),
            });
        }
        let text = response.text().await?;
        let mut receipt = if text.trim().is_empty() {
            CancellationReceipt {
                status,
                message: None,
            }
        } else {
            serde_json::from_str::<CancellationReceipt>(&text)
                .map_err(|e| BffError::Unexpected(e.to_string()))?
        };
        receipt.status = status;
        Ok(receipt)
    }

    async fn cancel_enroll(
        &self,
        enroll_id: &str,
        reason: &str,
        token: &str,
    ) -> Result<CancelEnrollResponse, BffError> {
        let body = CancelEnrollRequest {
            reason: reason.to_string(),
        };
        let builder = self
            .request_as(Method::POST, &["enrollments", enroll_id, "cancel"], Some(token))
            .json(&body);
        self.send_json(builder).await
    }

    async fn update_activity(
        &self,
        enrollment_id: &str,
        activity_index: u32,
        completed: bool,
    ) -> Result<(), BffError> {
        let index = activity_index.to_string();
        let builder = self
            .request(
                Method::PUT,
                &["enrollments", enrollment_id, "activities", &index],
            )
            .json(&ActivityToggleRequest { completed });
        self.send(builder).await?;
        Ok(())
    }

    async fn participant_session(&self, participant_id: &str) -> Result<SessionGrant, BffError> {
        let body = ParticipantSessionRequest {
            participant_id: participant_id.to_string(),
        };
        self.send_json(
            self.request(Method::POST, &["auth", "participant-session"])
                .json(&body),
        )
        .await
    }
}
