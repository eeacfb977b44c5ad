use claims_view::{AdjudicationRequest, Attachment, FraudReport, SeverityDistribution};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::session::{Role, UserData};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn is_blank(&self) -> bool {
        self.username.trim().is_empty() || self.password.is_empty()
    }
}

/// Body of a `*-login` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<UserData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimsPayload {
    #[serde(default)]
    pub claims: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PatientDetails {
    #[serde(default)]
    pub claims: Vec<Value>,
    #[serde(default)]
    pub policies: Vec<Value>,
}

/// Payload of `/insurance-details` and `/analytics`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InsurerPayload {
    #[serde(default)]
    pub claims: Vec<Value>,
    #[serde(default)]
    pub severity_distribution: Option<SeverityDistribution>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_id: Option<String>,
}

/// Client for the claims REST API. The bearer token is passed per call.
#[derive(Clone, Debug)]
pub struct PortalClient {
    http: Client,
    base_url: String,
}

impl PortalClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `path` with `segment` appended as one escaped path segment.
    fn url_with_segment(&self, path: &str, segment: &str) -> ApiResult<Url> {
        let raw = self.url(path);
        let mut url = Url::parse(&raw).map_err(|_| ApiError::InvalidUrl(raw.clone()))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(raw.clone()))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    async fn send(&self, endpoint: &str, request: RequestBuilder) -> ApiResult<Response> {
        debug!(endpoint = %endpoint, "Calling claims API");
        let response = request.send().await.map_err(|source| {
            warn!(endpoint = %endpoint, error = %source, "Claims API unreachable");
            ApiError::Transport {
                endpoint: endpoint.to_string(),
                source,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            warn!(endpoint = %endpoint, status = status.as_u16(), "Claims API returned an error status");
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(endpoint: &str, response: Response) -> ApiResult<T> {
        let bytes = response.bytes().await.map_err(|source| ApiError::Transport {
            endpoint: endpoint.to_string(),
            source,
        })?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::UnexpectedPayload {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        token: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<T> {
        let endpoint = self.url(path);
        let request = self.http.get(&endpoint).bearer_auth(token).query(query);
        let response = self.send(&endpoint, request).await?;
        Self::read_json(&endpoint, response).await
    }

    pub async fn login(&self, role: Role, credentials: &Credentials) -> ApiResult<LoginResponse> {
        let endpoint = self.url(&role.login_path());
        let request = self.http.post(&endpoint).json(credentials);
        let response = self.send(&endpoint, request).await?;
        Self::read_json(&endpoint, response).await
    }

    pub async fn hospital_details(&self, token: &str, hospital_id: &str) -> ApiResult<ClaimsPayload> {
        self.get_json(token, "/hospital-details", &[("hospitalid", hospital_id)])
            .await
    }

    pub async fn patient_details(&self, token: &str, patient_id: &str) -> ApiResult<PatientDetails> {
        self.get_json(token, "/patient-details", &[("patient_id", patient_id)])
            .await
    }

    pub async fn insurance_details(&self, token: &str, insurer: &str) -> ApiResult<InsurerPayload> {
        self.get_json(token, "/insurance-details", &[("insurance_name", insurer)])
            .await
    }

    pub async fn analytics(&self, token: &str, insurer: &str) -> ApiResult<InsurerPayload> {
        self.get_json(token, "/analytics", &[("insurance_name", insurer)])
            .await
    }

    pub async fn download_report(&self, token: &str, claim_id: &str) -> ApiResult<FraudReport> {
        let url = self.url_with_segment("/download-report", claim_id)?;
        let endpoint = url.to_string();
        let response = self
            .send(&endpoint, self.http.get(url).bearer_auth(token))
            .await?;
        Self::read_json(&endpoint, response).await
    }

    pub async fn delete_hospital_claim(&self, token: &str, claim_id: &str) -> ApiResult<()> {
        let url = self.url_with_segment("/hospital-claim", claim_id)?;
        let endpoint = url.to_string();
        self.send(&endpoint, self.http.delete(url).bearer_auth(token))
            .await?;
        info!(claim_id = %claim_id, "Hospital claim deleted");
        Ok(())
    }

    pub async fn adjudicate(&self, token: &str, request: &AdjudicationRequest) -> ApiResult<()> {
        let endpoint = self.url("/adjudicator-post");
        self.send(&endpoint, self.http.post(&endpoint).bearer_auth(token).json(request))
            .await?;
        info!(claim_id = %request.claim_id, action = %request.action, "Adjudication recorded");
        Ok(())
    }

    /// Multipart `POST /patient-claim` with a `claimData` JSON part and one
    /// `documents` part per attachment.
    pub async fn submit_patient_claim(
        &self,
        token: &str,
        claim_data: &Value,
        attachments: &[Attachment],
    ) -> ApiResult<SubmissionResponse> {
        let endpoint = self.url("/patient-claim");
        let form = with_documents(
            Form::new().text("claimData", claim_data.to_string()),
            attachments,
        )?;

        let response = self
            .send(&endpoint, self.http.post(&endpoint).bearer_auth(token).multipart(form))
            .await?;
        let body: SubmissionResponse = Self::read_json(&endpoint, response).await?;
        if !body.success {
            return Err(ApiError::Rejected {
                endpoint,
                message: body
                    .message
                    .unwrap_or_else(|| "Failed to submit claim.".to_string()),
            });
        }
        Ok(body)
    }

    /// Multipart `POST /api/rfi-{hospital|patient}`.
    pub async fn submit_rfi(
        &self,
        token: &str,
        role: Role,
        claim_id: &str,
        response_text: &str,
        attachments: &[Attachment],
    ) -> ApiResult<()> {
        let path = role
            .rfi_path()
            .ok_or_else(|| ApiError::InvalidUrl(format!("no RFI endpoint for {}", role)))?;
        let endpoint = self.url(&path);
        let form = with_documents(
            Form::new()
                .text("claim_id", claim_id.to_string())
                .text("response", response_text.to_string()),
            attachments,
        )?;

        self.send(&endpoint, self.http.post(&endpoint).bearer_auth(token).multipart(form))
            .await?;
        info!(claim_id = %claim_id, role = %role, "RFI response submitted");
        Ok(())
    }
}

fn with_documents(mut form: Form, attachments: &[Attachment]) -> ApiResult<Form> {
    for attachment in attachments {
        let part = Part::bytes(attachment.data.clone())
            .file_name(attachment.name.clone())
            .mime_str(&attachment.mime)
            .map_err(|source| ApiError::InvalidAttachment {
                name: attachment.name.clone(),
                source,
            })?;
        form = form.part("documents", part);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;
    use claims_view::AdjudicationAction;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_hospital_details_sends_bearer_and_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/hospital-details"))
            .and(query_param("hospitalid", "HOSP 1"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"claims": [{"id": "C1"}]})))
            .expect(1)
            .mount(&server)
            .await;

        let client = PortalClient::new(server.uri());
        let payload = client.hospital_details("tok", "HOSP 1").await.unwrap();
        assert_eq!(payload.claims.len(), 1);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/patient-details"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = PortalClient::new(server.uri());
        let err = client.patient_details("tok", "P-1").await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_malformed_body_is_unexpected_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/analytics"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = PortalClient::new(server.uri());
        let err = client.analytics("tok", "Acme").await.unwrap_err();
        assert!(matches!(err, ApiError::UnexpectedPayload { .. }));
    }

    #[tokio::test]
    async fn test_insurer_payload_with_severity_distribution() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/insurance-details"))
            .and(query_param("insurance_name", "Acme Health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "claims": [],
                "severity_distribution": {"LOW": 2, "MEDIUM": 1, "HIGH": 0}
            })))
            .mount(&server)
            .await;

        let client = PortalClient::new(format!("{}/", server.uri()));
        let payload = client.insurance_details("tok", "Acme Health").await.unwrap();
        assert_eq!(
            payload.severity_distribution,
            Some(SeverityDistribution { low: 2, medium: 1, high: 0 })
        );
    }

    #[tokio::test]
    async fn test_delete_hospital_claim() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/hospital-claim/HC-7"))
            .and(header("authorization", "Bearer tok"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        PortalClient::new(server.uri())
            .delete_hospital_claim("tok", "HC-7")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_adjudicate_posts_request_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/adjudicator-post"))
            .and(body_json(json!({"claim_id": "C1", "action": "Approved"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let request = AdjudicationRequest::new("C1", AdjudicationAction::Approved, None);
        PortalClient::new(server.uri())
            .adjudicate("tok", &request)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_submit_patient_claim_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/patient-claim"))
            .and(body_string_contains("name=\"claimData\""))
            .and(body_string_contains("filename=\"bill.pdf\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "claim_id": "PC-1"})))
            .expect(1)
            .mount(&server)
            .await;

        let files = vec![Attachment::new("bill.pdf", "application/pdf", b"%PDF".to_vec())];
        let response = PortalClient::new(server.uri())
            .submit_patient_claim("tok", &json!({"patientName": "Ann"}), &files)
            .await
            .unwrap();
        assert_eq!(response.claim_id.as_deref(), Some("PC-1"));
    }

    #[tokio::test]
    async fn test_unsuccessful_submission_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/patient-claim"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": false, "message": "Duplicate claim"})))
            .mount(&server)
            .await;

        let err = PortalClient::new(server.uri())
            .submit_patient_claim("tok", &json!({}), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Rejected { ref message, .. } if message == "Duplicate claim"));
    }

    #[tokio::test]
    async fn test_submit_rfi_uses_role_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/rfi-patient"))
            .and(body_string_contains("name=\"response\""))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = PortalClient::new(server.uri());
        client
            .submit_rfi("tok", Role::Patient, "C3", "Attached the bill", &[])
            .await
            .unwrap();
        assert!(matches!(
            client.submit_rfi("tok", Role::Insurance, "C3", "x", &[]).await,
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_download_report() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/download-report/C9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "claim_id": "C9",
                "risk_assessment": {"overall_risk_score": 12.0, "fraud_flags": []},
                "analysis_summary": "Nothing unusual."
            })))
            .mount(&server)
            .await;

        let report = PortalClient::new(server.uri())
            .download_report("tok", "C9")
            .await
            .unwrap();
        assert_eq!(report.claim_id, "C9");
        assert_eq!(report.risk_level(), "Low Risk");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let client = PortalClient::new("http://127.0.0.1:9");
        let err = client.hospital_details("tok", "H").await.unwrap_err();
        assert!(matches!(err, ApiError::Transport { .. }));
    }
}
