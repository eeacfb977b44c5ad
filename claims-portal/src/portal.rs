//! Screen-level view assembly.
//!
//! Each screen fetches through [`PortalClient`], normalizes, and runs the
//! shared view-model resolvers. A failed fetch never fails the screen: it
//! renders from an empty claim list and carries an error banner instead.

use claims_view::table::search_by_patient_or_id;
use claims_view::{
    AdjudicationAction, AdjudicationRequest, AnalyticsView, Attachment, ClaimDetail, ClaimFilter,
    ClaimRecord, ClaimRow, ClaimSubmission, ClaimSummary, DashboardView, PolicyRow,
    SeverityDistribution, SummaryCard, WorkQueue, claim_csv_columns, claim_report,
    claim_report_file_name, claim_rows, export_to_csv, normalize_claims, summarize,
};
use serde::Serialize;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::api::{
    Credentials, LoginStrategy, LoginSuccess, PortalClient, SubmissionResponse,
    default_strategies, login_in_order,
};
use crate::error::{PortalError, Result};
use crate::session::{Role, SessionContext, UserData};
use crate::view_slot::ViewSlot;

/// A screen's data plus the banner to show when its fetch failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Screen<T> {
    #[serde(flatten)]
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Screen<T> {
    pub fn ok(data: T) -> Self {
        Self { data, error: None }
    }

    pub fn failed(data: T, reason: impl Display) -> Self {
        Self {
            data,
            error: Some(reason.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatientDashboard {
    pub patient_name: Option<String>,
    pub summary: ClaimSummary,
    pub cards: Vec<SummaryCard>,
    pub claims: Vec<ClaimRow>,
    pub policies: Vec<PolicyRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyticsScreen {
    #[serde(flatten)]
    pub view: AnalyticsView,
    pub claims: Vec<ClaimRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkQueueScreen {
    pub claims: Vec<ClaimRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionInfo {
    pub authenticated: bool,
    pub role: Option<Role>,
    pub user: Option<UserData>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedReport {
    pub file_name: String,
    pub body: String,
}

struct InsurerFetch {
    claims: Vec<ClaimRecord>,
    reported: Option<SeverityDistribution>,
    failure: Option<PortalError>,
}

impl InsurerFetch {
    fn failed(reason: PortalError) -> Self {
        Self {
            claims: Vec::new(),
            reported: None,
            failure: Some(reason),
        }
    }
}

/// Views whose state outlives a single request
#[derive(Default)]
struct Screens {
    hospital: ViewSlot<Vec<ClaimRecord>>,
    work_queue: ViewSlot<WorkQueue>,
}

pub struct Portal {
    client: PortalClient,
    session: SessionContext,
    strategies: Vec<Arc<dyn LoginStrategy>>,
    screens: RwLock<Arc<Screens>>,
}

impl Portal {
    pub fn new(client: PortalClient, session: SessionContext) -> Self {
        let strategies = default_strategies(&client);
        Self::with_strategies(client, session, strategies)
    }

    pub fn with_strategies(
        client: PortalClient,
        session: SessionContext,
        strategies: Vec<Arc<dyn LoginStrategy>>,
    ) -> Self {
        Self {
            client,
            session,
            strategies,
            screens: RwLock::new(Arc::new(Screens::default())),
        }
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Drop every view; fetches still in flight publish into nothing.
    async fn reset_screens(&self) {
        *self.screens.write().await = Arc::new(Screens::default());
    }

    async fn screens(&self) -> Arc<Screens> {
        self.screens.read().await.clone()
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<LoginSuccess> {
        let success = login_in_order(&self.strategies, credentials).await?;
        self.session
            .begin(success.role, &success.token, &success.user)
            .await?;
        self.reset_screens().await;
        Ok(success)
    }

    pub async fn logout(&self) -> Result<()> {
        self.session.end().await?;
        self.reset_screens().await;
        Ok(())
    }

    pub async fn session_info(&self) -> Result<SessionInfo> {
        let authenticated = self.session.is_authenticated().await?;
        let user = if authenticated {
            self.session.user().await?
        } else {
            None
        };
        Ok(SessionInfo {
            authenticated,
            role: user.as_ref().and_then(UserData::role),
            user,
        })
    }

    async fn credentials(&self) -> Result<(String, UserData)> {
        let token = self.session.require_token().await?;
        let user = self.session.require_user().await?;
        Ok((token, user))
    }

    /// Cache RFI notes seen in a fetch and persist them when anything changed.
    async fn observe_rfi_notes(&self, claims: &[ClaimRecord]) {
        if self.session.rfi_notes().observe_all(claims) {
            if let Err(e) = self.session.persist_rfi_notes().await {
                warn!(error = %e, "Failed to persist RFI notes");
            }
        }
    }

    fn rows(&self, claims: &[ClaimRecord]) -> Vec<ClaimRow> {
        claim_rows(claims, self.session.rfi_notes())
    }

    pub async fn hospital_dashboard(
        &self,
        filter: &ClaimFilter,
        page: usize,
        page_size: usize,
    ) -> Result<Screen<DashboardView>> {
        let (token, user) = self.credentials().await?;
        let handle = self.screens().await.hospital.handle();

        let (claims, failure) = match user.hospital_id() {
            None => (Vec::new(), Some(PortalError::MissingIdentity("hospital id"))),
            Some(hospital_id) => match self.client.hospital_details(&token, &hospital_id).await {
                Ok(payload) => (normalize_claims(&payload.claims), None),
                Err(e) => {
                    error!(hospital_id = %hospital_id, error = %e, "Failed to fetch hospital claims");
                    (Vec::new(), Some(e.into()))
                }
            },
        };

        self.observe_rfi_notes(&claims).await;
        let data =
            DashboardView::build(&claims, self.session.rfi_notes(), filter, page, page_size)?;
        handle.publish(claims).await;

        Ok(match failure {
            Some(e) => Screen::failed(data, e),
            None => Screen::ok(data),
        })
    }

    /// Delete a hospital claim. The local copy goes only after the server
    /// accepted the delete; the returned summary reflects the remaining claims.
    pub async fn delete_hospital_claim(&self, claim_id: &str) -> Result<ClaimSummary> {
        let token = self.session.require_token().await?;
        self.client.delete_hospital_claim(&token, claim_id).await?;

        let screens = self.screens().await;
        screens
            .hospital
            .update(|claims| claims.retain(|claim| claim.claim_id != claim_id))
            .await;
        let remaining = screens.hospital.snapshot().await.unwrap_or_default();
        Ok(summarize(&remaining))
    }

    pub async fn patient_dashboard(&self) -> Result<Screen<PatientDashboard>> {
        let (token, user) = self.credentials().await?;

        let (claims, policies, failure) = match user.patient_id() {
            None => (
                Vec::new(),
                Vec::new(),
                Some(PortalError::MissingIdentity("patient id")),
            ),
            Some(patient_id) => match self.client.patient_details(&token, &patient_id).await {
                Ok(details) => (
                    normalize_claims(&details.claims),
                    details.policies.iter().map(PolicyRow::from_value).collect(),
                    None,
                ),
                Err(e) => {
                    error!(patient_id = %patient_id, error = %e, "Failed to fetch patient details");
                    (Vec::new(), Vec::new(), Some(e.into()))
                }
            },
        };

        self.observe_rfi_notes(&claims).await;
        let summary = summarize(&claims);
        let data = PatientDashboard {
            patient_name: user.text("name").or_else(|| user.display_name()),
            cards: summary.status_cards(),
            summary,
            claims: self.rows(&claims),
            policies,
        };
        Ok(match failure {
            Some(e) => Screen::failed(data, e),
            None => Screen::ok(data),
        })
    }

    /// The insurer's claim listing, or an empty list and the reason it failed.
    async fn insurance_claims(&self) -> Result<(Vec<ClaimRecord>, Option<PortalError>)> {
        let (token, user) = self.credentials().await?;
        let Some(insurer) = user.insurer_name() else {
            warn!("Insurance user has no insurer name; skipping fetch");
            return Ok((Vec::new(), Some(PortalError::MissingIdentity("insurance name"))));
        };

        match self.client.insurance_details(&token, &insurer).await {
            Ok(payload) => {
                let claims = normalize_claims(&payload.claims);
                self.observe_rfi_notes(&claims).await;
                Ok((claims, None))
            }
            Err(e) => {
                error!(insurer = %insurer, error = %e, "Failed to fetch insurance claims");
                Ok((Vec::new(), Some(e.into())))
            }
        }
    }

    pub async fn insurance_dashboard(
        &self,
        filter: &ClaimFilter,
        page: usize,
        page_size: usize,
    ) -> Result<Screen<DashboardView>> {
        let (claims, failure) = self.insurance_claims().await?;
        let data =
            DashboardView::build(&claims, self.session.rfi_notes(), filter, page, page_size)?;
        Ok(match failure {
            Some(e) => Screen::failed(data, e),
            None => Screen::ok(data),
        })
    }

    /// CSV of every insurance claim row, regardless of the table filter.
    pub async fn insurance_csv(&self) -> Result<String> {
        let (claims, _) = self.insurance_claims().await?;
        Ok(export_to_csv(&self.rows(&claims), &claim_csv_columns())?)
    }

    async fn insurer_claims(&self) -> Result<InsurerFetch> {
        let (token, user) = self.credentials().await?;
        let Some(insurer) = user.insurer_name() else {
            warn!("Insurance user has no insurer name; skipping fetch");
            return Ok(InsurerFetch::failed(PortalError::MissingIdentity("insurance name")));
        };

        match self.client.analytics(&token, &insurer).await {
            Ok(payload) => {
                let claims = normalize_claims(&payload.claims);
                self.observe_rfi_notes(&claims).await;
                Ok(InsurerFetch {
                    claims,
                    reported: payload.severity_distribution,
                    failure: None,
                })
            }
            Err(e) => {
                error!(insurer = %insurer, error = %e, "Failed to fetch analytics");
                Ok(InsurerFetch::failed(e.into()))
            }
        }
    }

    pub async fn analytics(&self) -> Result<Screen<AnalyticsScreen>> {
        let fetch = self.insurer_claims().await?;
        let data = AnalyticsScreen {
            view: AnalyticsView::build(&fetch.claims, fetch.reported),
            claims: self.rows(&fetch.claims),
        };
        Ok(match fetch.failure {
            Some(e) => Screen::failed(data, e),
            None => Screen::ok(data),
        })
    }

    pub async fn fraud_report(&self, claim_id: &str) -> Result<DownloadedReport> {
        let token = self.session.require_token().await?;
        let report = self.client.download_report(&token, claim_id).await?;
        info!(claim_id = %claim_id, "Fraud report downloaded");
        Ok(DownloadedReport {
            file_name: report.file_name(),
            body: report.render(),
        })
    }

    pub async fn work_queue(&self) -> Result<Screen<WorkQueueScreen>> {
        let handle = self.screens().await.work_queue.handle();
        let InsurerFetch {
            claims, failure, ..
        } = self.insurer_claims().await?;

        let queue = WorkQueue::from_claims(claims);
        let data = WorkQueueScreen {
            claims: self.rows(queue.claims()),
        };
        handle.publish(queue).await;

        Ok(match failure {
            Some(e) => Screen::failed(data, e),
            None => Screen::ok(data),
        })
    }

    /// Record an adjudicator decision. The claim leaves the local queue only
    /// once the server accepted it; a failure leaves the queue as it was.
    pub async fn decide(
        &self,
        claim_id: &str,
        action: AdjudicationAction,
        notes: Option<String>,
    ) -> Result<WorkQueueScreen> {
        let token = self.session.require_token().await?;
        let request = AdjudicationRequest::new(claim_id, action, notes);
        self.client.adjudicate(&token, &request).await?;
        info!(claim_id = %claim_id, status = %action.resulting_status(), "Decision recorded");

        let screens = self.screens().await;
        screens
            .work_queue
            .update(|queue| queue.remove(claim_id))
            .await;
        let remaining = screens.work_queue.snapshot().await.unwrap_or_default();
        Ok(WorkQueueScreen {
            claims: self.rows(remaining.claims()),
        })
    }

    /// The logged-in user's claims, fetched through their role's listing.
    async fn own_claims(&self) -> Result<Vec<ClaimRecord>> {
        let (token, user) = self.credentials().await?;
        let role = user
            .role()
            .ok_or(PortalError::MissingIdentity("role"))?;

        let raw = match role {
            Role::Hospital => {
                let id = user
                    .hospital_id()
                    .ok_or(PortalError::MissingIdentity("hospital id"))?;
                self.client.hospital_details(&token, &id).await?.claims
            }
            Role::Patient => {
                let id = user
                    .patient_id()
                    .ok_or(PortalError::MissingIdentity("patient id"))?;
                self.client.patient_details(&token, &id).await?.claims
            }
            Role::Insurance => {
                let insurer = user
                    .insurer_name()
                    .ok_or(PortalError::MissingIdentity("insurance name"))?;
                self.client.insurance_details(&token, &insurer).await?.claims
            }
        };

        let claims = normalize_claims(&raw);
        self.observe_rfi_notes(&claims).await;
        Ok(claims)
    }

    async fn find_claim(&self, claim_id: &str) -> Result<ClaimRecord> {
        self.own_claims()
            .await?
            .into_iter()
            .find(|claim| claim.claim_id == claim_id)
            .ok_or_else(|| PortalError::ClaimNotFound(claim_id.to_string()))
    }

    /// Claim tracker search: the user's claims whose patient name or claim id
    /// contains `query`, each with its stage progress.
    pub async fn track_claims(&self, query: &str) -> Result<Vec<ClaimDetail>> {
        let claims = self.own_claims().await?;
        Ok(search_by_patient_or_id(&claims, query)
            .into_iter()
            .map(|claim| ClaimDetail::from_record(claim, self.session.rfi_notes()))
            .collect())
    }

    /// Stage tracker for one of the logged-in user's claims.
    pub async fn claim_progress(&self, claim_id: &str) -> Result<ClaimDetail> {
        let claim = self.find_claim(claim_id).await?;
        Ok(ClaimDetail::from_record(&claim, self.session.rfi_notes()))
    }

    /// Plain-text dump of a claim's table row.
    pub async fn claim_row_report(&self, claim_id: &str) -> Result<DownloadedReport> {
        let claim = self.find_claim(claim_id).await?;
        let row = ClaimRow::from_record(&claim, self.session.rfi_notes());
        Ok(DownloadedReport {
            file_name: claim_report_file_name(&claim.claim_id),
            body: claim_report(&row)?,
        })
    }

    /// Validate locally, then post the claim with its documents.
    pub async fn submit_claim(
        &self,
        form: &ClaimSubmission,
        attachments: &[Attachment],
    ) -> Result<SubmissionResponse> {
        let (token, user) = self.credentials().await?;
        if let Err(e) = form.validate(&user.submitter(), attachments) {
            warn!(error = %e, "Claim submission failed validation");
            return Err(e.into());
        }

        let response = self
            .client
            .submit_patient_claim(&token, &form.claim_data(attachments), attachments)
            .await?;
        info!(patient_id = %form.patient_id, documents = attachments.len(), "Claim submitted");
        Ok(response)
    }

    pub async fn submit_rfi(
        &self,
        role: Role,
        claim_id: &str,
        response: &str,
        attachments: &[Attachment],
    ) -> Result<()> {
        if role.rfi_path().is_none() {
            return Err(PortalError::InvalidRequest(format!(
                "{} users do not answer RFIs",
                role
            )));
        }
        if claim_id.trim().is_empty() {
            return Err(PortalError::InvalidRequest("claim_id is required".to_string()));
        }
        let token = self.session.require_token().await?;
        self.client
            .submit_rfi(&token, role, claim_id, response, attachments)
            .await?;
        Ok(())
    }
}
