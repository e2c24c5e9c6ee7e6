//! REST API endpoints for transcript ingest, parsing, and provenance

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::db::models::CitationRow;
use crate::db::repository::IntakeRepository;
use crate::model::{IntakeExtractionResult, TranscriptTurn};
use crate::service::IntakeService;

/// Request body for bootstrap ingest
#[derive(Debug, Deserialize, ToSchema)]
pub struct IngestRequest {
    /// Raw transcript turns in call order
    pub transcript: Vec<TranscriptTurn>,
    /// Existing law firm to attach to; omitted = resolve from the transcript
    pub law_firm_id: Option<Uuid>,
}

/// Response for bootstrap ingest
#[derive(Debug, Serialize, ToSchema)]
pub struct IngestResponse {
    pub status: String,
    /// Whether an existing client + case were reused
    pub matched: bool,
    pub law_firm_id: Uuid,
    pub client_id: Uuid,
    pub case_id: Uuid,
    pub communication_id: Uuid,
    pub result: IntakeExtractionResult,
}

/// Response for parsing an existing communication
#[derive(Debug, Serialize, ToSchema)]
pub struct ParseResponse {
    pub status: String,
    pub result: IntakeExtractionResult,
}

/// Citation listing for one communication
#[derive(Debug, Serialize, ToSchema)]
pub struct CitationListResponse {
    pub communication_id: Uuid,
    pub citations: Vec<CitationRow>,
}

/// Bootstrap ingest: create law firm → client → case → communication from a
/// raw transcript, reusing existing client/case records when the caller and
/// incident match.
#[utoipa::path(
    post,
    path = "/v1/communications/ingest",
    request_body = IngestRequest,
    responses(
        (status = 201, description = "Transcript ingested", body = IngestResponse),
        (status = 400, description = "Unknown law firm or malformed transcript"),
        (status = 502, description = "Extraction call failed")
    ),
    tag = "communications"
)]
#[post("/v1/communications/ingest")]
pub async fn ingest(
    service: web::Data<IntakeService>,
    body: web::Json<IngestRequest>,
) -> Result<HttpResponse, ApiError> {
    let request = body.into_inner();
    let outcome = service
        .ingest(request.transcript, request.law_firm_id)
        .await?;

    Ok(HttpResponse::Created().json(IngestResponse {
        status: "ok".to_string(),
        matched: outcome.matched,
        law_firm_id: outcome.law_firm_id,
        client_id: outcome.client_id,
        case_id: outcome.case_id,
        communication_id: outcome.communication_id,
        result: outcome.result,
    }))
}

/// Re-run extraction on a stored communication's transcript
#[utoipa::path(
    post,
    path = "/v1/communications/{id}/parse",
    params(
        ("id" = Uuid, Path, description = "Communication ID")
    ),
    responses(
        (status = 200, description = "Transcript parsed", body = ParseResponse),
        (status = 404, description = "Communication not found"),
        (status = 502, description = "Extraction call failed")
    ),
    tag = "communications"
)]
#[post("/v1/communications/{id}/parse")]
pub async fn parse(
    service: web::Data<IntakeService>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let result = service.parse_communication(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ParseResponse {
        status: "ok".to_string(),
        result,
    }))
}

/// List a communication's citations for provenance audit
#[utoipa::path(
    get,
    path = "/v1/communications/{id}/citations",
    params(
        ("id" = Uuid, Path, description = "Communication ID")
    ),
    responses(
        (status = 200, description = "Citations retrieved", body = CitationListResponse),
        (status = 404, description = "Communication not found")
    ),
    tag = "communications"
)]
#[get("/v1/communications/{id}/citations")]
pub async fn citations(
    repo: web::Data<IntakeRepository>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let communication_id = path.into_inner();

    // 404 for an unknown communication, not an empty list
    let communication = repo.get_communication(communication_id).await?;
    let citations = repo.citations_for_communication(communication.id).await?;

    Ok(HttpResponse::Ok().json(CitationListResponse {
        communication_id,
        citations,
    }))
}

/// Configure communication routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(ingest).service(parse).service(citations);
}
