//! `/api/problems`: catalog listing, summary and admin CRUD.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use problemset_core::{
    query::sort_by_serial, validate_problem, CatalogSummary, Difficulty, Problem, ProblemId,
    ProblemInput, ProblemQuery,
};
use problemset_store::ProblemStore;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{error::GatewayError, state::AppState};

// ── Request / response types ──────────────────────────────────────────────────

/// Optional filters of `GET /api/problems`.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub search: Option<String>,
    /// `Easy`, `Medium`, `Hard`, or `All` for no filter.
    pub difficulty: Option<String>,
    pub topic: Option<String>,
    /// Only `serial` is recognised.
    pub sort: Option<String>,
}

impl ListParams {
    /// Split into the filter and whether to order by serial.
    ///
    /// # Errors
    /// Returns [`GatewayError::BadRequest`] for an unknown difficulty or sort
    /// key.
    pub fn into_query(self) -> Result<(ProblemQuery, bool), GatewayError> {
        let difficulty = match self.difficulty.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(d) if d.eq_ignore_ascii_case("all") => None,
            Some(d) => Some(d.parse::<Difficulty>().map_err(|_| {
                GatewayError::BadRequest(
                    "difficulty must be one of All, Easy, Medium or Hard".to_owned(),
                )
            })?),
        };
        let by_serial = match self.sort.as_deref().map(str::trim) {
            None | Some("") => false,
            Some("serial") => true,
            Some(_) => return Err(GatewayError::BadRequest("sort must be serial".to_owned())),
        };
        let query = ProblemQuery {
            search: self.search,
            difficulty,
            topic: self.topic,
        };
        Ok((query, by_serial))
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub problems: Vec<Problem>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub success: bool,
    #[serde(flatten)]
    pub summary: CatalogSummary,
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    pub id: Option<String>,
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// `GET /api/problems`: every entry in stored order, optionally filtered
/// and ordered by serial.
///
/// # Errors
/// Returns [`GatewayError::BadRequest`] for invalid parameters and
/// [`GatewayError::Internal`] if the store cannot be read.
pub async fn list_problems(
    State(state): State<AppState>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ListResponse>, GatewayError> {
    let Query(params) = params?;
    let (query, by_serial) = params.into_query()?;
    let stored = state
        .store
        .list()
        .await
        .map_err(|e| GatewayError::from_store("Failed to fetch problems from database", e))?;

    let mut problems = query.apply(stored);
    if by_serial {
        sort_by_serial(&mut problems);
    }
    let total = problems.len();
    Ok(Json(ListResponse {
        success: true,
        problems,
        total,
    }))
}

/// `GET /api/problems/summary`: per-difficulty totals and topic tags.
///
/// # Errors
/// Returns [`GatewayError::Internal`] if the store cannot be read.
pub async fn problem_summary(
    State(state): State<AppState>,
) -> Result<Json<SummaryResponse>, GatewayError> {
    let problems = state
        .store
        .list()
        .await
        .map_err(|e| GatewayError::from_store("Failed to fetch problems from database", e))?;
    Ok(Json(SummaryResponse {
        success: true,
        summary: CatalogSummary::of(&problems),
    }))
}

/// `POST /api/problems`: validate, sanitise and insert a new entry.
///
/// # Errors
/// Returns [`GatewayError::Validation`] for invalid fields and
/// [`GatewayError::DuplicateSerial`] if the serial is taken.
pub async fn create_problem(
    State(state): State<AppState>,
    payload: Result<Json<ProblemInput>, JsonRejection>,
) -> Result<impl IntoResponse, GatewayError> {
    let Json(input) = payload?;
    let draft = validate_problem(&input)?;
    let problem = state
        .store
        .insert(draft)
        .await
        .map_err(|e| GatewayError::from_store("Failed to add problem to database", e))?;
    tracing::info!(id = %problem.id, serial = %problem.serial, "problem added");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Problem added successfully",
            "id": problem.id,
        })),
    ))
}

/// `PUT /api/problems`: replace every field of the entry named by `_id`.
///
/// # Errors
/// Returns [`GatewayError::BadRequest`] if `_id` is missing,
/// [`GatewayError::Validation`] for invalid fields,
/// [`GatewayError::ProblemNotFound`] for an unknown id and
/// [`GatewayError::DuplicateSerial`] if the serial belongs to another entry.
pub async fn update_problem(
    State(state): State<AppState>,
    payload: Result<Json<ProblemInput>, JsonRejection>,
) -> Result<Json<Value>, GatewayError> {
    let Json(input) = payload?;
    let id = match &input.id {
        Some(Value::String(id)) if !id.trim().is_empty() => ProblemId::new(id.trim()),
        _ => return Err(GatewayError::BadRequest("Problem ID is required".to_owned())),
    };
    let draft = validate_problem(&input)?;
    state
        .store
        .replace(&id, draft)
        .await
        .map_err(|e| GatewayError::from_store("Failed to update problem", e))?;
    tracing::info!(id = %id, "problem updated");

    Ok(Json(json!({"success": true, "message": "Problem updated successfully"})))
}

/// `DELETE /api/problems?id=...`: remove one entry.
///
/// # Errors
/// Returns [`GatewayError::BadRequest`] if `id` is missing or blank and
/// [`GatewayError::ProblemNotFound`] if no entry has that id.
pub async fn delete_problem(
    State(state): State<AppState>,
    params: Result<Query<DeleteParams>, QueryRejection>,
) -> Result<Json<Value>, GatewayError> {
    let Query(params) = params?;
    let Some(id) = params
        .id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ProblemId::new)
    else {
        return Err(GatewayError::BadRequest("Problem ID is required".to_owned()));
    };
    state
        .store
        .delete(&id)
        .await
        .map_err(|e| GatewayError::from_store("Failed to delete problem", e))?;
    tracing::info!(id = %id, "problem deleted");

    Ok(Json(json!({"success": true, "message": "Problem deleted successfully"})))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(difficulty: Option<&str>, sort: Option<&str>) -> ListParams {
        ListParams {
            difficulty: difficulty.map(str::to_owned),
            sort: sort.map(str::to_owned),
            ..ListParams::default()
        }
    }

    #[test]
    fn all_difficulty_means_no_filter() {
        let (query, by_serial) = match params(Some("All"), None).into_query() {
            Ok(q) => q,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert!(query.is_empty());
        assert!(!by_serial);
    }

    #[test]
    fn difficulty_and_sort_are_parsed() {
        let (query, by_serial) = match params(Some("hard"), Some("serial")).into_query() {
            Ok(q) => q,
            Err(e) => panic!("unexpected error: {e}"),
        };
        assert_eq!(query.difficulty, Some(Difficulty::Hard));
        assert!(by_serial);
    }

    #[test]
    fn unknown_difficulty_or_sort_is_bad_request() {
        assert!(matches!(
            params(Some("Impossible"), None).into_query(),
            Err(GatewayError::BadRequest(_))
        ));
        assert!(matches!(
            params(None, Some("title")).into_query(),
            Err(GatewayError::BadRequest(_))
        ));
    }
}
