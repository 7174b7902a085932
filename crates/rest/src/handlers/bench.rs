//! Bench history of one employee.
//!
//! `GET [prefix]/employees/{id}/bench-histories`

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Response},
};
use bench_domain::Entity;
use bench_domain::records::{BenchHistory, Employee};
use bench_persistence::core::{EntityStore, SearchIndex};
use tracing::debug;

use crate::error::{RestError, RestResult};
use crate::extractors::IdPath;
use crate::state::AppState;

/// Handler listing every bench history entry of an employee, oldest id first.
///
/// # Response
///
/// - `200 OK` - body is a JSON array, possibly empty
/// - `404 Not Found` - the employee does not exist
pub async fn employee_histories_handler<S, I>(
    State(state): State<AppState<S, I>>,
    IdPath(id): IdPath,
) -> RestResult<Response>
where
    S: EntityStore,
    I: SearchIndex + ?Sized,
{
    debug!(employee_id = id, "REST request to get bench histories of employee");

    if state.service::<Employee>().find_one(id).await?.is_none() {
        return Err(RestError::NotFound {
            entity_type: Employee::ENTITY_TYPE.to_string(),
            id,
        });
    }

    let histories = state
        .service::<BenchHistory>()
        .find_by_reference("employeeId", id)
        .await?;
    Ok(Json(histories).into_response())
}
