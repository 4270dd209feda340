use super::*;

use muster_application::AuditLogQuery;

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(params): Query<AuditLogQueryParams>,
) -> ApiResult<Json<Vec<AuditLogEntryResponse>>> {
    let entries = state
        .admin_lifecycle_service
        .list_audit_log(
            &user,
            AuditLogQuery {
                limit: params.limit.min(500),
                offset: params.offset,
                action: params.action,
                subject: params.subject,
            },
        )
        .await?
        .into_iter()
        .map(AuditLogEntryResponse::from)
        .collect();

    Ok(Json(entries))
}
