use super::*;

use muster_domain::sorted_for_display;

pub async fn me_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<MeResponse>> {
    let permissions = state.authorization_service.resolve(user.user_id()).await?;
    let is_super_admin = state
        .authorization_service
        .is_super_admin(user.user_id())
        .await?;

    Ok(Json(MeResponse {
        user_id: user.user_id().to_string(),
        display_name: user.display_name().to_owned(),
        email: user.email().map(str::to_owned),
        permissions: sorted_for_display(permissions)
            .into_iter()
            .map(|permission| permission.as_str().to_owned())
            .collect(),
        is_super_admin,
    }))
}

/// Checks a permission by name for an account.
///
/// Callers may always check themselves; checking another account requires
/// the `manage_admins` capability.
pub async fn check_permission_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CheckPermissionRequest>,
) -> ApiResult<Json<CheckPermissionResponse>> {
    let target = parse_admin_id(payload.user_id.as_str())?;
    let permission = Permission::from_transport(payload.permission.as_str())?;

    if target != user.user_id() {
        state
            .authorization_service
            .require_permission(user.user_id(), Permission::ManageAdmins)
            .await?;
    }

    let granted = state
        .authorization_service
        .check_permission(target, permission)
        .await?;

    Ok(Json(CheckPermissionResponse {
        user_id: target.to_string(),
        permission: permission.as_str().to_owned(),
        granted,
    }))
}
