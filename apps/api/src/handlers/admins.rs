use super::*;

use muster_application::CreateAdminInput;
use muster_domain::sorted_for_display;

pub async fn create_admin_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateAdminRequest>,
) -> ApiResult<(StatusCode, Json<CreatedAdminResponse>)> {
    let role_ids = parse_role_ids(&payload.role_ids)?;
    let permissions = parse_permissions(&payload.permissions)?;

    let created = state
        .admin_lifecycle_service
        .create_admin(
            &user,
            CreateAdminInput {
                display_name: payload.display_name,
                email: payload.email,
                role_ids,
                permissions,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedAdminResponse::from(created))))
}

pub async fn list_admins_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<AdminSummaryResponse>>> {
    let admins = state
        .admin_lifecycle_service
        .list_admins(&user)
        .await?
        .into_iter()
        .map(AdminSummaryResponse::from)
        .collect();

    Ok(Json(admins))
}

pub async fn get_admin_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<AdminResponse>> {
    let user_id = parse_admin_id(user_id.as_str())?;
    let admin = state.admin_lifecycle_service.get_admin(&user, user_id).await?;

    Ok(Json(AdminResponse::from(admin)))
}

pub async fn admin_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<EffectivePermissionsResponse>> {
    let user_id = parse_admin_id(user_id.as_str())?;
    state
        .authorization_service
        .require_permission(user.user_id(), Permission::ManageAdmins)
        .await?;

    let permissions = state.authorization_service.resolve(user_id).await?;

    Ok(Json(EffectivePermissionsResponse {
        user_id: user_id.to_string(),
        permissions: sorted_for_display(permissions)
            .into_iter()
            .map(|permission| permission.as_str().to_owned())
            .collect(),
    }))
}

pub async fn update_admin_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateAdminRolesRequest>,
) -> ApiResult<Json<AdminResponse>> {
    let user_id = parse_admin_id(user_id.as_str())?;
    let role_ids = parse_role_ids(&payload.role_ids)?;

    let admin = state
        .admin_lifecycle_service
        .update_admin_roles(&user, user_id, role_ids)
        .await?;

    Ok(Json(AdminResponse::from(admin)))
}

pub async fn deactivate_admin_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(user_id): Path<String>,
) -> ApiResult<StatusCode> {
    let user_id = parse_admin_id(user_id.as_str())?;
    state
        .admin_lifecycle_service
        .deactivate_admin(&user, user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
