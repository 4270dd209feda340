use super::*;

use muster_application::{CreateRoleInput, UpdateRoleInput};

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_catalog_service
        .list_roles(&user)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn create_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Json(payload): Json<CreateRoleRequest>,
) -> ApiResult<(StatusCode, Json<RoleResponse>)> {
    let permissions = parse_permissions(&payload.permissions)?;

    let role = state
        .role_catalog_service
        .create_role(
            &user,
            CreateRoleInput {
                name: payload.name,
                display_name: payload.display_name,
                description: payload.description,
                permissions,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(RoleResponse::from(role))))
}

pub async fn get_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<RoleResponse>> {
    let role_id = parse_role_id(role_id.as_str())?;
    let role = state.role_catalog_service.get_role(&user, role_id).await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn update_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> ApiResult<Json<RoleResponse>> {
    let role_id = parse_role_id(role_id.as_str())?;
    let permissions = parse_permissions(&payload.permissions)?;

    let role = state
        .role_catalog_service
        .update_role(
            &user,
            role_id,
            UpdateRoleInput {
                display_name: payload.display_name,
                description: payload.description,
                permissions,
            },
        )
        .await?;

    Ok(Json(RoleResponse::from(role)))
}

pub async fn delete_role_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
) -> ApiResult<StatusCode> {
    let role_id = parse_role_id(role_id.as_str())?;
    state.role_catalog_service.delete_role(&user, role_id).await?;

    Ok(StatusCode::NO_CONTENT)
}
