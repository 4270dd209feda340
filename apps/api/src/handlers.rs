//! HTTP handlers for the administrative API.

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;

use muster_core::{AdminUserId, AppError, UserIdentity};
use muster_domain::{Permission, RoleId};

use crate::dto::{
    AdminResponse, AdminSummaryResponse, AuditLogEntryResponse, AuditLogQueryParams,
    CheckPermissionRequest, CheckPermissionResponse, CreateAdminRequest, CreateRoleRequest,
    CreatedAdminResponse, EffectivePermissionsResponse, MeResponse, PermissionResponse,
    RoleResponse, UpdateAdminRolesRequest, UpdatePermissionRequest, UpdateRoleRequest,
};
use crate::error::ApiResult;
use crate::state::AppState;

pub mod admins;
pub mod audit;
pub mod authorization;
pub mod health;
pub mod permissions;
pub mod roles;

fn parse_admin_id(value: &str) -> Result<AdminUserId, AppError> {
    uuid::Uuid::parse_str(value)
        .map(AdminUserId::from_uuid)
        .map_err(|error| AppError::Validation(format!("invalid user id '{value}': {error}")))
}

fn parse_role_id(value: &str) -> Result<RoleId, AppError> {
    uuid::Uuid::parse_str(value)
        .map(RoleId::from_uuid)
        .map_err(|error| AppError::Validation(format!("invalid role id '{value}': {error}")))
}

fn parse_role_ids(values: &[String]) -> Result<Vec<RoleId>, AppError> {
    values
        .iter()
        .map(|value| parse_role_id(value.as_str()))
        .collect()
}

fn parse_permissions(values: &[String]) -> Result<Vec<Permission>, AppError> {
    values
        .iter()
        .map(|value| Permission::from_transport(value.as_str()))
        .collect()
}
