use std::str::FromStr;

use muster_core::AppError;
use serde::{Deserialize, Serialize};

/// Feature area a permission belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionCategory {
    /// Cadet profiles and ratings.
    Cadets,
    /// Score sheets and standings.
    Scores,
    /// Achievement records.
    Achievements,
    /// Event planning and publication.
    Events,
    /// News and static pages.
    Content,
    /// Task assignment and tracking.
    Tasks,
    /// Forum moderation.
    Forum,
    /// Administrative console and catalog management.
    System,
}

impl PermissionCategory {
    /// Returns a stable storage value for this category.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cadets => "cadets",
            Self::Scores => "scores",
            Self::Achievements => "achievements",
            Self::Events => "events",
            Self::Content => "content",
            Self::Tasks => "tasks",
            Self::Forum => "forum",
            Self::System => "system",
        }
    }
}

impl FromStr for PermissionCategory {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "cadets" => Ok(Self::Cadets),
            "scores" => Ok(Self::Scores),
            "achievements" => Ok(Self::Achievements),
            "events" => Ok(Self::Events),
            "content" => Ok(Self::Content),
            "tasks" => Ok(Self::Tasks),
            "forum" => Ok(Self::Forum),
            "system" => Ok(Self::System),
            _ => Err(AppError::Validation(format!(
                "unknown permission category '{value}'"
            ))),
        }
    }
}

/// Capabilities enforced by application policy checks.
///
/// The universe of permission names is closed: rows in the catalog table are
/// seeded from this enumeration and a stored name that no longer parses is
/// rejected at startup rather than silently granting nothing at check time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Allows viewing cadet profiles.
    ViewCadets,
    /// Allows creating and editing cadet profiles.
    ManageCadets,
    /// Allows rating cadet profiles.
    RateCadets,
    /// Allows editing score sheets.
    ManageScores,
    /// Allows awarding and revoking achievements.
    ManageAchievements,
    /// Allows creating and publishing events.
    ManageEvents,
    /// Allows publishing news articles.
    ManageNews,
    /// Allows editing static content pages.
    ManagePages,
    /// Allows creating and assigning tasks.
    ManageTasks,
    /// Allows moderating forum threads and posts.
    ModerateForum,
    /// Allows viewing and managing administrative accounts.
    ManageAdmins,
    /// Allows editing roles and their permission sets.
    ManageRoles,
    /// Allows reading the audit log.
    ViewAuditLog,
}

impl Permission {
    /// Returns a stable storage value for this permission.
    ///
    /// The name, never the row id, is the identifier used in checks.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ViewCadets => "view_cadets",
            Self::ManageCadets => "manage_cadets",
            Self::RateCadets => "rate_cadets",
            Self::ManageScores => "manage_scores",
            Self::ManageAchievements => "manage_achievements",
            Self::ManageEvents => "manage_events",
            Self::ManageNews => "manage_news",
            Self::ManagePages => "manage_pages",
            Self::ManageTasks => "manage_tasks",
            Self::ModerateForum => "moderate_forum",
            Self::ManageAdmins => "manage_admins",
            Self::ManageRoles => "manage_roles",
            Self::ViewAuditLog => "view_audit_log",
        }
    }

    /// Returns the category this permission is catalogued under.
    #[must_use]
    pub fn category(&self) -> PermissionCategory {
        match self {
            Self::ViewCadets | Self::ManageCadets | Self::RateCadets => PermissionCategory::Cadets,
            Self::ManageScores => PermissionCategory::Scores,
            Self::ManageAchievements => PermissionCategory::Achievements,
            Self::ManageEvents => PermissionCategory::Events,
            Self::ManageNews | Self::ManagePages => PermissionCategory::Content,
            Self::ManageTasks => PermissionCategory::Tasks,
            Self::ModerateForum => PermissionCategory::Forum,
            Self::ManageAdmins | Self::ManageRoles | Self::ViewAuditLog => {
                PermissionCategory::System
            }
        }
    }

    /// Returns the default human-readable name seeded into the catalog.
    #[must_use]
    pub fn default_display_name(&self) -> &'static str {
        match self {
            Self::ViewCadets => "View cadets",
            Self::ManageCadets => "Manage cadets",
            Self::RateCadets => "Rate cadets",
            Self::ManageScores => "Manage scores",
            Self::ManageAchievements => "Manage achievements",
            Self::ManageEvents => "Manage events",
            Self::ManageNews => "Manage news",
            Self::ManagePages => "Manage pages",
            Self::ManageTasks => "Manage tasks",
            Self::ModerateForum => "Moderate forum",
            Self::ManageAdmins => "Manage administrators",
            Self::ManageRoles => "Manage roles",
            Self::ViewAuditLog => "View audit log",
        }
    }

    /// Returns the default description seeded into the catalog.
    #[must_use]
    pub fn default_description(&self) -> &'static str {
        match self {
            Self::ViewCadets => "Read access to cadet profiles and rating history.",
            Self::ManageCadets => "Create, edit and archive cadet profiles.",
            Self::RateCadets => "Submit and revise cadet profile ratings.",
            Self::ManageScores => "Edit score sheets and recalculate standings.",
            Self::ManageAchievements => "Award and revoke achievement records.",
            Self::ManageEvents => "Create, edit and publish events.",
            Self::ManageNews => "Write and publish news articles.",
            Self::ManagePages => "Edit static content pages.",
            Self::ManageTasks => "Create tasks and assign them to members.",
            Self::ModerateForum => "Moderate forum threads, posts and reports.",
            Self::ManageAdmins => "View administrative accounts and their access.",
            Self::ManageRoles => "Edit roles and their permission sets.",
            Self::ViewAuditLog => "Read the administrative audit log.",
        }
    }

    /// Returns all known permissions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[Permission] = &[
            Permission::ViewCadets,
            Permission::ManageCadets,
            Permission::RateCadets,
            Permission::ManageScores,
            Permission::ManageAchievements,
            Permission::ManageEvents,
            Permission::ManageNews,
            Permission::ManagePages,
            Permission::ManageTasks,
            Permission::ModerateForum,
            Permission::ManageAdmins,
            Permission::ManageRoles,
            Permission::ViewAuditLog,
        ];

        ALL
    }

    /// Parses a transport value into a permission.
    pub fn from_transport(value: &str) -> Result<Self, AppError> {
        Self::from_str(value)
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "view_cadets" => Ok(Self::ViewCadets),
            "manage_cadets" => Ok(Self::ManageCadets),
            "rate_cadets" => Ok(Self::RateCadets),
            "manage_scores" => Ok(Self::ManageScores),
            "manage_achievements" => Ok(Self::ManageAchievements),
            "manage_events" => Ok(Self::ManageEvents),
            "manage_news" => Ok(Self::ManageNews),
            "manage_pages" => Ok(Self::ManagePages),
            "manage_tasks" => Ok(Self::ManageTasks),
            "moderate_forum" => Ok(Self::ModerateForum),
            "manage_admins" => Ok(Self::ManageAdmins),
            "manage_roles" => Ok(Self::ManageRoles),
            "view_audit_log" => Ok(Self::ViewAuditLog),
            _ => Err(AppError::Validation(format!(
                "unknown permission value '{value}'"
            ))),
        }
    }
}

/// Orders permissions for deterministic display: category, then display name.
///
/// Resolution order itself is not semantically meaningful; callers needing a
/// stable listing for rendering go through this helper.
#[must_use]
pub fn sorted_for_display(permissions: impl IntoIterator<Item = Permission>) -> Vec<Permission> {
    let mut values: Vec<Permission> = permissions.into_iter().collect();
    values.sort_by_key(|permission| (permission.category(), permission.default_display_name()));
    values.dedup();
    values
}

/// Stable audit actions emitted by application use-cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// Emitted when an administrative account is created.
    AdminCreated,
    /// Emitted when an account's role set is replaced.
    AdminRolesUpdated,
    /// Emitted when an administrative account is deactivated.
    AdminDeactivated,
    /// Emitted when a custom role is created.
    RoleCreated,
    /// Emitted when a role's fields or permission set change.
    RoleUpdated,
    /// Emitted when a role is deleted.
    RoleDeleted,
    /// Emitted when a permission's display fields change.
    PermissionDisplayUpdated,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AdminCreated => "admin.created",
            Self::AdminRolesUpdated => "admin.roles_updated",
            Self::AdminDeactivated => "admin.deactivated",
            Self::RoleCreated => "role.created",
            Self::RoleUpdated => "role.updated",
            Self::RoleDeleted => "role.deleted",
            Self::PermissionDisplayUpdated => "permission.display_updated",
        }
    }
}
