//! Account DTOs: sign-up, login, and user administration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Role, User, UserId};
use crate::error::TaskboardError;
use crate::service::{UserChanges, UserInput};

/// Request body for `POST /register`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    /// Unique login name.
    #[serde(default)]
    pub username: String,
    /// Unique email address.
    #[serde(default)]
    pub email: String,
    /// Password, at least 6 characters.
    #[serde(default)]
    pub password: String,
}

impl From<RegisterRequest> for UserInput {
    fn from(req: RegisterRequest) -> Self {
        Self {
            username: req.username,
            email: req.email,
            password: req.password,
        }
    }
}

/// Request body for `POST /login`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Login name.
    #[serde(default)]
    pub username: String,
    /// Password.
    #[serde(default)]
    pub password: String,
}

/// Response body for a successful login.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    /// Always `"Login successful"`.
    pub message: String,
    /// Bearer token for subsequent requests.
    pub token: String,
    /// The authenticated account.
    pub user: UserResponse,
}

/// Public view of an account. Never includes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    /// User id.
    pub id: UserId,
    /// Login name.
    pub username: String,
    /// Email address.
    pub email: String,
    /// Access level.
    pub role: Role,
    /// Display color, e.g. `hsl(4, 70%, 80%)`.
    pub color: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            color: user.color.clone(),
            created_at: user.created_at,
        }
    }
}

/// Envelope for a single user.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserEnvelope {
    /// The user.
    pub user: UserResponse,
}

/// Envelope for user lists.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserListResponse {
    /// Users ascending by id.
    pub users: Vec<UserResponse>,
}

/// Response body for `GET /roles`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RoleResponse {
    /// Role carried by the caller's token.
    pub role: Role,
}

/// Request body for `PUT /admin/role`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangeRoleRequest {
    /// Target user.
    pub user_id: UserId,
    /// `user` or `admin`.
    pub new_role: String,
}

/// Request body for `POST /admin/users`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    /// Unique login name.
    #[serde(default)]
    pub username: String,
    /// Unique email address.
    #[serde(default)]
    pub email: String,
    /// Password, at least 6 characters.
    #[serde(default)]
    pub password: String,
    /// `user` or `admin`.
    #[serde(default)]
    pub role: String,
}

impl CreateUserRequest {
    /// Splits the request into service input and a parsed role.
    ///
    /// # Errors
    ///
    /// Returns [`TaskboardError::InvalidRole`] for an unknown role.
    pub fn into_parts(self) -> Result<(UserInput, Role), TaskboardError> {
        let role = self.role.parse::<Role>()?;
        Ok((
            UserInput {
                username: self.username,
                email: self.email,
                password: self.password,
            },
            role,
        ))
    }
}

/// Request body for `PUT /admin/users/{id}`. Omitted or empty fields are
/// left unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUserRequest {
    /// New login name.
    pub username: Option<String>,
    /// New email address.
    pub email: Option<String>,
    /// New password.
    pub password: Option<String>,
    /// New role, `user` or `admin`.
    pub role: Option<String>,
}

impl TryFrom<UpdateUserRequest> for UserChanges {
    type Error = TaskboardError;

    fn try_from(req: UpdateUserRequest) -> Result<Self, Self::Error> {
        let role = req
            .role
            .filter(|r| !r.is_empty())
            .map(|r| r.parse::<Role>())
            .transpose()?;
        Ok(Self {
            username: req.username,
            email: req.email,
            password: req.password,
            role,
        })
    }
}
