//! Accounts: registration, login and administration.

use std::sync::Arc;

use crate::auth::{AuthUser, PasswordHasher, TokenAuthority};
use crate::domain::{NewUser, Notification, Role, User, UserId};
use crate::error::TaskboardError;
use crate::persistence::Store;
use crate::ws::Hub;

use super::{non_blank, notify};

const MAX_NAME_LEN: usize = 100;
const MIN_PASSWORD_LEN: usize = 6;

/// Credentials and profile for a new account.
#[derive(Debug, Clone)]
pub struct UserInput {
    /// Login name.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Plain-text password; hashed before storage.
    pub password: String,
}

/// Partial profile update. `None` or blank fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    /// New login name.
    pub username: Option<String>,
    /// New contact address.
    pub email: Option<String>,
    /// New plain-text password.
    pub password: Option<String>,
    /// New role.
    pub role: Option<Role>,
}

/// Account operations.
#[derive(Debug, Clone)]
pub struct UserService {
    store: Arc<Store>,
    hub: Hub,
    hasher: PasswordHasher,
    tokens: TokenAuthority,
}

impl UserService {
    /// Creates a new `UserService`.
    #[must_use]
    pub fn new(store: Arc<Store>, hub: Hub, hasher: PasswordHasher, tokens: TokenAuthority) -> Self {
        Self {
            store,
            hub,
            hasher,
            tokens,
        }
    }

    /// Self-service sign-up with role `user`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskboardError::InvalidRequest`] on validation failure or
    /// [`TaskboardError::Conflict`] if the username or email is taken.
    pub async fn register(&self, input: UserInput) -> Result<User, TaskboardError> {
        let user = self.insert(input, Role::User).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Checks credentials and issues a session token.
    ///
    /// # Errors
    ///
    /// Returns [`TaskboardError::InvalidCredentials`] for an unknown user or
    /// a wrong password alike.
    pub async fn login(&self, username: &str, password: &str) -> Result<(User, String), TaskboardError> {
        let Some(user) = self.store.user_by_username(username.trim()).await? else {
            tracing::debug!(username, "login for unknown user");
            return Err(TaskboardError::InvalidCredentials);
        };
        if !self.hasher.verify(password, &user.password_hash).await? {
            tracing::debug!(user_id = %user.id, "login with wrong password");
            return Err(TaskboardError::InvalidCredentials);
        }
        let token = self.tokens.issue(&user)?;
        Ok((user, token))
    }

    /// Looks a user up by id.
    ///
    /// # Errors
    ///
    /// Returns [`TaskboardError::UserNotFound`] if absent.
    pub async fn get_user(&self, id: UserId) -> Result<User, TaskboardError> {
        self.store
            .user_by_id(id)
            .await?
            .ok_or(TaskboardError::UserNotFound(id.get()))
    }

    /// All users, ascending by id.
    ///
    /// # Errors
    ///
    /// Returns a persistence error on database failure.
    pub async fn list_users(&self) -> Result<Vec<User>, TaskboardError> {
        self.store.list_users().await
    }

    /// Administrator creates an account with an explicit role.
    ///
    /// # Errors
    ///
    /// Same as [`Self::register`].
    pub async fn create_user(&self, input: UserInput, role: Role) -> Result<User, TaskboardError> {
        let user = self.insert(input, role).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "user created");
        notify(&self.hub, Notification::UserCreated { user_id: user.id }).await;
        Ok(user)
    }

    /// Administrator changes another user's role.
    ///
    /// # Errors
    ///
    /// [`TaskboardError::Forbidden`] when targeting oneself,
    /// [`TaskboardError::UserNotFound`] for an unknown user and
    /// [`TaskboardError::InvalidRequest`] if the role is unchanged.
    pub async fn change_role(
        &self,
        actor: &AuthUser,
        user_id: UserId,
        role: Role,
    ) -> Result<User, TaskboardError> {
        ensure_admin_actor(actor)?;
        if actor.user_id == user_id {
            return Err(TaskboardError::Forbidden(
                "cannot change your own role".to_string(),
            ));
        }
        let mut user = self.get_user(user_id).await?;
        if user.role == role {
            return Err(TaskboardError::InvalidRequest(
                "user already has this role".to_string(),
            ));
        }
        user.role = role;
        let user = self.store.update_user(&user).await?;
        tracing::info!(user_id = %user.id, role = %user.role, "role changed");
        notify(&self.hub, Notification::UserUpdated { user_id: user.id }).await;
        Ok(user)
    }

    /// Administrator edits a profile. Only provided fields change.
    ///
    /// # Errors
    ///
    /// [`TaskboardError::Forbidden`] when an admin changes their own role,
    /// plus the validation, not-found and conflict errors of
    /// [`Self::register`].
    pub async fn update_user(
        &self,
        actor: &AuthUser,
        id: UserId,
        changes: UserChanges,
    ) -> Result<User, TaskboardError> {
        ensure_admin_actor(actor)?;
        let mut user = self.get_user(id).await?;

        if let Some(username) = non_blank(changes.username) {
            validate_username(&username)?;
            user.username = username;
        }
        if let Some(email) = non_blank(changes.email) {
            validate_email(&email)?;
            user.email = email;
        }
        if let Some(password) = changes.password.filter(|p| !p.is_empty()) {
            validate_password(&password)?;
            user.password_hash = self.hasher.hash(&password).await?;
        }
        if let Some(role) = changes.role
            && role != user.role
        {
            if actor.user_id == id {
                return Err(TaskboardError::Forbidden(
                    "cannot change your own role".to_string(),
                ));
            }
            user.role = role;
        }

        let user = self.store.update_user(&user).await?;
        tracing::info!(user_id = %user.id, "user updated");
        notify(&self.hub, Notification::UserUpdated { user_id: user.id }).await;
        Ok(user)
    }

    /// Administrator removes an account and everything it owns.
    ///
    /// # Errors
    ///
    /// [`TaskboardError::Forbidden`] when deleting oneself,
    /// [`TaskboardError::UserNotFound`] for an unknown user.
    pub async fn delete_user(&self, actor: &AuthUser, id: UserId) -> Result<(), TaskboardError> {
        ensure_admin_actor(actor)?;
        if actor.user_id == id {
            return Err(TaskboardError::Forbidden(
                "cannot delete your own account".to_string(),
            ));
        }
        if !self.store.delete_user(id).await? {
            return Err(TaskboardError::UserNotFound(id.get()));
        }
        tracing::info!(user_id = %id, "user deleted");
        notify(&self.hub, Notification::UserDeleted { user_id: id }).await;
        Ok(())
    }

    /// Creates the bootstrap administrator unless `username` already exists.
    ///
    /// The email is not validated so deployments may use a bare handle.
    /// Returns the created user, or `None` if one was already present.
    ///
    /// # Errors
    ///
    /// Returns a persistence or hashing error.
    pub async fn ensure_admin(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<Option<User>, TaskboardError> {
        if self.store.user_by_username(username).await?.is_some() {
            tracing::debug!(username, "bootstrap admin already present");
            return Ok(None);
        }
        let password_hash = self.hasher.hash(password).await?;
        let admin = self
            .store
            .insert_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                role: Role::Admin,
            })
            .await?;
        tracing::info!(user_id = %admin.id, username, "bootstrap admin created");
        Ok(Some(admin))
    }

    async fn insert(&self, input: UserInput, role: Role) -> Result<User, TaskboardError> {
        let username = input.username.trim().to_string();
        let email = input.email.trim().to_string();
        validate_username(&username)?;
        validate_email(&email)?;
        validate_password(&input.password)?;

        // Checked up front for a stable message; the store re-checks.
        if self.store.user_by_username(&username).await?.is_some() {
            return Err(TaskboardError::Conflict("username already exists".to_string()));
        }
        if self.store.user_by_email(&email).await?.is_some() {
            return Err(TaskboardError::Conflict("email already exists".to_string()));
        }

        let password_hash = self.hasher.hash(&input.password).await?;
        self.store
            .insert_user(NewUser {
                username,
                email,
                password_hash,
                role,
            })
            .await
    }
}

fn ensure_admin_actor(actor: &AuthUser) -> Result<(), TaskboardError> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(TaskboardError::Forbidden("admin rights required".to_string()))
    }
}

fn validate_username(username: &str) -> Result<(), TaskboardError> {
    if username.is_empty() {
        return Err(TaskboardError::InvalidRequest("username is required".to_string()));
    }
    if username.chars().count() > MAX_NAME_LEN {
        return Err(TaskboardError::InvalidRequest("username is too long".to_string()));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), TaskboardError> {
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| {
            !local.is_empty() && !domain.is_empty() && !domain.contains('@')
        })
        && !email.contains(char::is_whitespace);
    if !well_formed {
        return Err(TaskboardError::InvalidRequest("invalid email address".to_string()));
    }
    if email.chars().count() > MAX_NAME_LEN {
        return Err(TaskboardError::InvalidRequest("email is too long".to_string()));
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), TaskboardError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(TaskboardError::InvalidRequest(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::service::test_support::{fixture, next_json};

    fn service(store: Arc<Store>, hub: Hub) -> UserService {
        UserService::new(
            store,
            hub,
            PasswordHasher::new(4),
            TokenAuthority::new(b"test-secret", Duration::hours(1)),
        )
    }

    fn input(name: &str) -> UserInput {
        UserInput {
            username: name.to_string(),
            email: format!("{name}@example.com"),
            password: "secret1".to_string(),
        }
    }

    fn actor(user: &User) -> AuthUser {
        AuthUser {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }

    #[tokio::test]
    async fn register_then_login() {
        let (store, hub, _conn) = fixture().await;
        let users = service(store, hub);

        let Ok(user) = users.register(input("alice")).await else {
            panic!("register failed");
        };
        assert_eq!(user.role, Role::User);
        assert_ne!(user.password_hash, "secret1");

        let Ok((logged_in, token)) = users.login("alice", "secret1").await else {
            panic!("login failed");
        };
        assert_eq!(logged_in.id, user.id);
        assert!(!token.is_empty());
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let (store, hub, _conn) = fixture().await;
        let users = service(store, hub);
        let _ = users.register(input("alice")).await;

        let wrong_password = users.login("alice", "nope-nope").await;
        let unknown_user = users.login("mallory", "secret1").await;
        assert!(matches!(wrong_password, Err(TaskboardError::InvalidCredentials)));
        assert!(matches!(unknown_user, Err(TaskboardError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn register_validates_input() {
        let (store, hub, _conn) = fixture().await;
        let users = service(store, hub);

        let mut short = input("bob");
        short.password = "12345".to_string();
        assert!(matches!(
            users.register(short).await,
            Err(TaskboardError::InvalidRequest(_))
        ));

        let mut bad_email = input("bob");
        bad_email.email = "bob.example.com".to_string();
        assert!(matches!(
            users.register(bad_email).await,
            Err(TaskboardError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn duplicates_conflict_with_specific_message() {
        let (store, hub, _conn) = fixture().await;
        let users = service(store, hub);
        let _ = users.register(input("alice")).await;

        let Err(err) = users.register(input("alice")).await else {
            panic!("duplicate username accepted");
        };
        assert_eq!(err.to_string(), "username already exists");

        let mut same_email = input("alice2");
        same_email.email = "alice@example.com".to_string();
        let Err(err) = users.register(same_email).await else {
            panic!("duplicate email accepted");
        };
        assert_eq!(err.to_string(), "email already exists");
    }

    #[tokio::test]
    async fn change_role_rules() {
        let (store, hub, mut conn) = fixture().await;
        let users = service(store, hub);
        let Ok(Some(admin)) = users.ensure_admin("admin", "admin", "admin123").await else {
            panic!("bootstrap failed");
        };
        let Ok(bob) = users.register(input("bob")).await else {
            panic!("register failed");
        };
        let admin = actor(&admin);

        assert!(matches!(
            users.change_role(&admin, admin.user_id, Role::User).await,
            Err(TaskboardError::Forbidden(_))
        ));
        assert!(matches!(
            users.change_role(&admin, bob.id, Role::User).await,
            Err(TaskboardError::InvalidRequest(_))
        ));
        assert!(matches!(
            users.change_role(&admin, UserId::new(999), Role::Admin).await,
            Err(TaskboardError::UserNotFound(999))
        ));

        let Ok(promoted) = users.change_role(&admin, bob.id, Role::Admin).await else {
            panic!("promotion failed");
        };
        assert_eq!(promoted.role, Role::Admin);
        let json = next_json(&mut conn).await;
        assert_eq!(json["message"], "user updated");
        assert_eq!(json["user_id"], bob.id.get());
    }

    #[tokio::test]
    async fn non_admin_cannot_administer() {
        let (store, hub, _conn) = fixture().await;
        let users = service(store, hub);
        let Ok(alice) = users.register(input("alice")).await else {
            panic!("register failed");
        };
        let Ok(bob) = users.register(input("bob")).await else {
            panic!("register failed");
        };
        assert!(matches!(
            users.delete_user(&actor(&alice), bob.id).await,
            Err(TaskboardError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn admin_cannot_delete_self_but_can_delete_others() {
        let (store, hub, mut conn) = fixture().await;
        let users = service(store, hub);
        let Ok(Some(admin)) = users.ensure_admin("root", "root", "rootpass").await else {
            panic!("bootstrap failed");
        };
        let Ok(bob) = users.register(input("bob")).await else {
            panic!("register failed");
        };
        let admin = actor(&admin);

        assert!(matches!(
            users.delete_user(&admin, admin.user_id).await,
            Err(TaskboardError::Forbidden(_))
        ));
        assert!(users.delete_user(&admin, bob.id).await.is_ok());
        assert_eq!(next_json(&mut conn).await["message"], "user deleted");
        assert!(matches!(
            users.delete_user(&admin, bob.id).await,
            Err(TaskboardError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_user_changes_only_given_fields() {
        let (store, hub, _conn) = fixture().await;
        let users = service(store, hub);
        let Ok(Some(admin)) = users.ensure_admin("admin", "admin", "admin123").await else {
            panic!("bootstrap failed");
        };
        let Ok(bob) = users.register(input("bob")).await else {
            panic!("register failed");
        };

        let changes = UserChanges {
            email: Some("robert@example.com".to_string()),
            username: Some("   ".to_string()),
            ..UserChanges::default()
        };
        let Ok(updated) = users.update_user(&actor(&admin), bob.id, changes).await else {
            panic!("update failed");
        };
        assert_eq!(updated.username, "bob");
        assert_eq!(updated.email, "robert@example.com");
        assert_eq!(updated.password_hash, bob.password_hash);
    }

    #[tokio::test]
    async fn ensure_admin_is_idempotent() {
        let (store, hub, _conn) = fixture().await;
        let users = service(store, hub);
        let Ok(first) = users.ensure_admin("admin", "admin", "admin123").await else {
            panic!("bootstrap failed");
        };
        assert!(first.is_some_and(|u| u.role == Role::Admin));
        let Ok(second) = users.ensure_admin("admin", "admin", "admin123").await else {
            panic!("bootstrap failed");
        };
        assert!(second.is_none());
    }
}
