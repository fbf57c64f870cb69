/// User registration, password change and login lookup
///
/// # Example
///
/// ```
/// use taskdesk_shared::db::memory::MemoryStore;
/// use taskdesk_shared::db::unit_of_work::UnitOfWork;
/// use taskdesk_shared::models::user::RegisterUser;
/// use taskdesk_shared::services::user_service::UserService;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut uow = UnitOfWork::begin(&MemoryStore::new()).await?;
/// let mut users = UserService::new(&mut uow);
///
/// users
///     .register(RegisterUser {
///         username: "alice.b".to_string(),
///         email: "a@x.com".to_string(),
///         password: "secret1".to_string(),
///         confirm_password: "secret1".to_string(),
///     })
///     .await?;
///
/// let alice = users.authenticate("a@x.com", "secret1").await?;
/// assert_eq!(alice.username, "alice.b");
/// # Ok(())
/// # }
/// ```

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::password::{hash_password, verify_password};
use crate::db::store::{Filter, Store, StoreError};
use crate::db::unit_of_work::UnitOfWork;
use crate::error::{ServiceError, ServiceResult};
use crate::models::user::{ChangePassword, RegisterUser, User, UserField};

pub const DUPLICATE_USER: &str = "User with such email or username already exists.";
pub const USER_NOT_FOUND: &str = "User with specified id had not been found.";
pub const LOGIN_NOT_FOUND: &str = "User with specified login had not been found.";

/// User operations over one unit of work
pub struct UserService<'u, S: Store> {
    uow: &'u mut UnitOfWork<S>,
}

impl<'u, S: Store> UserService<'u, S> {
    pub fn new(uow: &'u mut UnitOfWork<S>) -> Self {
        Self { uow }
    }

    /// Registers a new user
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` when username, email or password is blank
    /// - `Conflict` when the username or email is taken, compared
    ///   case-insensitively; also raised if the unique index rejects the
    ///   insert at commit
    pub async fn register(&mut self, request: RegisterUser) -> ServiceResult<bool> {
        if request.username.trim().is_empty()
            || request.email.trim().is_empty()
            || request.password.trim().is_empty()
        {
            return Err(ServiceError::invalid_argument(
                "Username, email and password are required",
            ));
        }

        let taken = Filter::eq_ignore_case(UserField::Email, request.email.as_str())
            .or(Filter::eq_ignore_case(UserField::Username, request.username.as_str()));
        if self.uow.repository::<User>().exists(taken).await? {
            debug!(username = %request.username, "Registration rejected, user exists");
            return Err(ServiceError::Conflict(DUPLICATE_USER.to_string()));
        }

        let password_hash = hash_password(&request.password)?;
        let user = User::new(request.username, request.email, password_hash);
        let user_id = user.id;

        self.uow.repository::<User>().add(user);
        let committed = self.uow.commit().await.map_err(|e| match e {
            StoreError::Conflict(_) => ServiceError::Conflict(DUPLICATE_USER.to_string()),
            other => other.into(),
        })?;

        info!(user_id = %user_id, "User registered");
        Ok(committed)
    }

    /// Replaces the password of `user_id`
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` when the new password is blank
    /// - `NotFound` when no such user exists
    pub async fn change_password(
        &mut self,
        user_id: Uuid,
        request: ChangePassword,
    ) -> ServiceResult<bool> {
        if request.password.trim().is_empty() {
            return Err(ServiceError::invalid_argument("Password is required"));
        }

        let mut user = self
            .uow
            .repository::<User>()
            .get(Some(Filter::eq(UserField::Id, user_id)), &[])
            .await?
            .ok_or_else(|| ServiceError::not_found(USER_NOT_FOUND))?;

        user.password_hash = hash_password(&request.password)?;
        user.updated_at = Utc::now();

        self.uow.repository::<User>().update(user);
        let committed = self.uow.commit().await?;

        info!(user_id = %user_id, "Password changed");
        Ok(committed)
    }

    /// Looks a user up by exact username or email
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` when `login` is blank
    /// - `NotFound` when neither a username nor an email equals `login`
    pub async fn find_user(&mut self, login: &str) -> ServiceResult<User> {
        if login.trim().is_empty() {
            return Err(ServiceError::invalid_argument("Login is required"));
        }

        let filter = Filter::eq(UserField::Username, login).or(Filter::eq(UserField::Email, login));
        self.uow
            .repository::<User>()
            .get(Some(filter), &[])
            .await?
            .ok_or_else(|| ServiceError::not_found(LOGIN_NOT_FOUND))
    }

    /// Resolves `login` and verifies `password` against the stored hash
    ///
    /// # Errors
    ///
    /// Everything [`find_user`](Self::find_user) returns, plus `Unauthorized`
    /// when the password does not match
    pub async fn authenticate(&mut self, login: &str, password: &str) -> ServiceResult<User> {
        let user = self.find_user(login).await?;

        if !verify_password(password, &user.password_hash)? {
            info!("Failed login attempt to {} account", login);
            return Err(ServiceError::Unauthorized(format!(
                "Failed login attempt to {} account",
                login
            )));
        }

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::store::EntityKind;

    fn request(username: &str, email: &str) -> RegisterUser {
        RegisterUser {
            username: username.to_string(),
            email: email.to_string(),
            password: "secret1".to_string(),
            confirm_password: "secret1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_blank_fields() {
        let mut uow = UnitOfWork::begin(&MemoryStore::new()).await.unwrap();
        let result = UserService::new(&mut uow).register(request(" ", "a@x.com")).await;
        assert!(matches!(result, Err(ServiceError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() {
        let store = MemoryStore::new();
        let mut uow = UnitOfWork::begin(&store).await.unwrap();
        let mut service = UserService::new(&mut uow);

        assert!(service.register(request("alice.b", "a@x.com")).await.unwrap());

        let user = service.find_user("alice.b").await.unwrap();
        assert_ne!(user.password_hash, "secret1");
        assert!(verify_password("secret1", &user.password_hash).unwrap());
        assert_eq!(store.len(EntityKind::User), 1);
    }

    #[tokio::test]
    async fn test_find_user_is_exact() {
        let mut uow = UnitOfWork::begin(&MemoryStore::new()).await.unwrap();
        let mut service = UserService::new(&mut uow);
        service.register(request("alice.b", "a@x.com")).await.unwrap();

        assert!(service.find_user("a@x.com").await.is_ok());
        assert!(matches!(
            service.find_user("ALICE.B").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            service.find_user("").await,
            Err(ServiceError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let mut uow = UnitOfWork::begin(&MemoryStore::new()).await.unwrap();
        let mut service = UserService::new(&mut uow);
        service.register(request("alice.b", "a@x.com")).await.unwrap();

        let result = service.authenticate("alice.b", "secret2").await;
        assert!(matches!(result, Err(ServiceError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_change_password_unknown_user() {
        let mut uow = UnitOfWork::begin(&MemoryStore::new()).await.unwrap();
        let result = UserService::new(&mut uow)
            .change_password(
                Uuid::new_v4(),
                ChangePassword {
                    password: "secret2".to_string(),
                    confirm_password: "secret2".to_string(),
                },
            )
            .await;
        assert!(matches!(result, Err(ServiceError::NotFound(msg)) if msg == USER_NOT_FOUND));
    }
}
