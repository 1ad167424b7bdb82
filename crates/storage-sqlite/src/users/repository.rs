use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::r2d2::{self, Pool};
use diesel::SqliteConnection;
use std::sync::Arc;
use uuid::Uuid;

use storefront_core::errors::{Error, Result};
use storefront_core::users::{NewUser, User, UserCredentials, UserRepositoryTrait};

use super::model::UserDB;
use crate::db::{get_connection, WriteHandle};
use crate::errors::StorageError;
use crate::schema::users;

pub struct UserRepository {
    pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
    writer: WriteHandle,
}

impl UserRepository {
    pub fn new(
        pool: Arc<Pool<r2d2::ConnectionManager<SqliteConnection>>>,
        writer: WriteHandle,
    ) -> Self {
        UserRepository { pool, writer }
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        let mut conn = get_connection(&self.pool)?;
        let row = users::table
            .find(user_id)
            .first::<UserDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(User::from))
    }

    fn find_credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        let mut conn = get_connection(&self.pool)?;
        let row = users::table
            .filter(users::email.eq(email.to_lowercase()))
            .first::<UserDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(row.map(UserCredentials::from))
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<User> {
                let row = UserDB {
                    id: Uuid::new_v4().to_string(),
                    email: new_user.email.to_lowercase(),
                    display_name: new_user.display_name,
                    password_hash: new_user.password_hash,
                    is_admin: new_user.is_admin,
                    created_at: Utc::now().to_rfc3339(),
                };
                let created = diesel::insert_into(users::table)
                    .values(&row)
                    .returning(UserDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                Ok(User::from(created))
            })
            .await
    }

    async fn update_display_name(&self, user_id: String, display_name: String) -> Result<User> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<User> {
                let updated = diesel::update(users::table.find(&user_id))
                    .set(users::display_name.eq(display_name))
                    .returning(UserDB::as_returning())
                    .get_result(conn)
                    .optional()
                    .map_err(StorageError::from)?;
                updated
                    .map(User::from)
                    .ok_or_else(|| Error::not_found(format!("User '{}'", user_id)))
            })
            .await
    }

    async fn delete_user(&self, user_id: String) -> Result<usize> {
        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                Ok(diesel::delete(users::table.find(user_id))
                    .execute(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_db;
    use storefront_core::errors::DatabaseError;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            display_name: "Ana".to_string(),
            password_hash: "argon2-hash".to_string(),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn created_user_is_found_by_lowercase_email() {
        let db = setup_db();
        let repo = db.users();
        let user = repo.create_user(new_user("Ana@Shop.Example")).await.unwrap();

        let credentials = repo
            .find_credentials_by_email("ANA@shop.example")
            .unwrap()
            .unwrap();
        assert_eq!(credentials.user, user);
        assert_eq!(credentials.password_hash, "argon2-hash");
        assert_eq!(repo.get_user(&user.id).unwrap(), Some(user));
    }

    #[tokio::test]
    async fn duplicate_email_is_a_unique_violation() {
        let db = setup_db();
        let repo = db.users();
        repo.create_user(new_user("ana@shop.example")).await.unwrap();

        let err = repo
            .create_user(new_user("ana@shop.example"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Database(DatabaseError::UniqueViolation(_))
        ));
    }

    #[tokio::test]
    async fn update_display_name_of_missing_user_is_not_found() {
        let db = setup_db();
        let repo = db.users();
        let err = repo
            .update_display_name("ghost".to_string(), "Boo".to_string())
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let user = repo.create_user(new_user("ana@shop.example")).await.unwrap();
        let renamed = repo
            .update_display_name(user.id.clone(), "Ana Maria".to_string())
            .await
            .unwrap();
        assert_eq!(renamed.display_name, "Ana Maria");
    }
}
