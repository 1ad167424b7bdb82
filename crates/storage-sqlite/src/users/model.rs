use diesel::prelude::*;

use storefront_core::users::{User, UserCredentials};

#[derive(Queryable, Identifiable, Insertable, AsChangeset, Selectable, Debug, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserDB {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub created_at: String,
}

impl From<UserDB> for User {
    fn from(db: UserDB) -> Self {
        Self {
            id: db.id,
            email: db.email,
            display_name: db.display_name,
            is_admin: db.is_admin,
            created_at: db.created_at,
        }
    }
}

impl From<UserDB> for UserCredentials {
    fn from(mut db: UserDB) -> Self {
        let password_hash = std::mem::take(&mut db.password_hash);
        Self {
            user: User::from(db),
            password_hash,
        }
    }
}
