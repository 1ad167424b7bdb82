use diesel::prelude::*;

use storefront_core::favorites::Favorite;

#[derive(Queryable, Identifiable, Insertable, Selectable, Debug, Clone)]
#[diesel(primary_key(user_id, product_id))]
#[diesel(table_name = crate::schema::favorites)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FavoriteDB {
    pub user_id: String,
    pub product_id: String,
    pub created_at: String,
}

impl From<FavoriteDB> for Favorite {
    fn from(db: FavoriteDB) -> Self {
        Self {
            user_id: db.user_id,
            product_id: db.product_id,
        }
    }
}
