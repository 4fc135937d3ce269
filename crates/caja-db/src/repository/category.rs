//! # Category Repository
//!
//! Categories are the only rows that are ever hard-deleted. Deleting one
//! detaches its products (`ON DELETE SET NULL`).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use caja_core::validation::validate_name;
use caja_core::Category;

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    pub async fn create(&self, name: &str) -> DbResult<Category> {
        validate_name("name", name)?;

        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };

        debug!(id = %category.id, name = %category.name, "Creating category");

        sqlx::query("INSERT INTO categories (id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&category.id)
            .bind(&category.name)
            .bind(category.created_at)
            .execute(&self.pool)
            .await?;

        Ok(category)
    }

    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            "SELECT id, name, created_at FROM categories ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn rename(&self, id: &str, name: &str) -> DbResult<Category> {
        validate_name("name", name)?;

        let category = sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = ?2 WHERE id = ?1 RETURNING id, name, created_at",
        )
        .bind(id)
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        category.ok_or_else(|| DbError::not_found("Category", id))
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let result = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup;
    use caja_core::{Money, ProductInput, Quantity, Rate};

    #[tokio::test]
    async fn test_category_crud() {
        let db = setup().await;
        let repo = db.categories();

        let bebidas = repo.create("Bebidas").await.unwrap();
        repo.create("Almacen").await.unwrap();

        let names: Vec<String> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Almacen", "Bebidas"]);

        let renamed = repo.rename(&bebidas.id, "Bebidas frias").await.unwrap();
        assert_eq!(renamed.name, "Bebidas frias");

        assert!(matches!(
            repo.create("Almacen").await.unwrap_err(),
            DbError::UniqueViolation { .. }
        ));
        assert!(matches!(
            repo.rename("missing", "X").await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_delete_detaches_products() {
        let db = setup().await;
        let category = db.categories().create("Limpieza").await.unwrap();

        let product = db
            .products()
            .create(&ProductInput {
                name: "Lavandina".to_string(),
                sku: None,
                barcode: None,
                category_id: Some(category.id.clone()),
                base_price: Money::from_cents(900),
                cost_price: Money::from_cents(500),
                tax_rate: Rate::from_percent(21),
                min_stock: Quantity::zero(),
                track_inventory: true,
            })
            .await
            .unwrap();

        db.categories().delete(&category.id).await.unwrap();

        let product = db.products().get(&product.id).await.unwrap();
        assert_eq!(product.category_id, None);
        assert!(db.categories().delete(&category.id).await.is_err());
    }
}
