use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::vehicle::{Vehicle, VehicleFilters, VehicleStatus};
use crate::repositories::VehicleStore;
use crate::utils::errors::{AppError, AppResult};

pub struct VehicleRepository {
    pool: PgPool,
}

impl VehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleStore for VehicleRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Vehicle>> {
        let vehicle = sqlx::query_as::<_, Vehicle>("SELECT * FROM vehicles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(vehicle)
    }

    async fn list(&self, filters: &VehicleFilters) -> AppResult<Vec<Vehicle>> {
        let limit = filters.limit.unwrap_or(50).min(100);
        let offset = filters.offset.unwrap_or(0);

        let vehicles = sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT * FROM vehicles
            WHERE ($1::text IS NULL OR status = $1)
            AND ($2::text IS NULL OR category = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filters.status.map(|s| match s {
            VehicleStatus::Available => "available",
            VehicleStatus::Reserved => "reserved",
        }))
        .bind(filters.category.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(vehicles)
    }

    async fn try_reserve(&self, id: Uuid) -> AppResult<bool> {
        // Update condicional: solo gana un caller aunque dos creen a la vez
        let result = sqlx::query(
            "UPDATE vehicles SET status = 'reserved', updated_at = NOW() WHERE id = $1 AND status = 'available'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn release(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE vehicles SET status = 'available', updated_at = NOW() WHERE id = $1 AND status = 'reserved'",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }
}
