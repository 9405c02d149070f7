use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::booking::Booking;
use crate::repositories::BookingStore;
use crate::utils::errors::{AppError, AppResult};

pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingStore for BookingRepository {
    async fn insert(&self, booking: &Booking) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, vehicle_id, customer_name, customer_email, customer_phone,
                service_type, pickup_location, dropoff_location, start_date, start_time,
                duration_hours, total_amount, status, payment_status,
                gateway_session_id, gateway_payment_id, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(booking.id)
        .bind(booking.vehicle_id)
        .bind(&booking.customer_name)
        .bind(&booking.customer_email)
        .bind(&booking.customer_phone)
        .bind(booking.service_type)
        .bind(&booking.pickup_location)
        .bind(&booking.dropoff_location)
        .bind(booking.start_date)
        .bind(booking.start_time)
        .bind(booking.duration_hours)
        .bind(booking.total_amount)
        .bind(booking.status)
        .bind(booking.payment_status)
        .bind(&booking.gateway_session_id)
        .bind(&booking.gateway_payment_id)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        let booking = sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)?;

        Ok(booking)
    }

    async fn attach_session(&self, id: Uuid, session_id: &str, total_amount: Decimal) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET gateway_session_id = $2, total_amount = $3, payment_status = 'pending', updated_at = NOW()
            WHERE id = $1 AND status = 'pending' AND payment_status <> 'paid'
            "#,
        )
        .bind(id)
        .bind(session_id)
        .bind(total_amount)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn try_mark_paid(&self, id: Uuid, gateway_payment_id: &str) -> AppResult<bool> {
        // La condición decide el ganador entre webhook y fallback concurrentes
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET payment_status = 'paid', status = 'confirmed', gateway_payment_id = $2, updated_at = NOW()
            WHERE id = $1 AND payment_status <> 'paid' AND status <> 'cancelled'
            "#,
        )
        .bind(id)
        .bind(gateway_payment_id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn try_mark_payment_failed(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET payment_status = 'failed', updated_at = NOW()
            WHERE id = $1 AND payment_status = 'pending' AND status = 'pending'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn try_cancel(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = 'cancelled', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_expired_pending(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE status = 'pending' AND payment_status <> 'paid' AND created_at < $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(bookings)
    }

    async fn find_cancelled_with_reserved_vehicle(&self, cutoff: DateTime<Utc>) -> AppResult<Vec<Booking>> {
        // Un vehículo no puede ser re-reservado mientras siga en 'reserved',
        // pero igual excluimos vehículos con otra reserva activa
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT b.* FROM bookings b
            JOIN vehicles v ON v.id = b.vehicle_id
            WHERE b.status = 'cancelled'
            AND v.status = 'reserved'
            AND b.updated_at < $1
            AND NOT EXISTS (
                SELECT 1 FROM bookings other
                WHERE other.vehicle_id = b.vehicle_id
                AND other.id <> b.id
                AND other.status IN ('pending', 'confirmed')
            )
            ORDER BY b.updated_at ASC
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)?;

        Ok(bookings)
    }
}
