use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use super::{status_names, ReservationQuery, ReservationRepository};
use crate::database::manager::DatabaseError;
use crate::database::models::Reservation;

const RESERVATION_COLUMNS: &str = "id, customer_id, customer_name, customer_phone, customer_email, \
                                   reservation_date, reservation_time, party_size, status, special_requests, \
                                   table_id, cancellation_reason, confirmed_at, seated_at, cancelled_at, \
                                   created_at, updated_at";

pub struct PgReservationRepository {
    pool: PgPool,
}

impl PgReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReservationRepository for PgReservationRepository {
    async fn insert(&self, reservation: &Reservation) -> Result<Reservation, DatabaseError> {
        let sql = format!(
            r#"
            INSERT INTO reservations
                (id, customer_id, customer_name, customer_phone, customer_email, reservation_date,
                 reservation_time, party_size, status, special_requests, table_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {RESERVATION_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, Reservation>(&sql)
            .bind(reservation.id)
            .bind(reservation.customer_id)
            .bind(&reservation.customer_name)
            .bind(&reservation.customer_phone)
            .bind(&reservation.customer_email)
            .bind(reservation.reservation_date)
            .bind(&reservation.reservation_time)
            .bind(reservation.party_size)
            .bind(reservation.status)
            .bind(&reservation.special_requests)
            .bind(reservation.table_id)
            .bind(reservation.created_at)
            .bind(reservation.updated_at)
            .fetch_one(&self.pool)
            .await?;
        info!(
            "Created reservation for {} on {} at {}",
            created.party_size, created.reservation_date, created.reservation_time
        );
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Reservation>, DatabaseError> {
        let sql = format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1");
        Ok(sqlx::query_as::<_, Reservation>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list(&self, query: &ReservationQuery) -> Result<Vec<Reservation>, DatabaseError> {
        let direction = if query.newest_first { "DESC" } else { "ASC" };
        let sql = format!(
            r#"
            SELECT {RESERVATION_COLUMNS} FROM reservations
            WHERE ($1::date IS NULL OR reservation_date >= $1)
              AND ($2::date IS NULL OR reservation_date <= $2)
              AND ($3::text IS NULL OR customer_phone = $3)
              AND ($4::text[] IS NULL OR status::text = ANY($4))
            ORDER BY reservation_date {direction}, reservation_time {direction}, created_at {direction}
            "#
        );
        Ok(sqlx::query_as::<_, Reservation>(&sql)
            .bind(query.date_from)
            .bind(query.date_to)
            .bind(query.phone.as_deref())
            .bind(status_names(&query.statuses))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update(&self, reservation: &Reservation) -> Result<Reservation, DatabaseError> {
        let sql = format!(
            r#"
            UPDATE reservations
            SET customer_name = $2, customer_email = $3, reservation_date = $4, reservation_time = $5,
                party_size = $6, status = $7, special_requests = $8, table_id = $9,
                cancellation_reason = $10, confirmed_at = $11, seated_at = $12, cancelled_at = $13,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {RESERVATION_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Reservation>(&sql)
            .bind(reservation.id)
            .bind(&reservation.customer_name)
            .bind(&reservation.customer_email)
            .bind(reservation.reservation_date)
            .bind(&reservation.reservation_time)
            .bind(reservation.party_size)
            .bind(reservation.status)
            .bind(&reservation.special_requests)
            .bind(reservation.table_id)
            .bind(&reservation.cancellation_reason)
            .bind(reservation.confirmed_at)
            .bind(reservation.seated_at)
            .bind(reservation.cancelled_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("reservation {}", reservation.id)))
    }
}
