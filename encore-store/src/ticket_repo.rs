use async_trait::async_trait;
use encore_core::repository::{IssuedTicket, TicketRepository};
use sqlx::PgPool;
use uuid::Uuid;

/// Looks up sold tickets in the `tickets` table. Cancelled tickets free the
/// table again.
pub struct PostgresTicketRepository {
    pool: PgPool,
}

impl PostgresTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct TicketRow {
    id: Uuid,
    event_id: String,
    table_id: String,
}

impl From<TicketRow> for IssuedTicket {
    fn from(row: TicketRow) -> Self {
        Self {
            ticket_id: row.id.to_string(),
            event_id: row.event_id,
            resource_id: row.table_id,
        }
    }
}

#[async_trait]
impl TicketRepository for PostgresTicketRepository {
    async fn find_issued_ticket(
        &self,
        event_id: &str,
        resource_id: &str,
    ) -> Result<Option<IssuedTicket>, Box<dyn std::error::Error + Send + Sync>> {
        let row = sqlx::query_as::<_, TicketRow>(
            r#"
            SELECT id, event_id, table_id
            FROM tickets
            WHERE event_id = $1
              AND table_id = $2
              AND status <> 'cancelled'
            LIMIT 1
            "#,
        )
        .bind(event_id)
        .bind(resource_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(IssuedTicket::from))
    }
}
