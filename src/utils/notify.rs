use sqlx::MySqlPool;
use tracing::warn;

/// Files an in-app notification for an employee.
///
/// Notification failures never fail the request that triggered them.
pub async fn notify(pool: &MySqlPool, employee_id: u64, message: &str, link: Option<String>) {
    let result = sqlx::query(
        r#"
        INSERT INTO notifications (employee_id, message, link)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(employee_id)
    .bind(message)
    .bind(link)
    .execute(pool)
    .await;

    if let Err(e) = result {
        warn!(error = %e, employee_id, "Failed to create notification");
    }
}
