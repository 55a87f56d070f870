//! Database metrics collection.

use metrics::{counter, gauge, histogram};
use sqlx::PgPool;
use std::time::Instant;

/// Record connection pool occupancy.
pub fn record_pool_metrics(pool: &PgPool) {
    let size = pool.size() as usize;
    let idle = pool.num_idle();
    let active = size.saturating_sub(idle);

    gauge!("database_connections_active").set(active as f64);
    gauge!("database_connections_idle").set(idle as f64);
    gauge!("database_connections_total").set(size as f64);
}

/// Times a query and records its duration and outcome.
///
/// ```ignore
/// let timer = QueryTimer::new("insert_confirmation");
/// let result = sqlx::query_as::<_, ConfirmationEntity>(...).fetch_one(&pool).await;
/// timer.finish(&result);
/// ```
pub struct QueryTimer {
    query_name: &'static str,
    start: Instant,
}

impl QueryTimer {
    pub fn new(query_name: &'static str) -> Self {
        Self {
            query_name,
            start: Instant::now(),
        }
    }

    /// Record the elapsed duration, labelled with whether the query failed.
    pub fn finish<T, E>(self, result: &Result<T, E>) {
        let outcome = if result.is_ok() { "ok" } else { "error" };
        histogram!(
            "database_query_duration_seconds",
            "query" => self.query_name
        )
        .record(self.start.elapsed().as_secs_f64());
        counter!(
            "database_queries_total",
            "query" => self.query_name,
            "outcome" => outcome
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_timer_creation() {
        let timer = QueryTimer::new("find_all_confirmations");
        assert_eq!(timer.query_name, "find_all_confirmations");
    }

    #[test]
    fn test_query_timer_finish_without_recorder() {
        // No global recorder is installed in unit tests; recording is a no-op.
        let ok: Result<(), ()> = Ok(());
        QueryTimer::new("noop").finish(&ok);
        let err: Result<(), &str> = Err("boom");
        QueryTimer::new("noop").finish(&err);
    }
}
