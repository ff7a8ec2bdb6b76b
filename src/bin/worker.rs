use intellifrost_server::escalation::EscalationEngine;
use intellifrost_server::notifications::AlertNotifier;
use sea_orm::Database;

#[tokio::main]
async fn main() {
    // Load .env if present (dotenvy)
    dotenvy::dotenv().ok();

    intellifrost_server::telemetry::init_telemetry("intellifrost-worker");

    let (prometheus_layer, metric_handle) = axum_prometheus::PrometheusMetricLayer::pair();

    // Spawn metrics server
    tokio::spawn(async move {
        let app = axum::Router::new()
            .route(
                "/metrics",
                axum::routing::get(|| async move { metric_handle.render() }),
            )
            .layer(prometheus_layer);
        let addr = std::net::SocketAddr::from(([0, 0, 0, 0], 9091));
        tracing::info!("Metrics server listening on {}", addr);
        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
        axum::serve(listener, app).await.unwrap();
    });

    // Database Connection
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db = Database::connect(&database_url)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Starting escalation worker...");

    // Open-alerts gauge refresher
    let gauge_db = db.clone();
    tokio::spawn(async move {
        loop {
            intellifrost_server::metrics::refresh_open_alerts(&gauge_db).await;
            tokio::time::sleep(tokio::time::Duration::from_secs(15)).await;
        }
    });

    // Escalation tick driver. One tick per interval; a failed tick is logged
    // and the next timer fire simply tries again.
    let tick_seconds: u64 = std::env::var("ESCALATION_TICK_SECONDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(60);
    let engine = EscalationEngine::new(db.clone(), AlertNotifier::new());
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(tick_seconds));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            match engine.run_tick(chrono::Utc::now()).await {
                Ok(stats) => {
                    if stats.escalated > 0 || stats.failed > 0 {
                        tracing::info!(
                            "Escalation tick: scanned={} escalated={} dispatched={} skipped={} failed={}",
                            stats.scanned,
                            stats.escalated,
                            stats.dispatched,
                            stats.skipped,
                            stats.failed
                        );
                    }
                }
                Err(e) => tracing::error!("Escalation tick failed: {}", e),
            }
        }
    });

    // Keep the main process alive
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutting down worker process"),
        Err(err) => tracing::error!("Unable to listen for shutdown signal: {}", err),
    }
}
