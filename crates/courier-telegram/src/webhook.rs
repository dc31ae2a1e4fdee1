//! Webhook update receiver.
//!
//! Serves plain HTTP; TLS termination and the `setWebhook` call that points
//! Telegram at this listener belong to the deployment. Updates are processed
//! inline before the 200 response, so slow conversations apply backpressure
//! to the webhook sender the same way they do to the poll loop.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::Json;
use tracing::info;

use courier_core::config::ListenConfig;

use crate::error::Result;
use crate::framework::UpdatePipeline;
use crate::types::Update;

/// Bind the listener and serve updates until the socket fails.
pub(crate) async fn run(pipeline: Arc<UpdatePipeline>, config: ListenConfig) -> Result<()> {
    let app = axum::Router::new()
        .route("/", post(receive_update))
        .with_state(pipeline);

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "webhook listener started");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn receive_update(
    State(pipeline): State<Arc<UpdatePipeline>>,
    Json(update): Json<Update>,
) -> StatusCode {
    pipeline.process(update).await;
    StatusCode::OK
}
