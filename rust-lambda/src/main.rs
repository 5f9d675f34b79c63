//! Contact form Lambda - API Gateway proxy-integration entry point.
//!
//! Configuration and outbound clients are built once per execution
//! environment; each invocation runs the stateless handler pipeline.

use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use contact_form::bootstrap::build_handler;
use contact_form::lambda::ApiGatewayProxyRequest;
use contact_form::{Config, HandlerResponse};

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Initialize structured JSON logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    tracing::info!("lambda_starting");

    let config = Config::from_env()?;
    tracing::info!(
        origin_domain = %config.origin_domain,
        notify_backend = ?config.notify_backend,
        recaptcha_configured = config.recaptcha_secret.is_some(),
        "config_loaded"
    );

    let handler = Arc::new(build_handler(&config).await?);

    lambda_runtime::run(service_fn(move |event: LambdaEvent<ApiGatewayProxyRequest>| {
        let handler = Arc::clone(&handler);
        async move {
            let request = event.payload.into_inbound();
            Ok::<HandlerResponse, Error>(handler.handle(&request).await)
        }
    }))
    .await
}
