//! Google reCAPTCHA verification.
//!
//! The token from the form is posted, together with the site secret, to the
//! siteverify endpoint. The endpoint answers with a JSON object whose
//! `success` field says whether the challenge was solved.
//! Reference: https://developers.google.com/recaptcha/docs/verify

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::challenge::{ChallengeVerifier, VerificationOutcome, CHALLENGE_FIELD};
use crate::error::VerificationError;
use crate::form::NormalizedFields;

/// Default siteverify endpoint.
pub const RECAPTCHA_VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// reCAPTCHA verifier holding the site secret and a reusable HTTP client.
#[derive(Clone)]
pub struct RecaptchaVerifier {
    client: Client,
    secret: String,
    endpoint: String,
}

impl RecaptchaVerifier {
    /// Create a verifier. `timeout` bounds the whole verification request.
    pub fn new(
        secret: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            secret: secret.into(),
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl ChallengeVerifier for RecaptchaVerifier {
    async fn verify(
        &self,
        fields: &NormalizedFields,
    ) -> Result<VerificationOutcome, VerificationError> {
        let token = match fields.get(CHALLENGE_FIELD) {
            Some(token) if !token.is_empty() => token,
            _ => {
                warn!(field = CHALLENGE_FIELD, "recaptcha_token_missing");
                return Err(VerificationError::MissingToken);
            }
        };

        debug!(token_length = token.len(), endpoint = %self.endpoint, "recaptcha_verify_start");

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| VerificationError::Transport(e.to_string()))?;

        let raw_response = response
            .text()
            .await
            .map_err(|e| VerificationError::Transport(e.to_string()))?;

        debug!(raw_response = %raw_response, "recaptcha_verify_response");

        interpret_response(raw_response)
    }
}

/// Read a siteverify answer.
///
/// Unparseable bodies are errors. Any parseable body passes only when its
/// `success` field is truthy.
pub fn interpret_response(raw_response: String) -> Result<VerificationOutcome, VerificationError> {
    let value: Value = match serde_json::from_str(&raw_response) {
        Ok(v) => v,
        Err(e) => {
            return Err(VerificationError::MalformedResponse {
                reason: e.to_string(),
                raw_response,
            });
        }
    };

    let passed = value.get("success").is_some_and(is_truthy);

    Ok(VerificationOutcome {
        passed,
        raw_response,
    })
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use axum::{extract::State, http::StatusCode, routing::post, Form, Router};
    use tokio::net::TcpListener;

    use super::*;
    use crate::error::NotifyError;
    use crate::form::{InboundRequest, ValidatedMessage};
    use crate::handler::ContactHandler;
    use crate::notify::{NotificationResult, Notifier};

    type Captured = Arc<Mutex<Vec<HashMap<String, String>>>>;

    #[derive(Clone)]
    struct StubSiteverify {
        status: StatusCode,
        body: &'static str,
        captured: Captured,
    }

    async fn siteverify(
        State(stub): State<StubSiteverify>,
        Form(form): Form<HashMap<String, String>>,
    ) -> (StatusCode, &'static str) {
        stub.captured.lock().unwrap().push(form);
        (stub.status, stub.body)
    }

    /// Answers successfully, but only after two seconds.
    async fn slow_siteverify() -> (StatusCode, &'static str) {
        tokio::time::sleep(Duration::from_secs(2)).await;
        (StatusCode::OK, r#"{"success": true}"#)
    }

    async fn spawn_slow_siteverify() -> String {
        let app = Router::new().route("/siteverify", post(slow_siteverify));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}/siteverify")
    }

    /// Counts notify calls; always succeeds.
    #[derive(Default)]
    struct CountingNotifier {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl Notifier for CountingNotifier {
        async fn notify(
            &self,
            _message: &ValidatedMessage,
            _topic_id: &str,
        ) -> Result<NotificationResult, NotifyError> {
            *self.calls.lock().unwrap() += 1;
            Ok(NotificationResult {
                message_id: "msg-1".to_string(),
            })
        }
    }

    /// Start a local siteverify stand-in and return its URL.
    async fn spawn_siteverify(status: StatusCode, body: &'static str) -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/siteverify", post(siteverify))
            .with_state(StubSiteverify {
                status,
                body,
                captured: captured.clone(),
            });

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{addr}/siteverify"), captured)
    }

    fn verifier(endpoint: &str) -> RecaptchaVerifier {
        RecaptchaVerifier::new("site-secret", endpoint, Duration::from_secs(5)).unwrap()
    }

    fn fields_with_token(token: &str) -> NormalizedFields {
        NormalizedFields::from_pairs([
            ("name", "Ann"),
            ("email", "a@x.com"),
            ("message", "Hi"),
            (CHALLENGE_FIELD, token),
        ])
    }

    #[test]
    fn test_interpret_response() {
        let outcome = interpret_response(r#"{"success": true}"#.to_string()).unwrap();
        assert!(outcome.passed);

        let raw = r#"{"success": false, "error-codes": ["timeout-or-duplicate"]}"#;
        let outcome = interpret_response(raw.to_string()).unwrap();
        assert!(!outcome.passed);
        assert!(outcome.raw_response.contains("timeout-or-duplicate"));

        let outcome = interpret_response(r#"{"hostname": "example.com"}"#.to_string()).unwrap();
        assert!(!outcome.passed);

        let err = interpret_response("<html>oops</html>".to_string()).unwrap_err();
        assert!(matches!(err, VerificationError::MalformedResponse { .. }));
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy(&Value::Bool(true)));
        assert!(is_truthy(&Value::from(1)));
        assert!(is_truthy(&Value::from("yes")));
        assert!(!is_truthy(&Value::Bool(false)));
        assert!(!is_truthy(&Value::from(0)));
        assert!(!is_truthy(&Value::from("")));
        assert!(!is_truthy(&Value::Null));
    }

    #[tokio::test]
    async fn test_verify_posts_secret_and_token() {
        let (endpoint, captured) = spawn_siteverify(StatusCode::OK, r#"{"success": true}"#).await;

        let outcome = verifier(&endpoint)
            .verify(&fields_with_token("token-123"))
            .await
            .unwrap();

        assert!(outcome.passed);
        let requests = captured.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].get("secret").map(String::as_str), Some("site-secret"));
        assert_eq!(requests[0].get("response").map(String::as_str), Some("token-123"));
    }

    #[tokio::test]
    async fn test_verify_reports_failed_challenge() {
        let (endpoint, _) = spawn_siteverify(StatusCode::OK, r#"{"success": false}"#).await;

        let outcome = verifier(&endpoint)
            .verify(&fields_with_token("token-123"))
            .await
            .unwrap();

        assert!(!outcome.passed);
    }

    #[tokio::test]
    async fn test_verify_missing_token_makes_no_call() {
        let (endpoint, captured) = spawn_siteverify(StatusCode::OK, r#"{"success": true}"#).await;
        let fields = NormalizedFields::from_pairs([("name", "Ann")]);

        let err = verifier(&endpoint).verify(&fields).await.unwrap_err();

        assert!(matches!(err, VerificationError::MissingToken));
        assert!(captured.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_verify_server_error_is_transport_failure() {
        let (endpoint, _) = spawn_siteverify(StatusCode::INTERNAL_SERVER_ERROR, "boom").await;

        let err = verifier(&endpoint)
            .verify(&fields_with_token("token-123"))
            .await
            .unwrap_err();

        assert!(matches!(err, VerificationError::Transport(_)));
    }

    #[tokio::test]
    async fn test_verify_unparseable_body() {
        let (endpoint, _) = spawn_siteverify(StatusCode::OK, "not json").await;

        let err = verifier(&endpoint)
            .verify(&fields_with_token("token-123"))
            .await
            .unwrap_err();

        assert!(matches!(err, VerificationError::MalformedResponse { .. }));
    }

    #[tokio::test]
    async fn test_verify_unreachable_endpoint() {
        // Bind then drop to get a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = verifier(&format!("http://{addr}/siteverify"))
            .verify(&fields_with_token("token-123"))
            .await
            .unwrap_err();

        assert!(matches!(err, VerificationError::Transport(_)));
    }

    #[tokio::test]
    async fn test_verify_timeout_is_transport_failure() {
        let endpoint = spawn_slow_siteverify().await;
        let verifier =
            RecaptchaVerifier::new("site-secret", endpoint, Duration::from_millis(100)).unwrap();

        let err = verifier
            .verify(&fields_with_token("token-123"))
            .await
            .unwrap_err();

        assert!(matches!(err, VerificationError::Transport(_)));
    }

    #[tokio::test]
    async fn test_handler_rejects_on_verify_timeout() {
        let endpoint = spawn_slow_siteverify().await;
        let verifier =
            RecaptchaVerifier::new("site-secret", endpoint, Duration::from_millis(100)).unwrap();
        let notifier = Arc::new(CountingNotifier::default());
        let handler = ContactHandler::new(
            "https://example.com",
            "contact_form",
            notifier.clone(),
            Some(Arc::new(verifier)),
        );

        let body = format!("name=Ann&email=a%40x.com&message=Hi&{CHALLENGE_FIELD}=token-123");
        let response = handler
            .handle(&InboundRequest::new(body, None, false))
            .await;

        assert_eq!(response.status_code, 401);
        assert_eq!(response.body, "\"Must use ReCaptcha\"");
        assert_eq!(response.allow_origin(), Some("https://example.com"));
        assert_eq!(*notifier.calls.lock().unwrap(), 0);
    }
}
