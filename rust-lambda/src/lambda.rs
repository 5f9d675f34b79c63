//! API Gateway proxy-integration event shape.
//!
//! Only the parts the handler reads are modelled: the body, the headers and
//! the base64 flag. Works for both REST (v1) and HTTP (v2) payloads.

use std::collections::HashMap;

use serde::Deserialize;

use crate::form::InboundRequest;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayProxyRequest {
    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,

    #[serde(default)]
    pub is_base64_encoded: bool,
}

impl ApiGatewayProxyRequest {
    /// Case-insensitive header lookup. HTTP APIs lowercase header names,
    /// REST APIs pass them through as sent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.as_ref().and_then(|headers| {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        })
    }

    pub fn into_inbound(self) -> InboundRequest {
        let content_type = self.header("content-type").map(str::to_string);
        InboundRequest::new(
            self.body.unwrap_or_default(),
            content_type,
            self.is_base64_encoded,
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_http_api_event() {
        let event: ApiGatewayProxyRequest = serde_json::from_value(json!({
            "version": "2.0",
            "routeKey": "$default",
            "headers": {"content-type": "application/x-www-form-urlencoded"},
            "body": "bmFtZT1Bbm4=",
            "isBase64Encoded": true
        }))
        .unwrap();

        let request = event.into_inbound();
        assert_eq!(request.body(), b"bmFtZT1Bbm4=");
        assert_eq!(request.content_type(), Some("application/x-www-form-urlencoded"));
        assert!(request.is_encoded());
    }

    #[test]
    fn test_rest_api_event_with_mixed_case_header() {
        let event: ApiGatewayProxyRequest = serde_json::from_value(json!({
            "resource": "/contact",
            "headers": {"Content-Type": "application/json"},
            "body": "{\"name\":\"Ann\"}",
            "isBase64Encoded": false
        }))
        .unwrap();

        assert_eq!(event.header("CONTENT-TYPE"), Some("application/json"));
        let request = event.into_inbound();
        assert!(!request.is_encoded());
    }

    #[test]
    fn test_minimal_event() {
        let event: ApiGatewayProxyRequest =
            serde_json::from_value(json!({"headers": null, "body": null})).unwrap();

        let request = event.into_inbound();
        assert!(request.body().is_empty());
        assert_eq!(request.content_type(), None);
        assert!(!request.is_encoded());
    }
}
