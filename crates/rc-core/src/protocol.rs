//! Popup/options message protocol
//!
//! One request, one response. Requests are tagged by a `type` field;
//! responses are plain objects whose shape depends on the request.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use ts_rs::TS;

use crate::controller::ActivationController;
use crate::error::ActivationError;
use crate::host::Host;
use crate::origin::Origin;
use crate::types::{Action, ActionOutcome, TabStatus};

/// `type` values accepted by [`parse_request`].
pub const REQUEST_TYPES: &[&str] = &[
    "getStatus",
    "enable",
    "disable",
    "toggle",
    "getEnabledOrigins",
    "removeOrigin",
    "removeAllOrigins",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    GetStatus,
    Enable,
    Disable,
    /// Same transition as enable/disable, chosen from current membership.
    Toggle,
    GetEnabledOrigins,
    RemoveOrigin { origin: String },
    RemoveAllOrigins,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct OriginsResponse {
    pub origins: Vec<Origin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct RemoveOriginResponse {
    pub success: bool,
    pub origins: Vec<Origin>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct RemoveAllResponse {
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, TS)]
#[serde(untagged)]
pub enum Response {
    Status(TabStatus),
    Action(ActionOutcome),
    Origins(OriginsResponse),
    RemoveOrigin(RemoveOriginResponse),
    RemoveAll(RemoveAllResponse),
    Error(ErrorResponse),
}

impl Response {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorResponse { error: message.into() })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// Why a message could not be turned into a [`Request`].
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("message has no string 'type' field")]
    MissingType,
    #[error("unknown message type: {0}")]
    UnknownType(String),
    #[error("malformed '{kind}' message: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },
}

pub fn parse_request(message: &Value) -> Result<Request, ProtocolError> {
    let kind = message
        .get("type")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingType)?;
    if !REQUEST_TYPES.contains(&kind) {
        return Err(ProtocolError::UnknownType(kind.to_string()));
    }
    serde_json::from_value(message.clone()).map_err(|source| ProtocolError::Malformed {
        kind: kind.to_string(),
        source,
    })
}

/// Serve one message. Never panics on bad input; failures become
/// [`Response::Error`].
pub async fn dispatch<H: Host>(controller: &ActivationController<H>, message: &Value) -> Response {
    let request = match parse_request(message) {
        Ok(request) => request,
        Err(e) => {
            log::warn!("rejecting message: {}", e);
            return Response::error(e.to_string());
        }
    };
    log::debug!("handling {:?}", request);

    match handle(controller, request).await {
        Ok(response) => response,
        Err(e) => {
            log::error!("request failed: {}", e);
            Response::error(e.to_string())
        }
    }
}

async fn handle<H: Host>(
    controller: &ActivationController<H>,
    request: Request,
) -> Result<Response, ActivationError> {
    let response = match request {
        Request::GetStatus => Response::Status(controller.get_status().await?),
        Request::Enable => Response::Action(controller.set_action(Action::Enable).await?),
        Request::Disable => Response::Action(controller.set_action(Action::Disable).await?),
        Request::Toggle => Response::Action(controller.toggle().await?),
        Request::GetEnabledOrigins => Response::Origins(OriginsResponse {
            origins: controller.enabled_origins().await?,
        }),
        Request::RemoveOrigin { origin } => {
            let (success, origins) = controller.remove_origin(&origin).await?;
            Response::RemoveOrigin(RemoveOriginResponse { success, origins })
        }
        Request::RemoveAllOrigins => {
            controller.remove_all_origins().await?;
            Response::RemoveAll(RemoveAllResponse { success: true })
        }
    };
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtensionConfig;
    use crate::store::ALLOWED_ORIGINS_KEY;
    use crate::testing::{FakeHost, PermissionAnswer};
    use serde_json::json;

    fn controller(host: FakeHost) -> ActivationController<FakeHost> {
        ActivationController::new(host, ExtensionConfig::default())
    }

    async fn send(ctl: &ActivationController<FakeHost>, message: Value) -> Value {
        serde_json::to_value(dispatch(ctl, &message).await).unwrap()
    }

    #[test]
    fn test_parse_request() {
        assert_eq!(parse_request(&json!({ "type": "getStatus" })).unwrap(), Request::GetStatus);
        assert_eq!(
            parse_request(&json!({ "type": "removeOrigin", "origin": "https://a.example" })).unwrap(),
            Request::RemoveOrigin { origin: "https://a.example".into() }
        );
        assert!(matches!(parse_request(&json!({ "kind": "x" })), Err(ProtocolError::MissingType)));
        assert!(matches!(
            parse_request(&json!({ "type": "flip" })),
            Err(ProtocolError::UnknownType(t)) if t == "flip"
        ));
        assert!(matches!(
            parse_request(&json!({ "type": "removeOrigin" })),
            Err(ProtocolError::Malformed { .. })
        ));
    }

    #[tokio::test]
    async fn test_status_shape() {
        let ctl = controller(FakeHost::with_active_tab(1, "https://a.example/x"));
        assert_eq!(
            send(&ctl, json!({ "type": "getStatus" })).await,
            json!({ "origin": "https://a.example", "enabled": false, "supported": true })
        );

        let ctl = controller(FakeHost::with_active_tab(1, "chrome://history"));
        assert_eq!(
            send(&ctl, json!({ "type": "getStatus" })).await,
            json!({ "origin": null, "enabled": false, "supported": false })
        );
    }

    #[tokio::test]
    async fn test_enable_disable_toggle_shape() {
        let ctl = controller(FakeHost::with_active_tab(1, "https://a.example/"));
        assert_eq!(send(&ctl, json!({ "type": "enable" })).await, json!({ "success": true, "enabled": true }));
        assert_eq!(send(&ctl, json!({ "type": "toggle" })).await, json!({ "success": true, "enabled": false }));
        assert_eq!(send(&ctl, json!({ "type": "disable" })).await, json!({ "success": true, "enabled": false }));

        ctl.host().answer_requests(PermissionAnswer::Deny);
        assert_eq!(send(&ctl, json!({ "type": "enable" })).await, json!({ "success": false, "enabled": false }));
    }

    #[tokio::test]
    async fn test_origin_management_shape() {
        let host = FakeHost::new();
        host.put(ALLOWED_ORIGINS_KEY, json!(["https://a.example", "https://b.example"]));
        let ctl = controller(host);

        assert_eq!(
            send(&ctl, json!({ "type": "getEnabledOrigins" })).await,
            json!({ "origins": ["https://a.example", "https://b.example"] })
        );
        assert_eq!(
            send(&ctl, json!({ "type": "removeOrigin", "origin": "https://a.example" })).await,
            json!({ "success": true, "origins": ["https://b.example"] })
        );
        assert_eq!(send(&ctl, json!({ "type": "removeAllOrigins" })).await, json!({ "success": true }));
        assert_eq!(send(&ctl, json!({ "type": "getEnabledOrigins" })).await, json!({ "origins": [] }));
    }

    #[tokio::test]
    async fn test_unknown_and_failing_requests_return_error_field() {
        let ctl = controller(FakeHost::with_active_tab(1, "https://a.example/"));
        let response = send(&ctl, json!({ "type": "selfDestruct" })).await;
        assert_eq!(response, json!({ "error": "unknown message type: selfDestruct" }));
        assert!(send(&ctl, json!(42)).await.get("error").is_some());

        ctl.host().fail_writes(true);
        let response = dispatch(&ctl, &json!({ "type": "enable" })).await;
        assert!(response.is_error());
    }
}
