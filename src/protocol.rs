use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// HAL request structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub meta: RequestMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Request metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMeta {
    pub id: Uuid,
    pub method: Method,
}

/// HAL response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub meta: ResponseMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ApiError>>,
}

/// Response metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<Method>,
}

/// API error structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: ErrorCode,
    pub detail: String,
}

/// Error class reported by the HAL service
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCode {
    /// Operation is not implemented by the hardware
    Unsupported,
    /// Any other failure
    #[default]
    #[serde(other)]
    Failed,
}

/// HAL methods
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Method {
    Ping,
    On,
    Off,
    SetAmplitude,
    SetExternalControl,
    AlwaysOnEnable,
    AlwaysOnDisable,
    GetCapabilities,
    GetSupportedEffects,
    Perform,
    Compose,
}

impl Request {
    /// Create a new request for the given method
    pub fn new(method: Method) -> Self {
        Self {
            meta: RequestMeta {
                id: Uuid::new_v4(),
                method,
            },
            data: None,
        }
    }

    /// Set the request data
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Get the request ID
    pub fn id(&self) -> Uuid {
        self.meta.id
    }

    /// Get the request method
    pub fn method(&self) -> Method {
        self.meta.method
    }
}

impl Response {
    /// Check if the response contains errors
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// Get the first error, if any
    pub fn first_error(&self) -> Option<&ApiError> {
        self.errors.as_ref().and_then(|e| e.first())
    }
}
