use crate::config::ConnectorConfig;
use crate::connection::Connection;
use crate::controller::HalController;
use crate::error::{HalError, HalResult, Result, TransportError};
use crate::hal::{HalConnector, HalWrapper};
use crate::protocol::{Method, Request};
use crate::scheduler::CallbackScheduler;
use crate::types::{Capabilities, CompositeEffect, Effect, EffectStrength};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Controller for a HAL service reached over WebSocket
pub type RemoteHalController = HalController<RemoteHalConnector>;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DurationData {
    duration_ms: u64,
}

#[derive(Deserialize)]
struct CapabilitiesData {
    capabilities: Capabilities,
}

#[derive(Deserialize)]
struct EffectsData {
    effects: Vec<Value>,
}

impl EffectsData {
    /// Known effects, skipping names newer than this crate
    fn into_known(self) -> Vec<Effect> {
        self.effects
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<Effect>(value.clone()) {
                Ok(effect) => Some(effect),
                Err(_) => {
                    tracing::debug!("Ignoring unknown effect {}", value);
                    None
                }
            })
            .collect()
    }
}

/// Session with a vibrator HAL service over WebSocket
///
/// Capabilities and the supported effect list are asked for once per session
/// and then served from cache, including an "unsupported" answer.
pub struct RemoteHal {
    url: String,
    connection: Connection,
    capabilities: Mutex<Option<HalResult<Capabilities>>>,
    supported_effects: Mutex<Option<HalResult<Vec<Effect>>>>,
}

impl RemoteHal {
    /// Connect to the HAL service described by `config`
    pub async fn connect(config: &ConnectorConfig) -> Result<Self> {
        config.validate()?;
        let connection = Connection::connect(
            &config.url,
            config.connect_timeout(),
            config.request_timeout(),
        )
        .await?;

        Ok(Self {
            url: config.url.clone(),
            connection,
            capabilities: Mutex::new(None),
            supported_effects: Mutex::new(None),
        })
    }

    /// Get the service URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the underlying socket has closed
    pub fn is_closed(&self) -> bool {
        self.connection.is_closed()
    }

    async fn request(&self, method: Method, data: Option<Value>) -> HalResult<Option<Value>> {
        let mut request = Request::new(method);
        if let Some(data) = data {
            request = request.with_data(data);
        }
        let response = self.connection.send_request(request).await?;
        Ok(response.data)
    }

    async fn request_unit(&self, method: Method, data: Option<Value>) -> HalResult<()> {
        self.request(method, data).await.map(|_| ())
    }

    async fn request_data<T: DeserializeOwned>(
        &self,
        method: Method,
        data: Option<Value>,
    ) -> HalResult<T> {
        let data = self.request(method, data).await?.ok_or_else(|| {
            TransportError::InvalidResponse(format!("No data in {:?} response", method))
        })?;
        serde_json::from_value(data).map_err(|e| TransportError::Json(e).into())
    }
}

impl HalWrapper for RemoteHal {
    async fn ping(&self) -> HalResult<()> {
        self.request_unit(Method::Ping, None).await
    }

    async fn on(&self, timeout: Duration) -> HalResult<()> {
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.request_unit(Method::On, Some(json!({ "timeoutMs": timeout_ms })))
            .await
    }

    async fn off(&self) -> HalResult<()> {
        self.request_unit(Method::Off, None).await
    }

    async fn set_amplitude(&self, amplitude: i32) -> HalResult<()> {
        self.request_unit(Method::SetAmplitude, Some(json!({ "amplitude": amplitude })))
            .await
    }

    async fn set_external_control(&self, enabled: bool) -> HalResult<()> {
        self.request_unit(Method::SetExternalControl, Some(json!({ "enabled": enabled })))
            .await
    }

    async fn always_on_enable(
        &self,
        id: i32,
        effect: Effect,
        strength: EffectStrength,
    ) -> HalResult<()> {
        self.request_unit(
            Method::AlwaysOnEnable,
            Some(json!({ "id": id, "effect": effect, "strength": strength })),
        )
        .await
    }

    async fn always_on_disable(&self, id: i32) -> HalResult<()> {
        self.request_unit(Method::AlwaysOnDisable, Some(json!({ "id": id })))
            .await
    }

    async fn get_capabilities(&self) -> HalResult<Capabilities> {
        let mut cached = self.capabilities.lock().await;
        if let Some(result) = cached.as_ref() {
            return result.clone();
        }

        let result = self
            .request_data::<CapabilitiesData>(Method::GetCapabilities, None)
            .await
            .map(|data| data.capabilities);
        if matches!(&result, Ok(_) | Err(HalError::Unsupported)) {
            *cached = Some(result.clone());
        }
        result
    }

    async fn get_supported_effects(&self) -> HalResult<Vec<Effect>> {
        let mut cached = self.supported_effects.lock().await;
        if let Some(result) = cached.as_ref() {
            return result.clone();
        }

        let result = self
            .request_data::<EffectsData>(Method::GetSupportedEffects, None)
            .await
            .map(EffectsData::into_known);
        if matches!(&result, Ok(_) | Err(HalError::Unsupported)) {
            *cached = Some(result.clone());
        }
        result
    }

    async fn perform_effect(&self, effect: Effect, strength: EffectStrength) -> HalResult<Duration> {
        let data: DurationData = self
            .request_data(
                Method::Perform,
                Some(json!({ "effect": effect, "strength": strength })),
            )
            .await?;
        Ok(Duration::from_millis(data.duration_ms))
    }

    async fn perform_composed_effect(&self, primitives: &[CompositeEffect]) -> HalResult<Duration> {
        let data: DurationData = self
            .request_data(Method::Compose, Some(json!({ "primitives": primitives })))
            .await?;
        Ok(Duration::from_millis(data.duration_ms))
    }
}

/// Opens [`RemoteHal`] sessions for a [`HalController`]
#[derive(Debug, Clone)]
pub struct RemoteHalConnector {
    config: ConnectorConfig,
}

impl RemoteHalConnector {
    /// Create a connector, validating `config` up front
    pub fn new(config: ConnectorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }
}

impl HalConnector for RemoteHalConnector {
    type Hal = RemoteHal;

    async fn connect(&self, _scheduler: Arc<CallbackScheduler>) -> HalResult<RemoteHal> {
        // Completion callbacks are driven by the controller, so the remote
        // session has no use for the scheduler.
        let hal = RemoteHal::connect(&self.config).await?;
        Ok(hal)
    }
}
