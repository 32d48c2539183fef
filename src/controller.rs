use crate::error::{HalError, HalResult};
use crate::hal::{HalConnector, HalWrapper};
use crate::scheduler::{CallbackScheduler, CompletionCallback};
use crate::types::{Capabilities, CompositeEffect, Effect, EffectStrength};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Reconnecting front end for a vibrator HAL
///
/// The `HalController` owns at most one live HAL session at a time and hands
/// out shared references to it, so a call that is already running keeps its
/// session even if another caller replaces it. Whenever a call fails for a
/// reason other than being unsupported, the session is dropped and the call
/// is retried once against a fresh one obtained from the [`HalConnector`].
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use vibrator_hal::{ConnectorConfig, HalController, RemoteHalConnector};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let connector = RemoteHalConnector::new(ConnectorConfig::new("ws://127.0.0.1:8780"))?;
///     let controller = HalController::new(connector);
///
///     controller.set_amplitude(128).await?;
///     controller
///         .on(Duration::from_millis(50), Arc::new(|| println!("done")))
///         .await?;
///     Ok(())
/// }
/// ```
pub struct HalController<C: HalConnector> {
    connector: C,
    scheduler: Arc<CallbackScheduler>,
    /// Guards only the slot; HAL calls run after the guard is released.
    connected_hal: Mutex<Option<Arc<C::Hal>>>,
}

impl<C: HalConnector> HalController<C> {
    /// Create a controller with its own callback scheduler
    ///
    /// No connection is made until the first call (or [`init`](Self::init)).
    pub fn new(connector: C) -> Self {
        Self::with_scheduler(connector, Arc::new(CallbackScheduler::new()))
    }

    /// Create a controller that shares an existing callback scheduler
    pub fn with_scheduler(connector: C, scheduler: Arc<CallbackScheduler>) -> Self {
        Self {
            connector,
            scheduler,
            connected_hal: Mutex::new(None),
        }
    }

    /// The scheduler that receives completion callbacks
    pub fn scheduler(&self) -> &Arc<CallbackScheduler> {
        &self.scheduler
    }

    /// Connect eagerly, returning whether a HAL session is now available
    pub async fn init(&self) -> bool {
        self.init_hal().await.is_ok()
    }

    /// Drop the current session, if any, and connect a new one
    pub async fn try_reconnect(&self) -> bool {
        let mut slot = self.connected_hal.lock().await;
        if slot.take().is_some() {
            tracing::info!("Dropping vibrator HAL connection for reconnect");
        }
        self.connect_locked(&mut slot).await.is_ok()
    }

    /// Whether a HAL session is currently held
    pub async fn is_connected(&self) -> bool {
        self.connected_hal.lock().await.is_some()
    }

    pub async fn ping(&self) -> HalResult<()> {
        self.call(|hal| async move { hal.ping().await }, "ping")
            .await
    }

    /// Vibrate for `timeout`, then fire `completion_callback`
    ///
    /// The callback is only scheduled once the HAL has accepted the command.
    pub async fn on(
        &self,
        timeout: Duration,
        completion_callback: CompletionCallback,
    ) -> HalResult<()> {
        self.call(move |hal| async move { hal.on(timeout).await }, "on")
            .await?;
        self.scheduler.schedule(timeout, completion_callback);
        Ok(())
    }

    pub async fn off(&self) -> HalResult<()> {
        self.call(|hal| async move { hal.off().await }, "off")
            .await
    }

    pub async fn set_amplitude(&self, amplitude: i32) -> HalResult<()> {
        self.call(
            move |hal| async move { hal.set_amplitude(amplitude).await },
            "set_amplitude",
        )
        .await
    }

    pub async fn set_external_control(&self, enabled: bool) -> HalResult<()> {
        self.call(
            move |hal| async move { hal.set_external_control(enabled).await },
            "set_external_control",
        )
        .await
    }

    pub async fn always_on_enable(
        &self,
        id: i32,
        effect: Effect,
        strength: EffectStrength,
    ) -> HalResult<()> {
        self.call(
            move |hal| async move { hal.always_on_enable(id, effect, strength).await },
            "always_on_enable",
        )
        .await
    }

    pub async fn always_on_disable(&self, id: i32) -> HalResult<()> {
        self.call(
            move |hal| async move { hal.always_on_disable(id).await },
            "always_on_disable",
        )
        .await
    }

    pub async fn get_capabilities(&self) -> HalResult<Capabilities> {
        self.call(
            |hal| async move { hal.get_capabilities().await },
            "get_capabilities",
        )
        .await
    }

    pub async fn get_supported_effects(&self) -> HalResult<Vec<Effect>> {
        self.call(
            |hal| async move { hal.get_supported_effects().await },
            "get_supported_effects",
        )
        .await
    }

    /// Play a predefined effect and return its expected duration
    ///
    /// `completion_callback` fires once that duration has elapsed.
    pub async fn perform_effect(
        &self,
        effect: Effect,
        strength: EffectStrength,
        completion_callback: CompletionCallback,
    ) -> HalResult<Duration> {
        let duration = self
            .call(
                move |hal| async move { hal.perform_effect(effect, strength).await },
                "perform_effect",
            )
            .await?;
        self.scheduler.schedule(duration, completion_callback);
        Ok(duration)
    }

    /// Play a sequence of primitives and return its expected duration
    pub async fn perform_composed_effect(
        &self,
        primitives: &[CompositeEffect],
        completion_callback: CompletionCallback,
    ) -> HalResult<Duration> {
        let duration = self
            .call(
                move |hal| async move { hal.perform_composed_effect(primitives).await },
                "perform_composed_effect",
            )
            .await?;
        self.scheduler.schedule(duration, completion_callback);
        Ok(duration)
    }

    /// Run `hal_fn`, retrying once on a fresh session if it failed
    async fn call<T, F, Fut>(&self, hal_fn: F, function_name: &'static str) -> HalResult<T>
    where
        F: Fn(Arc<C::Hal>) -> Fut,
        Fut: Future<Output = HalResult<T>>,
    {
        match self.apply(&hal_fn, function_name).await {
            Err(err) if err.should_reconnect() => {
                tracing::warn!("Retrying vibrator HAL {} after: {}", function_name, err);
                self.apply(&hal_fn, function_name).await
            }
            result => result,
        }
    }

    async fn apply<T, F, Fut>(&self, hal_fn: &F, function_name: &'static str) -> HalResult<T>
    where
        F: Fn(Arc<C::Hal>) -> Fut,
        Fut: Future<Output = HalResult<T>>,
    {
        let hal = self.init_hal().await?;
        let result = hal_fn(hal.clone()).await;
        self.process_hal_result(result, &hal, function_name).await
    }

    async fn process_hal_result<T>(
        &self,
        result: HalResult<T>,
        hal: &Arc<C::Hal>,
        function_name: &'static str,
    ) -> HalResult<T> {
        match &result {
            Err(err) if err.should_reconnect() => {
                tracing::error!("Vibrator HAL {} failed: {}", function_name, err);
                let mut slot = self.connected_hal.lock().await;
                // Another caller may already have swapped in a newer session.
                if slot.as_ref().is_some_and(|current| Arc::ptr_eq(current, hal)) {
                    *slot = None;
                    tracing::info!("Dropped vibrator HAL connection");
                }
            }
            Err(_) => {
                tracing::debug!("Vibrator HAL {} is not supported", function_name);
            }
            Ok(_) => {}
        }
        result
    }

    async fn init_hal(&self) -> HalResult<Arc<C::Hal>> {
        let mut slot = self.connected_hal.lock().await;
        if let Some(hal) = slot.as_ref() {
            return Ok(hal.clone());
        }
        self.connect_locked(&mut slot).await
    }

    async fn connect_locked(&self, slot: &mut Option<Arc<C::Hal>>) -> HalResult<Arc<C::Hal>> {
        match self.connector.connect(self.scheduler.clone()).await {
            Ok(hal) => {
                let hal = Arc::new(hal);
                *slot = Some(hal.clone());
                tracing::info!("Connected to vibrator HAL");
                Ok(hal)
            }
            Err(err) => {
                tracing::error!("Failed to connect to vibrator HAL: {}", err);
                Err(match err {
                    HalError::Unavailable(_) => err,
                    other => HalError::Unavailable(other.to_string()),
                })
            }
        }
    }
}
