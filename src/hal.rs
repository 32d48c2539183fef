//! Seams between the controller and a concrete vibrator HAL.

use crate::error::HalResult;
use crate::scheduler::CallbackScheduler;
use crate::types::{Capabilities, CompositeEffect, Effect, EffectStrength};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// One live session with a vibrator HAL
///
/// Every method maps to a single HAL call. Implementations report failures
/// through [`HalError`](crate::HalError) and never retry on their own; that
/// is the controller's job.
pub trait HalWrapper: Send + Sync + 'static {
    /// Check that the HAL is alive
    fn ping(&self) -> impl Future<Output = HalResult<()>> + Send;

    /// Start vibrating for `timeout`
    fn on(&self, timeout: Duration) -> impl Future<Output = HalResult<()>> + Send;

    /// Stop any ongoing vibration
    fn off(&self) -> impl Future<Output = HalResult<()>> + Send;

    /// Set the vibration amplitude
    fn set_amplitude(&self, amplitude: i32) -> impl Future<Output = HalResult<()>> + Send;

    /// Hand control of the actuator to an external source, or take it back
    fn set_external_control(&self, enabled: bool) -> impl Future<Output = HalResult<()>> + Send;

    /// Bind an always-on effect to the preset slot `id`
    fn always_on_enable(
        &self,
        id: i32,
        effect: Effect,
        strength: EffectStrength,
    ) -> impl Future<Output = HalResult<()>> + Send;

    /// Clear the always-on preset slot `id`
    fn always_on_disable(&self, id: i32) -> impl Future<Output = HalResult<()>> + Send;

    fn get_capabilities(&self) -> impl Future<Output = HalResult<Capabilities>> + Send;

    fn get_supported_effects(&self) -> impl Future<Output = HalResult<Vec<Effect>>> + Send;

    /// Play a predefined effect, returning how long it will last
    fn perform_effect(
        &self,
        effect: Effect,
        strength: EffectStrength,
    ) -> impl Future<Output = HalResult<Duration>> + Send;

    /// Play a sequence of primitives, returning how long it will last
    fn perform_composed_effect(
        &self,
        primitives: &[CompositeEffect],
    ) -> impl Future<Output = HalResult<Duration>> + Send;
}

/// Factory for HAL sessions
///
/// Called by the controller whenever it has no live session. Must be safe to
/// call repeatedly; a failure is reported as an error and the controller will
/// simply ask again on the next call.
pub trait HalConnector: Send + Sync + 'static {
    type Hal: HalWrapper;

    fn connect(
        &self,
        scheduler: Arc<CallbackScheduler>,
    ) -> impl Future<Output = HalResult<Self::Hal>> + Send;
}
