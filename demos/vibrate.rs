//! Drive a remote vibrator HAL from the command line.
//!
//! ```text
//! cargo run --example vibrate -- ws://127.0.0.1:8780
//! cargo run --example vibrate -- --config hal.json
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use vibrator_hal::{
    CompositeEffect, CompositePrimitive, ConnectorConfig, Effect, EffectStrength, HalError,
    RemoteHalConnector, RemoteHalController,
};

fn load_config() -> Result<ConnectorConfig, Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match args.as_slice() {
        [flag, path] if flag == "--config" => ConnectorConfig::from_file(path)?,
        [url] => ConnectorConfig::new(url.clone()),
        _ => ConnectorConfig::default(),
    };
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = load_config()?;
    println!("Using vibrator HAL at {}", config.url);
    let controller = RemoteHalController::new(RemoteHalConnector::new(config)?);

    if !controller.init().await {
        println!("HAL not reachable yet, calls will keep trying to connect");
    }

    match controller.get_capabilities().await {
        Ok(capabilities) => println!("Capabilities: {:?}", capabilities),
        Err(e) => println!("Capabilities unavailable: {}", e),
    }

    match controller.get_supported_effects().await {
        Ok(effects) => println!("Supported effects: {:?}", effects),
        Err(HalError::Unsupported) => println!("Effect list not supported"),
        Err(e) => println!("Effect list unavailable: {}", e),
    }

    let done = Arc::new(Notify::new());
    let notify = done.clone();
    let duration = controller
        .perform_effect(
            Effect::Click,
            EffectStrength::Strong,
            Arc::new(move || notify.notify_one()),
        )
        .await?;
    println!("Click playing for {:?}", duration);
    done.notified().await;
    println!("Click finished");

    let primitives = [
        CompositeEffect::new(0, CompositePrimitive::QuickRise, 0.8),
        CompositeEffect::new(50, CompositePrimitive::Click, 1.0),
    ];
    match controller
        .perform_composed_effect(&primitives, Arc::new(|| println!("Composition finished")))
        .await
    {
        Ok(duration) => {
            println!("Composition playing for {:?}", duration);
            tokio::time::sleep(duration + Duration::from_millis(10)).await;
        }
        Err(e) => println!("Composition failed: {}", e),
    }

    controller.off().await?;
    Ok(())
}
