use i2c_sensor_drivers::{init_all, init_tracing, load_sensor_config, spawn_sensor_tasks};
use tokio::sync::{mpsc, watch};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    info!("[sensor-poll] starting up...");

    // Load configuration from CONFIG_PATH or default
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config".to_string());
    let sensor_config_path = format!("{}/sensors.toml", config_path);
    let sensor_config = load_sensor_config(&sensor_config_path)?;
    info!("[config] {} sensor(s) from {}", sensor_config.sensors.len(), sensor_config_path);

    let sensors = init_all(&sensor_config)?;
    info!("[registry] {} sensor(s) ready", sensors.len());

    let (tx, mut rx) = mpsc::unbounded_channel();
    let (stop_tx, stop_rx) = watch::channel(false);
    let handles = spawn_sensor_tasks(sensors, &sensor_config, tx, stop_rx);
    info!("[main] sensor tasks launched");

    loop {
        tokio::select! {
            msg = rx.recv() => match msg {
                Some(msg) => match msg.to_json() {
                    Ok(line) => println!("{}", line),
                    Err(e) => error!("[main] failed to encode reading: {}", e),
                },
                None => break,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("[main] shutting down");
                break;
            }
        }
    }

    let _ = stop_tx.send(true);
    for handle in handles {
        if let Err(e) = handle.await {
            error!("[main] sensor task failed: {}", e);
        }
    }
    Ok(())
}
