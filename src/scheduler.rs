use crate::config::SensorConfig;
use crate::config::sensor_config::DEFAULT_FREQUENCY_HZ;
use crate::messages::{Header, ReadingMessage};
use crate::sensors::SensorDriver;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

/// Spawn one polling task per sensor. Each task owns its driver, sends every
/// successful reading to `out`, and closes the driver once `shutdown` flips.
///
/// Reads block on the bus, so the tasks need the multi-thread runtime.
pub fn spawn_sensor_tasks(
    sensors: Vec<Box<dyn SensorDriver>>,
    sensor_config: &SensorConfig,
    out: mpsc::UnboundedSender<ReadingMessage>,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    let mut handles = Vec::with_capacity(sensors.len());

    for mut sensor in sensors.into_iter() {
        let sensor_id = sensor.id().to_string();
        let bus = sensor.bus().to_string();

        let frequency = sensor_config
            .sensors
            .iter()
            .find(|s| s.id == sensor_id)
            .map(|s| s.frequency())
            .unwrap_or(DEFAULT_FREQUENCY_HZ)
            .max(1);
        let period = Duration::from_secs_f64(1.0 / f64::from(frequency));
        let out = out.clone();
        let mut shutdown = shutdown.clone();

        handles.push(tokio::spawn(async move {
            info!("[{}] starting sensor task at {}Hz", sensor_id, frequency);
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut seq = 0u64;

            loop {
                tokio::select! {
                    _ = shutdown.changed() => break,
                    _ = ticker.tick() => {}
                }

                match tokio::task::block_in_place(|| sensor.read()) {
                    Ok(reading) => {
                        seq += 1;
                        let header = Header::new(sensor_id.clone(), bus.clone(), seq);
                        if out.send(ReadingMessage::new(header, reading)).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("[{}] sensor read error: {}", sensor_id, e);
                    }
                }
            }

            sensor.close();
            info!("[{}] sensor task stopped", sensor_id);
        }));
    }

    handles
}
