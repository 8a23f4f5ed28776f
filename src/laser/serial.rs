//! `serialport` transport for [`LaserLink`].

use super::{LaserError, LaserLink};
use crate::config::LaserConfig;
use serialport::SerialPort;

/// Opens the configured port and waits for the controller to settle.
pub fn open_serial(config: &LaserConfig) -> Result<LaserLink<Box<dyn SerialPort>>, LaserError> {
    let port = serialport::new(config.port.as_str(), config.baud_rate)
        .timeout(config.timeout())
        .open()
        .map_err(|e| LaserError::Open {
            port: config.port.clone(),
            reason: e.to_string(),
        })?;

    tracing::info!(
        port = %config.port,
        baud = config.baud_rate,
        "Laser serial port opened"
    );
    std::thread::sleep(config.settle());

    Ok(LaserLink::new(port, config.timeout()))
}
