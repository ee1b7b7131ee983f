//! GATT connection and handle resolution.
//!
//! Connects to a discovered vehicle and resolves the control service plus
//! both configured characteristics. Everything resolved here is handed to
//! the session as a value; any failure leaves no partial state behind.

use crate::infrastructure::bluetooth::error::LinkError;
use crate::infrastructure::bluetooth::protocol::LinkOptions;
use tracing::{info, warn};
use windows::Devices::Bluetooth::BluetoothLEDevice;
use windows::Devices::Bluetooth::GenericAttributeProfile::{
    GattCharacteristic, GattCommunicationStatus, GattSession,
};

/// Handles produced by a successful connection attempt.
pub struct ConnectionResult {
    pub device: BluetoothLEDevice,
    /// Keeps the OS from dropping the link between writes. Optional: the
    /// session still works without it, just less reliably.
    pub gatt_session: Option<GattSession>,
    /// Resolved but never written; the firmware publishes sensor data here.
    pub telemetry_characteristic: GattCharacteristic,
    /// Sink for every control frame.
    pub control_characteristic: GattCharacteristic,
}

/// Connect to the vehicle at `address` and resolve all session handles.
pub async fn establish(address: u64, options: &LinkOptions) -> Result<ConnectionResult, LinkError> {
    info!("Connecting to vehicle at {:#X}", address);

    let device = BluetoothLEDevice::FromBluetoothAddressAsync(address)
        .map_err(LinkError::ConnectFailed)?
        .await
        .map_err(LinkError::ConnectFailed)?;
    info!("Device connected: {:?}", device.Name().unwrap_or_default());

    let gatt_session = match maintain_connection(&device).await {
        Ok(session) => Some(session),
        Err(e) => {
            warn!("Could not create GattSession ({e}), continuing without MaintainConnection");
            None
        }
    };

    let (telemetry, control) = resolve_characteristics(&device, options).await?;

    Ok(ConnectionResult {
        device,
        gatt_session,
        telemetry_characteristic: telemetry,
        control_characteristic: control,
    })
}

/// Ask the stack to keep the BLE connection alive between writes.
async fn maintain_connection(device: &BluetoothLEDevice) -> windows::core::Result<GattSession> {
    let device_id = device.BluetoothDeviceId()?;
    let session = GattSession::FromDeviceIdAsync(&device_id)?.await?;
    session.SetMaintainConnection(true)?;
    Ok(session)
}

async fn resolve_characteristics(
    device: &BluetoothLEDevice,
    options: &LinkOptions,
) -> Result<(GattCharacteristic, GattCharacteristic), LinkError> {
    let services_result = device
        .GetGattServicesForUuidAsync(options.service_uuid)
        .map_err(resolution)?
        .await
        .map_err(resolution)?;

    let status = services_result.Status().map_err(resolution)?;
    if status != GattCommunicationStatus::Success {
        return Err(LinkError::ResolutionFailed(format!(
            "GATT service query returned {status:?}"
        )));
    }

    let services = services_result.Services().map_err(resolution)?;
    if services.Size().map_err(resolution)? == 0 {
        return Err(LinkError::ResolutionFailed(
            "control service not found".to_string(),
        ));
    }
    let service = services.GetAt(0).map_err(resolution)?;
    info!("Found control service");

    let access = service
        .RequestAccessAsync()
        .map_err(resolution)?
        .await
        .map_err(resolution)?;
    info!("Service access status: {:?}", access);

    let chars_result = service
        .GetCharacteristicsAsync()
        .map_err(resolution)?
        .await
        .map_err(resolution)?;
    let status = chars_result.Status().map_err(resolution)?;
    if status != GattCommunicationStatus::Success {
        return Err(LinkError::ResolutionFailed(format!(
            "characteristic query returned {status:?}"
        )));
    }

    let characteristics = chars_result.Characteristics().map_err(resolution)?;
    info!(
        "Found {} characteristics",
        characteristics.Size().map_err(resolution)?
    );

    let mut telemetry = None;
    let mut control = None;
    for i in 0..characteristics.Size().map_err(resolution)? {
        let c = characteristics.GetAt(i).map_err(resolution)?;
        let uuid = c.Uuid().map_err(resolution)?;

        if uuid == options.telemetry_char_uuid {
            telemetry = Some(c);
        } else if uuid == options.control_char_uuid {
            control = Some(c);
        }
    }

    let telemetry = telemetry.ok_or_else(|| {
        LinkError::ResolutionFailed("telemetry characteristic not found".to_string())
    })?;
    let control = control.ok_or_else(|| {
        LinkError::ResolutionFailed("control characteristic not found".to_string())
    })?;

    Ok((telemetry, control))
}

fn resolution(e: windows::core::Error) -> LinkError {
    LinkError::ResolutionFailed(e.to_string())
}
