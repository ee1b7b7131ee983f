//! Link manager.
//!
//! Owns the lifecycle of exactly one wireless session. All methods run on
//! the link worker's single-threaded command loop, so state transitions
//! never interleave and frames go out in the order their input updates
//! were produced. Failures surface as [`LinkError`]; nothing is retried,
//! a failed frame is simply superseded by the next input-driven send.

use crate::domain::models::{
    AppEvent, ControlRecord, LinkCommand, LinkState, MessageSeverity, StatusMessage,
};
use crate::infrastructure::bluetooth::connection::{self, ConnectionResult};
use crate::infrastructure::bluetooth::error::LinkError;
use crate::infrastructure::bluetooth::protocol::{self, LinkOptions};
use crate::infrastructure::bluetooth::scanner::DeviceScanner;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};
use windows::Devices::Bluetooth::GenericAttributeProfile::{
    GattCharacteristic, GattCommunicationStatus, GattSession,
};
use windows::Devices::Bluetooth::{BluetoothConnectionStatus, BluetoothLEDevice};
use windows::Foundation::TypedEventHandler;
use windows::Storage::Streams::DataWriter;

/// Resolved handles for one live session. Dropped as a unit on disconnect
/// or on any failed attempt, so stale handles can never survive.
struct LinkSession {
    device: BluetoothLEDevice,
    _gatt_session: Option<GattSession>,
    control_characteristic: GattCharacteristic,
    /// Reserved. The firmware declares it and the session resolves it, but
    /// no write ever targets it.
    _telemetry_characteristic: GattCharacteristic,
}

pub struct LinkManager {
    options: LinkOptions,
    state: LinkState,
    session: Option<LinkSession>,
    scanner: DeviceScanner,
    event_sender: mpsc::UnboundedSender<AppEvent>,
    /// Feeds transport-reported loss back into the command loop.
    command_sender: mpsc::UnboundedSender<LinkCommand>,
}

impl LinkManager {
    pub fn new(
        options: LinkOptions,
        event_sender: mpsc::UnboundedSender<AppEvent>,
        command_sender: mpsc::UnboundedSender<LinkCommand>,
    ) -> Self {
        Self {
            options,
            state: LinkState::Disconnected,
            session: None,
            scanner: DeviceScanner::new(),
            event_sender,
            command_sender,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == LinkState::Connected
    }

    /// Discover, connect and resolve handles. A no-op when already
    /// connected. Any failure runs the same teardown the explicit
    /// disconnect uses before the error is returned, so a failed attempt
    /// always lands back in a clean `Disconnected` state.
    pub async fn connect(&mut self) -> Result<(), LinkError> {
        if self.state == LinkState::Connected {
            debug!("connect requested while already connected, ignoring");
            return Ok(());
        }

        match self.establish().await {
            Ok(result) => {
                self.watch_connection(&result.device);
                self.session = Some(LinkSession {
                    device: result.device,
                    _gatt_session: result.gatt_session,
                    control_characteristic: result.control_characteristic,
                    _telemetry_characteristic: result.telemetry_characteristic,
                });
                self.set_state(LinkState::Connected);
                self.send_log("Connected to vehicle", MessageSeverity::Success);
                Ok(())
            }
            Err(e) => {
                self.teardown();
                Err(e)
            }
        }
    }

    async fn establish(&mut self) -> Result<ConnectionResult, LinkError> {
        self.set_state(LinkState::Discovering);
        let found = self.scanner.discover(&self.options).await?;

        self.set_state(LinkState::Connecting);
        connection::establish(found.address, &self.options).await
    }

    /// Release the session and all resolved handles. A no-op when already
    /// disconnected.
    pub fn disconnect(&mut self) {
        if self.state == LinkState::Disconnected {
            return;
        }
        info!("Disconnecting from vehicle");
        self.teardown();
        self.send_log("Disconnected", MessageSeverity::Info);
    }

    /// Encode the record and write it to the control characteristic as a
    /// single atomic write. Only meaningful while connected; the session
    /// stays `Connected` on a failed write.
    pub async fn send(&mut self, record: &ControlRecord) -> Result<(), LinkError> {
        let session = match (&self.state, &self.session) {
            (LinkState::Connected, Some(session)) => session,
            _ => return Err(LinkError::NotConnected),
        };

        let payload = protocol::encode_frame(record)
            .map_err(|e| LinkError::SendFailed(format!("frame encoding failed: {e}")))?;

        let writer = DataWriter::new().map_err(send_failure)?;
        writer.WriteBytes(&payload).map_err(send_failure)?;
        let buffer = writer.DetachBuffer().map_err(send_failure)?;

        let status = session
            .control_characteristic
            .WriteValueAsync(&buffer)
            .map_err(send_failure)?
            .await
            .map_err(send_failure)?;

        if status != GattCommunicationStatus::Success {
            return Err(LinkError::SendFailed(format!("write returned {status:?}")));
        }

        trace!("Sent control frame: {:?}", record);
        Ok(())
    }

    /// Called by the command loop when the transport reported loss on its
    /// own. Ignored outside `Connected` (a teardown-triggered status
    /// change would otherwise loop back here).
    pub fn handle_connection_lost(&mut self) {
        if !self.is_connected() {
            return;
        }
        warn!("Transport reported connection loss");
        self.teardown();
        self.send_log("Link lost", MessageSeverity::Warning);
    }

    /// The single cleanup path: stop any scan, close the device, drop all
    /// resolved handles, land in `Disconnected`.
    fn teardown(&mut self) {
        self.scanner.stop();
        if let Some(session) = self.session.take() {
            let _ = session.device.Close();
        }
        self.set_state(LinkState::Disconnected);
    }

    /// Forward transport-side connection loss into the command loop.
    fn watch_connection(&self, device: &BluetoothLEDevice) {
        let tx = self.command_sender.clone();
        let handler = TypedEventHandler::new(
            move |dev: windows::core::Ref<BluetoothLEDevice>, _| {
                if let Some(dev) = dev.as_ref() {
                    if let Ok(status) = dev.ConnectionStatus() {
                        if status == BluetoothConnectionStatus::Disconnected {
                            let _ = tx.send(LinkCommand::ConnectionLost);
                        }
                    }
                }
                Ok(())
            },
        );
        if let Err(e) = device.ConnectionStatusChanged(&handler) {
            warn!("Could not watch connection status: {e}");
        }
    }

    fn set_state(&mut self, state: LinkState) {
        if self.state == state {
            return;
        }
        debug!("Link state: {:?} -> {:?}", self.state, state);
        self.state = state;
        let _ = self
            .event_sender
            .send(AppEvent::ConnectionStatus(state));
    }

    fn send_log(&self, message: &str, severity: MessageSeverity) {
        let _ = self.event_sender.send(AppEvent::LogMessage(StatusMessage {
            message: message.to_string(),
            severity,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::LinkSettings;

    fn manager() -> (LinkManager, mpsc::UnboundedReceiver<AppEvent>) {
        let options = LinkOptions::from_settings(&LinkSettings::default()).unwrap();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (command_tx, _command_rx) = mpsc::unbounded_channel();
        (LinkManager::new(options, event_tx, command_tx), event_rx)
    }

    #[tokio::test]
    async fn send_before_any_connect_fails_with_not_connected() {
        let (mut link, _events) = manager();
        let result = link.send(&ControlRecord::neutral()).await;
        assert!(matches!(result, Err(LinkError::NotConnected)));
        assert_eq!(link.state(), LinkState::Disconnected);
    }

    #[test]
    fn disconnect_while_disconnected_is_a_noop() {
        let (mut link, mut events) = manager();
        link.disconnect();
        link.disconnect();
        assert_eq!(link.state(), LinkState::Disconnected);
        // No status churn was emitted.
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn stale_connection_loss_outside_connected_is_ignored() {
        let (mut link, mut events) = manager();
        link.handle_connection_lost();
        assert_eq!(link.state(), LinkState::Disconnected);
        assert!(events.try_recv().is_err());
    }
}
