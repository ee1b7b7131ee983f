//! BLE device discovery.
//!
//! Watches advertisements until one matches a configured name prefix.
//! Among several matching vehicles the radio's own event order decides;
//! this layer does no secondary tie-breaking.

use crate::infrastructure::bluetooth::error::LinkError;
use crate::infrastructure::bluetooth::protocol::{self, LinkOptions};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use windows::Devices::Bluetooth::Advertisement::{
    BluetoothLEAdvertisementReceivedEventArgs, BluetoothLEAdvertisementWatcher,
    BluetoothLEAdvertisementWatcherStoppedEventArgs, BluetoothLEScanningMode,
};
use windows::Devices::Bluetooth::BluetoothError;
use windows::Foundation::TypedEventHandler;

/// A vehicle advertisement that passed the name-prefix filter.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
    pub name: String,
    pub address: u64,
    pub signal_strength: i16,
}

enum ScanSignal {
    Found(DiscoveredDevice),
    Aborted,
}

/// Advertisement watcher wrapper. The watcher is stopped as soon as a
/// match arrives, or by `Drop` if discovery is abandoned.
pub struct DeviceScanner {
    watcher: Option<BluetoothLEAdvertisementWatcher>,
}

impl DeviceScanner {
    pub fn new() -> Self {
        Self { watcher: None }
    }

    /// Scan until the first advertisement matching a configured name
    /// prefix arrives.
    ///
    /// Resolves with `DeviceUnavailable` when the radio cannot scan or
    /// stops the scan on its own before any match.
    pub async fn discover(&mut self, options: &LinkOptions) -> Result<DiscoveredDevice, LinkError> {
        self.stop();

        info!(
            "Starting BLE discovery, accepted name prefixes: {:?}",
            options.device_name_prefixes
        );

        let watcher = BluetoothLEAdvertisementWatcher::new().map_err(scan_unavailable)?;
        watcher
            .SetScanningMode(BluetoothLEScanningMode::Active)
            .map_err(scan_unavailable)?;

        let (tx, mut rx) = mpsc::unbounded_channel();

        let found_tx = tx.clone();
        let prefixes = options.device_name_prefixes.clone();
        let received = TypedEventHandler::new(
            move |_: windows::core::Ref<BluetoothLEAdvertisementWatcher>,
                  args: windows::core::Ref<BluetoothLEAdvertisementReceivedEventArgs>| {
                if let Some(args) = args.as_ref() {
                    let name = args.Advertisement()?.LocalName()?.to_string();
                    if protocol::matches_name_prefix(&name, &prefixes) {
                        let _ = found_tx.send(ScanSignal::Found(DiscoveredDevice {
                            name,
                            address: args.BluetoothAddress()?,
                            signal_strength: args.RawSignalStrengthInDBm()?,
                        }));
                    }
                }
                Ok(())
            },
        );
        watcher.Received(&received).map_err(scan_unavailable)?;

        let stopped = TypedEventHandler::new(
            move |_: windows::core::Ref<BluetoothLEAdvertisementWatcher>,
                  args: windows::core::Ref<BluetoothLEAdvertisementWatcherStoppedEventArgs>| {
                if let Some(args) = args.as_ref() {
                    let error = args.Error()?;
                    if error != BluetoothError::Success {
                        warn!("BLE scan stopped by the radio: {:?}", error);
                    }
                }
                let _ = tx.send(ScanSignal::Aborted);
                Ok(())
            },
        );
        watcher.Stopped(&stopped).map_err(scan_unavailable)?;

        watcher.Start().map_err(scan_unavailable)?;
        self.watcher = Some(watcher);

        let outcome = rx.recv().await;
        self.stop();

        match outcome {
            Some(ScanSignal::Found(device)) => {
                info!(
                    "Discovered vehicle {:?} at {:#X} ({} dBm)",
                    device.name, device.address, device.signal_strength
                );
                Ok(device)
            }
            Some(ScanSignal::Aborted) | None => Err(LinkError::DeviceUnavailable),
        }
    }

    /// Stop any running scan.
    pub fn stop(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            let _ = watcher.Stop();
        }
    }
}

impl Drop for DeviceScanner {
    fn drop(&mut self) {
        self.stop();
    }
}

fn scan_unavailable(e: windows::core::Error) -> LinkError {
    error!("BLE advertisement watcher error: {e}");
    LinkError::DeviceUnavailable
}
