use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use futures::StreamExt;
use log::{debug, error, info, warn};
use tokio::spawn;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use zbus::{proxy, Connection};
use zbus::zvariant::OwnedObjectPath;

use crate::discovery::constants::{adapter_path, device_path};
use crate::discovery::properties::{devices_from_interfaces, InterfaceMap};
use crate::dispatch::Dispatcher;
use crate::error::DiscoveryError;
use crate::events::PanelEvent;

#[proxy(interface = "org.bluez.Adapter1", default_service = "org.bluez", gen_blocking = false)]
trait Adapter {
    fn start_discovery(&self) -> zbus::Result<()>;
}

#[proxy(interface = "org.bluez.Device1", default_service = "org.bluez", gen_blocking = false)]
trait Device {
    fn pair(&self) -> zbus::Result<()>;
}

#[proxy(
    interface = "org.freedesktop.DBus.ObjectManager",
    default_service = "org.bluez",
    default_path = "/",
    gen_blocking = false
)]
trait BluezObjectManager {
    #[zbus(signal)]
    fn interfaces_added(
        &self,
        object_path: OwnedObjectPath,
        interfaces_and_properties: InterfaceMap,
    ) -> zbus::Result<()>;
}

/// Posts every device found in one `InterfacesAdded` payload and returns how many were posted.
pub fn publish_interfaces(dispatcher: &Dispatcher<PanelEvent>, object_path: &str, interfaces: &InterfaceMap) -> usize {
    let devices = devices_from_interfaces(interfaces);
    let count = devices.len();

    for device in devices {
        info!("Device found -> {} [{}] at {}", device.display_name, device.address, object_path);
        dispatcher.post(PanelEvent::DeviceDiscovered(device));
    }

    count
}

fn listen_task(
    cancel: CancellationToken,
    connection: Connection,
    dispatcher: Dispatcher<PanelEvent>,
    subscription_active: Arc<AtomicBool>,
) -> JoinHandle<Result<(), DiscoveryError>> {
    spawn(async move {
        let object_manager = BluezObjectManagerProxy::new(&connection).await?;
        let mut signals = object_manager.receive_interfaces_added().await?;
        subscription_active.store(true, Ordering::SeqCst);
        info!("Listening for new bluetooth devices");

        'mainloop: loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    break 'mainloop;
                },
                signal = signals.next() => match signal {
                    None => {
                        warn!("InterfacesAdded stream ended");
                        break 'mainloop;
                    },
                    Some(signal) => match signal.args() {
                        Err(err) => warn!("Failed to decode InterfacesAdded payload: {}", err),
                        Ok(args) => {
                            publish_interfaces(
                                &dispatcher,
                                args.object_path().as_str(),
                                args.interfaces_and_properties(),
                            );
                        },
                    },
                },
            }
        }

        subscription_active.store(false, Ordering::SeqCst);
        Ok(())
    })
}

/// Talks to BlueZ over the system bus.
///
/// A client whose connection failed stays disabled: every command on it is a no-op.
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    connection: Option<Connection>,
    adapter: String,
    dispatcher: Dispatcher<PanelEvent>,
    subscription_active: Arc<AtomicBool>,
}

impl DiscoveryClient {
    pub async fn connect(adapter: &str, dispatcher: Dispatcher<PanelEvent>, cancel: CancellationToken) -> DiscoveryClient {
        let connection = Connection::system().await.map_err(DiscoveryError::from);
        DiscoveryClient::from_connection(connection, adapter, dispatcher, cancel)
    }

    /// Starts listening for devices if `connection` holds a bus connection. Must be called from
    /// within a tokio runtime.
    pub fn from_connection(
        connection: Result<Connection, DiscoveryError>,
        adapter: &str,
        dispatcher: Dispatcher<PanelEvent>,
        cancel: CancellationToken,
    ) -> DiscoveryClient {
        let subscription_active = Arc::new(AtomicBool::new(false));

        let connection = match connection {
            Ok(connection) => {
                info!("Connected to system bus, using adapter {}", adapter);
                let handle = listen_task(cancel, connection.clone(), dispatcher.clone(), subscription_active.clone());
                spawn(async move {
                    match handle.await {
                        Ok(Ok(())) => debug!("Device listener stopped"),
                        Ok(Err(err)) => error!("Device listener failed: {}", err),
                        Err(err) => error!("Failed to join device listener: {}", err),
                    }
                });
                Some(connection)
            },
            Err(err) => {
                error!("{}; bluetooth stays disabled", err);
                None
            },
        };

        DiscoveryClient {
            connection,
            adapter: adapter.to_string(),
            dispatcher,
            subscription_active,
        }
    }

    pub fn disabled(adapter: &str, dispatcher: Dispatcher<PanelEvent>) -> DiscoveryClient {
        DiscoveryClient {
            connection: None,
            adapter: adapter.to_string(),
            dispatcher,
            subscription_active: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.connection.is_some()
    }

    pub fn is_listening(&self) -> bool {
        self.subscription_active.load(Ordering::SeqCst)
    }

    /// Asks the adapter to start scanning. The call completes in the background; the returned
    /// handle is None if the client is disabled.
    pub fn start_discovery(&self) -> Option<JoinHandle<Result<(), DiscoveryError>>> {
        let connection = self.connection.clone()?;
        let path = adapter_path(&self.adapter);
        info!("Sending StartDiscovery to {}", path);

        Some(spawn(async move {
            let result = call_start_discovery(&connection, &path).await;
            match &result {
                Ok(()) => info!("Bluetooth scan running"),
                Err(err) => warn!("{}", err),
            }
            result
        }))
    }

    /// Pairs with `address`. Connecting afterwards is left to the platform's auto-connect.
    pub fn pair(&self, address: &str) -> Option<JoinHandle<Result<(), DiscoveryError>>> {
        let connection = self.connection.clone()?;
        let path = device_path(&self.adapter, address);
        let address = address.to_string();
        let dispatcher = self.dispatcher.clone();
        info!("Sending Pair to {}", path);

        Some(spawn(async move {
            let result = call_pair(&connection, &path).await;
            match &result {
                Ok(()) => info!("Pairing with {} succeeded", address),
                Err(err) => warn!("{}", err),
            }
            dispatcher.post(PanelEvent::PairingFinished { address, success: result.is_ok() });
            result
        }))
    }
}

async fn call_start_discovery(connection: &Connection, path: &str) -> Result<(), DiscoveryError> {
    let remote_call_failed = |source| DiscoveryError::RemoteCallFailed {
        method: "StartDiscovery",
        path: path.to_string(),
        source,
    };

    let adapter = AdapterProxy::builder(connection)
        .path(path)
        .map_err(remote_call_failed)?
        .build()
        .await
        .map_err(remote_call_failed)?;

    adapter.start_discovery().await.map_err(remote_call_failed)
}

async fn call_pair(connection: &Connection, path: &str) -> Result<(), DiscoveryError> {
    let remote_call_failed = |source| DiscoveryError::RemoteCallFailed {
        method: "Pair",
        path: path.to_string(),
        source,
    };

    let device = DeviceProxy::builder(connection)
        .path(path)
        .map_err(remote_call_failed)?
        .build()
        .await
        .map_err(remote_call_failed)?;

    device.pair().await.map_err(remote_call_failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zbus::zvariant::{OwnedValue, Value};
    use crate::discovery::constants::DEVICE_INTERFACE;
    use crate::discovery::properties::PropertyMap;
    use crate::discovery::types::DiscoveredDevice;
    use crate::dispatch::dispatch_channel;

    #[test]
    fn one_device_is_posted_per_device_entry() {
        let (dispatcher, mut queue) = dispatch_channel();

        let mut device = PropertyMap::new();
        device.insert("Address".to_string(), OwnedValue::try_from(Value::from("AA:BB:CC:DD:EE:FF")).unwrap());
        device.insert("Name".to_string(), OwnedValue::try_from(Value::from("Flip")).unwrap());
        device.insert("Alias".to_string(), OwnedValue::try_from(Value::from("Speaker")).unwrap());

        let mut interfaces = InterfaceMap::new();
        interfaces.insert("org.freedesktop.DBus.Properties".to_string(), PropertyMap::new());
        interfaces.insert(DEVICE_INTERFACE.to_string(), device);

        let posted = publish_interfaces(&dispatcher, "/org/bluez/hci0/dev_AA_BB_CC_DD_EE_FF", &interfaces);
        assert_eq!(posted, 1);

        let mut events = Vec::new();
        queue.run_pending(|event| events.push(event));
        assert_eq!(events, vec![PanelEvent::DeviceDiscovered(DiscoveredDevice {
            address: "AA:BB:CC:DD:EE:FF".to_string(),
            display_name: "Speaker".to_string(),
            paired: false,
            connected: false,
        })]);
    }

    #[tokio::test]
    async fn commands_are_noops_when_the_bus_is_unavailable() {
        let (dispatcher, mut queue) = dispatch_channel();
        let failure = Err(DiscoveryError::TransportUnavailable {
            source: zbus::Error::Failure("no system bus".to_string()),
        });

        let client = DiscoveryClient::from_connection(failure, "hci0", dispatcher, CancellationToken::new());

        assert!(!client.is_enabled());
        assert!(!client.is_listening());
        assert!(client.start_discovery().is_none());
        assert!(client.pair("AA:BB:CC:DD:EE:FF").is_none());
        assert_eq!(queue.run_pending(|_| {}), 0);
    }

    #[test]
    fn disabled_client_ignores_commands() {
        let (dispatcher, _queue) = dispatch_channel();
        let client = DiscoveryClient::disabled("hci0", dispatcher);

        assert!(client.start_discovery().is_none());
        assert!(client.pair("00:11:22:33:44:55").is_none());
    }
}
