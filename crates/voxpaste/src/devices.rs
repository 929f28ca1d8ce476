//! Audio input device enumeration, selection, and persistence.

use crate::{
    AppResult,
    platform::{AudioCapture, SettingsStore},
    store::lock_unpoisoned,
};

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{info, instrument, warn};

/// An input device as shown in menus. `id == None` is the system default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioDeviceDescriptor {
    /// Persisted selection key; `None` for the system default entry.
    pub id: Option<String>,
    /// Human-readable name.
    pub name: String,
}

/// Selects the capture device and keeps the choice persisted.
pub struct DeviceSelector<A, S> {
    audio: Arc<AsyncMutex<A>>,
    store: Arc<Mutex<S>>,
}

impl<A, S> DeviceSelector<A, S>
where
    A: AudioCapture,
    S: SettingsStore,
{
    pub fn new(audio: Arc<AsyncMutex<A>>, store: Arc<Mutex<S>>) -> Self {
        Self { audio, store }
    }

    /// Current device enumeration.
    pub async fn list_devices(&self) -> Vec<AudioDeviceDescriptor> {
        self.audio.lock().await.list_input_devices()
    }

    /// Select a device (`None` = system default) and persist the choice.
    #[instrument(skip(self))]
    pub async fn select_device(&self, device_id: Option<&str>) -> AppResult<()> {
        self.audio.lock().await.set_input_device(device_id)?;

        if let Err(e) = lock_unpoisoned(&self.store).save_selected_device(device_id) {
            warn!(error = ?e, "Failed to persist device selection");
        }

        info!(device = ?device_id, "Input device selected");
        Ok(())
    }

    /// Re-apply a persisted selection at startup. The id is applied only
    /// when it is present in the current enumeration; otherwise the
    /// system default is used silently.
    #[instrument(skip(self))]
    pub async fn restore(&self, persisted: Option<&str>) {
        let Some(wanted) = persisted else {
            return;
        };

        let known = {
            let audio = self.audio.lock().await;
            audio
                .list_input_devices()
                .iter()
                .any(|d| d.id.as_deref() == Some(wanted))
        };

        if !known {
            info!(device = wanted, "Persisted device absent, using default");
            return;
        }

        if let Err(e) = self.audio.lock().await.set_input_device(Some(wanted)) {
            warn!(error = ?e, device = wanted, "Failed to restore device selection");
        } else {
            info!(device = wanted, "Restored persisted input device");
        }
    }
}
