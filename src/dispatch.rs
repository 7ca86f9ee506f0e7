//! Batched light state writes.

use std::sync::Arc;

use futures::future::join_all;
use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::color::convert;
use crate::errors::{Error, TransportError};
use crate::light::Light;
use crate::transport::BridgeTransport;
use crate::types::{DeviceColor, Rgba};

type Result<T> = std::result::Result<T, Error>;

/// A light whose write failed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct LightFailure {
    pub light_id: String,
    pub error: TransportError,
}

impl LightFailure {
    /// The failure as an [`Error::LightWriteFailed`].
    pub fn to_error(&self) -> Error {
        Error::light_write_failed(&self.light_id, self.error.clone())
    }
}

/// Aggregated result of one batch of writes.
///
/// Writes are fire-and-collect: a success means the transport accepted the
/// write, not that the bridge state was verified afterwards.
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct BatchResult {
    /// Lights written successfully
    pub succeeded: usize,
    /// Lights left untouched because they are off
    pub skipped: usize,
    pub failed: Vec<LightFailure>,
}

impl BatchResult {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Errors for every failed light.
    pub fn errors(&self) -> Vec<Error> {
        self.failed.iter().map(LightFailure::to_error).collect()
    }
}

/// Issues one independent write per light that is on.
pub struct LightDispatcher<T> {
    transport: Arc<T>,
}

impl<T: BridgeTransport> LightDispatcher<T> {
    pub(crate) fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Give every light that is on a random, fully saturated hue.
    ///
    /// # Errors
    ///
    /// Only reading the light set can fail the batch; individual write
    /// failures are reported in [`BatchResult::failed`].
    pub async fn randomize_all(&self) -> Result<BatchResult> {
        let lights = self.transport.list_lights().await?;
        let writes = plan_random(&lights, &mut rand::rng());
        Ok(self.dispatch(writes, lights.len()).await)
    }

    /// Set every light that is on to the same application color.
    ///
    /// # Errors
    ///
    /// [`Error::UnrepresentableColor`] before any I/O if the color has no
    /// hue, or a transport error if the light set cannot be read.
    pub async fn set_all(&self, color: &Rgba) -> Result<BatchResult> {
        let color = convert(color)?;
        let lights = self.transport.list_lights().await?;
        let writes = lights
            .iter()
            .filter(|light| light.is_on())
            .map(|light| (light.id().to_string(), color))
            .collect();
        Ok(self.dispatch(writes, lights.len()).await)
    }

    /// Run all writes concurrently and aggregate once every one has finished.
    async fn dispatch(&self, writes: Vec<(String, DeviceColor)>, total: usize) -> BatchResult {
        let skipped = total - writes.len();
        debug!("Writing {} light(s), {} off", writes.len(), skipped);

        let results = join_all(writes.iter().map(|(id, color)| async move {
            (id, self.transport.set_light_state(id, color).await)
        }))
        .await;

        let mut batch = BatchResult {
            skipped,
            ..Default::default()
        };
        for (id, result) in results {
            match result {
                Ok(()) => batch.succeeded += 1,
                Err(e) => {
                    warn!("Error changing light {}: {}", id, e);
                    batch.failed.push(LightFailure {
                        light_id: id.clone(),
                        error: e,
                    });
                }
            }
        }

        info!(
            "Light batch done: {} succeeded, {} failed, {} skipped",
            batch.succeeded,
            batch.failed.len(),
            batch.skipped
        );
        batch
    }
}

/// A random vivid color for each light that is on; off lights are left out.
fn plan_random<R: Rng>(lights: &[Light], rng: &mut R) -> Vec<(String, DeviceColor)> {
    lights
        .iter()
        .filter(|light| light.is_on())
        .map(|light| {
            let hue = rng.random_range(0..DeviceColor::MAX_HUE);
            (light.id().to_string(), DeviceColor::vivid(hue))
        })
        .collect()
}
