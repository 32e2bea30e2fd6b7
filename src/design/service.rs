//! Client for the external coastal-engineering calculation service.
//!
//! Wave statistics, stability formulas and plotting all live behind this
//! seam. The HTTP implementation talks JSON to the service; tests use an
//! in-process fake.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::models::{DesignRequest, Slope, WaveHeights};

/// Exceedance probability of the wave height reported by
/// [`EngineeringService::exceedance_height`].
pub const EXCEEDANCE_PROBABILITY: f64 = 0.02;

/// Plot and describe every cross-section of a design.
pub const SCOPE_ALL: &str = "all";
/// Only report log entries at warning level or above.
pub const LEVEL_WARNINGS: &str = "warnings";

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("engineering service unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("engineering service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected engineering service response: {0}")]
    InvalidResponse(String),
}

/// Reference to a design computed and held by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignHandle {
    pub id: String,
}

#[async_trait]
pub trait EngineeringService: Send + Sync {
    /// Wave height exceeded by 2% of the waves (Battjes-Groenendijk) at the toe.
    async fn exceedance_height(
        &self,
        hm0: f64,
        h: f64,
        slope_foreshore: Slope,
    ) -> Result<f64, ServiceError>;

    /// Design wave heights in front of a vertical wall (Goda).
    async fn waves_at_structure(
        &self,
        h: f64,
        d: f64,
        ho: f64,
        t: f64,
        slope_foreshore: Slope,
    ) -> Result<WaveHeights, ServiceError>;

    async fn design(&self, request: &DesignRequest) -> Result<DesignHandle, ServiceError>;

    /// PNG bytes of the cross-section plot.
    async fn render_plot(&self, handle: &DesignHandle, scope: &str) -> Result<Vec<u8>, ServiceError>;

    async fn describe_variant(&self, handle: &DesignHandle, scope: &str) -> Result<String, ServiceError>;

    async fn describe_warnings(&self, handle: &DesignHandle, level: &str) -> Result<String, ServiceError>;
}

#[derive(Serialize)]
struct ExceedanceHeightBody {
    #[serde(rename = "Hm0")]
    hm0: f64,
    h: f64,
    slope_foreshore: Slope,
    exceedance: f64,
}

#[derive(Deserialize)]
struct HeightResponse {
    height: f64,
}

#[derive(Serialize)]
struct WavesAtStructureBody {
    h: f64,
    d: f64,
    #[serde(rename = "Ho")]
    ho: f64,
    #[serde(rename = "T")]
    t: f64,
    slope_foreshore: Slope,
}

/// [`EngineeringService`] over HTTP.
pub struct HttpEngineeringService {
    client: Client,
    base_url: String,
}

impl HttpEngineeringService {
    /// Client for the service at `base_url`. Each HTTP request is abandoned
    /// after `request_timeout`.
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .user_agent(concat!("breakwater-web/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn post_json<B, R>(&self, path: &str, body: &B) -> Result<R, ServiceError>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        debug!("POST {}", url);
        let response = self.client.post(&url).json(body).send().await?;
        let response = check_status(response).await?;
        response
            .json()
            .await
            .map_err(|e| ServiceError::InvalidResponse(format!("{}: {}", path, e)))
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Response, ServiceError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self.client.get(&url).query(query).send().await?;
        check_status(response).await
    }
}

/// Turn a non-success status into [`ServiceError::Rejected`], keeping the
/// service's own message.
async fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    let message = if message.trim().is_empty() {
        status.canonical_reason().unwrap_or("no message").to_string()
    } else {
        message.trim().to_string()
    };
    Err(ServiceError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl EngineeringService for HttpEngineeringService {
    async fn exceedance_height(
        &self,
        hm0: f64,
        h: f64,
        slope_foreshore: Slope,
    ) -> Result<f64, ServiceError> {
        let body = ExceedanceHeightBody {
            hm0,
            h,
            slope_foreshore,
            exceedance: EXCEEDANCE_PROBABILITY,
        };
        let response: HeightResponse = self.post_json("statistics/exceedance-height", &body).await?;
        Ok(response.height)
    }

    async fn waves_at_structure(
        &self,
        h: f64,
        d: f64,
        ho: f64,
        t: f64,
        slope_foreshore: Slope,
    ) -> Result<WaveHeights, ServiceError> {
        let body = WavesAtStructureBody {
            h,
            d,
            ho,
            t,
            slope_foreshore,
        };
        self.post_json("waves/goda", &body).await
    }

    async fn design(&self, request: &DesignRequest) -> Result<DesignHandle, ServiceError> {
        self.post_json("designs", request).await
    }

    async fn render_plot(&self, handle: &DesignHandle, scope: &str) -> Result<Vec<u8>, ServiceError> {
        let path = format!("designs/{}/plot", handle.id);
        let response = self.get(&path, &[("scope", scope)]).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn describe_variant(&self, handle: &DesignHandle, scope: &str) -> Result<String, ServiceError> {
        let path = format!("designs/{}/variant", handle.id);
        let response = self.get(&path, &[("scope", scope)]).await?;
        Ok(response.text().await?)
    }

    async fn describe_warnings(&self, handle: &DesignHandle, level: &str) -> Result<String, ServiceError> {
        let path = format!("designs/{}/log", handle.id);
        let response = self.get(&path, &[("level", level)]).await?;
        Ok(response.text().await?)
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Deterministic in-process stand-in for the engineering service.

    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use image::{ImageBuffer, Luma};

    use super::*;

    pub fn png(width: u32, height: u32) -> Vec<u8> {
        let image: ImageBuffer<Luma<u8>, Vec<u8>> = ImageBuffer::new(width, height);
        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, image::ImageFormat::Png)
            .expect("encode png");
        bytes.into_inner()
    }

    pub struct FakeService {
        calls: AtomicUsize,
        pub design_failure: Option<String>,
        /// Every call waits forever
        pub stalled: bool,
        pub plot: Vec<u8>,
        pub wave_inputs: Mutex<Vec<(f64, f64, f64, f64, Slope)>>,
    }

    impl FakeService {
        pub fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                design_failure: None,
                stalled: false,
                plot: png(8, 6),
                wave_inputs: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(message: &str) -> Self {
            Self {
                design_failure: Some(message.to_string()),
                ..Self::new()
            }
        }

        pub fn stalled() -> Self {
            Self {
                stalled: true,
                ..Self::new()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        async fn hit(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.stalled {
                std::future::pending::<()>().await;
            }
        }
    }

    #[async_trait]
    impl EngineeringService for FakeService {
        async fn exceedance_height(&self, hm0: f64, _h: f64, _slope: Slope) -> Result<f64, ServiceError> {
            self.hit().await;
            Ok(hm0 * 1.4)
        }

        async fn waves_at_structure(
            &self,
            h: f64,
            d: f64,
            ho: f64,
            t: f64,
            slope_foreshore: Slope,
        ) -> Result<WaveHeights, ServiceError> {
            self.hit().await;
            self.wave_inputs
                .lock()
                .unwrap()
                .push((h, d, ho, t, slope_foreshore));
            Ok(WaveHeights {
                h13: ho * 1.1,
                hmax: ho * 2.0,
            })
        }

        async fn design(&self, request: &DesignRequest) -> Result<DesignHandle, ServiceError> {
            self.hit().await;
            match &self.design_failure {
                Some(message) => Err(ServiceError::Rejected {
                    status: 422,
                    message: message.clone(),
                }),
                None => Ok(DesignHandle {
                    id: format!("fake-{}", request.breakwater_type().slug()),
                }),
            }
        }

        async fn render_plot(&self, _handle: &DesignHandle, _scope: &str) -> Result<Vec<u8>, ServiceError> {
            self.hit().await;
            Ok(self.plot.clone())
        }

        async fn describe_variant(&self, handle: &DesignHandle, scope: &str) -> Result<String, ServiceError> {
            self.hit().await;
            Ok(format!("Variant a ({}, scope {})", handle.id, scope))
        }

        async fn describe_warnings(&self, _handle: &DesignHandle, level: &str) -> Result<String, ServiceError> {
            self.hit().await;
            Ok(format!("no {} logged", level))
        }
    }
}
