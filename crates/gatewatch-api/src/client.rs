// Pull-endpoint HTTP client
//
// Wraps `reqwest::Client` with backend URL construction and response
// decoding. All methods return decoded payloads; non-2xx responses
// become `Error::Api` with the server message extracted from the body
// when one is present.

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{
    AccessLogEntry, ActionResponse, CameraStatusResponse, DetectionStatsResponse,
};

/// Raw HTTP client for the gate backend's pull endpoints.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the backend root (e.g. `http://127.0.0.1:5000`).
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Read endpoints ───────────────────────────────────────────────

    /// Fetch the recent access log, most-recent-first.
    ///
    /// `GET /api/access_logs`
    pub async fn list_access_logs(&self) -> Result<Vec<AccessLogEntry>, Error> {
        self.get_json("access_logs").await
    }

    /// Fetch the current camera and detection status.
    ///
    /// `GET /api/camera_status`
    pub async fn camera_status(&self) -> Result<CameraStatusResponse, Error> {
        self.get_json("camera_status").await
    }

    /// Fetch the server-side detection statistics for today.
    ///
    /// `GET /api/detection_stats`
    pub async fn detection_stats(&self) -> Result<DetectionStatsResponse, Error> {
        self.get_json("detection_stats").await
    }

    // ── Control endpoints ────────────────────────────────────────────

    /// Start the camera pipeline.
    ///
    /// `POST /api/start_camera`
    pub async fn start_camera(&self) -> Result<ActionResponse, Error> {
        self.post_action("start_camera").await
    }

    /// Stop the camera pipeline.
    ///
    /// `POST /api/stop_camera`
    pub async fn stop_camera(&self) -> Result<ActionResponse, Error> {
        self.post_action("stop_camera").await
    }

    /// Toggle detection on the running camera.
    ///
    /// `POST /api/toggle_detection`
    pub async fn toggle_detection(&self) -> Result<ActionResponse, Error> {
        self.post_action("toggle_detection").await
    }

    /// Trigger a server-side roster import.
    ///
    /// `POST /api/import_csv`
    pub async fn import_csv(&self) -> Result<ActionResponse, Error> {
        self.post_action("import_csv").await
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(&format!("/api/{path}"))?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.endpoint(path)?;
        debug!("GET {url}");

        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        Self::decode(resp).await
    }

    async fn post_action(&self, path: &str) -> Result<ActionResponse, Error> {
        let url = self.endpoint(path)?;
        debug!("POST {url}");

        let resp = self.http.post(url).send().await.map_err(Error::Transport)?;
        Self::decode(resp).await
    }

    /// Check the status, then decode the body.
    ///
    /// On a non-2xx, the backend usually still sends `{ "message": ... }`
    /// -- surface that message rather than the bare status line.
    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            let message = serde_json::from_str::<ActionResponse>(&body)
                .map(|a| a.message)
                .ok()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| status.to_string());
            return Err(Error::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}
