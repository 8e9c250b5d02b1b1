//! Indicator light output via Home Assistant.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const COMMAND_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors sending a light command.
#[derive(Debug, Error)]
pub enum LightError {
    #[error("Home Assistant request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Home Assistant returned {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// An RGB color, each channel 0-255.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const GREEN: Self = Self(0, 255, 0);
    pub const BLUE: Self = Self(0, 0, 255);
    pub const RED: Self = Self(255, 0, 0);
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.0, self.1, self.2)
    }
}

/// Something that can show a color.
#[async_trait]
pub trait Light: Send + Sync {
    async fn set_color(&self, color: Rgb) -> Result<(), LightError>;
}

/// Home Assistant connection settings for one light entity.
#[derive(Debug, Clone)]
pub struct LightConfig {
    pub url: String,
    pub token: String,
    pub entity_id: String,
    /// 1-255
    pub brightness: u8,
}

#[derive(Debug, Serialize)]
struct TurnOnPayload<'a> {
    entity_id: &'a str,
    rgb_color: [u8; 3],
    brightness: u8,
}

/// Drives a light entity through the `light.turn_on` service.
#[derive(Debug, Clone)]
pub struct HomeAssistantLight {
    config: LightConfig,
    client: reqwest::Client,
}

impl HomeAssistantLight {
    pub fn new(config: LightConfig) -> Result<Self, LightError> {
        let client = reqwest::Client::builder()
            .timeout(COMMAND_TIMEOUT)
            .build()?;
        Ok(Self { config, client })
    }

    fn service_url(&self) -> String {
        format!(
            "{}/api/services/light/turn_on",
            self.config.url.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl Light for HomeAssistantLight {
    async fn set_color(&self, color: Rgb) -> Result<(), LightError> {
        let payload = TurnOnPayload {
            entity_id: &self.config.entity_id,
            rgb_color: [color.0, color.1, color.2],
            brightness: self.config.brightness,
        };

        let response = self
            .client
            .post(self.service_url())
            .bearer_auth(&self.config.token)
            .json(&payload)
            .send()
            .await?;

        if response.status().is_success() {
            debug!(entity = %self.config.entity_id, color = %color, "Light updated");
            Ok(())
        } else {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            Err(LightError::Rejected { status, body })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn light(server: &MockServer) -> HomeAssistantLight {
        HomeAssistantLight::new(LightConfig {
            url: format!("{}/", server.uri()),
            token: "ha-token".to_string(),
            entity_id: "light.cluster_bulb".to_string(),
            brightness: 128,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_set_color_posts_turn_on() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/services/light/turn_on"))
            .and(header("Authorization", "Bearer ha-token"))
            .and(body_json(serde_json::json!({
                "entity_id": "light.cluster_bulb",
                "rgb_color": [255, 0, 0],
                "brightness": 128
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(1)
            .mount(&server)
            .await;

        light(&server).set_color(Rgb::RED).await.unwrap();
    }

    #[tokio::test]
    async fn test_rejected_command_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("401: Unauthorized"))
            .mount(&server)
            .await;

        let err = light(&server).set_color(Rgb::GREEN).await.unwrap_err();
        assert!(matches!(err, LightError::Rejected { status: 401, .. }));
    }
}
