// SPDX-License-Identifier: MIT

//! Thin HTTP client for the node API: registration, heartbeats, and log
//! uploads. Timeouts are bounded by the heartbeat interval so a stalled
//! connection can never wedge the main loop.

use lightsched_wire::{Heartbeat, OutboxMessage, RegisterNode};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("controller returned 404, re-registration required")]
    NotRegistered,
    #[error("controller rejected registration (406)")]
    RegistrationRejected,
}

pub struct ControllerClient {
    http: reqwest::Client,
    base_url: String,
}

impl ControllerClient {
    pub fn new(base_url: String, timeout: Duration) -> Self {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http, base_url }
    }

    pub async fn register(&self, descriptor: &RegisterNode) -> Result<(), ClientError> {
        let resp = self.http.post(format!("{}/nodes", self.base_url)).json(descriptor).send().await?;
        match resp.status().as_u16() {
            200 | 201 => Ok(()),
            406 => Err(ClientError::RegistrationRejected),
            _ => Ok(()),
        }
    }

    /// Sends a heartbeat; returns the outbox messages the controller
    /// drained for this node, or `NotRegistered` on HTTP 404.
    pub async fn heartbeat(&self, body: &Heartbeat) -> Result<Vec<OutboxMessage>, ClientError> {
        let resp = self.http.post(format!("{}/heartbeat", self.base_url)).json(body).send().await?;
        if resp.status().as_u16() == 404 {
            return Err(ClientError::NotRegistered);
        }
        let ack: HeartbeatAck = resp.error_for_status()?.json().await?;
        Ok(ack.messages)
    }

    pub async fn upload_log(&self, task_id: &str, text: &str) -> Result<(), ClientError> {
        self.http
            .post(format!("{}/tasks/{}/log", self.base_url, task_id))
            .header("content-type", "text/plain")
            .body(text.to_string())
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[derive(serde::Deserialize)]
struct HeartbeatAck {
    messages: Vec<OutboxMessage>,
}
