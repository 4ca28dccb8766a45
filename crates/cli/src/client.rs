// SPDX-License-Identifier: MIT

//! Thin `reqwest` wrapper over the controller's client API.

use anyhow::{anyhow, Result};
use lightsched_wire::{ClusterInfo, JobInfo, JobSpec, NodeInfo, TaskInfo, TaskStatus};
use serde::de::DeserializeOwned;
use std::time::Duration;

pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http, base_url: base_url.trim_end_matches('/').to_string() }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let resp = self.http.get(format!("{}{path}", self.base_url)).send().await?;
        Self::into_body(resp).await
    }

    async fn into_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T> {
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(anyhow!("request failed with {status}: {text}"));
        }
        Ok(resp.json().await?)
    }

    pub async fn cluster_info(&self) -> Result<ClusterInfo> {
        self.get("/cluster").await
    }

    pub async fn list_jobs(&self, state: Option<&str>) -> Result<Vec<JobInfo>> {
        let query = state.map(|s| format!("?state={s}")).unwrap_or_default();
        self.get(&format!("/jobs{query}")).await
    }

    pub async fn get_job(&self, id: &str) -> Result<JobInfo> {
        self.get(&format!("/jobs/{id}")).await
    }

    pub async fn submit_job(&self, spec: &JobSpec) -> Result<JobInfo> {
        let resp = self.http.post(format!("{}/jobs", self.base_url)).json(spec).send().await?;
        Self::into_body(resp).await
    }

    pub async fn delete_job(&self, id: &str) -> Result<()> {
        let resp = self.http.delete(format!("{}/jobs/{id}", self.base_url)).send().await?;
        Self::expect_no_content(resp).await
    }

    pub async fn terminate_job(&self, id: &str) -> Result<()> {
        let resp =
            self.http.put(format!("{}/jobs/{id}/_terminate", self.base_url)).send().await?;
        Self::expect_no_content(resp).await
    }

    pub async fn list_tasks(&self, job_id: Option<&str>) -> Result<Vec<TaskStatus>> {
        let query = job_id.map(|id| format!("?jobid={id}")).unwrap_or_default();
        self.get(&format!("/tasks{query}")).await
    }

    pub async fn get_task(&self, id: &str) -> Result<TaskInfo> {
        self.get(&format!("/tasks/{id}")).await
    }

    pub async fn get_task_log(&self, id: &str) -> Result<String> {
        let resp = self.http.get(format!("{}/tasks/{id}/log", self.base_url)).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            return Err(anyhow!("request failed with {status}"));
        }
        Ok(resp.text().await?)
    }

    pub async fn list_nodes(&self) -> Result<Vec<NodeInfo>> {
        self.get("/nodes").await
    }

    pub async fn get_node(&self, name: &str) -> Result<NodeInfo> {
        self.get(&format!("/nodes/{name}")).await
    }

    pub async fn online_node(&self, name: &str) -> Result<()> {
        let resp =
            self.http.put(format!("{}/nodes/{name}/_online", self.base_url)).send().await?;
        Self::expect_no_content(resp).await
    }

    pub async fn offline_node(&self, name: &str) -> Result<()> {
        let resp =
            self.http.put(format!("{}/nodes/{name}/_offline", self.base_url)).send().await?;
        Self::expect_no_content(resp).await
    }

    async fn expect_no_content(resp: reqwest::Response) -> Result<()> {
        if resp.status().is_success() {
            Ok(())
        } else {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            Err(anyhow!("request failed with {status}: {text}"))
        }
    }
}
