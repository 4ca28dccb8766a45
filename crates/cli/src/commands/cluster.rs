// SPDX-License-Identifier: MIT

//! `lightsched cluster` — a one-line summary of the controller.

use crate::client::ApiClient;
use crate::output::{print, OutputFormat};
use anyhow::Result;

pub async fn info(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let info = client.cluster_info().await?;
    print(&info, format, |info| {
        println!("cluster: {}  jobs: {}", info.id, info.cycle);
    });
    Ok(())
}
