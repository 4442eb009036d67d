//! Clients for the metadata services shore consults: the SPDX license list
//! and the PyPI trove classifiers.

pub mod classifiers;
pub mod licenses;

use crate::error::{Result, ShoreError};
use reqwest::blocking::{Client, Response};
use tracing::debug;

const USER_AGENT: &str = concat!("shore/", env!("CARGO_PKG_VERSION"));

fn client() -> Result<Client> {
    Ok(Client::builder().user_agent(USER_AGENT).build()?)
}

/// GET `url`, turning a 404 into a readable error naming `what`
fn get(url: &str, what: &str) -> Result<Response> {
    debug!("fetching {}", url);
    let response = client()?.get(url).send()?;
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return Err(ShoreError::usage(format!("{} not found", what)));
    }
    Ok(response.error_for_status()?)
}
