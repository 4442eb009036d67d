//! `license` and `classifiers` lookups.

use crate::error::{Result, ShoreError};
use crate::external::classifiers::{get_classifiers, search};
use crate::external::licenses::{wrap_license_text, SpdxClient};
use crate::workflow::Context;
use std::io::Write;

const LICENSE_WIDTH: usize = 79;

/// What `license <name>` prints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LicenseOutput {
    Json,
    Text,
    Notice,
}

impl LicenseOutput {
    /// Exactly one of the flags must be set
    pub fn from_flags(json: bool, text: bool, notice: bool) -> Result<Self> {
        match (json, text, notice) {
            (true, false, false) => Ok(LicenseOutput::Json),
            (false, true, false) => Ok(LicenseOutput::Text),
            (false, false, true) => Ok(LicenseOutput::Notice),
            (false, false, false) => Err(ShoreError::usage(
                "one of --json, --text or --notice is required",
            )),
            _ => Err(ShoreError::usage(
                "--json, --text and --notice are mutually exclusive",
            )),
        }
    }
}

pub fn license(name: &str, output: LicenseOutput, ctx: &mut Context<'_>) -> Result<i32> {
    let license = SpdxClient::new(&ctx.config.urls.spdx).get_license(name)?;
    match output {
        LicenseOutput::Json => {
            let value = serde_json::to_value(&license)?;
            writeln!(ctx.out, "{}", serde_json::to_string_pretty(&value)?)?;
        }
        LicenseOutput::Text => {
            writeln!(ctx.out, "{}", wrap_license_text(&license.license_text, LICENSE_WIDTH))?;
        }
        LicenseOutput::Notice => {
            let text = license.notice().unwrap_or(&license.license_text);
            writeln!(ctx.out, "{}", wrap_license_text(text, LICENSE_WIDTH))?;
        }
    }
    Ok(0)
}

pub fn license_list(ctx: &mut Context<'_>) -> Result<i32> {
    for id in SpdxClient::new(&ctx.config.urls.spdx).list()? {
        writeln!(ctx.out, "{}", id)?;
    }
    Ok(0)
}

pub fn classifiers_search(query: &str, ctx: &mut Context<'_>) -> Result<i32> {
    let classifiers = get_classifiers(&ctx.config.urls.classifiers)?;
    for classifier in search(&classifiers, query) {
        writeln!(ctx.out, "{}", classifier)?;
    }
    Ok(0)
}
