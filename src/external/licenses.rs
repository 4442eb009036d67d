use crate::error::Result;
use crate::external::get;
use serde::{Deserialize, Serialize};

/// Details of one license from `<spdx>/<id>.json`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpdxLicense {
    pub license_id: String,
    pub name: String,
    #[serde(default)]
    pub is_osi_approved: bool,
    #[serde(default)]
    pub is_deprecated_license_id: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_fsf_libre: Option<bool>,
    #[serde(default)]
    pub see_also: Vec<String>,
    #[serde(default)]
    pub license_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_license_header: Option<String>,
}

impl SpdxLicense {
    /// The standard header to put into source files, if the license has one
    pub fn notice(&self) -> Option<&str> {
        self.standard_license_header
            .as_deref()
            .map(str::trim)
            .filter(|header| !header.is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct LicenseList {
    licenses: Vec<LicenseListItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LicenseListItem {
    license_id: String,
}

/// Client for the SPDX license list
pub struct SpdxClient {
    base_url: String,
}

impl SpdxClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        SpdxClient {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn get_license(&self, license_id: &str) -> Result<SpdxLicense> {
        let url = format!("{}/{}.json", self.base_url, license_id);
        let response = get(&url, &format!("license '{}'", license_id))?;
        Ok(response.json()?)
    }

    /// All license identifiers, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        let url = format!("{}/licenses.json", self.base_url);
        let list: LicenseList = get(&url, "license list")?.json()?;
        let mut ids: Vec<String> = list.licenses.into_iter().map(|l| l.license_id).collect();
        ids.sort();
        Ok(ids)
    }
}

/// Wrap every line of `text` that is longer than `width` at word boundaries
pub fn wrap_license_text(text: &str, width: usize) -> String {
    let mut lines = Vec::new();
    for raw_line in text.split('\n') {
        if raw_line.chars().count() <= width {
            lines.push(raw_line.to_string());
            continue;
        }

        let mut current = String::new();
        for word in raw_line.split(' ') {
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > width && !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(word);
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }
    lines.join("\n")
}
