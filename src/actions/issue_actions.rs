use anyhow::{Result, bail};

use crate::actions::clipboard;
use crate::config::keybindings::TemplateVars;
use crate::config::types::BackendConfig;
use crate::types::Issue;

/// Copy the issue id; returns the footer message.
pub fn copy_id(issue: &Issue) -> Result<String> {
    let id = issue.id.to_string();
    clipboard::copy_to_clipboard(&id)?;
    Ok(format!("Copied issue id {id}"))
}

/// Absolute URL of the issue's photo. Backend paths such as
/// `/uploads/x.jpg` are resolved against the API base URL.
pub fn image_url(issue: &Issue, backend: &BackendConfig) -> Option<String> {
    let raw = issue.image_url.as_deref()?.trim();
    if raw.is_empty() {
        return None;
    }
    if raw.starts_with("http://") || raw.starts_with("https://") || raw.starts_with("data:") {
        return Some(raw.to_owned());
    }
    Some(format!(
        "{}/{}",
        backend.base_url.trim_end_matches('/'),
        raw.trim_start_matches('/')
    ))
}

/// Open the issue's photo in the browser; returns the footer message.
pub fn open_image(issue: &Issue, backend: &BackendConfig) -> Result<String> {
    let Some(url) = image_url(issue, backend) else {
        bail!("issue {} has no photo", issue.id);
    };
    clipboard::open_url(&url)?;
    Ok(format!("Opened photo for issue {}", issue.id))
}

/// Variables for shell-command keybindings run against `issue`.
pub fn template_vars(issue: &Issue, backend: &BackendConfig) -> TemplateVars {
    TemplateVars {
        id: issue.id.to_string(),
        title: issue.title.clone(),
        status: issue.status.label().to_owned(),
        department: issue.department.clone(),
        assignee: issue.assigned_to.name().to_owned(),
        api_url: backend.base_url.clone(),
        citizen_url: backend.citizen_app_url.clone().unwrap_or_default(),
    }
}
