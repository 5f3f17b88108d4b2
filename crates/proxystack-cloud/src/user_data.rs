//! Instance boot script
//!
//! The script is read once and handed to the instance unchanged. Rendering
//! the allow-list into it is opt-in: with [`UserDataMode::RenderAllowList`]
//! the file is treated as a Tera template.

use crate::error::{CloudError, Result};
use proxystack_config::IpAllowList;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Default script location, relative to the working directory
pub const DEFAULT_USER_DATA_PATH: &str = "user_data.sh";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserDataMode {
    /// Pass the file contents through untouched
    #[default]
    Literal,
    /// Render `{{ ip_list }}` / `{{ ip_list_csv }}` into the script
    RenderAllowList,
}

/// Boot script text ready to embed in the instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    script: String,
    source: Option<PathBuf>,
}

impl UserData {
    pub fn from_text(script: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            source: None,
        }
    }

    /// Read the boot script from `path`
    #[tracing::instrument(skip(ip_list))]
    pub fn load(path: &Path, mode: UserDataMode, ip_list: &IpAllowList) -> Result<Self> {
        let script =
            std::fs::read_to_string(path).map_err(|source| CloudError::ResourceFileUnavailable {
                path: path.to_path_buf(),
                source,
            })?;

        let script = match mode {
            UserDataMode::Literal => script,
            UserDataMode::RenderAllowList => render_allow_list(path, &script, ip_list)?,
        };

        info!(
            path = %path.display(),
            bytes = script.len(),
            "Loaded boot script"
        );

        Ok(Self {
            script,
            source: Some(path.to_path_buf()),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.script
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

fn render_allow_list(path: &Path, script: &str, ip_list: &IpAllowList) -> Result<String> {
    let mut context = tera::Context::new();
    context.insert("ip_list", &ip_list.shell_words());
    context.insert("ip_list_csv", ip_list.as_str());

    debug!(entries = ip_list.entries().len(), "Rendering allow-list into boot script");

    tera::Tera::one_off(script, &context, false).map_err(|e| CloudError::UserDataTemplate {
        path: path.to_path_buf(),
        message: error_chain(&e),
    })
}

fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
