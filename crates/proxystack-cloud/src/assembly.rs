//! Cloud assembly output
//!
//! Writes synthesized templates to an output directory (`cdk.out` by
//! default) together with a small manifest describing where they deploy.

use crate::error::{CloudError, Result};
use crate::template::Template;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const ASSEMBLY_VERSION: u32 = 1;
pub const DEFAULT_OUT_DIR: &str = "cdk.out";
const MANIFEST_FILE: &str = "manifest.json";

/// Manifest describing the synthesized stack
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyManifest {
    pub version: u32,
    pub stack_name: String,
    pub account_id: String,
    pub region: String,
    pub template_file: String,
    pub generated_at: DateTime<Utc>,
}

/// Paths written by [`CloudAssembly::write`]
#[derive(Debug, Clone)]
pub struct AssemblyArtifact {
    pub template_path: PathBuf,
    pub manifest_path: PathBuf,
}

pub struct CloudAssembly {
    out_dir: PathBuf,
}

impl CloudAssembly {
    pub fn new(out_dir: impl AsRef<Path>) -> Self {
        Self {
            out_dir: out_dir.as_ref().to_path_buf(),
        }
    }

    fn template_file_name(stack_name: &str) -> String {
        format!("{}.template.json", stack_name)
    }

    fn template_path(&self, stack_name: &str) -> PathBuf {
        self.out_dir.join(Self::template_file_name(stack_name))
    }

    fn manifest_path(&self) -> PathBuf {
        self.out_dir.join(MANIFEST_FILE)
    }

    fn assembly_error(path: &Path, e: impl std::fmt::Display) -> CloudError {
        CloudError::Assembly {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    }

    /// Write the template and manifest, keeping a backup of the previous template
    pub fn write(
        &self,
        stack_name: &str,
        account_id: &str,
        region: &str,
        template: &Template,
    ) -> Result<AssemblyArtifact> {
        fs::create_dir_all(&self.out_dir).map_err(|e| Self::assembly_error(&self.out_dir, e))?;

        let template_path = self.template_path(stack_name);
        if template_path.exists() {
            let backup = template_path.with_extension("json.backup");
            fs::rename(&template_path, &backup).map_err(|e| Self::assembly_error(&backup, e))?;
            tracing::debug!("Created template backup: {}", backup.display());
        }

        fs::write(&template_path, template.to_json_pretty()?)
            .map_err(|e| Self::assembly_error(&template_path, e))?;

        let manifest = AssemblyManifest {
            version: ASSEMBLY_VERSION,
            stack_name: stack_name.to_string(),
            account_id: account_id.to_string(),
            region: region.to_string(),
            template_file: Self::template_file_name(stack_name),
            generated_at: Utc::now(),
        };
        let manifest_path = self.manifest_path();
        fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)
            .map_err(|e| Self::assembly_error(&manifest_path, e))?;

        tracing::info!(
            template = %template_path.display(),
            resources = template.resources.len(),
            "Wrote cloud assembly"
        );

        Ok(AssemblyArtifact {
            template_path,
            manifest_path,
        })
    }

    /// Read the manifest back
    pub fn load_manifest(&self) -> Result<AssemblyManifest> {
        let path = self.manifest_path();
        let content = fs::read_to_string(&path).map_err(|e| Self::assembly_error(&path, e))?;
        let manifest: AssemblyManifest = serde_json::from_str(&content)?;

        if manifest.version > ASSEMBLY_VERSION {
            return Err(Self::assembly_error(
                &path,
                format!(
                    "manifest version {} is newer than supported version {}",
                    manifest.version, ASSEMBLY_VERSION
                ),
            ));
        }

        Ok(manifest)
    }

    /// Read a previously written template
    pub fn load_template(&self, stack_name: &str) -> Result<Template> {
        let path = self.template_path(stack_name);
        let content = fs::read_to_string(&path).map_err(|e| Self::assembly_error(&path, e))?;
        Template::from_json(&content)
    }
}
