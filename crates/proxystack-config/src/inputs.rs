//! The configuration input set

use crate::env_file::EnvFile;
use crate::error::{ConfigError, Result};
use std::fmt;
use tracing::debug;

/// Every key the stack needs, in the order they are reported when missing
pub const REQUIRED_KEYS: [&str; 7] = [
    "ACCOUNT_ID",
    "REGION",
    "TINYPROXY_USERNAME",
    "TINYPROXY_PASSWORD",
    "EC2_INSTANCE_AMI",
    "IP_LIST",
    "INSTANCE_TYPE",
];

/// Immutable inputs for one stack declaration
#[derive(Clone, PartialEq, Eq)]
pub struct StackInputs {
    pub account_id: String,
    pub region: String,
    pub proxy_username: String,
    pub proxy_password: String,
    pub image_id: String,
    pub ip_list: IpAllowList,
    pub instance_type: String,
}

impl StackInputs {
    /// Build inputs from an arbitrary key lookup
    ///
    /// Values are stored as given; a value that is blank after trimming
    /// counts as missing. All missing keys are collected before failing.
    pub fn from_lookup<F>(mut lookup: F) -> Result<Self>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut values: [String; 7] = Default::default();
        let mut missing = Vec::new();

        for (slot, key) in values.iter_mut().zip(REQUIRED_KEYS) {
            match lookup(key) {
                Some(v) if !v.trim().is_empty() => *slot = v,
                _ => missing.push(key),
            }
        }

        if !missing.is_empty() {
            return Err(ConfigError::MissingConfiguration { keys: missing });
        }

        let [
            account_id,
            region,
            proxy_username,
            proxy_password,
            image_id,
            ip_list,
            instance_type,
        ] = values;

        debug!(
            account_id = %account_id,
            region = %region,
            instance_type = %instance_type,
            "Loaded stack inputs"
        );

        Ok(Self {
            account_id,
            region,
            proxy_username,
            proxy_password,
            image_id,
            ip_list: IpAllowList::new(ip_list),
            instance_type,
        })
    }

    /// Process environment, falling back to a `.env` file
    pub fn from_env_with(env_file: &EnvFile) -> Result<Self> {
        Self::from_lookup(|key| env_file.lookup(key))
    }
}

impl fmt::Debug for StackInputs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StackInputs")
            .field("account_id", &self.account_id)
            .field("region", &self.region)
            .field("proxy_username", &self.proxy_username)
            .field("proxy_password", &"********")
            .field("image_id", &self.image_id)
            .field("ip_list", &self.ip_list)
            .field("instance_type", &self.instance_type)
            .finish()
    }
}

/// Comma-separated list of client addresses allowed through the proxy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpAllowList {
    raw: String,
}

impl IpAllowList {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The value exactly as configured
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Individual entries, trimmed, empty entries dropped
    pub fn entries(&self) -> Vec<&str> {
        self.raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Space-separated form for shell loops
    pub fn shell_words(&self) -> String {
        self.entries().join(" ")
    }
}

impl fmt::Display for IpAllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
