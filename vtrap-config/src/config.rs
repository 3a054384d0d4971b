/*
 * vTrap SMTP ingestion gateway
 * Copyright (C) 2022 viridIT SAS
 *
 * This program is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free Software
 * Foundation, either version 3 of the License, or any later version.
 *
 * This program is distributed in the hope that it will be useful, but WITHOUT
 * ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License along with
 * this program. If not, see https://www.gnu.org/licenses/.
 *
*/
#![allow(clippy::module_name_repetitions)]

use crate::default;
use vtrap_common::StorageMode;

/// Root of the gateway configuration, deserialized from toml.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// carry a copy of the original message bytes in each event.
    #[serde(default)]
    pub include_raw: bool,
    /// the listener and its protocol limits.
    #[serde(default)]
    pub server: ConfigServer,
    /// where decoded attachments end up.
    #[serde(default)]
    pub attachment_storage: ConfigAttachmentStorage,
}

/// Listener endpoint and per-session limits.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigServer {
    /// identifier carried in the `server` field of every event.
    #[serde(default = "default::name")]
    pub name: String,
    /// TCP listen address.
    #[serde(default = "default::addr")]
    pub addr: std::net::SocketAddr,
    /// hostname announced in the greeting and EHLO banner.
    #[serde(default = "default::hostname")]
    pub hostname: String,
    /// maximum time between two client commands.
    #[serde(with = "humantime_serde", default = "default::read_timeout")]
    pub read_timeout: std::time::Duration,
    /// maximum time to flush a reply.
    #[serde(with = "humantime_serde", default = "default::write_timeout")]
    pub write_timeout: std::time::Duration,
    /// cap on the DATA payload, in bytes.
    #[serde(default = "default::max_message_size")]
    pub max_message_size: usize,
    /// cap on the RCPT TO count per transaction.
    #[serde(default = "default::max_recipients")]
    pub max_recipients: usize,
    /// file logging; console only when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<ConfigServerLogs>,
}

impl Default for ConfigServer {
    fn default() -> Self {
        Self {
            name: default::name(),
            addr: default::addr(),
            hostname: default::hostname(),
            read_timeout: default::read_timeout(),
            write_timeout: default::write_timeout(),
            max_message_size: default::max_message_size(),
            max_recipients: default::max_recipients(),
            logs: None,
        }
    }
}

/// File appender configuration.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigServerLogs {
    /// log file path.
    pub filepath: std::path::PathBuf,
    /// log4rs pattern.
    #[serde(default = "default::log_format")]
    pub format: String,
    /// level per log target, `default` keyed entry for the root.
    #[serde(default = "default::log_level")]
    pub level: std::collections::BTreeMap<String, log::LevelFilter>,
}

/// Attachment storage policy.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigAttachmentStorage {
    /// `memory` inlines base64 in the event, `tempfile` writes to disk.
    #[serde(default)]
    pub mode: StorageMode,
    /// directory receiving the decoded files (tempfile mode).
    #[serde(default = "default::temp_dir")]
    pub temp_dir: std::path::PathBuf,
    /// age after which the collector removes a temp file.
    #[serde(with = "humantime_serde", default = "default::cleanup_after")]
    pub cleanup_after: std::time::Duration,
}

impl Default for ConfigAttachmentStorage {
    fn default() -> Self {
        Self {
            mode: StorageMode::default(),
            temp_dir: default::temp_dir(),
            cleanup_after: default::cleanup_after(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            include_raw: false,
            server: ConfigServer::default(),
            attachment_storage: ConfigAttachmentStorage::default(),
        }
    }
}

impl Config {
    /// Deserialize a toml document.
    ///
    /// # Errors
    ///
    /// * the document is not valid toml, carries an unknown field, an
    ///   unparsable address or an invalid storage mode
    pub fn from_toml(input: &str) -> anyhow::Result<Self> {
        toml::from_str::<Self>(input).map_err(anyhow::Error::new)
    }

    /// Read and deserialize a toml configuration file.
    ///
    /// # Errors
    ///
    /// * the file cannot be read
    /// * see [`Config::from_toml`]
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Configuration used by the test harness: an ephemeral port on
    /// loopback, everything else at defaults.
    #[must_use]
    pub fn local_test() -> Self {
        Self {
            server: ConfigServer {
                addr: "127.0.0.1:0".parse().expect("valid loopback address"),
                ..ConfigServer::default()
            },
            ..Self::default()
        }
    }
}
