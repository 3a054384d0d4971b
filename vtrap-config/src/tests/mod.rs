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
use crate::Config;
use pretty_assertions::assert_eq;
use vtrap_common::StorageMode;

#[test]
fn empty_document_is_all_defaults() {
    let config = Config::from_toml("").unwrap();

    assert_eq!(config.server.name, "default");
    assert_eq!(config.server.addr, "127.0.0.1:1025".parse().unwrap());
    assert_eq!(config.server.hostname, "localhost");
    assert_eq!(
        config.server.read_timeout,
        std::time::Duration::from_secs(60)
    );
    assert_eq!(
        config.server.write_timeout,
        std::time::Duration::from_secs(10)
    );
    assert_eq!(config.server.max_message_size, 10 * 1024 * 1024);
    assert_eq!(config.server.max_recipients, 100);
    assert!(config.server.logs.is_none());
    assert!(!config.include_raw);
    assert_eq!(config.attachment_storage.mode, StorageMode::Memory);
    assert_eq!(
        config.attachment_storage.temp_dir,
        std::path::PathBuf::from("/tmp/smtp-attachments")
    );
    assert_eq!(
        config.attachment_storage.cleanup_after,
        std::time::Duration::from_secs(3600)
    );
}

#[test]
fn full_document() {
    let config = Config::from_toml(
        r#"
include_raw = true

[server]
name = "profiling"
addr = "0.0.0.0:2525"
hostname = "mail.example.com"
read_timeout = "30s"
write_timeout = "5s"
max_message_size = 1048576
max_recipients = 5

[server.logs]
filepath = "/var/log/vtrap/vtrap.log"
level = { default = "info", receiver = "debug" }

[attachment_storage]
mode = "tempfile"
temp_dir = "/var/tmp/attachments"
cleanup_after = "15m"
"#,
    )
    .unwrap();

    assert_eq!(config.server.name, "profiling");
    assert_eq!(config.server.addr, "0.0.0.0:2525".parse().unwrap());
    assert_eq!(config.server.hostname, "mail.example.com");
    assert_eq!(
        config.server.read_timeout,
        std::time::Duration::from_secs(30)
    );
    assert_eq!(config.server.max_message_size, 1024 * 1024);
    assert_eq!(config.server.max_recipients, 5);
    assert!(config.include_raw);

    let logs = config.server.logs.as_ref().unwrap();
    assert_eq!(
        logs.level.get("receiver"),
        Some(&log::LevelFilter::Debug)
    );

    assert_eq!(config.attachment_storage.mode, StorageMode::Tempfile);
    assert_eq!(
        config.attachment_storage.cleanup_after,
        std::time::Duration::from_secs(15 * 60)
    );
}

#[test]
fn invalid_storage_mode_is_rejected() {
    assert!(Config::from_toml(
        r#"
[attachment_storage]
mode = "s3"
"#,
    )
    .is_err());
}

#[test]
fn unparsable_addr_is_rejected() {
    assert!(Config::from_toml(
        r#"
[server]
addr = ""
"#,
    )
    .is_err());

    assert!(Config::from_toml(
        r#"
[server]
addr = "localhost"
"#,
    )
    .is_err());
}

#[test]
fn unknown_field_is_rejected() {
    assert!(Config::from_toml(
        r#"
[server]
domain = "example.com"
"#,
    )
    .is_err());
}

#[test]
fn serialize_round_trip() {
    let config = Config::local_test();
    let serialized = toml::to_string(&config).unwrap();
    assert_eq!(Config::from_toml(&serialized).unwrap(), config);
}
