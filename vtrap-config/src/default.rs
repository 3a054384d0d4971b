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

pub(crate) fn name() -> String {
    "default".to_string()
}

pub(crate) fn addr() -> std::net::SocketAddr {
    std::net::SocketAddr::new(
        std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
        1025,
    )
}

pub(crate) fn hostname() -> String {
    "localhost".to_string()
}

pub(crate) const fn read_timeout() -> std::time::Duration {
    std::time::Duration::from_secs(60)
}

pub(crate) const fn write_timeout() -> std::time::Duration {
    std::time::Duration::from_secs(10)
}

pub(crate) const fn max_message_size() -> usize {
    10 * 1024 * 1024
}

pub(crate) const fn max_recipients() -> usize {
    100
}

pub(crate) fn log_format() -> String {
    "{d} {l} - {m}{n}".to_string()
}

pub(crate) fn log_level() -> std::collections::BTreeMap<String, log::LevelFilter> {
    std::collections::BTreeMap::from_iter([("default".to_string(), log::LevelFilter::Warn)])
}

pub(crate) fn temp_dir() -> std::path::PathBuf {
    "/tmp/smtp-attachments".into()
}

pub(crate) const fn cleanup_after() -> std::time::Duration {
    std::time::Duration::from_secs(3600)
}
