//! vTrap configuration

#![doc(html_no_source)]
#![deny(missing_docs)]
//
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::cargo)]

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

/// targets for the log! macros
pub mod log_channel {
    /// receiver system, one entry per session event
    pub const RECEIVER: &str = "receiver";
    /// worker dispatch path
    pub const DISPATCH: &str = "dispatch";
    /// mime parser warnings
    pub const PARSER: &str = "parser";
    /// temp-file collector
    pub const CLEANUP: &str = "cleanup";
}

mod config;
mod default;

#[cfg(test)]
mod tests;

pub use config::{Config, ConfigAttachmentStorage, ConfigServer, ConfigServerLogs};

#[doc(hidden)]
#[allow(clippy::module_name_repetitions)]
pub fn get_logger_config(config: &Config, no_daemon: bool) -> anyhow::Result<log4rs::Config> {
    use log4rs::{append, config as l4rs, encode};

    let mut builder = log4rs::Config::builder();
    let mut root = l4rs::Root::builder();

    if no_daemon || config.server.logs.is_none() {
        builder = builder.appender(
            l4rs::Appender::builder().build(
                "stdout",
                Box::new(
                    append::console::ConsoleAppender::builder()
                        .encoder(Box::new(encode::pattern::PatternEncoder::new(
                            "{d(%Y-%m-%d %H:%M:%S)} {h({l:<5})} {t} $ {m}{n}",
                        )))
                        .build(),
                ),
            ),
        );
        root = root.appender("stdout");
    }

    let mut default_level = log::LevelFilter::Warn;

    if let Some(logs) = &config.server.logs {
        let server = append::file::FileAppender::builder()
            .encoder(Box::new(encode::pattern::PatternEncoder::new(&logs.format)))
            .build(&logs.filepath)?;

        builder = builder
            .appender(l4rs::Appender::builder().build("server", Box::new(server)))
            .loggers(
                logs.level
                    .iter()
                    .filter(|(name, _)| name.as_str() != "default")
                    .map(|(name, level)| l4rs::Logger::builder().build(name.clone(), *level)),
            );
        root = root.appender("server");

        default_level = *logs.level.get("default").unwrap_or(&log::LevelFilter::Warn);
    }

    builder.build(root.build(default_level)).map_err(|e| {
        e.errors().iter().for_each(|e| log::error!("{}", e));
        anyhow::anyhow!(e)
    })
}
