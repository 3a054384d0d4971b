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
mod args;
mod executor;

use args::Args;
use executor::LogExecutor;
use vtrap_config::{get_logger_config, Config};
use vtrap_server::ServerVTrap;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = <Args as clap::Parser>::parse();

    let config = match &args.config {
        Some(path) => Config::from_toml_file(path)?,
        None => Config::default(),
    };

    log4rs::init_config(get_logger_config(&config, args.no_daemon)?)?;

    let server = std::sync::Arc::new(
        ServerVTrap::new(
            std::sync::Arc::new(config),
            std::sync::Arc::new(LogExecutor),
        )
        .await?,
    );

    log::warn!("Listening on: {:?}", server.addr());

    tokio::select! {
        served = server.listen_and_serve() => served,
        _ = tokio::signal::ctrl_c() => {
            log::warn!("interrupt received, shutting down");
            server.shutdown(std::time::Duration::from_secs(30)).await
        }
    }
}
