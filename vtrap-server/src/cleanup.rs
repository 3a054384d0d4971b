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
use vtrap_config::{log_channel::CLEANUP, Config, ConfigAttachmentStorage};

/// Start the temp-file collector: every `cleanup_after / 2` it removes
/// attachment files older than `cleanup_after`. Stops with the server.
pub(crate) fn start(
    config: std::sync::Arc<Config>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let period = std::cmp::max(
            config.attachment_storage.cleanup_after / 2,
            std::time::Duration::from_secs(1),
        );
        let mut ticker = tokio::time::interval(period);
        // the first tick of an interval is immediate, skip it.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => sweep(&config.attachment_storage),
                _ = shutdown.changed() => {
                    log::debug!(target: CLEANUP, "temp file collector stopped");
                    return;
                }
            }
        }
    })
}

/// One pass over the temp directory.
fn sweep(storage: &ConfigAttachmentStorage) {
    let entries = match std::fs::read_dir(&storage.temp_dir) {
        Ok(entries) => entries,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return,
        Err(error) => {
            log::error!(target: CLEANUP, "failed to read temp dir: {}", error);
            return;
        }
    };

    let mut cleaned = 0_usize;
    for entry in entries.flatten() {
        let metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(_) => continue,
        };
        if !metadata.is_file() {
            continue;
        }

        let age = metadata.modified().ok().and_then(|m| m.elapsed().ok());
        if matches!(age, Some(age) if age > storage.cleanup_after) {
            match std::fs::remove_file(entry.path()) {
                Ok(()) => cleaned += 1,
                Err(error) => {
                    log::warn!(
                        target: CLEANUP,
                        "failed to remove temp file {:?}: {}",
                        entry.path(),
                        error
                    );
                }
            }
        }
    }

    if cleaned > 0 {
        log::debug!(
            target: CLEANUP,
            "cleaned {} temp attachment file(s)",
            cleaned
        );
    }
}
