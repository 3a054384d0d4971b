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

/// What the operational RPC sees of one live session.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionInfo {
    /// session id, the registry key.
    pub uuid: String,
    /// client socket address.
    pub client_addr: std::net::SocketAddr,
    /// instant the connection was accepted.
    pub connected_at: std::time::SystemTime,
}

#[derive(Debug)]
struct SessionEntry {
    info: SessionInfo,
    abort: Option<tokio::task::AbortHandle>,
}

/// Process-wide map of live sessions, keyed by session id.
///
/// Insertion happens on accept, deletion on logout; both are safe from
/// concurrent sessions. The operational RPC collaborator enumerates and
/// terminates sessions through this registry.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: std::sync::RwLock<std::collections::HashMap<String, SessionEntry>>,
}

impl SessionRegistry {
    /// register a freshly accepted session.
    pub fn insert(&self, info: SessionInfo) {
        self.sessions
            .write()
            .expect("session registry lock poisoned")
            .insert(info.uuid.clone(), SessionEntry { info, abort: None });
    }

    /// attach the task handle of a registered session. A session that
    /// already logged out is left alone.
    pub fn arm(&self, uuid: &str, abort: tokio::task::AbortHandle) {
        if let Some(entry) = self
            .sessions
            .write()
            .expect("session registry lock poisoned")
            .get_mut(uuid)
        {
            entry.abort = Some(abort);
        }
    }

    /// drop a session from the registry, true when it was present.
    pub fn remove(&self, uuid: &str) -> bool {
        self.sessions
            .write()
            .expect("session registry lock poisoned")
            .remove(uuid)
            .is_some()
    }

    /// snapshot of the live sessions.
    pub fn list(&self) -> Vec<SessionInfo> {
        self.sessions
            .read()
            .expect("session registry lock poisoned")
            .values()
            .map(|entry| entry.info.clone())
            .collect()
    }

    /// abort one session and drop it, true when it was present.
    pub fn kill(&self, uuid: &str) -> bool {
        match self
            .sessions
            .write()
            .expect("session registry lock poisoned")
            .remove(uuid)
        {
            Some(entry) => {
                if let Some(abort) = entry.abort {
                    abort.abort();
                }
                true
            }
            None => false,
        }
    }

    /// abort every live session, returning how many were dropped.
    pub fn kill_all(&self) -> usize {
        let mut sessions = self
            .sessions
            .write()
            .expect("session registry lock poisoned");
        let count = sessions.len();
        for (_, entry) in sessions.drain() {
            if let Some(abort) = entry.abort {
                abort.abort();
            }
        }
        count
    }

    /// is the session still live.
    #[must_use]
    pub fn contains(&self, uuid: &str) -> bool {
        self.sessions
            .read()
            .expect("session registry lock poisoned")
            .contains_key(uuid)
    }

    /// number of live sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .expect("session registry lock poisoned")
            .len()
    }

    /// no live session at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
