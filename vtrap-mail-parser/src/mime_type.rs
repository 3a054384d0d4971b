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

/// A parsed `Content-Type` or `Content-Disposition` value: the media type
/// (or disposition token) with its parameters.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MediaType {
    /// lowercased type, parameters stripped (`text/plain`, `attachment`).
    pub essence: String,
    /// lowercased parameter names with their (unquoted) values.
    pub params: Vec<(String, String)>,
}

impl MediaType {
    /// value of a parameter, `None` when absent.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }
}

/// Parse a `type/subtype; key=value; key="value"` field value.
///
/// # Errors
///
/// * the value is empty or a parameter is not a `key=value` pair
pub fn parse_media_type(input: &str) -> anyhow::Result<MediaType> {
    let mut segments = input.split(';');

    let essence = segments
        .next()
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow::anyhow!("empty media type"))?;

    let mut params = Vec::new();
    for segment in segments {
        let segment = segment.trim();
        if segment.is_empty() {
            continue;
        }

        let mut split = segment.splitn(2, '=');
        match (split.next(), split.next()) {
            (Some(key), Some(value)) if !key.trim().is_empty() => {
                params.push((key.trim().to_ascii_lowercase(), unquote(value.trim())));
            }
            _ => anyhow::bail!("malformed parameter: '{}'", segment),
        }
    }

    Ok(MediaType { essence, params })
}

/// strip one level of double quotes and their backslash escapes.
fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        let inner = &value[1..value.len() - 1];
        let mut out = String::with_capacity(inner.len());
        let mut escaped = false;
        for c in inner.chars() {
            if escaped {
                out.push(c);
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else {
                out.push(c);
            }
        }
        out
    } else {
        value.to_string()
    }
}
