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

/// Decode a part body according to its `Content-Transfer-Encoding`.
///
/// The lookup is case-insensitive on the trimmed value. `7bit`, `8bit`,
/// `binary`, the empty string and any unknown token are the identity.
///
/// # Errors
///
/// * the content does not decode under the declared encoding; callers
///   keep the raw bytes and log a warning
pub fn decode_transfer(content: &[u8], encoding: &str) -> anyhow::Result<Vec<u8>> {
    match encoding.trim().to_ascii_lowercase().as_str() {
        "base64" => {
            let cleaned = content
                .iter()
                .copied()
                .filter(|c| !c.is_ascii_whitespace())
                .collect::<Vec<_>>();
            base64::decode(cleaned).map_err(anyhow::Error::new)
        }
        "quoted-printable" => decode_quoted_printable(content),
        _ => Ok(content.to_vec()),
    }
}

fn decode_quoted_printable(content: &[u8]) -> anyhow::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(content.len());
    let mut i = 0;

    while i < content.len() {
        if content[i] != b'=' {
            out.push(content[i]);
            i += 1;
            continue;
        }

        match content.get(i + 1..) {
            Some([b'\r', b'\n', ..]) => i += 3,
            Some([b'\n', ..]) => i += 2,
            Some([hi, lo, ..]) => {
                out.push(hex_pair(*hi, *lo)?);
                i += 3;
            }
            _ => anyhow::bail!("truncated quoted-printable escape"),
        }
    }

    Ok(out)
}

fn hex_pair(hi: u8, lo: u8) -> anyhow::Result<u8> {
    let digit = |c: u8| -> anyhow::Result<u8> {
        match c {
            b'0'..=b'9' => Ok(c - b'0'),
            b'A'..=b'F' => Ok(c - b'A' + 10),
            b'a'..=b'f' => Ok(c - b'a' + 10),
            _ => anyhow::bail!("invalid quoted-printable escape"),
        }
    };
    Ok(digit(hi)? << 4 | digit(lo)?)
}
