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

/// Split a multipart body into its parts, boundary lines excluded.
///
/// The preamble (before the first delimiter) and the epilogue (after the
/// closing delimiter) are discarded. A missing closing delimiter is
/// tolerated, the last part then runs to the end of input.
#[must_use]
pub fn split<'a>(body: &'a [u8], boundary: &str) -> Vec<&'a [u8]> {
    let delimiter = format!("--{boundary}");
    let closing = format!("--{boundary}--");

    let mut parts = Vec::new();
    let mut part_start: Option<usize> = None;
    let mut pos = 0;

    while pos < body.len() {
        let (line, next) = next_line(body, pos);
        let line = trim_transport_padding(line);

        if line == closing.as_bytes() {
            if let Some(start) = part_start.take() {
                parts.push(strip_closing_crlf(&body[start..pos]));
            }
            return parts;
        }

        if line == delimiter.as_bytes() {
            if let Some(start) = part_start.take() {
                parts.push(strip_closing_crlf(&body[start..pos]));
            }
            part_start = Some(next);
        }

        pos = next;
    }

    if let Some(start) = part_start {
        parts.push(strip_closing_crlf(&body[start..]));
    }
    parts
}

/// one line without its terminator, and the offset of the next line.
fn next_line(input: &[u8], pos: usize) -> (&[u8], usize) {
    input[pos..].iter().position(|&b| b == b'\n').map_or_else(
        || (&input[pos..], input.len()),
        |i| (&input[pos..pos + i], pos + i + 1),
    )
}

/// boundary lines may carry trailing transport padding.
fn trim_transport_padding(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && matches!(line[end - 1], b' ' | b'\t' | b'\r') {
        end -= 1;
    }
    &line[..end]
}

/// the line break before a delimiter belongs to the delimiter, not to the
/// part content.
fn strip_closing_crlf(part: &[u8]) -> &[u8] {
    if part.ends_with(b"\r\n") {
        &part[..part.len() - 2]
    } else if part.ends_with(b"\n") {
        &part[..part.len() - 1]
    } else {
        part
    }
}
