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
use crate::error::ParserError;

/// Split a message into its header fields and its body.
///
/// Names keep the case they were sent with; folded continuation lines are
/// unfolded with a single space. The body slice starts right after the
/// blank separator line; a message ending at the header section yields an
/// empty body.
pub fn split_message(input: &[u8]) -> Result<(Vec<(String, String)>, &[u8]), ParserError> {
    let mut fields = Vec::<(String, String)>::new();
    let mut pos = 0;

    while pos < input.len() {
        let (line, next) = next_line(input, pos);

        if line.is_empty() {
            return Ok((fields, &input[next..]));
        }

        if line[0] == b' ' || line[0] == b'\t' {
            let folded = String::from_utf8_lossy(line);
            match fields.last_mut() {
                Some((_, value)) => {
                    value.push(' ');
                    value.push_str(folded.trim_start());
                }
                None => {
                    return Err(ParserError::MalformedHeader(folded.into_owned()));
                }
            }
            pos = next;
            continue;
        }

        let line = String::from_utf8_lossy(line);
        let mut split = line.splitn(2, ':');
        match (split.next(), split.next()) {
            (Some(name), Some(value)) if is_field_name(name) => {
                fields.push((name.to_string(), value.trim_start().to_string()));
            }
            _ => return Err(ParserError::MalformedHeader(line.into_owned())),
        }
        pos = next;
    }

    // header section ending at end of input, without a blank separator.
    Ok((fields, &input[input.len()..]))
}

/// Collapse the ordered field list into a name → value map, joining
/// multi-valued fields with `", "`.
#[must_use]
pub fn collapse(fields: &[(String, String)]) -> std::collections::BTreeMap<String, String> {
    let mut map = std::collections::BTreeMap::<String, String>::new();
    for (name, value) in fields {
        match map.get_mut(name) {
            Some(existing) => {
                existing.push_str(", ");
                existing.push_str(value);
            }
            None => {
                map.insert(name.clone(), value.clone());
            }
        }
    }
    map
}

/// First value of a field, looked up without case sensitivity.
#[must_use]
pub fn get<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(field, _)| field.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

fn is_field_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| (33..=126).contains(&b) && b != b':')
}

/// one line without its terminator, and the offset of the next line.
fn next_line(input: &[u8], pos: usize) -> (&[u8], usize) {
    input[pos..].iter().position(|&b| b == b'\n').map_or_else(
        || (&input[pos..], input.len()),
        |i| {
            let end = pos + i;
            let line = if end > pos && input[end - 1] == b'\r' {
                &input[pos..end - 1]
            } else {
                &input[pos..end]
            };
            (line, end + 1)
        },
    )
}
