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

/// Hard failures of the top-level parse. Everything below that level
/// (unknown encodings, one malformed part, one attachment that cannot be
/// written) degrades to a warning and the parse carries on.
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    /// a line in the top-level header section is neither a field nor a
    /// folded continuation.
    #[error("malformed header line: '{0}'")]
    MalformedHeader(String),

    /// the message declares a multipart media type without a boundary
    /// parameter.
    #[error("multipart message missing boundary")]
    MissingBoundary,
}
