/*
 *
 *  * Copyright (c) 2025 Couchbase, Inc.
 *  *
 *  * Licensed under the Apache License, Version 2.0 (the "License");
 *  * you may not use this file except in compliance with the License.
 *  * You may obtain a copy of the License at
 *  *
 *  *    http://www.apache.org/licenses/LICENSE-2.0
 *  *
 *  * Unless required by applicable law or agreed to in writing, software
 *  * distributed under the License is distributed on an "AS IS" BASIS,
 *  * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 *  * See the License for the specific language governing permissions and
 *  * limitations under the License.
 *
 */

use std::error::Error as StdError;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

pub type Result<T> = std::result::Result<T, Error>;

type Source = Arc<dyn StdError + Send + Sync>;

#[derive(Debug, Clone)]
pub struct Error {
    kind: Box<ErrorKind>,
    source: Option<Source>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind: Box::new(kind),
            source: None,
        }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// The human readable message for this error, without any source.
    pub fn message(&self) -> String {
        self.kind.to_string()
    }

    pub fn invalid_argument(arg: impl Into<Option<String>>, msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument(InvalidArgumentErrorKind {
            msg: msg.into(),
            arg: arg.into(),
        }))
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport { msg: msg.into() })
    }

    pub fn command_failed(code: impl Into<Option<i32>>, msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::CommandFailed {
            code: code.into(),
            msg: msg.into(),
        })
    }

    pub fn other_failure(msg: impl Into<String>) -> Self {
        Self::new(ErrorKind::OtherFailure(msg.into()))
    }

    pub(crate) fn cast(
        path: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::new(ErrorKind::Cast(CastErrorKind {
            path: path.into(),
            value: value.into(),
            expected: expected.into(),
        }))
    }

    pub(crate) fn strict_mode(path: impl Into<String>) -> Self {
        Self::new(ErrorKind::StrictMode { path: path.into() })
    }

    pub(crate) fn request_canceled() -> Self {
        Self::new(ErrorKind::RequestCanceled)
    }

    // We don't use a From impl as it'd be a blanket coverage and we want to
    // distinguish encoding from decoding.
    pub(crate) fn encoding_failure_from_serde(e: serde_json::Error) -> Self {
        Self::new(ErrorKind::EncodingFailure(format!("encoding failed: {e}")))
    }

    // We don't use a From impl as it'd be a blanket coverage and we want to
    // distinguish encoding from decoding.
    pub(crate) fn decoding_failure_from_serde(e: serde_json::Error) -> Self {
        Self::new(ErrorKind::DecodingFailure(format!("decoding failed: {e}")))
    }

    pub fn with(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind)
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|cause| &**cause as &(dyn StdError + 'static))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    InvalidArgument(InvalidArgumentErrorKind),
    Cast(CastErrorKind),
    #[non_exhaustive]
    StrictMode {
        path: String,
    },
    #[non_exhaustive]
    CommandFailed {
        code: Option<i32>,
        msg: String,
    },
    #[non_exhaustive]
    Transport {
        msg: String,
    },
    EncodingFailure(String),
    DecodingFailure(String),
    RequestCanceled,
    OtherFailure(String),
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            // Point validation messages are part of the public contract and
            // are reported verbatim.
            ErrorKind::InvalidArgument(kind) => write!(f, "{}", kind.msg),
            ErrorKind::Cast(kind) => write!(
                f,
                "Cast to {} failed for value \"{}\" at path \"{}\"",
                kind.expected, kind.value, kind.path
            ),
            ErrorKind::StrictMode { path } => write!(
                f,
                "Path \"{path}\" is not in schema and strictQuery is 'throw'"
            ),
            ErrorKind::CommandFailed { code, msg } => {
                write!(f, "command failed: {msg}")?;
                if let Some(code) = code {
                    write!(f, ", code: {code}")?;
                }
                Ok(())
            }
            ErrorKind::Transport { msg } => write!(f, "transport error: {msg}"),
            ErrorKind::EncodingFailure(msg) => write!(f, "encoding failure: {msg}"),
            ErrorKind::DecodingFailure(msg) => write!(f, "decoding failure: {msg}"),
            ErrorKind::RequestCanceled => write!(f, "request canceled"),
            ErrorKind::OtherFailure(msg) => write!(f, "{msg}"),
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct InvalidArgumentErrorKind {
    pub(crate) msg: String,
    pub arg: Option<String>,
}

impl InvalidArgumentErrorKind {
    pub fn msg(&self) -> &str {
        &self.msg
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct CastErrorKind {
    pub path: String,
    pub value: String,
    pub expected: String,
}
