//! Error type shared by the render model, layout, and import path.

use std::{error, fmt, result};

use crate::graph::NodeId;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorCode {
    DuplicateNode,
    DuplicateEdge,
    InvalidSpan,
    InvalidHeight,
    InvalidPosition,
    SelfLoop,
    UnknownNode,
    DisconnectedNode,
    EdgeOutsideSpan,
    Cycle,
    StaleLayout,
    MissingSourceNode,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ErrorCode::*;
        let name = match self {
            DuplicateNode => "duplicate_node",
            DuplicateEdge => "duplicate_edge",
            InvalidSpan => "invalid_span",
            InvalidHeight => "invalid_height",
            InvalidPosition => "invalid_position",
            SelfLoop => "self_loop",
            UnknownNode => "unknown_node",
            DisconnectedNode => "disconnected_node",
            EdgeOutsideSpan => "edge_outside_span",
            Cycle => "cycle",
            StaleLayout => "stale_layout",
            MissingSourceNode => "missing_source_node",
        };

        write!(f, "{}", name)
    }
}

/// Which stage of the model lifecycle rejected the input.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// An `add_node`/`add_edge` call was refused; the model is unchanged.
    Construction,
    /// `rebuild(validate = true)` found a malformed graph. The model stays
    /// dirty and should be discarded or rebuilt from scratch.
    Validation,
    /// Layout could not be computed or was queried while stale.
    Layout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    pub code: ErrorCode,
    pub details: Option<String>,
}

impl Error {
    pub fn new(kind: ErrorKind, code: ErrorCode, details: Option<String>) -> Self {
        Error {
            kind,
            code,
            details,
        }
    }

    pub(crate) fn construction(code: ErrorCode, details: String) -> Self {
        Error::new(ErrorKind::Construction, code, Some(details))
    }

    pub(crate) fn validation(code: ErrorCode, details: String) -> Self {
        Error::new(ErrorKind::Validation, code, Some(details))
    }

    pub(crate) fn unknown_node(id: NodeId, role: &str) -> Self {
        Error::validation(
            ErrorCode::UnknownNode,
            format!("edge references unknown {} {}", role, id),
        )
    }

    pub(crate) fn stale() -> Self {
        Error::new(
            ErrorKind::Layout,
            ErrorCode::StaleLayout,
            Some("model was mutated since the last rebuild".to_owned()),
        )
    }

    pub fn get_details(&self) -> Option<String> {
        self.details.clone()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind = match self.kind {
            ErrorKind::Construction => "ConstructionError",
            ErrorKind::Validation => "ValidationError",
            ErrorKind::Layout => "LayoutError",
        };
        match self.details {
            Some(ref details) => write!(f, "{}{{{}: {}}}", kind, self.code, details),
            None => write!(f, "{}{{{}}}", kind, self.code),
        }
    }
}

impl error::Error for Error {}

pub type Result<T> = result::Result<T, Error>;
