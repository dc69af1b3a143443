//! Compile errors and the sink they are delivered through.

use crate::location::{ErrorLocation, LineColumn};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// One definition involved in a duplicate-fragment conflict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FragmentSide {
    pub file_path: Arc<str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<LineColumn>,
    pub text: Arc<str>,
}

/// What went wrong, with the context needed to fix it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum CompileErrorKind {
    /// A document failed one of the pre-collection validation rules. The
    /// whole document was excluded.
    #[error("{message}")]
    StructuralValidation { message: String },

    /// Two fragments share a name but not a body. Neither is usable.
    #[error(
        "Found two different GraphQL fragments with identical name \"{fragment_name}\". \
         Fragment names must be unique"
    )]
    DuplicateFragment {
        fragment_name: Arc<str>,
        left: FragmentSide,
        right: FragmentSide,
    },

    /// A spread names a fragment with no surviving definition.
    #[error(
        "The fragment \"{fragment_name}\" does not exist.{}",
        suggestion(.closest_fragment.as_deref())
    )]
    UnknownFragment {
        fragment_name: Arc<str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        closest_fragment: Option<Arc<str>>,
        operation_name: Arc<str>,
        operation_path: Arc<str>,
    },

    /// A file holds more than one operation.
    #[error(
        "Multiple \"root\" queries found: \"{name}\" and \"{other_name}\". \
         Only the first (\"{other_name}\") will be registered."
    )]
    MultipleRootOperations {
        name: Arc<str>,
        other_name: Arc<str>,
        #[serde(skip_serializing_if = "Option::is_none")]
        other_location: Option<LineColumn>,
    },

    /// The assembled document failed full validation.
    #[error("{message}")]
    SchemaValidation {
        message: String,
        operation_name: Arc<str>,
        operation_path: Arc<str>,
    },

    /// Fragment spreads loop back on themselves. `cycle` lists the fragments
    /// passed through on the way back, empty for a direct self-spread.
    #[error("Cannot spread fragment \"{fragment_name}\" within itself{}.", via(.cycle))]
    FragmentCycle {
        fragment_name: Arc<str>,
        cycle: Vec<Arc<str>>,
    },
}

fn suggestion(closest: Option<&str>) -> String {
    closest.map_or_else(String::new, |name| format!(" Did you mean \"{name}\"?"))
}

fn via(cycle: &[Arc<str>]) -> String {
    if cycle.is_empty() {
        return String::new();
    }
    let names: Vec<String> = cycle.iter().map(|name| format!("\"{name}\"")).collect();
    format!(" via {}", names.join(", "))
}

impl CompileErrorKind {
    /// Stable string tag for this kind.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::StructuralValidation { .. } => "structural-validation",
            Self::DuplicateFragment { .. } => "duplicate-fragment",
            Self::UnknownFragment { .. } => "unknown-fragment",
            Self::MultipleRootOperations { .. } => "multiple-root-operations",
            Self::SchemaValidation { .. } => "schema-validation",
            Self::FragmentCycle { .. } => "fragment-cycle",
        }
    }

    /// Stable numeric code, shared with the reporting layer's error catalogue.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::StructuralValidation { .. } | Self::SchemaValidation { .. } => "85901",
            Self::UnknownFragment { .. } => "85908",
            Self::MultipleRootOperations { .. } => "85910",
            Self::DuplicateFragment { .. } => "85919",
            Self::FragmentCycle { .. } => "85920",
        }
    }
}

/// A located compile failure.
///
/// `file_path` is always the file that `location` points into.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{file_path}{}: {kind}", .location.map(|l| format!(":{l}")).unwrap_or_default())]
pub struct CompileError {
    pub kind: CompileErrorKind,
    pub file_path: Arc<str>,
    pub location: Option<ErrorLocation>,
}

impl CompileError {
    #[must_use]
    pub const fn new(kind: CompileErrorKind, file_path: Arc<str>, location: Option<ErrorLocation>) -> Self {
        Self {
            kind,
            file_path,
            location,
        }
    }

    #[must_use]
    pub const fn tag(&self) -> &'static str {
        self.kind.tag()
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind.code()
    }
}

impl Serialize for CompileError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = if self.location.is_some() { 5 } else { 4 };
        let mut state = serializer.serialize_struct("CompileError", fields)?;
        state.serialize_field("kind", self.kind.tag())?;
        state.serialize_field("code", self.kind.code())?;
        state.serialize_field("filePath", &self.file_path)?;
        if let Some(location) = &self.location {
            state.serialize_field("location", location)?;
        } else {
            state.skip_field("location")?;
        }
        state.serialize_field("context", &self.kind)?;
        state.end()
    }
}

/// Receives errors as a compile pass discovers them.
pub trait ErrorSink {
    fn report(&mut self, error: CompileError);
}

impl ErrorSink for Vec<CompileError> {
    fn report(&mut self, error: CompileError) {
        self.push(error);
    }
}

impl<F> ErrorSink for F
where
    F: FnMut(CompileError),
{
    fn report(&mut self, error: CompileError) {
        self(error);
    }
}
