// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types shared by every layer of the engine.
//!
//! The taxonomy follows how callers are expected to react:
//! - [`CommitError`]: a configuration/programming mistake on one object. The
//!   object's previous compiled form stays published.
//! - [`RegistryError`]: recoverable lookup miss or misregistered factory;
//!   the caller picks a fallback.
//! - [`KernelError`]: the compute kernel rejected marshalled state.
//! - [`CollectiveError`]: a rank left the group's lock-step; always fatal.

use crate::object::ObjectCategory;
use std::fmt;

/// An error that occurred while committing a scene object.
#[derive(Debug, Clone, PartialEq)]
pub enum CommitError {
    /// A parameter required by the object's type was never set.
    MissingParameter {
        /// The registered type name of the object being committed.
        object_type: String,
        /// The name of the missing parameter.
        param: String,
    },
    /// A parameter was set with a value of the wrong kind or an out-of-range value.
    InvalidParameter {
        /// The registered type name of the object being committed.
        object_type: String,
        /// The name of the offending parameter.
        param: String,
        /// What the object expected.
        expected: String,
        /// What was actually stored.
        found: String,
    },
    /// An object referenced by a parameter has never been committed.
    UncommittedDependency {
        /// The registered type name of the object being committed.
        object_type: String,
        /// The parameter holding the reference.
        param: String,
        /// The type name of the referenced object.
        dependency: String,
    },
    /// The object was read before its first successful commit.
    NotCommitted {
        /// The registered type name of the object.
        object_type: String,
    },
    /// The compute kernel refused to compile the marshalled state.
    Kernel {
        /// The registered type name of the object being committed.
        object_type: String,
        /// The kernel's error.
        source: KernelError,
    },
}

impl fmt::Display for CommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommitError::MissingParameter { object_type, param } => {
                write!(f, "'{object_type}' is missing required parameter '{param}'")
            }
            CommitError::InvalidParameter {
                object_type,
                param,
                expected,
                found,
            } => write!(
                f,
                "'{object_type}' parameter '{param}' is invalid: expected {expected}, found {found}"
            ),
            CommitError::UncommittedDependency {
                object_type,
                param,
                dependency,
            } => write!(
                f,
                "'{object_type}' parameter '{param}' references an uncommitted '{dependency}'"
            ),
            CommitError::NotCommitted { object_type } => {
                write!(f, "'{object_type}' has not been committed")
            }
            CommitError::Kernel {
                object_type,
                source,
            } => write!(f, "kernel failed to compile '{object_type}': {source}"),
        }
    }
}

impl std::error::Error for CommitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CommitError::Kernel { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// An error returned by [`TypeRegistry`](crate::registry::TypeRegistry) lookups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// No factory is registered under `(category, name)`.
    UnknownType {
        /// The category that was searched.
        category: ObjectCategory,
        /// The requested type name.
        name: String,
    },
    /// The factory registered under `(requested, name)` built a kind of
    /// another category.
    CategoryMismatch {
        /// The category that was asked for.
        requested: ObjectCategory,
        /// The category of the kind the factory built.
        built: ObjectCategory,
        /// The requested type name.
        name: String,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryError::UnknownType { category, name } => {
                write!(f, "unknown {category} type '{name}'")
            }
            RegistryError::CategoryMismatch {
                requested,
                built,
                name,
            } => write!(f, "{requested} type '{name}' is registered with a {built} factory"),
        }
    }
}

impl std::error::Error for RegistryError {}

/// An error reported by a [`ComputeKernel`](crate::kernel::ComputeKernel).
#[derive(Debug, Clone, PartialEq)]
pub enum KernelError {
    /// The kernel has no implementation for the requested object variant.
    Unsupported(String),
    /// The marshalled description is inconsistent (e.g. index out of range).
    InvalidInput(String),
    /// A handle produced by another kernel (or for another category) was passed in.
    HandleMismatch {
        /// The handle type the kernel expected.
        expected: &'static str,
    },
    /// The tile's storage does not match its rectangle.
    TileShape {
        /// Pixels described by the tile rectangle.
        expected: usize,
        /// Pixels actually stored.
        found: usize,
    },
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::Unsupported(what) => write!(f, "unsupported by kernel: {what}"),
            KernelError::InvalidInput(msg) => write!(f, "invalid kernel input: {msg}"),
            KernelError::HandleMismatch { expected } => {
                write!(f, "kernel handle mismatch: expected {expected}")
            }
            KernelError::TileShape { expected, found } => {
                write!(f, "tile holds {found} pixels but its rectangle covers {expected}")
            }
        }
    }
}

impl std::error::Error for KernelError {}

/// An error raised by a [`Collective`](crate::collective::Collective).
///
/// Every variant is fatal for the distributed job: there is no partial-group
/// recovery, and the caller is expected to abort the whole run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectiveError {
    /// A peer did not reach the collective operation in time.
    Timeout {
        /// The rank that gave up waiting.
        rank: usize,
        /// The operation being waited on.
        operation: &'static str,
        /// How long the rank waited, in milliseconds.
        waited_ms: u64,
    },
    /// Ranks entered different collective operations.
    Mismatch {
        /// The rank that observed the mismatch.
        rank: usize,
        /// What the rank expected to receive.
        expected: String,
        /// What it actually received.
        received: String,
    },
    /// The group was aborted by one of its members.
    Aborted {
        /// The reason given by the aborting rank.
        reason: String,
    },
    /// A peer disconnected (its process or thread terminated).
    Disconnected {
        /// The rank that observed the disconnection.
        rank: usize,
    },
    /// The root rank of an operation is outside the group.
    InvalidRoot {
        /// The requested root.
        root: usize,
        /// The size of the group.
        world_size: usize,
    },
}

impl fmt::Display for CollectiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectiveError::Timeout {
                rank,
                operation,
                waited_ms,
            } => write!(
                f,
                "rank {rank} timed out after {waited_ms} ms waiting in {operation}"
            ),
            CollectiveError::Mismatch {
                rank,
                expected,
                received,
            } => write!(
                f,
                "collective mismatch on rank {rank}: expected {expected}, received {received}"
            ),
            CollectiveError::Aborted { reason } => write!(f, "collective group aborted: {reason}"),
            CollectiveError::Disconnected { rank } => {
                write!(f, "rank {rank} lost its connection to the group")
            }
            CollectiveError::InvalidRoot { root, world_size } => {
                write!(f, "root rank {root} is outside a group of {world_size}")
            }
        }
    }
}

impl std::error::Error for CollectiveError {}

/// An error raised by a [`Presenter`](crate::platform::Presenter).
#[derive(Debug)]
pub enum PresentError {
    /// The presented frame does not match the presenter's size.
    SizeMismatch {
        /// The presenter's size.
        expected: (u32, u32),
        /// The frame's size.
        found: (u32, u32),
    },
    /// The backend failed to display or store the frame.
    Backend(String),
}

impl fmt::Display for PresentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresentError::SizeMismatch { expected, found } => write!(
                f,
                "frame is {}x{} but the presenter expects {}x{}",
                found.0, found.1, expected.0, expected.1
            ),
            PresentError::Backend(msg) => write!(f, "presentation failed: {msg}"),
        }
    }
}

impl std::error::Error for PresentError {}

/// An error raised while loading or validating configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    Io {
        /// The path that was read.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The configuration text is not valid JSON for the expected schema.
    Parse(serde_json::Error),
    /// A value is out of its accepted range.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read configuration '{path}': {source}")
            }
            ConfigError::Parse(err) => write!(f, "failed to parse configuration: {err}"),
            ConfigError::Invalid(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_commit_error_names_object_and_parameter() {
        let err = CommitError::MissingParameter {
            object_type: "spheres".to_string(),
            param: "spheres".to_string(),
        };
        assert_eq!(
            format!("{err}"),
            "'spheres' is missing required parameter 'spheres'"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn test_commit_error_wraps_kernel_error() {
        let err = CommitError::Kernel {
            object_type: "structured_regular".to_string(),
            source: KernelError::InvalidInput("empty grid".to_string()),
        };
        assert_eq!(
            format!("{err}"),
            "kernel failed to compile 'structured_regular': invalid kernel input: empty grid"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_registry_error_display() {
        let err = RegistryError::UnknownType {
            category: ObjectCategory::Light,
            name: "spot".to_string(),
        };
        assert_eq!(format!("{err}"), "unknown light type 'spot'");
    }

    #[test]
    fn test_collective_error_display() {
        let err = CollectiveError::Timeout {
            rank: 3,
            operation: "broadcast",
            waited_ms: 500,
        };
        assert_eq!(
            format!("{err}"),
            "rank 3 timed out after 500 ms waiting in broadcast"
        );
    }
}
