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

//! Untyped parameters assigned to scene objects before they are committed.
//!
//! Assignment never fails: any [`ParamValue`] can be stored under any name.
//! Types are only checked when an object's kind reads its parameters during
//! commit, through a [`ParamReader`] that knows which object type it reports
//! errors for.

use crate::error::CommitError;
use crate::math::{Vec3, Vec3i};
use crate::object::ObjectRef;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// An immutable, shareable block of bytes interpreted as `count` elements of
/// `stride` bytes each.
///
/// Cloning is cheap; parameter snapshots taken at commit time share storage
/// with the caller's buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct DataBuffer {
    bytes: Arc<[u8]>,
    stride: usize,
}

impl DataBuffer {
    /// Wraps raw bytes with an explicit element stride.
    ///
    /// A trailing partial element is ignored by element accessors.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>, stride: usize) -> Self {
        Self {
            bytes: bytes.into(),
            stride: stride.max(1),
        }
    }

    /// Copies a slice of plain-old-data values into a buffer whose stride is
    /// the size of `T`.
    pub fn from_slice<T: bytemuck::Pod>(values: &[T]) -> Self {
        Self::from_bytes(
            bytemuck::cast_slice::<T, u8>(values).to_vec(),
            std::mem::size_of::<T>(),
        )
    }

    /// The same bytes viewed with another stride.
    pub fn with_stride(&self, stride: usize) -> Self {
        Self {
            bytes: self.bytes.clone(),
            stride: stride.max(1),
        }
    }

    /// The raw bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The distance in bytes between consecutive elements.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// The number of complete elements.
    pub fn len(&self) -> usize {
        self.bytes.len() / self.stride
    }

    /// `true` when the buffer holds no complete element.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bytes of element `index`.
    pub fn element(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(self.stride)?;
        self.bytes.get(start..start + self.stride)
    }

    /// Reads a `T` located `offset` bytes into element `index`.
    ///
    /// Reads are unaligned, so any stride/offset combination works.
    pub fn read<T: bytemuck::Pod>(&self, index: usize, offset: usize) -> Option<T> {
        let size = std::mem::size_of::<T>();
        if offset + size > self.stride {
            return None;
        }
        let element = self.element(index)?;
        Some(bytemuck::pod_read_unaligned(&element[offset..offset + size]))
    }

    /// Reads one `T` per element at `offset`, `None` if `T` does not fit.
    pub fn read_all<T: bytemuck::Pod>(&self, offset: usize) -> Option<Vec<T>> {
        if offset + std::mem::size_of::<T>() > self.stride {
            return None;
        }
        (0..self.len()).map(|i| self.read(i, offset)).collect()
    }
}

impl fmt::Debug for DataBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataBuffer")
            .field("bytes", &self.bytes.len())
            .field("stride", &self.stride)
            .finish()
    }
}

/// A tagged parameter value.
#[derive(Debug, Clone)]
pub enum ParamValue {
    /// A signed integer.
    Int(i32),
    /// A float.
    Float(f32),
    /// Two floats.
    Vec2([f32; 2]),
    /// Three floats.
    Vec3(Vec3),
    /// Four floats.
    Vec4([f32; 4]),
    /// Three integers.
    Vec3i(Vec3i),
    /// A string.
    String(String),
    /// A reference to another scene object.
    Object(ObjectRef),
    /// An array of scene objects (e.g. a renderer's lights).
    ObjectList(Vec<ObjectRef>),
    /// An opaque strided byte buffer.
    Data(DataBuffer),
}

impl ParamValue {
    /// A short name for the variant, used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Vec2(_) => "vec2f",
            ParamValue::Vec3(_) => "vec3f",
            ParamValue::Vec4(_) => "vec4f",
            ParamValue::Vec3i(_) => "vec3i",
            ParamValue::String(_) => "string",
            ParamValue::Object(_) => "object",
            ParamValue::ObjectList(_) => "object list",
            ParamValue::Data(_) => "data",
        }
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v)
    }
}

impl From<Vec3> for ParamValue {
    fn from(v: Vec3) -> Self {
        ParamValue::Vec3(v)
    }
}

impl From<[f32; 3]> for ParamValue {
    fn from(v: [f32; 3]) -> Self {
        ParamValue::Vec3(v.into())
    }
}

impl From<[f32; 4]> for ParamValue {
    fn from(v: [f32; 4]) -> Self {
        ParamValue::Vec4(v)
    }
}

impl From<Vec3i> for ParamValue {
    fn from(v: Vec3i) -> Self {
        ParamValue::Vec3i(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::String(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::String(v)
    }
}

impl From<ObjectRef> for ParamValue {
    fn from(v: ObjectRef) -> Self {
        ParamValue::Object(v)
    }
}

impl From<Vec<ObjectRef>> for ParamValue {
    fn from(v: Vec<ObjectRef>) -> Self {
        ParamValue::ObjectList(v)
    }
}

impl From<DataBuffer> for ParamValue {
    fn from(v: DataBuffer) -> Self {
        ParamValue::Data(v)
    }
}

/// A mapping from parameter name to value.
#[derive(Debug, Clone, Default)]
pub struct ParamSet {
    values: HashMap<String, ParamValue>,
}

impl ParamSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores or overwrites a value.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        self.values.insert(name.into(), value.into());
    }

    /// Returns the raw value stored under `name`.
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    /// Removes a value, returning it.
    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        self.values.remove(name)
    }

    /// `true` if a value is stored under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of stored parameters.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` when no parameter is stored.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates over the parameter names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// A typed view reporting errors on behalf of `object_type`.
    pub fn reader<'a>(&'a self, object_type: &'a str) -> ParamReader<'a> {
        ParamReader {
            params: self,
            object_type,
        }
    }
}

/// Typed, validating access to a [`ParamSet`] during commit.
#[derive(Clone, Copy)]
pub struct ParamReader<'a> {
    params: &'a ParamSet,
    object_type: &'a str,
}

macro_rules! typed_readers {
    ($( $(#[$doc:meta])* $get:ident, $or:ident, $require:ident => $ty:ty, $expected:literal, |$v:ident| $extract:expr; )*) => {
        $(
            $(#[$doc])*
            pub fn $get(&self, name: &str) -> Result<Option<$ty>, CommitError> {
                match self.params.get(name) {
                    None => Ok(None),
                    Some($v) => match $extract {
                        Some(value) => Ok(Some(value)),
                        None => Err(self.invalid(name, $expected, $v.kind_name())),
                    },
                }
            }

            /// Like the plain reader, substituting `default` when unset.
            pub fn $or(&self, name: &str, default: $ty) -> Result<$ty, CommitError> {
                Ok(self.$get(name)?.unwrap_or(default))
            }

            /// Like the plain reader, failing with `MissingParameter` when unset.
            pub fn $require(&self, name: &str) -> Result<$ty, CommitError> {
                self.$get(name)?.ok_or_else(|| self.missing(name))
            }
        )*
    };
}

impl<'a> ParamReader<'a> {
    /// The object type errors are reported for.
    pub fn object_type(&self) -> &'a str {
        self.object_type
    }

    /// The underlying set.
    pub fn params(&self) -> &'a ParamSet {
        self.params
    }

    /// Builds a `MissingParameter` error for `name`.
    pub fn missing(&self, name: &str) -> CommitError {
        CommitError::MissingParameter {
            object_type: self.object_type.to_string(),
            param: name.to_string(),
        }
    }

    /// Builds an `InvalidParameter` error for `name`.
    pub fn invalid(&self, name: &str, expected: &str, found: &str) -> CommitError {
        CommitError::InvalidParameter {
            object_type: self.object_type.to_string(),
            param: name.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    typed_readers! {
        /// Reads an integer.
        int, int_or, require_int => i32, "int", |v| match v {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        };
        /// Reads a float; integers are widened.
        float, float_or, require_float => f32, "float", |v| match v {
            ParamValue::Float(x) => Some(*x),
            ParamValue::Int(i) => Some(*i as f32),
            _ => None,
        };
        /// Reads a three-float vector.
        vec3, vec3_or, require_vec3 => Vec3, "vec3f", |v| match v {
            ParamValue::Vec3(x) => Some(*x),
            _ => None,
        };
        /// Reads a three-integer vector.
        vec3i, vec3i_or, require_vec3i => Vec3i, "vec3i", |v| match v {
            ParamValue::Vec3i(x) => Some(*x),
            _ => None,
        };
        /// Reads a string.
        string, string_or, require_string => String, "string", |v| match v {
            ParamValue::String(s) => Some(s.clone()),
            _ => None,
        };
        /// Reads a data buffer.
        data, data_or, require_data => DataBuffer, "data", |v| match v {
            ParamValue::Data(d) => Some(d.clone()),
            _ => None,
        };
        /// Reads an object reference.
        object, object_or, require_object => ObjectRef, "object", |v| match v {
            ParamValue::Object(o) => Some(o.clone()),
            _ => None,
        };
        /// Reads an object list; a single object reads as a one-element list.
        objects, objects_or, require_objects => Vec<ObjectRef>, "object list", |v| match v {
            ParamValue::ObjectList(list) => Some(list.clone()),
            ParamValue::Object(o) => Some(vec![o.clone()]),
            _ => None,
        };
    }

    /// Reads a color from a `vec3f` (opaque) or `vec4f` parameter.
    pub fn color_or(
        &self,
        name: &str,
        default: crate::math::LinearRgba,
    ) -> Result<crate::math::LinearRgba, CommitError> {
        match self.params.get(name) {
            None => Ok(default),
            Some(ParamValue::Vec3(v)) => Ok(crate::math::LinearRgba::from_vec3(*v)),
            Some(ParamValue::Vec4(v)) => Ok(crate::math::LinearRgba::new(v[0], v[1], v[2], v[3])),
            Some(other) => Err(self.invalid(name, "vec3f or vec4f", other.kind_name())),
        }
    }
}
