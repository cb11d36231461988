//! Type system for the shadec IR.

use crate::arena::Handle;
use crate::global::StorageAccess;

/// Width of a scalar type in bytes.
pub type Bytes = u8;

/// The kind of a scalar type.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum ScalarKind {
    /// Boolean.
    Bool,
    /// Signed integer.
    Sint,
    /// Unsigned integer.
    Uint,
    /// Floating point.
    Float,
}

/// A scalar type: kind + byte width.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Scalar {
    pub kind: ScalarKind,
    pub width: Bytes,
}

impl Scalar {
    pub const BOOL: Self = Self {
        kind: ScalarKind::Bool,
        width: 1,
    };
    pub const I32: Self = Self {
        kind: ScalarKind::Sint,
        width: 4,
    };
    pub const U32: Self = Self {
        kind: ScalarKind::Uint,
        width: 4,
    };
    pub const F16: Self = Self {
        kind: ScalarKind::Float,
        width: 2,
    };
    pub const F32: Self = Self {
        kind: ScalarKind::Float,
        width: 4,
    };
}

/// Number of components in a vector.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum VectorSize {
    /// 2 components.
    Bi = 2,
    /// 3 components.
    Tri = 3,
    /// 4 components.
    Quad = 4,
}

/// Size of an array.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum ArraySize {
    /// Fixed-size array.
    Constant(u32),
    /// Runtime-sized array.
    Dynamic,
}

/// Dimensionality of an image type.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum ImageDimension {
    D1,
    D2,
    D3,
    Cube,
}

/// Texel format of a storage image.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum StorageFormat {
    R32Uint,
    R32Sint,
    R32Float,
    Rg32Float,
    Rgba8Unorm,
    Rgba16Float,
    Rgba32Float,
}

/// What an image holds and how it may be accessed.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub enum ImageClass {
    /// A color image usable with a sampler.
    Sampled { kind: ScalarKind, multi: bool },
    /// A depth image usable with a comparison sampler.
    Depth,
    /// A storage image with direct texel access.
    Storage {
        format: StorageFormat,
        access: StorageAccess,
    },
}

/// A member of a struct type.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct StructMember {
    pub name: Option<String>,
    pub ty: Handle<Type>,
    pub offset: u32,
}

/// A named type.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Type {
    pub name: Option<String>,
    pub inner: TypeInner,
}

/// The concrete shape of a type.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub enum TypeInner {
    /// A single scalar value.
    Scalar(Scalar),
    /// A vector of scalars.
    Vector { size: VectorSize, scalar: Scalar },
    /// A matrix of column vectors.
    Matrix {
        columns: VectorSize,
        rows: VectorSize,
        scalar: Scalar,
    },
    /// An atomic scalar.
    Atomic(Scalar),
    /// A pointer to a value in a given address space.
    Pointer {
        base: Handle<Type>,
        space: crate::AddressSpace,
    },
    /// A fixed-size or runtime-sized array.
    Array {
        base: Handle<Type>,
        size: ArraySize,
        stride: u32,
    },
    /// A composite struct type.
    Struct {
        members: Vec<StructMember>,
        span: u32,
    },
    /// A texture. Lives in the `handle` address space.
    Image {
        dim: ImageDimension,
        arrayed: bool,
        class: ImageClass,
    },
    /// A sampler. Lives in the `handle` address space.
    Sampler { comparison: bool },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::UniqueArena;

    #[test]
    fn scalar_constants() {
        assert_eq!(Scalar::F32.kind, ScalarKind::Float);
        assert_eq!(Scalar::F32.width, 4);
        assert_eq!(Scalar::BOOL.width, 1);
        assert_eq!(Scalar::F16.width, 2);
    }

    #[test]
    fn type_dedup() {
        let mut types = UniqueArena::new();
        let t0 = types.insert(Type {
            name: None,
            inner: TypeInner::Scalar(Scalar::F32),
        });
        let t1 = types.insert(Type {
            name: None,
            inner: TypeInner::Scalar(Scalar::F32),
        });
        assert_eq!(t0, t1);
        assert_eq!(types.len(), 1);
    }

    #[test]
    fn image_types_distinct() {
        let mut types = UniqueArena::new();
        let sampled = types.insert(Type {
            name: None,
            inner: TypeInner::Image {
                dim: ImageDimension::D2,
                arrayed: false,
                class: ImageClass::Sampled {
                    kind: ScalarKind::Float,
                    multi: false,
                },
            },
        });
        let storage = types.insert(Type {
            name: None,
            inner: TypeInner::Image {
                dim: ImageDimension::D2,
                arrayed: false,
                class: ImageClass::Storage {
                    format: StorageFormat::Rgba8Unorm,
                    access: StorageAccess::STORE,
                },
            },
        });
        assert_ne!(sampled, storage);
        assert_eq!(types.len(), 2);
    }

    #[test]
    fn vector_size_values() {
        assert_eq!(VectorSize::Bi as u32, 2);
        assert_eq!(VectorSize::Tri as u32, 3);
        assert_eq!(VectorSize::Quad as u32, 4);
    }
}
