//! MeshIO core library - geometry attribute model and mesh file codecs
//!
//! Reads and writes STL (binary and ASCII, several objects per file) and
//! Wavefront OBJ (with MTL materials) into a shared, tolerance-comparable
//! attribute model.

pub mod error;
pub mod geometry;
pub mod material;
pub mod obj;
pub mod stl;
pub mod util;
pub mod vector;

// Re-export commonly used types
pub use error::{MeshError, Result};
pub use geometry::{Facet, GeometryData, ObjAttribute, StlData};
pub use material::Material;
pub use obj::ObjData;
pub use stl::{StlFormat, WriteOptions};
pub use vector::{Vec2, Vec3, Vec4, Vector};
