// Permissions module - account capability descriptors

mod policy;

pub use policy::*;
