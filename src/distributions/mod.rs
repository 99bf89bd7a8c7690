//! Leaf samplers: distribution families, adapters and random matrices.
pub mod adapter;
pub mod families;
pub mod joint;
pub mod matrices;
pub mod special;

pub use adapter::{LeafSpec, Origin};
pub use families::{Family, LeafFamily};
pub use joint::JointFamily;
pub use matrices::{wigner, wishart};
