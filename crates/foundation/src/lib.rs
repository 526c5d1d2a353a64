pub mod bounds;
pub mod math;
pub mod route;

// Foundation crate: pure geodesy and route primitives only.
pub use bounds::*;
pub use route::*;
