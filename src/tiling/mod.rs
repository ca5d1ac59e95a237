pub mod resolve;
pub mod surface;
pub mod tile_transform;
pub mod uv_transform;
