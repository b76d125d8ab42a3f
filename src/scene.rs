pub mod camera;
pub mod d_n;
pub mod mesh;
pub mod model;
pub mod selection;
pub mod texture;
pub mod utils;
