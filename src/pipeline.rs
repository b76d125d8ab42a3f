pub mod benchmark;
pub mod frame;
pub mod passes;
pub mod render_target;
pub mod renderer;
pub mod shaders;
pub mod skybox;
