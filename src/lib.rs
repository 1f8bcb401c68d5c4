pub mod area;
pub mod collision;
pub mod engine;
pub mod entity;
pub mod geometry;
pub mod input;
pub mod movement;
pub mod renderer;
pub mod script;
pub mod world;

pub use area::{AreaDef, AreaError, ScriptLibrary};
pub use engine::{Engine, EngineBuilder, FrameLoop};
pub use script::{Script, ScriptError};
pub use world::{CharacterId, World};
