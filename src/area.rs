// =============================================================================
// AREA.RS — Area definitions and world construction
//
// An area is described in JSON:
//
//   {
//     "name": "meadow",
//     "maps": [ { "tile_width": 16, "tile_height": 16, "tiles_wide": 20,
//                 "tiles": "<base64>", "collisions": "<base64>", "sheet": 0 } ],
//     "characters": [ { "name": "hero", "x": 40, "y": 40, "width": 12,
//                       "height": 14, "vars": ["speed"],
//                       "init": "set(speed, 2)", "step": "@walk" } ]
//   }
//
// A script section holds script text, or `@name` to use a script from a
// `ScriptLibrary` (e.g. `walk.jos` in a scripts folder).
// =============================================================================

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::collision::{CollisionMap, MapError};
use crate::entity::Character;
use crate::input::ControlState;
use crate::script::{DataError, Script, ScriptError};
use crate::world::World;

/// File extension of scripts picked up by [`ScriptLibrary::load_folder`].
pub const SCRIPT_EXTENSION: &str = "jos";

// ── AreaError ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum AreaError {
    #[error("malformed area definition: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to read {path:?}: {source}")]
    Io { path: PathBuf, source: std::io::Error },
    #[error("failed to scan script folder: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("map #{index}: {source}")]
    Map { index: usize, source: MapError },
    #[error("script '{name}': {source}")]
    Script { name: String, source: ScriptError },
    #[error("character '{character}' has no {section} script")]
    MissingScript { character: String, section: &'static str },
    #[error("no script named '{0}' in the library")]
    UnknownScript(String),
    #[error("character '{name}': {source}")]
    Character { name: String, source: DataError },
}

// ── Definitions ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDef {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub tile_width: u32,
    pub tile_height: u32,
    pub tiles_wide: usize,
    /// Base64 tile indices, row-major.
    pub tiles: String,
    /// Base64 nibble-packed quadrant masks.
    pub collisions: String,
    /// Tileset sheet number used when drawing.
    #[serde(default)]
    pub sheet: usize,
}

impl MapDef {
    pub fn build(&self) -> Result<CollisionMap, MapError> {
        let map = CollisionMap::from_base64(
            (self.x, self.y),
            (self.tile_width, self.tile_height),
            self.tiles_wide,
            &self.tiles,
            &self.collisions,
        )?;
        Ok(map.with_sheet(self.sheet))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDef {
    pub name: String,
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
    /// Sprite offset from the box center; defaults to half the size.
    #[serde(default)]
    pub origin: Option<(i32, i32)>,
    #[serde(default)]
    pub sheet: usize,
    #[serde(default)]
    pub vars: Vec<String>,
    #[serde(default)]
    pub init: Option<String>,
    #[serde(default)]
    pub step: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AreaDef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub maps: Vec<MapDef>,
    #[serde(default)]
    pub characters: Vec<CharacterDef>,
}

impl AreaDef {
    pub fn from_json(json: &str) -> Result<Self, AreaError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, AreaError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|source| AreaError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&json)
    }

    /// Replace `world` with this area.  The area is built aside first, so on
    /// error `world` still holds the previous area untouched.
    pub fn load_into(
        &self,
        world: &mut World,
        library: &ScriptLibrary,
        input: &dyn ControlState,
    ) -> Result<(), AreaError> {
        let built = self.build_world(library, input)?;
        world.clear();
        *world = built;
        Ok(())
    }

    /// Build a fresh world: maps first, then each character is constructed
    /// and spawned (running its init script).
    pub fn build_world(&self, library: &ScriptLibrary, input: &dyn ControlState) -> Result<World, AreaError> {
        let mut world = World::new();
        for (index, def) in self.maps.iter().enumerate() {
            let map = def.build().map_err(|source| AreaError::Map { index, source })?;
            world.add_map(map);
        }
        for def in &self.characters {
            let character = self.build_character(def, library)?;
            world
                .spawn(character, input)
                .map_err(|source| AreaError::Script { name: format!("{}.init", def.name), source })?;
        }
        debug!("built area '{}': {} maps, {} characters", self.name, world.maps().len(), world.len());
        Ok(world)
    }

    fn build_character(&self, def: &CharacterDef, library: &ScriptLibrary) -> Result<Character, AreaError> {
        let init = library.section(&def.name, "init", def.init.as_deref())?;
        let step = library.section(&def.name, "step", def.step.as_deref())?;
        let character = Character::new(
            def.name.clone(),
            (def.x, def.y),
            (def.width, def.height),
            &def.vars,
            init,
            step,
        )
        .map_err(|source| AreaError::Character { name: def.name.clone(), source })?;
        let character = character.with_sheet(def.sheet);
        Ok(match def.origin {
            Some(origin) => character.with_origin(origin),
            None => character,
        })
    }
}

// ── ScriptLibrary ────────────────────────────────────────────────────────────

/// Named, pre-parsed scripts shared between characters.
#[derive(Debug, Clone, Default)]
pub struct ScriptLibrary {
    scripts: HashMap<String, Arc<Script>>,
}

impl ScriptLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `source` and store it under `name`, replacing any previous one.
    pub fn insert(&mut self, name: &str, source: &str) -> Result<Arc<Script>, AreaError> {
        let script = Script::parse(source)
            .map_err(|source| AreaError::Script { name: name.to_string(), source })?;
        let script = Arc::new(script);
        self.scripts.insert(name.to_string(), Arc::clone(&script));
        Ok(script)
    }

    pub fn get(&self, name: &str) -> Option<Arc<Script>> {
        self.scripts.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }

    /// Scan `path` recursively for `*.jos` files; each is stored under its
    /// file stem.  Returns how many scripts were loaded.
    pub fn load_folder(&mut self, path: impl AsRef<Path>) -> Result<usize, AreaError> {
        let mut loaded = 0;
        for entry in walkdir::WalkDir::new(path) {
            let entry = entry?;
            let file_path = entry.path();
            if !entry.file_type().is_file()
                || file_path.extension().and_then(|s| s.to_str()) != Some(SCRIPT_EXTENSION)
            {
                continue;
            }
            let Some(name) = file_path.file_stem().and_then(|s| s.to_str()) else { continue };
            let source = std::fs::read_to_string(file_path)
                .map_err(|source| AreaError::Io { path: file_path.to_path_buf(), source })?;
            self.insert(name, &source)?;
            loaded += 1;
        }
        debug!("script library: loaded {loaded} scripts");
        Ok(loaded)
    }

    /// Resolve a character's script section: inline text or `@name`.
    fn section(&self, character: &str, section: &'static str, text: Option<&str>) -> Result<Arc<Script>, AreaError> {
        let Some(text) = text else {
            return Err(AreaError::MissingScript { character: character.to_string(), section });
        };
        if let Some(name) = text.trim().strip_prefix('@') {
            return self.get(name).ok_or_else(|| AreaError::UnknownScript(name.to_string()));
        }
        let script = Script::parse(text).map_err(|source| AreaError::Script {
            name: format!("{character}.{section}"),
            source,
        })?;
        Ok(Arc::new(script))
    }
}
