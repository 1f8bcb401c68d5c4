use log::{debug, trace, warn};

use crate::collision::CollisionMap;
use crate::entity::{Character, StepContext};
use crate::geometry::Aabb;
use crate::input::ControlState;
use crate::script::ScriptError;

// ── CharacterId ──────────────────────────────────────────────────────────────

/// Stable handle to a live character.  Never reused within one world.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CharacterId(u32);

impl CharacterId {
    pub fn index(self) -> u32 {
        self.0
    }
}

// ── TickReport ───────────────────────────────────────────────────────────────

/// Script failures from one logic tick.  A failure only cut short the
/// failing character's own step.
#[derive(Debug, Default)]
pub struct TickReport {
    pub errors: Vec<(CharacterId, ScriptError)>,
}

impl TickReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

// ── World ────────────────────────────────────────────────────────────────────

/// Owns the maps and characters of the loaded area.
#[derive(Debug, Default)]
pub struct World {
    maps: Vec<CollisionMap>,
    characters: Vec<(CharacterId, Character)>,
    next_id: u32,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_map(&mut self, map: CollisionMap) {
        self.maps.push(map);
    }

    pub fn maps(&self) -> &[CollisionMap] {
        &self.maps
    }

    /// Live characters in spawn order.
    pub fn characters(&self) -> impl Iterator<Item = (CharacterId, &Character)> {
        self.characters.iter().map(|(id, c)| (*id, c))
    }

    pub fn len(&self) -> usize {
        self.characters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    pub fn get(&self, id: CharacterId) -> Option<&Character> {
        self.characters.iter().find(|(i, _)| *i == id).map(|(_, c)| c)
    }

    pub fn get_mut(&mut self, id: CharacterId) -> Option<&mut Character> {
        self.characters.iter_mut().find(|(i, _)| *i == id).map(|(_, c)| c)
    }

    pub fn find(&self, name: &str) -> Option<CharacterId> {
        self.characters.iter().find(|(_, c)| c.name() == name).map(|(id, _)| *id)
    }

    /// Boxes of every live character except the one at `skip`.
    fn boxes_except(&self, skip: Option<usize>) -> Vec<Aabb> {
        self.characters
            .iter()
            .enumerate()
            .filter(|(i, _)| Some(*i) != skip)
            .map(|(_, (_, c))| c.bounds())
            .collect()
    }

    /// Run `character`'s init script and add it to the world.  On an init
    /// error the character is dropped and the error returned.
    pub fn spawn(&mut self, mut character: Character, input: &dyn ControlState) -> Result<CharacterId, ScriptError> {
        let others = self.boxes_except(None);
        let ctx = StepContext { maps: &self.maps, others: &others, input };
        character.init(&ctx)?;

        let id = CharacterId(self.next_id);
        self.next_id += 1;
        debug!("spawned '{}' as {:?} at {:?}", character.name(), id, character.position());
        self.characters.push((id, character));
        Ok(id)
    }

    pub fn despawn(&mut self, id: CharacterId) -> Option<Character> {
        let idx = self.characters.iter().position(|(i, _)| *i == id)?;
        Some(self.characters.remove(idx).1)
    }

    /// Unload the area: drop every character and map.
    pub fn clear(&mut self) {
        debug!("clearing world ({} characters, {} maps)", self.characters.len(), self.maps.len());
        self.characters.clear();
        self.maps.clear();
    }

    /// One logic tick: run every character's step script, in spawn order.
    ///
    /// Each character sees the positions other characters committed earlier
    /// in the same tick.
    pub fn step(&mut self, input: &dyn ControlState) -> TickReport {
        let mut report = TickReport::default();
        for i in 0..self.characters.len() {
            let others = self.boxes_except(Some(i));
            let ctx = StepContext { maps: &self.maps, others: &others, input };
            let (id, character) = &mut self.characters[i];
            if let Err(err) = character.step(&ctx) {
                warn!("step script of '{}' failed: {err}", character.name());
                report.errors.push((*id, err));
            }
        }
        trace!("stepped {} characters", self.characters.len());
        report
    }
}
