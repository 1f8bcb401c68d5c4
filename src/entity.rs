use std::sync::Arc;

use crate::collision::CollisionMap;
use crate::geometry::Aabb;
use crate::input::{Control, ControlState};
use crate::movement::{Obstacle, resolve_move, snap_toward};
use crate::script::{DataError, DataObject, Scope, Script, ScriptError, Value, resolve};

/// Variables every character declares before its custom ones.
pub const BUILTIN_VARS: [&str; 4] = ["x", "y", "dir", "frame"];

/// Verbs whose first argument names a variable to be written.
const MUTATING_VERBS: [&str; 5] = ["declare", "set", "increment", "mod_increment", "void"];

// ── StepContext ──────────────────────────────────────────────────────────────

/// What a character can see of the world while one of its scripts runs.
pub struct StepContext<'a> {
    pub maps: &'a [CollisionMap],
    /// Boxes of every *other* live character.
    pub others: &'a [Aabb],
    pub input: &'a dyn ControlState,
}

impl StepContext<'_> {
    fn obstacles(&self) -> Vec<&dyn Obstacle> {
        self.maps
            .iter()
            .map(|m| m as &dyn Obstacle)
            .chain(self.others.iter().map(|b| b as &dyn Obstacle))
            .collect()
    }
}

// ── Character ────────────────────────────────────────────────────────────────

/// A scripted, box-shaped actor.
///
/// Position, direction and animation frame live in the character's data
/// object as `x`, `y`, `dir` and `frame`, so scripts and the renderer share
/// one source of truth.
#[derive(Debug, Clone)]
pub struct Character {
    name: String,
    width: u32,
    height: u32,
    /// Offset from the box center to the sprite's top-left, in pixels.
    origin: (i32, i32),
    sheet: usize,
    data: DataObject,
    init: Arc<Script>,
    step: Arc<Script>,
}

impl Character {
    /// Build a character centered at `position`.  `vars` are extra variable
    /// names declared (as zero) after the built-ins.
    pub fn new<S: AsRef<str>>(
        name: impl Into<String>,
        position: (Value, Value),
        size: (u32, u32),
        vars: &[S],
        init: Arc<Script>,
        step: Arc<Script>,
    ) -> Result<Self, DataError> {
        let mut data = DataObject::new();
        data.declare_with("x", position.0)?;
        data.declare_with("y", position.1)?;
        data.declare("dir")?;
        data.declare("frame")?;
        for var in vars {
            data.declare(var.as_ref())?;
        }
        Ok(Self {
            name: name.into(),
            width: size.0,
            height: size.1,
            origin: (size.0 as i32 / 2, size.1 as i32 / 2),
            sheet: 0,
            data,
            init,
            step,
        })
    }

    pub fn with_origin(mut self, origin: (i32, i32)) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_sheet(mut self, sheet: usize) -> Self {
        self.sheet = sheet;
        self
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn size(&self) -> (u32, u32) { (self.width, self.height) }
    pub fn origin(&self) -> (i32, i32) { self.origin }
    pub fn sheet(&self) -> usize { self.sheet }
    pub fn data(&self) -> &DataObject { &self.data }
    pub fn data_mut(&mut self) -> &mut DataObject { &mut self.data }
    pub fn init_script(&self) -> &Script { &self.init }
    pub fn step_script(&self) -> &Script { &self.step }

    fn var(&self, name: &str) -> Value {
        self.data.value(name).unwrap_or_default()
    }

    pub fn position(&self) -> (Value, Value) {
        (self.var("x"), self.var("y"))
    }

    pub fn dir(&self) -> Value {
        self.var("dir")
    }

    pub fn frame(&self) -> Value {
        self.var("frame")
    }

    /// Current bounding box.
    pub fn bounds(&self) -> Aabb {
        let (x, y) = self.position();
        Aabb::new(x as f64, y as f64, self.width as f64, self.height as f64)
    }

    /// Move by (`dx`, `dy`) as far as the world allows and commit the result
    /// to `x`/`y`.  Returns the new position.
    pub fn target_by(&mut self, dx: Value, dy: Value, ctx: &StepContext<'_>) -> Result<(Value, Value), DataError> {
        let (x, y) = self.position();
        let (nx, ny) = resolve_move(&self.bounds(), dx as f64, dy as f64, &ctx.obstacles())
            .map_err(|e| DataError::Host(e.to_string()))?;
        let moved = (snap_toward(x, nx), snap_toward(y, ny));
        self.data.set("x", moved.0)?;
        self.data.set("y", moved.1)?;
        Ok(moved)
    }

    /// Move toward the point (`tx`, `ty`).
    pub fn target(&mut self, tx: Value, ty: Value, ctx: &StepContext<'_>) -> Result<(Value, Value), DataError> {
        let (x, y) = self.position();
        let (Some(dx), Some(dy)) = (tx.checked_sub(x), ty.checked_sub(y)) else {
            return Err(DataError::Host(format!("target ({tx}, {ty}) is out of reach from ({x}, {y})")));
        };
        self.target_by(dx, dy, ctx)
    }

    /// Run the init script.
    pub fn init(&mut self, ctx: &StepContext<'_>) -> Result<(), ScriptError> {
        let script = Arc::clone(&self.init);
        script.run(&mut CharacterScope { character: self, ctx })
    }

    /// Run the step script once.
    pub fn step(&mut self, ctx: &StepContext<'_>) -> Result<(), ScriptError> {
        let script = Arc::clone(&self.step);
        script.run(&mut CharacterScope { character: self, ctx })
    }
}

// ── CharacterScope ───────────────────────────────────────────────────────────

/// Script scope of a running character: its data object, the `key_*`
/// pseudo-variables, and the movement methods `target` and `target_by`.
pub struct CharacterScope<'c, 'w> {
    pub character: &'c mut Character,
    pub ctx: &'c StepContext<'w>,
}

impl CharacterScope<'_, '_> {
    fn two_values(&self, name: &str, args: &[String]) -> Result<(Value, Value), DataError> {
        match args {
            [a, b] => Ok((resolve(self, a)?, resolve(self, b)?)),
            _ => Err(DataError::Arity { name: name.to_string(), expected: "2", actual: args.len() }),
        }
    }
}

impl Scope for CharacterScope<'_, '_> {
    fn lookup(&self, name: &str) -> Option<Value> {
        match Control::from_var_name(name) {
            Some(control) => Some(Value::from(self.ctx.input.is_active(control))),
            None => self.character.data.value(name),
        }
    }

    fn data_mut(&mut self) -> &mut DataObject {
        &mut self.character.data
    }

    fn call_host(&mut self, name: &str, args: &[String]) -> Option<Result<Option<Value>, DataError>> {
        if MUTATING_VERBS.contains(&name) {
            let target = args.first()?;
            return Control::from_var_name(target)
                .map(|_| Err(DataError::IllegalName(target.clone())));
        }
        let moved = match name {
            "target" => self
                .two_values(name, args)
                .and_then(|(tx, ty)| self.character.target(tx, ty, self.ctx)),
            "target_by" => self
                .two_values(name, args)
                .and_then(|(dx, dy)| self.character.target_by(dx, dy, self.ctx)),
            _ => return None,
        };
        Some(moved.map(|_| None))
    }
}
