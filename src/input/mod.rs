use std::collections::{HashMap, HashSet};

pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::KeyCode;
use winit::event::WindowEvent;
use winit::keyboard::PhysicalKey;

// ── Control ──────────────────────────────────────────────────────────────────

/// Logical controls a character script can read as `key_<name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Up,
    Down,
    Left,
    Right,
    Action,
    Menu,
    Select,
    Start,
    Look,
    Exit,
}

impl Control {
    pub const ALL: [Control; 10] = [
        Control::Up,
        Control::Down,
        Control::Left,
        Control::Right,
        Control::Action,
        Control::Menu,
        Control::Select,
        Control::Start,
        Control::Look,
        Control::Exit,
    ];

    /// The read-only script variable this control appears as.
    pub fn var_name(self) -> &'static str {
        match self {
            Control::Up => "key_up",
            Control::Down => "key_down",
            Control::Left => "key_left",
            Control::Right => "key_right",
            Control::Action => "key_action",
            Control::Menu => "key_menu",
            Control::Select => "key_select",
            Control::Start => "key_start",
            Control::Look => "key_look",
            Control::Exit => "key_exit",
        }
    }

    pub fn from_var_name(name: &str) -> Option<Control> {
        Control::ALL.into_iter().find(|c| c.var_name() == name)
    }
}

// ── ControlState ─────────────────────────────────────────────────────────────

/// The only input capability the core depends on.
pub trait ControlState {
    fn is_active(&self, control: Control) -> bool;
}

/// Nothing is ever pressed.  Useful for headless stepping and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoInput;

impl ControlState for NoInput {
    fn is_active(&self, _control: Control) -> bool {
        false
    }
}

/// A plain set of active controls, e.g. filled by an on-screen touch pad.
impl ControlState for HashSet<Control> {
    fn is_active(&self, control: Control) -> bool {
        self.contains(&control)
    }
}

// ── InputState ───────────────────────────────────────────────────────────────

/// Represents a raw input source that can be bound to a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputSource {
    Key(KeyCode),
    Mouse(MouseButton),
}

/// Raw hardware state: which keys and buttons are currently held.
#[derive(Debug, Default)]
pub struct InputState {
    pub keys_held: HashSet<KeyCode>,
    pub mouse_held: HashSet<MouseButton>,
    pub mouse_pos: [f32; 2],
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press_key(&mut self, key: KeyCode) {
        self.keys_held.insert(key);
    }

    pub fn release_key(&mut self, key: KeyCode) {
        self.keys_held.remove(&key);
    }

    pub fn press_mouse(&mut self, button: MouseButton) {
        self.mouse_held.insert(button);
    }

    pub fn release_mouse(&mut self, button: MouseButton) {
        self.mouse_held.remove(&button);
    }

    /// Drop everything held, e.g. when the window loses focus.
    pub fn release_all(&mut self) {
        self.keys_held.clear();
        self.mouse_held.clear();
    }

    pub fn is_key_held(&self, key: KeyCode) -> bool { self.keys_held.contains(&key) }
    pub fn is_mouse_held(&self, button: MouseButton) -> bool { self.mouse_held.contains(&button) }

    pub fn is_held(&self, source: InputSource) -> bool {
        match source {
            InputSource::Key(k) => self.is_key_held(k),
            InputSource::Mouse(b) => self.is_mouse_held(b),
        }
    }
}

// ── ControlMap ───────────────────────────────────────────────────────────────

/// Maps logical controls to one or more physical inputs.
#[derive(Debug, Clone, Default)]
pub struct ControlMap {
    bindings: HashMap<Control, Vec<InputSource>>,
}

impl ControlMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arrow keys / WASD to move, Z / Space / left click for action,
    /// X menu, C look, Shift select, Enter start, Escape exit.
    pub fn default_bindings() -> Self {
        use InputSource::{Key, Mouse};
        let mut map = Self::new();
        for (control, sources) in [
            (Control::Up, vec![Key(KeyCode::ArrowUp), Key(KeyCode::KeyW)]),
            (Control::Down, vec![Key(KeyCode::ArrowDown), Key(KeyCode::KeyS)]),
            (Control::Left, vec![Key(KeyCode::ArrowLeft), Key(KeyCode::KeyA)]),
            (Control::Right, vec![Key(KeyCode::ArrowRight), Key(KeyCode::KeyD)]),
            (Control::Action, vec![Key(KeyCode::KeyZ), Key(KeyCode::Space), Mouse(MouseButton::Left)]),
            (Control::Menu, vec![Key(KeyCode::KeyX), Mouse(MouseButton::Right)]),
            (Control::Select, vec![Key(KeyCode::ShiftLeft), Key(KeyCode::ShiftRight)]),
            (Control::Start, vec![Key(KeyCode::Enter)]),
            (Control::Look, vec![Key(KeyCode::KeyC)]),
            (Control::Exit, vec![Key(KeyCode::Escape)]),
        ] {
            for source in sources {
                map.bind(control, source);
            }
        }
        map
    }

    pub fn bind(&mut self, control: Control, source: InputSource) {
        self.bindings.entry(control).or_default().push(source);
    }

    /// Remove every binding of `control`.
    pub fn unbind(&mut self, control: Control) {
        self.bindings.remove(&control);
    }

    pub fn sources(&self, control: Control) -> &[InputSource] {
        self.bindings.get(&control).map_or(&[], Vec::as_slice)
    }

    /// Returns true if any source bound to `control` is held.
    pub fn is_held(&self, control: Control, input: &InputState) -> bool {
        self.sources(control).iter().any(|s| input.is_held(*s))
    }
}

// ── Controls ─────────────────────────────────────────────────────────────────

/// Raw state plus bindings; what a windowed host feeds events into.
#[derive(Debug, Default)]
pub struct Controls {
    pub state: InputState,
    pub map: ControlMap,
}

impl Controls {
    pub fn new(map: ControlMap) -> Self {
        Self { state: InputState::new(), map }
    }

    pub fn set_key(&mut self, key: KeyCode, state: ElementState) {
        match state {
            ElementState::Pressed => self.state.press_key(key),
            ElementState::Released => self.state.release_key(key),
        }
    }

    pub fn set_mouse(&mut self, button: MouseButton, state: ElementState) {
        match state {
            ElementState::Pressed => self.state.press_mouse(button),
            ElementState::Released => self.state.release_mouse(button),
        }
    }

    /// Feed a winit window event.  Returns true if it changed input state.
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if event.repeat {
                    return false;
                }
                let PhysicalKey::Code(key) = event.physical_key else { return false };
                self.set_key(key, event.state);
                true
            }
            WindowEvent::MouseInput { button, state, .. } => {
                self.set_mouse(*button, *state);
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state.mouse_pos = [position.x as f32, position.y as f32];
                true
            }
            WindowEvent::Focused(false) => {
                self.state.release_all();
                true
            }
            _ => false,
        }
    }
}

impl ControlState for Controls {
    fn is_active(&self, control: Control) -> bool {
        self.map.is_held(control, &self.state)
    }
}
