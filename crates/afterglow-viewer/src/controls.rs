//! Keyboard-driven control panel.
//!
//! Each control maps to one or more control-surface calls on the pipeline. The panel
//! only produces [`ControlCommand`]s; the app applies them.

use winit::keyboard::KeyCode;

/// A single control-surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    SetParameter {
        effect: &'static str,
        param: &'static str,
        value: f32,
    },
    SetEnabled {
        effect: &'static str,
        enabled: bool,
    },
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum PanelAction {
    Next,
    Previous,
    Increase,
    Decrease,
    Toggle,
    Reset,
}

impl PanelAction {
    pub fn from_key(code: KeyCode, shift: bool) -> Option<Self> {
        match code {
            KeyCode::Tab if shift => Some(Self::Previous),
            KeyCode::Tab => Some(Self::Next),
            KeyCode::ArrowRight => Some(Self::Increase),
            KeyCode::ArrowLeft => Some(Self::Decrease),
            KeyCode::Space => Some(Self::Toggle),
            KeyCode::KeyR => Some(Self::Reset),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Slider {
    min: f32,
    max: f32,
    step: f32,
    default: f32,
    value: f32,
    /// (effect, uniform) pairs written on change.
    targets: &'static [(&'static str, &'static str)],
}

#[derive(Debug, Clone)]
struct Toggle {
    effect: &'static str,
    default: bool,
    value: bool,
}

#[derive(Debug, Clone)]
enum ControlKind {
    Slider(Slider),
    Toggle(Toggle),
}

#[derive(Debug, Clone)]
struct Control {
    label: &'static str,
    kind: ControlKind,
}

impl Control {
    fn slider(
        label: &'static str,
        range: (f32, f32),
        step: f32,
        default: f32,
        targets: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self {
            label,
            kind: ControlKind::Slider(Slider {
                min: range.0,
                max: range.1,
                step,
                default,
                value: default,
                targets,
            }),
        }
    }

    fn toggle(label: &'static str, effect: &'static str) -> Self {
        Self {
            label,
            kind: ControlKind::Toggle(Toggle {
                effect,
                default: true,
                value: true,
            }),
        }
    }

    fn commands(&self) -> Vec<ControlCommand> {
        match &self.kind {
            ControlKind::Slider(s) => s
                .targets
                .iter()
                .map(|&(effect, param)| ControlCommand::SetParameter {
                    effect,
                    param,
                    value: s.value,
                })
                .collect(),
            ControlKind::Toggle(t) => vec![ControlCommand::SetEnabled {
                effect: t.effect,
                enabled: t.value,
            }],
        }
    }

    fn describe(&self) -> String {
        match &self.kind {
            ControlKind::Slider(s) => format!("{} = {:.2}", self.label, s.value),
            ControlKind::Toggle(t) => {
                format!("{} = {}", self.label, if t.value { "on" } else { "off" })
            }
        }
    }
}

/// The "General Settings" panel.
#[derive(Debug, Clone)]
pub struct ControlPanel {
    controls: Vec<Control>,
    selected: usize,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl ControlPanel {
    pub fn new() -> Self {
        let controls = vec![
            Control::slider(
                "Brightness Threshold",
                (0.0, 1.0),
                0.05,
                0.2,
                &[("bloom", "uBrightnessThreshold")],
            ),
            Control::slider(
                "Blur Amount",
                (0.0, 10.0),
                0.1,
                1.8,
                &[("blurH", "uBlurAmount"), ("blurV", "uBlurAmount")],
            ),
            Control::slider(
                "Bloom Brightness",
                (0.0, 5.0),
                0.1,
                1.5,
                &[("blurH", "uIntensity"), ("blurV", "uIntensity")],
            ),
            // `combine` is never registered; writes to it are dropped by the pipeline.
            Control::slider("Intensity", (0.0, 10.0), 0.1, 1.0, &[("combine", "uIntensity")]),
            Control::toggle("Enable Horizontal Blur", "blurH"),
            Control::toggle("Enable Vertical Blur", "blurV"),
            Control::toggle("Enable Bloom", "bloom"),
        ];

        Self {
            controls,
            selected: 0,
        }
    }

    /// Human-readable state of the selected control.
    pub fn describe_selected(&self) -> String {
        self.controls[self.selected].describe()
    }

    /// Applies `action` and returns the control-surface calls it implies.
    pub fn handle(&mut self, action: PanelAction) -> Vec<ControlCommand> {
        match action {
            PanelAction::Next => {
                self.selected = (self.selected + 1) % self.controls.len();
                Vec::new()
            }
            PanelAction::Previous => {
                self.selected = (self.selected + self.controls.len() - 1) % self.controls.len();
                Vec::new()
            }
            PanelAction::Increase => self.nudge(1.0),
            PanelAction::Decrease => self.nudge(-1.0),
            PanelAction::Toggle => {
                let control = &mut self.controls[self.selected];
                match &mut control.kind {
                    ControlKind::Toggle(t) => {
                        t.value = !t.value;
                        control.commands()
                    }
                    ControlKind::Slider(_) => Vec::new(),
                }
            }
            PanelAction::Reset => self.reset(),
        }
    }

    /// Restores every control to its default and re-emits all of them.
    pub fn reset(&mut self) -> Vec<ControlCommand> {
        let mut out = Vec::new();
        for control in &mut self.controls {
            match &mut control.kind {
                ControlKind::Slider(s) => s.value = s.default,
                ControlKind::Toggle(t) => t.value = t.default,
            }
            out.extend(control.commands());
        }
        out
    }

    fn nudge(&mut self, direction: f32) -> Vec<ControlCommand> {
        let control = &mut self.controls[self.selected];
        let ControlKind::Slider(s) = &mut control.kind else {
            return Vec::new();
        };

        let next = (s.value + direction * s.step).clamp(s.min, s.max);
        if next == s.value {
            return Vec::new();
        }
        s.value = next;
        control.commands()
    }
}
