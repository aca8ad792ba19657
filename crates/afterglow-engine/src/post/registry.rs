//! Named, ordered collection of post-processing effects.
//!
//! Entries are addressed by name so UI bindings can refer to effects by a stable string
//! identifier. Lookups that miss (unknown effect, unknown parameter) are silent no-ops:
//! a control bound to an effect that was never registered simply does nothing.

use super::backend::{Backend, GpuContext};
use super::error::AddEffectError;
use super::stage::{ShaderStageFactory, Stage, StageDefinition};
use super::uniforms::{UniformValue, UniformWrite, Uniforms};

/// One registered effect.
pub struct EffectEntry<P> {
    name: String,
    stage: Stage<P>,
    /// Overrides applied at registration plus every accepted write since.
    /// Always a subset of the stage's declared uniforms.
    parameters: Uniforms,
}

impl<P> EffectEntry<P> {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn stage(&self) -> &Stage<P> {
        &self.stage
    }

    /// Reads the stage's flag; the entry keeps no copy of its own.
    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.stage.is_enabled()
    }

    #[inline]
    pub fn parameters(&self) -> &Uniforms {
        &self.parameters
    }

    /// Current value of a stage uniform, whether or not it was ever overridden.
    pub fn parameter(&self, name: &str) -> Option<UniformValue> {
        self.stage.uniforms().get(name)
    }

    pub(crate) fn stage_mut(&mut self) -> &mut Stage<P> {
        &mut self.stage
    }

    fn write(&mut self, param: &str, value: UniformValue) -> UniformWrite {
        let result = self.stage.write_uniform(param, value);
        if result == UniformWrite::Written {
            self.parameters.declare(param, value);
        }
        result
    }
}

/// Effects in registration order, which is also their execution order.
pub struct EffectRegistry<P> {
    entries: Vec<EffectEntry<P>>,
}

impl<P> Default for EffectRegistry<P> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<P> EffectRegistry<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds `def` and appends it, enabled.
    ///
    /// `overrides` are applied to matching uniform keys only; the rest are dropped.
    /// A name that is already registered is rejected before anything is compiled.
    pub fn add<B, G>(
        &mut self,
        gpu: &mut G,
        name: &str,
        def: &StageDefinition,
        overrides: Option<&Uniforms>,
    ) -> Result<(), AddEffectError>
    where
        B: Backend<Program = P>,
        G: GpuContext<B>,
    {
        if self.contains(name) {
            return Err(AddEffectError::DuplicateName(name.to_string()));
        }

        let stage = ShaderStageFactory::create::<B, G>(gpu, name, def)?;
        let mut entry = EffectEntry {
            name: name.to_string(),
            stage,
            parameters: Uniforms::new(),
        };

        for (key, value) in overrides.into_iter().flat_map(Uniforms::iter) {
            if entry.write(key, value) != UniformWrite::Written {
                log::trace!("effect `{name}`: dropping override `{key}`");
            }
        }

        log::info!(
            "registered effect `{name}` at position {} with uniforms [{}]",
            self.entries.len(),
            entry.stage.uniforms().keys().collect::<Vec<_>>().join(", ")
        );
        self.entries.push(entry);
        Ok(())
    }

    /// Sets the enabled flag. Unknown names are ignored.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) {
        let Some(entry) = self.get_mut(name) else {
            log::trace!("set_enabled: no effect `{name}`");
            return;
        };
        entry.stage.set_enabled(enabled);
        log::debug!("effect `{name}` {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Overwrites one uniform of one effect.
    ///
    /// Ignored when the effect is unknown, the parameter is not declared by its stage,
    /// or the value's kind differs from the declared one.
    pub fn set_parameter(&mut self, name: &str, param: &str, value: UniformValue) {
        let Some(entry) = self.get_mut(name) else {
            log::trace!("set_parameter: no effect `{name}`");
            return;
        };
        match entry.write(param, value) {
            UniformWrite::Written => log::debug!("effect `{name}`: {param} = {value:?}"),
            UniformWrite::UnknownKey => log::trace!("set_parameter: effect `{name}` has no `{param}`"),
            UniformWrite::KindMismatch => log::trace!("set_parameter: `{name}.{param}` kind mismatch"),
        }
    }

    /// Takes an effect out of the chain. Dropping the returned entry releases its stage.
    pub fn remove(&mut self, name: &str) -> Option<EffectEntry<P>> {
        let index = self.entries.iter().position(|e| e.name == name)?;
        log::info!("removed effect `{name}`");
        Some(self.entries.remove(index))
    }

    /// Entries in registration order.
    #[inline]
    pub fn ordered_entries(&self) -> &[EffectEntry<P>] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&EffectEntry<P>> {
        self.entries.iter().find(|e| e.name == name)
    }

    fn get_mut(&mut self, name: &str) -> Option<&mut EffectEntry<P>> {
        self.entries.iter_mut().find(|e| e.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [EffectEntry<P>] {
        &mut self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::post::builtin;
    use crate::post::resize::Extent;
    use crate::post::testing::{MockProgram, Recording, RecordingGpu};

    type Registry = EffectRegistry<MockProgram>;

    /// bloom, blurH, blurV as the viewer registers them.
    fn standard() -> (RecordingGpu, Registry) {
        let mut gpu = RecordingGpu::new(Extent::new(64, 64));
        let mut reg = Registry::new();
        reg.add::<Recording, _>(&mut gpu, "bloom", &builtin::bloom(), None).unwrap();
        reg.add::<Recording, _>(&mut gpu, "blurH", &builtin::directional_blur(), Some(&builtin::horizontal()))
            .unwrap();
        reg.add::<Recording, _>(&mut gpu, "blurV", &builtin::directional_blur(), Some(&builtin::vertical()))
            .unwrap();
        (gpu, reg)
    }

    /// Everything observable about the registry, for before/after comparisons.
    fn snapshot(reg: &Registry) -> Vec<(String, bool, Uniforms, Uniforms)> {
        reg.ordered_entries()
            .iter()
            .map(|e| {
                (
                    e.name().to_string(),
                    e.is_enabled(),
                    e.parameters().clone(),
                    e.stage().uniforms().clone(),
                )
            })
            .collect()
    }

    fn names(reg: &Registry) -> Vec<&str> {
        reg.ordered_entries().iter().map(EffectEntry::name).collect()
    }

    // ── add ───────────────────────────────────────────────────────────────

    #[test]
    fn add_appends_enabled_in_order() {
        let (_, reg) = standard();
        assert_eq!(names(&reg), ["bloom", "blurH", "blurV"]);
        assert!(reg.ordered_entries().iter().all(|e| e.is_enabled() && e.stage().is_enabled()));
    }

    #[test]
    fn add_applies_matching_overrides_only() {
        let mut gpu = RecordingGpu::new(Extent::new(64, 64));
        let mut reg = Registry::new();
        let overrides = Uniforms::new()
            .with("uBrightnessThreshold", 0.4_f32)
            .with("uNotDeclared", 3.0_f32)
            .with("uIntensity", [1.0_f32, 1.0]);
        reg.add::<Recording, _>(&mut gpu, "bloom", &builtin::bloom(), Some(&overrides)).unwrap();

        let entry = reg.get("bloom").unwrap();
        assert_eq!(entry.parameters().keys().collect::<Vec<_>>(), ["uBrightnessThreshold"]);
        assert_eq!(entry.parameter("uBrightnessThreshold"), Some(UniformValue::Scalar(0.4)));
        assert_eq!(entry.parameter("uIntensity"), Some(UniformValue::Scalar(1.0)));
        assert!(!entry.stage().uniforms().contains("uNotDeclared"));
    }

    #[test]
    fn overrides_do_not_leak_between_entries_sharing_a_definition() {
        let (_, reg) = standard();
        assert_eq!(reg.get("blurH").unwrap().parameter("uDirection"), Some(UniformValue::Vec2([1.0, 0.0])));
        assert_eq!(reg.get("blurV").unwrap().parameter("uDirection"), Some(UniformValue::Vec2([0.0, 1.0])));
    }

    #[test]
    fn duplicate_name_is_rejected_and_first_entry_kept() {
        let (mut gpu, mut reg) = standard();
        reg.set_parameter("bloom", "uIntensity", UniformValue::Scalar(3.0));
        let before = snapshot(&reg);
        let compiles = gpu.compiled.len();

        let err = reg.add::<Recording, _>(&mut gpu, "bloom", &builtin::bloom(), None).unwrap_err();
        assert_eq!(err, AddEffectError::DuplicateName("bloom".into()));
        assert_eq!(snapshot(&reg), before);
        assert_eq!(gpu.compiled.len(), compiles);
    }

    #[test]
    fn compile_error_registers_nothing() {
        let (mut gpu, mut reg) = standard();
        gpu.reject.push("glow".into());
        let err = reg.add::<Recording, _>(&mut gpu, "glow", &builtin::bloom(), None).unwrap_err();
        assert!(matches!(err, AddEffectError::Compile(ref e) if e.effect == "glow"));
        assert!(!reg.contains("glow"));
        assert_eq!(reg.len(), 3);
    }

    // ── set_parameter ─────────────────────────────────────────────────────

    #[test]
    fn set_parameter_updates_only_that_key() {
        let (_, mut reg) = standard();
        let before = snapshot(&reg);

        reg.set_parameter("bloom", "uBrightnessThreshold", UniformValue::Scalar(0.5));

        let bloom = reg.get("bloom").unwrap();
        assert_eq!(bloom.parameters().get("uBrightnessThreshold"), Some(UniformValue::Scalar(0.5)));
        assert_eq!(bloom.parameter("uBrightnessThreshold"), Some(UniformValue::Scalar(0.5)));
        assert_eq!(bloom.parameter("uIntensity"), Some(UniformValue::Scalar(1.0)));

        let after = snapshot(&reg);
        assert_eq!(after[1..], before[1..]);
    }

    #[test]
    fn set_parameter_unknown_key_changes_nothing() {
        let (_, mut reg) = standard();
        let before = snapshot(&reg);
        let bytes = reg.get("bloom").unwrap().stage().uniforms().to_bytes();

        reg.set_parameter("bloom", "doesNotExist", UniformValue::Scalar(1.0));

        assert_eq!(snapshot(&reg), before);
        assert_eq!(reg.get("bloom").unwrap().stage().uniforms().to_bytes(), bytes);
    }

    #[test]
    fn set_parameter_kind_mismatch_changes_nothing() {
        let (_, mut reg) = standard();
        let before = snapshot(&reg);
        reg.set_parameter("blurH", "uDirection", UniformValue::Scalar(1.0));
        assert_eq!(snapshot(&reg), before);
    }

    // ── unknown names ─────────────────────────────────────────────────────

    #[test]
    fn unknown_name_is_a_no_op() {
        let (_, mut reg) = standard();
        let before = snapshot(&reg);

        reg.set_enabled("ghost", false);
        reg.set_parameter("ghost", "x", UniformValue::Scalar(1.0));

        assert_eq!(snapshot(&reg), before);
    }

    // ── set_enabled / remove ──────────────────────────────────────────────

    #[test]
    fn set_enabled_updates_entry_and_stage_without_reordering() {
        let (_, mut reg) = standard();
        reg.set_enabled("blurH", false);

        let entry = reg.get("blurH").unwrap();
        assert!(!entry.is_enabled());
        assert!(!entry.stage().is_enabled());
        assert_eq!(names(&reg), ["bloom", "blurH", "blurV"]);

        reg.set_enabled("blurH", true);
        assert!(reg.get("blurH").unwrap().is_enabled());
        assert_eq!(names(&reg), ["bloom", "blurH", "blurV"]);
    }

    #[test]
    fn entry_flag_follows_the_stage_flag() {
        let (_, mut reg) = standard();
        for enabled in [false, true, false] {
            reg.set_enabled("bloom", enabled);
            let entry = reg.get("bloom").unwrap();
            assert_eq!(entry.is_enabled(), enabled);
            assert_eq!(entry.stage().is_enabled(), enabled);
        }

        // A direct write to the stage is what the entry reports.
        reg.entries_mut()[0].stage_mut().set_enabled(true);
        assert!(reg.get("bloom").unwrap().is_enabled());
    }

    #[test]
    fn remove_frees_the_name() {
        let (mut gpu, mut reg) = standard();
        let removed = reg.remove("blurH").unwrap();
        assert_eq!(removed.name(), "blurH");
        assert!(reg.remove("blurH").is_none());
        assert_eq!(names(&reg), ["bloom", "blurV"]);

        reg.add::<Recording, _>(&mut gpu, "blurH", &builtin::directional_blur(), None).unwrap();
        assert_eq!(names(&reg), ["bloom", "blurV", "blurH"]);
    }
}
