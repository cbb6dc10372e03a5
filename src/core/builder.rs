use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use tracing::error;

use super::guard::{panic_message, PANIC_TEXT};
use super::instance::WidgetInstance;
use super::supervisor::Supervisor;
use super::SupervisorConfig;
use crate::widgets::{StaticWidget, WidgetRef, WidgetRegistry, WidgetSpec};

enum Entry {
    Spec(WidgetSpec),
    Built(WidgetSpec, WidgetRef),
}

/// Assembles a [`Supervisor`] from widget specs.
///
/// Widgets that fail to construct (or panic while doing so) are replaced by a
/// static widget showing the error, so the bar layout never shifts.
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    registry: WidgetRegistry,
    entries: Vec<Entry>,
}

impl SupervisorBuilder {
    /// Builder over the builtin widget types.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self {
            cfg,
            registry: WidgetRegistry::with_builtins(),
            entries: Vec::new(),
        }
    }

    pub fn with_registry(mut self, registry: WidgetRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Appends widgets constructed through the registry.
    pub fn with_specs(mut self, specs: impl IntoIterator<Item = WidgetSpec>) -> Self {
        self.entries.extend(specs.into_iter().map(Entry::Spec));
        self
    }

    /// Appends an already constructed widget.
    pub fn with_widget(mut self, spec: WidgetSpec, widget: WidgetRef) -> Self {
        self.entries.push(Entry::Built(spec, widget));
        self
    }

    pub fn build(self) -> Arc<Supervisor> {
        let registry = self.registry;
        let widgets = self
            .entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                let (mut spec, widget) = match entry {
                    Entry::Built(spec, widget) => (spec, widget),
                    Entry::Spec(mut spec) => {
                        spec.index = index;
                        let widget = construct(&registry, &spec);
                        (spec, widget)
                    }
                };
                spec.index = index;
                WidgetInstance::new(spec, widget)
            })
            .collect();
        Supervisor::new_internal(self.cfg, widgets)
    }
}

fn construct(registry: &WidgetRegistry, spec: &WidgetSpec) -> WidgetRef {
    match catch_unwind(AssertUnwindSafe(|| registry.build(spec))) {
        Ok(Ok(widget)) => widget,
        Ok(Err(e)) => {
            error!(id = %spec.label(), kind = %spec.kind, error = %e, label = e.as_label(), "widget construction failed");
            Arc::new(StaticWidget::error(e.to_string()))
        }
        Err(payload) => {
            error!(id = %spec.label(), kind = %spec.kind, panic = %panic_message(payload.as_ref()), "widget construction panicked");
            Arc::new(StaticWidget::error(PANIC_TEXT))
        }
    }
}
