//! Export options

use crate::interchange::{Format, Model, UnitSystem, XmlOptions};

/// Application name written into exported models by default.
pub const DEFAULT_APPLICATION: &str = concat!("nnurbs ", env!("CARGO_PKG_VERSION"));

/// How `export_selection` chooses objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionMode {
    /// Every object in the document.
    #[default]
    All,
    /// Ask the host picker.
    Interactive,
}

/// Export configuration, passed once per invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportOptions {
    /// Encoding for the inspection flow (files always use their type's format).
    pub format: Format,
    pub selection: SelectionMode,
    /// Written into the model's settings; `None` leaves it out.
    pub application: Option<String>,
    /// Unit system to record in the model.
    pub units: Option<UnitSystem>,
    /// Absolute tolerance to record in the model.
    pub tolerance: Option<f64>,
    pub xml: XmlOptions,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            format: Format::Xml,
            selection: SelectionMode::All,
            application: Some(DEFAULT_APPLICATION.to_string()),
            units: None,
            tolerance: None,
            xml: XmlOptions::default(),
        }
    }
}

impl ExportOptions {
    pub fn with_format(mut self, format: Format) -> Self {
        self.format = format;
        self
    }

    pub fn with_selection(mut self, selection: SelectionMode) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_application(mut self, application: Option<String>) -> Self {
        self.application = application;
        self
    }

    pub fn with_units(mut self, units: UnitSystem) -> Self {
        self.units = Some(units);
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn with_xml(mut self, xml: XmlOptions) -> Self {
        self.xml = xml;
        self
    }

    /// Stamp the model-level settings onto a captured model.
    pub(crate) fn apply(&self, mut model: Model) -> Model {
        model.application = self.application.clone();
        model.units = self.units.or(model.units);
        model.tolerance = self.tolerance.or(model.tolerance);
        model
    }
}
