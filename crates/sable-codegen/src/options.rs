//! Emitter configuration.

use std::path::PathBuf;

/// Options for one emission.
///
/// ```
/// use sable_codegen::EmitOptions;
///
/// let options = EmitOptions::new("app")
///     .with_reference("runtime.sbl")
///     .with_output("app.sbl")
///     .with_optimize(false);
/// assert_eq!(options.references.len(), 1);
/// assert!(!options.optimize);
/// ```
#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Name of the produced module.
    pub module_name: String,
    /// Namespace wrapping textual output.
    pub namespace: String,
    /// Reference modules searched for runtime primitives, in order.
    pub references: Vec<PathBuf>,
    /// Where the module is written.
    pub output: Option<PathBuf>,
    /// Run the macro-optimization pass over each method body.
    pub optimize: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            module_name: "program".to_string(),
            namespace: "program".to_string(),
            references: Vec::new(),
            output: None,
            optimize: true,
        }
    }
}

impl EmitOptions {
    /// Options for module `name`; the namespace defaults to the same name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            namespace: name.clone(),
            module_name: name,
            ..Self::default()
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_reference(mut self, path: impl Into<PathBuf>) -> Self {
        self.references.push(path.into());
        self
    }

    pub fn with_references<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.references.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn with_optimize(mut self, optimize: bool) -> Self {
        self.optimize = optimize;
        self
    }
}
