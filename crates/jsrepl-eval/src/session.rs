//! A console session: engine context, binding store and log.

use std::collections::{BTreeSet, VecDeque};
use std::path::PathBuf;
use std::rc::Rc;

use boa_engine::module::SimpleModuleLoader;
use boa_engine::object::builtins::JsArray;
use boa_engine::{Context, JsString, JsValue};
use jsrepl_transform::{transform, Transformed};
use jsrepl_types::{LogKind, TransformError};

use crate::config::ReplConfig;
use crate::console::Console;
use crate::entry::LogEntry;
use crate::error::{EvalError, EvalResult};
use crate::executor::{self, Completion};
use crate::store::Store;

/// What tapping a log entry gives back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recall {
    /// Source text to put back into the editor.
    Edit(String),
    /// The entry's value was bound under this store name.
    Bound(String),
}

/// One console: fragments evaluated in order against a shared store.
///
/// Sessions are independent of each other; each owns its engine context.
pub struct Session {
    context: Context,
    store: Store,
    console: Option<Console>,
    entries: VecDeque<LogEntry>,
    config: ReplConfig,
    /// Path fragments run as, so relative `import()` specifiers resolve
    /// against the module root.
    referrer: PathBuf,
}

impl Session {
    /// Create a session with the default configuration.
    pub fn new() -> EvalResult<Self> {
        Self::with_config(ReplConfig::default())
    }

    pub fn with_config(config: ReplConfig) -> EvalResult<Self> {
        let root = config.module_root();
        let root = root
            .canonicalize()
            .map_err(|e| EvalError::Setup(format!("module root {}: {e}", root.display())))?;
        let loader = SimpleModuleLoader::new(&root)
            .map_err(|e| EvalError::Setup(format!("module root {}: {e}", root.display())))?;
        let mut context = Context::builder()
            .module_loader(Rc::new(loader))
            .build()
            .map_err(|e| EvalError::Setup(e.to_string()))?;
        let console = if config.capture_console {
            Some(Console::install(&mut context)?)
        } else {
            None
        };
        log::debug!("session ready (module root: {})", root.display());
        Ok(Self {
            context,
            store: Store::new(),
            console,
            entries: VecDeque::new(),
            config,
            referrer: root.join("<repl>"),
        })
    }

    pub fn config(&self) -> &ReplConfig {
        &self.config
    }

    // ══════════════════════════════════════════════════════════════════════
    // Evaluation
    // ══════════════════════════════════════════════════════════════════════

    /// Transform `source` against the current store without running it.
    pub fn transform(&self, source: &str) -> EvalResult<Transformed> {
        Ok(transform(source, self.store.names())?)
    }

    /// Run one fragment.
    ///
    /// Names the fragment declares are added to the store only once the
    /// transform has succeeded, so a rejected fragment leaves the store as
    /// it was. Effects of a fragment that throws part-way are kept.
    pub fn evaluate(&mut self, source: &str) -> EvalResult<Completion> {
        let transformed = self.transform(source)?;
        // The engine's `import()` takes no options argument.
        if let Some(&span) = transformed.attributed_imports.first() {
            return Err(TransformError::Unsupported {
                construct: "import attributes".into(),
                span,
            }
            .into());
        }
        for name in &transformed.declared {
            self.store
                .declare(name, &mut self.context)
                .map_err(|e| EvalError::thrown(e, &mut self.context))?;
        }
        executor::execute(&transformed, &self.store, &self.referrer, &mut self.context)
    }

    /// Resolve a completion to its value, running pending jobs.
    pub fn settle(&mut self, completion: Completion) -> EvalResult<JsValue> {
        executor::settle(completion, &mut self.context)
    }

    /// [`evaluate`](Self::evaluate) then [`settle`](Self::settle).
    pub fn evaluate_settled(&mut self, source: &str) -> EvalResult<JsValue> {
        let completion = self.evaluate(source)?;
        self.settle(completion)
    }

    // ══════════════════════════════════════════════════════════════════════
    // Binding store
    // ══════════════════════════════════════════════════════════════════════

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Persistent names, sorted.
    pub fn names(&self) -> &BTreeSet<String> {
        self.store.names()
    }

    pub fn get(&mut self, name: &str) -> EvalResult<Option<JsValue>> {
        self.store
            .get(name, &mut self.context)
            .map_err(|e| EvalError::thrown(e, &mut self.context))
    }

    pub fn set(&mut self, name: &str, value: JsValue) -> EvalResult<()> {
        self.store
            .set(name, value, &mut self.context)
            .map_err(|e| EvalError::thrown(e, &mut self.context))
    }

    /// Bind `value` to a `temp<N>` name; see [`Store::bind_temp`].
    pub fn bind_temp(&mut self, value: JsValue) -> EvalResult<String> {
        self.store
            .bind_temp(value, &mut self.context)
            .map_err(|e| EvalError::thrown(e, &mut self.context))
    }

    /// Forget every binding and the log. Engine globals are kept.
    pub fn reset(&mut self) {
        self.store = Store::new();
        self.entries.clear();
        log::debug!("session reset");
    }

    pub fn context_mut(&mut self) -> &mut Context {
        &mut self.context
    }

    // ══════════════════════════════════════════════════════════════════════
    // Log
    // ══════════════════════════════════════════════════════════════════════

    /// Evaluate a fragment the way the console does, recording the input,
    /// any console output and the result in the log.
    ///
    /// Blank input is ignored and yields `Ok(None)`.
    pub fn submit(&mut self, source: &str) -> EvalResult<Option<JsValue>> {
        if source.trim().is_empty() {
            return Ok(None);
        }
        self.push_entry(LogEntry::input(source));

        let result = self.evaluate_settled(source);
        self.drain_console()?;
        match result {
            Ok(value) => {
                self.push_entry(LogEntry::output(value.clone()));
                Ok(Some(value))
            }
            Err(err) => {
                log::debug!("fragment failed: {err}");
                let text = err.to_string();
                let value = err
                    .value()
                    .cloned()
                    .unwrap_or_else(|| JsValue::from(JsString::from(text.as_str())));
                self.push_entry(LogEntry::error(text, value));
                Err(err)
            }
        }
    }

    /// Recorded entries, oldest first.
    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Drop every recorded entry.
    pub fn clear_log(&mut self) {
        self.entries.clear();
    }

    /// Act on a tapped entry: inputs come back for editing, anything else is
    /// bound into the store. Several values are bound as one array.
    pub fn recall(&mut self, entry: &LogEntry) -> EvalResult<Recall> {
        if entry.kind == LogKind::Input {
            return Ok(Recall::Edit(entry.text.clone()));
        }
        let value = match entry.values.as_slice() {
            [] => JsValue::undefined(),
            [value] => value.clone(),
            values => JsArray::from_iter(values.iter().cloned(), &mut self.context).into(),
        };
        self.bind_temp(value).map(Recall::Bound)
    }

    fn drain_console(&mut self) -> EvalResult<()> {
        let Some(console) = &self.console else {
            return Ok(());
        };
        for entry in console.drain(&mut self.context)? {
            self.push_entry(entry);
        }
        Ok(())
    }

    fn push_entry(&mut self, entry: LogEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.config.max_log_entries {
            self.entries.pop_front();
        }
    }
}
