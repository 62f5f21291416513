//! The persistent binding store.

use std::collections::BTreeSet;
use std::ops::Bound;

use boa_engine::{Context, JsObject, JsResult, JsString, JsValue};

/// Name → value map that outlives every fragment of a session.
///
/// Backed by a null-prototype engine object, so generated code reads and
/// writes entries as plain property accesses on the scope parameter and no
/// inherited property (`toString`, `constructor`, …) can shadow a global.
/// The key set is mirrored on the Rust side for the transform and for
/// name completion.
#[derive(Debug, Clone)]
pub struct Store {
    object: JsObject,
    names: BTreeSet<String>,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            object: JsObject::with_null_proto(),
            names: BTreeSet::new(),
        }
    }

    /// The engine object generated code receives as its scope.
    pub fn object(&self) -> &JsObject {
        &self.object
    }

    /// Make sure `name` exists. An existing entry keeps its value; a new one
    /// starts as `undefined`.
    pub fn declare(&mut self, name: &str, context: &mut Context) -> JsResult<()> {
        if self.names.insert(name.to_string()) {
            self.object
                .set(JsString::from(name), JsValue::undefined(), true, context)?;
        }
        Ok(())
    }

    /// Current value of `name`, or `None` if it was never bound.
    pub fn get(&self, name: &str, context: &mut Context) -> JsResult<Option<JsValue>> {
        if !self.names.contains(name) {
            return Ok(None);
        }
        self.object.get(JsString::from(name), context).map(Some)
    }

    /// Bind `name` to `value`, replacing any previous value.
    pub fn set(&mut self, name: &str, value: JsValue, context: &mut Context) -> JsResult<()> {
        self.names.insert(name.to_string());
        self.object.set(JsString::from(name), value, true, context)?;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Every bound name, sorted.
    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Bound names starting with `prefix`, sorted.
    pub fn complete(&self, prefix: &str) -> Vec<&str> {
        self.names
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|name| name.starts_with(prefix))
            .map(String::as_str)
            .collect()
    }

    /// Bind `value` to the first `temp<N>` that is free or already holds a
    /// strictly-equal value, and return that name.
    pub fn bind_temp(&mut self, value: JsValue, context: &mut Context) -> JsResult<String> {
        let mut n = 0usize;
        loop {
            let name = format!("temp{n}");
            match self.get(&name, context)? {
                Some(existing) if existing.strict_equals(&value) => return Ok(name),
                Some(_) => n += 1,
                None => {
                    self.set(&name, value, context)?;
                    return Ok(name);
                }
            }
        }
    }
}
