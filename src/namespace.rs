//! Variable namespaces.
//!
//! The evaluator reads and writes variables only through [`VariantContainer`],
//! so hosts can plug in their own stores. [`Variables`] is the standard
//! hash-map store and [`LocalVariables`] is the call-local namespace used for
//! function parameters.

use std::{borrow::Cow, collections::HashMap};

use crate::value::Value;

/// Name → value store seen by the evaluator.
///
/// Lookups never fail: unknown names and out-of-range elements read as
/// [`Value::Null`]. Element writes past the end pad the array with `Null`.
pub trait VariantContainer {
    /// Value of `name`, or `Null` when absent.
    fn get(&self, name: &str) -> Value;

    /// Overwrites `name`.
    fn set(&mut self, name: &str, value: Value);

    fn contains(&self, name: &str) -> bool;

    /// Value of `name` if this namespace owns it, ignoring any parent.
    fn get_local(&self, name: &str) -> Value {
        self.get(name)
    }

    /// Element `index` of the array stored in `name`.
    fn get_element(&self, name: &str, index: usize) -> Value {
        element_of(self.get(name), index)
    }

    /// Writes element `index` of the array stored in `name`, growing it as
    /// needed. A scalar becomes the first element of a new array.
    fn set_element(&mut self, name: &str, index: usize, value: Value) {
        let updated = with_element(self.get(name), index, value);
        self.set(name, updated);
    }

    /// Names of the entries currently stored.
    ///
    /// Used to match names regardless of case when the configuration asks for
    /// it. A store that returns nothing here only matches names exactly.
    fn entry_names(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Name under which `container` holds `name`.
///
/// Case sensitive lookups use `name` as written. Otherwise, when there is no
/// entry spelled exactly like `name`, an existing entry differing only in case
/// is used; a name with no such entry is returned unchanged.
pub fn resolve_name<'a>(
    container: &dyn VariantContainer,
    name: &'a str,
    case_sensitive: bool,
) -> Cow<'a, str> {
    if case_sensitive || container.contains(name) {
        return Cow::Borrowed(name);
    }
    let folded = name.to_lowercase();
    container
        .entry_names()
        .into_iter()
        .find(|entry| entry.to_lowercase() == folded)
        .map(Cow::Owned)
        .unwrap_or(Cow::Borrowed(name))
}

/// Element `index` of `container`, or `Null` when it is not an array or the
/// index is out of range.
pub fn element_of(container: Value, index: usize) -> Value {
    match container {
        Value::Array(items) => items.into_iter().nth(index).unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

/// `container` as an array with element `index` replaced, padding with `Null`.
pub fn with_element(container: Value, index: usize, value: Value) -> Value {
    let mut items = into_array(container);
    put_element(&mut items, index, value);
    Value::Array(items)
}

fn into_array(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        Value::Null => Vec::new(),
        scalar => vec![scalar],
    }
}

fn put_element(items: &mut Vec<Value>, index: usize, value: Value) {
    if index >= items.len() {
        items.resize(index + 1, Value::Null);
    }
    items[index] = value;
}

/// Hash-map backed namespace.
///
/// # Examples
///
/// ```
/// use tally_lang::{Value, Variables, VariantContainer};
///
/// let mut vars = Variables::new().with("x", 5);
/// vars.set_element("list", 2, Value::from("c"));
///
/// assert_eq!(vars.get("x"), Value::from(5));
/// assert_eq!(vars.get("missing"), Value::Null);
/// assert_eq!(vars.get("list").to_string(), r#"[null, null, "c"]"#);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    values: HashMap<String, Value>,
    case_insensitive: bool,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose keys match regardless of case.
    pub fn case_insensitive() -> Self {
        Variables {
            values: HashMap::new(),
            case_insensitive: true,
        }
    }

    /// Builder-style insert.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value.into());
        self
    }

    fn key<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if self.case_insensitive {
            Cow::Owned(name.to_lowercase())
        } else {
            Cow::Borrowed(name)
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let key = self.key(name);
        self.values.remove(key.as_ref())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    /// Variable names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.values.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl VariantContainer for Variables {
    fn get(&self, name: &str) -> Value {
        self.values
            .get(self.key(name).as_ref())
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn set(&mut self, name: &str, value: Value) {
        let key = self.key(name).into_owned();
        self.values.insert(key, value);
    }

    fn contains(&self, name: &str) -> bool {
        self.values.contains_key(self.key(name).as_ref())
    }

    fn get_element(&self, name: &str, index: usize) -> Value {
        match self.values.get(self.key(name).as_ref()) {
            Some(Value::Array(items)) => items.get(index).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    fn set_element(&mut self, name: &str, index: usize, value: Value) {
        let key = self.key(name).into_owned();
        let slot = self.values.entry(key).or_insert(Value::Null);
        if !matches!(slot, Value::Array(_)) {
            *slot = Value::Array(into_array(std::mem::take(slot)));
        }
        if let Value::Array(items) = slot {
            put_element(items, index, value);
        }
    }

    fn entry_names(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

impl FromIterator<(String, Value)> for Variables {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut vars = Variables::new();
        for (name, value) in iter {
            vars.set(&name, value);
        }
        vars
    }
}

/// Call-local namespace.
///
/// Owns its own entries (function parameters, the return slot, anything the
/// body assigns) and reads through to `parent` for everything else. Writes
/// always land here; the parent is never modified. When not case sensitive,
/// own entries are keyed by their lower-cased name and parent reads go through
/// [`resolve_name`].
pub struct LocalVariables<'p> {
    locals: HashMap<String, Value>,
    parent: &'p dyn VariantContainer,
    case_sensitive: bool,
}

impl<'p> LocalVariables<'p> {
    pub fn new(parent: &'p dyn VariantContainer, case_sensitive: bool) -> Self {
        LocalVariables {
            locals: HashMap::new(),
            parent,
            case_sensitive,
        }
    }

    fn key<'a>(&self, name: &'a str) -> Cow<'a, str> {
        if self.case_sensitive {
            Cow::Borrowed(name)
        } else {
            Cow::Owned(name.to_lowercase())
        }
    }

    fn parent_name<'a>(&self, name: &'a str) -> Cow<'a, str> {
        resolve_name(self.parent, name, self.case_sensitive)
    }

    /// True when `name` is one of this namespace's own entries.
    pub fn owns(&self, name: &str) -> bool {
        self.locals.contains_key(self.key(name).as_ref())
    }
}

impl VariantContainer for LocalVariables<'_> {
    fn get(&self, name: &str) -> Value {
        match self.locals.get(self.key(name).as_ref()) {
            Some(value) => value.clone(),
            None => self.parent.get(&self.parent_name(name)),
        }
    }

    fn set(&mut self, name: &str, value: Value) {
        let key = self.key(name).into_owned();
        self.locals.insert(key, value);
    }

    fn contains(&self, name: &str) -> bool {
        self.owns(name) || self.parent.contains(&self.parent_name(name))
    }

    fn get_local(&self, name: &str) -> Value {
        self.locals
            .get(self.key(name).as_ref())
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn entry_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.locals.keys().cloned().collect();
        names.extend(self.parent.entry_names());
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_are_independent_copies() {
        let mut vars = Variables::new();
        vars.set("arr", Value::Array(vec![Value::from(1)]));
        let mut copy = vars.get("arr");
        if let Value::Array(items) = &mut copy {
            items.push(Value::from(2));
        }
        assert_eq!(vars.get("arr"), Value::Array(vec![Value::from(1)]));
    }

    #[test]
    fn element_access_out_of_bounds_is_null() {
        let vars = Variables::new().with("arr", Value::Array(vec![Value::from(1)]));
        assert_eq!(vars.get_element("arr", 5), Value::Null);
        assert_eq!(vars.get_element("nothing", 0), Value::Null);
    }

    #[test]
    fn element_write_pads_with_null() {
        let mut vars = Variables::new();
        vars.set_element("arr", 2, Value::from("x"));
        assert_eq!(
            vars.get("arr"),
            Value::Array(vec![Value::Null, Value::Null, Value::from("x")])
        );
    }

    #[test]
    fn element_write_on_scalar_keeps_scalar_first() {
        let mut vars = Variables::new().with("s", 7);
        vars.set_element("s", 1, Value::from(8));
        assert_eq!(vars.get("s"), Value::Array(vec![Value::from(7), Value::from(8)]));
    }

    #[test]
    fn case_insensitive_store() {
        let mut vars = Variables::case_insensitive();
        vars.set("VAR1", Value::from(1));
        assert_eq!(vars.get("var1"), Value::from(1));
        assert!(vars.contains("Var1"));
    }

    #[test]
    fn local_namespace_never_writes_parent() {
        let parent = Variables::new().with("a", 1).with("b", 2);
        let mut local = LocalVariables::new(&parent, true);
        local.set("a", Value::from(10));

        assert_eq!(local.get("a"), Value::from(10));
        assert_eq!(local.get("b"), Value::from(2));
        assert_eq!(local.get_local("b"), Value::Null);
        assert!(local.owns("a"));
        assert!(!local.owns("b"));
        assert_eq!(parent.get("a"), Value::from(1));
    }

    #[test]
    fn local_element_write_copies_parent_array() {
        let parent = Variables::new().with("arr", Value::Array(vec![Value::from(1)]));
        let mut local = LocalVariables::new(&parent, true);
        local.set_element("arr", 1, Value::from(2));

        assert_eq!(local.get("arr"), Value::Array(vec![Value::from(1), Value::from(2)]));
        assert_eq!(parent.get("arr"), Value::Array(vec![Value::from(1)]));
    }

    #[test]
    fn resolve_name_finds_entry_differing_in_case() {
        let vars = Variables::new().with("Price", 10);
        assert_eq!(resolve_name(&vars, "price", false), "Price");
        assert_eq!(resolve_name(&vars, "PRICE", false), "Price");
        assert_eq!(resolve_name(&vars, "price", true), "price");
        assert_eq!(resolve_name(&vars, "qty", false), "qty");
    }

    #[test]
    fn case_insensitive_local_namespace() {
        let parent = Variables::new().with("Price", 10);
        let mut local = LocalVariables::new(&parent, false);
        local.set("Amount", Value::from(21));

        assert_eq!(local.get("Amount"), Value::from(21));
        assert_eq!(local.get("AMOUNT"), Value::from(21));
        assert_eq!(local.get_local("amount"), Value::from(21));
        assert!(local.owns("aMoUnT"));
        assert_eq!(local.get("price"), Value::from(10));
        assert!(local.contains("PRICE"));
        assert!(!local.owns("price"));
    }

    #[test]
    fn case_sensitive_local_namespace_matches_exactly() {
        let parent = Variables::new().with("Price", 10);
        let mut local = LocalVariables::new(&parent, true);
        local.set("Amount", Value::from(21));

        assert_eq!(local.get("amount"), Value::Null);
        assert_eq!(local.get("price"), Value::Null);
        assert_eq!(local.get("Price"), Value::from(10));
    }
}
