//! Runtime values.
//!
//! Scalars are stored inline; functions, classes, arrays and instances are
//! reference types shared through `Rc`, so copying a [`Value`] aliases them.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::native::NativeFunction;
use crate::token::Token;

/// Name `meu` is bound under inside methods.
pub const THIS_NAME: &str = "meu";

/// Name of the method run when a class is called.
pub const INITIALIZER_NAME: &str = "init";

#[derive(Debug, Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Bool(bool),
    Nil,
    Function(Rc<Function>),
    Native(Rc<NativeFunction>),
    Class(Rc<Class>),
    Array(Rc<RefCell<ArrayValue>>),
    Instance(Rc<RefCell<Instance>>),
}

impl Value {
    /// Only `falso` and `nulo` are falsy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Loose `==`.  Scalars coerce across number, string and boolean; reference
    /// types compare by identity.
    pub fn is_equal(&self, other: &Value) -> bool {
        use Value::*;

        match (self, other) {
            (Number(a), Number(b)) => a == b,
            (String(a), String(b)) => a == b,

            (Number(n), String(s)) | (String(s), Number(n)) => match s.trim().parse::<f64>() {
                Ok(parsed) => *n == parsed,
                Err(_) => format_number(*n) == *s,
            },

            (Bool(b), other) | (other, Bool(b)) => *b == other.is_truthy(),

            (Nil, Nil) => true,

            (Function(a), Function(b)) => Rc::ptr_eq(a, b),
            (Native(a), Native(b)) => Rc::ptr_eq(a, b),
            (Class(a), Class(b)) => Rc::ptr_eq(a, b),
            (Array(a), Array(b)) => Rc::ptr_eq(a, b),
            (Instance(a), Instance(b)) => Rc::ptr_eq(a, b),

            _ => false,
        }
    }

    /// Key under which this value indexes an array, if it is a scalar key.
    pub fn index_key(&self) -> Option<String> {
        match self {
            Value::Number(n) => Some(format_number(*n)),
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Bool(_) => "boolean",
            Value::Nil => "nil",
            Value::Function(_) | Value::Native(_) => "function",
            Value::Class(_) => "class",
            Value::Array(_) => "array",
            Value::Instance(_) => "instance",
        }
    }
}

/// `3` for integral values, shortest round-trip text otherwise.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        let mut buf = itoa::Buffer::new();
        buf.format(n as i64).to_owned()
    } else {
        n.to_string()
    }
}

/// Arrays currently being printed, innermost last.
type Visiting = Vec<*const RefCell<ArrayValue>>;

impl Value {
    fn write_display(&self, f: &mut fmt::Formatter<'_>, visiting: &mut Visiting) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::String(s) => f.write_str(s),
            Value::Bool(true) => f.write_str("verdadeiro"),
            Value::Bool(false) => f.write_str("falso"),
            Value::Nil => f.write_str("nulo"),
            Value::Function(func) => write!(f, "<fn {}>", func.decl.display_name()),
            Value::Native(native) => write!(f, "<fn {}>", native.name),
            Value::Class(class) => f.write_str(&class.name),
            Value::Array(array) => {
                let ptr = Rc::as_ptr(array);

                // an array reachable from itself prints as `[...]`
                if visiting.contains(&ptr) {
                    return f.write_str("[...]");
                }

                visiting.push(ptr);
                let result = array.borrow().write_entries(f, visiting);
                visiting.pop();

                result
            }
            Value::Instance(instance) => {
                write!(f, "Instância de {}", instance.borrow().class.name)
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_display(f, &mut Vec::new())
    }
}

// ───────────────────────────── functions ─────────────────────────────

/// A user function or lambda closed over the environment it was created in.
pub struct Function {
    pub decl: Rc<FunctionDecl>,
    pub closure: Rc<RefCell<Environment>>,
    /// Set for a class's `init`, bound or not.
    pub is_initializer: bool,
}

impl Function {
    pub fn new(
        decl: Rc<FunctionDecl>,
        closure: Rc<RefCell<Environment>>,
        is_initializer: bool,
    ) -> Self {
        Self {
            decl,
            closure,
            is_initializer,
        }
    }

    pub fn arity(&self) -> usize {
        self.decl.params.len()
    }

    /// A copy of this method whose closure has `meu` bound to `instance`.
    pub fn bind(&self, instance: Rc<RefCell<Instance>>) -> Function {
        let mut env = Environment::with_enclosing(Rc::clone(&self.closure));
        env.define(THIS_NAME, Value::Instance(instance));

        Function::new(
            Rc::clone(&self.decl),
            Rc::new(RefCell::new(env)),
            self.is_initializer,
        )
    }
}

// The closure may reach this function again; print only the name.
impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.decl.display_name())
            .field("arity", &self.arity())
            .field("is_initializer", &self.is_initializer)
            .finish()
    }
}

// ────────────────────────────── classes ──────────────────────────────

#[derive(Debug)]
pub struct Class {
    pub name: String,
    pub methods: HashMap<String, Rc<Function>>,
}

impl Class {
    pub fn find_method(&self, name: &str) -> Option<Rc<Function>> {
        self.methods.get(name).cloned()
    }

    /// Arity of `init`, or 0 without one.
    pub fn arity(&self) -> usize {
        self.find_method(INITIALIZER_NAME)
            .map_or(0, |init| init.arity())
    }
}

pub struct Instance {
    pub class: Rc<Class>,
    fields: HashMap<String, Value>,
}

impl Instance {
    pub fn new(class: Rc<Class>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    /// Own field first, then a class method bound to `this`.
    pub fn get(this: &Rc<RefCell<Instance>>, name: &Token) -> Result<Value, RuntimeError> {
        let instance = this.borrow();

        if let Some(value) = instance.fields.get(&name.lexeme) {
            return Ok(value.clone());
        }

        if let Some(method) = instance.class.find_method(&name.lexeme) {
            return Ok(Value::Function(Rc::new(method.bind(Rc::clone(this)))));
        }

        Err(RuntimeError::new(
            name,
            format!("Undefined property '{}'.", name.lexeme),
        ))
    }

    pub fn set(&mut self, name: &Token, value: Value) {
        self.fields.insert(name.lexeme.clone(), value);
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        fields.sort_unstable();

        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("fields", &fields)
            .finish()
    }
}

// ─────────────────────────────── arrays ──────────────────────────────

/// Insertion-ordered map from string keys to values.
pub struct ArrayValue {
    entries: Vec<(String, Value)>,
    /// Position of each key in `entries`.
    index: HashMap<String, usize>,
    /// Keys are exactly `0..len` in order.
    dense: bool,
}

impl Default for ArrayValue {
    fn default() -> Self {
        Self::new()
    }
}

impl ArrayValue {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            dense: true,
        }
    }

    /// Elements keyed `0..n-1`.
    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        let mut array = Self::new();
        for value in values {
            let key = array.len().to_string();
            array.put(key, value);
        }

        array
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.index.get(key).map(|&i| self.entries[i].1.clone())
    }

    /// Overwrite in place, or append a new key at the end.
    pub fn put(&mut self, key: String, value: Value) {
        if let Some(&i) = self.index.get(&key) {
            self.entries[i].1 = value;
            return;
        }

        let position = self.entries.len();
        self.dense = self.dense && is_position(&key, position);
        self.index.insert(key.clone(), position);
        self.entries.push((key, value));
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn write_entries(&self, f: &mut fmt::Formatter<'_>, visiting: &mut Visiting) -> fmt::Result {
        f.write_str("[")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if !self.dense {
                write!(f, "{} => ", key)?;
            }
            value.write_display(f, visiting)?;
        }
        f.write_str("]")
    }
}

/// Is `key` the canonical text of `position` (`"3"`, never `"03"` or `"+3"`)?
fn is_position(key: &str, position: usize) -> bool {
    let canonical = key.bytes().all(|b| b.is_ascii_digit()) && (key == "0" || !key.starts_with('0'));

    canonical && key.parse::<usize>() == Ok(position)
}

impl fmt::Display for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_entries(f, &mut Vec::new())
    }
}

// Elements may contain this array again; show the shape only.
impl fmt::Debug for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArrayValue")
            .field("len", &self.len())
            .field("dense", &self.dense)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> Value {
        Value::String(text.to_owned())
    }

    #[test]
    fn numbers_display_without_trailing_zero() {
        assert_eq!(Value::Number(3.0).to_string(), "3");
        assert_eq!(Value::Number(2.5).to_string(), "2.5");
        assert_eq!(Value::Number(-7.0).to_string(), "-7");
    }

    #[test]
    fn scalars_display_in_portuguese() {
        assert_eq!(Value::Bool(true).to_string(), "verdadeiro");
        assert_eq!(Value::Bool(false).to_string(), "falso");
        assert_eq!(Value::Nil.to_string(), "nulo");
    }

    #[test]
    fn arrays_switch_to_pairs_when_sparse() {
        let mut array = ArrayValue::from_values([Value::Number(1.0), s("b")]);
        assert_eq!(array.to_string(), "[1, b]");

        array.put("x".into(), Value::Nil);
        assert_eq!(array.to_string(), "[0 => 1, 1 => b, x => nulo]");
    }

    #[test]
    fn put_keeps_insertion_order() {
        let mut array = ArrayValue::new();
        array.put("b".into(), Value::Number(1.0));
        array.put("a".into(), Value::Number(2.0));
        array.put("b".into(), Value::Number(3.0));

        assert_eq!(array.len(), 2);
        assert_eq!(array.to_string(), "[b => 3, a => 2]");
    }

    #[test]
    fn self_containing_array_prints_placeholder() {
        let array = Rc::new(RefCell::new(ArrayValue::from_values([Value::Number(1.0)])));
        let value = Value::Array(Rc::clone(&array));
        array.borrow_mut().put("1".into(), value.clone());

        assert_eq!(value.to_string(), "[1, [...]]");
    }

    #[test]
    fn same_array_twice_is_not_a_cycle() {
        let inner = Value::Array(Rc::new(RefCell::new(ArrayValue::from_values([s("x")]))));
        let outer = ArrayValue::from_values([inner.clone(), inner]);

        assert_eq!(outer.to_string(), "[[x], [x]]");
    }

    #[test]
    fn non_canonical_index_keys_are_sparse() {
        let mut array = ArrayValue::new();
        array.put("0".into(), Value::Nil);
        array.put("01".into(), Value::Nil);
        assert_eq!(array.to_string(), "[0 => nulo, 01 => nulo]");

        let mut array = ArrayValue::new();
        array.put("+0".into(), Value::Nil);
        assert_eq!(array.to_string(), "[+0 => nulo]");
    }

    #[test]
    fn lookups_find_overwritten_keys() {
        let mut array = ArrayValue::from_values([Value::Number(1.0), Value::Number(2.0)]);
        array.put("k".into(), s("v"));
        array.put("0".into(), s("novo"));

        assert_eq!(array.get("0").map(|v| v.to_string()).as_deref(), Some("novo"));
        assert_eq!(array.get("k").map(|v| v.to_string()).as_deref(), Some("v"));
        assert!(array.contains("1"));
        assert!(!array.contains("2"));
        assert_eq!(array.len(), 3);
    }

    #[test]
    fn truthiness() {
        assert!(Value::Number(0.0).is_truthy());
        assert!(s("").is_truthy());
        assert!(!Value::Nil.is_truthy());
        assert!(!Value::Bool(false).is_truthy());
    }

    #[test]
    fn loose_equality() {
        assert!(Value::Number(1.0).is_equal(&s("1")));
        assert!(s(" 2 ").is_equal(&Value::Number(2.0)));
        assert!(!Value::Number(1.0).is_equal(&s("um")));
        assert!(Value::Bool(true).is_equal(&Value::Number(5.0)));
        assert!(Value::Bool(false).is_equal(&Value::Nil));
        assert!(Value::Nil.is_equal(&Value::Nil));
        assert!(!Value::Nil.is_equal(&Value::Number(0.0)));
    }

    #[test]
    fn arrays_compare_by_identity() {
        let a = Value::Array(Rc::new(RefCell::new(ArrayValue::new())));
        let b = Value::Array(Rc::new(RefCell::new(ArrayValue::new())));

        assert!(a.is_equal(&a.clone()));
        assert!(!a.is_equal(&b));
    }

    #[test]
    fn index_keys() {
        assert_eq!(Value::Number(2.0).index_key().as_deref(), Some("2"));
        assert_eq!(s("k").index_key().as_deref(), Some("k"));
        assert_eq!(Value::Nil.index_key(), None);
    }
}
