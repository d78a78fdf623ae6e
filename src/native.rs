//! Built-in functions installed into the global environment.
//!
//! Every native is a plain `fn` over already-evaluated arguments. A failure
//! comes back as `Err(message)`; the interpreter turns it into a runtime
//! error located at the call's closing parenthesis.

use std::cell::RefCell;
use std::fmt;
use std::io::{self, BufRead};
use std::iter;
use std::rc::Rc;

use log::{debug, info};
use rand::Rng;

use crate::environment::Environment;
use crate::value::{ArrayValue, Value};

pub type NativeFn = fn(&[Value]) -> Result<Value, String>;

/// Largest array `vetor` and `preencherLista` will build.
const MAX_FILL: usize = 1 << 24;

/// How many arguments a native accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    OneOf(&'static [usize]),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match self {
            Arity::Fixed(n) => *n == count,
            Arity::OneOf(counts) => counts.contains(&count),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Fixed(n) => write!(f, "{}", n),
            Arity::OneOf(counts) => {
                let listed: Vec<String> = counts.iter().map(|c| c.to_string()).collect();
                f.write_str(&listed.join(" or "))
            }
        }
    }
}

pub struct NativeFunction {
    pub name: &'static str,
    pub arity: Arity,
    pub func: NativeFn,
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

/// `(names, arity, implementation)`; accented spellings share one value.
const NATIVES: &[(&[&str], Arity, NativeFn)] = &[
    (&["relogio", "relógio"], Arity::Fixed(0), clock),
    (&["potencia", "potência"], Arity::Fixed(2), pow),
    (&["leia"], Arity::Fixed(0), read_line),
    (&["tamanho"], Arity::Fixed(1), size),
    (&["empilhar"], Arity::Fixed(2), push),
    (&["inserir"], Arity::Fixed(3), insert),
    (&["temChave"], Arity::Fixed(2), has_key),
    (&["intAleatorio", "intAleatório"], Arity::Fixed(2), random_int),
    (&["preencherLista"], Arity::Fixed(2), fill_list),
    (&["vetor"], Arity::OneOf(&[1, 2]), new_vector),
];

/// Define every native in `globals`.
pub fn install(globals: &mut Environment) {
    for (names, arity, func) in NATIVES {
        let native = Rc::new(NativeFunction {
            name: names[0],
            arity: *arity,
            func: *func,
        });

        for name in names.iter() {
            debug!("Defining native function '{}'", name);
            globals.define(name, Value::Native(Rc::clone(&native)));
        }
    }

    info!("Installed {} native functions", NATIVES.len());
}

// ─────────────────────────── argument helpers ───────────────────────────

fn number(value: &Value, what: &str) -> Result<f64, String> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(format!("{} must be a number, not {}.", what, other.type_name())),
    }
}

fn count(value: &Value) -> Result<usize, String> {
    let n = number(value, "Size")?;

    if n < 0.0 || n.fract() != 0.0 {
        return Err(format!("Size must be a non-negative integer, not {}.", value));
    }

    if n > MAX_FILL as f64 {
        return Err(format!("Size must be at most {}, not {}.", MAX_FILL, value));
    }

    Ok(n as usize)
}

fn array(value: &Value) -> Result<&Rc<RefCell<ArrayValue>>, String> {
    match value {
        Value::Array(array) => Ok(array),
        _ => Err("First argument must be an array.".to_owned()),
    }
}

fn key(value: &Value) -> Result<String, String> {
    value
        .index_key()
        .ok_or_else(|| "Array key must be a number or a string.".to_owned())
}

// ───────────────────────────── natives ─────────────────────────────

fn clock(_args: &[Value]) -> Result<Value, String> {
    Ok(Value::Number(chrono::Utc::now().timestamp() as f64))
}

fn pow(args: &[Value]) -> Result<Value, String> {
    let base = number(&args[0], "Base")?;
    let exponent = number(&args[1], "Exponent")?;

    Ok(Value::Number(base.powf(exponent)))
}

fn read_line(_args: &[Value]) -> Result<Value, String> {
    let mut line = String::new();

    let read = io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| format!("Failed to read input: {}", e))?;

    if read == 0 {
        return Ok(Value::Nil);
    }

    let trimmed = line.trim_end_matches(['\n', '\r']).len();
    line.truncate(trimmed);

    Ok(Value::String(line))
}

fn size(args: &[Value]) -> Result<Value, String> {
    let n = match &args[0] {
        Value::Array(array) => array.borrow().len(),
        Value::String(s) => s.chars().count(),
        other => return Err(format!("Can't take the size of a {}.", other.type_name())),
    };

    Ok(Value::Number(n as f64))
}

fn push(args: &[Value]) -> Result<Value, String> {
    let target = array(&args[0])?;

    {
        let mut target = target.borrow_mut();
        let next = target.len().to_string();
        target.put(next, args[1].clone());
    }

    Ok(args[0].clone())
}

fn insert(args: &[Value]) -> Result<Value, String> {
    let target = array(&args[0])?;
    let key = key(&args[1])?;

    target.borrow_mut().put(key, args[2].clone());

    Ok(args[0].clone())
}

fn has_key(args: &[Value]) -> Result<Value, String> {
    let target = array(&args[0])?;
    let key = key(&args[1])?;

    let present = target.borrow().contains(&key);

    Ok(Value::Bool(present))
}

fn random_int(args: &[Value]) -> Result<Value, String> {
    let min = number(&args[0], "Minimum")?.floor() as i64;
    let max = number(&args[1], "Maximum")?.floor() as i64;

    if min > max {
        return Err("Minimum must not be greater than maximum.".to_owned());
    }

    let n = rand::thread_rng().gen_range(min..=max);

    Ok(Value::Number(n as f64))
}

fn filled(n: usize, value: Value) -> Value {
    let array = ArrayValue::from_values(iter::repeat(value).take(n));

    Value::Array(Rc::new(RefCell::new(array)))
}

fn fill_list(args: &[Value]) -> Result<Value, String> {
    Ok(filled(count(&args[0])?, args[1].clone()))
}

fn new_vector(args: &[Value]) -> Result<Value, String> {
    let fill = args.get(1).cloned().unwrap_or(Value::Nil);

    Ok(filled(count(&args[0])?, fill))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(values: &[f64]) -> Value {
        let array = ArrayValue::from_values(values.iter().map(|n| Value::Number(*n)));
        Value::Array(Rc::new(RefCell::new(array)))
    }

    #[test]
    fn arity_display() {
        assert_eq!(Arity::Fixed(2).to_string(), "2");
        assert_eq!(Arity::OneOf(&[1, 2]).to_string(), "1 or 2");
        assert!(Arity::OneOf(&[1, 2]).accepts(2));
        assert!(!Arity::Fixed(0).accepts(1));
    }

    #[test]
    fn push_appends_under_next_index() {
        let xs = list(&[1.0, 2.0]);
        push(&[xs.clone(), Value::Number(3.0)]).unwrap();

        assert_eq!(xs.to_string(), "[1, 2, 3]");
    }

    #[test]
    fn insert_and_has_key() {
        let xs = list(&[]);
        insert(&[xs.clone(), Value::String("nome".into()), Value::Number(1.0)]).unwrap();

        assert!(has_key(&[xs.clone(), Value::String("nome".into())]).unwrap().is_truthy());
        assert!(!has_key(&[xs, Value::Number(0.0)]).unwrap().is_truthy());
    }

    #[test]
    fn size_counts_characters() {
        let n = size(&[Value::String("ação".into())]).unwrap();

        assert_eq!(n.to_string(), "4");
    }

    #[test]
    fn vector_defaults_to_null() {
        let v = new_vector(&[Value::Number(2.0)]).unwrap();

        assert_eq!(v.to_string(), "[nulo, nulo]");
        assert!(new_vector(&[Value::Number(-1.0)]).is_err());
    }

    #[test]
    fn oversized_counts_are_rejected() {
        let err = new_vector(&[Value::Number(1e20)]).unwrap_err();
        assert_eq!(err, "Size must be at most 16777216, not 100000000000000000000.");

        assert!(fill_list(&[Value::Number(f64::INFINITY), Value::Nil]).is_err());
        assert!(fill_list(&[Value::Number((MAX_FILL + 1) as f64), Value::Nil]).is_err());
    }

    #[test]
    fn errors_name_the_offending_type() {
        assert_eq!(
            size(&[Value::Bool(true)]).unwrap_err(),
            "Can't take the size of a boolean."
        );
        assert_eq!(
            push(&[Value::Nil, Value::Nil]).unwrap_err(),
            "First argument must be an array."
        );
    }

    #[test]
    fn random_int_stays_in_range() {
        for _ in 0..50 {
            let n = random_int(&[Value::Number(1.0), Value::Number(3.0)]).unwrap();
            let Value::Number(n) = n else { panic!("not a number") };
            assert!((1.0..=3.0).contains(&n));
        }
    }

    #[test]
    fn install_defines_accented_aliases() {
        let mut globals = Environment::new();
        install(&mut globals);

        let token = crate::token::Token::new(crate::token::TokenType::IDENTIFIER, "potência", 1);
        assert_eq!(globals.get(&token).unwrap().to_string(), "<fn potencia>");
    }
}
