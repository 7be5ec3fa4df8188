//!
//! Builtin Classes
//!
//! The runtime modules a compile unit may reference and the static methods
//! they provide. A namespace reaches a builtin class by importing its
//! module; a fully qualified path (`System.Console.WriteLine`) works from
//! anywhere.
//!
//! Modules:
//! - System: Console, Math, Convert, String
//! - System.Threading: Thread
//!

use std::io::Write;
use std::time::Duration;

use crate::backend::Value;

pub type BuiltinFn = fn(&mut dyn Write, &[Value]) -> Result<Value, String>;

pub struct Builtin {
    pub module: &'static str,
    pub class: &'static str,
    pub name: &'static str,
    pub min_args: usize,
    /// `None` for variadic methods.
    pub max_args: Option<usize>,
    pub func: BuiltinFn,
}

impl Builtin {
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min_args && self.max_args.is_none_or(|max| count <= max)
    }

    pub fn qualified_name(&self) -> String {
        format!("{}.{}.{}", self.module, self.class, self.name)
    }
}

impl std::fmt::Debug for Builtin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Builtin({}.{})", self.class, self.name)
    }
}

pub const MODULES: &[&str] = &["System", "System.Threading"];

static BUILTINS: &[Builtin] = &[
    Builtin {
        module: "System",
        class: "Console",
        name: "WriteLine",
        min_args: 0,
        max_args: Some(1),
        func: console_write_line,
    },
    Builtin {
        module: "System",
        class: "Console",
        name: "Write",
        min_args: 1,
        max_args: Some(1),
        func: console_write,
    },
    Builtin {
        module: "System",
        class: "Math",
        name: "Max",
        min_args: 2,
        max_args: Some(2),
        func: math_max,
    },
    Builtin {
        module: "System",
        class: "Math",
        name: "Min",
        min_args: 2,
        max_args: Some(2),
        func: math_min,
    },
    Builtin {
        module: "System",
        class: "Math",
        name: "Abs",
        min_args: 1,
        max_args: Some(1),
        func: math_abs,
    },
    Builtin {
        module: "System",
        class: "Convert",
        name: "ToString",
        min_args: 1,
        max_args: Some(1),
        func: convert_to_string,
    },
    Builtin {
        module: "System",
        class: "Convert",
        name: "ToInt32",
        min_args: 1,
        max_args: Some(1),
        func: convert_to_int32,
    },
    Builtin {
        module: "System",
        class: "String",
        name: "Concat",
        min_args: 0,
        max_args: None,
        func: string_concat,
    },
    Builtin {
        module: "System.Threading",
        class: "Thread",
        name: "Sleep",
        min_args: 1,
        max_args: Some(1),
        func: thread_sleep,
    },
];

pub fn is_known_module(name: &str) -> bool {
    MODULES.contains(&name)
}

/// Is `class` provided by one of `modules`?
pub fn has_class<'a>(modules: impl IntoIterator<Item = &'a str>, class: &str) -> bool {
    let modules: Vec<&str> = modules.into_iter().collect();
    BUILTINS
        .iter()
        .any(|b| b.class == class && modules.contains(&b.module))
}

pub fn lookup<'a>(
    modules: impl IntoIterator<Item = &'a str>,
    class: &str,
    name: &str,
) -> Option<&'static Builtin> {
    let modules: Vec<&str> = modules.into_iter().collect();
    BUILTINS
        .iter()
        .find(|b| b.class == class && b.name == name && modules.contains(&b.module))
}

fn console_write_line(out: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    match args.first() {
        Some(value) => writeln!(out, "{}", value),
        None => writeln!(out),
    }
    .map_err(|e| e.to_string())?;
    Ok(Value::Void)
}

fn console_write(out: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    write!(out, "{}", args[0]).map_err(|e| e.to_string())?;
    out.flush().map_err(|e| e.to_string())?;
    Ok(Value::Void)
}

fn numeric_pair(args: &[Value], pick: fn(f64, f64) -> f64, pick_int: fn(i64, i64) -> i64) -> Result<Value, String> {
    match (&args[0], &args[1]) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(pick_int(*a, *b))),
        (a, b) => Ok(Value::Float(pick(as_float(a)?, as_float(b)?))),
    }
}

fn as_float(value: &Value) -> Result<f64, String> {
    match value {
        Value::Int(n) => Ok(*n as f64),
        Value::Float(x) => Ok(*x),
        other => Err(format!("Argument of type '{}' is not a number", other.type_name())),
    }
}

fn math_max(_: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    numeric_pair(args, f64::max, i64::max)
}

fn math_min(_: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    numeric_pair(args, f64::min, i64::min)
}

fn math_abs(_: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Int(n) => n
            .checked_abs()
            .map(Value::Int)
            .ok_or_else(|| "Negating the minimum value of a twos complement number is invalid.".to_string()),
        other => Ok(Value::Float(as_float(other)?.abs())),
    }
}

fn convert_to_string(_: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    Ok(Value::Str(args[0].to_string()))
}

fn convert_to_int32(_: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Float(x) => Ok(Value::Int(x.round_ties_even() as i64)),
        Value::Bool(b) => Ok(Value::Int(*b as i64)),
        Value::Null => Ok(Value::Int(0)),
        Value::Str(s) => s
            .trim()
            .parse::<i32>()
            .map(|n| Value::Int(n as i64))
            .map_err(|_| "Input string was not in a correct format.".to_string()),
        other => Err(format!("Unable to cast '{}' to an int", other.type_name())),
    }
}

fn string_concat(_: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    Ok(Value::Str(args.iter().map(Value::to_string).collect()))
}

fn thread_sleep(_: &mut dyn Write, args: &[Value]) -> Result<Value, String> {
    match &args[0] {
        Value::Int(ms) if *ms >= 0 => {
            std::thread::sleep(Duration::from_millis(*ms as u64));
            Ok(Value::Void)
        }
        Value::Int(_) => Err("Number must be either non-negative or -1.".to_string()),
        other => Err(format!("Cannot sleep for a value of type '{}'", other.type_name())),
    }
}
