//!
//! Interpreter - Bound Tree Execution
//!
//! A tree-walking interpreter over `BoundProgram`. Each call gets a frame of
//! value slots (parameters first, then locals) and the receiver for
//! instance methods.
//!
//! Arithmetic on ints wraps. Int division by zero, `throw`, failed
//! conversions and calls nested deeper than `MAX_CALL_DEPTH` abort with a
//! `RuntimeFailure` naming the method that was executing.
//!

use std::io::Write;

use smallvec::SmallVec;

use crate::backend::{RuntimeFailure, Value};
use crate::script::ast::{BinaryOp, UnaryOp};
use crate::script::binder::{BExpr, BStmt, BoundMethod, BoundProgram};

pub const MAX_CALL_DEPTH: usize = 256;

type Args = SmallVec<[Value; 4]>;
type Exec<T> = Result<T, RuntimeFailure>;

enum Flow {
    Normal,
    Return(Value),
}

struct Frame<'p> {
    method: &'p BoundMethod,
    this: Value,
    slots: Vec<Value>,
}

impl Frame<'_> {
    fn fail(&self, message: impl Into<String>) -> RuntimeFailure {
        RuntimeFailure::new(&self.method.qualified_name, message)
    }
}

pub struct Interpreter<'p> {
    program: &'p BoundProgram,
    out: &'p mut dyn Write,
    depth: usize,
}

impl<'p> Interpreter<'p> {
    pub fn new(program: &'p BoundProgram, out: &'p mut dyn Write) -> Self {
        Self {
            program,
            out,
            depth: 0,
        }
    }

    /// Calls a method. `this` is ignored for static methods. Missing
    /// trailing arguments take their parameter defaults.
    pub fn call(&mut self, type_idx: usize, method_idx: usize, this: Value, args: Args) -> Exec<Value> {
        let method = self.program.method(type_idx, method_idx);
        if self.depth >= MAX_CALL_DEPTH {
            return Err(RuntimeFailure::new(&method.qualified_name, "Stack overflow"));
        }

        self.depth += 1;
        let result = self.run(method, this, args);
        self.depth -= 1;
        result
    }

    fn run(&mut self, method: &'p BoundMethod, this: Value, args: Args) -> Exec<Value> {
        let mut frame = Frame {
            method,
            this: if method.is_static { Value::Null } else { this },
            slots: vec![Value::Null; method.frame_size.max(method.params.len())],
        };

        let mut args = args.into_iter();
        for (slot, param) in method.params.iter().enumerate() {
            let value = match (args.next(), &param.default) {
                (Some(value), _) => value,
                (None, Some(default)) => default.clone(),
                (None, None) => {
                    return Err(frame.fail(format!("No value given for parameter '{}'", param.name)));
                }
            };
            frame.slots[slot] = param.ty.coerce(value).map_err(|e| frame.fail(e))?;
        }

        let result = match self.exec_block(&mut frame, &method.body)? {
            Flow::Return(value) => value,
            Flow::Normal => Value::Void,
        };

        if method.return_type.is_void() {
            Ok(Value::Void)
        } else {
            method.return_type.coerce(result).map_err(|e| frame.fail(e))
        }
    }

    fn exec_block(&mut self, frame: &mut Frame<'p>, statements: &'p [BStmt]) -> Exec<Flow> {
        for stmt in statements {
            if let Flow::Return(value) = self.exec_stmt(frame, stmt)? {
                return Ok(Flow::Return(value));
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_stmt(&mut self, frame: &mut Frame<'p>, stmt: &'p BStmt) -> Exec<Flow> {
        match stmt {
            BStmt::Let { slot, ty, init } => {
                let value = match (init, ty) {
                    (Some(init), _) => self.eval(frame, init)?,
                    (None, Some(ty)) => ty.default_value(),
                    (None, None) => Value::Null,
                };
                frame.slots[*slot] = match ty {
                    Some(ty) => ty.coerce(value).map_err(|e| frame.fail(e))?,
                    None if value.is_void() => {
                        return Err(frame.fail("Cannot assign void to an implicitly-typed variable"));
                    }
                    None => value,
                };
            }
            BStmt::Assign { slot, ty, op, value } => {
                let rhs = self.eval(frame, value)?;
                let value = match op {
                    Some(op) => binary(frame, *op, frame.slots[*slot].clone(), rhs)?,
                    None => rhs,
                };
                frame.slots[*slot] = match ty {
                    Some(ty) => ty.coerce(value).map_err(|e| frame.fail(e))?,
                    None => value,
                };
            }
            BStmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(frame, expr)?,
                    None => Value::Void,
                };
                return Ok(Flow::Return(value));
            }
            BStmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let branch = if self.condition(frame, condition)? {
                    then_branch
                } else {
                    else_branch
                };
                return self.exec_block(frame, branch);
            }
            BStmt::While { condition, body } => {
                while self.condition(frame, condition)? {
                    if let Flow::Return(value) = self.exec_block(frame, body)? {
                        return Ok(Flow::Return(value));
                    }
                }
            }
            BStmt::Throw(value) => {
                let message = match self.eval(frame, value)? {
                    Value::Null => "Value cannot be null.".to_string(),
                    other => other.to_string(),
                };
                return Err(frame.fail(message));
            }
            BStmt::Block(statements) => return self.exec_block(frame, statements),
            BStmt::Expr(expr) => {
                self.eval(frame, expr)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn condition(&mut self, frame: &mut Frame<'p>, expr: &'p BExpr) -> Exec<bool> {
        match self.eval(frame, expr)? {
            Value::Bool(b) => Ok(b),
            other => Err(frame.fail(format!(
                "Cannot implicitly convert type '{}' to 'bool'",
                other.type_name()
            ))),
        }
    }

    fn eval(&mut self, frame: &mut Frame<'p>, expr: &'p BExpr) -> Exec<Value> {
        match expr {
            BExpr::Const(value) => Ok(value.clone()),
            BExpr::Local(slot) => Ok(frame.slots[*slot].clone()),
            BExpr::This => Ok(frame.this.clone()),
            BExpr::Unary(op, operand) => {
                let value = self.eval(frame, operand)?;
                unary(frame, *op, value)
            }
            BExpr::Binary(BinaryOp::And, left, right) => {
                Ok(Value::Bool(self.condition(frame, left)? && self.condition(frame, right)?))
            }
            BExpr::Binary(BinaryOp::Or, left, right) => {
                Ok(Value::Bool(self.condition(frame, left)? || self.condition(frame, right)?))
            }
            BExpr::Binary(op, left, right) => {
                let lhs = self.eval(frame, left)?;
                let rhs = self.eval(frame, right)?;
                binary(frame, *op, lhs, rhs)
            }
            BExpr::Builtin(builtin, args) => {
                let args = self.eval_args(frame, args)?;
                (builtin.func)(&mut *self.out, &args).map_err(|e| frame.fail(e))
            }
            BExpr::Call {
                type_idx,
                method_idx,
                args,
            } => {
                let args = self.eval_args(frame, args)?;
                self.call(*type_idx, *method_idx, frame.this.clone(), args)
            }
        }
    }

    fn eval_args(&mut self, frame: &mut Frame<'p>, args: &'p [BExpr]) -> Exec<Args> {
        let mut values = Args::with_capacity(args.len());
        for arg in args {
            let value = self.eval(frame, arg)?;
            if value.is_void() {
                return Err(frame.fail("Cannot pass a void result as an argument"));
            }
            values.push(value);
        }
        Ok(values)
    }
}

fn unary(frame: &Frame<'_>, op: UnaryOp, value: Value) -> Exec<Value> {
    match (op, value) {
        (UnaryOp::Neg, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
        (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (op, value) => Err(frame.fail(format!(
            "Operator '{}' cannot be applied to operand of type '{}'",
            match op {
                UnaryOp::Neg => "-",
                UnaryOp::Not => "!",
            },
            value.type_name()
        ))),
    }
}

fn binary(frame: &Frame<'_>, op: BinaryOp, lhs: Value, rhs: Value) -> Exec<Value> {
    use Value::{Int, Str};

    let mismatch = |lhs: &Value, rhs: &Value| {
        frame.fail(format!(
            "Operator '{}' cannot be applied to operands of type '{}' and '{}'",
            op.symbol(),
            lhs.type_name(),
            rhs.type_name()
        ))
    };

    match op {
        BinaryOp::Add => match (&lhs, &rhs) {
            (Int(a), Int(b)) => Ok(Int(a.wrapping_add(*b))),
            (Str(_), _) | (_, Str(_)) if !lhs.is_void() && !rhs.is_void() => Ok(Str(format!("{}{}", lhs, rhs))),
            _ => float_op(&lhs, &rhs, |a, b| a + b).ok_or_else(|| mismatch(&lhs, &rhs)),
        },
        BinaryOp::Sub => match (&lhs, &rhs) {
            (Int(a), Int(b)) => Ok(Int(a.wrapping_sub(*b))),
            _ => float_op(&lhs, &rhs, |a, b| a - b).ok_or_else(|| mismatch(&lhs, &rhs)),
        },
        BinaryOp::Mul => match (&lhs, &rhs) {
            (Int(a), Int(b)) => Ok(Int(a.wrapping_mul(*b))),
            _ => float_op(&lhs, &rhs, |a, b| a * b).ok_or_else(|| mismatch(&lhs, &rhs)),
        },
        BinaryOp::Div => match (&lhs, &rhs) {
            (Int(_), Int(0)) => Err(frame.fail("Attempted to divide by zero.")),
            (Int(a), Int(b)) => Ok(Int(a.wrapping_div(*b))),
            _ => float_op(&lhs, &rhs, |a, b| a / b).ok_or_else(|| mismatch(&lhs, &rhs)),
        },
        BinaryOp::Mod => match (&lhs, &rhs) {
            (Int(_), Int(0)) => Err(frame.fail("Attempted to divide by zero.")),
            (Int(a), Int(b)) => Ok(Int(a.wrapping_rem(*b))),
            _ => float_op(&lhs, &rhs, |a, b| a % b).ok_or_else(|| mismatch(&lhs, &rhs)),
        },
        BinaryOp::Eq => Ok(Value::Bool(values_equal(&lhs, &rhs))),
        BinaryOp::NotEq => Ok(Value::Bool(!values_equal(&lhs, &rhs))),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let (Some(a), Some(b)) = (as_number(&lhs), as_number(&rhs)) else {
                return Err(mismatch(&lhs, &rhs));
            };
            let result = match op {
                BinaryOp::Lt => a < b,
                BinaryOp::LtEq => a <= b,
                BinaryOp::Gt => a > b,
                _ => a >= b,
            };
            Ok(Value::Bool(result))
        }
        // Short-circuit forms are evaluated by the interpreter; this is the
        // compound-assignment path, which never produces them.
        BinaryOp::And | BinaryOp::Or => match (lhs, rhs) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(if op == BinaryOp::And { a && b } else { a || b })),
            (lhs, rhs) => Err(mismatch(&lhs, &rhs)),
        },
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(x) => Some(*x),
        _ => None,
    }
}

fn float_op(lhs: &Value, rhs: &Value, f: fn(f64, f64) -> f64) -> Option<Value> {
    Some(Value::Float(f(as_number(lhs)?, as_number(rhs)?)))
}

fn values_equal(lhs: &Value, rhs: &Value) -> bool {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => as_number(lhs) == as_number(rhs),
        _ => lhs == rhs,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{CompileUnit, MethodDecl, NamespaceDecl, ParamDecl, TypeDecl, Visibility};
    use crate::script::binder::bind;

    fn method(name: &str, return_type: &str, body: &str) -> MethodDecl {
        MethodDecl {
            name: name.to_string(),
            visibility: Visibility::Public,
            is_static: true,
            return_type: return_type.to_string(),
            params: Vec::new(),
            body: body.to_string(),
        }
    }

    fn program(methods: Vec<MethodDecl>) -> BoundProgram {
        let unit = CompileUnit {
            namespaces: vec![NamespaceDecl {
                name: "Acme".to_string(),
                imports: vec!["System".to_string()],
                types: vec![TypeDecl {
                    name: "Widget".to_string(),
                    visibility: Visibility::Public,
                    is_static: false,
                    methods,
                }],
            }],
        };
        bind(&unit, &["System".to_string()]).unwrap()
    }

    fn run(program: &BoundProgram) -> (Exec<Value>, String) {
        let mut out = Vec::new();
        let result = Interpreter::new(program, &mut out).call(0, 0, Value::Object("Acme.Widget".to_string()), Args::new());
        (result, String::from_utf8(out).unwrap())
    }

    fn eval_int(body: &str) -> Exec<Value> {
        run(&program(vec![method("Run", "int", body)])).0
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(eval_int("return 1 + 2 * 3 - 8 / 4"), Ok(Value::Int(5)));
        assert_eq!(eval_int("return -7 % 3"), Ok(Value::Int(-1)));
        assert_eq!(eval_int("var x = 9223372036854775807; return x + 1"), Ok(Value::Int(i64::MIN)));
    }

    #[test]
    fn test_divide_by_zero() {
        let failure = eval_int("var zero = 0; return 1 / zero").unwrap_err();
        assert_eq!(failure.message, "Attempted to divide by zero.");
        assert_eq!(failure.method, "Acme.Widget.Run");
    }

    #[test]
    fn test_control_flow() {
        let body = "var i = 0;\nvar total = 0;\nwhile (i < 10) {\n  i += 1;\n  if (i % 2 == 0) { total += i; } else if (i == 7) { return total; }\n}\nreturn -1";
        assert_eq!(eval_int(body), Ok(Value::Int(12)));
    }

    #[test]
    fn test_short_circuit() {
        assert_eq!(eval_int("var zero = 0; if (false && 1 / zero == 0) { return 1; } return 2"), Ok(Value::Int(2)));
        assert_eq!(eval_int("var zero = 0; if (true || 1 / zero == 0) { return 1; } return 2"), Ok(Value::Int(1)));
    }

    #[test]
    fn test_string_concat_and_console() {
        let program = program(vec![method(
            "Run",
            "System.Void",
            "var name = \"world\";\nConsole.WriteLine(\"hello \" + name + \" \" + 3);\nConsole.Write(1.5 > 1)",
        )]);
        let (result, out) = run(&program);
        assert_eq!(result, Ok(Value::Void));
        assert_eq!(out, "hello world 3\nTrue");
    }

    #[test]
    fn test_throw() {
        let failure = eval_int("throw \"boom\"").unwrap_err();
        assert_eq!(failure.to_string(), "boom (in Acme.Widget.Run)");
    }

    #[test]
    fn test_calls_fill_defaults() {
        let mut add = method("Add", "int", "return a + b");
        add.params = vec![
            ParamDecl {
                ty: "int".to_string(),
                name: "a".to_string(),
                default: None,
            },
            ParamDecl {
                ty: "int".to_string(),
                name: "b".to_string(),
                default: Some("10".to_string()),
            },
        ];
        let program = program(vec![method("Run", "int", "return Add(1) + Add(1, 2)"), add]);
        assert_eq!(run(&program).0, Ok(Value::Int(14)));
    }

    #[test]
    fn test_failure_names_innermost_method() {
        let program = program(vec![
            method("Run", "int", "return Inner()"),
            method("Inner", "int", "throw \"inner failed\""),
        ]);
        let failure = run(&program).0.unwrap_err();
        assert_eq!(failure.method, "Acme.Widget.Inner");
    }

    #[test]
    fn test_return_coercion() {
        assert_eq!(
            run(&program(vec![method("Run", "double", "return 2")])).0,
            Ok(Value::Float(2.0))
        );
        let failure = eval_int("return \"three\"").unwrap_err();
        assert_eq!(failure.message, "Cannot implicitly convert type 'string' to 'int'");
    }

    #[test]
    fn test_instance_receiver() {
        let mut run_method = method("Run", "object", "return this");
        run_method.is_static = false;
        assert_eq!(
            run(&program(vec![run_method])).0,
            Ok(Value::Object("Acme.Widget".to_string()))
        );
    }

    #[test]
    fn test_condition_must_be_bool() {
        let failure = eval_int("if (1) { return 1; } return 0").unwrap_err();
        assert_eq!(failure.message, "Cannot implicitly convert type 'int' to 'bool'");
    }

    #[test]
    fn test_call_depth_limit() {
        let handle = std::thread::Builder::new()
            .stack_size(64 * 1024 * 1024)
            .spawn(|| {
                let program = program(vec![method("Run", "int", "return Run()")]);
                run(&program).0
            })
            .unwrap();
        let failure = handle.join().unwrap().unwrap_err();
        assert_eq!(failure.message, "Stack overflow");
    }
}
