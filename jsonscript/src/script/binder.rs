//!
//! Binder - Name Resolution and Checking
//!
//! Turns a compile unit into a `BoundProgram` the interpreter can execute.
//! Binding runs in two passes:
//!
//! 1. Collect every type and method signature (parameter types, defaults,
//!    return types, modifiers)
//! 2. Parse and bind every method body against those signatures: locals
//!    become frame slots, calls become direct references to a method or a
//!    builtin
//!
//! Every problem is collected as a `Diagnostic`; binding never stops at the
//! first one. A program is only produced when no error was reported.
//!

use std::collections::HashMap;

use lasso::{Rodeo, Spur};

use crate::backend::Value;
use crate::diagnostic::{Diagnostic, Location};
use crate::dom::{CompileUnit, MethodDecl, ParamDecl, Visibility};
use crate::script::ast::*;
use crate::script::builtins::{self, Builtin};
use crate::script::lexer::tokenize;
use crate::script::parser::{self, parse_standalone_expression};
use crate::script::types::ScriptType;
use crate::source::{Span, Spanned};

#[derive(Debug)]
pub struct BoundProgram {
    pub types: Vec<BoundType>,
}

impl BoundProgram {
    pub fn find_type(&self, full_name: &str) -> Option<usize> {
        self.types.iter().position(|t| t.full_name == full_name)
    }

    pub fn method(&self, type_idx: usize, method_idx: usize) -> &BoundMethod {
        &self.types[type_idx].methods[method_idx]
    }
}

#[derive(Debug)]
pub struct BoundType {
    pub namespace: String,
    pub name: String,
    pub full_name: String,
    pub is_static: bool,
    pub methods: Vec<BoundMethod>,
}

impl BoundType {
    pub fn find_method(&self, name: &str) -> Option<usize> {
        self.methods.iter().position(|m| m.name == name)
    }
}

#[derive(Debug)]
pub struct BoundMethod {
    pub name: String,
    pub qualified_name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub return_type: ScriptType,
    pub params: Vec<BoundParam>,
    /// Parameters first, then every local declared in the body.
    pub frame_size: usize,
    pub body: Vec<BStmt>,
}

impl BoundMethod {
    pub fn required_params(&self) -> usize {
        self.params.iter().filter(|p| p.default.is_none()).count()
    }

    pub fn is_public(&self) -> bool {
        self.visibility == Visibility::Public
    }
}

#[derive(Debug)]
pub struct BoundParam {
    pub name: String,
    pub ty: ScriptType,
    pub default: Option<Value>,
}

#[derive(Debug)]
pub enum BExpr {
    Const(Value),
    Local(usize),
    This,
    Unary(UnaryOp, Box<BExpr>),
    Binary(BinaryOp, Box<BExpr>, Box<BExpr>),
    Builtin(&'static Builtin, Vec<BExpr>),
    /// Instance callees receive the caller's `this`.
    Call {
        type_idx: usize,
        method_idx: usize,
        args: Vec<BExpr>,
    },
}

#[derive(Debug)]
pub enum BStmt {
    Let {
        slot: usize,
        ty: Option<ScriptType>,
        init: Option<BExpr>,
    },
    Assign {
        slot: usize,
        ty: Option<ScriptType>,
        op: Option<BinaryOp>,
        value: BExpr,
    },
    Return(Option<BExpr>),
    If {
        condition: BExpr,
        then_branch: Vec<BStmt>,
        else_branch: Vec<BStmt>,
    },
    While {
        condition: BExpr,
        body: Vec<BStmt>,
    },
    Throw(BExpr),
    Block(Vec<BStmt>),
    Expr(BExpr),
}

pub fn bind(unit: &CompileUnit, references: &[String]) -> Result<BoundProgram, Vec<Diagnostic>> {
    let mut binder = Binder {
        interner: Rodeo::default(),
        diagnostics: Vec::new(),
    };

    for reference in references {
        if !builtins::is_known_module(reference) {
            binder.error("JS0006", format!("Metadata file '{}.dll' could not be found", reference));
        }
    }

    let mut program = binder.collect(unit);
    binder.bind_bodies(unit, &mut program);

    if binder.diagnostics.iter().any(Diagnostic::is_error) {
        Err(binder.diagnostics)
    } else {
        Ok(program)
    }
}

struct Binder {
    interner: Rodeo,
    diagnostics: Vec<Diagnostic>,
}

impl Binder {
    fn error(&mut self, code: &str, message: String) {
        self.diagnostics.push(Diagnostic::error(code, message));
    }

    fn collect(&mut self, unit: &CompileUnit) -> BoundProgram {
        let mut program = BoundProgram { types: Vec::new() };

        for ns in &unit.namespaces {
            for ty in &ns.types {
                let full_name = format!("{}.{}", ns.name, ty.name);
                if program.find_type(&full_name).is_some() {
                    self.error(
                        "JS0101",
                        format!("The namespace '{}' already contains a definition for '{}'", ns.name, ty.name),
                    );
                }

                let mut methods: Vec<BoundMethod> = Vec::with_capacity(ty.methods.len());
                for method in &ty.methods {
                    let qualified_name = format!("{}.{}", full_name, method.name);
                    if methods.iter().any(|m| m.name == method.name) {
                        self.error(
                            "JS0111",
                            format!("Type '{}' already defines a member called '{}'", full_name, method.name),
                        );
                    }
                    if ty.is_static && !method.is_static {
                        self.error(
                            "JS0708",
                            format!("'{}': cannot declare instance members in a static class", qualified_name),
                        );
                    }
                    methods.push(self.collect_method(method, qualified_name));
                }

                program.types.push(BoundType {
                    namespace: ns.name.clone(),
                    name: ty.name.clone(),
                    full_name,
                    is_static: ty.is_static,
                    methods,
                });
            }
        }

        program
    }

    fn collect_method(&mut self, method: &MethodDecl, qualified_name: String) -> BoundMethod {
        let return_type = self.resolve_signature_type(&method.return_type, &qualified_name);

        let mut params: Vec<BoundParam> = Vec::with_capacity(method.params.len());
        for param in &method.params {
            if params.iter().any(|p| p.name == param.name) {
                self.error(
                    "JS0100",
                    format!("The parameter name '{}' is a duplicate in '{}'", param.name, qualified_name),
                );
            }
            params.push(self.collect_param(param, &qualified_name));
        }

        BoundMethod {
            name: method.name.clone(),
            qualified_name,
            visibility: method.visibility,
            is_static: method.is_static,
            return_type,
            params,
            frame_size: 0,
            body: Vec::new(),
        }
    }

    fn collect_param(&mut self, param: &ParamDecl, qualified_name: &str) -> BoundParam {
        let ty = self.resolve_signature_type(&param.ty, qualified_name);
        if ty.is_void() {
            self.error(
                "JS1536",
                format!("Invalid parameter type 'void' for '{}' in '{}'", param.name, qualified_name),
            );
        }
        let default = param
            .default
            .as_deref()
            .and_then(|text| self.bind_default(text, &param.name, ty, qualified_name));

        BoundParam {
            name: param.name.clone(),
            ty,
            default,
        }
    }

    fn resolve_signature_type(&mut self, name: &str, qualified_name: &str) -> ScriptType {
        ScriptType::resolve(name).unwrap_or_else(|| {
            self.error(
                "JS0246",
                format!("The type or namespace name '{}' could not be found (in '{}')", name, qualified_name),
            );
            ScriptType::Object
        })
    }

    /// Default values must be literals, optionally negated numbers.
    fn bind_default(&mut self, text: &str, param: &str, ty: ScriptType, qualified_name: &str) -> Option<Value> {
        let tokens = tokenize(text, &mut self.interner);
        let constant = parse_standalone_expression(&tokens, text)
            .ok()
            .and_then(|expr| constant_value(&expr, &self.interner));

        let Some(value) = constant else {
            self.error(
                "JS1736",
                format!(
                    "Default parameter value for '{}' in '{}' must be a compile-time constant",
                    param, qualified_name
                ),
            );
            return None;
        };

        let found = value.type_name();
        match ty.coerce(value) {
            Ok(value) => Some(value),
            Err(_) => {
                self.error(
                    "JS1750",
                    format!(
                        "A value of type '{}' cannot be used as a default parameter for '{}' in '{}' because there are no standard conversions to type '{}'",
                        found, param, qualified_name, ty
                    ),
                );
                None
            }
        }
    }

    fn bind_bodies(&mut self, unit: &CompileUnit, program: &mut BoundProgram) {
        let mut bound = Vec::with_capacity(program.types.len());
        let mut type_idx = 0;

        for ns in &unit.namespaces {
            for ty in &ns.types {
                let mut bodies = Vec::with_capacity(ty.methods.len());
                for (method_idx, method) in ty.methods.iter().enumerate() {
                    let tokens = tokenize(&method.body, &mut self.interner);
                    let parsed = parser::parse(&tokens, &method.body);
                    let location = |span: Span| Location::in_body(&ns.name, &ty.name, &method.name, &method.body, span);

                    if !parsed.errors.is_empty() {
                        for err in parsed.errors {
                            self.diagnostics
                                .push(Diagnostic::error("JS1002", err.message).at(location(err.span)));
                        }
                        bodies.push((Vec::new(), 0));
                        continue;
                    }

                    let mut body_binder = BodyBinder::new(
                        program,
                        &self.interner,
                        &mut self.diagnostics,
                        &location,
                        &ns.imports,
                        type_idx,
                        method_idx,
                    );
                    let body = body_binder.bind_body(&parsed.body);
                    let frame_size = body_binder.frame_size;

                    let signature = program.method(type_idx, method_idx);
                    if !signature.return_type.is_void() && !always_exits(&body) {
                        self.error(
                            "JS0161",
                            format!("'{}': not all code paths return a value", signature.qualified_name),
                        );
                    }
                    bodies.push((body, frame_size));
                }
                bound.push(bodies);
                type_idx += 1;
            }
        }

        for (ty, bodies) in program.types.iter_mut().zip(bound) {
            for (method, (body, frame_size)) in ty.methods.iter_mut().zip(bodies) {
                method.body = body;
                method.frame_size = frame_size;
            }
        }
    }
}

fn constant_value(expr: &Expression, interner: &Rodeo) -> Option<Value> {
    match expr {
        Expression::Literal(lit) => Some(literal_value(&lit.value, interner)),
        Expression::Unary(UnaryExpr {
            op: UnaryOp::Neg,
            operand,
            ..
        }) => match constant_value(operand, interner)? {
            Value::Int(n) => Some(Value::Int(n.wrapping_neg())),
            Value::Float(x) => Some(Value::Float(-x)),
            _ => None,
        },
        _ => None,
    }
}

fn literal_value(literal: &Literal, interner: &Rodeo) -> Value {
    match literal {
        Literal::Int(n) => Value::Int(*n),
        Literal::Float(x) => Value::Float(*x),
        Literal::Str(symbol) => Value::Str(interner.resolve(symbol).to_string()),
        Literal::Bool(b) => Value::Bool(*b),
        Literal::Null => Value::Null,
    }
}

fn always_exits(statements: &[BStmt]) -> bool {
    statements.iter().any(|stmt| match stmt {
        BStmt::Return(_) | BStmt::Throw(_) => true,
        BStmt::Block(inner) => always_exits(inner),
        BStmt::If {
            then_branch,
            else_branch,
            ..
        } => always_exits(then_branch) && always_exits(else_branch),
        BStmt::While {
            condition: BExpr::Const(Value::Bool(true)),
            ..
        } => true,
        _ => false,
    })
}

#[derive(Debug, Clone, Copy)]
struct Local {
    slot: usize,
    ty: Option<ScriptType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CallKind {
    /// `Run()`
    Implicit,
    /// `this.Run()`
    This,
    /// `Widget.Run()` or `Acme.Widget.Run()`
    Type,
}

struct BodyBinder<'b> {
    program: &'b BoundProgram,
    interner: &'b Rodeo,
    diagnostics: &'b mut Vec<Diagnostic>,
    location: &'b dyn Fn(Span) -> Location,
    imports: &'b [String],
    type_idx: usize,
    is_static: bool,
    return_type: ScriptType,
    qualified_name: &'b str,
    scopes: Vec<HashMap<Spur, Local>>,
    frame_size: usize,
}

impl<'b> BodyBinder<'b> {
    #[allow(clippy::too_many_arguments)]
    fn new(
        program: &'b BoundProgram,
        interner: &'b Rodeo,
        diagnostics: &'b mut Vec<Diagnostic>,
        location: &'b dyn Fn(Span) -> Location,
        imports: &'b [String],
        type_idx: usize,
        method_idx: usize,
    ) -> Self {
        let method = program.method(type_idx, method_idx);
        let mut params = HashMap::with_capacity(method.params.len());
        for (slot, param) in method.params.iter().enumerate() {
            if let Some(symbol) = interner.get(&param.name) {
                params.insert(symbol, Local { slot, ty: Some(param.ty) });
            }
        }

        Self {
            program,
            interner,
            diagnostics,
            location,
            imports,
            type_idx,
            is_static: method.is_static,
            return_type: method.return_type,
            qualified_name: &method.qualified_name,
            scopes: vec![params],
            frame_size: method.params.len(),
        }
    }

    fn error(&mut self, code: &str, span: Span, message: String) {
        let location = (self.location)(span);
        self.diagnostics.push(Diagnostic::error(code, message).at(location));
    }

    fn name(&self, ident: Ident) -> &'b str {
        self.interner.resolve(&ident.symbol)
    }

    fn lookup_local(&self, symbol: Spur) -> Option<Local> {
        self.scopes.iter().rev().find_map(|scope| scope.get(&symbol).copied())
    }

    fn bind_body(&mut self, body: &Body) -> Vec<BStmt> {
        body.statements
            .iter()
            .map(|stmt| self.bind_statement(stmt))
            .collect()
    }

    fn bind_block(&mut self, block: &BlockStmt) -> Vec<BStmt> {
        self.scopes.push(HashMap::new());
        let bound = block
            .statements
            .iter()
            .map(|stmt| self.bind_statement(stmt))
            .collect();
        self.scopes.pop();
        bound
    }

    fn bind_statement(&mut self, stmt: &Statement) -> BStmt {
        match stmt {
            Statement::Var(var) => self.bind_var(var),
            Statement::Assign(assign) => self.bind_assign(assign),
            Statement::Return(ret) => self.bind_return(ret),
            Statement::If(if_stmt) => self.bind_if(if_stmt),
            Statement::While(while_stmt) => BStmt::While {
                condition: self.bind_expr(&while_stmt.condition),
                body: self.bind_block(&while_stmt.body),
            },
            Statement::Throw(throw) => BStmt::Throw(self.bind_expr(&throw.value)),
            Statement::Block(block) => BStmt::Block(self.bind_block(block)),
            Statement::Expression(expr_stmt) => {
                if !matches!(expr_stmt.expr, Expression::Call(_)) {
                    self.error(
                        "JS0201",
                        expr_stmt.span,
                        "Only assignment and call expressions can be used as a statement".to_string(),
                    );
                }
                BStmt::Expr(self.bind_expr(&expr_stmt.expr))
            }
        }
    }

    fn bind_var(&mut self, var: &VarStmt) -> BStmt {
        let ty = var.ty.as_ref().map(|ty| {
            let name = ty
                .segments
                .iter()
                .map(|s| self.name(*s))
                .collect::<Vec<_>>()
                .join(".");
            match ScriptType::resolve(&name) {
                Some(ScriptType::Void) => {
                    self.error("JS1547", ty.span, "Keyword 'void' cannot be used in this context".to_string());
                    ScriptType::Object
                }
                Some(resolved) => resolved,
                None => {
                    self.error(
                        "JS0246",
                        ty.span,
                        format!("The type or namespace name '{}' could not be found", name),
                    );
                    ScriptType::Object
                }
            }
        });

        let init = var.init.as_ref().map(|e| self.bind_expr(e));

        if self.lookup_local(var.name.symbol).is_some() {
            self.error(
                "JS0128",
                var.name.span,
                format!(
                    "A local variable named '{}' is already defined in this scope",
                    self.name(var.name)
                ),
            );
        }

        let slot = self.frame_size;
        self.frame_size += 1;
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(var.name.symbol, Local { slot, ty });
        }

        BStmt::Let { slot, ty, init }
    }

    fn bind_assign(&mut self, assign: &AssignStmt) -> BStmt {
        let value = self.bind_expr(&assign.value);
        let op = assign.op.binary_op();

        let target = match &assign.target {
            Expression::Identifier(ident) => match self.lookup_local(ident.symbol) {
                Some(local) => Some(local),
                None => {
                    self.error(
                        "JS0103",
                        ident.span,
                        format!("The name '{}' does not exist in the current context", self.name(*ident)),
                    );
                    None
                }
            },
            other => {
                self.error(
                    "JS0131",
                    other.span(),
                    "The left-hand side of an assignment must be a variable".to_string(),
                );
                None
            }
        };

        match target {
            Some(local) => BStmt::Assign {
                slot: local.slot,
                ty: local.ty,
                op,
                value,
            },
            None => BStmt::Expr(value),
        }
    }

    fn bind_return(&mut self, ret: &ReturnStmt) -> BStmt {
        match (&ret.value, self.return_type.is_void()) {
            (Some(value), true) => {
                self.error(
                    "JS0127",
                    value.span(),
                    format!(
                        "Since '{}' returns void, a return keyword must not be followed by an object expression",
                        self.qualified_name
                    ),
                );
                BStmt::Return(None)
            }
            (None, false) => {
                self.error(
                    "JS0127",
                    ret.span,
                    format!("An object of a type convertible to '{}' is required", self.return_type),
                );
                BStmt::Return(None)
            }
            (value, _) => BStmt::Return(value.as_ref().map(|v| self.bind_expr(v))),
        }
    }

    fn bind_if(&mut self, if_stmt: &IfStmt) -> BStmt {
        let condition = self.bind_expr(&if_stmt.condition);
        let then_branch = self.bind_block(&if_stmt.then_branch);
        let else_branch = match &if_stmt.else_branch {
            Some(ElseBranch::ElseIf(nested)) => vec![self.bind_if(nested)],
            Some(ElseBranch::Else(block)) => self.bind_block(block),
            None => Vec::new(),
        };

        BStmt::If {
            condition,
            then_branch,
            else_branch,
        }
    }

    fn bind_expr(&mut self, expr: &Expression) -> BExpr {
        match expr {
            Expression::Literal(lit) => BExpr::Const(literal_value(&lit.value, self.interner)),
            Expression::Identifier(ident) => match self.lookup_local(ident.symbol) {
                Some(local) => BExpr::Local(local.slot),
                None => {
                    self.error(
                        "JS0103",
                        ident.span,
                        format!("The name '{}' does not exist in the current context", self.name(*ident)),
                    );
                    BExpr::Const(Value::Null)
                }
            },
            Expression::This(span) => {
                self.check_this(*span);
                BExpr::This
            }
            Expression::Unary(unary) => BExpr::Unary(unary.op, Box::new(self.bind_expr(&unary.operand))),
            Expression::Binary(binary) => BExpr::Binary(
                binary.op,
                Box::new(self.bind_expr(&binary.left)),
                Box::new(self.bind_expr(&binary.right)),
            ),
            Expression::Member(member) => {
                self.report_member_value(member);
                BExpr::Const(Value::Null)
            }
            Expression::Call(call) => self.bind_call(call),
        }
    }

    fn check_this(&mut self, span: Span) {
        if self.is_static {
            self.error(
                "JS0026",
                span,
                "Keyword 'this' is not valid in a static method".to_string(),
            );
        }
    }

    /// Member access outside a call: nothing in the language has fields.
    fn report_member_value(&mut self, member: &MemberExpr) {
        let base = match member.base.as_ref() {
            Expression::This(_) => Some("this".to_string()),
            other => other.as_path().map(|path| {
                path.iter()
                    .map(|s| self.name(*s))
                    .collect::<Vec<_>>()
                    .join(".")
            }),
        };

        match base {
            Some(base) => self.error(
                "JS0117",
                member.member.span,
                format!("'{}' does not contain a definition for '{}'", base, self.name(member.member)),
            ),
            None => self.error(
                "JS0117",
                member.member.span,
                format!("Expression does not contain a definition for '{}'", self.name(member.member)),
            ),
        }
    }

    fn bind_call(&mut self, call: &CallExpr) -> BExpr {
        let args: Vec<BExpr> = call.args.iter().map(|arg| self.bind_expr(arg)).collect();

        match call.callee.as_ref() {
            Expression::Identifier(ident) => {
                self.bind_user_call(self.type_idx, *ident, args, call.span, CallKind::Implicit)
            }
            Expression::Member(member) => match member.base.as_ref() {
                Expression::This(span) => {
                    self.check_this(*span);
                    self.bind_user_call(self.type_idx, member.member, args, call.span, CallKind::This)
                }
                base => match base.as_path() {
                    Some(path) => self.bind_path_call(&path, member.member, args, call.span),
                    None => {
                        self.error("JS0149", call.callee.span(), "Method name expected".to_string());
                        BExpr::Const(Value::Null)
                    }
                },
            },
            other => {
                self.error("JS0149", other.span(), "Method name expected".to_string());
                BExpr::Const(Value::Null)
            }
        }
    }

    /// `Type.Method(..)`, `Namespace.Type.Method(..)`, `Class.Method(..)` on
    /// an imported builtin class, or `Module.Class.Method(..)`.
    fn bind_path_call(&mut self, path: &[Ident], member: Ident, args: Vec<BExpr>, span: Span) -> BExpr {
        let names: Vec<&str> = path.iter().map(|s| self.name(*s)).collect();
        let joined = names.join(".");
        let path_span = path
            .iter()
            .fold(path[0].span, |acc, segment| acc.merge(segment.span));

        if path.len() == 1 && self.lookup_local(path[0].symbol).is_some() {
            self.error(
                "JS0117",
                member.span,
                format!("'{}' does not contain a definition for '{}'", names[0], self.name(member)),
            );
            return BExpr::Const(Value::Null);
        }

        let current_ns = &self.program.types[self.type_idx].namespace;
        let user_type = if names.len() == 1 {
            self.program
                .find_type(&format!("{}.{}", current_ns, joined))
                .or_else(|| self.program.find_type(&joined))
        } else {
            self.program.find_type(&joined)
        };
        if let Some(type_idx) = user_type {
            return self.bind_user_call(type_idx, member, args, span, CallKind::Type);
        }

        let imports = self.imports.iter().map(String::as_str);
        let (modules, class): (Vec<&str>, &str) = match names.as_slice() {
            [class] if builtins::has_class(imports.clone(), class) => (imports.collect(), *class),
            [module @ .., class] if !module.is_empty() => {
                let module = module.join(".");
                let module = builtins::MODULES.iter().copied().find(|m| *m == module);
                match module {
                    Some(module) if builtins::has_class([module], class) => (vec![module], *class),
                    _ => return self.unknown_path(&names, path, path_span),
                }
            }
            _ => return self.unknown_path(&names, path, path_span),
        };

        let method_name = self.name(member);
        match builtins::lookup(modules, class, method_name) {
            Some(builtin) if builtin.accepts(args.len()) => BExpr::Builtin(builtin, args),
            Some(builtin) => {
                self.error(
                    "JS1501",
                    span,
                    format!("No overload for method '{}' takes {} arguments", builtin.name, args.len()),
                );
                BExpr::Const(Value::Null)
            }
            None => {
                self.error(
                    "JS0117",
                    member.span,
                    format!("'{}' does not contain a definition for '{}'", class, method_name),
                );
                BExpr::Const(Value::Null)
            }
        }
    }

    fn unknown_path(&mut self, names: &[&str], path: &[Ident], path_span: Span) -> BExpr {
        if names.len() == 1 {
            self.error(
                "JS0103",
                path[0].span,
                format!("The name '{}' does not exist in the current context", names[0]),
            );
        } else {
            self.error(
                "JS0246",
                path_span,
                format!("The type or namespace name '{}' could not be found", names.join(".")),
            );
        }
        BExpr::Const(Value::Null)
    }

    fn bind_user_call(
        &mut self,
        type_idx: usize,
        name: Ident,
        args: Vec<BExpr>,
        span: Span,
        kind: CallKind,
    ) -> BExpr {
        let target = &self.program.types[type_idx];
        let method_name = self.name(name);

        let Some(method_idx) = target.find_method(method_name) else {
            match kind {
                CallKind::Implicit => self.error(
                    "JS0103",
                    name.span,
                    format!("The name '{}' does not exist in the current context", method_name),
                ),
                CallKind::This | CallKind::Type => self.error(
                    "JS0117",
                    name.span,
                    format!("'{}' does not contain a definition for '{}'", target.full_name, method_name),
                ),
            }
            return BExpr::Const(Value::Null);
        };
        let method = &target.methods[method_idx];

        if type_idx != self.type_idx && method.visibility != Visibility::Public && method.visibility != Visibility::Internal {
            self.error(
                "JS0122",
                name.span,
                format!("'{}' is inaccessible due to its protection level", method.qualified_name),
            );
        }

        if method.is_static && kind == CallKind::This {
            self.error(
                "JS0176",
                name.span,
                format!(
                    "Member '{}' cannot be accessed with an instance reference; qualify it with a type name instead",
                    method.qualified_name
                ),
            );
        }

        // `this.X()` already reported a static context
        let has_receiver = match kind {
            CallKind::This => true,
            CallKind::Implicit => !self.is_static,
            CallKind::Type => false,
        };
        if !method.is_static && !has_receiver {
            self.error(
                "JS0120",
                name.span,
                format!(
                    "An object reference is required for the non-static field, method, or property '{}'",
                    method.qualified_name
                ),
            );
        }

        if args.len() < method.required_params() || args.len() > method.params.len() {
            self.error(
                "JS1501",
                span,
                format!("No overload for method '{}' takes {} arguments", method.name, args.len()),
            );
        }

        BExpr::Call {
            type_idx,
            method_idx,
            args,
        }
    }
}
