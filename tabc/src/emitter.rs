//! C Emitter: formats a [`CProgram`] to C source text.
//!
//! Two modes share one pipeline. Both first run [`inline_registers`], a
//! structural (tree-rewriting, not text-replacement) substitution pass that
//! drops every scalar temporary and splices its defining expression into each
//! use site. The optimizing mode additionally runs [`Env::fold_block`]:
//! constant folding over already-inlined expressions, scope-aware copy
//! propagation of user variables, and dead-branch elimination.

use std::collections::{HashMap, HashSet};

use tabc_parser::ast::{BinOp, UnOp};

use crate::cast::{CExpr, CFunctionDef, CProgram, CStmt, CType, CValue};

/// Formats `program` to a complete C translation unit.
pub fn emit(program: &CProgram, optimize: bool) -> String {
    let mut functions = program.functions.clone();
    let mut main_body = program.main_body.clone();

    for f in &mut functions {
        f.body = inline_registers(std::mem::take(&mut f.body));
    }
    main_body = inline_registers(main_body);

    if optimize {
        for f in &mut functions {
            let mut env = Env::default();
            f.body = env.fold_block(std::mem::take(&mut f.body));
        }
        let mut env = Env::default();
        main_body = env.fold_block(main_body);
    }

    let declarations: Vec<String> = functions.iter().map(declare_line).collect();
    let definitions: Vec<String> = functions.iter().map(define_block).collect();
    let main_lines = format_block(&main_body, 1).join("\n");

    code_template(&declarations, &definitions, &main_lines)
}

// ---------------------------------------------------------------------
// Structural temp inlining
// ---------------------------------------------------------------------

/// Drops every `_`-prefixed scalar temporary's `DeclAssign` and substitutes
/// its value at each reference, transitively. List-typed temporaries are
/// left declared: a list is an address, not a value, and must keep identity
/// across the `LstAdd` calls that mutate it in place.
fn inline_registers(stmts: Vec<CStmt>) -> Vec<CStmt> {
    let mut defs = HashMap::new();
    collect_temp_defs(&stmts, &mut defs);
    strip_and_substitute(stmts, &defs)
}

fn collect_temp_defs(stmts: &[CStmt], defs: &mut HashMap<String, CExpr>) {
    for stmt in stmts {
        match stmt {
            CStmt::DeclAssign { name, ty, value } if name.starts_with('_') && *ty != CType::ListPtr => {
                defs.insert(name.clone(), value.clone());
            }
            CStmt::If {
                branches,
                else_body,
            } => {
                for (prelude, _, body) in branches {
                    collect_temp_defs(prelude, defs);
                    collect_temp_defs(body, defs);
                }
                if let Some(b) = else_body {
                    collect_temp_defs(b, defs);
                }
            }
            CStmt::While { prelude, body, .. } => {
                collect_temp_defs(prelude, defs);
                collect_temp_defs(body, defs);
            }
            CStmt::ForRange { body, .. } | CStmt::ForList { body, .. } => {
                collect_temp_defs(body, defs)
            }
            _ => {}
        }
    }
}

fn strip_and_substitute(stmts: Vec<CStmt>, defs: &HashMap<String, CExpr>) -> Vec<CStmt> {
    let mut out = Vec::with_capacity(stmts.len());
    for stmt in stmts {
        match stmt {
            CStmt::DeclAssign { name, ty, value } => {
                if name.starts_with('_') && ty != CType::ListPtr && defs.contains_key(&name) {
                    continue;
                }
                out.push(CStmt::DeclAssign {
                    name,
                    ty,
                    value: substitute_expr(value, defs),
                });
            }
            CStmt::Assign { name, value } => out.push(CStmt::Assign {
                name,
                value: substitute_expr(value, defs),
            }),
            CStmt::ExprStmt(e) => out.push(CStmt::ExprStmt(substitute_expr(e, defs))),
            CStmt::Return(e) => out.push(CStmt::Return(e.map(|e| substitute_expr(e, defs)))),
            CStmt::LstAdd {
                obj,
                value,
                elem_ty,
            } => out.push(CStmt::LstAdd {
                obj,
                value: substitute_expr(value, defs),
                elem_ty,
            }),
            CStmt::If {
                branches,
                else_body,
            } => out.push(CStmt::If {
                branches: branches
                    .into_iter()
                    .map(|(prelude, cond, body)| {
                        (
                            strip_and_substitute(prelude, defs),
                            substitute_expr(cond, defs),
                            strip_and_substitute(body, defs),
                        )
                    })
                    .collect(),
                else_body: else_body.map(|b| strip_and_substitute(b, defs)),
            }),
            CStmt::While {
                prelude,
                cond,
                body,
            } => out.push(CStmt::While {
                prelude: strip_and_substitute(prelude, defs),
                cond: substitute_expr(cond, defs),
                body: strip_and_substitute(body, defs),
            }),
            CStmt::ForRange {
                var,
                start,
                stop,
                step,
                body,
            } => out.push(CStmt::ForRange {
                var,
                start: substitute_expr(start, defs),
                stop: substitute_expr(stop, defs),
                step: substitute_expr(step, defs),
                body: strip_and_substitute(body, defs),
            }),
            CStmt::ForList {
                var,
                elem_ty,
                index_var,
                length,
                list,
                body,
            } => out.push(CStmt::ForList {
                var,
                elem_ty,
                index_var,
                length: substitute_expr(length, defs),
                list: substitute_expr(list, defs),
                body: strip_and_substitute(body, defs),
            }),
            CStmt::Decl { .. } => out.push(stmt),
        }
    }
    out
}

fn substitute_expr(expr: CExpr, defs: &HashMap<String, CExpr>) -> CExpr {
    match expr {
        CExpr::Id(name) => match defs.get(&name) {
            Some(val) => substitute_expr(val.clone(), defs),
            None => CExpr::Id(name),
        },
        CExpr::Literal(_) => expr,
        CExpr::Binary(op, l, r, ty) => CExpr::Binary(
            op,
            Box::new(substitute_expr(*l, defs)),
            Box::new(substitute_expr(*r, defs)),
            ty,
        ),
        CExpr::Unary(op, e, ty) => CExpr::Unary(op, Box::new(substitute_expr(*e, defs)), ty),
        CExpr::Call(name, args) => CExpr::Call(
            name,
            args.into_iter().map(|a| substitute_expr(a, defs)).collect(),
        ),
        CExpr::ListLiteral { elements, elem_ty } => CExpr::ListLiteral {
            elements: elements
                .into_iter()
                .map(|e| substitute_expr(e, defs))
                .collect(),
            elem_ty,
        },
        CExpr::Index { obj, idx, elem_ty } => CExpr::Index {
            obj: Box::new(substitute_expr(*obj, defs)),
            idx: Box::new(substitute_expr(*idx, defs)),
            elem_ty,
        },
        CExpr::Slice { obj, start, end } => CExpr::Slice {
            obj: Box::new(substitute_expr(*obj, defs)),
            start: Box::new(substitute_expr(*start, defs)),
            end: Box::new(substitute_expr(*end, defs)),
        },
    }
}

// ---------------------------------------------------------------------
// Optimizing pass: constant folding, copy propagation, dead-branch
// elimination
// ---------------------------------------------------------------------

/// Tracks the best-known constant value of every user variable (and any
/// surviving temporary) currently in scope. Entries are removed the moment a
/// variable's value becomes unknowable -- on reassignment to something
/// non-constant, and pessimistically on entry to any branch/loop body that
/// assigns it anywhere at all, since whether that body runs, and how many
/// times, is not known to this pass.
#[derive(Default)]
struct Env {
    values: HashMap<String, CValue>,
}

impl Env {
    fn fold_block(&mut self, stmts: Vec<CStmt>) -> Vec<CStmt> {
        let mut out = Vec::new();
        for stmt in stmts {
            self.fold_stmt(stmt, &mut out);
        }
        out
    }

    fn fold_stmt(&mut self, stmt: CStmt, out: &mut Vec<CStmt>) {
        match stmt {
            CStmt::DeclAssign { name, ty, value } => {
                let value = self.fold_expr(value);
                match value.as_literal() {
                    Some(v) => {
                        self.values.insert(name.clone(), v.clone());
                    }
                    None => {
                        self.values.remove(&name);
                    }
                }
                out.push(CStmt::DeclAssign { name, ty, value });
            }
            CStmt::Assign { name, value } => {
                let value = self.fold_expr(value);
                match value.as_literal() {
                    Some(v) => {
                        self.values.insert(name.clone(), v.clone());
                    }
                    None => {
                        self.values.remove(&name);
                    }
                }
                out.push(CStmt::Assign { name, value });
            }
            CStmt::ExprStmt(e) => out.push(CStmt::ExprStmt(self.fold_expr(e))),
            CStmt::Return(e) => out.push(CStmt::Return(e.map(|e| self.fold_expr(e)))),
            CStmt::LstAdd {
                obj,
                value,
                elem_ty,
            } => out.push(CStmt::LstAdd {
                obj,
                value: self.fold_expr(value),
                elem_ty,
            }),
            CStmt::If {
                branches,
                else_body,
            } => self.fold_if(branches, else_body, out),
            CStmt::While {
                prelude,
                cond,
                body,
            } => self.fold_while(prelude, cond, body, out),
            CStmt::ForRange {
                var,
                start,
                stop,
                step,
                body,
            } => {
                let start = self.fold_expr(start);
                let stop = self.fold_expr(stop);
                let step = self.fold_expr(step);
                self.clear_body_variants(&body, &[var.as_str()]);
                let body = self.fold_block(body);
                out.push(CStmt::ForRange {
                    var,
                    start,
                    stop,
                    step,
                    body,
                });
            }
            CStmt::ForList {
                var,
                elem_ty,
                index_var,
                length,
                list,
                body,
            } => {
                let length = self.fold_expr(length);
                let list = self.fold_expr(list);
                self.clear_body_variants(&body, &[var.as_str(), index_var.as_str()]);
                let body = self.fold_block(body);
                out.push(CStmt::ForList {
                    var,
                    elem_ty,
                    index_var,
                    length,
                    list,
                    body,
                });
            }
            CStmt::Decl { .. } => out.push(stmt),
        }
    }

    /// Collapses a chain when a branch's condition is a known constant: a
    /// statically-false branch is dropped outright; a statically-true branch
    /// reached with nothing kept before it (and no prelude of its own)
    /// replaces the whole chain; a statically-true branch reached after some
    /// kept branch becomes that chain's `else`, since nothing after it can
    /// ever run.
    fn fold_if(
        &mut self,
        branches: Vec<(Vec<CStmt>, CExpr, Vec<CStmt>)>,
        else_body: Option<Vec<CStmt>>,
        out: &mut Vec<CStmt>,
    ) {
        let mut kept = Vec::new();
        let mut forced_else = None;

        for (prelude, cond, body) in branches {
            let prelude = self.fold_block(prelude);
            let cond = self.fold_expr(cond);
            match cond.as_literal() {
                Some(CValue::Bool(false)) => continue,
                Some(CValue::Bool(true)) => {
                    self.clear_variants(&body);
                    let body = self.fold_block(body);
                    if kept.is_empty() && prelude.is_empty() {
                        out.extend(body);
                        return;
                    }
                    forced_else = Some(body);
                    break;
                }
                _ => {
                    self.clear_variants(&body);
                    let body = self.fold_block(body);
                    kept.push((prelude, cond, body));
                }
            }
        }

        let else_body = if forced_else.is_some() {
            forced_else
        } else {
            else_body.map(|b| {
                self.clear_variants(&b);
                self.fold_block(b)
            })
        };

        if kept.is_empty() {
            if let Some(b) = else_body {
                out.extend(b);
            }
            return;
        }
        out.push(CStmt::If {
            branches: kept,
            else_body,
        });
    }

    fn fold_while(&mut self, prelude: Vec<CStmt>, cond: CExpr, body: Vec<CStmt>, out: &mut Vec<CStmt>) {
        self.clear_variants(&prelude);
        self.clear_variants(&body);
        let prelude = self.fold_block(prelude);
        let cond = self.fold_expr(cond);
        if prelude.is_empty() && matches!(cond.as_literal(), Some(CValue::Bool(false))) {
            return;
        }
        let body = self.fold_block(body);
        out.push(CStmt::While {
            prelude,
            cond,
            body,
        });
    }

    /// Invalidates every name this body (transitively, through its own
    /// nested branches/loops) assigns, since the body may run zero, one, or
    /// many times.
    fn clear_variants(&mut self, body: &[CStmt]) {
        let mut names = HashSet::new();
        assigned_names(body, &mut names);
        for n in names {
            self.values.remove(&n);
        }
    }

    fn clear_body_variants(&mut self, body: &[CStmt], extra: &[&str]) {
        self.clear_variants(body);
        for n in extra {
            self.values.remove(*n);
        }
    }

    fn fold_expr(&self, expr: CExpr) -> CExpr {
        match expr {
            CExpr::Id(name) => match self.values.get(&name) {
                Some(v) => CExpr::Literal(v.clone()),
                None => CExpr::Id(name),
            },
            CExpr::Literal(_) => expr,
            CExpr::Binary(op, l, r, ty) => {
                let l = self.fold_expr(*l);
                let r = self.fold_expr(*r);
                if let (Some(lv), Some(rv)) = (l.as_literal(), r.as_literal()) {
                    if let Some(folded) = eval_binop(op, lv, rv, ty) {
                        return CExpr::Literal(folded);
                    }
                }
                CExpr::Binary(op, Box::new(l), Box::new(r), ty)
            }
            CExpr::Unary(op, e, ty) => {
                let e = self.fold_expr(*e);
                if let Some(v) = e.as_literal() {
                    if let Some(folded) = eval_unop(op, v, ty) {
                        return CExpr::Literal(folded);
                    }
                }
                CExpr::Unary(op, Box::new(e), ty)
            }
            CExpr::Call(name, args) => {
                CExpr::Call(name, args.into_iter().map(|a| self.fold_expr(a)).collect())
            }
            CExpr::ListLiteral { elements, elem_ty } => CExpr::ListLiteral {
                elements: elements.into_iter().map(|e| self.fold_expr(e)).collect(),
                elem_ty,
            },
            CExpr::Index { obj, idx, elem_ty } => CExpr::Index {
                obj: Box::new(self.fold_expr(*obj)),
                idx: Box::new(self.fold_expr(*idx)),
                elem_ty,
            },
            CExpr::Slice { obj, start, end } => CExpr::Slice {
                obj: Box::new(self.fold_expr(*obj)),
                start: Box::new(self.fold_expr(*start)),
                end: Box::new(self.fold_expr(*end)),
            },
        }
    }
}

fn assigned_names(stmts: &[CStmt], names: &mut HashSet<String>) {
    for stmt in stmts {
        match stmt {
            CStmt::Assign { name, .. } | CStmt::DeclAssign { name, .. } => {
                names.insert(name.clone());
            }
            CStmt::If {
                branches,
                else_body,
            } => {
                for (prelude, _, body) in branches {
                    assigned_names(prelude, names);
                    assigned_names(body, names);
                }
                if let Some(b) = else_body {
                    assigned_names(b, names);
                }
            }
            CStmt::While { prelude, body, .. } => {
                assigned_names(prelude, names);
                assigned_names(body, names);
            }
            CStmt::ForRange { var, body, .. } => {
                names.insert(var.clone());
                assigned_names(body, names);
            }
            CStmt::ForList {
                var, index_var, body, ..
            } => {
                names.insert(var.clone());
                names.insert(index_var.clone());
                assigned_names(body, names);
            }
            _ => {}
        }
    }
}

/// Mirrors the promotions `CastBuilder::infer_binop_type` already applied:
/// an `int_t`-typed result truncates a float computation toward zero, the
/// way the source language's own int/float arithmetic does.
fn eval_binop(op: BinOp, l: &CValue, r: &CValue, result_ty: CType) -> Option<CValue> {
    if result_ty == CType::Str {
        if let (CValue::Str(a), CValue::Str(b)) = (l, r) {
            return Some(CValue::Str(format!("{a}{b}")));
        }
        return None;
    }
    let (lf, rf) = (as_f64(l)?, as_f64(r)?);
    let value = match op {
        BinOp::Add => lf + rf,
        BinOp::Sub => lf - rf,
        BinOp::Mul => lf * rf,
        BinOp::Div => {
            if rf == 0.0 {
                return None;
            }
            lf / rf
        }
        BinOp::Mod => {
            if rf == 0.0 {
                return None;
            }
            // Plain `%`, not `rem_euclid`: C's `%` truncates toward zero (sign
            // follows the dividend), and Rust's float `%` already matches
            // that, so folding and the unfolded `%` emitted at emitter.rs's
            // `format_binop` agree on negative operands.
            lf % rf
        }
        BinOp::Eq => return Some(CValue::Bool(lf == rf)),
        BinOp::NotEq => return Some(CValue::Bool(lf != rf)),
        BinOp::Lt => return Some(CValue::Bool(lf < rf)),
        BinOp::LtEq => return Some(CValue::Bool(lf <= rf)),
        BinOp::Gt => return Some(CValue::Bool(lf > rf)),
        BinOp::GtEq => return Some(CValue::Bool(lf >= rf)),
        BinOp::And => return Some(CValue::Bool(as_bool(l)? && as_bool(r)?)),
        BinOp::Or => return Some(CValue::Bool(as_bool(l)? || as_bool(r)?)),
        BinOp::Xor => return Some(CValue::Bool(as_bool(l)? ^ as_bool(r)?)),
    };
    Some(match result_ty {
        CType::Int => CValue::Int(value as i64),
        CType::Float => CValue::Float(value),
        _ => return None,
    })
}

fn eval_unop(op: UnOp, v: &CValue, result_ty: CType) -> Option<CValue> {
    match op {
        UnOp::Not => Some(CValue::Bool(!as_bool(v)?)),
        UnOp::Neg => match result_ty {
            CType::Int => Some(CValue::Int(-as_f64(v)? as i64)),
            CType::Float => Some(CValue::Float(-as_f64(v)?)),
            _ => None,
        },
    }
}

fn as_f64(v: &CValue) -> Option<f64> {
    match v {
        CValue::Int(n) => Some(*n as f64),
        CValue::Float(f) => Some(*f),
        CValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        CValue::Str(_) | CValue::None => None,
    }
}

fn as_bool(v: &CValue) -> Option<bool> {
    match v {
        CValue::Bool(b) => Some(*b),
        _ => None,
    }
}

// ---------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------

fn indent_str(level: usize) -> String {
    "    ".repeat(level)
}

fn format_block(stmts: &[CStmt], indent: usize) -> Vec<String> {
    let pad = indent_str(indent);
    let mut out = Vec::new();
    for stmt in stmts {
        format_stmt(stmt, indent, &pad, &mut out);
    }
    out
}

fn format_stmt(stmt: &CStmt, indent: usize, pad: &str, out: &mut Vec<String>) {
    match stmt {
        CStmt::Decl { name, ty } => out.push(format!("{pad}{ty} {name};")),
        CStmt::Assign { name, value } => out.push(format!("{pad}{name} = {};", format_expr(value))),
        CStmt::DeclAssign { name, ty, value } => match value {
            CExpr::ListLiteral { elements, elem_ty } => {
                out.push(format!("{pad}{ty} {name} = list_init({});", elements.len()));
                for e in elements {
                    out.push(format!(
                        "{pad}list_init_add({}, {name}, {});",
                        elem_ty.discriminator(),
                        format_expr(e)
                    ));
                }
            }
            _ => out.push(format!("{pad}{ty} {name} = {};", format_expr(value))),
        },
        CStmt::ExprStmt(e) => out.push(format!("{pad}{};", format_expr(e))),
        CStmt::Return(None) => out.push(format!("{pad}return;")),
        CStmt::Return(Some(e)) => out.push(format!("{pad}return {};", format_expr(e))),
        CStmt::LstAdd {
            obj,
            value,
            elem_ty,
        } => out.push(format!(
            "{pad}list_add({}, {obj}, {});",
            elem_ty.discriminator(),
            format_expr(value)
        )),
        CStmt::If {
            branches,
            else_body,
        } => {
            let mut first = true;
            for (prelude, cond, body) in branches {
                if !prelude.is_empty() {
                    out.extend(format_block(prelude, indent));
                }
                let keyword = if first { "if" } else { "else if" };
                first = false;
                out.push(format!("{pad}{keyword} ({}) {{", format_expr(cond)));
                out.extend(format_block(body, indent + 1));
                out.push(format!("{pad}}}"));
            }
            if let Some(body) = else_body {
                out.push(format!("{pad}else {{"));
                out.extend(format_block(body, indent + 1));
                out.push(format!("{pad}}}"));
            }
        }
        CStmt::While {
            prelude,
            cond,
            body,
        } => {
            if prelude.is_empty() {
                out.push(format!("{pad}while ({}) {{", format_expr(cond)));
                out.extend(format_block(body, indent + 1));
                out.push(format!("{pad}}}"));
            } else {
                // The condition needs re-evaluating every iteration, so the
                // loop is unconditional and breaks out of its own body.
                out.push(format!("{pad}while (1) {{"));
                out.extend(format_block(prelude, indent + 1));
                let inner_pad = indent_str(indent + 1);
                out.push(format!("{inner_pad}if (!({})) break;", format_expr(cond)));
                out.extend(format_block(body, indent + 1));
                out.push(format!("{pad}}}"));
            }
        }
        CStmt::ForRange {
            var,
            start,
            stop,
            step,
            body,
        } => {
            out.push(format!(
                "{pad}for (int_t {var} = {}; {var} < {}; {var} += {}) {{",
                format_expr(start),
                format_expr(stop),
                format_expr(step)
            ));
            out.extend(format_block(body, indent + 1));
            out.push(format!("{pad}}}"));
        }
        CStmt::ForList {
            var,
            elem_ty,
            index_var,
            length,
            list,
            body,
        } => {
            out.push(format!(
                "{pad}for (int_t {index_var} = 0; {index_var} < {}; {index_var} += 1) {{",
                format_expr(length)
            ));
            let inner_pad = indent_str(indent + 1);
            out.push(format!(
                "{inner_pad}{elem_ty} {var} = list_get({}, {}, {index_var});",
                elem_ty.discriminator(),
                format_expr(list)
            ));
            out.extend(format_block(body, indent + 1));
            out.push(format!("{pad}}}"));
        }
    }
}

fn format_binop(op: BinOp) -> &'static str {
    match op {
        BinOp::Add => "+",
        BinOp::Sub => "-",
        BinOp::Mul => "*",
        BinOp::Div => "/",
        BinOp::Mod => "%",
        BinOp::Eq => "==",
        BinOp::NotEq => "!=",
        BinOp::Lt => "<",
        BinOp::LtEq => "<=",
        BinOp::Gt => ">",
        BinOp::GtEq => ">=",
        BinOp::And => "&&",
        BinOp::Or => "||",
        BinOp::Xor => "^",
    }
}

fn format_expr(expr: &CExpr) -> String {
    match expr {
        CExpr::Literal(v) => v.to_string(),
        CExpr::Id(name) => name.clone(),
        CExpr::Binary(BinOp::Add, l, r, CType::Str) => {
            format!("str_concat({}, {})", format_expr(l), format_expr(r))
        }
        CExpr::Binary(op, l, r, _) => {
            format!("({} {} {})", format_expr(l), format_binop(*op), format_expr(r))
        }
        CExpr::Unary(UnOp::Not, e, _) => format!("(!{})", format_expr(e)),
        CExpr::Unary(UnOp::Neg, e, _) => format!("(-{})", format_expr(e)),
        CExpr::Call(name, args) => format!(
            "{name}({})",
            args.iter().map(format_expr).collect::<Vec<_>>().join(", ")
        ),
        CExpr::ListLiteral { .. } => {
            unreachable!("list literals are only ever the value of a DeclAssign, and format_stmt handles that case directly")
        }
        CExpr::Index { obj, idx, elem_ty } => format!(
            "list_get({}, {}, {})",
            elem_ty.discriminator(),
            format_expr(obj),
            format_expr(idx)
        ),
        CExpr::Slice { obj, start, end } => {
            format!(
                "list_slice({}, {}, {})",
                format_expr(obj),
                format_expr(start),
                format_expr(end)
            )
        }
    }
}

fn declare_line(f: &CFunctionDef) -> String {
    let params = f
        .params
        .iter()
        .map(|(name, ty)| format!("{ty} {name}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} {}({params})", f.return_type, f.mangled_name)
}

fn define_block(f: &CFunctionDef) -> String {
    let mut lines = vec![format!("{} {{", declare_line(f))];
    lines.extend(format_block(&f.body, 1));
    lines.push(format!("}} /* End of {} */", f.mangled_name));
    lines.join("\n")
}

fn code_template(declarations: &[String], definitions: &[String], main_code: &str) -> String {
    let function_code = if declarations.is_empty() {
        String::new()
    } else {
        format!(
            "/***** Function declarations *****/\n{};\n/***** End of function declarations *****/\n\n/***** Function definitions *****/\n{}\n/***** End of function definitions *****/\n\n",
            declarations.join(";\n"),
            definitions.join("\n\n")
        )
    };

    format!(
        "#include \"../starter.c\"\n\n{function_code}int main() {{\n/***** Main *****/\n{main_code}\n/***** End of main *****/\n\n    str_clean_up();\n    list_clean_up();\n\n    return 0;\n}}\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cast::CType;

    fn lit_int(v: i64) -> CExpr {
        CExpr::Literal(CValue::Int(v))
    }

    #[test]
    fn inlines_a_chain_of_scalar_temps_into_a_user_assignment() {
        let program = CProgram {
            functions: Vec::new(),
            main_body: vec![
                CStmt::DeclAssign {
                    name: "_t0_".into(),
                    ty: CType::Int,
                    value: lit_int(1),
                },
                CStmt::DeclAssign {
                    name: "_t1_".into(),
                    ty: CType::Int,
                    value: lit_int(2),
                },
                CStmt::DeclAssign {
                    name: "_t2_".into(),
                    ty: CType::Int,
                    value: CExpr::Binary(
                        BinOp::Add,
                        Box::new(CExpr::id("_t0_")),
                        Box::new(CExpr::id("_t1_")),
                        CType::Int,
                    ),
                },
                CStmt::DeclAssign {
                    name: "x".into(),
                    ty: CType::Int,
                    value: CExpr::id("_t2_"),
                },
                CStmt::ExprStmt(CExpr::Call("print_int".into(), vec![CExpr::id("x")])),
            ],
        };

        let non_opt = emit(&program, false);
        assert!(non_opt.contains("int_t x = (1 + 2);"));
        assert!(!non_opt.contains("_t0_"));
        assert!(non_opt.contains("print_int(x);"));

        let opt = emit(&program, true);
        assert!(opt.contains("print_int(3)"));
    }

    #[test]
    fn dead_branch_elimination_keeps_only_the_live_arm() {
        let program = CProgram {
            functions: Vec::new(),
            main_body: vec![CStmt::If {
                branches: vec![(
                    Vec::new(),
                    CExpr::Literal(CValue::Bool(false)),
                    vec![CStmt::ExprStmt(CExpr::Call(
                        "print_int".into(),
                        vec![lit_int(1)],
                    ))],
                )],
                else_body: Some(vec![CStmt::ExprStmt(CExpr::Call(
                    "print_int".into(),
                    vec![lit_int(2)],
                ))]),
            }],
        };

        let opt = emit(&program, true);
        assert!(!opt.contains("if ("));
        assert!(opt.contains("print_int(2)"));
    }

    #[test]
    fn loop_bound_variable_is_not_propagated_across_iterations() {
        let program = CProgram {
            functions: Vec::new(),
            main_body: vec![
                CStmt::DeclAssign {
                    name: "s".into(),
                    ty: CType::Int,
                    value: lit_int(0),
                },
                CStmt::ForRange {
                    var: "i".into(),
                    start: lit_int(1),
                    stop: lit_int(4),
                    step: lit_int(1),
                    body: vec![CStmt::Assign {
                        name: "s".into(),
                        value: CExpr::Binary(
                            BinOp::Add,
                            Box::new(CExpr::id("s")),
                            Box::new(CExpr::id("i")),
                            CType::Int,
                        ),
                    }],
                },
                CStmt::ExprStmt(CExpr::Call("print_int".into(), vec![CExpr::id("s")])),
            ],
        };

        let opt = emit(&program, true);
        // `s` is reassigned inside the loop body, so the optimizer must not
        // fold the final print to a constant -- it genuinely depends on how
        // many iterations ran.
        assert!(opt.contains("print_int(s)"));
    }

    #[test]
    fn envelope_has_no_function_banners_when_there_are_no_functions() {
        let program = CProgram {
            functions: Vec::new(),
            main_body: vec![CStmt::ExprStmt(CExpr::Call("print_int".into(), vec![lit_int(1)]))],
        };
        let text = emit(&program, false);
        assert!(!text.contains("Function declarations"));
        assert!(text.starts_with("#include \"../starter.c\""));
        assert!(text.contains("str_clean_up();"));
        assert!(text.contains("list_clean_up();"));
    }
}
