//! x86-64 code generator.
//!
//! Lowers the checked, normalized program tree to a NASM-style listing:
//! a `_start` entry, one label per free function, per class a generated
//! constructor, vtable and defined methods, and a trailing table of
//! unique string literals. Values are one machine word each; arguments
//! travel on the stack in source order and results come back in `rax`.

mod expr;
mod frame;
mod stmt;

use std::collections::HashMap;

use latc_parser::{Param, Program, Type};
use thiserror::Error;

use crate::builtins::{BUILTIN_EMIT_ORDER, SELF_NAME};
use crate::typeinfo::TypeInfo;

use frame::Frame;

/// Only checker bugs can surface here; user errors never reach codegen.
#[derive(Error, Debug)]
#[error("code generator invariant violated: {0}")]
pub struct EmitError(pub String);

pub(crate) type EmitResult = Result<(), EmitError>;

pub(crate) fn internal(msg: impl Into<String>) -> EmitError {
    EmitError(msg.into())
}

pub(crate) fn constructor_label(class: &str) -> String {
    format!("_class_${}", class)
}

pub(crate) fn vtable_label(class: &str) -> String {
    format!("_class_@{}", class)
}

pub(crate) fn method_label(class: &str, method: &str) -> String {
    format!("_class_{}${}", class, method)
}

pub(crate) fn string_label(id: usize) -> String {
    format!("_string_{}", id)
}

/// Word-sized default for a type: zero for ints, booleans and object
/// references, the immortal empties for strings and arrays.
pub(crate) fn default_value(ty: &Type) -> &'static str {
    match ty {
        Type::Array(_) => "_empty_arr",
        Type::Str => "_empty_str",
        _ => "0",
    }
}

pub(crate) struct CodeGen<'a> {
    pub(crate) info: &'a TypeInfo,
    out: String,
    /// One counter serves control-flow labels and string ids.
    label: usize,
    string_ids: HashMap<String, usize>,
    strings: Vec<(usize, String)>,
}

/// Emit the complete listing for a checked program.
pub fn generate(info: &TypeInfo, program: &Program) -> Result<String, EmitError> {
    let mut gen = CodeGen {
        info,
        out: String::new(),
        label: 0,
        string_ids: HashMap::new(),
        strings: Vec::new(),
    };
    gen.emit_header();

    for (idx, fun) in program.functions.iter().enumerate() {
        let Some(fi) = info.functions.get(&fun.name) else {
            continue;
        };
        if fi.fn_idx != idx {
            continue;
        }
        gen.line(format!("{}:", fun.name));
        gen.emit_function_body(fi.params.clone(), &fun.body)?;
    }

    for (class_idx, class) in program.classes.iter().enumerate() {
        let Some(ci) = info.classes.get(&class.name) else {
            continue;
        };
        if ci.class_idx != class_idx {
            continue;
        }
        gen.emit_constructor(&class.name);
        gen.emit_vtable(&class.name);
        for slot in 0..ci.methods.len() {
            let method = &ci.methods[slot];
            if method.owner != class.name {
                continue;
            }
            let fun = &program.classes[method.class_idx].methods[method.method_idx];
            gen.line(format!("{}:", method_label(&class.name, &method.name)));
            // `self` resolves as a trailing implicit parameter.
            let mut params = method.params.clone();
            params.push(Param {
                ty: Type::Class(class.name.clone()),
                name: SELF_NAME.to_string(),
            });
            gen.emit_function_body(params, &fun.body)?;
        }
    }

    gen.emit_string_table();
    Ok(gen.out)
}

impl CodeGen<'_> {
    pub(crate) fn line(&mut self, text: impl AsRef<str>) {
        self.out.push_str(text.as_ref());
        self.out.push('\n');
    }

    pub(crate) fn next_label(&mut self) -> usize {
        let label = self.label;
        self.label += 1;
        label
    }

    /// Intern a string literal, allocating a label id on first sight.
    pub(crate) fn intern_string(&mut self, value: &str) -> usize {
        if let Some(&id) = self.string_ids.get(value) {
            return id;
        }
        let id = self.next_label();
        self.string_ids.insert(value.to_string(), id);
        self.strings.push((id, value.to_string()));
        id
    }

    fn emit_header(&mut self) {
        self.line("section .text");
        self.line("extern _alloc");
        self.line("extern _new_array");
        self.line("extern _empty_arr");
        self.line("extern _empty_str");
        self.line("extern _concat");
        for builtin in BUILTIN_EMIT_ORDER {
            self.line(format!("extern {}", builtin));
        }
        self.line("global _start");
        self.line("_start:");
        self.line("call main");
        self.line("mov rdi, rax");
        self.line("mov rax, 60");
        self.line("syscall");
    }

    fn emit_function_body(
        &mut self,
        params: Vec<Param>,
        body: &[latc_parser::Stmt],
    ) -> EmitResult {
        let mut frame = Frame::new(params);
        self.emit_block(&mut frame, body)
    }

    pub(crate) fn emit_block(
        &mut self,
        frame: &mut Frame,
        stmts: &[latc_parser::Stmt],
    ) -> EmitResult {
        frame.push_block();
        for stmt in stmts {
            self.emit_stmt(frame, stmt)?;
        }
        let popped = frame.pop_block();
        if popped > 0 {
            self.line(format!("add rsp, {}", popped * 8));
        }
        Ok(())
    }

    /// The constructor allocates the object and fills the vtable slot
    /// and field defaults.
    fn emit_constructor(&mut self, class_name: &str) {
        let info = self.info;
        let ci = &info.classes[class_name];
        self.line(format!("{}:", constructor_label(class_name)));
        self.line(format!("push qword {}", (ci.fields.len() + 1) * 8));
        self.line("call _alloc");
        self.line("add rsp, 8");
        self.line(format!("mov qword [rax], {}", vtable_label(class_name)));
        for (id, (ty, _)) in ci.fields.iter().enumerate() {
            self.line(format!(
                "mov qword [rax+{}], {}",
                (id + 1) * 8,
                default_value(ty)
            ));
        }
        self.line("ret");
    }

    /// Each slot names the class that actually defines the
    /// implementation, so overrides replace the entry in place.
    fn emit_vtable(&mut self, class_name: &str) {
        let info = self.info;
        let ci = &info.classes[class_name];
        self.line(format!("{}:", vtable_label(class_name)));
        for method in &ci.methods {
            self.line(format!("dq {}", method_label(&method.owner, &method.name)));
        }
    }

    fn emit_string_table(&mut self) {
        let strings = std::mem::take(&mut self.strings);
        for (id, value) in strings {
            self.line(format!("{} dq {}", string_label(id), value.len()));
            if value.is_empty() {
                continue;
            }
            let bytes = value
                .as_bytes()
                .iter()
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join(",");
            self.line(format!("db {}", bytes));
        }
    }
}
