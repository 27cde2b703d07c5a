//! C code generation from the optimized TAC IR.
//!
//! Produces a single self-contained C11 translation unit that links against
//! the small NatureLang runtime (`naturelang_runtime.h`). Each instruction
//! maps to one or a few C statements; temporaries are declared up front
//! with types synthesized by a two-pass scan (see [`types`]).

mod types;

use std::collections::HashMap;

use naturec_syntax::DataType;
use naturec_tac::{Opcode, Operand, TacFunction, TacProgram};

use types::TypeTables;

/// Runtime symbol emitted for the for-each length call.
const LIST_LENGTH_FUNC: &str = "__list_length";

/// Knobs for the emitted C.
#[derive(Debug, Clone)]
pub struct CodegenOptions {
    /// Emit `/* ... */` markers for params and secure zones.
    pub emit_comments: bool,
    pub indent_size: usize,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            emit_comments: false,
            indent_size: 4,
        }
    }
}

/// Generate the complete C translation unit for `program`.
pub fn generate(program: &TacProgram, options: &CodegenOptions) -> String {
    let mut gen = CGenerator::new(options);
    gen.scan(program);
    gen.emit_headers();
    gen.emit_forward_decls(program);
    for func in &program.functions {
        gen.emit_function(func);
    }
    gen.emit_main(&program.main);
    gen.out
}

struct CGenerator {
    out: String,
    indent: usize,
    indent_size: usize,
    emit_comments: bool,
    needs_input_buffer: bool,
    needs_math: bool,
    func_returns: HashMap<String, DataType>,
}

impl CGenerator {
    fn new(options: &CodegenOptions) -> Self {
        Self {
            out: String::new(),
            indent: 0,
            indent_size: options.indent_size,
            emit_comments: options.emit_comments,
            needs_input_buffer: false,
            needs_math: false,
            func_returns: HashMap::new(),
        }
    }

    /// Pre-pass: record which headers the program needs and every user
    /// function's return type (for void-call detection).
    fn scan(&mut self, program: &TacProgram) {
        for func in std::iter::once(&program.main).chain(program.functions.iter()) {
            for instr in func.instrs.iter().filter(|i| !i.is_dead) {
                match instr.op {
                    Opcode::Ask | Opcode::Read => self.needs_input_buffer = true,
                    Opcode::Pow => self.needs_math = true,
                    _ => {}
                }
            }
        }
        for func in &program.functions {
            if let Some(name) = &func.name {
                self.func_returns.insert(name.clone(), func.return_type);
            }
        }
    }

    fn push(&mut self, s: &str) {
        self.out.push_str(s);
    }

    fn push_indent(&mut self) {
        for _ in 0..self.indent * self.indent_size {
            self.out.push(' ');
        }
    }

    fn line(&mut self, s: &str) {
        self.push_indent();
        self.out.push_str(s);
        self.out.push('\n');
    }

    fn emit_headers(&mut self) {
        self.line("/*");
        self.line(" * Generated by the NatureLang compiler.");
        self.line(" * Do not edit this file directly.");
        self.line(" */");
        self.push("\n");
        self.line("#define _POSIX_C_SOURCE 200809L");
        self.line("#include <stdio.h>");
        self.line("#include <stdlib.h>");
        self.line("#include <string.h>");
        self.line("#include <stdbool.h>");
        if self.needs_math {
            self.line("#include <math.h>");
        }
        self.line("#include \"naturelang_runtime.h\"");
        self.push("\n");
        if self.needs_input_buffer {
            self.line("static char _nl_input_buffer[4096];");
            self.push("\n");
        }
    }

    fn signature(&self, func: &TacFunction) -> String {
        let name = func.name.as_deref().unwrap_or("main");
        let mut sig = format!("{} {}(", type_to_c(func.return_type), sanitize(name));
        if func.params.is_empty() {
            sig.push_str("void");
        } else {
            for (i, (pname, pty)) in func.params.iter().enumerate() {
                if i > 0 {
                    sig.push_str(", ");
                }
                sig.push_str(type_to_c(*pty));
                sig.push(' ');
                sig.push_str(&sanitize(pname));
            }
        }
        sig.push(')');
        sig
    }

    fn emit_forward_decls(&mut self, program: &TacProgram) {
        if program.functions.is_empty() {
            return;
        }
        self.line("/* Forward declarations */");
        for func in &program.functions {
            let sig = self.signature(func);
            self.line(&format!("{};", sig));
        }
        self.push("\n");
    }

    /// Declare every temp appearing in the function, typed by synthesis.
    fn emit_temp_declarations(&mut self, func: &TacFunction, tables: &TypeTables) {
        let mut seen: Vec<(u32, DataType)> = Vec::new();
        for instr in func.instrs.iter().filter(|i| !i.is_dead) {
            let slots = [&instr.result, &instr.arg1, &instr.arg2, &instr.arg3];
            for op in slots {
                if let Operand::Temp { id, ty } = op {
                    if !seen.iter().any(|(s, _)| s == id) {
                        let resolved = tables.temp_type(*id).unwrap_or(*ty);
                        seen.push((*id, resolved));
                    }
                }
            }
        }
        if seen.is_empty() {
            return;
        }
        if self.emit_comments {
            self.line("/* temporaries */");
        }
        for (id, ty) in seen {
            if ty == DataType::Text {
                self.line(&format!("char* _t{} = NULL;", id));
            } else {
                self.line(&format!("{} _t{} = 0;", type_to_c(ty), id));
            }
        }
        self.push("\n");
    }

    fn emit_function(&mut self, func: &TacFunction) {
        let tables = TypeTables::infer(func);
        let sig = self.signature(func);
        self.push(&sig);
        self.push(" {\n");
        self.indent += 1;
        self.emit_temp_declarations(func, &tables);
        for idx in 0..func.instrs.len() {
            if matches!(func.instrs[idx].op, Opcode::FuncBegin | Opcode::FuncEnd) {
                continue;
            }
            self.emit_instruction(func, idx, &tables);
        }
        self.indent -= 1;
        self.push("}\n\n");
    }

    fn emit_main(&mut self, main: &TacFunction) {
        let tables = TypeTables::infer(main);
        self.line("int main(int argc, char *argv[]) {");
        self.indent += 1;
        self.line("(void)argc; (void)argv;");
        self.push("\n");
        self.emit_temp_declarations(main, &tables);
        for idx in 0..main.instrs.len() {
            self.emit_instruction(main, idx, &tables);
        }
        self.push("\n");
        self.line("return 0;");
        self.indent -= 1;
        self.line("}");
    }

    fn emit_instruction(&mut self, func: &TacFunction, idx: usize, tables: &TypeTables) {
        let instr = &func.instrs[idx];
        if instr.is_dead {
            return;
        }

        match instr.op {
            // labels are flush-left so jumps read like the IR dump
            Opcode::Label => {
                self.push(&format!("L{}:;\n", instr.result.label_id().unwrap_or(0)));
            }
            Opcode::Goto => {
                self.line(&format!("goto L{};", instr.result.label_id().unwrap_or(0)));
            }
            Opcode::IfGoto => {
                self.line(&format!(
                    "if ({}) goto L{};",
                    operand(&instr.arg1),
                    instr.result.label_id().unwrap_or(0)
                ));
            }
            Opcode::IfFalseGoto => {
                self.line(&format!(
                    "if (!({})) goto L{};",
                    operand(&instr.arg1),
                    instr.result.label_id().unwrap_or(0)
                ));
            }

            Opcode::LoadInt
            | Opcode::LoadFloat
            | Opcode::LoadBool
            | Opcode::LoadString
            | Opcode::Assign => {
                self.line(&format!(
                    "{} = {};",
                    operand(&instr.result),
                    operand(&instr.arg1)
                ));
            }

            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Div | Opcode::Mod => {
                let op_str = match instr.op {
                    Opcode::Add => "+",
                    Opcode::Sub => "-",
                    Opcode::Mul => "*",
                    Opcode::Div => "/",
                    _ => "%",
                };
                self.line(&format!(
                    "{} = {} {} {};",
                    operand(&instr.result),
                    operand(&instr.arg1),
                    op_str,
                    operand(&instr.arg2)
                ));
            }

            Opcode::Pow => {
                self.line(&format!(
                    "{} = pow({}, {});",
                    operand(&instr.result),
                    operand(&instr.arg1),
                    operand(&instr.arg2)
                ));
            }

            Opcode::Neg => {
                self.line(&format!(
                    "{} = -({});",
                    operand(&instr.result),
                    operand(&instr.arg1)
                ));
            }
            Opcode::Not => {
                self.line(&format!(
                    "{} = !({});",
                    operand(&instr.result),
                    operand(&instr.arg1)
                ));
            }

            Opcode::Eq | Opcode::Neq | Opcode::Lt | Opcode::Gt | Opcode::Lte | Opcode::Gte => {
                let op_str = match instr.op {
                    Opcode::Eq => "==",
                    Opcode::Neq => "!=",
                    Opcode::Lt => "<",
                    Opcode::Gt => ">",
                    Opcode::Lte => "<=",
                    _ => ">=",
                };
                self.line(&format!(
                    "{} = ({} {} {});",
                    operand(&instr.result),
                    operand(&instr.arg1),
                    op_str,
                    operand(&instr.arg2)
                ));
            }

            Opcode::And | Opcode::Or => {
                let op_str = if instr.op == Opcode::And { "&&" } else { "||" };
                self.line(&format!(
                    "{} = ({} {} {});",
                    operand(&instr.result),
                    operand(&instr.arg1),
                    op_str,
                    operand(&instr.arg2)
                ));
            }

            Opcode::Concat => {
                self.line(&format!(
                    "{} = nl_concat({}, {});",
                    operand(&instr.result),
                    operand(&instr.arg1),
                    operand(&instr.arg2)
                ));
            }

            Opcode::Between => {
                self.line(&format!(
                    "{} = (({} >= {}) && ({} <= {}));",
                    operand(&instr.result),
                    operand(&instr.arg1),
                    operand(&instr.arg2),
                    operand(&instr.arg1),
                    operand(&instr.arg3)
                ));
            }

            Opcode::Decl => {
                let ty = instr.result.ty();
                let default = match ty {
                    DataType::Number | DataType::Decimal | DataType::Flag => " = 0",
                    DataType::Text => " = \"\"",
                    _ => "",
                };
                self.line(&format!(
                    "{} {}{};",
                    type_to_c(ty),
                    operand(&instr.result),
                    default
                ));
            }

            Opcode::Display => self.emit_display(&instr.arg1, tables),

            Opcode::Ask => {
                if !instr.arg1.is_none() {
                    self.line(&format!(
                        "printf(\"%s\", {}); fflush(stdout);",
                        operand(&instr.arg1)
                    ));
                }
                self.emit_read_into(&instr.result);
            }
            Opcode::Read => self.emit_read_into(&instr.result),

            Opcode::Param => {
                if self.emit_comments {
                    self.line(&format!("/* param {} */", operand(&instr.arg1)));
                }
            }

            Opcode::Call => self.emit_call(func, idx),

            Opcode::Return => {
                if instr.arg1.is_none() {
                    self.line("return;");
                } else {
                    self.line(&format!("return {};", operand(&instr.arg1)));
                }
            }

            Opcode::ScopeBegin => {
                self.line("{");
                self.indent += 1;
            }
            Opcode::ScopeEnd => {
                self.indent -= 1;
                self.line("}");
            }

            Opcode::SecureBegin => {
                if self.emit_comments {
                    self.line("/* BEGIN SECURE ZONE */");
                }
            }
            Opcode::SecureEnd => {
                if self.emit_comments {
                    self.line("/* END SECURE ZONE */");
                }
            }

            Opcode::ListCreate => {
                self.line(&format!(
                    "{} = nl_list_create({});",
                    operand(&instr.result),
                    operand(&instr.arg1)
                ));
            }
            Opcode::ListAppend => {
                self.line(&format!(
                    "nl_list_append({}, {});",
                    operand(&instr.result),
                    operand(&instr.arg1)
                ));
            }
            Opcode::ListGet => {
                self.line(&format!(
                    "{} = nl_list_get_num({}, {});",
                    operand(&instr.result),
                    operand(&instr.arg1),
                    operand(&instr.arg2)
                ));
            }
            Opcode::ListSet => {
                self.line(&format!(
                    "nl_list_set({}, {}, {});",
                    operand(&instr.result),
                    operand(&instr.arg1),
                    operand(&instr.arg2)
                ));
            }

            // lowered away or purely structural
            Opcode::Nop | Opcode::Break | Opcode::Continue | Opcode::FuncBegin
            | Opcode::FuncEnd => {}
        }
    }

    /// `printf` with a format picked by the value's resolved type.
    fn emit_display(&mut self, value: &Operand, tables: &TypeTables) {
        let ty = tables.resolve(value);
        let stmt = match ty {
            DataType::Decimal => format!("printf(\"%g\\n\", (double){});", operand(value)),
            DataType::Text => format!("printf(\"%s\\n\", {});", operand(value)),
            DataType::Flag => format!(
                "printf(\"%s\\n\", {} ? \"yes\" : \"no\");",
                operand(value)
            ),
            _ => format!("printf(\"%lld\\n\", (long long){});", operand(value)),
        };
        self.line(&stmt);
    }

    fn emit_read_into(&mut self, target: &Operand) {
        self.line(&format!(
            "fgets(_nl_input_buffer, sizeof(_nl_input_buffer), stdin); \
             _nl_input_buffer[strcspn(_nl_input_buffer, \"\\n\")] = 0; \
             {} = strdup(_nl_input_buffer);",
            operand(target)
        ));
    }

    /// Lower a `Call`: gather its arguments from the preceding `Param`
    /// instructions (skipping params that belong to nested calls), then
    /// emit a single C call expression.
    fn emit_call(&mut self, func: &TacFunction, idx: usize) {
        let instr = &func.instrs[idx];
        let nargs = instr.arg2.as_int().unwrap_or(0).max(0) as usize;

        let mut args: Vec<&Operand> = Vec::new();
        let mut inner_params = 0usize;
        let mut j = idx;
        while j > 0 && args.len() < nargs {
            j -= 1;
            let prev = &func.instrs[j];
            if prev.is_dead {
                continue;
            }
            match prev.op {
                Opcode::Call => {
                    inner_params += prev.arg2.as_int().unwrap_or(0).max(0) as usize;
                }
                Opcode::Param => {
                    if inner_params > 0 {
                        inner_params -= 1;
                    } else {
                        args.push(&prev.arg1);
                    }
                }
                _ => {}
            }
        }
        args.reverse();

        let (callee, is_void) = match &instr.arg1 {
            Operand::Func(name) if name == LIST_LENGTH_FUNC => ("nl_list_length".to_string(), false),
            Operand::Func(name) => {
                let is_void = self.func_returns.get(name) == Some(&DataType::Nothing);
                (sanitize(name), is_void)
            }
            other => (operand(other), false),
        };

        let arg_list = args
            .iter()
            .map(|a| operand(a))
            .collect::<Vec<_>>()
            .join(", ");

        if instr.result.is_none() || is_void {
            self.line(&format!("{}({});", callee, arg_list));
        } else {
            self.line(&format!(
                "{} = {}({});",
                operand(&instr.result),
                callee,
                arg_list
            ));
        }
    }
}

/// C rendering of one operand.
fn operand(op: &Operand) -> String {
    match op {
        Operand::None => String::new(),
        Operand::Temp { id, .. } => format!("_t{}", id),
        Operand::Var { name, .. } => sanitize(name),
        Operand::Int(v) => format!("{}LL", v),
        Operand::Float(v) => format!("{}", v),
        Operand::Str(s) => format!("\"{}\"", escape_c(s)),
        Operand::Bool(b) => String::from(if *b { "1" } else { "0" }),
        Operand::Label(id) => format!("L{}", id),
        Operand::Func(name) => sanitize(name),
    }
}

/// Multi-word NatureLang names become identifiers with underscores.
fn sanitize(name: &str) -> String {
    name.replace(' ', "_")
}

fn escape_c(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out
}

fn type_to_c(ty: DataType) -> &'static str {
    match ty {
        DataType::Decimal => "double",
        DataType::Text => "char*",
        DataType::Flag => "int",
        DataType::List => "NLList*",
        DataType::Nothing => "void",
        _ => "long long",
    }
}
