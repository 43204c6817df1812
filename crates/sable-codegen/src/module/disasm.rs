//! Textual listing of a module.

use std::fmt::Write;

use super::{MethodDef, MethodRef, Module, RegionKind, TypeDefKind};
use crate::bytecode::{BytecodeChunk, Instruction, Operand};

impl Module {
    /// Listing of every type and method in declaration order.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, ".module {}", self.name);
        for ty in &self.types {
            let kind = match ty.kind {
                TypeDefKind::Struct => "struct",
                TypeDefKind::Class => "class",
            };
            let _ = write!(out, "\n.{kind} {}", ty.name);
            if !ty.generic_params.is_empty() {
                let _ = write!(out, "<{}>", ty.generic_params.join(", "));
            }
            if let Some(base) = &ty.base {
                let _ = write!(out, " extends {base}");
            }
            let _ = writeln!(out);
            for field in &ty.fields {
                let _ = writeln!(out, "  .field {} {}", field.ty, field.name);
            }
        }
        for (index, method) in self.methods.iter().enumerate() {
            out.push('\n');
            self.write_method(&mut out, index as u32, method);
        }
        out
    }

    /// Listing of the methods whose name or `Type::name` matches `name`.
    pub fn disassemble_method(&self, name: &str) -> Option<String> {
        let mut out = String::new();
        for (index, method) in self.methods.iter().enumerate() {
            if method.name == name || method.qualified_name() == name {
                if !out.is_empty() {
                    out.push('\n');
                }
                self.write_method(&mut out, index as u32, method);
            }
        }
        (!out.is_empty()).then_some(out)
    }

    fn write_method(&self, out: &mut String, index: u32, method: &MethodDef) {
        let params: Vec<String> = method
            .params
            .iter()
            .map(|p| format!("{} {}", p.ty, p.name))
            .collect();
        let modifier = match (method.is_static, method.is_virtual) {
            (true, _) => "static ",
            (false, true) => "virtual ",
            (false, false) => "",
        };
        let _ = writeln!(
            out,
            ".method {modifier}{} {}({})",
            method.ret,
            method.qualified_name(),
            params.join(", ")
        );
        let Some(body) = &method.body else {
            let _ = writeln!(out, "  // runtime provided");
            return;
        };

        let _ = writeln!(out, "{{");
        if self.entry_point == Some(index) {
            let _ = writeln!(out, "  .entrypoint");
        }
        if !body.locals.is_empty() {
            let locals: Vec<String> = body
                .locals
                .iter()
                .enumerate()
                .map(|(i, ty)| format!("{ty} V_{i}"))
                .collect();
            let _ = writeln!(out, "  .locals ({})", locals.join(", "));
        }
        match BytecodeChunk::from_bytes(body.code.clone()).decode() {
            Ok(instructions) => {
                for (offset, instruction) in instructions {
                    let _ = writeln!(out, "  IL_{offset:04x}: {}", self.render(&instruction));
                }
            }
            Err(err) => {
                let _ = writeln!(out, "  // invalid body: {err}");
            }
        }
        for region in &body.regions {
            let handler = match region.kind {
                RegionKind::Catch => {
                    let caught = region
                        .catch_type
                        .and_then(|t| self.type_refs.get(t as usize))
                        .map(|t| t.to_string())
                        .unwrap_or_else(|| "object".to_string());
                    format!("catch {caught}")
                }
                RegionKind::Finally => "finally".to_string(),
            };
            let _ = writeln!(
                out,
                "  .try IL_{:04x} to IL_{:04x} {handler} handler IL_{:04x} to IL_{:04x} exit IL_{:04x}",
                region.try_start,
                region.try_end,
                region.handler_start,
                region.handler_end,
                region.exit
            );
        }
        let _ = writeln!(out, "}}");
    }

    fn render(&self, instruction: &Instruction) -> String {
        let name = instruction.op.name();
        match instruction.operand {
            Operand::None => name.to_string(),
            Operand::I32(v) => format!("{name} {v}"),
            Operand::F64(v) => format!("{name} {v:?}"),
            Operand::String(i) => match self.strings.get(i as usize) {
                Some(s) => format!("{name} {s:?}"),
                None => format!("{name} <string {i}>"),
            },
            Operand::Local(i) => format!("{name} V_{i}"),
            Operand::Arg(i) => format!("{name} A_{i}"),
            Operand::Method(i) => format!("{name} {}", self.method_ref_name(i)),
            Operand::Type(i) => match self.type_refs.get(i as usize) {
                Some(ty) => format!("{name} {ty}"),
                None => format!("{name} <type {i}>"),
            },
            Operand::Target(t) => format!("{name} IL_{t:04x}"),
        }
    }

    /// Signature of a method reference, as it appears in listings.
    pub fn method_ref_name(&self, index: u32) -> String {
        match self.method_refs.get(index as usize) {
            Some(MethodRef::Def(def)) => match self.methods.get(*def as usize) {
                Some(method) => {
                    let params: Vec<String> = method.param_types().map(|t| t.to_string()).collect();
                    format!("{} {}({})", method.ret, method.qualified_name(), params.join(", "))
                }
                None => format!("<method {def}>"),
            },
            Some(MethodRef::Import(import)) => {
                let params: Vec<String> = import.params.iter().map(|t| t.to_string()).collect();
                format!(
                    "{} {}::{}({})",
                    import.ret,
                    import.declaring_type,
                    import.name,
                    params.join(", ")
                )
            }
            None => format!("<method ref {index}>"),
        }
    }
}
