//! Lowers a parsed function into a standalone C function, written directly
//! into the sink's body (spec §4.6 body section).
//!
//! Every emitted function returns `int` — an assertion-failure counter —
//! which is what makes `fn main()` double as both a normal entry point
//! (`return 0;` when nothing fails) and a test function `MainEmitter` can
//! call and sum (spec §4.7).

use crate::driver::cgen_sink::CGenSink;
use crate::frontend::ast::{Expr, FunctionDecl, Statement};

pub fn emit_function(sink: &mut CGenSink, function: &FunctionDecl) {
    sink.push_include("#include <stdio.h>");
    sink.push_fn_forward_decl(format!("int {}(void);", function.name));
    sink.emit_line(format!("int {}(void) {{", function.name));
    sink.emit_line("    int failures = 0;");
    for statement in &function.body {
        emit_statement(sink, statement);
    }
    sink.emit_line("    return failures;");
    sink.emit_line("}");
}

fn emit_statement(sink: &mut CGenSink, statement: &Statement) {
    match statement {
        Statement::Println(expr) => emit_println(sink, expr),
        Statement::Assert(expr) => emit_assert(sink, expr),
        Statement::Call(name) => emit_call(sink, name),
    }
}

fn emit_println(sink: &mut CGenSink, expr: &Expr) {
    match expr {
        Expr::Str(value) => {
            sink.emit_line(format!("    printf(\"%s\\n\", \"{}\");", escape_c_string(value)));
        }
        Expr::Int(value) => {
            sink.emit_line(format!("    printf(\"%lld\\n\", (long long){value});"));
        }
        Expr::Bool(value) => {
            sink.emit_line(format!("    printf(\"%s\\n\", \"{}\");", value));
        }
        Expr::Eq(_, _) => {
            sink.emit_line(format!(
                "    printf(\"%s\\n\", ({}) ? \"true\" : \"false\");",
                render_expr(expr)
            ));
        }
    }
}

fn emit_call(sink: &mut CGenSink, name: &str) {
    sink.emit_line(format!("    failures += {name}();"));
}

fn emit_assert(sink: &mut CGenSink, expr: &Expr) {
    sink.emit_line(format!("    if (!({})) {{", render_expr(expr)));
    sink.emit_line("        failures += 1;");
    sink.emit_line("        fprintf(stderr, \"assertion failed\\n\");");
    sink.emit_line("    }");
}

fn render_expr(expr: &Expr) -> String {
    match expr {
        Expr::Int(value) => value.to_string(),
        Expr::Str(value) => format!("\"{}\"", escape_c_string(value)),
        Expr::Bool(value) => (if *value { "1" } else { "0" }).to_string(),
        Expr::Eq(lhs, rhs) => format!("({}) == ({})", render_expr(lhs), render_expr(rhs)),
    }
}

fn escape_c_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::parse_source;

    #[test]
    fn emits_a_function_returning_the_failure_count() {
        let parsed = parse_source("fn main() { assert 1 == 2 }").unwrap();
        let mut sink = CGenSink::new();
        emit_function(&mut sink, &parsed.functions[0]);
        let out = sink.finalize();
        assert!(out.contains("int main(void)"));
        assert!(out.contains("failures += 1;"));
        assert!(out.contains("return failures;"));
    }

    #[test]
    fn calling_another_function_sums_its_failures() {
        let parsed = parse_source("fn main() { helper() }").unwrap();
        let mut sink = CGenSink::new();
        emit_function(&mut sink, &parsed.functions[0]);
        assert!(sink.finalize().contains("failures += helper();"));
    }

    #[test]
    fn println_of_a_string_literal_uses_percent_s() {
        let parsed = parse_source(r#"fn main() { println("hi") }"#).unwrap();
        let mut sink = CGenSink::new();
        emit_function(&mut sink, &parsed.functions[0]);
        assert!(sink.finalize().contains("printf(\"%s\\n\", \"hi\");"));
    }
}
