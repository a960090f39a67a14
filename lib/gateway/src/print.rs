use crate::datasource::FetchField;
use crate::selection::{Field, OperationType};
use crate::value::InputValue;

/// Renders a synthesized fetch document. Queries use the shorthand form, so
/// a batched root fetch prints as `{ f0: hello }`.
pub fn print_document(operation_type: OperationType, selections: &[FetchField]) -> String {
    let mut out = String::with_capacity(128);
    if operation_type != OperationType::Query {
        out.push_str(operation_type.keyword());
        out.push(' ');
    }
    write_fetch_selection_set(&mut out, selections);
    out
}

/// Renders an inbound selection tree with an explicit operation keyword.
/// Telemetry uses this to reconstruct the query attribute.
pub fn print_operation(operation_type: OperationType, fields: &[Field]) -> String {
    let mut out = String::with_capacity(128);
    out.push_str(operation_type.keyword());
    out.push(' ');
    write_selection_set(&mut out, fields);
    out
}

pub(crate) fn print_fetch_field(field: &FetchField) -> String {
    let mut out = String::with_capacity(64);
    write_fetch_field(&mut out, field);
    out
}

fn write_fetch_selection_set(out: &mut String, selections: &[FetchField]) {
    out.push_str("{ ");
    for (index, selection) in selections.iter().enumerate() {
        if index > 0 {
            out.push(' ');
        }
        write_fetch_field(out, selection);
    }
    out.push_str(" }");
}

fn write_fetch_field(out: &mut String, field: &FetchField) {
    if let Some(targets) = &field.targets {
        for target in targets {
            out.push_str("... on ");
            out.push_str(target);
            out.push_str(" { ");
        }
    }
    if field.output_name != field.name {
        out.push_str(&field.output_name);
        out.push_str(": ");
    }
    out.push_str(&field.name);
    if !field.arguments.is_empty() {
        out.push('(');
        for (index, (name, value)) in field.arguments.iter().enumerate() {
            if index > 0 {
                out.push_str(", ");
            }
            out.push_str(name);
            out.push_str(": ");
            write_input_value(out, value);
        }
        out.push(')');
    }
    if !field.fields.is_empty() {
        out.push(' ');
        write_fetch_selection_set(out, &field.fields);
    }
    if let Some(targets) = &field.targets {
        for _ in targets {
            out.push_str(" }");
        }
    }
}

fn write_selection_set(out: &mut String, fields: &[Field]) {
    out.push_str("{ ");
    for (index, field) in fields.iter().enumerate() {
        if index > 0 {
            out.push(' ');
        }
        write_field(out, field);
    }
    out.push_str(" }");
}

fn write_field(out: &mut String, field: &Field) {
    if field.output_name != field.name {
        out.push_str(&field.output_name);
        out.push_str(": ");
    }
    out.push_str(&field.name);
    if !field.arguments.is_empty() {
        out.push('(');
        for (index, (name, value)) in field.arguments.iter().enumerate() {
            if index > 0 {
                out.push_str(", ");
            }
            out.push_str(name);
            out.push_str(": ");
            write_input_value(out, value);
        }
        out.push(')');
    }
    if !field.fields.is_empty() {
        out.push(' ');
        write_selection_set(out, &field.fields);
    }
}

pub(crate) fn write_input_value(out: &mut String, value: &InputValue) {
    match value {
        InputValue::Null => out.push_str("null"),
        InputValue::Int(i) => out.push_str(&i.to_string()),
        InputValue::Float(f) => out.push_str(&format!("{:?}", f)),
        InputValue::String(s) => write_escaped_string(out, s),
        InputValue::Boolean(true) => out.push_str("true"),
        InputValue::Boolean(false) => out.push_str("false"),
        InputValue::Enum(e) => out.push_str(e),
        InputValue::Variable(name) => {
            out.push('$');
            out.push_str(name);
        }
        InputValue::List(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                write_input_value(out, item);
            }
            out.push(']');
        }
        InputValue::Object(map) => {
            out.push('{');
            for (index, (key, item)) in map.iter().enumerate() {
                if index > 0 {
                    out.push_str(", ");
                }
                out.push_str(key);
                out.push_str(": ");
                write_input_value(out, item);
            }
            out.push('}');
        }
    }
}

fn write_escaped_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(c),
        }
    }
    out.push('"');
}
