//! Solidity interface rendering of a compiled contract's ABI

use super::abi::{AbiEntry, AbiParam, EntryKind, InterfaceDescription, Mutability};
use convert_case::{Case, Casing};
use std::collections::HashSet;

/// Renders the interface description as a Solidity `interface` block
pub fn render(contract_name: &str, abi: &InterfaceDescription) -> String {
    let mut interface = String::new();

    interface.push_str("// SPDX-License-Identifier: MIT\n");
    interface.push_str("pragma solidity ^0.8.0;\n\n");
    interface.push_str(&format!(
        "interface I{} {{\n",
        contract_name.to_case(Case::Pascal)
    ));

    let mut seen_structs = HashSet::new();
    let mut struct_definitions = Vec::new();
    for entry in abi.entries() {
        collect_structs(&entry.inputs, &mut seen_structs, &mut struct_definitions);
        collect_structs(&entry.outputs, &mut seen_structs, &mut struct_definitions);
    }
    for struct_def in &struct_definitions {
        interface.push_str(struct_def);
        interface.push_str("\n\n");
    }

    // Interfaces cannot declare constructors; keep it visible as a comment
    if let Some(constructor) = abi.constructor() {
        interface.push_str(&format!(
            "    // constructor({}){}\n",
            format_parameters(&constructor.inputs, false),
            if constructor.state_mutability == Mutability::Payable {
                " payable"
            } else {
                ""
            }
        ));
    }

    for event in abi.entries().iter().filter(|e| e.kind == EntryKind::Event) {
        interface.push_str(&format!(
            "    event {}({});\n",
            event.name,
            format_parameters(&event.inputs, false)
        ));
    }

    for entry in abi.entries() {
        match entry.kind {
            EntryKind::Function => {
                interface.push_str("    ");
                interface.push_str(&format_function(entry));
                interface.push('\n');
            }
            EntryKind::Fallback => interface.push_str("    fallback() external;\n"),
            EntryKind::Receive => interface.push_str("    receive() external payable;\n"),
            _ => {}
        }
    }

    interface.push_str("}\n");
    interface
}

fn format_function(func: &AbiEntry) -> String {
    let params = format_parameters(&func.inputs, true);

    let returns = if func.outputs.is_empty() {
        String::new()
    } else {
        format!(" returns ({})", format_parameters(&func.outputs, true))
    };

    let mut_str = match func.state_mutability {
        Mutability::Pure => " pure",
        Mutability::View => " view",
        Mutability::Payable => " payable",
        Mutability::NonPayable => "",
    };

    format!("function {}({params}) external{mut_str}{returns};", func.name)
}

fn format_parameters(params: &[AbiParam], with_location: bool) -> String {
    params
        .iter()
        .map(|p| format_parameter(p, with_location))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_parameter(param: &AbiParam, with_location: bool) -> String {
    let ty = format_sol_type(param);

    let location = if with_location && needs_memory(param, &ty) {
        " memory"
    } else {
        ""
    };

    if param.name.is_empty() {
        format!("{ty}{location}")
    } else {
        format!("{ty}{location} {}", param.name)
    }
}

fn format_sol_type(param: &AbiParam) -> String {
    if let Some(name) = param
        .internal_type
        .as_deref()
        .and_then(|t| t.strip_prefix("struct "))
    {
        return name.to_string();
    }
    if param.kind.starts_with("tuple") {
        return param.canonical_type();
    }
    param.kind.clone()
}

fn needs_memory(param: &AbiParam, ty: &str) -> bool {
    ty == "string"
        || ty == "bytes"
        || ty.ends_with(']')
        || param.kind.starts_with("tuple")
}

fn collect_structs(params: &[AbiParam], seen: &mut HashSet<String>, structs: &mut Vec<String>) {
    for param in params.iter().filter(|p| p.kind.starts_with("tuple")) {
        let Some(struct_name) = param
            .internal_type
            .as_deref()
            .and_then(|t| t.strip_prefix("struct "))
        else {
            continue;
        };
        let struct_name = struct_name.trim_end_matches("[]");
        if !seen.insert(struct_name.to_string()) {
            continue;
        }

        let fields = param
            .components
            .iter()
            .map(|field| {
                let field_name = if field.name.is_empty() { "_" } else { &field.name };
                format!("        {} {};", format_sol_type(field), field_name)
            })
            .collect::<Vec<_>>()
            .join("\n");
        structs.push(format!("    struct {struct_name} {{\n{fields}\n    }}"));

        collect_structs(&param.components, seen, structs);
    }
}
