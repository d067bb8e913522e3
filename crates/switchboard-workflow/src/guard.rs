// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
//! Guard expression evaluation.
//!
//! Guards are small boolean expressions of the form `field op value`, e.g.
//! `verified == true`, `toolResult.auth_status == "VERIFIED"`,
//! `userIntent contains "balance"`. Any parse or type error evaluates to
//! `false` rather than propagating — a malformed guard must never wedge a
//! session.

use serde_json::Value;

/// Read-only view a guard is evaluated against: the session's memory plus
/// the most recent tool result.
#[derive(Debug, Clone, Default)]
pub struct GuardContext {
    pub verified: bool,
    pub user_intent: Option<String>,
    pub current_agent_id: Option<String>,
    pub tool_result: Option<Value>,
}

/// Evaluate a guard expression. Returns `false` on any parse or lookup
/// failure.
pub fn evaluate(guard: &str, ctx: &GuardContext) -> bool {
    try_evaluate(guard, ctx).unwrap_or(false)
}

fn try_evaluate(guard: &str, ctx: &GuardContext) -> Option<bool> {
    let guard = guard.trim();

    if let Some((field, rhs)) = split_op(guard, "==") {
        return Some(field_value(field, ctx)? == parse_literal(rhs));
    }
    if let Some((field, rhs)) = split_op(guard, "!=") {
        return Some(field_value(field, ctx)? != parse_literal(rhs));
    }
    if let Some((field, rhs)) = split_op(guard, " contains ") {
        let haystack = field_value(field, ctx)?;
        let needle = parse_literal(rhs);
        return Some(match (haystack, needle) {
            (Value::String(h), Value::String(n)) => h.contains(&n),
            _ => false,
        });
    }
    None
}

/// Split on the first top-level occurrence of `op`, trimming both sides.
fn split_op<'a>(expr: &'a str, op: &str) -> Option<(&'a str, &'a str)> {
    expr.find(op)
        .map(|idx| (expr[..idx].trim(), expr[idx + op.len()..].trim()))
}

fn parse_literal(raw: &str) -> Value {
    if let Some(inner) = raw.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        return Value::String(inner.to_string());
    }
    match raw {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => raw
            .parse::<f64>()
            .map(|n| serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null))
            .unwrap_or_else(|_| Value::String(raw.to_string())),
    }
}

fn field_value(field: &str, ctx: &GuardContext) -> Option<Value> {
    let mut parts = field.splitn(2, '.');
    let head = parts.next()?;
    let rest = parts.next();

    match (head, rest) {
        ("verified", None) => Some(Value::Bool(ctx.verified)),
        ("userIntent", None) => Some(
            ctx.user_intent
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
        ),
        ("currentAgentId", None) => Some(
            ctx.current_agent_id
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
        ),
        ("toolResult", None) => ctx.tool_result.clone(),
        ("toolResult", Some(path)) => path
            .split('.')
            .try_fold(ctx.tool_result.clone()?, |v, key| v.get(key).cloned()),
        _ => None,
    }
}
