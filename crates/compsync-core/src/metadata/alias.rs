//! Constructor-token → type-expression alias table.

/// Map a constructor-like token to a type expression.
///
/// Unknown tokens are returned unchanged.
pub fn map_type_token(token: &str) -> String {
    let token = token.trim();
    match token {
        "String" | "StringConstructor" => "string",
        "Number" | "NumberConstructor" => "number",
        "Boolean" | "BooleanConstructor" => "boolean",
        "Object" | "ObjectConstructor" => "Record<string, any>",
        "Array" | "ArrayConstructor" => "any[]",
        "Function" | "FunctionConstructor" => "(...args: any[]) => any",
        "null" | "" => "any",
        other => other,
    }
    .to_string()
}

/// Join type expressions into a de-duplicated union, keeping first-seen order.
///
/// Returns `None` when no members are given.
pub fn union<I, S>(members: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: Vec<String> = Vec::new();
    for member in members {
        let member = member.as_ref().trim();
        if member.is_empty() {
            continue;
        }
        if !seen.iter().any(|m| m == member) {
            seen.push(member.to_string());
        }
    }
    if seen.is_empty() {
        None
    } else {
        Some(seen.join(" | "))
    }
}

/// Map every token through the alias table and union the results.
pub fn union_of_tokens<I, S>(tokens: I) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    union(tokens.into_iter().map(|t| map_type_token(t.as_ref())))
}
