//! Symbol mangling.
//!
//! Identifiers pass through unchanged when they are alphanumeric; every other
//! character becomes `_` followed by a single code letter, so the result is a
//! valid linker symbol and [`unmangle`] can invert it.

const TABLE: &[(char, char)] = &[
    ('.', 'D'),
    ('(', 'L'),
    (')', 'R'),
    (',', 'C'),
    ('_', '_'),
    ('[', 'o'),
    (']', 'c'),
    ('&', 'A'),
    ('*', 'P'),
    ('~', 'T'),
    (' ', 'S'),
    ('"', 'Q'),
    ('!', 'e'),
    ('#', 'h'),
    ('$', 'd'),
    ('%', 'p'),
    ('\'', 'q'),
    ('+', 'a'),
    ('-', 'm'),
    ('/', 's'),
    (':', '0'),
    (';', '1'),
    ('<', '2'),
    ('=', 'E'),
    ('>', 'g'),
    ('\\', 'b'),
    ('^', '3'),
    ('`', '4'),
    ('{', '5'),
    ('|', '6'),
    ('}', '7'),
    ('?', '8'),
    ('@', '9'),
];

fn encode(c: char) -> Option<char> {
    TABLE.iter().find(|(from, _)| *from == c).map(|(_, to)| *to)
}

fn decode(c: char) -> Option<char> {
    TABLE.iter().find(|(_, to)| *to == c).map(|(from, _)| *from)
}

/// Mangle an arbitrary identifier.
///
/// Characters outside the table and outside `[A-Za-z0-9]` are written as
/// `_u{hex}_`, which [`unmangle`] also understands.
pub fn mangle(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c);
        } else if let Some(code) = encode(c) {
            out.push('_');
            out.push(code);
        } else {
            out.push_str(&format!("_u{:x}_", c as u32));
        }
    }
    out
}

/// Invert [`mangle`]. Returns `None` for text that is not a mangled name.
pub fn unmangle(mangled: &str) -> Option<String> {
    let mut out = String::with_capacity(mangled.len());
    let mut chars = mangled.chars();
    while let Some(c) = chars.next() {
        if c != '_' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            'u' => {
                let hex: String = chars.by_ref().take_while(|c| *c != '_').collect();
                out.push(char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?);
            }
            code => out.push(decode(code)?),
        }
    }
    Some(out)
}

/// Join a structure path and a member name.
pub fn combine_names(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

/// Identity of one function instantiation.
///
/// `arguments` are rendered argument descriptions (type name, plus
/// `=value` for compile-time arguments).
pub fn mangle_function<S: AsRef<str>>(path: &str, arguments: &[S], return_type: &str) -> String {
    let mut out = mangle(path);
    for argument in arguments {
        out.push_str("_a");
        out.push_str(&mangle(argument.as_ref()));
    }
    out.push_str("_r");
    out.push_str(&mangle(return_type));
    out
}
