//! Whitespace-only re-indentation of an encoded JSON document.
//!
//! `serde_json`'s pretty printer works on a parsed `Value`, which would
//! re-sort object keys and destroy the canonical field order. This pass is
//! purely lexical: it walks the already-valid compact document and inserts
//! newlines and indentation without touching any value bytes.

pub(crate) fn reindent(input: &[u8], indent: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() * 2);
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    let mut bytes = input.iter().copied().peekable();
    while let Some(byte) = bytes.next() {
        if in_string {
            out.push(byte);
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }

        match byte {
            b'"' => {
                in_string = true;
                out.push(byte);
            }
            b'{' | b'[' => {
                out.push(byte);
                let closing = if byte == b'{' { b'}' } else { b']' };
                // Empty containers stay on one line.
                if bytes.peek() == Some(&closing) {
                    out.push(closing);
                    bytes.next();
                } else {
                    depth += 1;
                    newline(&mut out, indent, depth);
                }
            }
            b'}' | b']' => {
                depth = depth.saturating_sub(1);
                newline(&mut out, indent, depth);
                out.push(byte);
            }
            b',' => {
                out.push(byte);
                newline(&mut out, indent, depth);
            }
            b':' => {
                out.push(byte);
                out.push(b' ');
            }
            b' ' | b'\t' | b'\n' | b'\r' => {}
            _ => out.push(byte),
        }
    }

    out
}

fn newline(out: &mut Vec<u8>, indent: &str, depth: usize) {
    out.push(b'\n');
    for _ in 0..depth {
        out.extend_from_slice(indent.as_bytes());
    }
}
