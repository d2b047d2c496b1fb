// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Lightweight lexical scanning of WGSL program source.
//!
//! This is not a WGSL parser. It only knows enough of the lexical grammar
//! (comments, identifiers, attributes, brackets) to list the declared
//! `@compute` entry points and to catch unbalanced brackets with a useful
//! position.

#[derive(Debug, PartialEq)]
enum Token<'a> {
    Ident(&'a str),
    Punct(char),
}

/// Replaces every comment with spaces, keeping newlines so that positions in
/// the result still map to the same line and column of `source`.
///
/// Block comments nest, as they do in WGSL.
pub fn strip_comments(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    let mut depth = 0usize;
    let mut in_line_comment = false;

    while let Some(c) = chars.next() {
        if in_line_comment {
            if c == '\n' {
                in_line_comment = false;
                out.push('\n');
            } else {
                out.push(' ');
            }
            continue;
        }
        match (c, chars.peek().copied()) {
            ('/', Some('*')) => {
                chars.next();
                depth += 1;
                out.push_str("  ");
            }
            ('*', Some('/')) if depth > 0 => {
                chars.next();
                depth -= 1;
                out.push_str("  ");
            }
            ('/', Some('/')) if depth == 0 => {
                chars.next();
                in_line_comment = true;
                out.push_str("  ");
            }
            ('\n', _) => out.push('\n'),
            (c, _) if depth > 0 => out.push(if c.is_whitespace() { c } else { ' ' }),
            (c, _) => out.push(c),
        }
    }
    out
}

fn tokens(code: &str) -> Vec<Token<'_>> {
    let mut out = Vec::new();
    let mut iter = code.char_indices().peekable();
    while let Some((start, c)) = iter.next() {
        if c.is_alphabetic() || c == '_' {
            let mut end = start + c.len_utf8();
            while let Some(&(i, next)) = iter.peek() {
                if next.is_alphanumeric() || next == '_' {
                    end = i + next.len_utf8();
                    iter.next();
                } else {
                    break;
                }
            }
            out.push(Token::Ident(&code[start..end]));
        } else if !c.is_whitespace() {
            out.push(Token::Punct(c));
        }
    }
    out
}

/// Lists the names of the functions declared with the `@compute` attribute,
/// in declaration order. Commented-out declarations are ignored.
pub fn compute_entry_points(source: &str) -> Vec<String> {
    let code = strip_comments(source);
    let tokens = tokens(&code);
    let mut names = Vec::new();
    let mut pending = false;
    let mut i = 0;

    while i < tokens.len() {
        match (&tokens[i], tokens.get(i + 1), tokens.get(i + 2)) {
            (Token::Punct('@'), Some(Token::Ident("compute")), _) => {
                pending = true;
                i += 2;
            }
            (Token::Ident("fn"), Some(Token::Ident(name)), _) => {
                if pending {
                    names.push((*name).to_owned());
                    pending = false;
                }
                i += 2;
            }
            _ => i += 1,
        }
    }
    names
}

/// Checks that `()`, `[]` and `{}` are balanced outside comments.
///
/// On failure returns a `line:column: message` diagnostic (1-based).
pub fn check_brackets(source: &str) -> Result<(), String> {
    let code = strip_comments(source);
    let mut stack: Vec<(char, usize, usize)> = Vec::new();
    let (mut line, mut column) = (1usize, 0usize);

    for c in code.chars() {
        if c == '\n' {
            line += 1;
            column = 0;
            continue;
        }
        column += 1;
        match c {
            '(' | '[' | '{' => stack.push((c, line, column)),
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((open, _, _)) if open == expected => {}
                    Some((open, l, col)) => {
                        return Err(format!(
                            "{line}:{column}: unexpected `{c}`, `{open}` opened at {l}:{col} is still open"
                        ));
                    }
                    None => return Err(format!("{line}:{column}: unexpected `{c}`")),
                }
            }
            _ => {}
        }
    }

    match stack.pop() {
        Some((open, l, col)) => Err(format!("{l}:{col}: unclosed `{open}`")),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SRC: &str = r#"
        // @compute @workgroup_size(64) fn commented_out() {}
        /* @compute fn also_commented() { /* nested */ } */
        @compute @workgroup_size(64)
        fn rule_1(@builtin(global_invocation_id) id: vec3<u32>) {}

        fn helper() -> f32 { return 1.0; }

        @compute
        @workgroup_size(64, 1, 1)
        fn single_step() {}
    "#;

    #[test]
    fn finds_compute_entry_points_only() {
        assert_eq!(compute_entry_points(SRC), vec!["rule_1", "single_step"]);
    }

    #[test]
    fn comments_keep_line_structure() {
        let stripped = strip_comments("a // b\nc /* d\ne */ f");
        assert_eq!(stripped.lines().count(), 3);
        assert!(!stripped.contains('b'));
        assert!(!stripped.contains('d'));
        assert!(stripped.contains('f'));
    }

    #[test]
    fn balanced_source_passes() {
        assert!(check_brackets(SRC).is_ok());
    }

    #[test]
    fn unclosed_brace_is_located() {
        let err = check_brackets("fn a() {\n  let x = 1;\n").unwrap_err();
        assert_eq!(err, "1:8: unclosed `{`");
    }

    #[test]
    fn stray_closer_is_located() {
        let err = check_brackets("fn a() { }\n)").unwrap_err();
        assert!(err.starts_with("2:1: unexpected `)`"), "{err}");
    }
}
