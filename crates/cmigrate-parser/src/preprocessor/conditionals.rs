//! Conditional compilation elision
//!
//! Conditions are never evaluated. Every `#if`/`#ifdef`/`#ifndef` block is
//! dropped up to and including the next `#endif`. Nesting is not tracked: an
//! inner `#endif` ends the skip, and the outer block's remaining lines (and
//! its own `#endif`) pass through.

/// Drop every conditional block from `source`
pub fn strip_conditionals(source: &str) -> String {
    let mut kept = Vec::new();
    let mut skipping = false;

    for line in source.split('\n') {
        let trimmed = line.trim();

        if skipping {
            if trimmed.starts_with("#endif") {
                skipping = false;
            }
            continue;
        }

        // also covers #ifdef and #ifndef
        if trimmed.starts_with("#if") {
            skipping = true;
            continue;
        }

        kept.push(line);
    }

    kept.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_block_removed() {
        let source = "int a;\n#ifdef DEBUG\nint dbg;\n#endif\nint b;";
        assert_eq!(strip_conditionals(source), "int a;\nint b;");
    }

    #[test]
    fn test_else_branch_also_removed() {
        let source = "#if 1\nint x;\n#else\nint y;\n#endif\nint z;";
        assert_eq!(strip_conditionals(source), "int z;");
    }

    #[test]
    fn test_nested_first_endif_ends_skip() {
        let source = "#ifndef A\n#ifdef B\nint inner;\n#endif\nint outer;\n#endif\nint tail;";
        assert_eq!(
            strip_conditionals(source),
            "int outer;\n#endif\nint tail;"
        );
    }

    #[test]
    fn test_unterminated_block_drops_rest() {
        let source = "int a;\n  #if X\nint b;\nint c;";
        assert_eq!(strip_conditionals(source), "int a;");
    }

    #[test]
    fn test_no_directives_untouched() {
        let source = "int a;\n\nint b;\n";
        assert_eq!(strip_conditionals(source), source);
    }
}
