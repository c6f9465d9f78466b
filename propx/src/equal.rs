//! Deep-equality assertion for use inside property bodies.

use std::fmt::Debug;

use crate::testcase::TestCase;

/// Compare two values and fail the test with a readable diff when they are
/// not equal.
pub fn equal<T: Debug + PartialEq>(t: &mut TestCase, got: &T, want: &T) {
    if got == want {
        return;
    }
    t.errorf(format!(
        "values differ (-want +got):\n{}",
        render_diff(&format!("{:#?}", want), &format!("{:#?}", got))
    ));
}

/// Line diff over the pretty `Debug` renderings: common lines unmarked,
/// differing lines as `-want` / `+got`.
fn render_diff(want: &str, got: &str) -> String {
    let want_lines: Vec<&str> = want.lines().collect();
    let got_lines: Vec<&str> = got.lines().collect();
    let mut out = Vec::new();
    let common = want_lines.len().min(got_lines.len());
    for i in 0..common {
        if want_lines[i] == got_lines[i] {
            out.push(format!("  {}", want_lines[i]));
        } else {
            out.push(format!("- {}", want_lines[i]));
            out.push(format!("+ {}", got_lines[i]));
        }
    }
    for line in &want_lines[common..] {
        out.push(format!("- {}", line));
    }
    for line in &got_lines[common..] {
        out.push(format!("+ {}", line));
    }
    out.join("\n")
}
