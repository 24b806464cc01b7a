// pcg-core: Product Construction Graph compiler core

//! # Dot renderer
//!
//! `to_dot` is a pure string transform (§6); it never touches the filesystem. `generate_png`
//! shells out to the system `dot` binary and lives at the crate's visualization boundary, kept
//! out of every hot path the way the teacher keeps `gml_parser`'s own Graphviz export behind a
//! plain `std::process::Command` call rather than linking a graphviz crate.

use crate::graph::Pcg;
use std::io;
use std::path::Path;
use std::process::Command;

/// Render a PCG as Graphviz DOT. Start/End get plain labels; non-accepting states get
/// `"state, location"`; accepting states get `"state, location\nAccept={…}"` and are drawn as a
/// filled, light-yellow double circle.
pub fn to_dot(cg: &Pcg) -> String {
    let mut out = String::from("digraph pcg {\n");
    for id in cg.vertices() {
        let s = cg.state(id);
        let label = if id == cg.start() {
            "Start".to_string()
        } else if id == cg.end() {
            "End".to_string()
        } else if s.accept.is_empty() {
            format!("{}, {}", s.state, s.node.loc)
        } else {
            format!("{}, {}\\nAccept={}", s.state, s.node.loc, s.accept)
        };
        if !s.accept.is_empty() {
            out.push_str(&format!(
                "  {} [label=\"{}\", shape=doublecircle, style=filled, fillcolor=lightyellow];\n",
                id.index(),
                label
            ));
        } else {
            out.push_str(&format!("  {} [label=\"{}\"];\n", id.index(), label));
        }
    }
    for (u, v) in cg.edges() {
        out.push_str(&format!("  {} -> {};\n", u.index(), v.index()));
    }
    out.push_str("}\n");
    out
}

/// Write `{file}.dot` and invoke the system `dot` binary to render `{file}.png`.
pub fn generate_png(cg: &Pcg, file: &Path) -> io::Result<()> {
    let dot_path = file.with_extension("dot");
    let png_path = file.with_extension("png");
    std::fs::write(&dot_path, to_dot(cg))?;
    let status = Command::new("dot")
        .arg("-Tpng")
        .arg(&dot_path)
        .arg("-o")
        .arg(&png_path)
        .status()?;
    if !status.success() {
        return Err(io::Error::new(io::ErrorKind::Other, "dot binary exited unsuccessfully"));
    }
    Ok(())
}
