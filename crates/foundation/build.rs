//! Renders `foundation(1)` and one page per subcommand into `$OUT_DIR/man`.
//!
//! Packagers pick the pages up from there; `completions` gets no page of
//! its own since its `--help` says everything.

use std::fs;
use std::path::Path;

use clap::CommandFactory;

#[path = "src/cli.rs"]
mod cli;

/// Subcommands that are documented only in the parent page.
const NO_PAGE: &[&str] = &["completions", "help"];

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let Some(out_dir) = std::env::var_os("OUT_DIR") else {
        panic!("OUT_DIR not set by Cargo");
    };
    let man_dir = Path::new(&out_dir).join("man");
    fs::create_dir_all(&man_dir)
        .unwrap_or_else(|e| panic!("failed to create {}: {e}", man_dir.display()));

    let root = cli::Cli::command();
    write_page(&root, "foundation", &man_dir);

    for sub in root.get_subcommands() {
        if sub.is_hide_set() || NO_PAGE.contains(&sub.get_name()) {
            continue;
        }
        let page = format!("foundation-{}", sub.get_name());
        write_page(&sub.clone().name(page.clone()), &page, &man_dir);
    }
}

fn write_page(cmd: &clap::Command, page: &str, dir: &Path) {
    let mut buf = Vec::new();
    clap_mangen::Man::new(cmd.clone())
        .section("1")
        .render(&mut buf)
        .unwrap_or_else(|e| panic!("failed to render {page}(1): {e}"));

    let path = dir.join(format!("{page}.1"));
    fs::write(&path, buf).unwrap_or_else(|e| panic!("failed to write {}: {e}", path.display()));
}
