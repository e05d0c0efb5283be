use std::fs;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::Shell;

// cli.rs only depends on clap + clap_complete (both listed as
// build-dependencies), so it can be included here without dragging in
// the rest of the crate.
#[path = "src/cli.rs"]
mod cli;

fn main() {
    println!("cargo::rerun-if-changed=src/cli.rs");

    let out_dir = std::env::var_os("OUT_DIR").expect("OUT_DIR not set by Cargo");
    let out_dir = Path::new(&out_dir);

    let mut cmd = cli::Cli::command();
    cmd.build();

    write_manpages(&cmd, &out_dir.join("man"));
    write_completions(&mut cmd, &out_dir.join("completions"));
}

/// Render `habflow.1` plus one page per visible subcommand.
fn write_manpages(cmd: &clap::Command, dir: &Path) {
    fs::create_dir_all(dir).expect("failed to create man output directory");

    let mut pages = vec![cmd.clone()];
    for sub in cmd.get_subcommands().filter(|s| !s.is_hide_set()) {
        pages.push(sub.clone().name(format!("habflow-{}", sub.get_name())));
    }

    for page in pages {
        let name = page.get_name().to_owned();
        let mut buf = Vec::new();
        clap_mangen::Man::new(page)
            .render(&mut buf)
            .unwrap_or_else(|e| panic!("failed to render man page for `{name}`: {e}"));
        fs::write(dir.join(format!("{name}.1")), buf)
            .unwrap_or_else(|e| panic!("failed to write man page for `{name}`: {e}"));
    }
}

/// Pre-generate completion scripts for packaging.
fn write_completions(cmd: &mut clap::Command, dir: &Path) {
    fs::create_dir_all(dir).expect("failed to create completions output directory");

    for shell in [Shell::Bash, Shell::Zsh, Shell::Fish] {
        clap_complete::generate_to(shell, cmd, "habflow", dir)
            .unwrap_or_else(|e| panic!("failed to generate {shell} completions: {e}"));
    }
}
