mod logging;
mod newline;

use anyhow::{Context, bail};
use camino::{Utf8Path, Utf8PathBuf};
use clap::Parser;
use newline::Newline;
use pycoffee_db::{Dialect, File, RootDatabase, convert_file, diagnostics};
use pycoffee_errors::Renderer;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Converts Python source to CoffeeScript.
#[derive(Parser)]
#[command(version)]
enum Options {
    /// Writes `<name>.coffee` next to every input file.
    Convert {
        /// Python version of the inputs, as N.N.
        #[arg(short, long = "python", value_name = "N.N", default_value = "3.6")]
        python: Dialect,
        /// Print the result instead of writing files.
        #[arg(long)]
        stdout: bool,
        /// Overwrite existing `.coffee` files.
        #[arg(long)]
        force: bool,
        #[arg(required = true, value_name = "FILE")]
        paths: Vec<Utf8PathBuf>,
    },
    /// Prints the syntax tree of every input file.
    Dump {
        #[arg(short, long = "python", value_name = "N.N", default_value = "3.6")]
        python: Dialect,
        #[arg(required = true, value_name = "FILE")]
        paths: Vec<Utf8PathBuf>,
    },
}

struct Output {
    stdout: bool,
    force: bool,
}

fn main() -> anyhow::Result<()> {
    logging::init();

    match Options::parse() {
        Options::Convert { python, stdout, force, paths } => {
            let db = RootDatabase::default();
            let renderer = Renderer::styled();
            let output = Output { stdout, force };

            let mut failed = 0;
            for path in paths {
                if path.extension() == Some("coffee") {
                    tracing::info!(%path, "skipping CoffeeScript input");
                    continue;
                }
                if let Err(err) = convert(&db, &renderer, &path, python, &output) {
                    eprintln!("error: {err:#}");
                    failed += 1;
                }
            }

            if failed > 0 {
                bail!("{failed} file(s) could not be converted");
            }
            Ok(())
        }
        Options::Dump { python, paths } => {
            let renderer = Renderer::styled();
            for path in paths {
                let source = read(&path)?;
                let text = Newline::normalize(&source);
                let parse = pycoffee_parse::parse(&text, python);
                let tree = parse.tree();

                println!("{path}");
                print!("{}", tree.debug_dump(tree.root()));
                for diagnostic in parse.diagnostics() {
                    eprintln!("{}", diagnostic.render(&renderer, path.as_str(), &text));
                }
            }
            Ok(())
        }
    }
}

fn convert(
    db: &RootDatabase,
    renderer: &Renderer,
    path: &Utf8Path,
    dialect: Dialect,
    output: &Output,
) -> anyhow::Result<()> {
    let source = read(path)?;
    let newline = Newline::detect(&source);
    let text = Newline::normalize(&source).into_owned();

    let file = File::new(db, path.to_owned(), text, dialect);
    let converted = convert_file(db, file);
    for diagnostic in diagnostics(db, file) {
        eprintln!("{}", diagnostic.render(renderer, file.path(db).as_str(), file.text(db)));
    }
    let Some(converted) = converted else {
        bail!("failed to convert `{path}`");
    };
    let converted = newline.apply(&converted);

    if output.stdout {
        print!("{converted}");
        return Ok(());
    }

    let target = path.with_extension("coffee");
    if target.exists() && !output.force {
        bail!("`{target}` already exists, pass --force to overwrite it");
    }
    std::fs::write(&target, converted.as_bytes())
        .with_context(|| format!("failed to write `{target}`"))?;
    tracing::info!(%path, %target, "converted");
    Ok(())
}

fn read(path: &Utf8Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read `{path}`"))
}
