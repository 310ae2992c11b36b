//! Command-line driver: process one or more build description documents and
//! report the resolved object model.

use std::process::ExitCode;

use clap::Parser;

use projgen::Kernel;

#[derive(Parser)]
#[command(name = "projgen", version, about = "Resolve declarative XML build descriptions")]
struct Args {
    /// Build description documents to process.
    #[arg(default_value = "./build.xml")]
    files: Vec<String>,

    /// Directory name skipped during recursive file matching (repeatable).
    #[arg(long = "excludedir", value_name = "NAME")]
    exclude_dirs: Vec<String>,

    /// Print a summary of the resolved model.
    #[arg(long)]
    dump: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut kernel = match Kernel::new() {
        Ok(kernel) => kernel,
        Err(err) => {
            tracing::error!("{err}");
            return ExitCode::FAILURE;
        }
    };
    for name in &args.exclude_dirs {
        kernel.add_exclude_folder(name);
    }

    let mut failed = false;
    for file in &args.files {
        if let Err(err) = kernel.process_file(file) {
            // A fatal error aborts this document; remaining documents still
            // get their chance.
            tracing::error!("{file}: {err}");
            failed = true;
        }
    }

    if args.dump {
        for solution in &kernel.solutions {
            dump_solution(solution, 0);
        }
    }

    if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

fn dump_solution(solution: &projgen::SolutionNode, depth: usize) {
    let pad = "  ".repeat(depth);
    println!("{pad}solution {} v{} ({})", solution.name, solution.version, solution.full_path.display());
    for conf in solution.configurations() {
        println!("{pad}  configuration {}", conf.key());
    }
    for project in solution.projects_in_order() {
        println!(
            "{pad}  project {} [{:?}, {}]: {} file(s)",
            project.name,
            project.project_type,
            project.framework.conditional_define(),
            project.files.len(),
        );
    }
    for nested in solution.solutions() {
        dump_solution(nested, depth + 1);
    }
}
