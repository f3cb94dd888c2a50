use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use lppview_model::{ProblemDocument, Relation, SolveStatus};

#[derive(Parser)]
#[command(name = "lppview")]
#[command(about = "Solve and inspect small linear-programming problems", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem file and print the optimum and the feasible region
    Solve {
        /// The JSON problem description
        file: PathBuf,
        /// Emit the solution as JSON instead of text
        #[arg(short, long)]
        json: bool,
    },
    /// Check a problem file for errors and summarize it
    Check {
        /// The file to check
        file: PathBuf,
    },
}

fn load_document(file: &Path) -> ProblemDocument {
    let source = match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            std::process::exit(1);
        }
    };

    match serde_json::from_str(&source) {
        Ok(document) => document,
        Err(e) => {
            eprintln!("Parse error in {}: {}", file.display(), e);
            std::process::exit(1);
        }
    }
}

fn describe_objective(coefficients: [f64; 3], minimize: bool) -> String {
    format!(
        "{}x + {}y + {}z -> {}",
        coefficients[0],
        coefficients[1],
        coefficients[2],
        if minimize { "min" } else { "max" }
    )
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve { file, json } => {
            let mut system = load_document(&file).into_system();

            let solution = match system.solve() {
                Ok(solution) => solution,
                Err(e) => {
                    eprintln!("Failed to solve the system: {}", e);
                    std::process::exit(1);
                }
            };

            if json {
                match serde_json::to_string_pretty(solution) {
                    Ok(text) => println!("{}", text),
                    Err(e) => {
                        eprintln!("Error encoding solution: {}", e);
                        std::process::exit(1);
                    }
                }
                return;
            }

            println!("Status: {}", solution.status);
            match solution.status {
                SolveStatus::Optimal => {
                    println!("Optimal value: {:.4}", solution.optimal_value);
                    let [x, y, z] = solution.optimal_point;
                    println!("Optimal point: ({:.4}, {:.4}, {:.4})", x, y, z);
                    println!();

                    let edges = solution.edges();
                    println!(
                        "Feasible region: {} vertices, {} edges",
                        solution.vertices.len(),
                        edges.len()
                    );
                    for (i, [x, y, z]) in solution.vertices.iter().enumerate() {
                        println!("  v{:<3} ({:.4}, {:.4}, {:.4})", i, x, y, z);
                    }
                    for (a, b) in edges {
                        println!("  v{} -- v{}", a, b);
                    }
                }
                SolveStatus::Infeasible => {
                    println!("No point satisfies all constraints.");
                    std::process::exit(1);
                }
                SolveStatus::Unbounded => {
                    println!("The objective grows without limit over the feasible region.");
                    std::process::exit(1);
                }
                SolveStatus::NumericallyInconsistent | SolveStatus::Unsolved => {
                    println!("The solver did not reach a conclusive state.");
                    std::process::exit(1);
                }
            }
        }
        Commands::Check { file } => {
            let document = load_document(&file);

            let mut le = 0;
            let mut ge = 0;
            let mut eq = 0;
            let mut degenerate = 0;
            for plane in &document.planes {
                if plane.is_degenerate() {
                    degenerate += 1;
                    continue;
                }
                match plane.relation {
                    Relation::Le => le += 1,
                    Relation::Ge => ge += 1,
                    Relation::Eq => eq += 1,
                }
            }

            println!("✓ {} is valid", file.display());
            println!("  {} planes ({} <=, {} >=, {} =)", le + ge + eq, le, ge, eq);
            if degenerate > 0 {
                println!("  {} degenerate planes will be dropped", degenerate);
            }
            println!(
                "  objective: {}",
                describe_objective(document.objective, document.minimize)
            );
        }
    }
}
