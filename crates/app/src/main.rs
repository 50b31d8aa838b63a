use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use koala_core::{aspect_ratio_latent, save_mesh_anywhere, NodeRegistry, ParamValue};

mod headless;
mod logging;

use headless::{params_from_pairs, print_reports, run_plan, run_step, PlanStep};
use logging::LogLevel;

/// Runs the Koala nodes outside of a node graph host.
#[derive(Parser)]
#[command(name = "koala", version)]
struct Cli {
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered nodes with their pins and parameters
    Nodes,

    /// Pick the closest supported resolution and build an empty latent
    Latent {
        #[arg(long)]
        batch_size: Option<i32>,
        /// Image whose dimensions replace --width/--height
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long)]
        width: Option<i32>,
        #[arg(long)]
        height: Option<i32>,
        /// Print the result as JSON
        #[arg(long)]
        print: bool,
    },

    /// Export a mesh (a unit box when --mesh is omitted)
    SaveMesh {
        /// OBJ, glTF or GLB file to read
        #[arg(long)]
        mesh: Option<PathBuf>,
        #[arg(long)]
        save_path: Option<String>,
        /// glb, obj, ply, stl, 3mf or dae
        #[arg(long)]
        format: Option<String>,
        #[arg(long)]
        print: bool,
    },

    /// Execute the steps of a JSON plan in order
    Run {
        #[arg(long)]
        plan: PathBuf,
        #[arg(long)]
        print: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::setup_tracing(cli.log_level);

    if let Err(err) = run(cli.command) {
        tracing::error!("{err}");
        eprintln!("koala error: {err}");
        process::exit(1);
    }
}

fn run(command: Command) -> Result<(), String> {
    let registry = NodeRegistry::builtin();
    match command {
        Command::Nodes => {
            list_nodes(registry);
            Ok(())
        }
        Command::Latent {
            batch_size,
            image,
            width,
            height,
            print,
        } => {
            let params = params_from_pairs([
                ("batch_size", batch_size.map(ParamValue::Int)),
                ("width", width.map(ParamValue::Int)),
                ("height", height.map(ParamValue::Int)),
            ]);
            let step = PlanStep {
                node: aspect_ratio_latent::ID.to_string(),
                params: params.values,
                image,
                mesh: None,
            };
            let report = run_step(registry, &step)?;
            print_reports(&[report], print)
        }
        Command::SaveMesh {
            mesh,
            save_path,
            format,
            print,
        } => {
            let params = params_from_pairs([
                ("save_path", save_path.map(ParamValue::String)),
                ("file_format", format.map(ParamValue::String)),
            ]);
            let step = PlanStep {
                node: save_mesh_anywhere::ID.to_string(),
                params: params.values,
                image: None,
                mesh,
            };
            let report = run_step(registry, &step)?;
            print_reports(&[report], print)
        }
        Command::Run { plan, print } => {
            let plan = headless::load_headless_plan(&plan)?;
            let reports = run_plan(registry, &plan)?;
            print_reports(&reports, print)
        }
    }
}

fn list_nodes(registry: &NodeRegistry) {
    for (id, node) in registry.iter() {
        let definition = &node.definition;
        println!("{id}: {} [{}]", node.display_name, definition.category);
        for pin in &definition.inputs {
            let optional = if pin.optional { " (optional)" } else { "" };
            println!("  in  {}: {:?}{optional}", pin.name, pin.pin_type);
        }
        for pin in &definition.outputs {
            println!("  out {}: {:?}", pin.name, pin.pin_type);
        }
        for spec in &node.param_specs {
            match &spec.default {
                Some(default) => println!("  param {} = {default:?}", spec.key),
                None => println!("  param {}", spec.key),
            }
        }
    }
}
