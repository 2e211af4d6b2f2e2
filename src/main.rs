use clap::{Parser, Subcommand};
use colored::Colorize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use webmacro::config::CaptureConfig;
use webmacro::dom::parse_snapshot;
use webmacro::picker::detect_list_groups;
use webmacro::schema::{
    parameters_to_json_schema, parse_server_definitions, parse_tool_definition, resolve_template,
};
use webmacro::selector::{generate_selector, generate_xpath, query_selector_all};

#[derive(Parser)]
#[command(name = "webmacro")]
#[command(author = "NV Labs")]
#[command(version = "0.1.0")]
#[command(about = "Browser macro capture and tool definition engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a tool definition file
    Validate {
        /// Path to the JSON definition
        path: PathBuf,

        /// Treat the file as a server-level array of definitions
        #[arg(long, default_value = "false")]
        server: bool,
    },

    /// Print the JSON Schema for a definition's parameters
    Schema {
        /// Path to the JSON definition
        path: PathBuf,
    },

    /// Detect repeating list structures in a page snapshot
    Detect {
        /// Path to the XML page snapshot
        snapshot: PathBuf,

        /// Page URL the snapshot was taken from
        #[arg(short, long, default_value = "https://localhost/")]
        url: String,
    },

    /// Query a page snapshot with a selector
    Query {
        /// Path to the XML page snapshot
        snapshot: PathBuf,

        /// Selector to evaluate
        selector: String,

        /// Page URL the snapshot was taken from
        #[arg(short, long, default_value = "https://localhost/")]
        url: String,
    },

    /// Resolve {{placeholder}} expressions in a template string
    Resolve {
        /// Template text
        template: String,

        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path, server } => {
            let content = fs::read_to_string(&path)?;
            let result = if server {
                parse_server_definitions(&content).map(|defs| {
                    for def in &defs {
                        println!(
                            "  {} {} ({} steps, {} parameters)",
                            "✓".green(),
                            def.name.cyan(),
                            def.all_steps().len(),
                            def.parameters.len()
                        );
                    }
                    defs.len()
                })
            } else {
                parse_tool_definition(&content).map(|def| {
                    println!(
                        "  {} {} ({} steps, {} parameters)",
                        "✓".green(),
                        def.name.cyan(),
                        def.all_steps().len(),
                        def.parameters.len()
                    );
                    1
                })
            };
            match result {
                Ok(count) => {
                    println!("{} {} definition(s) valid", "✓".green().bold(), count);
                }
                Err(err) => {
                    eprintln!("{} {}", "✗".red().bold(), err);
                    std::process::exit(1);
                }
            }
        }

        Commands::Schema { path } => {
            let content = fs::read_to_string(&path)?;
            let def = match parse_tool_definition(&content) {
                Ok(def) => def,
                Err(err) => {
                    eprintln!("{} {}", "✗".red().bold(), err);
                    std::process::exit(1);
                }
            };
            let schema = parameters_to_json_schema(&def.parameters);
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }

        Commands::Detect { snapshot, url } => {
            let xml = fs::read_to_string(&snapshot)?;
            let doc = parse_snapshot(&xml, &url)?;
            let groups = detect_list_groups(&doc, &CaptureConfig::default());
            if groups.is_empty() {
                println!("{} No repeating structures found", "·".yellow());
            }
            for (i, group) in groups.iter().enumerate() {
                let shape = match &group.shared_class {
                    Some(class) => format!("{}.{}", group.tag, class),
                    None => format!("{} > {}", doc.get(group.parent).tag, group.tag),
                };
                println!(
                    "{} {} {} ({} members)",
                    format!("[{}]", i + 1).blue(),
                    shape.cyan(),
                    generate_selector(&doc, group.members[0]),
                    group.members.len()
                );
            }
        }

        Commands::Query { snapshot, selector, url } => {
            let xml = fs::read_to_string(&snapshot)?;
            let doc = parse_snapshot(&xml, &url)?;
            let matches = query_selector_all(&doc, None, &selector);
            println!(
                "{} {} match(es) for {}",
                "▶".green().bold(),
                matches.len(),
                selector.cyan()
            );
            for node in matches {
                println!(
                    "  {} {}",
                    generate_selector(&doc, node).cyan(),
                    generate_xpath(&doc, node).dimmed()
                );
            }
        }

        Commands::Resolve { template, args } => {
            let args: HashMap<String, serde_json::Value> = serde_json::from_str(&args)?;
            println!("{}", resolve_template(&template, &args));
        }
    }

    Ok(())
}
