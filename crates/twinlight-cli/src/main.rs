//! # twinlight CLI
//!
//! Command-line utilities for inspecting twin commands, topics and labels.

use anyhow::{Context, Result};
use std::env;
use twinlight_adapter_kube::{resource_path, KubeClientConfig};
use twinlight_core::{CommandParser, LabelTable, DEFAULT_PROPERTY};
use twinlight_proto::{CommandShape, TopicScheme};

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help();
        return Ok(());
    }

    match args[1].as_str() {
        "parse" => {
            if args.len() < 3 {
                eprintln!("Usage: twinlight parse <json> [property]");
                std::process::exit(1);
            }
            let property = args.get(3).map_or(DEFAULT_PROPERTY, String::as_str);
            match CommandParser::new(property).parse(args[2].as_bytes()) {
                Some(value) => println!("{value}"),
                None => {
                    eprintln!("No value for '{property}' in command");
                    std::process::exit(2);
                }
            }
        }
        "label" => {
            if args.len() < 3 {
                eprintln!("Usage: twinlight label <value>");
                std::process::exit(1);
            }
            println!("{}", LabelTable::default().translate(&args[2]));
        }
        "topics" => {
            if args.len() < 3 {
                eprintln!("Usage: twinlight topics <device-id>");
                std::process::exit(1);
            }
            let scheme = TopicScheme::default();
            println!("command: {}", scheme.command(&args[2]));
            println!("report:  {}", scheme.report(&args[2]));
        }
        "command" => {
            if args.len() < 4 {
                eprintln!("Usage: twinlight command <nested|flat|legacy> <value> [property]");
                std::process::exit(1);
            }
            let shape: CommandShape = args[2].parse().context("Invalid shape")?;
            let property = args.get(4).map_or(DEFAULT_PROPERTY, String::as_str);
            let document = shape.encode(property, &args[3]);
            println!(
                "{}",
                serde_json::to_string_pretty(&document).context("Failed to encode command")?
            );
        }
        "path" => {
            if args.len() < 3 {
                eprintln!("Usage: twinlight path <device-id> [namespace]");
                std::process::exit(1);
            }
            let config = KubeClientConfig::default();
            let namespace = args.get(3).unwrap_or(&config.namespace);
            println!(
                "{}",
                resource_path(
                    &config.group,
                    &config.version,
                    namespace,
                    &config.plural,
                    &args[2],
                )
            );
        }
        "help" | "--help" | "-h" => {
            print_help();
        }
        cmd => {
            eprintln!("Unknown command: {cmd}");
            print_help();
            std::process::exit(1);
        }
    }

    Ok(())
}

fn print_help() {
    println!(
        r#"twinlight CLI

USAGE:
    twinlight <COMMAND> [OPTIONS]

COMMANDS:
    parse <json> [property]                 Extract the desired value from a command
    label <value>                           Show the display label of a value
    topics <device-id>                      Show the MQTT topics of a device
    command <shape> <value> [property]      Encode a command (nested, flat or legacy)
    path <device-id> [namespace]            Show the registry path of a device
    help                                    Show this help message

EXAMPLES:
    twinlight parse '{{"twin":{{"color":{{"expected":{{"value":"RED"}}}}}}}}'
    twinlight command nested GREEN
    twinlight topics light-01
"#
    );
}
