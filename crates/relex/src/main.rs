//! relex CLI
//!
//! Inspect incremental token hierarchies over the sample languages.

use relex::commands::{check_files, dump_files, replay_file, CommandError, CommandOptions};

fn main() {
    relex::init_tracing();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        print_usage();
        return;
    }

    let command = &args[1];
    let (options, operands) = split_options(&args[2..]);

    let result = match command.as_str() {
        "dump" => {
            if operands.is_empty() {
                eprintln!("Usage: relex dump <files...> [--json] [--language=<ext>]");
                std::process::exit(1);
            }
            dump_files(&operands, &options)
        }
        "replay" => {
            let [file, script] = operands.as_slice() else {
                eprintln!("Usage: relex replay <file> <script> [--json] [--check] [--language=<ext>]");
                eprintln!();
                eprintln!("Script lines are `offset remove [text]`; text escapes: \\n \\t \\r \\s \\\\");
                std::process::exit(1);
            };
            replay_file(file, script, &options)
        }
        "check" => {
            if operands.is_empty() {
                eprintln!("Usage: relex check <files...> [--language=<ext>]");
                std::process::exit(1);
            }
            check_files(&operands, &options)
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        "version" | "--version" | "-V" => {
            println!("relex {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {command}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(error) = result {
        match error {
            // Per-file errors were already printed.
            CommandError::Failed { .. } => eprintln!("{error}"),
            _ => eprintln!("error: {error}"),
        }
        std::process::exit(1);
    }
}

/// Split flags from operands; flags may appear anywhere.
fn split_options(args: &[String]) -> (CommandOptions, Vec<String>) {
    let mut options = CommandOptions::default();
    let mut operands = Vec::new();
    for arg in args {
        if let Some(language) = arg.strip_prefix("--language=") {
            options.language = Some(language.to_owned());
        } else if arg == "--json" {
            options.json = true;
        } else if arg == "--check" {
            options.check = true;
        } else if arg.starts_with("--") {
            eprintln!("warning: ignoring unknown option '{arg}'");
        } else {
            operands.push(arg.clone());
        }
    }
    (options, operands)
}

fn print_usage() {
    println!("relex: incremental lexing over embedded languages");
    println!();
    println!("Usage: relex <command> [options]");
    println!();
    println!("Commands:");
    println!("  dump <files...>          Print every token, embedded lists indented");
    println!("  replay <file> <script>   Apply an edit script and print each change");
    println!("  check <files...>         Verify consistency and rebuild stability");
    println!("  help                     Show this help message");
    println!("  version                  Show version information");
    println!();
    println!("Options:");
    println!("  --language=<ext>    Lex as calc, tmpl or str regardless of extension");
    println!("  --json              Machine-readable output (dump, replay)");
    println!("  --check             Verify the hierarchy after every edit (replay)");
    println!();
    println!("Logging:");
    println!("  RELEX_LOG=relex_engine=debug   Filter directives for trace output on stderr");
    println!();
    println!("Examples:");
    println!("  relex dump page.tmpl");
    println!("  relex replay expr.calc edits.txt --check");
    println!("  relex check *.calc *.tmpl");
}
